// Record parsing - single JSON input and fixed-width bulk files
// Both paths produce CustomerFields, consumed by Customer::new

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CustomerError;
use crate::normalize::NULL_SENTINEL;

// ============================================================================
// FIXED-WIDTH LAYOUT
// ============================================================================

/// Fixed column widths of the bulk upload file, in file order. The last
/// column (loja_ultima_compra) is open-ended and runs to end of line.
const COLUMN_WIDTHS: [usize; 7] = [
    19, // cpf
    12, // private
    12, // incompleto
    22, // data_ultima_compra
    22, // ticket_medio
    24, // ticket_ultima_compra
    20, // loja_mais_frequente
];

/// Shortest value the open-ended last column can carry (`NULL`).
const LAST_COLUMN_MIN_WIDTH: usize = 4;

/// Minimum byte length of a valid data line, derived from the declared
/// column widths so it cannot drift from the layout.
pub fn min_line_width() -> usize {
    COLUMN_WIDTHS.iter().sum::<usize>() + LAST_COLUMN_MIN_WIDTH
}

/// Byte offset where column `index` starts
fn column_start(index: usize) -> usize {
    COLUMN_WIDTHS[..index].iter().sum()
}

// ============================================================================
// INPUT & FIELD SET
// ============================================================================

/// Loosely-typed single-record input, as received on the JSON create
/// endpoint. Amounts arrive already numeric; everything else is text.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NewCustomer {
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub private: String,
    #[serde(default)]
    pub incompleto: String,
    #[serde(default)]
    pub data_ultima_compra: String,
    #[serde(default)]
    pub ticket_medio: f64,
    #[serde(default)]
    pub ticket_ultima_compra: f64,
    #[serde(default)]
    pub loja_mais_frequente: String,
    #[serde(default)]
    pub loja_ultima_compra: String,
}

/// Coerced-but-unvalidated field bag produced by either parse path.
/// Identity, normalization and checksum flags are applied later by
/// `Customer::new`.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerFields {
    pub cpf: String,
    pub private: String,
    pub incompleto: String,
    pub data_ultima_compra: Option<NaiveDate>,
    pub ticket_medio: f64,
    pub ticket_ultima_compra: f64,
    pub loja_mais_frequente: String,
    pub loja_ultima_compra: String,
}

// ============================================================================
// FIELD COERCERS
// ============================================================================

/// Parse a calendar date. Empty values, the `NULL` sentinel and anything
/// that is not strict `YYYY-MM-DD` are treated as missing, never as errors.
pub fn coerce_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(NULL_SENTINEL) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Parse a decimal amount with a comma decimal separator. Empty values,
/// the `NULL` sentinel and unparsable input all coerce to `0.0`.
pub fn coerce_decimal(raw: &str) -> f64 {
    let value = raw.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(NULL_SENTINEL) {
        return 0.0;
    }
    value.replace(',', ".").parse().unwrap_or(0.0)
}

/// Uppercase a delimited identifier field verbatim. Unlike
/// `normalize::sanitize` this neither transliterates nor substitutes the
/// sentinel - bulk-file columns are assumed ASCII-clean upstream.
pub fn coerce_nullable(raw: &str) -> String {
    raw.to_uppercase()
}

// ============================================================================
// SINGLE-RECORD PATH
// ============================================================================

/// Coerce a single JSON input into a field set. Infallible: malformed
/// field values degrade to absent/zero.
pub fn parse_single(input: &NewCustomer) -> CustomerFields {
    CustomerFields {
        cpf: coerce_nullable(input.cpf.trim()),
        private: input.private.trim().to_string(),
        incompleto: input.incompleto.trim().to_string(),
        data_ultima_compra: coerce_date(&input.data_ultima_compra),
        ticket_medio: input.ticket_medio,
        ticket_ultima_compra: input.ticket_ultima_compra,
        loja_mais_frequente: coerce_nullable(input.loja_mais_frequente.trim()),
        loja_ultima_compra: coerce_nullable(input.loja_ultima_compra.trim()),
    }
}

// ============================================================================
// FIXED-WIDTH BATCH PATH
// ============================================================================

/// Lazy single-pass parser over the lines of a bulk upload file.
///
/// The first line is a header and is discarded unconditionally. Every data
/// line is sliced at the fixed byte offsets above; a line shorter than the
/// minimum width yields `CustomerError::LineTooShort` and ends the
/// iteration - callers must not keep any earlier results.
pub struct BatchParser<I> {
    lines: I,
    line_no: usize,
    done: bool,
}

/// Parse a sequence of text lines into field sets, header first.
pub fn parse_batch<'a, I>(lines: I) -> BatchParser<I::IntoIter>
where
    I: IntoIterator<Item = &'a str>,
{
    BatchParser {
        lines: lines.into_iter(),
        line_no: 0,
        done: false,
    }
}

/// Eager variant: collect the whole batch, or fail with no partial results.
pub fn parse_batch_all<'a, I>(lines: I) -> Result<Vec<CustomerFields>, CustomerError>
where
    I: IntoIterator<Item = &'a str>,
{
    parse_batch(lines).collect()
}

impl<'a, I> Iterator for BatchParser<I>
where
    I: Iterator<Item = &'a str>,
{
    type Item = Result<CustomerFields, CustomerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line = self.lines.next()?;
            self.line_no += 1;

            // Header row
            if self.line_no == 1 {
                continue;
            }

            match parse_line(line, self.line_no) {
                Ok(fields) => return Some(Ok(fields)),
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Slice one data line at the fixed byte offsets and coerce each column.
fn parse_line(line: &str, line_no: usize) -> Result<CustomerFields, CustomerError> {
    let bytes = line.as_bytes();

    if bytes.len() < min_line_width() {
        return Err(CustomerError::LineTooShort { line: line_no });
    }

    Ok(CustomerFields {
        cpf: coerce_nullable(column(bytes, 0)),
        private: column(bytes, 1).to_string(),
        incompleto: column(bytes, 2).to_string(),
        data_ultima_compra: coerce_date(column(bytes, 3)),
        ticket_medio: coerce_decimal(column(bytes, 4)),
        ticket_ultima_compra: coerce_decimal(column(bytes, 5)),
        loja_mais_frequente: coerce_nullable(column(bytes, 6)),
        loja_ultima_compra: coerce_nullable(last_column(bytes)),
    })
}

/// Extract and trim a fixed-width column. Data lines are ASCII; a stray
/// non-UTF-8 byte inside a column empties that column instead of panicking
/// mid-batch.
fn column(bytes: &[u8], index: usize) -> &str {
    let start = column_start(index);
    let end = start + COLUMN_WIDTHS[index];
    std::str::from_utf8(&bytes[start..end]).unwrap_or("").trim()
}

/// The open-ended final column, from the last fixed offset to end of line
fn last_column(bytes: &[u8]) -> &str {
    let start = column_start(COLUMN_WIDTHS.len());
    std::str::from_utf8(&bytes[start..]).unwrap_or("").trim()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_FILE: &str = "\
CPF                PRIVATE     INCOMPLETO  DATA DA ULTIMA COMPRA TICKET MEDIO          TICKET DA ULTIMA COMPRA LOJA MAIS FREQUENTE LOJA DA ULTIMA COMPRA
026.987.379-13     0           0           2011-01-20            159,31                159,31                  79.379.491/0001-83  79.379.491/0001-83
041.091.641-25     0           1           NULL                  NULL                  NULL                    NULL                NULL";

    #[test]
    fn test_min_line_width_derived_from_layout() {
        assert_eq!(min_line_width(), 135);
    }

    #[test]
    fn test_coerce_date() {
        assert_eq!(
            coerce_date("2011-01-27"),
            NaiveDate::from_ymd_opt(2011, 1, 27)
        );
        assert_eq!(coerce_date("  2011-01-27  "), coerce_date("2011-01-27"));
        assert_eq!(coerce_date("NULL"), None);
        assert_eq!(coerce_date("null"), None);
        assert_eq!(coerce_date(""), None);
        assert_eq!(coerce_date("not-a-date"), None);
        assert_eq!(coerce_date("2011-13-01"), None); // no such month
        assert_eq!(coerce_date("27/01/2011"), None); // wrong pattern
    }

    #[test]
    fn test_coerce_decimal() {
        assert_eq!(coerce_decimal("159,31"), 159.31);
        assert_eq!(coerce_decimal("159.31"), 159.31);
        assert_eq!(coerce_decimal("  130,54 "), 130.54);
        assert_eq!(coerce_decimal("NULL"), 0.0);
        assert_eq!(coerce_decimal("null"), 0.0);
        assert_eq!(coerce_decimal(""), 0.0);
        assert_eq!(coerce_decimal("abc"), 0.0);
    }

    #[test]
    fn test_coerce_nullable() {
        assert_eq!(coerce_nullable("79.379.491/0001-83"), "79.379.491/0001-83");
        assert_eq!(coerce_nullable("null"), "NULL");
        // no sentinel substitution and no transliteration on this path
        assert_eq!(coerce_nullable(""), "");
        assert_eq!(coerce_nullable("café"), "CAFÉ");
    }

    #[test]
    fn test_parse_single() {
        let input = NewCustomer {
            cpf: " 922.488.109-20 ".to_string(),
            private: " 0 ".to_string(),
            incompleto: "0".to_string(),
            data_ultima_compra: "2011-01-27".to_string(),
            ticket_medio: 130.54,
            ticket_ultima_compra: 130.54,
            loja_mais_frequente: "79.379.491/0001-83".to_string(),
            loja_ultima_compra: "79.379.491/0001-83".to_string(),
        };

        let fields = parse_single(&input);
        assert_eq!(fields.cpf, "922.488.109-20");
        assert_eq!(fields.private, "0");
        assert_eq!(fields.incompleto, "0");
        assert_eq!(
            fields.data_ultima_compra,
            NaiveDate::from_ymd_opt(2011, 1, 27)
        );
        assert_eq!(fields.ticket_medio, 130.54);
        assert_eq!(fields.ticket_ultima_compra, 130.54);
    }

    #[test]
    fn test_parse_single_never_fails() {
        let fields = parse_single(&NewCustomer::default());
        assert_eq!(fields.cpf, "");
        assert_eq!(fields.data_ultima_compra, None);
        assert_eq!(fields.ticket_medio, 0.0);
    }

    #[test]
    fn test_parse_batch_valid_file() {
        let customers = parse_batch_all(VALID_FILE.lines()).unwrap();
        assert_eq!(customers.len(), 2);

        assert_eq!(customers[0].cpf, "026.987.379-13");
        assert_eq!(customers[0].private, "0");
        assert_eq!(customers[0].incompleto, "0");
        assert_eq!(
            customers[0].data_ultima_compra,
            NaiveDate::from_ymd_opt(2011, 1, 20)
        );
        assert_eq!(customers[0].ticket_medio, 159.31);
        assert_eq!(customers[0].ticket_ultima_compra, 159.31);
        assert_eq!(customers[0].loja_mais_frequente, "79.379.491/0001-83");
        assert_eq!(customers[0].loja_ultima_compra, "79.379.491/0001-83");

        assert_eq!(customers[1].cpf, "041.091.641-25");
        assert_eq!(customers[1].incompleto, "1");
        assert_eq!(customers[1].data_ultima_compra, None);
        assert_eq!(customers[1].ticket_medio, 0.0);
        assert_eq!(customers[1].ticket_ultima_compra, 0.0);
        assert_eq!(customers[1].loja_mais_frequente, "NULL");
        assert_eq!(customers[1].loja_ultima_compra, "NULL");
    }

    #[test]
    fn test_parse_batch_short_line_fails_whole_batch() {
        let file = "\
CPF               PRIVATE        INCOMPLETO     DATA_ULTIMA_COMPRA
922.488.109-20   0              0              2011-01-27";

        let result = parse_batch_all(file.lines());
        assert!(matches!(
            result,
            Err(CustomerError::LineTooShort { line: 2 })
        ));
    }

    #[test]
    fn test_parse_batch_stops_after_error() {
        let data_line = VALID_FILE.lines().nth(1).unwrap();
        let file = format!("header\nshort\n{data_line}");

        let mut parser = parse_batch(file.lines());
        assert!(matches!(
            parser.next(),
            Some(Err(CustomerError::LineTooShort { line: 2 }))
        ));
        // later valid lines are not speculatively parsed
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_parse_batch_header_only_yields_nothing() {
        let customers = parse_batch_all("just a header".lines()).unwrap();
        assert!(customers.is_empty());
    }

    #[test]
    fn test_parse_batch_is_lazy() {
        let mut parser = parse_batch(VALID_FILE.lines());
        let first = parser.next().unwrap().unwrap();
        assert_eq!(first.cpf, "026.987.379-13");
        let second = parser.next().unwrap().unwrap();
        assert_eq!(second.cpf, "041.091.641-25");
        assert!(parser.next().is_none());
    }
}
