// Text normalization for customer identity fields
// Diacritic folding + uppercasing + NULL sentinel substitution

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Sentinel stored in place of an empty text value. The base never stores
/// empty strings - absence is represented in-band.
pub const NULL_SENTINEL: &str = "NULL";

/// Normalize a raw text field into its canonical stored form.
///
/// Accented characters are folded to their plain-ASCII base (NFD
/// decomposition with combining marks dropped), the result is uppercased,
/// and an empty result becomes the literal `"NULL"` sentinel.
///
/// Idempotent: sanitizing an already-sanitized value is a no-op.
pub fn sanitize(raw: &str) -> String {
    let folded: String = raw.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let upper = folded.to_uppercase();

    if upper.is_empty() {
        NULL_SENTINEL.to_string()
    } else {
        upper
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_empty_becomes_sentinel() {
        assert_eq!(sanitize(""), "NULL");
    }

    #[test]
    fn test_sanitize_passthrough() {
        assert_eq!(sanitize("922.488.109-20"), "922.488.109-20");
        assert_eq!(sanitize("0"), "0");
        assert_eq!(sanitize("NULL"), "NULL");
    }

    #[test]
    fn test_sanitize_strips_diacritics_and_uppercases() {
        assert_eq!(sanitize("Loja Mais Freqüente"), "LOJA MAIS FREQUENTE");
        assert_eq!(sanitize("Incompleto"), "INCOMPLETO");
        assert_eq!(sanitize("Private"), "PRIVATE");
        assert_eq!(sanitize("InvãlidLójaCNPJ"), "INVALIDLOJACNPJ");
        assert_eq!(sanitize("São Paulo"), "SAO PAULO");
    }

    #[test]
    fn test_sanitize_idempotent() {
        for input in ["", "Loja Mais Freqüente", "922.488.109-20", "São Paulo"] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn test_sanitize_whitespace_is_not_empty() {
        // Only a truly empty result becomes the sentinel; callers trim first
        assert_eq!(sanitize(" "), " ");
    }
}
