// Brazilian tax identifier validation (CPF / CNPJ)
// Checksum verification only - formatting punctuation is ignored

/// Weights for the second CNPJ check digit. The first digit uses the same
/// cycle starting one position in.
const CNPJ_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Validate a CPF (individual tax id, 11 digits + two mod-11 check digits).
///
/// Punctuation (dots, dashes) is stripped before validation. Any input that
/// is not exactly 11 digits, or is a repeated-digit sequence like
/// `111.111.111-11`, is invalid. Never errors - malformed input is `false`.
pub fn is_valid_cpf(raw: &str) -> bool {
    let digits = extract_digits(raw);

    if digits.len() != 11 || all_same(&digits) {
        return false;
    }

    check_digit(&digits[..9], 10) == digits[9] && check_digit(&digits[..10], 11) == digits[10]
}

/// Validate a CNPJ (company tax id, 14 digits + two mod-11 check digits
/// over a fixed weight cycle).
pub fn is_valid_cnpj(raw: &str) -> bool {
    let digits = extract_digits(raw);

    if digits.len() != 14 || all_same(&digits) {
        return false;
    }

    cnpj_check_digit(&digits[..12]) == digits[12] && cnpj_check_digit(&digits[..13]) == digits[13]
}

/// Keep only ASCII digits, as numeric values
fn extract_digits(raw: &str) -> Vec<u32> {
    raw.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// Sequences like 000... or 999... satisfy the checksum but are not
/// assignable identifiers
fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

/// CPF check digit: weights count down from `start` over the prefix,
/// remainder of sum*10 mod 11, with 10 mapped to 0
fn check_digit(digits: &[u32], start: u32) -> u32 {
    let sum: u32 = digits
        .iter()
        .zip((0..).map(|i| start - i))
        .map(|(d, w)| d * w)
        .sum();

    let rem = (sum * 10) % 11;
    if rem == 10 {
        0
    } else {
        rem
    }
}

/// CNPJ check digit: fixed weight cycle, 11 - (sum mod 11), floored to 0
/// when the remainder is below 2
fn cnpj_check_digit(digits: &[u32]) -> u32 {
    let offset = CNPJ_WEIGHTS.len() - digits.len();
    let sum: u32 = digits
        .iter()
        .zip(CNPJ_WEIGHTS[offset..].iter())
        .map(|(d, w)| d * w)
        .sum();

    let rem = sum % 11;
    if rem < 2 {
        0
    } else {
        11 - rem
    }
}

// ============================================================================
// TESTS
// ============================================================================
