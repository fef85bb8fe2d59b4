// 🔢 Checksum Engine - two-pass mod-11 verification for CPF numbers
// Pure functions: never fail, malformed input is simply "not valid"

/// Number of digits in a complete id number
pub const ID_LENGTH: usize = 11;

/// Keep ASCII digits only ("123.456.789-01" → "12345678901")
pub fn strip_digits(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Weighted sum with a descending factor, then `(sum * 10) mod 11`.
///
/// A result of 10 maps to 0. Applied twice per id number:
/// - digits 0..9 with `start_factor = 10` → first check digit
/// - digits 0..10 with `start_factor = 11` → second check digit
///
/// Every digit is weighted: past zero the factor keeps decreasing into
/// negative values, and the remainder is taken in `0..11`. Digits are
/// expected in `0..=9`; the arithmetic saturates instead of overflowing.
pub fn compute_check_digit(prior_digits: &[u8], start_factor: u32) -> u8 {
    let sum = prior_digits
        .iter()
        .zip((0_i64..).map(|i| i64::from(start_factor) - i))
        .fold(0_i64, |sum, (digit, factor)| {
            sum.saturating_add(i64::from(*digit).saturating_mul(factor))
        });

    match sum.saturating_mul(10).rem_euclid(11) {
        10 => 0,
        remainder => remainder as u8,
    }
}

/// Expected verification digits for the first 9 digits of `input`.
///
/// Returns `None` when fewer than 9 digits survive stripping.
pub fn check_digits(input: &str) -> Option<(u8, u8)> {
    let digits = to_digits(&strip_digits(input));
    if digits.len() < 9 {
        return None;
    }

    let first = compute_check_digit(&digits[..9], 10);
    let mut with_first = digits[..9].to_vec();
    with_first.push(first);
    let second = compute_check_digit(&with_first, 11);

    Some((first, second))
}

/// Validate an id number in any punctuation.
///
/// Fails on wrong length and on the all-identical-digits pattern
/// ("11111111111" passes the arithmetic but is never issued).
pub fn validate(input: &str) -> bool {
    let clean = strip_digits(input);
    if clean.len() != ID_LENGTH {
        return false;
    }

    let digits = to_digits(&clean);
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let first = compute_check_digit(&digits[..9], 10);
    let second = compute_check_digit(&digits[..10], 11);

    first == digits[9] && second == digits[10]
}

fn to_digits(clean: &str) -> Vec<u8> {
    clean.bytes().map(|b| b - b'0').collect()
}
