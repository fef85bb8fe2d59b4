// ✏️ Formatter - display masks for id numbers and birth dates

use crate::checksum::{strip_digits, ID_LENGTH};

/// Render an id number as `DDD.DDD.DDD-DD`.
///
/// Partial or oversized numbers pass through untouched so that something
/// readable is always shown.
pub fn format_id_number(input: &str) -> String {
    let clean = strip_digits(input);
    if clean.len() != ID_LENGTH {
        return input.to_string();
    }

    format!(
        "{}.{}.{}-{}",
        &clean[0..3],
        &clean[3..6],
        &clean[6..9],
        &clean[9..11]
    )
}

/// Progressive `DD/MM/YYYY` mask for date-of-birth entry.
///
/// "01021990" → "01/02/1990", "0102" → "01/02", "010" → "01/0".
/// More than 8 digits returns the input unchanged.
pub fn mask_date_of_birth(input: &str) -> String {
    let digits = strip_digits(input);
    if digits.len() > 8 {
        return input.to_string();
    }

    let mut masked = String::with_capacity(10);
    for (i, c) in digits.chars().enumerate() {
        if i == 2 || i == 4 {
            masked.push('/');
        }
        masked.push(c);
    }
    masked
}
