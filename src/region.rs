// 🗺️ Region Resolver - 9th digit → fiscal region of issue

use crate::checksum::{strip_digits, ID_LENGTH};

/// Label returned when the region cannot be determined
pub const UNKNOWN_REGION: &str = "Desconhecido";

/// Fiscal regions indexed by the 9th digit (index 8) of the id number
const REGIONS: [&str; 10] = [
    "RS",                     // 0
    "DF, GO, MS, MT, TO",     // 1
    "AC, AM, AP, PA, RO, RR", // 2
    "CE, MA, PI",             // 3
    "AL, PB, PE, RN",         // 4
    "BA, SE",                 // 5
    "MG",                     // 6
    "ES, RJ",                 // 7
    "SP",                     // 8
    "PR, SC",                 // 9
];

/// Resolve the region of issue for an id number.
///
/// Does not assume the number was validated: anything that is not exactly
/// 11 digits after stripping resolves to [`UNKNOWN_REGION`].
pub fn resolve_region(input: &str) -> &'static str {
    let clean = strip_digits(input);
    if clean.len() != ID_LENGTH {
        return UNKNOWN_REGION;
    }

    clean
        .as_bytes()
        .get(8)
        .map(|b| usize::from(b - b'0'))
        .and_then(|digit| REGIONS.get(digit).copied())
        .unwrap_or(UNKNOWN_REGION)
}
