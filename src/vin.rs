// VIN format checks applied before anything is sent to the backend.

use once_cell::sync::Lazy;
use regex::Regex;

pub const VIN_LENGTH: usize = 17;

// 17 characters, uppercase letters and digits, excluding I, O and Q.
static VIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").expect("VIN pattern is a valid regex")
});

/// Returns true iff `vin` is exactly 17 characters drawn from `[A-HJ-NPR-Z0-9]`.
///
/// Callers upper-case the input first (see [`normalize_vin_input`]); lower-case
/// letters are rejected here.
pub fn is_valid_vin(vin: &str) -> bool {
    VIN_PATTERN.is_match(vin)
}

// Mirrors what the VIN input does as the user types: surrounding whitespace
// dropped, letters upper-cased.
pub fn normalize_vin_input(raw: &str) -> String {
    raw.trim().to_uppercase()
}
