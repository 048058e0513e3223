// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! E.164 normalization for destination numbers.

use crate::error::DispatchError;

/// Maximum digits in an E.164 number (country code included).
const E164_MAX_DIGITS: usize = 15;

/// Normalizes a raw phone number into E.164 form.
///
/// Every non-digit is dropped and a leading `+` is added. Inputs with no
/// digits, or more than fifteen, are rejected.
pub fn normalize_e164(raw: &str) -> Result<String, DispatchError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() || digits.len() > E164_MAX_DIGITS {
        return Err(DispatchError::InvalidNumber(raw.to_string()));
    }
    Ok(format!("+{digits}"))
}
