//! MSISDN normalisation.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ClinicalError, Result};

static E164: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{7,14}$").expect("valid E.164 pattern"));

/// Normalise a phone number to E.164 form.
///
/// Accepts local numbers (`0712345678`, `712345678`), numbers with the
/// calling code but no plus (`254712345678`), `00`-prefixed international
/// numbers and E.164 input. Spaces, dashes and parentheses are ignored.
pub fn normalize_msisdn(raw: &str, calling_code: &str) -> Result<String> {
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect();

    let candidate = if let Some(rest) = digits.strip_prefix('+') {
        format!("+{rest}")
    } else if let Some(rest) = digits.strip_prefix("00") {
        format!("+{rest}")
    } else if let Some(rest) = digits.strip_prefix('0') {
        format!("+{calling_code}{rest}")
    } else if digits.starts_with(calling_code) && digits.len() > 9 {
        format!("+{digits}")
    } else if digits.len() == 9 {
        format!("+{calling_code}{digits}")
    } else {
        format!("+{digits}")
    };

    if E164.is_match(&candidate) {
        Ok(candidate)
    } else {
        Err(ClinicalError::InvalidPhoneNumber(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_formats() {
        assert_eq!(normalize_msisdn("0712345678", "254").unwrap(), "+254712345678");
        assert_eq!(normalize_msisdn("712345678", "254").unwrap(), "+254712345678");
        assert_eq!(normalize_msisdn("254712345678", "254").unwrap(), "+254712345678");
        assert_eq!(normalize_msisdn("0712 345-678", "254").unwrap(), "+254712345678");
    }

    #[test]
    fn test_international_formats() {
        assert_eq!(normalize_msisdn("+254712345678", "254").unwrap(), "+254712345678");
        assert_eq!(normalize_msisdn("00254712345678", "254").unwrap(), "+254712345678");
        assert_eq!(normalize_msisdn("+1 (415) 555-2671", "254").unwrap(), "+14155552671");
    }

    #[test]
    fn test_rejects_garbage() {
        for raw in ["", "abc", "+0712", "12", "+2547123456789012345"] {
            let err = normalize_msisdn(raw, "254").unwrap_err();
            assert!(matches!(err, ClinicalError::InvalidPhoneNumber(ref s) if s == raw));
        }
    }
}
