//! Phone number canonicalization.
//!
//! Every phone number stored or matched anywhere in the platform is in
//! the digit-only international form `255XXXXXXXXX` (Tanzania country
//! code, nine subscriber digits). Conversations are keyed by this form,
//! so normalization must be total and deterministic.

/// Length of a canonical number: `255` + nine subscriber digits.
const CANONICAL_LEN: usize = 12;

/// Length of the local form with a leading zero, e.g. `0712345678`.
const LOCAL_LEN: usize = 10;

/// Length of a bare mobile number, e.g. `712345678`.
const BARE_LEN: usize = 9;

/// Canonicalize a phone number to `255XXXXXXXXX`.
///
/// Accepted inputs (punctuation, spaces, and a leading `+` are
/// tolerated and stripped):
///
/// - `255712345678` -- already canonical
/// - `+255 712 345 678` -- international with separators
/// - `0712345678` -- local form with leading zero
/// - `712345678` -- bare nine-digit mobile (must start with 6 or 7)
///
/// Returns `None` for anything else: wrong length, non-mobile prefix,
/// or input with no digits at all.
///
/// # Examples
///
/// ```
/// use sherehe_core::phone::normalize_phone;
///
/// assert_eq!(normalize_phone("0712345678").as_deref(), Some("255712345678"));
/// assert_eq!(normalize_phone("+255 712-345-678").as_deref(), Some("255712345678"));
/// assert_eq!(normalize_phone("712345678").as_deref(), Some("255712345678"));
/// assert_eq!(normalize_phone("12345"), None);
/// ```
pub fn normalize_phone(input: &str) -> Option<String> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();

    if digits.is_empty() {
        return None;
    }

    let canonical = if digits.len() == CANONICAL_LEN && digits.starts_with("255") {
        digits
    } else if digits.len() == LOCAL_LEN && digits.starts_with('0') {
        format!("255{}", &digits[1..])
    } else if digits.len() == BARE_LEN {
        format!("255{digits}")
    } else {
        return None;
    };

    // Subscriber part must be a mobile number (06x / 07x ranges).
    let subscriber = &canonical[3..];
    if !subscriber.starts_with('6') && !subscriber.starts_with('7') {
        return None;
    }

    Some(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_canonical_passes_through() {
        assert_eq!(
            normalize_phone("255712345678").as_deref(),
            Some("255712345678")
        );
    }

    #[test]
    fn leading_zero_local_form() {
        assert_eq!(
            normalize_phone("0712345678").as_deref(),
            Some("255712345678")
        );
    }

    #[test]
    fn bare_nine_digit_mobile() {
        assert_eq!(
            normalize_phone("712345678").as_deref(),
            Some("255712345678")
        );
        assert_eq!(
            normalize_phone("655000111").as_deref(),
            Some("255655000111")
        );
    }

    #[test]
    fn all_accepted_forms_agree() {
        let forms = ["712345678", "0712345678", "255712345678", "+255712345678"];
        for form in forms {
            assert_eq!(
                normalize_phone(form).as_deref(),
                Some("255712345678"),
                "form {form:?} did not canonicalize"
            );
        }
    }

    #[test]
    fn punctuation_and_whitespace_stripped() {
        assert_eq!(
            normalize_phone("+255 (712) 345-678").as_deref(),
            Some("255712345678")
        );
    }

    #[test]
    fn malformed_inputs_rejected() {
        assert_eq!(normalize_phone(""), None);
        assert_eq!(normalize_phone("not a phone"), None);
        assert_eq!(normalize_phone("12345"), None);
        // Too many digits.
        assert_eq!(normalize_phone("2557123456789"), None);
        // Nine digits but not a mobile prefix.
        assert_eq!(normalize_phone("812345678"), None);
        // Landline prefix in local form.
        assert_eq!(normalize_phone("0222345678"), None);
    }
}
