//! Phone number normalization

/// Normalize to `+<digits>`
///
/// Non-digits are stripped; a bare 10-digit national number gets
/// `country_code` prefixed. Longer numbers keep their digits as-is.
pub fn normalize(phone: &str, country_code: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 10 {
        format!("+{country_code}{digits}")
    } else {
        format!("+{digits}")
    }
}

/// Whether the input holds any digits at all
pub fn has_digits(phone: &str) -> bool {
    phone.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_digits_get_country_code() {
        assert_eq!(normalize("(555) 123-4567", "1"), "+15551234567");
        assert_eq!(normalize("5551234567", "44"), "+445551234567");
    }

    #[test]
    fn longer_numbers_only_stripped() {
        assert_eq!(normalize("+1 555 123 4567", "1"), "+15551234567");
        assert_eq!(normalize("+34 612 345 678 9", "1"), "+346123456789");
    }

    #[test]
    fn already_normalized_is_stable() {
        let once = normalize("555.123.4567", "1");
        assert_eq!(normalize(&once, "1"), once);
    }

    #[test]
    fn digit_check() {
        assert!(has_digits("+1"));
        assert!(!has_digits("call me"));
    }
}
