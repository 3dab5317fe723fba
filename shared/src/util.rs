use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a prefixed opaque identifier, e.g. `acc_3f2a...`.
pub fn prefixed_id(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}

/// Random code drawn from `alphabet`
pub fn random_code(alphabet: &[u8], len: usize) -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

/// 6-digit numeric one-time code
pub fn numeric_code() -> String {
    use rand::Rng;
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// Last four characters of a phone number, used for placeholder names.
pub fn phone_suffix(phone: &str) -> &str {
    let start = phone
        .char_indices()
        .rev()
        .nth(3)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    &phone[start..]
}

/// f64 → Decimal (NaN / infinite become zero)
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Decimal → f64 rounded to cents
pub fn to_f64(value: Decimal) -> f64 {
    value.round_dp(2).to_f64().unwrap_or_default()
}

/// Whole minutes elapsed between two millisecond timestamps (floored, never negative)
pub fn minutes_between(from_ms: i64, to_ms: i64) -> i64 {
    ((to_ms - from_ms).max(0)) / 60_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_suffix() {
        assert_eq!(phone_suffix("+15551234567"), "4567");
        assert_eq!(phone_suffix("123"), "123");
        assert_eq!(phone_suffix(""), "");
    }

    #[test]
    fn test_prefixed_id_unique() {
        let a = prefixed_id("ord");
        let b = prefixed_id("ord");
        assert!(a.starts_with("ord_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_codes() {
        let code = random_code(b"AB", 8);
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c == 'A' || c == 'B'));
        let otp = numeric_code();
        assert_eq!(otp.len(), 6);
        assert!(otp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_money_conversion() {
        let sum = to_decimal(0.1) + to_decimal(0.2);
        assert_eq!(to_f64(sum), 0.3);
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
    }

    #[test]
    fn test_minutes_between() {
        assert_eq!(minutes_between(0, 90_000), 1);
        assert_eq!(minutes_between(120_000, 0), 0);
    }
}
