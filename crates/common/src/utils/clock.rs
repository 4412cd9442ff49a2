use chrono::Utc;

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Epoch milliseconds rendered as a decimal string, the on-disk timestamp format.
pub fn now_millis_string() -> String {
    now_millis().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_string_is_decimal_and_advances() {
        let a: i64 = now_millis_string().parse().expect("decimal");
        let b = now_millis();
        assert!(a > 1_600_000_000_000);
        assert!(b >= a);
    }
}
