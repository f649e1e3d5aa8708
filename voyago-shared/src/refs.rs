use rand::Rng;

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn random_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHANUMERIC[rng.gen_range(0..ALPHANUMERIC.len())] as char)
        .collect()
}

/// Booking reference in the `BK-XXXXXXXX` format shown on itineraries.
pub fn booking_reference() -> String {
    format!("BK-{}", random_code(8))
}

/// 10-digit numeric Passenger Name Record for train and bus tickets.
pub fn pnr_number() -> String {
    let mut rng = rand::thread_rng();
    (0..10).map(|_| char::from(b'0' + rng.gen_range(0..10u8))).collect()
}

pub fn payment_reference() -> String {
    format!("PAY-{}", random_code(10))
}

pub fn refund_reference() -> String {
    format!("REF-{}", random_code(8))
}

pub fn transaction_reference() -> String {
    format!("TXN-{}", random_code(12))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_reference_format() {
        let r = booking_reference();
        assert!(r.starts_with("BK-"));
        assert_eq!(r.len(), 11);
        assert!(r[3..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn pnr_is_ten_digits() {
        let pnr = pnr_number();
        assert_eq!(pnr.len(), 10);
        assert!(pnr.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn prefixes_are_distinct() {
        assert!(payment_reference().starts_with("PAY-"));
        assert!(refund_reference().starts_with("REF-"));
        assert!(transaction_reference().starts_with("TXN-"));
    }
}
