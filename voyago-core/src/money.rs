//! Monetary amounts are integer cents throughout. Percentages are
//! expressed in basis points so fare math never touches floats.

pub type Cents = i64;

/// One percent in basis points.
pub const PERCENT: i64 = 100;

/// Applies a basis-point percentage to an amount, rounding half up.
/// Euclidean division keeps the rounding direction consistent when the
/// adjustment is negative, so a -10% discount on an exact multiple stays
/// exact instead of losing a cent to truncation.
pub fn apply_bp(amount: Cents, basis_points: i64) -> Cents {
    (amount * basis_points + 5_000).div_euclid(10_000)
}

/// Convenience for whole-percent rates such as service tax.
pub fn apply_percent(amount: Cents, percent: i64) -> Cents {
    apply_bp(amount, percent * PERCENT)
}

/// Renders cents as a decimal string for responses, e.g. 1050 -> "10.50".
pub fn format_cents(amount: Cents) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up() {
        assert_eq!(apply_bp(1_000, 1_250), 125);
        assert_eq!(apply_bp(999, 500), 50);
        assert_eq!(apply_bp(101, 5_000), 51);
    }

    #[test]
    fn negative_adjustments_stay_exact() {
        assert_eq!(apply_bp(10_000, -1_000), -1_000);
        assert_eq!(apply_bp(10_000, -1_500), -1_500);
        assert_eq!(apply_bp(48_000, -500), -2_400);
    }

    #[test]
    fn negative_adjustments_round_half_up() {
        // -999.5 rounds to -999, mirroring 999.5 -> 1000.
        assert_eq!(apply_bp(9_995, -1_000), -999);
        assert_eq!(apply_bp(9_994, -1_000), -999);
        assert_eq!(apply_bp(9_996, -1_000), -1_000);
    }

    #[test]
    fn whole_percent_matches_bp() {
        assert_eq!(apply_percent(20_000, 18), apply_bp(20_000, 1_800));
    }

    #[test]
    fn formats_negative_amounts() {
        assert_eq!(format_cents(1_050), "10.50");
        assert_eq!(format_cents(-5), "-0.05");
        assert_eq!(format_cents(0), "0.00");
    }
}
