use serde::{Deserialize, Serialize};
use voyago_core::money::{apply_percent, Cents};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RentalRates {
    pub daily_cents: Cents,
    /// Discounted rate for each full 7-day block.
    pub weekly_cents: Cents,
    /// Discounted rate for each full 30-day block.
    pub monthly_cents: Cents,
}

/// Rental cost over a whole number of days. Full months bill at the
/// monthly rate, remaining full weeks at the weekly rate, leftover days
/// at the daily rate. A rental shorter than a day still bills one day.
pub fn rental_cost(rates: &RentalRates, days: i64) -> Cents {
    let days = days.max(1);
    let months = days / 30;
    let weeks = (days % 30) / 7;
    let remainder = (days % 30) % 7;
    months * rates.monthly_cents + weeks * rates.weekly_cents + remainder * rates.daily_cents
}

/// Hotel stay cost for a number of nights across identical rooms, with
/// the property's tax percentage added on top of the room total.
pub fn stay_cost(rate_per_night_cents: Cents, nights: i64, rooms: i64, tax_percent: i64) -> Cents {
    let rooms_total = rate_per_night_cents * nights.max(1) * rooms.max(1);
    rooms_total + apply_percent(rooms_total, tax_percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates() -> RentalRates {
        RentalRates {
            daily_cents: 5_000,
            weekly_cents: 30_000,
            monthly_cents: 100_000,
        }
    }

    #[test]
    fn test_daily_only() {
        assert_eq!(rental_cost(&rates(), 3), 15_000);
    }

    #[test]
    fn test_week_block_is_cheaper_than_seven_days() {
        assert_eq!(rental_cost(&rates(), 7), 30_000);
        assert_eq!(rental_cost(&rates(), 10), 45_000);
    }

    #[test]
    fn test_month_plus_week_plus_days() {
        // 30 + 7 + 2
        assert_eq!(rental_cost(&rates(), 39), 140_000);
    }

    #[test]
    fn test_minimum_one_day() {
        assert_eq!(rental_cost(&rates(), 0), 5_000);
    }

    #[test]
    fn test_stay_cost() {
        assert_eq!(stay_cost(8_000, 3, 2, 0), 48_000);
        assert_eq!(stay_cost(8_000, 0, 1, 0), 8_000);
    }

    #[test]
    fn test_stay_cost_adds_tax() {
        // 2 rooms, 3 nights at 80.00 plus 10% tax.
        assert_eq!(stay_cost(8_000, 3, 2, 10), 52_800);
        assert_eq!(stay_cost(9_999, 1, 1, 18), 11_799);
    }
}
