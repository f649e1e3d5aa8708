use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use voyago_core::money::{apply_bp, apply_percent, Cents};

/// Tatkal surcharge as basis points of the base fare.
const TATKAL_BP_NON_AC: i64 = 1_000;
const TATKAL_BP_AC: i64 = 3_000;

/// Quota opening lead time before departure.
const TATKAL_WINDOW_AC: i64 = 1;
const TATKAL_WINDOW_NON_AC: i64 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainFareInputs {
    pub distance_km: i64,
    pub fare_per_km_cents: Cents,
    pub reservation_charge_cents: Cents,
    /// Zero for ordinary trains.
    pub superfast_charge_cents: Cents,
    pub is_ac_coach: bool,
    pub is_tatkal: bool,
    pub service_tax_percent: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainFareBreakdown {
    pub base_cents: Cents,
    pub reservation_charge_cents: Cents,
    pub superfast_charge_cents: Cents,
    pub tatkal_surcharge_cents: Cents,
    pub service_tax_cents: Cents,
    pub total_cents: Cents,
}

/// Per-passenger train fare: distance-proportional base plus fixed
/// charges, a Tatkal surcharge on the base, and service tax on top.
pub fn train_fare(inputs: &TrainFareInputs) -> TrainFareBreakdown {
    let base = inputs.distance_km * inputs.fare_per_km_cents;

    let tatkal = if inputs.is_tatkal {
        let bp = if inputs.is_ac_coach {
            TATKAL_BP_AC
        } else {
            TATKAL_BP_NON_AC
        };
        apply_bp(base, bp)
    } else {
        0
    };

    let subtotal = base + inputs.reservation_charge_cents + inputs.superfast_charge_cents + tatkal;
    let tax = apply_percent(subtotal, inputs.service_tax_percent);

    TrainFareBreakdown {
        base_cents: base,
        reservation_charge_cents: inputs.reservation_charge_cents,
        superfast_charge_cents: inputs.superfast_charge_cents,
        tatkal_surcharge_cents: tatkal,
        service_tax_cents: tax,
        total_cents: subtotal + tax,
    }
}

/// Tatkal bookings open one day out for AC coaches and two days out for
/// non-AC, and stay open until departure.
pub fn tatkal_window_open(is_ac_coach: bool, departure: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let lead = if is_ac_coach {
        Duration::days(TATKAL_WINDOW_AC)
    } else {
        Duration::days(TATKAL_WINDOW_NON_AC)
    };
    now >= departure - lead && now < departure
}

/// Whether a train runs on the given date. `running_days` is a Sunday
/// through Saturday bitmask with bit 0 for Sunday.
pub fn runs_on(running_days: u8, date: NaiveDate) -> bool {
    let day_index = (date.weekday().num_days_from_monday() + 1) % 7;
    running_days & (1 << day_index) != 0
}

/// Mask for daily services.
pub const RUNS_DAILY: u8 = 0b0111_1111;

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> TrainFareInputs {
        TrainFareInputs {
            distance_km: 500,
            fare_per_km_cents: 45,
            reservation_charge_cents: 4_000,
            superfast_charge_cents: 3_000,
            is_ac_coach: false,
            is_tatkal: false,
            service_tax_percent: 5,
        }
    }

    #[test]
    fn test_ordinary_fare() {
        let fare = train_fare(&inputs());
        assert_eq!(fare.base_cents, 22_500);
        assert_eq!(fare.tatkal_surcharge_cents, 0);
        // 22500 + 4000 + 3000 = 29500, tax 5% = 1475
        assert_eq!(fare.service_tax_cents, 1_475);
        assert_eq!(fare.total_cents, 30_975);
    }

    #[test]
    fn test_tatkal_surcharge_non_ac() {
        let mut i = inputs();
        i.is_tatkal = true;
        let fare = train_fare(&i);
        assert_eq!(fare.tatkal_surcharge_cents, 2_250);
    }

    #[test]
    fn test_tatkal_surcharge_ac() {
        let mut i = inputs();
        i.is_tatkal = true;
        i.is_ac_coach = true;
        let fare = train_fare(&i);
        assert_eq!(fare.tatkal_surcharge_cents, 6_750);
    }

    #[test]
    fn test_tatkal_window() {
        let departure = Utc::now() + Duration::hours(20);
        assert!(tatkal_window_open(true, departure, Utc::now()));
        // Non-AC opens two days out, so 20 hours out is also open.
        assert!(tatkal_window_open(false, departure, Utc::now()));

        let far_out = Utc::now() + Duration::days(5);
        assert!(!tatkal_window_open(true, far_out, Utc::now()));
        assert!(!tatkal_window_open(false, far_out, Utc::now()));

        let departed = Utc::now() - Duration::hours(1);
        assert!(!tatkal_window_open(true, departed, Utc::now()));
    }

    #[test]
    fn test_running_days_mask() {
        // 2026-08-23 is a Sunday.
        let sunday = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();

        let weekends_only = 0b0100_0001;
        assert!(runs_on(weekends_only, sunday));
        assert!(runs_on(weekends_only, saturday));
        assert!(!runs_on(weekends_only, monday));
        assert!(runs_on(RUNS_DAILY, monday));
    }
}
