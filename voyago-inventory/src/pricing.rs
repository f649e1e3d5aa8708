use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use voyago_core::booking::SeatPosition;
use voyago_core::money::{apply_bp, Cents};

/// Adjustment table in basis points. Defaults mirror the operator's
/// published pricing rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusPricingConfig {
    pub last_day_bp: i64,
    pub last_three_days_bp: i64,
    pub early_bird_bp: i64,
    pub window_bp: i64,
    pub sleeper_bp: i64,
    pub emergency_exit_bp: i64,
    pub near_toilet_bp: i64,
    pub high_occupancy_bp: i64,
    pub low_occupancy_bp: i64,
}

impl Default for BusPricingConfig {
    fn default() -> Self {
        Self {
            last_day_bp: 2_000,
            last_three_days_bp: 1_000,
            early_bird_bp: -1_000,
            window_bp: 500,
            sleeper_bp: 1_500,
            emergency_exit_bp: -500,
            near_toilet_bp: -1_000,
            high_occupancy_bp: 1_000,
            low_occupancy_bp: -500,
        }
    }
}

/// Dynamic per-seat bus pricing. Each factor adjusts the base fare by a
/// fixed share of the base, so the factors compose additively.
pub struct BusPricingEngine {
    config: BusPricingConfig,
}

impl BusPricingEngine {
    pub fn new(config: BusPricingConfig) -> Self {
        Self { config }
    }

    fn departure_bp(&self, departure: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        let days_out = (departure - now).num_days();
        if days_out <= 1 {
            self.config.last_day_bp
        } else if days_out <= 3 {
            self.config.last_three_days_bp
        } else if days_out >= 30 {
            self.config.early_bird_bp
        } else {
            0
        }
    }

    fn position_bp(&self, position: SeatPosition) -> i64 {
        match position {
            SeatPosition::Window => self.config.window_bp,
            SeatPosition::Aisle => 0,
            SeatPosition::Sleeper => self.config.sleeper_bp,
            SeatPosition::EmergencyExit => self.config.emergency_exit_bp,
            SeatPosition::NearToilet => self.config.near_toilet_bp,
        }
    }

    fn occupancy_bp(&self, occupied: i32, total: i32) -> i64 {
        if total <= 0 {
            return 0;
        }
        let pct = occupied as i64 * 100 / total as i64;
        if pct > 80 {
            self.config.high_occupancy_bp
        } else if pct < 30 {
            self.config.low_occupancy_bp
        } else {
            0
        }
    }

    pub fn seat_fare(
        &self,
        base_fare_cents: Cents,
        position: SeatPosition,
        occupied: i32,
        total: i32,
        departure: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Cents {
        let bp = self.departure_bp(departure, now)
            + self.position_bp(position)
            + self.occupancy_bp(occupied, total);
        base_fare_cents + apply_bp(base_fare_cents, bp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn engine() -> BusPricingEngine {
        BusPricingEngine::new(BusPricingConfig::default())
    }

    #[test]
    fn test_last_minute_window_seat() {
        let now = Utc::now();
        let departure = now + Duration::hours(12);
        // +20% last day, +5% window, 50% occupancy neutral.
        let fare = engine().seat_fare(10_000, SeatPosition::Window, 20, 40, departure, now);
        assert_eq!(fare, 12_500);
    }

    #[test]
    fn test_early_bird_discount() {
        let now = Utc::now();
        let departure = now + Duration::days(45);
        let fare = engine().seat_fare(10_000, SeatPosition::Aisle, 20, 40, departure, now);
        assert_eq!(fare, 9_000);
    }

    #[test]
    fn test_occupancy_premium_stacks_with_sleeper() {
        let now = Utc::now();
        let departure = now + Duration::days(10);
        // +15% sleeper, +10% occupancy above 80%.
        let fare = engine().seat_fare(10_000, SeatPosition::Sleeper, 33, 40, departure, now);
        assert_eq!(fare, 12_500);
    }

    #[test]
    fn test_near_toilet_on_empty_bus() {
        let now = Utc::now();
        let departure = now + Duration::days(10);
        // -10% seat, -5% occupancy below 30%.
        let fare = engine().seat_fare(10_000, SeatPosition::NearToilet, 2, 40, departure, now);
        assert_eq!(fare, 8_500);
    }

    #[test]
    fn test_zero_capacity_is_neutral() {
        let now = Utc::now();
        let departure = now + Duration::days(10);
        let fare = engine().seat_fare(10_000, SeatPosition::Aisle, 0, 0, departure, now);
        assert_eq!(fare, 10_000);
    }
}
