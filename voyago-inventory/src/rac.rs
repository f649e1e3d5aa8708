use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Berths per sleeper coach.
pub const COACH_CAPACITY: i32 = 72;
/// Shared side-lower berths available for Reservation Against Cancellation.
pub const RAC_LIMIT: i32 = 20;
/// Waitlist depth before a run stops accepting bookings.
pub const WAITLIST_LIMIT: i32 = 50;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QuotaCounts {
    pub confirmed: i32,
    pub rac: i32,
    pub waitlisted: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BerthDecision {
    /// Berth index within the coach, 1-based.
    Confirmed(i32),
    /// Position in the RAC queue, 1-based.
    Rac(i32),
    /// Position in the waitlist, 1-based.
    Waitlisted(i32),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("train is fully booked including the waitlist")]
    TrainFull,
}

/// Walks each passenger down the ladder: a confirmed berth if one is
/// free, else a RAC slot, else a waitlist position. Fails the whole
/// party if anyone would fall off the end of the waitlist.
pub fn allocate(
    counts: &QuotaCounts,
    passengers: usize,
) -> Result<Vec<BerthDecision>, AllocationError> {
    let mut c = *counts;
    let mut decisions = Vec::with_capacity(passengers);
    for _ in 0..passengers {
        if c.confirmed < COACH_CAPACITY {
            c.confirmed += 1;
            decisions.push(BerthDecision::Confirmed(c.confirmed));
        } else if c.rac < RAC_LIMIT {
            c.rac += 1;
            decisions.push(BerthDecision::Rac(c.rac));
        } else if c.waitlisted < WAITLIST_LIMIT {
            c.waitlisted += 1;
            decisions.push(BerthDecision::Waitlisted(c.waitlisted));
        } else {
            return Err(AllocationError::TrainFull);
        }
    }
    Ok(decisions)
}

/// How many passengers move up after a cancellation frees berths. RAC
/// fills freed confirmed berths first, then the waitlist refills every
/// vacated RAC slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PromotionPlan {
    pub rac_to_confirmed: i32,
    pub waitlist_to_rac: i32,
}

pub fn promotion_plan(
    freed_confirmed: i32,
    freed_rac: i32,
    rac_queue: i32,
    waitlist_queue: i32,
) -> PromotionPlan {
    let rac_to_confirmed = freed_confirmed.min(rac_queue);
    let open_rac = freed_rac + rac_to_confirmed;
    let waitlist_to_rac = open_rac.min(waitlist_queue);
    PromotionPlan {
        rac_to_confirmed,
        waitlist_to_rac,
    }
}

/// Two journeys on the same run collide only when their station
/// sequence ranges overlap. Back-to-back legs share a boundary station
/// without conflict.
pub fn segments_overlap(booked_from: i32, booked_to: i32, from: i32, to: i32) -> bool {
    booked_from < to && booked_to > from
}

/// Lowest berth index free for a journey, given the confirmed berths as
/// `(berth_index, from_seq, to_seq)`. Returns `None` when every berth
/// carries an overlapping ticket, which can happen even after a
/// cancellation when the freed berth sits on a disjoint segment.
pub fn free_berth_for_segment(
    confirmed: &[(i32, i32, i32)],
    from: i32,
    to: i32,
) -> Option<i32> {
    (1..=COACH_CAPACITY).find(|b| {
        !confirmed
            .iter()
            .any(|(cb, f, t)| cb == b && segments_overlap(*f, *t, from, to))
    })
}

const BERTH_CYCLE: [&str; 8] = [
    "LOWER",
    "MIDDLE",
    "UPPER",
    "LOWER",
    "MIDDLE",
    "UPPER",
    "SIDE_LOWER",
    "SIDE_UPPER",
];

/// Berth label for a 1-based berth index, e.g. "S1-23 (UPPER)".
pub fn berth_label(coach: &str, index: i32) -> String {
    let kind = BERTH_CYCLE[((index - 1).rem_euclid(8)) as usize];
    format!("{}-{} ({})", coach, index, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_ladder() {
        let counts = QuotaCounts {
            confirmed: 70,
            rac: 0,
            waitlisted: 0,
        };
        let decisions = allocate(&counts, 4).unwrap();
        assert_eq!(
            decisions,
            vec![
                BerthDecision::Confirmed(71),
                BerthDecision::Confirmed(72),
                BerthDecision::Rac(1),
                BerthDecision::Rac(2),
            ]
        );
    }

    #[test]
    fn test_spills_into_waitlist() {
        let counts = QuotaCounts {
            confirmed: COACH_CAPACITY,
            rac: RAC_LIMIT,
            waitlisted: 3,
        };
        let decisions = allocate(&counts, 2).unwrap();
        assert_eq!(
            decisions,
            vec![BerthDecision::Waitlisted(4), BerthDecision::Waitlisted(5)]
        );
    }

    #[test]
    fn test_full_train_rejects_whole_party() {
        let counts = QuotaCounts {
            confirmed: COACH_CAPACITY,
            rac: RAC_LIMIT,
            waitlisted: WAITLIST_LIMIT - 1,
        };
        assert_eq!(allocate(&counts, 2), Err(AllocationError::TrainFull));
    }

    #[test]
    fn test_promotion_chain() {
        // Two confirmed berths freed, five in RAC, four waitlisted.
        let plan = promotion_plan(2, 0, 5, 4);
        assert_eq!(plan.rac_to_confirmed, 2);
        assert_eq!(plan.waitlist_to_rac, 2);
    }

    #[test]
    fn test_promotion_with_freed_rac_slot() {
        // A cancelled RAC passenger frees a slot directly.
        let plan = promotion_plan(0, 1, 3, 2);
        assert_eq!(plan.rac_to_confirmed, 0);
        assert_eq!(plan.waitlist_to_rac, 1);
    }

    #[test]
    fn test_promotion_bounded_by_queues() {
        let plan = promotion_plan(10, 0, 1, 0);
        assert_eq!(plan.rac_to_confirmed, 1);
        assert_eq!(plan.waitlist_to_rac, 0);
    }

    #[test]
    fn test_segment_overlap() {
        // Booked Delhi(1) -> Kanpur(4).
        assert!(segments_overlap(1, 4, 2, 5));
        assert!(segments_overlap(1, 4, 1, 4));
        // Back-to-back legs share station 4 without conflict.
        assert!(!segments_overlap(1, 4, 4, 7));
        assert!(!segments_overlap(4, 7, 1, 4));
    }

    #[test]
    fn test_free_berth_skips_overlapping_tickets() {
        let confirmed = vec![(1, 1, 4), (2, 1, 4)];
        assert_eq!(free_berth_for_segment(&confirmed, 2, 5), Some(3));
        // A disjoint journey can share berth 1.
        assert_eq!(free_berth_for_segment(&confirmed, 4, 7), Some(1));
    }

    #[test]
    fn test_no_free_berth_when_segment_saturated() {
        // Every berth holds a ticket overlapping stations 1-4.
        let confirmed: Vec<(i32, i32, i32)> =
            (1..=COACH_CAPACITY).map(|b| (b, 1, 4)).collect();
        assert_eq!(free_berth_for_segment(&confirmed, 2, 5), None);
        // The disjoint leg still finds a berth.
        assert_eq!(free_berth_for_segment(&confirmed, 4, 7), Some(1));
    }

    #[test]
    fn test_berth_labels_cycle() {
        assert_eq!(berth_label("S1", 1), "S1-1 (LOWER)");
        assert_eq!(berth_label("S1", 7), "S1-7 (SIDE_LOWER)");
        assert_eq!(berth_label("S1", 9), "S1-9 (LOWER)");
    }
}
