use serde::Deserialize;
use thiserror::Error;

use voyago_core::booking::{BusSeat, SeatPosition};

#[derive(Debug, Clone, Deserialize)]
pub enum SeatRequest {
    /// Exact seats chosen on the seat map.
    Specific(Vec<String>),
    /// Let the allocator pick this many seats.
    Auto(usize),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeatError {
    #[error("seat {0} does not exist on this bus")]
    UnknownSeat(String),
    #[error("seats already taken: {0:?}")]
    SeatsTaken(Vec<String>),
    #[error("only {available} seats left, {requested} requested")]
    NotEnoughSeats { requested: usize, available: usize },
    #[error("duplicate seat in request: {0}")]
    DuplicateSeat(String),
}

fn auto_rank(position: SeatPosition) -> u8 {
    match position {
        SeatPosition::Window => 0,
        SeatPosition::Aisle => 1,
        SeatPosition::Sleeper => 2,
        SeatPosition::EmergencyExit => 3,
        SeatPosition::NearToilet => 4,
    }
}

/// Resolves a seat request against the trip's seat map. Specific picks
/// must all exist and all be free. Auto picks fill window seats first
/// and leave the seats nobody asks for until last.
pub fn pick_seats(map: &[BusSeat], request: &SeatRequest) -> Result<Vec<String>, SeatError> {
    match request {
        SeatRequest::Specific(numbers) => {
            let mut seen = Vec::with_capacity(numbers.len());
            let mut taken = Vec::new();
            for number in numbers {
                if seen.contains(number) {
                    return Err(SeatError::DuplicateSeat(number.clone()));
                }
                let seat = map
                    .iter()
                    .find(|s| &s.number == number)
                    .ok_or_else(|| SeatError::UnknownSeat(number.clone()))?;
                if seat.taken {
                    taken.push(number.clone());
                }
                seen.push(number.clone());
            }
            if !taken.is_empty() {
                return Err(SeatError::SeatsTaken(taken));
            }
            Ok(seen)
        }
        SeatRequest::Auto(count) => {
            let mut free: Vec<&BusSeat> = map.iter().filter(|s| !s.taken).collect();
            if free.len() < *count {
                return Err(SeatError::NotEnoughSeats {
                    requested: *count,
                    available: free.len(),
                });
            }
            free.sort_by(|a, b| {
                auto_rank(a.position)
                    .cmp(&auto_rank(b.position))
                    .then_with(|| a.number.cmp(&b.number))
            });
            Ok(free.iter().take(*count).map(|s| s.number.clone()).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(number: &str, position: SeatPosition, taken: bool) -> BusSeat {
        BusSeat {
            number: number.to_string(),
            position,
            taken,
        }
    }

    fn map() -> Vec<BusSeat> {
        vec![
            seat("1A", SeatPosition::Window, true),
            seat("1B", SeatPosition::Aisle, false),
            seat("2A", SeatPosition::Window, false),
            seat("2B", SeatPosition::Aisle, false),
            seat("9B", SeatPosition::NearToilet, false),
        ]
    }

    #[test]
    fn test_specific_seats_all_free() {
        let picked = pick_seats(&map(), &SeatRequest::Specific(vec!["2A".into(), "2B".into()]));
        assert_eq!(picked.unwrap(), vec!["2A".to_string(), "2B".to_string()]);
    }

    #[test]
    fn test_specific_reports_taken_seats() {
        let err = pick_seats(&map(), &SeatRequest::Specific(vec!["1A".into()])).unwrap_err();
        assert_eq!(err, SeatError::SeatsTaken(vec!["1A".to_string()]));
    }

    #[test]
    fn test_specific_rejects_unknown_and_duplicate() {
        let err = pick_seats(&map(), &SeatRequest::Specific(vec!["7Z".into()])).unwrap_err();
        assert_eq!(err, SeatError::UnknownSeat("7Z".to_string()));

        let err =
            pick_seats(&map(), &SeatRequest::Specific(vec!["2A".into(), "2A".into()])).unwrap_err();
        assert_eq!(err, SeatError::DuplicateSeat("2A".to_string()));
    }

    #[test]
    fn test_auto_prefers_window() {
        let picked = pick_seats(&map(), &SeatRequest::Auto(2)).unwrap();
        assert_eq!(picked, vec!["2A".to_string(), "1B".to_string()]);
    }

    #[test]
    fn test_auto_overflow() {
        let err = pick_seats(&map(), &SeatRequest::Auto(5)).unwrap_err();
        assert_eq!(
            err,
            SeatError::NotEnoughSeats {
                requested: 5,
                available: 4
            }
        );
    }
}
