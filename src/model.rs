//! Normalized trip and arrival types shared by the feed and display layers.

use serde::Serialize;
use std::fmt;

/// Travel direction category shown on the board.
///
/// Distinct from the raw GTFS `direction_id`, which feeds populate inconsistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bound {
    Northbound,
    Southbound,
}

impl Bound {
    pub const ALL: [Bound; 2] = [Bound::Northbound, Bound::Southbound];

    /// Header text for this bound.
    pub fn label(self) -> &'static str {
        match self {
            Bound::Northbound => "NORTH BOUND",
            Bound::Southbound => "SOUTH BOUND",
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Northbound => write!(f, "northbound"),
            Bound::Southbound => write!(f, "southbound"),
        }
    }
}

impl std::str::FromStr for Bound {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "n" | "north" | "northbound" => Ok(Bound::Northbound),
            "s" | "south" | "southbound" => Ok(Bound::Southbound),
            other => Err(anyhow::anyhow!("unknown bound '{other}'")),
        }
    }
}

/// One scheduled stop-time event of a trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopEvent {
    pub stop_id: String,
    pub arrival_epoch_seconds: Option<i64>,
    pub departure_epoch_seconds: Option<i64>,
}

impl StopEvent {
    pub fn new(stop_id: impl Into<String>, arrival: Option<i64>, departure: Option<i64>) -> Self {
        Self {
            stop_id: stop_id.into(),
            arrival_epoch_seconds: arrival,
            departure_epoch_seconds: departure,
        }
    }

    /// Arrival time, else departure time. Negative times count as absent.
    pub fn display_time(&self) -> Option<i64> {
        let valid = |t: &i64| *t >= 0;
        self.arrival_epoch_seconds
            .filter(valid)
            .or(self.departure_epoch_seconds.filter(valid))
    }
}

/// Snapshot of a single feed entity's trip update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TripRecord {
    pub trip_id: String,
    pub route_id: String,
    pub headsign: Option<String>,
    pub direction_id: Option<u32>,
    pub stop_events: Vec<StopEvent>,
}

/// A train expected at the monitored station.
///
/// Minutes-to-arrival is always derived from the current clock, so a board
/// counts down between polls without being rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arrival {
    pub route_id: String,
    pub destination: String,
    pub bound: Bound,
    pub arrival_epoch_seconds: i64,
}

impl Arrival {
    /// Whole minutes from `now` until arrival, floored and never negative.
    pub fn minutes_until(&self, now: i64) -> i64 {
        (self.arrival_epoch_seconds - now).div_euclid(60).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrival_at(t: i64) -> Arrival {
        Arrival {
            route_id: "R".to_string(),
            destination: "Whitehall".to_string(),
            bound: Bound::Northbound,
            arrival_epoch_seconds: t,
        }
    }

    #[test]
    fn test_minutes_until_floors() {
        let now = 1_700_000_000;
        assert_eq!(arrival_at(now + 300).minutes_until(now), 5);
        assert_eq!(arrival_at(now + 359).minutes_until(now), 5);
        assert_eq!(arrival_at(now + 59).minutes_until(now), 0);
    }

    #[test]
    fn test_minutes_until_never_negative() {
        let now = 1_700_000_000;
        assert_eq!(arrival_at(now - 1).minutes_until(now), 0);
        assert_eq!(arrival_at(now - 600).minutes_until(now), 0);
    }

    #[test]
    fn test_minutes_decrease_as_clock_advances() {
        let arrival = arrival_at(1_700_000_600);
        assert!(arrival.minutes_until(1_700_000_000) > arrival.minutes_until(1_700_000_300));
    }

    #[test]
    fn test_bound_from_str() {
        assert_eq!("north".parse::<Bound>().unwrap(), Bound::Northbound);
        assert_eq!("S".parse::<Bound>().unwrap(), Bound::Southbound);
        assert!("east".parse::<Bound>().is_err());
    }

    #[test]
    fn test_stop_event_display_time() {
        assert_eq!(StopEvent::new("R35N", Some(1), Some(5)).display_time(), Some(1));
        assert_eq!(StopEvent::new("R35N", None, Some(5)).display_time(), Some(5));
        assert_eq!(StopEvent::new("R35N", Some(-1), Some(5)).display_time(), Some(5));
        assert_eq!(StopEvent::new("R35N", None, None).display_time(), None);
    }
}
