use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use super::direction::{DirectionResolver, Resolution};
use super::extractor::ArrivalExtractor;
use crate::config::StationConfig;
use crate::model::{Arrival, Bound, TripRecord};

/// Soonest arrivals kept per bound.
pub const MAX_ARRIVALS_PER_BOUND: usize = 5;

/// One complete aggregation result: arrivals for both bounds from a single poll.
///
/// Published as an immutable snapshot; a new poll builds a new board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrivalBoard {
    pub generated_at: DateTime<Utc>,
    pub northbound: Vec<Arrival>,
    pub southbound: Vec<Arrival>,
}

impl ArrivalBoard {
    /// An empty board, the steady state before the first poll or overnight.
    pub fn empty() -> Self {
        Self {
            generated_at: Utc::now(),
            northbound: Vec::new(),
            southbound: Vec::new(),
        }
    }

    pub fn get(&self, bound: Bound) -> &[Arrival] {
        match bound {
            Bound::Northbound => &self.northbound,
            Bound::Southbound => &self.southbound,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.northbound.is_empty() && self.southbound.is_empty()
    }

    fn list_mut(&mut self, bound: Bound) -> &mut Vec<Arrival> {
        match bound {
            Bound::Northbound => &mut self.northbound,
            Bound::Southbound => &mut self.southbound,
        }
    }
}

impl Default for ArrivalBoard {
    fn default() -> Self {
        Self::empty()
    }
}

/// Maps a feed snapshot to the arrival board for one station.
pub struct FeedAggregator {
    station: StationConfig,
    resolver: DirectionResolver,
}

impl FeedAggregator {
    pub fn new(station: StationConfig) -> Self {
        let resolver = DirectionResolver::new(&station.keywords);
        Self { station, resolver }
    }

    /// Builds a board from `trips`. Never fails: no trips means an empty board.
    ///
    /// Sorting and capping happen after every trip is seen, because the soonest
    /// arrivals are a property of the whole set.
    pub fn aggregate(&self, trips: &[TripRecord]) -> ArrivalBoard {
        let mut board = ArrivalBoard::empty();
        let mut reasons: HashMap<Resolution, usize> = HashMap::new();
        let mut skipped_routes = 0usize;

        for trip in trips {
            if !self.station.monitored_routes.allows(&trip.route_id) {
                skipped_routes += 1;
                continue;
            }

            let (bound, reason) = self.resolver.resolve_with_reason(trip);
            *reasons.entry(reason).or_default() += 1;

            if let Some(arrival) = ArrivalExtractor::extract(trip, bound, &self.station) {
                board.list_mut(bound).push(arrival);
            }
        }

        for bound in Bound::ALL {
            let list = board.list_mut(bound);
            list.sort_by_key(|a| a.arrival_epoch_seconds);
            list.truncate(MAX_ARRIVALS_PER_BOUND);
        }

        debug!(
            trips = trips.len(),
            skipped_routes,
            by_direction_id = reasons.get(&Resolution::DirectionId).copied().unwrap_or(0),
            by_headsign = reasons.get(&Resolution::Headsign).copied().unwrap_or(0),
            by_trip_id = reasons.get(&Resolution::TripId).copied().unwrap_or(0),
            by_default = reasons.get(&Resolution::Default).copied().unwrap_or(0),
            northbound = board.northbound.len(),
            southbound = board.southbound.len(),
            "Aggregated feed"
        );

        board
    }
}
