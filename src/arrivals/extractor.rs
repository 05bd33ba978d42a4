use tracing::trace;

use crate::config::StationConfig;
use crate::model::{Arrival, Bound, TripRecord};

/// Longest destination label kept for display, in characters.
pub const DESTINATION_MAX_CHARS: usize = 16;

/// Shown when a trip has no headsign.
pub const UNKNOWN_DESTINATION: &str = "Unknown";

/// Finds a trip's event at the monitored platform for one bound.
pub struct ArrivalExtractor;

impl ArrivalExtractor {
    /// Returns the arrival at `base_stop_id + suffix(bound)`, if the trip serves it.
    ///
    /// Most trips do not stop at the target platform, so `None` is the common
    /// result rather than a failure.
    pub fn extract(trip: &TripRecord, bound: Bound, station: &StationConfig) -> Option<Arrival> {
        let target = station.target_stop_id(bound);

        let Some(event) = trip.stop_events.iter().find(|e| e.stop_id == target) else {
            trace!(trip_id = %trip.trip_id, target = %target, "Trip does not serve target stop");
            return None;
        };

        let time = event.display_time()?;

        Some(Arrival {
            route_id: trip.route_id.clone(),
            destination: display_destination(trip.headsign.as_deref()),
            bound,
            arrival_epoch_seconds: time,
        })
    }
}

/// Truncates a headsign to the display budget on a character boundary.
pub fn display_destination(headsign: Option<&str>) -> String {
    match headsign.map(str::trim).filter(|h| !h.is_empty()) {
        Some(h) => h.chars().take(DESTINATION_MAX_CHARS).collect(),
        None => UNKNOWN_DESTINATION.to_string(),
    }
}
