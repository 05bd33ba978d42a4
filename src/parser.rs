//! Protobuf parser for GTFS Realtime feeds.

use anyhow::Result;
use prost::Message;
use std::collections::HashMap;

use crate::gtfs_rt::FeedMessage;
use crate::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
use crate::model::{StopEvent, TripRecord};

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid protobuf for a `FeedMessage`.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage> {
    Ok(FeedMessage::decode(bytes)?)
}

/// Normalizes every live trip update in `feed` into a [`TripRecord`].
///
/// The headsign comes from `TripProperties` when the producer sends one; NYCT
/// feeds do not, so the trip's last stop is looked up in `terminal_names`
/// (keyed by stop id without its bound suffix) instead.
pub fn trips_from_feed(
    feed: &FeedMessage,
    terminal_names: &HashMap<String, String>,
) -> Vec<TripRecord> {
    feed.entity
        .iter()
        .filter(|e| !e.is_deleted())
        .filter_map(|e| e.trip_update.as_ref())
        .map(|tu| {
            let trip = &tu.trip;
            let stop_events: Vec<StopEvent> =
                tu.stop_time_update.iter().map(stop_event).collect();

            let headsign = tu
                .trip_properties
                .as_ref()
                .and_then(|p| p.trip_headsign.clone())
                .filter(|h| !h.trim().is_empty())
                .or_else(|| terminal_name(&stop_events, terminal_names));

            TripRecord {
                trip_id: trip.trip_id().to_string(),
                route_id: trip.route_id().to_string(),
                headsign,
                direction_id: trip.direction_id,
                stop_events,
            }
        })
        .collect()
}

fn stop_event(update: &StopTimeUpdate) -> StopEvent {
    let time = |e: &Option<StopTimeEvent>| e.as_ref().and_then(|e| e.time);
    StopEvent {
        stop_id: update.stop_id().to_string(),
        arrival_epoch_seconds: time(&update.arrival),
        departure_epoch_seconds: time(&update.departure),
    }
}

fn terminal_name(events: &[StopEvent], names: &HashMap<String, String>) -> Option<String> {
    let last = events.last()?;
    let base = last
        .stop_id
        .strip_suffix(['N', 'S'])
        .unwrap_or(&last.stop_id);
    names.get(base).cloned()
}
