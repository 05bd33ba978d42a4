use crate::config::DirectionKeywords;
use crate::model::{Bound, TripRecord};

/// Which rule of the fallback chain decided a trip's bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    DirectionId,
    Headsign,
    TripId,
    Default,
}

/// Classifies trips as northbound or southbound.
///
/// Real-time feeds are inconsistent about which field they populate, so the
/// rules run in a fixed order and the first that applies wins:
///
/// 1. `direction_id` of exactly 0 (northbound) or 1 (southbound)
/// 2. headsign keywords, northbound set first
/// 3. a bound marker in the trip id (trailing `N`/`S`, or the NYCT `..N`/`..S` token)
/// 4. northbound
#[derive(Debug, Clone)]
pub struct DirectionResolver {
    northbound: Vec<String>,
    southbound: Vec<String>,
}

impl DirectionResolver {
    pub fn new(keywords: &DirectionKeywords) -> Self {
        let lower = |words: &[String]| words.iter().map(|w| w.to_lowercase()).collect();
        Self {
            northbound: lower(&keywords.northbound),
            southbound: lower(&keywords.southbound),
        }
    }

    pub fn resolve(&self, trip: &TripRecord) -> Bound {
        self.resolve_with_reason(trip).0
    }

    pub fn resolve_with_reason(&self, trip: &TripRecord) -> (Bound, Resolution) {
        match trip.direction_id {
            Some(0) => return (Bound::Northbound, Resolution::DirectionId),
            Some(1) => return (Bound::Southbound, Resolution::DirectionId),
            _ => {}
        }

        if let Some(headsign) = trip.headsign.as_deref() {
            if let Some(bound) = self.bound_from_headsign(headsign) {
                return (bound, Resolution::Headsign);
            }
        }

        if let Some(bound) = bound_from_trip_id(&trip.trip_id) {
            return (bound, Resolution::TripId);
        }

        (Bound::Northbound, Resolution::Default)
    }

    fn bound_from_headsign(&self, headsign: &str) -> Option<Bound> {
        let headsign = headsign.to_lowercase();
        let hit = |words: &[String]| words.iter().any(|w| headsign.contains(w.as_str()));

        if hit(&self.northbound) {
            Some(Bound::Northbound)
        } else if hit(&self.southbound) {
            Some(Bound::Southbound)
        } else {
            None
        }
    }
}

impl Default for DirectionResolver {
    fn default() -> Self {
        Self::new(&DirectionKeywords::default())
    }
}

fn bound_from_trip_id(trip_id: &str) -> Option<Bound> {
    let marker = |c: char| match c {
        'N' => Some(Bound::Northbound),
        'S' => Some(Bound::Southbound),
        _ => None,
    };

    if let Some(bound) = trip_id.chars().last().and_then(marker) {
        return Some(bound);
    }

    // NYCT ids look like `093250_R..S93R`: the letter after `..` is the bound.
    trip_id
        .rsplit_once("..")
        .and_then(|(_, rest)| rest.chars().next())
        .and_then(marker)
}
