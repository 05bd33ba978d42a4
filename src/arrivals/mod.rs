//! Feed-to-arrivals mapping.
//!
//! [`FeedAggregator`] builds an [`ArrivalBoard`] from a feed snapshot. Per trip it
//! asks [`DirectionResolver`] for the bound, then [`ArrivalExtractor`] for the event
//! at that bound's platform.

pub mod aggregator;
pub mod direction;
pub mod extractor;

pub use aggregator::{ArrivalBoard, FeedAggregator, MAX_ARRIVALS_PER_BOUND};
pub use direction::DirectionResolver;
pub use extractor::{ArrivalExtractor, DESTINATION_MAX_CHARS, UNKNOWN_DESTINATION};
