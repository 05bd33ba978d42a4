//! Where trip records come from: the live MTA endpoint or a saved `.pb` file.

use anyhow::{Context, Result};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use tracing::debug;

use super::{HttpClient, fetch_bytes};
use crate::model::TripRecord;
use crate::parser::{parse_feed, trips_from_feed};

/// Produces the parsed trip records of one feed.
///
/// An error means this poll produced nothing; callers keep their previous
/// snapshot and try again on the next cycle.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, feed_path: &str) -> Result<Vec<TripRecord>>;
}

#[async_trait]
impl<T: FeedSource + ?Sized> FeedSource for Box<T> {
    async fn fetch(&self, feed_path: &str) -> Result<Vec<TripRecord>> {
        (**self).fetch(feed_path).await
    }
}

/// Fetches `base_url + feed_path` over HTTP.
pub struct HttpFeedSource<C> {
    client: C,
    base_url: String,
    terminal_names: HashMap<String, String>,
}

impl<C: HttpClient> HttpFeedSource<C> {
    pub fn new(
        client: C,
        base_url: impl Into<String>,
        terminal_names: HashMap<String, String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            terminal_names,
        }
    }
}

#[async_trait]
impl<C: HttpClient> FeedSource for HttpFeedSource<C> {
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch(&self, feed_path: &str) -> Result<Vec<TripRecord>> {
        let url = format!("{}{}", self.base_url, feed_path);
        let bytes = fetch_bytes(&self.client, &url)
            .await
            .with_context(|| format!("fetching feed {url}"))?;
        let feed = parse_feed(&bytes).with_context(|| format!("decoding feed {url}"))?;
        debug!(entities = feed.entity.len(), bytes = bytes.len(), "Feed decoded");
        Ok(trips_from_feed(&feed, &self.terminal_names))
    }
}

/// Reads a saved feed from disk.
///
/// If `path` is a directory the feed path is resolved inside it, so a folder of
/// captured `gtfs-nqrw`-style files can stand in for the live endpoint.
pub struct FileFeedSource {
    path: PathBuf,
    terminal_names: HashMap<String, String>,
}

impl FileFeedSource {
    pub fn new(path: impl Into<PathBuf>, terminal_names: HashMap<String, String>) -> Self {
        Self {
            path: path.into(),
            terminal_names,
        }
    }

    fn resolve(&self, feed_path: &str) -> PathBuf {
        if self.path.is_dir() && !feed_path.is_empty() {
            self.path.join(feed_path)
        } else {
            self.path.clone()
        }
    }
}

#[async_trait]
impl FeedSource for FileFeedSource {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch(&self, feed_path: &str) -> Result<Vec<TripRecord>> {
        let path = self.resolve(feed_path);
        let mut bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading feed file {}", path.display()))?;
        if path.extension().is_some_and(|ext| ext == "gz") {
            bytes = gunzip(&bytes).with_context(|| format!("decompressing {}", path.display()))?;
        }
        let feed = parse_feed(&bytes)
            .with_context(|| format!("decoding feed file {}", path.display()))?;
        debug!(entities = feed.entity.len(), "Feed file decoded");
        Ok(trips_from_feed(&feed, &self.terminal_names))
    }
}

/// Captured feeds are often stored as `<feed>.pb.gz`.
fn gunzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
    use crate::gtfs_rt::{FeedEntity, FeedHeader, FeedMessage, TripDescriptor, TripUpdate};
    use prost::Message;

    fn sample_feed_bytes() -> Vec<u8> {
        FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "2.0".to_string(),
                ..Default::default()
            },
            entity: vec![FeedEntity {
                id: "1".to_string(),
                trip_update: Some(TripUpdate {
                    trip: TripDescriptor {
                        trip_id: Some("t..S".to_string()),
                        route_id: Some("R".to_string()),
                        ..Default::default()
                    },
                    stop_time_update: vec![StopTimeUpdate {
                        stop_id: Some("R35S".to_string()),
                        arrival: Some(StopTimeEvent {
                            time: Some(1_700_000_000),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
                ..Default::default()
            }],
        }
        .encode_to_vec()
    }

    #[tokio::test]
    async fn test_file_source_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.pb");
        std::fs::write(&path, sample_feed_bytes()).unwrap();

        let source = FileFeedSource::new(&path, HashMap::new());
        let trips = source.fetch("ignored").await.unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].stop_events[0].stop_id, "R35S");
    }

    #[tokio::test]
    async fn test_file_source_resolves_inside_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gtfs-nqrw"), sample_feed_bytes()).unwrap();

        let source = FileFeedSource::new(dir.path(), HashMap::new());
        assert_eq!(source.fetch("gtfs-nqrw").await.unwrap().len(), 1);
        assert!(source.fetch("gtfs-ace").await.is_err());
    }

    #[tokio::test]
    async fn test_file_source_reads_gzipped_capture() {
        use flate2::{Compression, write::GzEncoder};
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&sample_feed_bytes()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gtfs-nqrw.pb.gz");
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let source = FileFeedSource::new(&path, HashMap::new());
        assert_eq!(source.fetch("").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_file_source_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.pb");
        std::fs::write(&path, [0xFF, 0xFE, 0x00, 0x01]).unwrap();

        let source = FileFeedSource::new(&path, HashMap::new());
        assert!(source.fetch("").await.is_err());
    }
}
