//! Long-running workers: feed polling, weather polling and the render loop.
//!
//! Pollers publish immutable snapshots on `watch` channels; the render loop
//! reads whatever is current at each frame. A failed poll leaves the previous
//! snapshot in place.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::arrivals::{ArrivalBoard, FeedAggregator};
use crate::config::{AppConfig, DisplayConfig};
use crate::display::{
    AnimationState, Canvas, FrameRenderer, MonoTextEngine, PixelSink, TextEngine, present,
};
use crate::fetch::FeedSource;
use crate::model::Bound;
use crate::output;
use crate::weather::{WeatherReport, WeatherSource};

pub type BoardTx = watch::Sender<Arc<ArrivalBoard>>;
pub type BoardRx = watch::Receiver<Arc<ArrivalBoard>>;
pub type WeatherTx = watch::Sender<Option<Arc<WeatherReport>>>;
pub type WeatherRx = watch::Receiver<Option<Arc<WeatherReport>>>;

/// What the matrix is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Arrivals(Bound),
    Weather,
}

/// Fixed rotation of screens, each held for a number of frames.
#[derive(Debug, Clone)]
pub struct ScreenRotation {
    slots: Vec<(Screen, u64)>,
    total: u64,
}

impl ScreenRotation {
    /// Northbound then southbound, then weather if enabled.
    pub fn new(display: &DisplayConfig, with_weather: bool) -> Self {
        let frames = |secs: u64| (u64::from(display.fps) * secs).max(1);

        let arrivals = frames(display.frame_duration_secs);
        let mut slots = vec![
            (Screen::Arrivals(Bound::Northbound), arrivals),
            (Screen::Arrivals(Bound::Southbound), arrivals),
        ];
        if with_weather {
            slots.push((Screen::Weather, frames(display.weather_duration_secs)));
        }
        let total = slots.iter().map(|(_, n)| n).sum();
        Self { slots, total }
    }

    /// Screen shown at the `rendered`th frame since start.
    pub fn screen_at(&self, rendered: u64) -> Screen {
        let mut at = rendered % self.total;
        for (screen, frames) in &self.slots {
            if at < *frames {
                return *screen;
            }
            at -= frames;
        }
        Screen::Arrivals(Bound::Northbound)
    }
}

/// Shortest tick period; `tokio::time::interval` panics on zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(period.max(MIN_PERIOD));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Fetches the feed on an interval and publishes a fresh [`ArrivalBoard`].
pub struct PollWorker<S> {
    source: S,
    aggregator: FeedAggregator,
    feed_path: String,
    interval: Duration,
}

impl<S: FeedSource> PollWorker<S> {
    pub fn new(
        source: S,
        aggregator: FeedAggregator,
        feed_path: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            aggregator,
            feed_path: feed_path.into(),
            interval,
        }
    }

    pub async fn poll_once(&self) -> Result<ArrivalBoard> {
        let trips = self.source.fetch(&self.feed_path).await?;
        Ok(self.aggregator.aggregate(&trips))
    }

    pub async fn run(self, tx: BoardTx, cancel: CancellationToken) {
        let mut ticker = ticker(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let result = tokio::select! {
                        result = self.poll_once() => result,
                        _ = cancel.cancelled() => {
                            debug!("Poll worker cancelled during fetch");
                            break;
                        }
                    };
                    match result {
                        Ok(board) => {
                            info!(
                                northbound = board.northbound.len(),
                                southbound = board.southbound.len(),
                                "Arrivals updated"
                            );
                            output::print_pretty(&board);
                            tx.send_replace(Arc::new(board));
                        }
                        Err(e) => {
                            warn!(
                                error = %e,
                                feed_path = %self.feed_path,
                                "Poll failed, keeping previous arrivals"
                            );
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    debug!("Poll worker cancelled");
                    break;
                }
            }
        }
    }
}

/// Fetches weather on an interval. The last good report stays up on failure.
pub struct WeatherWorker<W> {
    source: W,
    interval: Duration,
}

impl<W: WeatherSource> WeatherWorker<W> {
    pub fn new(source: W, interval: Duration) -> Self {
        Self { source, interval }
    }

    pub async fn run(self, tx: WeatherTx, cancel: CancellationToken) {
        let mut ticker = ticker(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let result = tokio::select! {
                        result = self.source.fetch() => result,
                        _ = cancel.cancelled() => {
                            debug!("Weather worker cancelled during fetch");
                            break;
                        }
                    };
                    match result {
                        Ok(report) => {
                            tx.send_replace(Some(Arc::new(report)));
                        }
                        Err(e) => {
                            warn!(error = %e, "Weather fetch failed, keeping previous report");
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    debug!("Weather worker cancelled");
                    break;
                }
            }
        }
    }
}

/// Renders at a fixed frame rate and presents each frame to the sink.
pub struct RenderWorker<K, T = MonoTextEngine> {
    renderer: FrameRenderer<T>,
    sink: K,
    rotation: ScreenRotation,
    fps: u32,
}

impl<K: PixelSink, T: TextEngine> RenderWorker<K, T> {
    pub fn new(renderer: FrameRenderer<T>, sink: K, rotation: ScreenRotation, fps: u32) -> Self {
        Self {
            renderer,
            sink,
            rotation,
            fps: fps.max(1),
        }
    }

    pub fn render_frame(
        &self,
        screen: Screen,
        frame_counter: u64,
        board: &ArrivalBoard,
        weather: Option<&WeatherReport>,
        now: i64,
    ) -> Canvas {
        match screen {
            Screen::Arrivals(bound) => {
                self.renderer.render(bound, board.get(bound), frame_counter, now)
            }
            Screen::Weather => self.renderer.render_weather(weather, frame_counter),
        }
    }

    /// Runs until `cancel` fires, then blanks the matrix and hands the sink back.
    pub async fn run(
        mut self,
        boards: BoardRx,
        weather: WeatherRx,
        cancel: CancellationToken,
    ) -> K {
        let mut ticker = ticker(Duration::from_secs(1) / self.fps);
        let mut animation = AnimationState::new(self.renderer.marquee());
        let mut rendered: u64 = 0;
        let mut current = None;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let screen = self.rotation.screen_at(rendered);
                    if current != Some(screen) {
                        debug!(?screen, "Switching screen");
                        current = Some(screen);
                    }

                    let board = Arc::clone(&boards.borrow());
                    let report = weather.borrow().clone();
                    let canvas = self.render_frame(
                        screen,
                        animation.frame_counter(),
                        &board,
                        report.as_deref(),
                        Utc::now().timestamp(),
                    );
                    if let Err(e) = present(&mut self.sink, &canvas) {
                        error!(error = %e, "Failed to present frame");
                    }

                    animation.advance();
                    rendered += 1;
                }
                _ = cancel.cancelled() => break,
            }
        }

        if let Err(e) = self.sink.clear().and_then(|()| self.sink.commit()) {
            warn!(error = %e, "Failed to blank matrix on shutdown");
        }
        info!(frames = rendered, "Render loop stopped");
        self.sink
    }
}

/// Wires the workers together and runs until `cancel` fires.
pub async fn run_display<S, W, K>(
    config: &AppConfig,
    source: S,
    weather: Option<W>,
    sink: K,
    cancel: CancellationToken,
) -> Result<K>
where
    S: FeedSource + 'static,
    W: WeatherSource + 'static,
    K: PixelSink,
{
    let (board_tx, board_rx) = watch::channel(Arc::new(ArrivalBoard::empty()));
    let (weather_tx, weather_rx) = watch::channel(None);

    let poller = PollWorker::new(
        source,
        FeedAggregator::new(config.station.clone()),
        config.feed.feed_path.clone(),
        Duration::from_secs(config.poll_interval_secs),
    );
    let mut tasks = vec![tokio::spawn(poller.run(board_tx, cancel.clone()))];

    let with_weather = weather.is_some();
    if let Some(source) = weather {
        let interval = Duration::from_secs(config.weather.poll_interval_secs);
        let worker = WeatherWorker::new(source, interval);
        tasks.push(tokio::spawn(worker.run(weather_tx, cancel.clone())));
    }

    info!(
        station = %config.station.name,
        stop = %config.station.base_stop_id,
        fps = config.display.fps,
        with_weather,
        "Display loop starting"
    );

    let renderer = RenderWorker::new(
        FrameRenderer::with_mono_fonts(Default::default()),
        sink,
        ScreenRotation::new(&config.display, with_weather),
        config.display.fps,
    );
    let sink = renderer.run(board_rx, weather_rx, cancel).await;

    for task in tasks {
        task.await?;
    }
    Ok(sink)
}
