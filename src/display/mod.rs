//! Fixed-geometry rendering for the 64×32 matrix.
//!
//! Every frame is drawn from scratch onto a [`Canvas`] by the [`FrameRenderer`]
//! and then pushed to a [`PixelSink`]. Text that is wider than its column scrolls
//! with the [`marquee`] animator; overflow is hidden by drawing masks over the
//! neighbouring columns before the badge, countdown and header go on top.

pub mod canvas;
pub mod layout;
pub mod marquee;
pub mod palette;
pub mod renderer;
pub mod sink;
pub mod text;
pub mod weather;

pub use canvas::{Canvas, HEIGHT, WIDTH};
pub use marquee::{AnimationState, MarqueeParams};
pub use renderer::{FrameRenderer, format_countdown};
pub use sink::{FileSink, MemorySink, PixelSink, present, save_png};
pub use text::{FontKey, MonoTextEngine, TextEngine};
