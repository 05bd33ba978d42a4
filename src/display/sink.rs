//! Pixel sinks: where finished frames go.
//!
//! A sink has a draw buffer and a committed frame. `set_pixel`/`fill`
//! touch only the buffer; `commit` publishes it atomically.

use anyhow::{Context, Result, ensure};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use super::canvas::{Canvas, HEIGHT, WIDTH};

pub trait PixelSink: Send {
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb888) -> Result<()>;

    fn fill(&mut self, color: Rgb888) -> Result<()>;

    fn clear(&mut self) -> Result<()> {
        self.fill(Rgb888::BLACK)
    }

    fn commit(&mut self) -> Result<()>;
}

impl<S: PixelSink + ?Sized> PixelSink for Box<S> {
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb888) -> Result<()> {
        (**self).set_pixel(x, y, color)
    }

    fn fill(&mut self, color: Rgb888) -> Result<()> {
        (**self).fill(color)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }
}

/// Copies `canvas` into the sink's buffer and commits it.
pub fn present<S: PixelSink + ?Sized>(sink: &mut S, canvas: &Canvas) -> Result<()> {
    for (x, y, color) in canvas.iter() {
        sink.set_pixel(x, y, color)?;
    }
    sink.commit()
}

fn check_bounds(x: usize, y: usize) -> Result<()> {
    ensure!(
        x < WIDTH && y < HEIGHT,
        "pixel ({x}, {y}) outside {WIDTH}x{HEIGHT} matrix"
    );
    Ok(())
}

/// Keeps frames in memory; what tests assert against.
#[derive(Debug, Default)]
pub struct MemorySink {
    buffer: Canvas,
    committed: Option<Canvas>,
    commits: u64,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently committed frame.
    pub fn committed(&self) -> Option<&Canvas> {
        self.committed.as_ref()
    }

    pub fn commits(&self) -> u64 {
        self.commits
    }
}

impl PixelSink for MemorySink {
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb888) -> Result<()> {
        check_bounds(x, y)?;
        self.buffer.set((x as i32, y as i32).into(), color);
        Ok(())
    }

    fn fill(&mut self, color: Rgb888) -> Result<()> {
        self.buffer = Canvas::filled(color);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.committed = Some(self.buffer.clone());
        self.commits += 1;
        Ok(())
    }
}

/// Writes committed frames to `<dir>/latest.png`.
///
/// Encoding a PNG at display rate is wasteful, so only every `save_every`th
/// commit hits the disk. The first commit is always saved.
///
/// Inside a tokio runtime the encode and write run on the blocking pool and
/// `commit` returns at once. A save that comes due while the previous one is
/// still running is skipped. Outside a runtime `commit` saves inline.
pub struct FileSink {
    path: PathBuf,
    image: RgbImage,
    save_every: u64,
    commits: u64,
    saving: Arc<AtomicBool>,
}

impl FileSink {
    pub const FILE_NAME: &'static str = "latest.png";

    pub fn new(dir: impl AsRef<Path>, save_every: u64) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        info!(dir = %dir.display(), save_every, "Saving frames to disk");
        Ok(Self {
            path: dir.join(Self::FILE_NAME),
            image: RgbImage::new(WIDTH as u32, HEIGHT as u32),
            save_every: save_every.max(1),
            commits: 0,
            saving: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current buffer now, regardless of the save cadence.
    pub fn save(&self) -> Result<()> {
        write_png(&self.image, &self.path)?;
        debug!(path = %self.path.display(), "Saved frame");
        Ok(())
    }

    /// True while a background save is running.
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    fn save_in_background(&self, handle: &Handle) {
        if self.saving.swap(true, Ordering::AcqRel) {
            debug!(path = %self.path.display(), "Previous frame still saving, skipping");
            return;
        }

        let image = self.image.clone();
        let path = self.path.clone();
        let saving = Arc::clone(&self.saving);
        handle.spawn_blocking(move || {
            match write_png(&image, &path) {
                Ok(()) => debug!(path = %path.display(), "Saved frame"),
                Err(e) => warn!(error = %e, "Failed to save frame"),
            }
            saving.store(false, Ordering::Release);
        });
    }
}

fn write_png(image: &RgbImage, path: &Path) -> Result<()> {
    image
        .save(path)
        .with_context(|| format!("Failed to write frame to {}", path.display()))
}

fn to_rgb(color: Rgb888) -> Rgb<u8> {
    Rgb([color.r(), color.g(), color.b()])
}

pub fn canvas_to_image(canvas: &Canvas) -> RgbImage {
    let mut image = RgbImage::new(WIDTH as u32, HEIGHT as u32);
    for (x, y, color) in canvas.iter() {
        image.put_pixel(x as u32, y as u32, to_rgb(color));
    }
    image
}

/// Writes a single frame as a PNG at `path`.
pub fn save_png(canvas: &Canvas, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    write_png(&canvas_to_image(canvas), path)
}

impl PixelSink for FileSink {
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb888) -> Result<()> {
        check_bounds(x, y)?;
        self.image.put_pixel(x as u32, y as u32, to_rgb(color));
        Ok(())
    }

    fn fill(&mut self, color: Rgb888) -> Result<()> {
        let rgb = to_rgb(color);
        self.image.pixels_mut().for_each(|p| *p = rgb);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let due = self.commits % self.save_every == 0;
        self.commits += 1;
        if !due {
            return Ok(());
        }
        match Handle::try_current() {
            Ok(handle) => {
                self.save_in_background(&handle);
                Ok(())
            }
            Err(_) => self.save(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::palette::{CYAN, WHITE};
    use embedded_graphics::prelude::*;

    #[test]
    fn test_set_pixel_rejects_out_of_range() {
        let mut sink = MemorySink::new();
        assert!(sink.set_pixel(WIDTH, 0, WHITE).is_err());
        assert!(sink.set_pixel(0, HEIGHT, WHITE).is_err());
        assert!(sink.set_pixel(WIDTH - 1, HEIGHT - 1, WHITE).is_ok());
    }

    #[test]
    fn test_memory_sink_commit_is_atomic() {
        let mut sink = MemorySink::new();
        assert!(sink.committed().is_none());

        sink.set_pixel(3, 4, WHITE).unwrap();
        assert!(sink.committed().is_none(), "buffer writes are not visible before commit");

        sink.commit().unwrap();
        assert_eq!(sink.committed().unwrap().pixel(3, 4), Some(WHITE));

        sink.set_pixel(5, 5, CYAN).unwrap();
        assert_eq!(sink.committed().unwrap().pixel(5, 5), Some(Rgb888::BLACK));
        assert_eq!(sink.commits(), 1);
    }

    #[test]
    fn test_present_copies_canvas() {
        let mut canvas = Canvas::new();
        canvas.set(Point::new(10, 20), CYAN);
        let mut sink = MemorySink::new();
        present(&mut sink, &canvas).unwrap();
        assert_eq!(sink.committed(), Some(&canvas));
    }

    #[test]
    fn test_clear_blanks_buffer() {
        let mut sink = MemorySink::new();
        sink.fill(WHITE).unwrap();
        sink.clear().unwrap();
        sink.commit().unwrap();
        assert!(sink.committed().unwrap().is_blank());
    }

    #[test]
    fn test_boxed_sink_presents() {
        let mut sink: Box<dyn PixelSink> = Box::new(MemorySink::new());
        present(&mut sink, &Canvas::filled(WHITE)).unwrap();
        assert!(sink.set_pixel(64, 0, WHITE).is_err());
    }

    #[test]
    fn test_file_sink_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path().join("frames"), 1).unwrap();

        let mut canvas = Canvas::new();
        canvas.set(Point::new(1, 2), CYAN);
        present(&mut sink, &canvas).unwrap();

        let img = image::open(sink.path()).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (WIDTH as u32, HEIGHT as u32));
        assert_eq!(img.get_pixel(1, 2), &Rgb([0, 255, 255]));
        assert_eq!(img.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_save_png_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/frame.png");
        let mut canvas = Canvas::new();
        canvas.set(Point::new(63, 31), WHITE);
        save_png(&canvas, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(63, 31), &Rgb([255, 255, 255]));
    }

    #[tokio::test]
    async fn test_file_sink_saves_off_the_render_task() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path(), 1).unwrap();

        let mut canvas = Canvas::new();
        canvas.set(Point::new(7, 7), WHITE);
        present(&mut sink, &canvas).unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while sink.is_saving() || !sink.path().exists() {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        let img = image::open(sink.path()).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(7, 7), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_file_sink_save_cadence() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path(), 3).unwrap();

        sink.commit().unwrap();
        assert!(sink.path().exists());
        std::fs::remove_file(sink.path()).unwrap();

        sink.commit().unwrap();
        sink.commit().unwrap();
        assert!(!sink.path().exists());

        sink.commit().unwrap();
        assert!(sink.path().exists());
    }
}
