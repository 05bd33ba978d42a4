use anyhow::Result;
use embedded_graphics::{
    prelude::*,
    primitives::{Circle, PrimitiveStyle},
};
use tracing::error;

use super::canvas::{Canvas, WIDTH};
use super::layout::{
    self, BADGE_DIAMETER, COUNTDOWN_TEXT_X, DESTINATION_TEXT_X, ROW_COUNT, RowLayout,
};
use super::marquee::{self, MarqueeParams};
use super::palette::{BLACK, CYAN, DARK_GRAY, WHITE, route_bullet};
use super::text::{FontKey, MonoTextEngine, TextEngine};
use crate::model::{Arrival, Bound};

/// Countdown label: `NOW`, `1m`, `12m`.
pub fn format_countdown(minutes: i64) -> String {
    match minutes {
        m if m <= 0 => "NOW".to_string(),
        m => format!("{m}m"),
    }
}

fn countdown_font(label: &str) -> FontKey {
    if label == "NOW" {
        FontKey::CountdownNow
    } else {
        FontKey::Countdown
    }
}

/// Composes arrival and weather frames.
///
/// Owns no cross-frame state: the frame counter arrives with each call and the
/// canvas is new every time.
pub struct FrameRenderer<T = MonoTextEngine> {
    pub(super) text: T,
    pub(super) marquee: MarqueeParams,
}

impl FrameRenderer<MonoTextEngine> {
    pub fn with_mono_fonts(marquee: MarqueeParams) -> Self {
        Self::new(MonoTextEngine, marquee)
    }
}

impl<T: TextEngine> FrameRenderer<T> {
    pub fn new(text: T, marquee: MarqueeParams) -> Self {
        Self { text, marquee }
    }

    pub fn marquee(&self) -> &MarqueeParams {
        &self.marquee
    }

    /// Renders the board for `bound` using at most the first two arrivals.
    ///
    /// Draw order matters: destinations first (they may spill sideways), then
    /// black masks over the badge and countdown columns, then badge and countdown,
    /// and the header band last. A failing step is logged and skipped; whatever
    /// was drawn so far is kept.
    pub fn render(
        &self,
        bound: Bound,
        arrivals: &[Arrival],
        frame_counter: u64,
        now: i64,
    ) -> Canvas {
        let mut canvas = Canvas::new();
        let rows: Vec<(RowLayout, &Arrival)> = arrivals
            .iter()
            .take(ROW_COUNT)
            .enumerate()
            .map(|(i, a)| (RowLayout::new(i), a))
            .collect();

        for (row, arrival) in &rows {
            logged(
                "destination",
                self.draw_destination(&mut canvas, row, &arrival.destination, frame_counter),
            );
        }

        for (row, _) in &rows {
            canvas.fill_rect(&row.badge_mask(), BLACK);
            canvas.fill_rect(&row.countdown_mask(), BLACK);
        }

        for (row, arrival) in &rows {
            logged(
                "badge",
                self.draw_badge(&mut canvas, row, &arrival.route_id),
            );
            logged(
                "countdown",
                self.draw_countdown(&mut canvas, row, arrival.minutes_until(now)),
            );
        }

        if rows.is_empty() {
            logged("placeholder", self.draw_placeholder(&mut canvas));
        }

        logged("header", self.draw_header(&mut canvas, bound.label()));

        canvas
    }

    /// Scroll offset the destination `text` has at `frame_counter`.
    pub fn destination_offset(&self, text: &str, frame_counter: u64) -> Result<u32> {
        let size = self.text.measure(text, FontKey::Destination)?;
        Ok(marquee::offset(
            size.width,
            layout::DESTINATION_VISIBLE_WIDTH,
            frame_counter,
            &self.marquee,
        ))
    }

    fn draw_destination(
        &self,
        canvas: &mut Canvas,
        row: &RowLayout,
        text: &str,
        frame: u64,
    ) -> Result<()> {
        let size = self.text.measure(text, FontKey::Destination)?;
        let shift = marquee::offset(
            size.width,
            layout::DESTINATION_VISIBLE_WIDTH,
            frame,
            &self.marquee,
        );
        let origin = Point::new(
            DESTINATION_TEXT_X - shift as i32,
            row.centered_text_y(size.height),
        );
        self.text.draw(canvas, text, origin, FontKey::Destination, WHITE)
    }

    fn draw_badge(&self, canvas: &mut Canvas, row: &RowLayout, route_id: &str) -> Result<()> {
        let bullet = route_bullet(route_id);
        let center = row.badge_center();
        Circle::with_center(center, BADGE_DIAMETER)
            .into_styled(PrimitiveStyle::with_fill(bullet.fill))
            .draw(canvas)?;

        let size = self.text.measure(route_id, FontKey::Badge)?;
        let origin = Point::new(
            center.x - size.width as i32 / 2,
            center.y - size.height as i32 / 2,
        );
        self.text.draw(canvas, route_id, origin, FontKey::Badge, bullet.text)
    }

    fn draw_countdown(&self, canvas: &mut Canvas, row: &RowLayout, minutes: i64) -> Result<()> {
        let label = format_countdown(minutes);
        let font = countdown_font(&label);
        let size = self.text.measure(&label, font)?;
        let origin = Point::new(COUNTDOWN_TEXT_X, row.centered_text_y(size.height));
        self.text.draw(canvas, &label, origin, font, CYAN)
    }

    fn draw_placeholder(&self, canvas: &mut Canvas) -> Result<()> {
        let label = "No trains";
        let row = RowLayout::new(0);
        let size = self.text.measure(label, FontKey::Destination)?;
        let x = (WIDTH as i32 - size.width as i32).max(0) / 2;
        self.text.draw(
            canvas,
            label,
            Point::new(x, row.centered_text_y(size.height)),
            FontKey::Destination,
            DARK_GRAY,
        )
    }

    fn draw_header(&self, canvas: &mut Canvas, label: &str) -> Result<()> {
        canvas.fill_rect(&layout::header_band(), BLACK);
        let size = self.text.measure(label, FontKey::Header)?;
        let x = (WIDTH as i32 - size.width as i32).max(0) / 2;
        self.text.draw(canvas, label, Point::new(x, 0), FontKey::Header, WHITE)
    }
}

/// Logs a failed drawing step; the frame carries on without it.
pub(super) fn logged(step: &'static str, result: Result<()>) {
    if let Err(e) = result {
        error!(step, error = %e, "Drawing step failed, keeping partial frame");
    }
}
