//! The weather screen: date, scrolling condition, temperature, high/low and an icon.

use anyhow::Result;
use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Arc, Circle, Ellipse, Line, PrimitiveStyle, Rectangle},
};

use super::canvas::{Canvas, WIDTH};
use super::marquee::{self, MarqueeParams};
use super::palette::{BLACK, CYAN, GRAY, RED, WHITE, YELLOW};
use super::renderer::{FrameRenderer, logged};
use super::text::{FontKey, TextEngine};
use crate::weather::{WeatherIcon, WeatherReport};

/// Left edge of the information column; the icon owns everything left of it.
pub const INFO_X: i32 = 15;
const INFO_WIDTH: u32 = WIDTH as u32 - INFO_X as u32;

const DATE_Y: i32 = 0;
const CONDITION_Y: i32 = 7;
const TEMPERATURE_Y: i32 = 14;
const HIGH_LOW_Y: i32 = 21;

const ICON_CENTER: Point = Point::new(5, 20);

/// Icon-column mask over the condition row.
fn condition_mask() -> Rectangle {
    Rectangle::new(Point::new(0, CONDITION_Y), Size::new(INFO_X as u32, 7))
}

impl<T: TextEngine> FrameRenderer<T> {
    /// Renders the weather screen, or a "Weather Unavailable" notice.
    pub fn render_weather(&self, report: Option<&WeatherReport>, frame_counter: u64) -> Canvas {
        let mut canvas = Canvas::new();

        let Some(report) = report else {
            logged("weather unavailable", self.draw_unavailable(&mut canvas));
            return canvas;
        };

        logged(
            "date",
            self.text.draw(
                &mut canvas,
                &report.date_label,
                Point::new(0, DATE_Y),
                FontKey::Weather,
                WHITE,
            ),
        );
        logged(
            "condition",
            self.draw_condition(&mut canvas, &report.condition, frame_counter),
        );
        logged("temperature", self.draw_temperature(&mut canvas, report));
        logged("high/low", self.draw_high_low(&mut canvas, report));

        canvas.fill_rect(&condition_mask(), BLACK);
        logged("icon", self.draw_icon(&mut canvas, report.icon()));

        canvas
    }

    /// Condition text scrolls like destinations, with 2px of slack before it
    /// starts moving.
    fn condition_params(&self) -> MarqueeParams {
        MarqueeParams {
            margin: 6,
            ..self.marquee
        }
    }

    fn draw_condition(&self, canvas: &mut Canvas, text: &str, frame: u64) -> Result<()> {
        let size = self.text.measure(text, FontKey::Weather)?;
        let shift = marquee::offset(size.width, INFO_WIDTH - 2, frame, &self.condition_params());
        let origin = Point::new(INFO_X - shift as i32, CONDITION_Y);
        self.text.draw(canvas, text, origin, FontKey::Weather, WHITE)
    }

    fn draw_temperature(&self, canvas: &mut Canvas, report: &WeatherReport) -> Result<()> {
        let label = match (report.temperature_f, report.feels_like_f) {
            (Some(t), Some(f)) if t != f => {
                let full = format!("{t}°F ({f}°F)");
                if self.text.measure(&full, FontKey::WeatherTemp)?.width <= INFO_WIDTH {
                    full
                } else {
                    format!("{t}°F")
                }
            }
            (Some(t), _) => format!("{t}°F"),
            (None, _) => "-- °F".to_string(),
        };
        self.text.draw(
            canvas,
            &label,
            Point::new(INFO_X, TEMPERATURE_Y),
            FontKey::WeatherTemp,
            RED,
        )
    }

    fn draw_high_low(&self, canvas: &mut Canvas, report: &WeatherReport) -> Result<()> {
        let label = match (report.high_f, report.low_f) {
            (Some(h), Some(l)) => format!("H:{h}° L:{l}°"),
            _ => "No forecast".to_string(),
        };
        let font = if self.text.measure(&label, FontKey::WeatherTemp)?.width <= INFO_WIDTH {
            FontKey::WeatherTemp
        } else {
            FontKey::Weather
        };
        self.text
            .draw(canvas, &label, Point::new(INFO_X, HIGH_LOW_Y), font, YELLOW)
    }

    fn draw_unavailable(&self, canvas: &mut Canvas) -> Result<()> {
        for (line, y) in [("Weather", 9), ("Unavailable", 17)] {
            let size = self.text.measure(line, FontKey::Destination)?;
            let x = (WIDTH as i32 - size.width as i32).max(0) / 2;
            self.text
                .draw(canvas, line, Point::new(x, y), FontKey::Destination, CYAN)?;
        }
        Ok(())
    }

    fn draw_icon(&self, canvas: &mut Canvas, icon: WeatherIcon) -> Result<()> {
        let c = ICON_CENTER;
        match icon {
            WeatherIcon::Sunny => {
                fill_ellipse(canvas, c + Point::new(-3, -3), c + Point::new(3, 3), YELLOW)?;
                let rays = [
                    ((-5, 0), (-4, 0)),
                    ((4, 0), (5, 0)),
                    ((0, -5), (0, -4)),
                    ((0, 4), (0, 5)),
                ];
                for (from, to) in rays {
                    line(canvas, c + Point::from(from), c + Point::from(to), YELLOW)?;
                }
            }
            WeatherIcon::Cloudy => {
                fill_ellipse(canvas, c + Point::new(-5, -2), c + Point::new(-1, 2), GRAY)?;
                fill_ellipse(canvas, c + Point::new(-2, -3), c + Point::new(3, 1), GRAY)?;
                fill_ellipse(canvas, c + Point::new(1, -2), c + Point::new(6, 2), GRAY)?;
            }
            WeatherIcon::PartlyCloudy => {
                fill_ellipse(canvas, c + Point::new(-2, -2), c + Point::new(1, 1), YELLOW)?;
                fill_ellipse(canvas, c + Point::new(0, -1), c + Point::new(5, 2), GRAY)?;
            }
            WeatherIcon::Rainy | WeatherIcon::Snowy => {
                let (cloud, start) = match icon {
                    WeatherIcon::Snowy => (WHITE, -3),
                    _ => (GRAY, -4),
                };
                fill_ellipse(canvas, c + Point::new(-4, -3), c + Point::new(2, 0), cloud)?;
                for dx in [start, start + 3, start + 6] {
                    let top = c + Point::new(dx, 1);
                    line(canvas, top, top + Point::new(1, 2), CYAN)?;
                }
            }
            WeatherIcon::Stormy => {
                fill_ellipse(canvas, c + Point::new(-4, -3), c + Point::new(2, 0), GRAY)?;
                let bolt = [(1, 1), (2, 2), (1, 3), (2, 4)].map(|p| c + Point::from(p));
                for pair in bolt.windows(2) {
                    line(canvas, pair[0], pair[1], YELLOW)?;
                }
            }
            WeatherIcon::Foggy => {
                for dy in [-3, 0, 3] {
                    line(canvas, c + Point::new(-4, dy), c + Point::new(4, dy), GRAY)?;
                }
            }
            WeatherIcon::Windy => {
                let style = PrimitiveStyle::with_stroke(CYAN, 1);
                Arc::with_center(c, 7, 0.0.deg(), 180.0.deg())
                    .into_styled(style)
                    .draw(canvas)?;
                Arc::with_center(c + Point::new(-1, -2), 7, 0.0.deg(), 180.0.deg())
                    .into_styled(style)
                    .draw(canvas)?;
            }
            WeatherIcon::Unknown => {
                Circle::with_center(c, 7)
                    .into_styled(PrimitiveStyle::with_fill(GRAY))
                    .draw(canvas)?;
                let size = self.text.measure("?", FontKey::Badge)?;
                let origin = c - Point::new(size.width as i32 / 2, size.height as i32 / 2);
                self.text.draw(canvas, "?", origin, FontKey::Badge, WHITE)?;
            }
        }
        Ok(())
    }
}

/// Filled ellipse inside the inclusive box `top_left..=bottom_right`.
fn fill_ellipse(
    canvas: &mut Canvas,
    top_left: Point,
    bottom_right: Point,
    color: Rgb888,
) -> Result<()> {
    let size = Size::new(
        (bottom_right.x - top_left.x + 1) as u32,
        (bottom_right.y - top_left.y + 1) as u32,
    );
    Ellipse::new(top_left, size)
        .into_styled(PrimitiveStyle::with_fill(color))
        .draw(canvas)?;
    Ok(())
}

fn line(canvas: &mut Canvas, from: Point, to: Point, color: Rgb888) -> Result<()> {
    Line::new(from, to)
        .into_styled(PrimitiveStyle::with_stroke(color, 1))
        .draw(canvas)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn report(condition: &str) -> WeatherReport {
        WeatherReport {
            date_label: "Fri, Jan 2 2026".to_string(),
            condition: condition.to_string(),
            temperature_f: Some(62),
            feels_like_f: Some(57),
            high_f: Some(68),
            low_f: Some(52),
            fetched_at: Utc::now(),
        }
    }

    fn renderer() -> FrameRenderer {
        FrameRenderer::with_mono_fonts(MarqueeParams::default())
    }

    fn band(y: i32, height: u32) -> Rectangle {
        Rectangle::new(Point::new(0, y), Size::new(WIDTH as u32, height))
    }

    #[test]
    fn test_unavailable_notice() {
        let canvas = renderer().render_weather(None, 0);
        assert!(canvas.count_in(&canvas.bounding_box(), CYAN) > 0);
        assert_eq!(canvas.count_in(&canvas.bounding_box(), WHITE), 0);
    }

    #[test]
    fn test_rows_use_their_colors() {
        let canvas = renderer().render_weather(Some(&report("Sunny")), 0);
        assert!(canvas.count_in(&band(DATE_Y, 6), WHITE) > 0);
        assert!(canvas.count_in(&band(CONDITION_Y, 6), WHITE) > 0);
        assert!(canvas.count_in(&band(TEMPERATURE_Y, 7), RED) > 0);
        assert!(canvas.count_in(&band(HIGH_LOW_Y, 7), YELLOW) > 0);
    }

    #[test]
    fn test_every_icon_draws_inside_icon_column() {
        let column = Rectangle::new(Point::zero(), Size::new(INFO_X as u32, 32));
        for condition in [
            "Sunny",
            "Cloudy",
            "Partly Cloudy",
            "Rain",
            "Snow",
            "Thunderstorms",
            "Fog",
            "Windy",
            "Volcanic Ash",
        ] {
            let mut r = report(condition);
            r.date_label.clear();
            r.high_f = None;
            let canvas = renderer().render_weather(Some(&r), 0);
            let icon_pixels = canvas
                .iter()
                .filter(|&(x, y, c)| c != BLACK && column.contains(Point::new(x as i32, y as i32)))
                .count();
            assert!(icon_pixels > 0, "{condition} drew no icon");
        }
    }

    #[test]
    fn test_scrolling_condition_is_masked() {
        let r = renderer();
        let long = report("Chance Rain Showers Then Thunderstorms");
        let still = r.render_weather(Some(&long), 0);
        let moved = r.render_weather(Some(&long), 60);
        assert_ne!(still, moved);
        assert_eq!(moved.count_in(&condition_mask(), WHITE), 0);
        assert!(moved.count_in(&band(CONDITION_Y, 6), WHITE) > 0);
    }

    #[test]
    fn test_short_condition_is_static() {
        let r = renderer();
        let short = report("Sunny");
        assert_eq!(r.render_weather(Some(&short), 0), r.render_weather(Some(&short), 60));
    }

    #[test]
    fn test_missing_values_use_placeholders() {
        let mut r = report("Sunny");
        r.temperature_f = None;
        r.feels_like_f = None;
        r.high_f = None;
        let canvas = renderer().render_weather(Some(&r), 0);
        assert!(canvas.count_in(&band(TEMPERATURE_Y, 7), RED) > 0);
        assert!(canvas.count_in(&band(HIGH_LOW_Y, 7), YELLOW) > 0);
    }
}
