//! Text measurement and drawing, keyed by the role a piece of text plays.

use anyhow::Result;
use embedded_graphics::{
    mono_font::{
        MonoFont, MonoTextStyle,
        iso_8859_1::{FONT_4X6, FONT_5X7, FONT_5X8, FONT_6X10},
    },
    pixelcolor::Rgb888,
    prelude::*,
    text::{Baseline, Text, renderer::TextRenderer},
};

use super::canvas::Canvas;

/// Font roles used by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontKey {
    Header,
    Badge,
    Destination,
    Countdown,
    /// `NOW` is set smaller than numeric countdowns.
    CountdownNow,
    Weather,
    WeatherTemp,
}

/// Measures and draws strings onto a [`Canvas`].
///
/// Positions are the top-left corner of the text's bounding box.
pub trait TextEngine {
    fn measure(&self, text: &str, font: FontKey) -> Result<Size>;

    fn draw(
        &self,
        canvas: &mut Canvas,
        text: &str,
        top_left: Point,
        font: FontKey,
        color: Rgb888,
    ) -> Result<()>;
}

/// Bitmap fonts from embedded-graphics; Latin-1 so `°` and accents render.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonoTextEngine;

impl MonoTextEngine {
    pub fn font(key: FontKey) -> &'static MonoFont<'static> {
        match key {
            FontKey::Header => &FONT_5X7,
            FontKey::Badge => &FONT_5X7,
            FontKey::Destination => &FONT_5X8,
            FontKey::Countdown => &FONT_6X10,
            FontKey::CountdownNow => &FONT_5X7,
            FontKey::Weather => &FONT_4X6,
            FontKey::WeatherTemp => &FONT_5X7,
        }
    }
}

impl TextEngine for MonoTextEngine {
    fn measure(&self, text: &str, font: FontKey) -> Result<Size> {
        let style = MonoTextStyle::new(Self::font(font), Rgb888::WHITE);
        let metrics = style.measure_string(text, Point::zero(), Baseline::Top);
        Ok(metrics.bounding_box.size)
    }

    fn draw(
        &self,
        canvas: &mut Canvas,
        text: &str,
        top_left: Point,
        font: FontKey,
        color: Rgb888,
    ) -> Result<()> {
        let style = MonoTextStyle::new(Self::font(font), color);
        Text::with_baseline(text, top_left, style, Baseline::Top).draw(canvas)?;
        Ok(())
    }
}
