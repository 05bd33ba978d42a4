//! Pixel geometry of the arrivals frame.
//!
//! ```text
//!  x: 0         12 14                        42 43                  63
//! y0 +--------------------- header band -----------------------------+
//! y7 | badge    |  destination (28 px visible)  | countdown           | row 0
//! y19| badge    |  destination                  | countdown           | row 1
//! y31+---------------------------------------------------------------+
//! ```

use embedded_graphics::{prelude::*, primitives::Rectangle};

use super::canvas::WIDTH;

pub const HEADER_HEIGHT: u32 = 7;
pub const ROW_HEIGHT: u32 = 12;
pub const ROW_COUNT: usize = 2;

/// Column boundaries; the destination column starts at the badge column's edge.
pub const DESTINATION_COLUMN_X: i32 = 12;
pub const COUNTDOWN_COLUMN_X: i32 = 42;

/// Destination text is inset from its column edge.
pub const DESTINATION_TEXT_X: i32 = DESTINATION_COLUMN_X + 2;
pub const DESTINATION_VISIBLE_WIDTH: u32 = (COUNTDOWN_COLUMN_X - DESTINATION_TEXT_X) as u32;
pub const COUNTDOWN_TEXT_X: i32 = COUNTDOWN_COLUMN_X + 1;

pub const BADGE_CENTER_X: i32 = 5;
pub const BADGE_DIAMETER: u32 = 11;

pub fn header_band() -> Rectangle {
    Rectangle::new(Point::zero(), Size::new(WIDTH as u32, HEADER_HEIGHT))
}

/// The regions of one arrival row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    pub top: i32,
}

impl RowLayout {
    pub fn new(index: usize) -> Self {
        Self {
            top: (HEADER_HEIGHT + ROW_HEIGHT * index as u32) as i32,
        }
    }

    pub fn area(&self) -> Rectangle {
        Rectangle::new(Point::new(0, self.top), Size::new(WIDTH as u32, ROW_HEIGHT))
    }

    /// Left mask: badge column plus the destination inset.
    pub fn badge_mask(&self) -> Rectangle {
        Rectangle::new(
            Point::new(0, self.top),
            Size::new(DESTINATION_TEXT_X as u32, ROW_HEIGHT),
        )
    }

    pub fn destination_window(&self) -> Rectangle {
        Rectangle::new(
            Point::new(DESTINATION_TEXT_X, self.top),
            Size::new(DESTINATION_VISIBLE_WIDTH, ROW_HEIGHT),
        )
    }

    /// Right mask: the whole countdown column.
    pub fn countdown_mask(&self) -> Rectangle {
        Rectangle::new(
            Point::new(COUNTDOWN_COLUMN_X, self.top),
            Size::new(WIDTH as u32 - COUNTDOWN_COLUMN_X as u32, ROW_HEIGHT),
        )
    }

    pub fn badge_center(&self) -> Point {
        Point::new(BADGE_CENTER_X, self.top + ROW_HEIGHT as i32 / 2)
    }

    /// Top of a line of text `height` pixels tall, centred in the row.
    pub fn centered_text_y(&self, height: u32) -> i32 {
        self.top + (ROW_HEIGHT.saturating_sub(height) / 2) as i32
    }
}
