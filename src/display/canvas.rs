use core::convert::Infallible;
use embedded_graphics::{pixelcolor::Rgb888, prelude::*, primitives::Rectangle};

use super::palette::BLACK;

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

/// A 64×32 RGB pixel buffer, rebuilt for every frame.
///
/// Implements [`DrawTarget`] so embedded-graphics primitives and text can be
/// drawn onto it. Pixels outside the matrix are dropped, which is what lets
/// scrolled text run off the edges.
#[derive(Clone, PartialEq, Eq)]
pub struct Canvas {
    pixels: Vec<Rgb888>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::filled(BLACK)
    }

    pub fn filled(color: Rgb888) -> Self {
        Self {
            pixels: vec![color; WIDTH * HEIGHT],
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb888> {
        (x < WIDTH && y < HEIGHT).then(|| self.pixels[y * WIDTH + x])
    }

    /// Sets one pixel; coordinates off the matrix are ignored.
    pub fn set(&mut self, point: Point, color: Rgb888) {
        if let (Ok(x), Ok(y)) = (usize::try_from(point.x), usize::try_from(point.y)) {
            if x < WIDTH && y < HEIGHT {
                self.pixels[y * WIDTH + x] = color;
            }
        }
    }

    /// Fills the part of `area` that lies on the matrix.
    pub fn fill_rect(&mut self, area: &Rectangle, color: Rgb888) {
        let clipped = area.intersection(&self.bounding_box());
        for point in clipped.points() {
            self.set(point, color);
        }
    }

    /// Every pixel as `(x, y, color)`, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Rgb888)> + '_ {
        self.pixels
            .iter()
            .enumerate()
            .map(|(i, c)| (i % WIDTH, i / WIDTH, *c))
    }

    /// Number of pixels inside `area` that have `color`.
    pub fn count_in(&self, area: &Rectangle, color: Rgb888) -> usize {
        area.intersection(&self.bounding_box())
            .points()
            .filter(|p| self.pixel(p.x as usize, p.y as usize) == Some(color))
            .count()
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|c| *c == BLACK)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let lit = self.pixels.iter().filter(|c| **c != BLACK).count();
        f.debug_struct("Canvas")
            .field("width", &WIDTH)
            .field("height", &HEIGHT)
            .field("lit", &lit)
            .finish()
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set(point, color);
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.fill_rect(area, color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::palette::{RED, WHITE};
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    #[test]
    fn test_new_canvas_is_black() {
        let canvas = Canvas::new();
        assert!(canvas.is_blank());
        assert_eq!(canvas.iter().count(), WIDTH * HEIGHT);
    }

    #[test]
    fn test_set_ignores_off_matrix_points() {
        let mut canvas = Canvas::new();
        canvas.set(Point::new(-1, 0), WHITE);
        canvas.set(Point::new(64, 0), WHITE);
        canvas.set(Point::new(0, 32), WHITE);
        assert!(canvas.is_blank());

        canvas.set(Point::new(63, 31), WHITE);
        assert_eq!(canvas.pixel(63, 31), Some(WHITE));
        assert_eq!(canvas.pixel(64, 31), None);
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut canvas = Canvas::new();
        let area = Rectangle::new(Point::new(60, 30), Size::new(10, 10));
        canvas.fill_rect(&area, RED);
        assert_eq!(canvas.count_in(&canvas.bounding_box(), RED), 4 * 2);
    }

    #[test]
    fn test_draw_target_primitives() {
        let mut canvas = Canvas::new();
        Rectangle::new(Point::new(2, 2), Size::new(3, 3))
            .into_styled(PrimitiveStyle::with_fill(WHITE))
            .draw(&mut canvas)
            .unwrap();
        assert_eq!(canvas.count_in(&canvas.bounding_box(), WHITE), 9);
        assert_eq!(canvas.pixel(2, 2), Some(WHITE));
        assert_eq!(canvas.pixel(5, 5), Some(BLACK));
    }

    #[test]
    fn test_clear_resets_pixels() {
        let mut canvas = Canvas::filled(WHITE);
        canvas.clear(BLACK).unwrap();
        assert!(canvas.is_blank());
    }
}
