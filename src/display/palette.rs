use embedded_graphics::pixelcolor::Rgb888;

pub const BLACK: Rgb888 = Rgb888::new(0, 0, 0);
pub const WHITE: Rgb888 = Rgb888::new(255, 255, 255);
pub const YELLOW: Rgb888 = Rgb888::new(255, 255, 0);
pub const RED: Rgb888 = Rgb888::new(255, 0, 0);
pub const CYAN: Rgb888 = Rgb888::new(0, 255, 255);
pub const GRAY: Rgb888 = Rgb888::new(128, 128, 128);
pub const DARK_GRAY: Rgb888 = Rgb888::new(64, 64, 64);

/// Colors of a route bullet: disc fill and the route letter on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bullet {
    pub fill: Rgb888,
    pub text: Rgb888,
}

/// MTA trunk-line colors; unknown routes get a dark disc with yellow text.
pub fn route_bullet(route_id: &str) -> Bullet {
    let (fill, text) = match route_id.trim_end_matches('X') {
        "1" | "2" | "3" => (Rgb888::new(0xEE, 0x35, 0x2E), WHITE),
        "4" | "5" | "6" => (Rgb888::new(0x00, 0x93, 0x3C), WHITE),
        "7" => (Rgb888::new(0xB9, 0x33, 0xAD), WHITE),
        "A" | "C" | "E" => (Rgb888::new(0x00, 0x39, 0xA6), WHITE),
        "B" | "D" | "F" | "M" => (Rgb888::new(0xFF, 0x63, 0x19), WHITE),
        "G" => (Rgb888::new(0x6C, 0xBE, 0x45), WHITE),
        "J" | "Z" => (Rgb888::new(0x99, 0x66, 0x33), WHITE),
        "L" => (Rgb888::new(0xA7, 0xA9, 0xAC), BLACK),
        "N" | "Q" | "R" | "W" => (Rgb888::new(0xFC, 0xCC, 0x0A), BLACK),
        "S" | "GS" | "FS" | "H" => (Rgb888::new(0x80, 0x81, 0x83), WHITE),
        _ => (DARK_GRAY, YELLOW),
    };
    Bullet { fill, text }
}
