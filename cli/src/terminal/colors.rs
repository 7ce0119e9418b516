use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 120, g: 200, b: 255 };
pub const ACCENT: Color = Color::TrueColor { r: 250, g: 200, b: 90 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::TrueColor { r: 220, g: 220, b: 220 };
pub const IPV4_ADDR: Color = Color::TrueColor { r: 130, g: 220, b: 140 };
pub const IPV6_ADDR: Color = Color::TrueColor { r: 110, g: 190, b: 190 };
pub const URL: Color = Color::TrueColor { r: 170, g: 150, b: 250 };
