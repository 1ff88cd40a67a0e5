use ratatui::style::Color;

// Cool dark palette (near-black blues + cyan accent). Add roles here rather
// than scattering raw colors through the render code.
pub const BG: Color = Color::Rgb(13, 15, 18);
pub const SURFACE: Color = Color::Rgb(20, 24, 30);

pub const FG: Color = Color::Rgb(226, 230, 235);
pub const MUTED: Color = Color::Rgb(148, 158, 170);
pub const DIM: Color = Color::Rgb(100, 110, 122);
pub const BORDER: Color = Color::Rgb(52, 61, 74);

pub const ACCENT: Color = Color::Rgb(64, 186, 213);

// Semantic colors.
pub const LOADING: Color = Color::Rgb(229, 192, 123);
pub const ERROR: Color = Color::Rgb(240, 113, 120);
