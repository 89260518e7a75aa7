//! The 16-color palette shared with the on-chain program

/// Number of colors the program accepts (indices `0..16`)
pub const PALETTE_SIZE: usize = 16;

/// Index used when a stored byte does not name a palette entry
pub const DEFAULT_COLOR: u8 = 0;

/// A named palette entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub name: &'static str,
    pub rgb: [u8; 3],
}

impl Color {
    const fn new(name: &'static str, rgb: u32) -> Self {
        Self {
            name,
            rgb: [(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8],
        }
    }

    /// `#RRGGBB`
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.rgb[0], self.rgb[1], self.rgb[2])
    }
}

pub const PALETTE: [Color; PALETTE_SIZE] = [
    Color::new("black", 0x000000),
    Color::new("white", 0xFFFFFF),
    Color::new("red", 0xFF0000),
    Color::new("green", 0x00FF00),
    Color::new("blue", 0x0000FF),
    Color::new("yellow", 0xFFFF00),
    Color::new("magenta", 0xFF00FF),
    Color::new("cyan", 0x00FFFF),
    Color::new("orange", 0xFF8800),
    Color::new("purple", 0x8800FF),
    Color::new("pink", 0xFF0088),
    Color::new("mint", 0x00FF88),
    Color::new("sky blue", 0x0088FF),
    Color::new("gray", 0x888888),
    Color::new("dark gray", 0x444444),
    Color::new("brown", 0x884400),
];

/// Palette entry for a stored byte; unknown indices degrade to the default
pub fn color_of(index: u8) -> &'static Color {
    PALETTE
        .get(usize::from(index))
        .unwrap_or(&PALETTE[usize::from(DEFAULT_COLOR)])
}
