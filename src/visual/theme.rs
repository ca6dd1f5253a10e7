//! Color themes for shapes, trails and background.

use serde::{Deserialize, Serialize};

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Linear blend from `self` (t = 0) towards `other` (t = 1).
    pub fn mix(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb(lerp(self.0, other.0), lerp(self.1, other.1), lerp(self.2, other.2))
    }
}

/// User-selectable color theme.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorTheme {
    #[default]
    Red,
    Green,
    Blue,
}

impl std::fmt::Display for ColorTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Green => write!(f, "green"),
            Self::Blue => write!(f, "blue"),
        }
    }
}

impl std::str::FromStr for ColorTheme {
    type Err = crate::error::SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            "blue" => Ok(Self::Blue),
            _ => Err(crate::error::SettingsError::InvalidTheme(s.to_string())),
        }
    }
}

/// The three colors a theme resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub shape: Rgb,
    pub trail: Rgb,
    pub background: Rgb,
}

impl ColorTheme {
    pub fn palette(self) -> Palette {
        match self {
            Self::Red => Palette {
                shape: Rgb(255, 82, 82),
                trail: Rgb(255, 205, 210),
                background: Rgb(74, 20, 20),
            },
            Self::Green => Palette {
                shape: Rgb(105, 240, 174),
                trail: Rgb(200, 230, 201),
                background: Rgb(16, 56, 32),
            },
            Self::Blue => Palette {
                shape: Rgb(68, 138, 255),
                trail: Rgb(187, 222, 251),
                background: Rgb(13, 33, 74),
            },
        }
    }

    /// Next theme in the red -> green -> blue cycle.
    pub fn next(self) -> Self {
        match self {
            Self::Red => Self::Green,
            Self::Green => Self::Blue,
            Self::Blue => Self::Red,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_parse() {
        assert_eq!("Blue".parse::<ColorTheme>().unwrap(), ColorTheme::Blue);
        assert!("purple".parse::<ColorTheme>().is_err());
    }

    #[test]
    fn test_theme_cycle() {
        assert_eq!(ColorTheme::Red.next().next().next(), ColorTheme::Red);
    }

    #[test]
    fn test_mix_endpoints() {
        let a = Rgb(0, 100, 200);
        let b = Rgb(200, 100, 0);
        assert_eq!(a.mix(b, 0.0), a);
        assert_eq!(a.mix(b, 1.0), b);
        assert_eq!(a.mix(b, 0.5), Rgb(100, 100, 100));
    }
}
