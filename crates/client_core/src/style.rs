use shared::domain::{ColorTheme, ThemeMode};

use crate::preferences::Preference;

pub const LIGHT_BASE: &str = "#F4F4F4";
pub const DARK_BASE: &str = "#171717";

pub fn accent_hex(color_theme: ColorTheme) -> &'static str {
    match color_theme {
        ColorTheme::Orange => "#FB8500",
        ColorTheme::Blue => "#389EFC",
        ColorTheme::Red => "#D00000",
        ColorTheme::Yellow => "#FFBA08",
        ColorTheme::Green => "#7ED957",
    }
}

/// Darkened accent for shaded surfaces: every channel scaled down to 8%,
/// rounded toward zero.
pub fn dark_shade(hex: &str) -> String {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    let mut shaded = String::with_capacity(7);
    shaded.push('#');
    for i in 0..3 {
        let channel = digits
            .get(i * 2..i * 2 + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .unwrap_or(0);
        let scaled = (f32::from(channel) * 0.08).floor() as u8;
        shaded.push_str(&format!("{scaled:02x}"));
    }
    shaded
}

/// Declarative style values derived from preferences. Consumers read
/// these; nothing mutates global styling as a side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleTokens {
    pub theme: ThemeMode,
    pub base: &'static str,
    pub accent: &'static str,
    pub accent_shade: String,
}

pub fn compute(preference: &Preference) -> StyleTokens {
    let accent = accent_hex(preference.color_theme);
    StyleTokens {
        theme: preference.theme,
        base: match preference.theme {
            ThemeMode::Dark => DARK_BASE,
            ThemeMode::Light => LIGHT_BASE,
        },
        accent,
        accent_shade: dark_shade(accent),
    }
}

#[cfg(test)]
#[path = "tests/style_tests.rs"]
mod tests;
