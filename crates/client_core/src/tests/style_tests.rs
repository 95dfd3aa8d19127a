use super::*;

#[test]
fn dark_shade_scales_every_channel_to_eight_percent() {
    assert_eq!(dark_shade("#FB8500"), "#140a00");
    assert_eq!(dark_shade("#389EFC"), "#040c14");
    assert_eq!(dark_shade("#000000"), "#000000");
}

#[test]
fn dark_shade_accepts_a_bare_hex_string() {
    assert_eq!(dark_shade("D00000"), "#100000");
}

#[test]
fn tokens_follow_the_preference() {
    let mut preference = Preference::default();
    let tokens = compute(&preference);
    assert_eq!(tokens.theme, ThemeMode::Dark);
    assert_eq!(tokens.base, DARK_BASE);
    assert_eq!(tokens.accent, "#FB8500");
    assert_eq!(tokens.accent_shade, "#140a00");

    preference.theme = ThemeMode::Light;
    preference.color_theme = ColorTheme::Green;
    let tokens = compute(&preference);
    assert_eq!(tokens.base, LIGHT_BASE);
    assert_eq!(tokens.accent, "#7ED957");
}

#[test]
fn every_palette_entry_has_an_accent() {
    for color_theme in ColorTheme::ALL {
        assert!(accent_hex(color_theme).starts_with('#'));
    }
}
