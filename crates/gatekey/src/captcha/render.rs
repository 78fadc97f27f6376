//! CAPTCHA image rendering.
//!
//! Produces a self-contained SVG: dark background, random noise lines, and
//! the challenge characters with jittered position, rotation and colour.

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::Rng;

/// Number of noise lines drawn over the background
const NOISE_LINES: usize = 15;

/// Render `text` as an SVG image of the given size
pub fn render_svg(text: &str, width: u32, height: u32, rng: &mut impl Rng) -> String {
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}">"#,
        width, height
    );

    // Background
    svg.push_str(r##"<rect width="100%" height="100%" fill="#1a1a2e"/>"##);

    // Noise lines
    for _ in 0..NOISE_LINES {
        let x1 = rng.random_range(0..width);
        let y1 = rng.random_range(0..height);
        let x2 = rng.random_range(0..width);
        let y2 = rng.random_range(0..height);
        let opacity = rng.random_range(20..50);
        svg.push_str(&format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="rgba(255,255,255,0.{})" stroke-width="1"/>"#,
            x1, y1, x2, y2, opacity
        ));
    }

    let glyphs = text.chars().count();
    let char_width = width as f32 / (glyphs as f32 + 1.0);
    let font_size = (height as f32 * 0.4).max(8.0) as u32;
    let baseline = (height as f32 * 0.62) as i32;
    let jitter = (height / 8).max(1) as i32;

    for (i, c) in text.chars().enumerate() {
        let x = char_width * (i as f32 + 0.8);
        let y = baseline + rng.random_range(-jitter..jitter);
        let rotation = rng.random_range(-15..15);
        let color = format!(
            "rgb({},{},{})",
            rng.random_range(150..255),
            rng.random_range(150..255),
            rng.random_range(150..255)
        );

        svg.push_str(&format!(
            r#"<text x="{}" y="{}" font-family="monospace" font-size="{}" font-weight="bold" fill="{}" transform="rotate({} {} {})">{}</text>"#,
            x,
            y,
            font_size,
            color,
            rotation,
            x,
            y,
            escape_xml(c)
        ));
    }

    svg.push_str("</svg>");
    svg
}

/// Wrap an SVG document as a base64 data URL
pub fn to_data_url(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

fn escape_xml(c: char) -> String {
    match c {
        '<' => "&lt;".to_string(),
        '>' => "&gt;".to_string(),
        '&' => "&amp;".to_string(),
        '"' => "&quot;".to_string(),
        '\'' => "&apos;".to_string(),
        _ => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_contains_every_glyph() {
        let svg = render_svg("QWERTY", 280, 100, &mut rand::rng());

        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="280" height="100">"#));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<text ").count(), 6);
        for c in "QWERTY".chars() {
            assert!(svg.contains(&format!(">{c}</text>")));
        }
    }

    #[test]
    fn test_markup_chars_are_escaped() {
        let svg = render_svg("<&>", 120, 40, &mut rand::rng());
        assert!(svg.contains(">&lt;</text>"));
        assert!(svg.contains(">&amp;</text>"));
        assert!(svg.contains(">&gt;</text>"));
    }

    #[test]
    fn test_data_url_round_trips() {
        let url = to_data_url("<svg/>");
        let encoded = url.strip_prefix("data:image/svg+xml;base64,").unwrap();
        assert_eq!(STANDARD.decode(encoded).unwrap(), b"<svg/>");
    }
}
