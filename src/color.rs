use std::fmt;

use palette::{named, Hsl, IntoColor, Srgb};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Edge palette: fixed, cyclic
// ---------------------------------------------------------------------------

/// Colour label attached to a harmonic edge.
///
/// Serialized by name (`"red"`, `"green"`, ...) so exported graphs stay
/// readable by the document view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeColor {
    Red,
    Green,
    Purple,
    Orange,
    Brown,
    Blue,
    Teal,
    Gray,
}

impl EdgeColor {
    pub const DEFAULT_PALETTE: [EdgeColor; 5] = [
        EdgeColor::Red,
        EdgeColor::Green,
        EdgeColor::Purple,
        EdgeColor::Orange,
        EdgeColor::Brown,
    ];

    /// Pick the `index`-th colour of `palette`, wrapping around.
    /// An empty palette falls back to red.
    pub fn cycle(palette: &[EdgeColor], index: usize) -> EdgeColor {
        if palette.is_empty() {
            return EdgeColor::Red;
        }
        palette[index % palette.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            EdgeColor::Red => "red",
            EdgeColor::Green => "green",
            EdgeColor::Purple => "purple",
            EdgeColor::Orange => "orange",
            EdgeColor::Brown => "brown",
            EdgeColor::Blue => "blue",
            EdgeColor::Teal => "teal",
            EdgeColor::Gray => "gray",
        }
    }

    /// The CSS/SVG colour of the same name.
    pub fn srgb(self) -> Srgb<u8> {
        match self {
            EdgeColor::Red => named::RED,
            EdgeColor::Green => named::GREEN,
            EdgeColor::Purple => named::PURPLE,
            EdgeColor::Orange => named::ORANGE,
            EdgeColor::Brown => named::BROWN,
            EdgeColor::Blue => named::BLUE,
            EdgeColor::Teal => named::TEAL,
            EdgeColor::Gray => named::GRAY,
        }
    }
}

impl fmt::Display for EdgeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Method palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Srgb<u8>> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            Srgb::new(
                (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
                (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
                (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
            )
        })
        .collect()
}

/// Spectrogram colour for a level in `0..=1`: dark blue through red.
pub fn heat(level: f64) -> Srgb<u8> {
    let level = level.clamp(0.0, 1.0) as f32;
    let hsl = Hsl::new(240.0 * (1.0 - level), 0.85, 0.1 + 0.45 * level);
    let rgb: Srgb = hsl.into_color();
    Srgb::new(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_cycles() {
        let p = EdgeColor::DEFAULT_PALETTE;
        assert_eq!(EdgeColor::cycle(&p, 0), EdgeColor::Red);
        assert_eq!(EdgeColor::cycle(&p, 4), EdgeColor::Brown);
        assert_eq!(EdgeColor::cycle(&p, 5), EdgeColor::Red);
        assert_eq!(EdgeColor::cycle(&[], 3), EdgeColor::Red);
    }

    #[test]
    fn serializes_by_name() {
        let json = serde_json::to_string(&EdgeColor::Purple).unwrap();
        assert_eq!(json, "\"purple\"");
        assert_eq!(EdgeColor::Red.srgb(), Srgb::new(255, 0, 0));
    }

    #[test]
    fn generated_palette_is_distinct() {
        let colours = generate_palette(4);
        assert_eq!(colours.len(), 4);
        for i in 0..4 {
            for j in (i + 1)..4 {
                assert_ne!(colours[i], colours[j]);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn heat_runs_from_blue_to_red() {
        let cold = heat(0.0);
        let hot = heat(1.0);
        assert!(cold.blue > cold.red);
        assert!(hot.red > hot.blue);
        assert_eq!(heat(-3.0), cold);
    }
}
