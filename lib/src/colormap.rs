//! Colormap construction and lookup
//!
//! A colormap is built from `(position, color)` anchors and interpolates each
//! RGB channel linearly between the two anchors bracketing a lookup value.
//! Built colormaps can be kept in a `ColormapRegistry` and fetched by name
//! on later plot requests.

use crate::{PlotError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// Name under which the spectrogram colormap is registered
pub const SPECTROGRAM_COLORMAP: &str = "spectrogram";

/// Anchors of the default spectrogram colormap (black through magenta to white)
pub const SPECTROGRAM_ANCHORS: [(f64, &str); 10] = [
    (0.0, "#000000"),
    (1.0 / 9.0, "#010325"),
    (2.0 / 9.0, "#130246"),
    (3.0 / 9.0, "#51026e"),
    (4.0 / 9.0, "#9e0379"),
    (5.0 / 9.0, "#d6033e"),
    (6.0 / 9.0, "#fc4d21"),
    (7.0 / 9.0, "#fdc967"),
    (8.0 / 9.0, "#f3fab8"),
    (1.0, "#ffffff"),
];

/// RGB triple with channels in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Parse a hex string (`#rgb`, `#rrggbb`, `#rrggbbaa`), a basic color
    /// name or single-letter shorthand, or a gray level such as `"0.75"`
    pub fn parse(color: &str) -> Result<Self> {
        let color = color.trim();
        if let Some(hex) = color.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| {
                PlotError::InvalidColormap(format!("Invalid hex color: {}", color))
            });
        }

        if let Ok(level) = color.parse::<f64>() {
            if (0.0..=1.0).contains(&level) {
                return Ok(Self::new(level, level, level));
            }
            return Err(PlotError::InvalidColormap(format!(
                "Gray level must be within [0, 1], got {}",
                color
            )));
        }

        named_color(&color.to_lowercase())
            .ok_or_else(|| PlotError::InvalidColormap(format!("Unknown color: {}", color)))
    }

    /// Quantize to 8 bits per channel
    pub fn to_rgb8(&self) -> [u8; 3] {
        let q = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    fn lerp(&self, other: &Rgb, frac: f64) -> Rgb {
        Rgb::new(
            self.r + (other.r - self.r) * frac,
            self.g + (other.g - self.g) * frac,
            self.b + (other.b - self.b) * frac,
        )
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f64 / 255.0);

    match hex.len() {
        3 => {
            let expand = |i: usize| {
                let digit = &hex[i..i + 1];
                channel(&format!("{}{}", digit, digit))
            };
            Some(Rgb::new(expand(0)?, expand(1)?, expand(2)?))
        }
        // Alpha is accepted and ignored
        6 | 8 => Some(Rgb::new(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => None,
    }
}

fn named_color(name: &str) -> Option<Rgb> {
    let rgb = match name {
        "k" | "black" => Rgb::new(0.0, 0.0, 0.0),
        "w" | "white" => Rgb::new(1.0, 1.0, 1.0),
        "r" | "red" => Rgb::new(1.0, 0.0, 0.0),
        "g" => Rgb::new(0.0, 0.5, 0.0),
        "green" => Rgb::new(0.0, 128.0 / 255.0, 0.0),
        "lime" => Rgb::new(0.0, 1.0, 0.0),
        "b" | "blue" => Rgb::new(0.0, 0.0, 1.0),
        "c" | "cyan" => Rgb::new(0.0, 0.75, 0.75),
        "m" | "magenta" => Rgb::new(0.75, 0.0, 0.75),
        "y" | "yellow" => Rgb::new(0.75, 0.75, 0.0),
        "orange" => Rgb::new(1.0, 165.0 / 255.0, 0.0),
        "purple" => Rgb::new(128.0 / 255.0, 0.0, 128.0 / 255.0),
        "gray" | "grey" => Rgb::new(128.0 / 255.0, 128.0 / 255.0, 128.0 / 255.0),
        _ => return None,
    };
    Some(rgb)
}

/// Named colormap with piecewise-linear interpolation between anchors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Colormap {
    name: String,
    anchors: Vec<(f64, Rgb)>,
}

impl Colormap {
    /// Build a colormap from `(position, color)` anchors
    ///
    /// Positions must be strictly increasing, start at 0 and end at 1.
    pub fn new(name: &str, anchors: &[(f64, &str)]) -> Result<Self> {
        let parsed = anchors
            .iter()
            .map(|&(pos, color)| Ok((pos, Rgb::parse(color)?)))
            .collect::<Result<Vec<_>>>()?;
        Self::from_rgb(name, parsed)
    }

    /// Build a colormap from already-parsed anchors
    pub fn from_rgb(name: &str, anchors: Vec<(f64, Rgb)>) -> Result<Self> {
        if anchors.len() < 2 {
            return Err(PlotError::InvalidColormap(format!(
                "At least 2 anchors required, got {}",
                anchors.len()
            )));
        }

        for pair in anchors.windows(2) {
            if !(pair[0].0 < pair[1].0) {
                return Err(PlotError::InvalidColormap(format!(
                    "Anchor positions must be strictly increasing: {} then {}",
                    pair[0].0, pair[1].0
                )));
            }
        }

        let first = anchors[0].0;
        let last = anchors[anchors.len() - 1].0;
        if first != 0.0 || last != 1.0 {
            return Err(PlotError::InvalidColormap(format!(
                "Anchors must span [0, 1], got [{}, {}]",
                first, last
            )));
        }

        Ok(Self {
            name: name.to_string(),
            anchors,
        })
    }

    /// The default spectrogram colormap
    pub fn spectrogram() -> Self {
        let anchors = SPECTROGRAM_ANCHORS
            .iter()
            .filter_map(|&(pos, color)| Rgb::parse(color).ok().map(|rgb| (pos, rgb)))
            .collect();
        Self {
            name: SPECTROGRAM_COLORMAP.to_string(),
            anchors,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn anchors(&self) -> &[(f64, Rgb)] {
        &self.anchors
    }

    /// Color at `t`, clamped to [0, 1]
    pub fn lookup(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        let idx = self.anchors.partition_point(|(pos, _)| *pos <= t);
        if idx == 0 {
            return self.anchors[0].1;
        }
        if idx >= self.anchors.len() {
            return self.anchors[self.anchors.len() - 1].1;
        }

        let (left_pos, left) = self.anchors[idx - 1];
        let (right_pos, right) = self.anchors[idx];
        let frac = (t - left_pos) / (right_pos - left_pos);
        left.lerp(&right, frac)
    }

    /// Sample the colormap into a `size`-entry lookup table
    pub fn table(&self, size: usize) -> Vec<Rgb> {
        match size {
            0 => Vec::new(),
            1 => vec![self.lookup(0.0)],
            _ => (0..size)
                .map(|i| self.lookup(i as f64 / (size - 1) as f64))
                .collect(),
        }
    }
}

/// Colormaps keyed by name
///
/// Not synchronized; share one registry per thread or guard it externally.
#[derive(Debug, Clone, Default)]
pub struct ColormapRegistry {
    maps: HashMap<String, Colormap>,
}

impl ColormapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the spectrogram colormap
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Colormap::spectrogram());
        registry
    }

    /// Insert or replace a colormap under its own name
    pub fn register(&mut self, colormap: Colormap) {
        log::debug!("Registering colormap '{}'", colormap.name());
        self.maps.insert(colormap.name().to_string(), colormap);
    }

    /// Build a colormap from anchors and register it
    pub fn build(&mut self, name: &str, anchors: &[(f64, &str)]) -> Result<&Colormap> {
        let colormap = Colormap::new(name, anchors)?;
        self.register(colormap);
        self.get(name)
            .ok_or_else(|| PlotError::InvalidColormap(format!("Colormap '{}' vanished", name)))
    }

    pub fn get(&self, name: &str) -> Option<&Colormap> {
        self.maps.get(name)
    }

    /// Fetch a colormap, failing with `InvalidColormap` if it is unknown
    pub fn resolve(&self, name: &str) -> Result<&Colormap> {
        self.get(name)
            .ok_or_else(|| PlotError::InvalidColormap(format!("Unknown colormap: {}", name)))
    }

    pub fn remove(&mut self, name: &str) -> Option<Colormap> {
        self.maps.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.maps.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.maps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

static DEFAULT_REGISTRY: OnceLock<Mutex<ColormapRegistry>> = OnceLock::new();

/// Run `f` against the process-wide default registry
///
/// For callers that want implicit registration without owning a registry.
/// All threads share the one instance; calls are serialized by a lock held
/// for the duration of `f`, so `f` must not call back into this function.
pub fn with_default_registry<R>(f: impl FnOnce(&mut ColormapRegistry) -> R) -> R {
    let registry = DEFAULT_REGISTRY.get_or_init(|| Mutex::new(ColormapRegistry::with_builtins()));
    // Poisoned by a panic in an earlier `f`; the map is still usable
    let mut guard = registry
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &Rgb, b: &Rgb) -> bool {
        (a.r - b.r).abs() < 1e-12 && (a.g - b.g).abs() < 1e-12 && (a.b - b.b).abs() < 1e-12
    }

    #[test]
    fn test_parse_colors() {
        assert_eq!(Rgb::parse("#ffffff").unwrap(), Rgb::new(1.0, 1.0, 1.0));
        assert_eq!(Rgb::parse("#f00").unwrap(), Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(Rgb::parse("#0000ff80").unwrap(), Rgb::new(0.0, 0.0, 1.0));
        assert_eq!(Rgb::parse("Black").unwrap(), Rgb::new(0.0, 0.0, 0.0));
        assert_eq!(Rgb::parse("0.5").unwrap(), Rgb::new(0.5, 0.5, 0.5));
        assert!(Rgb::parse("#12345").is_err());
        assert!(Rgb::parse("#gg0000").is_err());
        assert!(Rgb::parse("chartreuse-ish").is_err());
        assert!(Rgb::parse("1.5").is_err());
    }

    #[test]
    fn test_endpoints_are_exact() {
        let cmap = Colormap::spectrogram();
        assert_eq!(cmap.lookup(0.0), Rgb::parse("#000000").unwrap());
        assert_eq!(cmap.lookup(1.0), Rgb::parse("#ffffff").unwrap());
        assert_eq!(cmap.lookup(-4.0), cmap.lookup(0.0));
        assert_eq!(cmap.lookup(7.0), cmap.lookup(1.0));
    }

    #[test]
    fn test_anchor_positions_are_exact() {
        let cmap = Colormap::spectrogram();
        for &(pos, color) in &SPECTROGRAM_ANCHORS {
            assert!(close(&cmap.lookup(pos), &Rgb::parse(color).unwrap()));
        }
    }

    #[test]
    fn test_interpolation_is_monotonic_between_anchors() {
        let cmap = Colormap::new("ramp", &[(0.0, "#000000"), (0.5, "#ff0000"), (1.0, "#ff00ff")])
            .unwrap();
        let mid = cmap.lookup(0.25);
        assert!((mid.r - 0.5).abs() < 1e-12);
        assert_eq!(mid.g, 0.0);

        let mut prev = cmap.lookup(0.5).b;
        for i in 1..=50 {
            let b = cmap.lookup(0.5 + i as f64 * 0.01).b;
            assert!(b >= prev);
            prev = b;
        }
    }

    #[test]
    fn test_invalid_anchor_lists() {
        assert!(matches!(
            Colormap::new("one", &[(0.0, "#000000")]),
            Err(PlotError::InvalidColormap(_))
        ));
        assert!(matches!(
            Colormap::new("unordered", &[(0.0, "k"), (0.6, "r"), (0.4, "g"), (1.0, "w")]),
            Err(PlotError::InvalidColormap(_))
        ));
        assert!(matches!(
            Colormap::new("repeat", &[(0.0, "k"), (0.5, "r"), (0.5, "g"), (1.0, "w")]),
            Err(PlotError::InvalidColormap(_))
        ));
        assert!(matches!(
            Colormap::new("no-end", &[(0.0, "k"), (0.9, "w")]),
            Err(PlotError::InvalidColormap(_))
        ));
        assert!(matches!(
            Colormap::new("no-start", &[(0.1, "k"), (1.0, "w")]),
            Err(PlotError::InvalidColormap(_))
        ));
    }

    #[test]
    fn test_builtin_matches_validated_build() {
        let built = Colormap::new(SPECTROGRAM_COLORMAP, &SPECTROGRAM_ANCHORS).unwrap();
        assert_eq!(built, Colormap::spectrogram());
    }

    #[test]
    fn test_table() {
        let cmap = Colormap::new("gray", &[(0.0, "k"), (1.0, "w")]).unwrap();
        let table = cmap.table(256);
        assert_eq!(table.len(), 256);
        assert_eq!(table[0].to_rgb8(), [0, 0, 0]);
        assert_eq!(table[255].to_rgb8(), [255, 255, 255]);
        assert_eq!(table[128].to_rgb8(), [128, 128, 128]);
    }

    #[test]
    fn test_registry() {
        let mut registry = ColormapRegistry::with_builtins();
        assert!(registry.contains(SPECTROGRAM_COLORMAP));

        registry
            .build("fire", &[(0.0, "#000000"), (0.5, "red"), (1.0, "yellow")])
            .unwrap();
        assert_eq!(registry.names(), vec!["fire", SPECTROGRAM_COLORMAP]);
        assert_eq!(registry.resolve("fire").unwrap().anchors().len(), 3);
        assert!(registry.resolve("missing").is_err());

        assert!(registry.remove("fire").is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_default_registry_shared_across_threads() {
        std::thread::spawn(|| {
            with_default_registry(|registry| {
                registry
                    .build("shared-gray", &[(0.0, "w"), (1.0, "k")])
                    .unwrap();
            });
        })
        .join()
        .unwrap();

        let found = with_default_registry(|registry| {
            registry.contains("shared-gray") && registry.contains(SPECTROGRAM_COLORMAP)
        });
        assert!(found);
    }
}
