//! Deterministic color assignment shared by every chart builder.
use std::collections::HashMap;

/// Plotly's default qualitative palette.
pub const QUALITATIVE: [&str; 10] = [
    "#636efa", "#ef553b", "#00cc96", "#ab63fa", "#ffa15a", "#19d3f3", "#ff6692", "#b6e880",
    "#ff97ff", "#fecb52",
];

pub const QUARTER: [(&str, &str); 4] = [
    ("Q1", "#1f77b4"),
    ("Q2", "#ff7f0e"),
    ("Q3", "#2ca02c"),
    ("Q4", "#d62728"),
];

pub const DISTANCE_BUCKET: [(&str, &str); 3] = [
    ("Short", "#636efa"),
    ("Medium", "#ef553b"),
    ("Long", "#00cc96"),
];

/// Used when a series key has no fixed color.
pub const FALLBACK: &str = "#7f7f7f";

/// Ordered key → color mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorMap {
    order: Vec<String>,
    colors: HashMap<String, &'static str>,
}

impl ColorMap {
    pub fn get(&self, key: &str) -> &'static str {
        self.colors.get(key).copied().unwrap_or(FALLBACK)
    }

    /// Keys in assignment order.
    pub fn keys(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Give the i-th distinct key `palette[i % palette.len()]`.
///
/// Duplicates keep the color of their first occurrence.
pub fn assign_colors<I, S>(keys: I, palette: &[&'static str]) -> ColorMap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut map = ColorMap::default();
    if palette.is_empty() {
        return map;
    }
    for key in keys {
        let key = key.as_ref();
        if map.colors.contains_key(key) {
            continue;
        }
        let color = palette[map.order.len() % palette.len()];
        map.colors.insert(key.to_string(), color);
        map.order.push(key.to_string());
    }
    map
}

/// Look up a key in a fixed enumerated palette.
pub fn fixed_color(palette: &[(&str, &'static str)], key: &str) -> &'static str {
    palette
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, c)| *c)
        .unwrap_or(FALLBACK)
}

/// "#rrggbb" plus opacity → "rgba(r,g,b,a)".
pub fn with_opacity(hex: &str, opacity: f64) -> String {
    let digits = hex.trim_start_matches('#');
    let channel = |i: usize| {
        digits
            .get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .unwrap_or(127)
    };
    format!(
        "rgba({},{},{},{})",
        channel(0),
        channel(2),
        channel(4),
        opacity
    )
}
