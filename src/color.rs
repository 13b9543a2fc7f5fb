//! Project colors.
//!
//! Projects without an explicit color get one derived from a seed string.
//! The hash is the classic `hash * 31 + unit` fold over UTF-16 code units with
//! 32-bit signed wraparound, so the same seed produces the same color as any
//! other implementation of the indicator.

use crate::config::Settings;

/// Derive a `#rrggbb` color from `seed`. Total and deterministic.
pub fn derive_color(seed: &str) -> String {
    let hash = seed.encode_utf16().fold(0i32, |hash, unit| {
        i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    });

    let mut colour = String::with_capacity(7);
    colour.push('#');
    for byte in 0..3 {
        let value = (hash >> (byte * 8)) & 0xff;
        colour.push_str(&format!("{:02x}", value));
    }
    colour
}

/// Color-selection policy layered over [`derive_color`].
///
/// Returns `None` when colorful mode is off, the configured color when one is
/// set, and otherwise a color derived from `seed`.
pub fn project_color(settings: &Settings, seed: &str) -> Option<String> {
    if !settings.colorful {
        return None;
    }

    let explicit = Some(settings.color.as_str()).filter(|c| !c.is_empty());
    if seed.is_empty() {
        return explicit.map(str::to_string);
    }

    Some(explicit.map(str::to_string).unwrap_or_else(|| derive_color(seed)))
}
