//! Output-name handling for the produced `.mbtiles` file.

use chrono::NaiveDate;
use tilemath::ZoomRange;

pub const MAX_NAME_LEN: usize = 50;

/// Restricts a name to `[A-Za-z0-9_-]`, at most 50 characters, with no
/// leading, trailing or doubled underscore. Idempotent.
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len().min(MAX_NAME_LEN * 2));
    for ch in input.chars() {
        let c = if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    // output is ASCII, so byte and char lengths agree
    let trimmed = out.trim_matches('_');
    let cut = &trimmed[..trimmed.len().min(MAX_NAME_LEN)];
    cut.trim_end_matches('_').to_string()
}

/// Name used when the user leaves the field empty, e.g.
/// `tiles_33_8688S_151_2093_z10-16_20261019`.
pub fn auto_name(lat: f64, lon: f64, zoom: ZoomRange, date: NaiveDate) -> String {
    let raw = format!(
        "tiles_{}_{}_z{}_{}",
        signed_coord(lat, 'S'),
        signed_coord(lon, 'W'),
        zoom,
        date.format("%Y%m%d"),
    );
    sanitize(&raw)
}

/// Sanitized user name, or the generated one if nothing survives.
pub fn resolve_output_name(user: &str, lat: f64, lon: f64, zoom: ZoomRange, today: NaiveDate) -> String {
    let name = sanitize(user);
    if name.is_empty() {
        auto_name(lat, lon, zoom, today)
    } else {
        name
    }
}

fn signed_coord(v: f64, negative: char) -> String {
    let digits = format!("{:.4}", v.abs());
    if v < 0.0 {
        format!("{digits}{negative}")
    } else {
        digits
    }
}
