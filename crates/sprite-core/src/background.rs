//! Background removal for generated sprite art.
//!
//! Two kinds of baked-in backgrounds show up in generated sheets:
//! - a flat chroma-key colour (usually pure green or magenta);
//! - a gray/white "fake transparency" checkerboard.
//!
//! Chroma keying is global. Checkerboard removal floods inward from the image
//! border so grays inside the sprite itself survive.

use std::collections::VecDeque;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Parse `#rrggbb` (leading `#` optional).
pub fn parse_hex_color(s: &str) -> Result<[u8; 3], String> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("invalid colour '{s}', expected #rrggbb"));
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

/// Make every pixel within `tolerance` of `key` (max channel distance)
/// fully transparent. Returns the number of pixels cleared.
pub fn remove_chroma_key(image: &mut RgbaImage, key: [u8; 3], tolerance: u8) -> usize {
    let mut cleared = 0;
    for pixel in image.pixels_mut() {
        if pixel[3] == 0 {
            continue;
        }
        let distance = (0..3)
            .map(|c| pixel[c].abs_diff(key[c]))
            .max()
            .unwrap_or(0);
        if distance <= tolerance {
            *pixel = TRANSPARENT;
            cleared += 1;
        }
    }
    cleared
}

/// Checkerboard detection settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerboardConfig {
    /// Max luminance distance from a detected tone for a pixel to be removed.
    pub tolerance: u8,
    /// Max spread between RGB channels for a pixel to count as neutral gray.
    pub neutral_spread: u8,
    /// Minimum share of border pixels each tone must cover.
    pub min_tone_share: f64,
}

impl Default for CheckerboardConfig {
    fn default() -> Self {
        Self {
            tolerance: 12,
            neutral_spread: 10,
            min_tone_share: 0.10,
        }
    }
}

/// Outcome of a checkerboard removal pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerboardRemoval {
    /// Luminance of the two checker tones, darker first.
    pub tones: [u8; 2],
    pub cleared: usize,
}

fn neutral_luma(pixel: &Rgba<u8>, spread: u8) -> Option<u8> {
    if pixel[3] == 0 {
        return None;
    }
    let [r, g, b, _] = pixel.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max - min > spread {
        return None;
    }
    Some(((r as u16 + g as u16 + b as u16) / 3) as u8)
}

fn border_coords(width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    let top_bottom = (0..width).flat_map(move |x| [(x, 0), (x, height - 1)]);
    let sides = (1..height.saturating_sub(1)).flat_map(move |y| [(0, y), (width - 1, y)]);
    top_bottom.chain(sides)
}

/// Find the two dominant neutral tones on the image border.
pub fn detect_checker_tones(image: &RgbaImage, config: &CheckerboardConfig) -> Option<[u8; 2]> {
    let (width, height) = image.dimensions();
    if width < 2 || height < 2 {
        return None;
    }

    // 64 buckets of 4 luminance levels each.
    let mut counts = [0u32; 64];
    let mut sums = [0u64; 64];
    let mut border_len = 0u32;
    for (x, y) in border_coords(width, height) {
        border_len += 1;
        if let Some(luma) = neutral_luma(image.get_pixel(x, y), config.neutral_spread) {
            let bucket = (luma / 4) as usize;
            counts[bucket] += 1;
            sums[bucket] += luma as u64;
        }
    }

    let min_count = (border_len as f64 * config.min_tone_share).ceil() as u32;
    let mut ranked: Vec<usize> = (0..64).filter(|&b| counts[b] >= min_count.max(1)).collect();
    ranked.sort_by(|a, b| counts[*b].cmp(&counts[*a]));

    let first = *ranked.first()?;
    let second = ranked
        .iter()
        .copied()
        .find(|&b| b.abs_diff(first) > 2)?;

    let tone = |b: usize| (sums[b] / counts[b] as u64) as u8;
    let (a, b) = (tone(first), tone(second));
    Some([a.min(b), a.max(b)])
}

/// Remove a baked-in checkerboard by flooding from the border.
///
/// Returns `None` when no checkerboard is detected; the image is untouched.
pub fn remove_checkerboard(
    image: &mut RgbaImage,
    config: &CheckerboardConfig,
) -> Option<CheckerboardRemoval> {
    let tones = detect_checker_tones(image, config)?;
    let (width, height) = image.dimensions();

    let matches = |pixel: &Rgba<u8>| {
        neutral_luma(pixel, config.neutral_spread)
            .map(|luma| tones.iter().any(|&t| luma.abs_diff(t) <= config.tolerance))
            .unwrap_or(false)
    };

    let idx = |x: u32, y: u32| (y * width + x) as usize;
    let mut visited = vec![false; (width * height) as usize];
    let mut queue = VecDeque::new();

    for (x, y) in border_coords(width, height) {
        if !visited[idx(x, y)] && matches(image.get_pixel(x, y)) {
            visited[idx(x, y)] = true;
            queue.push_back((x, y));
        }
    }

    let mut cleared = 0;
    while let Some((x, y)) = queue.pop_front() {
        image.put_pixel(x, y, TRANSPARENT);
        cleared += 1;

        let neighbours = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for (nx, ny) in neighbours {
            if nx >= width || ny >= height || visited[idx(nx, ny)] {
                continue;
            }
            if matches(image.get_pixel(nx, ny)) {
                visited[idx(nx, ny)] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    tracing::debug!(?tones, cleared, "Removed checkerboard background");
    Some(CheckerboardRemoval { tones, cleared })
}
