//! Frame boundary detection.
//!
//! Splits a column density profile into frame regions. Three policies are
//! supported and can be swapped freely per job:
//!
//! 1. **Gap**: content blocks separated by transparent runs at least
//!    `min_gap` wide. Splits fall on the middle of each gap.
//! 2. **Valley**: Gaussian-smooth the profile and split at the local minima
//!    nearest to the evenly spaced positions the expected frame count implies.
//!    Handles sheets whose frames touch or overlap slightly.
//! 3. **Grid**: forced uniform division of the whole axis.
//!
//! When the detected region count disagrees with the expected frame count the
//! detector silently falls back to uniform division; automatic detection is a
//! best effort and a human can always re-run with the grid policy.

use serde::{Deserialize, Serialize};

use crate::density::DensityProfile;

/// Fraction of the smoothed peak below which a minimum counts as a valley
/// when no frame count is known.
const VALLEY_DEPTH_RATIO: f64 = 0.25;

/// Half-open interval `[start, end)` along the column axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRegion {
    pub start: u32,
    pub end: u32,
}

impl FrameRegion {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn width(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn contains(&self, x: u32) -> bool {
        x >= self.start && x < self.end
    }
}

/// Boundary detection policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Split on transparent gaps of at least `min_gap` columns.
    Gap { min_gap: u32 },
    /// Split on minima of the Gaussian-smoothed profile.
    Valley { sigma: f64 },
    /// Uniform division of the full axis.
    Grid,
}

impl Default for BoundaryPolicy {
    fn default() -> Self {
        Self::Gap { min_gap: 2 }
    }
}

/// Parameters for [`detect_regions`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub policy: BoundaryPolicy,

    /// Number of frames the sheet is known to contain, if any.
    pub expected_frames: Option<u32>,

    /// Densities at or below this value count as empty columns.
    pub noise_floor: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            policy: BoundaryPolicy::default(),
            expected_frames: None,
            noise_floor: 0,
        }
    }
}

/// Which path produced the final regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    Gap,
    Valley,
    Grid,
    /// Fallback: uniform division of the detected content span.
    UniformContentSpan,
    /// Fallback: uniform division of the whole axis.
    UniformFullAxis,
}

impl DetectionMethod {
    /// Whether detection had to fall back to uniform division.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::UniformContentSpan | Self::UniformFullAxis)
    }
}

/// Result of boundary detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub regions: Vec<FrameRegion>,
    pub method: DetectionMethod,
}

/// Detect frame regions in a column density profile.
pub fn detect_regions(profile: &DensityProfile, config: &DetectionConfig) -> Detection {
    let axis_len = profile.len() as u32;
    let expected = config.expected_frames.filter(|&n| n > 0);

    let (regions, method) = match config.policy {
        BoundaryPolicy::Gap { min_gap } => (
            gap_regions(&profile.values, config.noise_floor, min_gap),
            DetectionMethod::Gap,
        ),
        BoundaryPolicy::Valley { sigma } => (
            valley_regions(profile, sigma, expected).unwrap_or_default(),
            DetectionMethod::Valley,
        ),
        BoundaryPolicy::Grid => (
            uniform_regions(0, axis_len, expected.unwrap_or(1)),
            DetectionMethod::Grid,
        ),
    };

    let accepted = match expected {
        Some(n) => regions.len() == n as usize,
        None => !regions.is_empty(),
    };
    if accepted {
        tracing::debug!(
            count = regions.len(),
            ?method,
            "Frame boundaries detected"
        );
        return Detection { regions, method };
    }

    let n = expected.unwrap_or(1);
    let fallback = match profile.content_span() {
        Some((start, end)) => Detection {
            regions: uniform_regions(start, end, n),
            method: DetectionMethod::UniformContentSpan,
        },
        None => Detection {
            regions: uniform_regions(0, axis_len, n),
            method: DetectionMethod::UniformFullAxis,
        },
    };
    tracing::warn!(
        detected = regions.len(),
        expected = n,
        policy = ?method,
        fallback = ?fallback.method,
        "Frame count mismatch, dividing uniformly"
    );
    fallback
}

/// Number of square frames that fit a strip of the given size.
pub fn square_frame_count(width: u32, height: u32) -> u32 {
    if height == 0 {
        return 1;
    }
    (width / height).max(1)
}

/// Divide `[start, end)` into `n` regions of (nearly) equal width.
///
/// Boundaries are rounded to the nearest pixel; the last region always ends
/// exactly at `end`.
pub fn uniform_regions(start: u32, end: u32, n: u32) -> Vec<FrameRegion> {
    if n == 0 || end < start {
        return Vec::new();
    }
    let span = (end - start) as f64;
    let mut regions = Vec::with_capacity(n as usize);
    let mut prev = start;
    for k in 1..=n {
        let next = if k == n {
            end
        } else {
            start + (span * k as f64 / n as f64).round() as u32
        };
        regions.push(FrameRegion::new(prev, next));
        prev = next;
    }
    regions
}

/// Maximal runs of content, with gaps narrower than `min_gap` merged away.
pub fn content_blocks(values: &[u32], noise_floor: u32, min_gap: u32) -> Vec<FrameRegion> {
    let mut runs: Vec<FrameRegion> = Vec::new();
    let mut run_start: Option<u32> = None;

    for (i, &v) in values.iter().enumerate() {
        let i = i as u32;
        match (v > noise_floor, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                runs.push(FrameRegion::new(start, i));
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        runs.push(FrameRegion::new(start, values.len() as u32));
    }

    let mut blocks: Vec<FrameRegion> = Vec::with_capacity(runs.len());
    for run in runs {
        match blocks.last_mut() {
            Some(last) if run.start - last.end < min_gap => last.end = run.end,
            _ => blocks.push(run),
        }
    }
    blocks
}

/// Gap policy: partition the content span at the middle of each gap.
fn gap_regions(values: &[u32], noise_floor: u32, min_gap: u32) -> Vec<FrameRegion> {
    let blocks = content_blocks(values, noise_floor, min_gap);
    let (Some(first), Some(last)) = (blocks.first(), blocks.last()) else {
        return Vec::new();
    };

    let mut cuts = vec![first.start];
    for pair in blocks.windows(2) {
        cuts.push((pair[0].end + pair[1].start) / 2);
    }
    cuts.push(last.end);

    cuts.windows(2)
        .map(|w| FrameRegion::new(w[0], w[1]))
        .collect()
}

/// Valley policy. Returns `None` when not enough suitable minima exist.
fn valley_regions(
    profile: &DensityProfile,
    sigma: f64,
    expected: Option<u32>,
) -> Option<Vec<FrameRegion>> {
    let (start, end) = profile.content_span()?;
    let smoothed = gaussian_smooth(&profile.values, sigma);
    let minima: Vec<u32> = local_minima(&smoothed)
        .into_iter()
        .map(|m| m as u32)
        .filter(|&m| m > start && m < end)
        .collect();

    let splits = match expected {
        Some(n) => select_nearest_minima(&minima, start, end, n)?,
        None => {
            let peak = smoothed.iter().copied().fold(0.0_f64, f64::max);
            minima
                .into_iter()
                .filter(|&m| smoothed[m as usize] <= peak * VALLEY_DEPTH_RATIO)
                .collect()
        }
    };

    let mut cuts = Vec::with_capacity(splits.len() + 2);
    cuts.push(start);
    cuts.extend(splits);
    cuts.push(end);
    Some(
        cuts.windows(2)
            .map(|w| FrameRegion::new(w[0], w[1]))
            .collect(),
    )
}

/// For each of the `n - 1` evenly spaced split positions over `[start, end)`,
/// pick the nearest unused minimum within half a frame width.
fn select_nearest_minima(minima: &[u32], start: u32, end: u32, n: u32) -> Option<Vec<u32>> {
    let frame_w = (end - start) as f64 / n as f64;
    let tolerance = frame_w / 2.0;
    let mut chosen: Vec<u32> = Vec::with_capacity(n.saturating_sub(1) as usize);

    for k in 1..n {
        let target = start as f64 + frame_w * k as f64;
        let floor = chosen.last().copied().unwrap_or(start);
        let best = minima
            .iter()
            .copied()
            .filter(|&m| m > floor)
            .map(|m| (m, (m as f64 - target).abs()))
            .filter(|&(_, dist)| dist <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        chosen.push(best.0);
    }
    Some(chosen)
}

/// Convolve the profile with a normalized Gaussian kernel (radius `3σ`,
/// clamped edges). A non-positive sigma returns the profile unchanged.
pub fn gaussian_smooth(values: &[u32], sigma: f64) -> Vec<f64> {
    if sigma <= 0.0 || values.is_empty() {
        return values.iter().map(|&v| v as f64).collect();
    }

    let radius = (3.0 * sigma).ceil() as isize;
    let kernel: Vec<f64> = (-radius..=radius)
        .map(|i| (-((i * i) as f64) / (2.0 * sigma * sigma)).exp())
        .collect();
    let norm: f64 = kernel.iter().sum();
    let last = values.len() as isize - 1;

    (0..values.len() as isize)
        .map(|center| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, weight)| {
                    let idx = (center + k as isize - radius).clamp(0, last);
                    values[idx as usize] as f64 * weight
                })
                .sum::<f64>()
                / norm
        })
        .collect()
}

/// Indices of strict local minima. A flat-bottomed valley reports its centre.
/// The first and last samples are never minima.
pub fn local_minima(signal: &[f64]) -> Vec<usize> {
    const EPS: f64 = 1e-9;
    let n = signal.len();
    let mut minima = Vec::new();
    let mut i = 1;

    while i + 1 < n {
        if signal[i] < signal[i - 1] - EPS {
            let mut j = i;
            while j + 1 < n && (signal[j + 1] - signal[i]).abs() <= EPS {
                j += 1;
            }
            if j + 1 < n && signal[j + 1] > signal[i] + EPS {
                minima.push((i + j) / 2);
            }
            i = j + 1;
        } else {
            i += 1;
        }
    }
    minima
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::Axis;
    use proptest::prelude::*;

    fn profile(values: Vec<u32>) -> DensityProfile {
        DensityProfile::new(Axis::Columns, values)
    }

    /// `lead` empty columns, then `n` blocks of `width` filled columns
    /// separated by `gap` empty columns, then `trail` empty columns.
    fn strip(n: u32, width: u32, gap: u32, lead: u32, trail: u32) -> Vec<u32> {
        let mut values = vec![0; lead as usize];
        for i in 0..n {
            if i > 0 {
                values.extend(std::iter::repeat(0).take(gap as usize));
            }
            values.extend(std::iter::repeat(7).take(width as usize));
        }
        values.extend(std::iter::repeat(0).take(trail as usize));
        values
    }

    #[test]
    fn gap_policy_finds_separated_frames() {
        let p = profile(strip(3, 10, 4, 2, 2));
        let detection = detect_regions(
            &p,
            &DetectionConfig {
                policy: BoundaryPolicy::Gap { min_gap: 3 },
                expected_frames: Some(3),
                noise_floor: 0,
            },
        );
        assert_eq!(detection.method, DetectionMethod::Gap);
        assert_eq!(
            detection.regions,
            vec![
                FrameRegion::new(2, 14),
                FrameRegion::new(14, 28),
                FrameRegion::new(28, 40),
            ]
        );
    }

    #[test]
    fn narrow_gaps_merge_into_one_block() {
        let blocks = content_blocks(&[1, 1, 0, 1, 1, 0, 0, 0, 1], 0, 2);
        assert_eq!(
            blocks,
            vec![FrameRegion::new(0, 5), FrameRegion::new(8, 9)]
        );
    }

    #[test]
    fn count_mismatch_falls_back_to_content_span() {
        // Two blocks but four frames expected.
        let p = profile(strip(2, 10, 4, 6, 6));
        let detection = detect_regions(
            &p,
            &DetectionConfig {
                policy: BoundaryPolicy::Gap { min_gap: 2 },
                expected_frames: Some(4),
                noise_floor: 0,
            },
        );
        assert_eq!(detection.method, DetectionMethod::UniformContentSpan);
        assert!(detection.method.is_fallback());
        assert_eq!(detection.regions.len(), 4);
        assert_eq!(detection.regions[0].start, 6);
        assert_eq!(detection.regions[3].end, 30);
    }

    #[test]
    fn empty_profile_falls_back_to_full_axis() {
        let p = profile(vec![0; 40]);
        let detection = detect_regions(
            &p,
            &DetectionConfig {
                expected_frames: Some(4),
                ..Default::default()
            },
        );
        assert_eq!(detection.method, DetectionMethod::UniformFullAxis);
        assert_eq!(detection.regions, uniform_regions(0, 40, 4));
    }

    #[test]
    fn grid_policy_ignores_content() {
        let p = profile(strip(2, 10, 4, 0, 0));
        let detection = detect_regions(
            &p,
            &DetectionConfig {
                policy: BoundaryPolicy::Grid,
                expected_frames: Some(3),
                noise_floor: 0,
            },
        );
        assert_eq!(detection.method, DetectionMethod::Grid);
        assert_eq!(detection.regions, uniform_regions(0, 24, 3));
    }

    #[test]
    fn valley_policy_splits_touching_frames() {
        // Three humps that touch: the density dips but never reaches zero.
        let mut values = Vec::new();
        for _ in 0..3 {
            values.extend([1, 3, 6, 9, 10, 10, 9, 6, 3, 1]);
        }
        let p = profile(values);

        let gap = detect_regions(
            &p,
            &DetectionConfig {
                policy: BoundaryPolicy::Gap { min_gap: 1 },
                expected_frames: Some(3),
                noise_floor: 0,
            },
        );
        assert!(gap.method.is_fallback());

        let valley = detect_regions(
            &p,
            &DetectionConfig {
                policy: BoundaryPolicy::Valley { sigma: 1.0 },
                expected_frames: Some(3),
                noise_floor: 0,
            },
        );
        assert_eq!(valley.method, DetectionMethod::Valley);
        assert_eq!(valley.regions.len(), 3);
        let cuts: Vec<u32> = valley.regions.iter().skip(1).map(|r| r.start).collect();
        assert!((cuts[0] as i32 - 10).abs() <= 1, "cuts: {cuts:?}");
        assert!((cuts[1] as i32 - 20).abs() <= 1, "cuts: {cuts:?}");
    }

    #[test]
    fn valley_policy_without_count_uses_deep_minima() {
        let p = profile(strip(3, 8, 6, 0, 0));
        let detection = detect_regions(
            &p,
            &DetectionConfig {
                policy: BoundaryPolicy::Valley { sigma: 1.0 },
                expected_frames: None,
                noise_floor: 0,
            },
        );
        assert_eq!(detection.method, DetectionMethod::Valley);
        assert_eq!(detection.regions.len(), 3);
    }

    #[test]
    fn plateau_minimum_reports_centre() {
        let minima = local_minima(&[5.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 3.0, 4.0]);
        assert_eq!(minima, vec![4]);
    }

    #[test]
    fn smoothing_preserves_mass_away_from_edges() {
        let mut values = vec![0u32; 41];
        values[20] = 100;
        let smoothed = gaussian_smooth(&values, 2.0);
        let sum: f64 = smoothed.iter().sum();
        assert!((sum - 100.0).abs() < 1e-6);
        assert!(smoothed[20] > smoothed[18]);
    }

    #[test]
    fn square_frame_count_from_strip_size() {
        assert_eq!(square_frame_count(256, 64), 4);
        assert_eq!(square_frame_count(10, 64), 1);
        assert_eq!(square_frame_count(10, 0), 1);
    }

    proptest! {
        #[test]
        fn separated_frames_partition_content_span(
            n in 1u32..8,
            width in 2u32..30,
            gap in 3u32..20,
            lead in 0u32..12,
            trail in 0u32..12,
            with_count in any::<bool>(),
        ) {
            let p = profile(strip(n, width, gap, lead, trail));
            let detection = detect_regions(&p, &DetectionConfig {
                policy: BoundaryPolicy::Gap { min_gap: 3 },
                expected_frames: with_count.then_some(n),
                noise_floor: 0,
            });

            prop_assert_eq!(detection.method, DetectionMethod::Gap);
            prop_assert_eq!(detection.regions.len(), n as usize);
            let (start, end) = p.content_span().unwrap();
            prop_assert_eq!(detection.regions[0].start, start);
            prop_assert_eq!(detection.regions[n as usize - 1].end, end);
            for pair in detection.regions.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
        }

        #[test]
        fn uniform_regions_tile_the_span(start in 0u32..100, len in 0u32..500, n in 1u32..16) {
            let regions = uniform_regions(start, start + len, n);
            prop_assert_eq!(regions.len(), n as usize);
            prop_assert_eq!(regions[0].start, start);
            prop_assert_eq!(regions[n as usize - 1].end, start + len);
            for pair in regions.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
                prop_assert!(pair[0].start <= pair[0].end);
            }
        }
    }
}
