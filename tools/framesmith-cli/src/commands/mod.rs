pub mod align;
pub mod audit;
pub mod profile;
pub mod remove_bg;
pub mod slice;
pub mod synth;
pub mod telemetry;

use framesmith_sprite_core::{AnchorKind, BoundaryPolicy};

/// Build a boundary policy from its CLI/config name.
pub(crate) fn parse_policy(name: &str, min_gap: u32, sigma: f64) -> anyhow::Result<BoundaryPolicy> {
    match name.trim().to_ascii_lowercase().as_str() {
        "gap" => Ok(BoundaryPolicy::Gap { min_gap }),
        "valley" => Ok(BoundaryPolicy::Valley { sigma }),
        "grid" => Ok(BoundaryPolicy::Grid),
        other => anyhow::bail!("Unknown boundary policy '{other}' (expected gap|valley|grid)"),
    }
}

pub(crate) fn parse_anchor(name: &str) -> anyhow::Result<AnchorKind> {
    name.parse::<AnchorKind>().map_err(anyhow::Error::msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_names() {
        assert_eq!(
            parse_policy("Gap", 3, 1.0).unwrap(),
            BoundaryPolicy::Gap { min_gap: 3 }
        );
        assert_eq!(
            parse_policy("valley", 2, 1.5).unwrap(),
            BoundaryPolicy::Valley { sigma: 1.5 }
        );
        assert_eq!(parse_policy("grid", 2, 2.0).unwrap(), BoundaryPolicy::Grid);
        assert!(parse_policy("auto", 2, 2.0).is_err());
    }

    #[test]
    fn anchor_names() {
        assert_eq!(parse_anchor("centroid").unwrap(), AnchorKind::Centroid);
        assert!(parse_anchor("feet").is_err());
    }
}
