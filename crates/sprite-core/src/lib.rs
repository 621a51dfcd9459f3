//! Framesmith Sprite Core: frame extraction and alignment
//!
//! Turns messy, hand-drawn or generated spritesheets into clean, evenly
//! spaced animation strips:
//! - **Density profiling:** per-column count of opaque pixels
//! - **Boundary detection:** gap, valley or forced-grid frame splitting
//! - **Anchoring:** bounding-box centre or alpha centroid per frame
//! - **Normalization:** rescale and re-anchor each frame on a fixed canvas
//! - **Assembly:** concatenate normalized frames into one strip
//! - **Background removal:** chroma key and baked-in checkerboards
//!
//! Everything except the `load_rgba`/`save_png` helpers and
//! [`SpritePipeline::run_file`] is pure computation on in-memory images.

pub mod anchor;
pub mod assemble;
pub mod background;
pub mod bbox;
pub mod boundary;
pub mod density;
pub mod normalize;
pub mod pipeline;
pub mod synthetic;

pub use anchor::{Anchor, AnchorKind};
pub use boundary::{BoundaryPolicy, Detection, DetectionMethod, FrameRegion};
pub use normalize::{FrameNormalizer, NormalizeConfig, Placement};
pub use pipeline::{PipelineConfig, PipelineOutput, RunOptions, SpritePipeline};
