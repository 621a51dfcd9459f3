//! Synthetic spritesheets with known geometry, for checking alignment.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::bbox::BoundingBox;

/// Relative placement of the square inside each frame, cycled per frame.
const JITTER: [(f64, f64); 5] = [(0.0, 0.5), (1.0, 0.0), (0.5, 1.0), (0.25, 0.25), (0.75, 0.8)];

/// A generated sheet plus where each square was drawn.
#[derive(Debug, Clone)]
pub struct SyntheticSheet {
    pub image: RgbaImage,
    /// Square bounds in sheet coordinates, one per frame.
    pub squares: Vec<BoundingBox>,
}

/// Draw `frames` square frames of `frame_size` pixels side by side, each
/// holding one opaque red square of edge `square` placed differently per
/// frame. A two-pixel margin keeps neighbouring squares apart when there
/// is room for it.
pub fn synthetic_sheet(frames: u32, frame_size: u32, square: u32) -> SyntheticSheet {
    let square = square.min(frame_size);
    let slack = frame_size - square;
    let margin = if slack >= 4 { 2 } else { 0 };
    let range = (slack - 2 * margin) as f64;

    let mut image = RgbaImage::new(frame_size * frames, frame_size);
    let mut squares = Vec::with_capacity(frames as usize);

    for i in 0..frames {
        let (fx, fy) = JITTER[i as usize % JITTER.len()];
        let x = i * frame_size + margin + (fx * range).round() as u32;
        let y = margin + (fy * range).round() as u32;

        if square > 0 {
            draw_filled_rect_mut(
                &mut image,
                Rect::at(x as i32, y as i32).of_size(square, square),
                Rgba([255, 0, 0, 255]),
            );
        }
        squares.push(BoundingBox::new(x, y, x + square, y + square));
    }

    SyntheticSheet { image, squares }
}
