//! Spritesheet assembly, re-slicing and image I/O.

use std::path::Path;

use image::{imageops, RgbaImage};

use framesmith_common::error::{FramesmithError, FramesmithResult};

/// Copy every pixel of `src` with non-zero alpha onto `dst` at `(x, y)`.
///
/// Fully transparent source pixels never overwrite the destination, so a
/// frame's empty background cannot clobber its neighbours. Pixels falling
/// outside `dst` are clipped.
pub fn blit_masked(dst: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    let (dst_w, dst_h) = (dst.width() as i64, dst.height() as i64);
    for (sx, sy, pixel) in src.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        let dx = x + sx as i64;
        let dy = y + sy as i64;
        if dx < 0 || dy < 0 || dx >= dst_w || dy >= dst_h {
            continue;
        }
        dst.put_pixel(dx as u32, dy as u32, *pixel);
    }
}

/// Concatenate equally sized frames left to right with `padding` pixels
/// between neighbours.
pub fn assemble_strip(frames: &[RgbaImage], padding: u32) -> FramesmithResult<RgbaImage> {
    let Some(first) = frames.first() else {
        return Err(FramesmithError::processing("no frames to assemble"));
    };
    let (frame_w, frame_h) = first.dimensions();
    if let Some((i, odd)) = frames
        .iter()
        .enumerate()
        .find(|(_, f)| f.dimensions() != (frame_w, frame_h))
    {
        return Err(FramesmithError::processing(format!(
            "frame {i} is {}x{}, expected {frame_w}x{frame_h}",
            odd.width(),
            odd.height()
        )));
    }

    let count = frames.len() as u64;
    let stride = u64::from(frame_w) + u64::from(padding);
    let width = u32::try_from(stride * count - u64::from(padding)).map_err(|_| {
        FramesmithError::processing(format!(
            "{count} frames of {frame_w}px with {padding}px padding exceed the maximum image width"
        ))
    })?;
    let mut sheet = RgbaImage::new(width, frame_h);

    for (i, frame) in frames.iter().enumerate() {
        blit_masked(&mut sheet, frame, i as i64 * stride as i64, 0);
    }

    Ok(sheet)
}

/// Split a horizontal strip into frames of `frame_width` separated by
/// `padding` pixels. A trailing partial frame is dropped.
pub fn slice_strip(sheet: &RgbaImage, frame_width: u32, padding: u32) -> Vec<RgbaImage> {
    if frame_width == 0 {
        return Vec::new();
    }
    let stride = u64::from(frame_width) + u64::from(padding);
    let count = (u64::from(sheet.width()) + u64::from(padding)) / stride;
    // Every counted frame starts inside the sheet, so the offset fits in u32.
    (0..count)
        .map(|i| {
            let x = (i * stride) as u32;
            imageops::crop_imm(sheet, x, 0, frame_width, sheet.height()).to_image()
        })
        .collect()
}

/// Load any supported raster image as RGBA.
pub fn load_rgba(path: &Path) -> FramesmithResult<RgbaImage> {
    if !path.exists() {
        return Err(FramesmithError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let img = image::open(path).map_err(|e| FramesmithError::image(path, e))?;
    Ok(img.to_rgba8())
}

/// Write an image as a whole-file overwrite, creating parent directories.
/// The format follows the file extension.
pub fn save_png(image: &RgbaImage, path: &Path) -> FramesmithResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    image
        .save(path)
        .map_err(|e| FramesmithError::image(path, e))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(size: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba(color))
    }

    #[test]
    fn strip_dimensions_include_padding() {
        let frames = vec![solid(16, [255, 0, 0, 255]); 3];
        let sheet = assemble_strip(&frames, 2).unwrap();
        assert_eq!(sheet.dimensions(), (16 * 3 + 2 * 2, 16));
        assert_eq!(sheet.get_pixel(16, 0)[3], 0);
        assert_eq!(*sheet.get_pixel(18, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn empty_frame_list_is_an_error() {
        assert!(assemble_strip(&[], 0).is_err());
    }

    #[test]
    fn mismatched_frames_are_rejected() {
        let frames = vec![solid(16, [0; 4]), solid(8, [0; 4])];
        let err = assemble_strip(&frames, 0).unwrap_err();
        assert!(err.to_string().contains("frame 1"));
    }

    #[test]
    fn oversized_padding_is_an_error() {
        let frames = vec![solid(64, [0, 0, 0, 255]); 3];
        let err = assemble_strip(&frames, u32::MAX / 2).unwrap_err();
        assert!(matches!(err, FramesmithError::Processing { .. }));

        let sheet = solid(64, [0, 0, 0, 255]);
        let sliced = slice_strip(&sheet, 64, u32::MAX);
        assert_eq!(sliced.len(), 1);
        assert!(slice_strip(&sheet, u32::MAX, u32::MAX).is_empty());
    }

    #[test]
    fn transparent_pixels_do_not_overwrite() {
        let mut dst = solid(4, [9, 9, 9, 255]);
        let mut src = RgbaImage::new(4, 4);
        src.put_pixel(1, 1, Rgba([1, 2, 3, 128]));
        blit_masked(&mut dst, &src, 0, 0);
        assert_eq!(*dst.get_pixel(0, 0), Rgba([9, 9, 9, 255]));
        assert_eq!(*dst.get_pixel(1, 1), Rgba([1, 2, 3, 128]));
    }

    #[test]
    fn blit_clips_negative_offsets() {
        let mut dst = RgbaImage::new(4, 4);
        let src = solid(4, [5, 5, 5, 255]);
        blit_masked(&mut dst, &src, -2, 3);
        assert_eq!(dst.get_pixel(0, 3)[3], 255);
        assert_eq!(dst.get_pixel(2, 3)[3], 0);
        assert_eq!(dst.get_pixel(0, 2)[3], 0);
    }

    #[test]
    fn slicing_reproduces_assembled_frames() {
        let mut frames = Vec::new();
        for i in 0..4u8 {
            let mut frame = RgbaImage::new(12, 12);
            for y in 0..12 {
                for x in 0..12 {
                    if (x + y + i as u32) % 3 == 0 {
                        frame.put_pixel(x, y, Rgba([i * 40, x as u8, y as u8, 255 - i]));
                    }
                }
            }
            frames.push(frame);
        }

        let sheet = assemble_strip(&frames, 0).unwrap();
        let sliced = slice_strip(&sheet, 12, 0);
        assert_eq!(sliced.len(), 4);
        for (original, back) in frames.iter().zip(&sliced) {
            assert_eq!(original.as_raw(), back.as_raw());
        }

        let padded = assemble_strip(&frames, 3).unwrap();
        let sliced = slice_strip(&padded, 12, 3);
        assert_eq!(sliced, frames);
    }

    #[test]
    fn png_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("sheet.png");
        let img = solid(8, [10, 20, 30, 255]);
        save_png(&img, &path).unwrap();
        let loaded = load_rgba(&path).unwrap();
        assert_eq!(loaded, img);
    }

    #[test]
    fn loading_missing_file_reports_path() {
        let err = load_rgba(Path::new("/nonexistent/sprite.png")).unwrap_err();
        assert!(matches!(err, FramesmithError::FileNotFound { .. }));
    }
}
