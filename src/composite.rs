//! Letterboxing of source images onto a fixed-size black canvas.
//!
//! Preview and export both go through [`composite`], so a frame looks the
//! same on screen as it does in the rendered video.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};

const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

/// Largest size with the source's aspect ratio that fits inside the target.
///
/// Small sources are scaled up, large ones scaled down; neither side ever
/// exceeds the target and neither collapses to zero.
pub fn fit_within(src_width: u32, src_height: u32, dst_width: u32, dst_height: u32) -> (u32, u32) {
    if src_width == 0 || src_height == 0 {
        return (dst_width.max(1), dst_height.max(1));
    }

    let (sw, sh) = (u64::from(src_width), u64::from(src_height));
    let (dw, dh) = (u64::from(dst_width), u64::from(dst_height));

    let width_at_full_height = dh * sw / sh;
    let (w, h) = if width_at_full_height <= dw {
        (width_at_full_height, dh)
    } else {
        (dw, dw * sh / sw)
    };

    (w.max(1) as u32, h.max(1) as u32)
}

/// Scale `source` to fit `width`x`height` and centre it on a black canvas.
pub fn composite(source: &DynamicImage, width: u32, height: u32) -> RgbImage {
    let rgb = source.to_rgb8();
    composite_rgb(&rgb, width, height)
}

/// Same as [`composite`] for an already decoded RGB buffer.
pub fn composite_rgb(source: &RgbImage, width: u32, height: u32) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);

    let (fit_w, fit_h) = fit_within(source.width(), source.height(), width, height);
    let x = i64::from((width - fit_w) / 2);
    let y = i64::from((height - fit_h) / 2);

    if (fit_w, fit_h) == source.dimensions() {
        imageops::overlay(&mut canvas, source, x, y);
    } else {
        let scaled = imageops::resize(source, fit_w, fit_h, FilterType::CatmullRom);
        imageops::overlay(&mut canvas, &scaled, x, y);
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, colour: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(colour)))
    }

    #[test]
    fn test_fit_wide_source_into_hd() {
        // 4:1 strip letterboxed top and bottom
        assert_eq!(fit_within(4000, 1000, 1920, 1080), (1920, 480));
    }

    #[test]
    fn test_fit_tall_source_into_hd() {
        assert_eq!(fit_within(1000, 2000, 1920, 1080), (540, 1080));
    }

    #[test]
    fn test_fit_upscales_small_sources() {
        assert_eq!(fit_within(64, 36, 1280, 720), (1280, 720));
    }

    #[test]
    fn test_fit_never_collapses_to_zero() {
        assert_eq!(fit_within(10_000, 1, 1280, 720), (1280, 1));
    }

    #[test]
    fn test_composite_has_target_size() {
        let out = composite(&solid(300, 200, [255, 0, 0]), 1280, 720);
        assert_eq!(out.dimensions(), (1280, 720));
    }

    #[test]
    fn test_large_source_is_downscaled_without_cropping() {
        // 2560x1920 (4:3) into 1280x720: fits at 960x720, pillarboxed
        let out = composite(&solid(2560, 1920, [255, 255, 255]), 1280, 720);
        let (fit_w, fit_h) = fit_within(2560, 1920, 1280, 720);
        assert_eq!((fit_w, fit_h), (960, 720));

        let left = (1280 - fit_w) / 2;
        assert_eq!(out.get_pixel(left - 1, 360), &BACKGROUND);
        assert_eq!(out.get_pixel(left + fit_w, 360), &BACKGROUND);
        // corners of the scaled image are still present: nothing was cropped
        assert!(out.get_pixel(left + 2, 2).0[0] > 250);
        assert!(out.get_pixel(left + fit_w - 3, 717).0[0] > 250);
    }

    #[test]
    fn test_composite_is_deterministic() {
        let src = solid(333, 777, [10, 200, 30]);
        assert_eq!(composite(&src, 1280, 720), composite(&src, 1280, 720));
    }

    #[test]
    fn test_recompositing_same_size_is_identity() {
        let first = composite(&solid(640, 480, [40, 80, 120]), 1280, 720);
        assert_eq!(composite_rgb(&first, 1280, 720), first);
    }
}
