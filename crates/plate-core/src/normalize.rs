//! Plate image preprocessing.
//!
//! Turns an arbitrary plate crop into the fixed model input:
//! 1. resize to the target width, keeping aspect ratio (area averaging)
//! 2. center-crop or zero-pad vertically to the target height
//! 3. convert to BT.601 luma
//! 4. serialize column by column (transposed) as `value / 255.0`

use crate::config::RecognizerConfig;
use crate::error::{RecognitionError, Result};
use crate::tensor::NormalizedTensor;
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use std::ops::Range;

/// Fixed-point BT.601 weights (R, G, B) with 14 fractional bits, summing to 1 << 14.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// How the resized height was brought to the target height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightFit {
    /// Rows `[top, top + target)` were kept.
    Crop { top: u32 },
    /// `top` zero rows added above and `bottom` below.
    Pad { top: u32, bottom: u32 },
}

impl HeightFit {
    /// Decide crop or pad for a resized height `h`. Exactly one applies.
    pub fn for_heights(h: u32, target: u32) -> Self {
        if h > target {
            HeightFit::Crop {
                top: (h - target) / 2,
            }
        } else {
            let delta = target - h;
            let top = delta / 2;
            HeightFit::Pad {
                top,
                bottom: delta - top,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageNormalizer {
    width: u32,
    height: u32,
}

impl ImageNormalizer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RecognitionError::invalid_config(format!(
                "target size must be non-zero, got {}x{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    pub fn from_config(config: &RecognizerConfig) -> Result<Self> {
        Self::new(config.input_width, config.input_height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Normalize a decoded image into the model's input tensor.
    pub fn normalize(&self, img: &DynamicImage) -> Result<NormalizedTensor> {
        let (src_w, src_h) = (img.width(), img.height());
        if src_w == 0 || src_h == 0 {
            return Err(RecognitionError::invalid_image(format!(
                "image has zero dimension ({}x{})",
                src_w, src_h
            )));
        }

        let rgb = img.to_rgb8();
        let resized_h = scaled_height(src_w, src_h, self.width);
        let fit = HeightFit::for_heights(resized_h, self.height);
        tracing::debug!(
            src_width = src_w,
            src_height = src_h,
            resized_height = resized_h,
            fit = ?fit,
            "normalizing plate image"
        );

        let fitted = match fit {
            // Rows outside the crop window are never materialized
            HeightFit::Crop { top } => {
                resize_area_rows(&rgb, self.width, resized_h, top..top + self.height)
            }
            HeightFit::Pad { top, .. } => {
                let resized = resize_area(&rgb, self.width, resized_h);
                self.pad_height(&resized, top)
            }
        };
        let gray = to_luma_bt601(&fitted);

        Ok(serialize_transposed(&gray))
    }

    /// Decode an encoded image (PNG, JPEG, ...) and normalize it.
    pub fn normalize_bytes(&self, bytes: &[u8]) -> Result<NormalizedTensor> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| RecognitionError::invalid_image(format!("failed to decode image: {}", e)))?;
        self.normalize(&img)
    }

    fn pad_height(&self, img: &RgbImage, top: u32) -> RgbImage {
        let mut canvas = RgbImage::new(img.width(), self.height);
        image::imageops::replace(&mut canvas, img, 0, i64::from(top));
        canvas
    }
}

/// Height after scaling `src_w` to `target_w`, rounded half away from zero.
///
/// Never below one row; extremely wide inputs still produce a usable strip.
pub fn scaled_height(src_w: u32, src_h: u32, target_w: u32) -> u32 {
    let ratio = f64::from(target_w) / f64::from(src_w);
    let h = (f64::from(src_h) * ratio).round();
    (h as u32).max(1)
}

/// Source taps for one destination index along one axis: `(source index, weight)`.
type AxisTaps = Vec<(u32, f32)>;

/// Area-coverage weights for resampling `src` samples onto `dst` samples.
///
/// Destination sample `d` covers the source interval `[d * s, (d + 1) * s)` with
/// `s = src / dst`; each source sample contributes its overlap with that
/// interval, normalized so the weights sum to one.
fn area_taps(src: u32, dst: u32) -> Vec<AxisTaps> {
    area_taps_for(src, dst, 0..dst)
}

/// [`area_taps`] restricted to the destination samples in `range`.
fn area_taps_for(src: u32, dst: u32, range: Range<u32>) -> Vec<AxisTaps> {
    let scale = f64::from(src) / f64::from(dst);
    let src_end = f64::from(src);

    range
        .map(|d| {
            let start = f64::from(d) * scale;
            let end = (start + scale).min(src_end);
            let span = end - start;

            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(src);

            (first..last)
                .filter_map(|s| {
                    let overlap = end.min(f64::from(s + 1)) - start.max(f64::from(s));
                    (overlap > 1e-9).then(|| (s, (overlap / span) as f32))
                })
                .collect()
        })
        .collect()
}

/// Resize with area averaging. Downscaling averages every covered source pixel
/// weighted by coverage, so thin glyph strokes do not alias away.
pub fn resize_area(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    resize_area_rows(img, width, height, 0..height)
}

/// Rows `rows` of the `width` x `height` area resize, without building the others.
///
/// Identical to cropping the full [`resize_area`] output, but memory and time
/// scale with the rows kept rather than with `height`.
pub fn resize_area_rows(img: &RgbImage, width: u32, height: u32, rows: Range<u32>) -> RgbImage {
    let rows = rows.start.min(height)..rows.end.min(height);
    let out_h = rows.end.saturating_sub(rows.start);

    if img.dimensions() == (width, height) {
        return image::imageops::crop_imm(img, 0, rows.start, width, out_h).to_image();
    }

    let x_taps = area_taps(img.width(), width);
    let y_taps = area_taps_for(img.height(), height, rows);

    let mut out = RgbImage::new(width, out_h);
    for (dy, ys) in y_taps.iter().enumerate() {
        for (dx, xs) in x_taps.iter().enumerate() {
            let mut acc = [0f32; 3];
            for &(sy, wy) in ys {
                for &(sx, wx) in xs {
                    let px = img.get_pixel(sx, sy);
                    let w = wy * wx;
                    for (channel, value) in acc.iter_mut().zip(px.0) {
                        *channel += f32::from(value) * w;
                    }
                }
            }
            out.put_pixel(dx as u32, dy as u32, image::Rgb(acc.map(saturate_u8)));
        }
    }
    out
}

fn saturate_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// BT.601 luma with the fixed-point rounding used by common BGR-to-gray routines.
///
/// A gray pixel stored as RGB maps back to itself since the weights sum to one.
pub fn to_luma_bt601(img: &RgbImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b] = img.get_pixel(x, y).0;
        let luma = (u32::from(r) * LUMA_R
            + u32::from(g) * LUMA_G
            + u32::from(b) * LUMA_B
            + (1 << (LUMA_SHIFT - 1)))
            >> LUMA_SHIFT;
        Luma([luma as u8])
    })
}

/// Emit intensities with x as the outer loop and y as the inner loop.
fn serialize_transposed(gray: &GrayImage) -> NormalizedTensor {
    let (w, h) = gray.dimensions();
    let mut data = Vec::with_capacity(w as usize * h as usize);
    for x in 0..w {
        for y in 0..h {
            data.push(f32::from(gray.get_pixel(x, y)[0]) / 255.0);
        }
    }

    NormalizedTensor::from_parts(w as usize, h as usize, data)
}
