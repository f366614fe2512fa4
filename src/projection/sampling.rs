//! Bicubic resampling of RGB images.
//!
//! Uses the Keys cubic convolution kernel with `a = -0.75`. The four horizontal taps
//! wrap around the image (longitude is cyclic) while the vertical taps are clamped.

use image::{Rgb, RgbImage};

const CUBIC_A: f64 = -0.75;

/// Weights of the four taps at offsets `-1, 0, 1, 2` for a fractional position `t`.
pub fn cubic_weights(t: f64) -> [f64; 4] {
    let a = CUBIC_A;
    let x0 = t + 1.0;
    let w0 = ((a * x0 - 5.0 * a) * x0 + 8.0 * a) * x0 - 4.0 * a;
    let w1 = ((a + 2.0) * t - (a + 3.0)) * t * t + 1.0;
    let x2 = 1.0 - t;
    let w2 = ((a + 2.0) * x2 - (a + 3.0)) * x2 * x2 + 1.0;
    let w3 = 1.0 - w0 - w1 - w2;
    [w0, w1, w2, w3]
}

#[inline]
fn wrap(index: i64, len: u32) -> u32 {
    index.rem_euclid(i64::from(len)) as u32
}

#[inline]
fn clamp(index: i64, len: u32) -> u32 {
    index.clamp(0, i64::from(len) - 1) as u32
}

/// Samples `image` at the sub-pixel position `(x, y)`.
///
/// The image must be non-empty. Non-finite coordinates yield black.
pub fn sample_bicubic(image: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    if !x.is_finite() || !y.is_finite() {
        return Rgb([0, 0, 0]);
    }
    let (width, height) = image.dimensions();

    let x_floor = x.floor();
    let y_floor = y.floor();
    let wx = cubic_weights(x - x_floor);
    let wy = cubic_weights(y - y_floor);
    let x_base = x_floor as i64 - 1;
    let y_base = y_floor as i64 - 1;

    let mut columns = [0u32; 4];
    for (i, column) in columns.iter_mut().enumerate() {
        *column = wrap(x_base + i as i64, width);
    }

    let mut acc = [0.0f64; 3];
    for (j, weight_y) in wy.iter().enumerate() {
        let row = clamp(y_base + j as i64, height);
        let mut row_acc = [0.0f64; 3];
        for (column, weight_x) in columns.iter().zip(wx.iter()) {
            let pixel = image.get_pixel(*column, row);
            for c in 0..3 {
                row_acc[c] += weight_x * f64::from(pixel[c]);
            }
        }
        for c in 0..3 {
            acc[c] += weight_y * row_acc[c];
        }
    }

    Rgb(acc.map(|v| v.round().clamp(0.0, 255.0) as u8))
}
