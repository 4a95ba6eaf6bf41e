//! Resolution reduction of ITU-T T.82 6.5.2 (Table 17).
//!
//! Each low resolution pixel is looked up from nine high resolution pixels
//! around it and the three low resolution pixels already produced above and
//! to its left. With SDRST the rows above the first row of a stripe read as
//! white, so every stripe can be reduced on its own.

use crate::error::JbigError;
use crate::template::Bitmap;

// 4096 entries, one bit each, MSB first.
const RESOLUTION_REDUCTION: [u8; 512] = [
    0x11, 0x73, 0xff, 0xff, 0x33, 0xff, 0xff, 0xff, 0x01, 0x77, 0xff, 0xff, 0x37, 0xff, 0xff, 0xff,
    0x37, 0xff, 0xff, 0xff, 0x7d, 0xff, 0xff, 0xff, 0x37, 0xff, 0xff, 0xff, 0xff, 0x7d, 0xff, 0xff,
    0x01, 0x37, 0xfd, 0xff, 0x3f, 0xff, 0xff, 0xff, 0x37, 0x7f, 0xff, 0x7f, 0x7f, 0x7f, 0x7f, 0xff,
    0x35, 0xff, 0xf7, 0xff, 0xdf, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x01, 0x23, 0x05, 0x3b, 0x11, 0x23, 0x71, 0xff, 0x01, 0x75, 0x3b, 0x7f, 0x00, 0x53, 0xfe, 0xff,
    0x01, 0x41, 0x7f, 0xff, 0x09, 0xb7, 0xff, 0xff, 0x00, 0x53, 0x7f, 0xfb, 0x93, 0x79, 0xff, 0xff,
    0x01, 0x00, 0x73, 0xff, 0x31, 0x13, 0x75, 0xff, 0x00, 0x41, 0xb7, 0xee, 0x01, 0x21, 0xfc, 0xff,
    0x00, 0x93, 0x75, 0xff, 0x11, 0x6b, 0xf5, 0xff, 0xe9, 0xf7, 0xff, 0xfb, 0xb7, 0xff, 0xfb, 0xff,
    0x01, 0x23, 0x01, 0x3f, 0x11, 0x01, 0x77, 0xff, 0x01, 0x75, 0x6b, 0x7f, 0x00, 0x53, 0xfe, 0xff,
    0x01, 0x61, 0x7f, 0xff, 0x29, 0x37, 0xff, 0xff, 0x00, 0x73, 0x3f, 0x7b, 0x92, 0x7d, 0xff, 0xff,
    0x01, 0x00, 0x7b, 0xfe, 0x2f, 0x1b, 0x7f, 0xff, 0x00, 0x41, 0x37, 0xfe, 0x09, 0x37, 0x7e, 0x7f,
    0x00, 0xd2, 0x7f, 0xff, 0x1b, 0x6f, 0xff, 0xff, 0x00, 0x75, 0x7f, 0x77, 0x27, 0x7f, 0x7b, 0x7f,
    0x01, 0x03, 0x01, 0x09, 0x11, 0x01, 0x41, 0x93, 0x01, 0x75, 0x21, 0x55, 0x00, 0x51, 0x80, 0xf7,
    0x01, 0x41, 0x6b, 0x13, 0x01, 0x00, 0xfb, 0xff, 0x00, 0x51, 0x01, 0x73, 0x00, 0x41, 0xb7, 0xff,
    0x01, 0x00, 0x61, 0x81, 0x27, 0x09, 0x1e, 0xbf, 0x00, 0x40, 0x01, 0x56, 0x08, 0x00, 0x10, 0x7f,
    0x00, 0x80, 0x21, 0x77, 0x03, 0x01, 0x3f, 0xff, 0x68, 0xd0, 0xf3, 0xb3, 0x00, 0xd3, 0xfb, 0xff,
    0x01, 0x03, 0x37, 0xff, 0x33, 0x37, 0x7f, 0xff, 0x01, 0x77, 0x7f, 0xff, 0x11, 0x7b, 0xff, 0xff,
    0x01, 0xf7, 0x7f, 0xff, 0x3f, 0xff, 0xfd, 0xff, 0x12, 0xf7, 0xff, 0xff, 0xff, 0xfd, 0xff, 0x7f,
    0x01, 0x12, 0x7d, 0xff, 0x3f, 0x7f, 0xff, 0xff, 0x00, 0x62, 0xff, 0x7f, 0x3f, 0x3f, 0x7f, 0xff,
    0x10, 0xff, 0xf7, 0xff, 0x7f, 0xff, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x01, 0x23, 0x01, 0x1b, 0x11, 0x23, 0x77, 0xff, 0x01, 0x75, 0x2b, 0x77, 0x00, 0x41, 0xbe, 0xff,
    0x01, 0xc1, 0x5b, 0x7f, 0x09, 0x33, 0x7d, 0xff, 0x00, 0x51, 0x37, 0xfb, 0xa9, 0xb1, 0xff, 0xff,
    0x01, 0x00, 0x71, 0xb7, 0x21, 0x03, 0x75, 0xff, 0x00, 0x40, 0x17, 0x6f, 0x00, 0x01, 0x7d, 0xff,
    0x00, 0xc1, 0x75, 0xff, 0x01, 0xab, 0x51, 0xff, 0xe8, 0xd3, 0xff, 0xfb, 0xbb, 0xff, 0xfb, 0xff,
    0x01, 0x23, 0x01, 0x1b, 0x31, 0x01, 0x53, 0x7f, 0x01, 0x75, 0x29, 0x7f, 0x00, 0x51, 0xb6, 0xff,
    0x01, 0xe0, 0x7b, 0xff, 0x0a, 0x3b, 0x7f, 0xff, 0x00, 0x71, 0x7f, 0xfb, 0x88, 0x75, 0xff, 0x7f,
    0x01, 0x00, 0x61, 0xf6, 0x3f, 0x09, 0x7f, 0xff, 0x00, 0x40, 0x17, 0x7f, 0x08, 0x13, 0x7e, 0x7f,
    0x00, 0x80, 0x77, 0xff, 0x2b, 0x2f, 0x7f, 0x7f, 0x00, 0x71, 0x7f, 0x77, 0x2b, 0x7f, 0x3b, 0x7f,
    0x01, 0x03, 0x01, 0x09, 0x11, 0x01, 0x41, 0x01, 0x01, 0x75, 0x21, 0x55, 0x00, 0x51, 0x80, 0x53,
    0x01, 0x41, 0x49, 0x01, 0x09, 0x00, 0x01, 0x13, 0x00, 0x51, 0x00, 0x53, 0x80, 0x41, 0x13, 0x7f,
    0x01, 0x00, 0x61, 0x80, 0x21, 0x01, 0x01, 0x13, 0x00, 0x40, 0x00, 0x40, 0x00, 0x00, 0x00, 0x13,
    0x00, 0x80, 0x00, 0x13, 0x01, 0x01, 0x51, 0x7f, 0x00, 0x50, 0x00, 0x73, 0x01, 0x54, 0x31, 0x77,
];

#[inline]
fn reduced_pixel(index: usize) -> u8 {
    (RESOLUTION_REDUCTION[index >> 3] >> (7 - (index & 7))) & 1
}

/// Halves the resolution of `high`.
///
/// `stripe_height` is the stripe height of the produced layer; it only matters
/// when `reset_stripes` is set. Rows below the image repeat its last row.
pub fn reduce_resolution(
    high: &Bitmap,
    stripe_height: u32,
    reset_stripes: bool,
) -> Result<Bitmap, JbigError> {
    let width = high.width().div_ceil(2);
    let height = high.height().div_ceil(2);
    let mut low = Bitmap::with_size(width, height)?;
    let last_row = high.height() as i64 - 1;
    let h = |x: i64, y: i64| high.pixel(x, y.min(last_row)) as usize;

    for y in 0..height {
        let stripe_top = y == 0 || (reset_stripes && y % stripe_height.max(1) == 0);
        let hy = 2 * y as i64;
        let ly = y as i64;
        for x in 0..width {
            let hx = 2 * x as i64;
            let lx = x as i64;
            let mut index = h(hx + 1, hy + 1)
                | h(hx, hy + 1) << 1
                | h(hx - 1, hy + 1) << 2
                | h(hx + 1, hy) << 3
                | h(hx, hy) << 4
                | h(hx - 1, hy) << 5
                | (low.pixel(lx - 1, ly) as usize) << 9;
            if !stripe_top {
                index |= h(hx + 1, hy - 1) << 6
                    | h(hx, hy - 1) << 7
                    | h(hx - 1, hy - 1) << 8
                    | (low.pixel(lx, ly - 1) as usize) << 10
                    | (low.pixel(lx - 1, ly - 1) as usize) << 11;
            }
            if reduced_pixel(index) != 0 {
                low.set_pixel(x, y, 1);
            }
        }
    }
    Ok(low)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(width: u32, height: u32, colour: u8) -> Bitmap {
        let mut bitmap = Bitmap::with_size(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                bitmap.set_pixel(x, y, colour);
            }
        }
        bitmap
    }

    #[test]
    fn test_table_corners() {
        assert_eq!(reduced_pixel(0), 0);
        assert_eq!(reduced_pixel(0xfff), 1);
        assert_eq!(
            (0..4096).map(|i| reduced_pixel(i) as u32).sum::<u32>(),
            2328
        );
    }

    #[test]
    fn test_uniform_images() {
        let low = reduce_resolution(&filled(9, 7, 1), 2, false).unwrap();
        assert_eq!((low.width(), low.height()), (5, 4));
        // The column right of an odd width reads as white.
        assert!((0..4).all(|y| low.row(y) == [0xf0]));

        let low = reduce_resolution(&filled(9, 7, 0), 2, true).unwrap();
        assert!(low.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_reset_changes_stripe_tops() {
        let mut high = Bitmap::with_size(16, 16).unwrap();
        for y in 0..16 {
            for x in 0..16 {
                high.set_pixel(x, y, ((x + y) & 1) as u8);
            }
        }
        let plain = reduce_resolution(&high, 2, false).unwrap();
        let reset = reduce_resolution(&high, 2, true).unwrap();
        assert_eq!(plain.row(0), reset.row(0));
        assert_eq!(plain.row(1), reset.row(1));
        assert_eq!(plain.row(2), [0xd5]);
        assert_eq!(reset.row(2), [0xff]);
    }
}
