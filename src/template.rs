//! Context modelling shared by the stripe encoder and decoder.
//!
//! Templates follow ITU-T T.82 6.7: ten pixel templates for the lowest
//! resolution layer, and for differential layers a twelve bit context of six
//! pixels of the current layer, four pixels of the next lower layer and the
//! spatial phase of the coded pixel.

use std::ops::Range;

use crate::bitmap_header::Options;
use crate::constants::{DIFFERENTIAL_CONTEXTS, LOWEST_LAYER_CONTEXTS, TPB2CX, TPB3CX};
use crate::deterministic_prediction::DpTable;
use crate::error::JbigError;

/// Packed bi-level bitmap, one bit per pixel, MSB first, rows padded to bytes.
/// A set bit is a black pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl Bitmap {
    /// Empty bitmap of the given width that grows with [`Bitmap::push_row`].
    pub fn new(width: u32) -> Self {
        Self {
            width,
            height: 0,
            stride: (width as usize).div_ceil(8),
            data: Vec::new(),
        }
    }

    /// All white bitmap.
    pub fn with_size(width: u32, height: u32) -> Result<Self, JbigError> {
        let mut bitmap = Self::new(width);
        bitmap.resize(height)?;
        Ok(bitmap)
    }

    /// Wraps packed rows; `data` must hold exactly `height` rows.
    pub fn from_packed(width: u32, height: u32, data: Vec<u8>) -> Result<Self, JbigError> {
        let bitmap = Self {
            width,
            height,
            stride: (width as usize).div_ceil(8),
            data,
        };
        if bitmap.data.len() != bitmap.stride * height as usize {
            return Err(JbigError::InvalidArgumentSize);
        }
        Ok(bitmap)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.stride]
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        &mut self.data[start..start + self.stride]
    }

    /// Appends one white row.
    pub fn push_row(&mut self) -> Result<(), JbigError> {
        self.resize(self.height + 1)
    }

    /// Truncates or pads with white rows; growth maps allocation failure to an error.
    pub fn resize(&mut self, height: u32) -> Result<(), JbigError> {
        let len = self.stride * height as usize;
        if len > self.data.len() {
            self.data
                .try_reserve(len - self.data.len())
                .map_err(|_| JbigError::NotEnoughMemory)?;
        }
        self.data.resize(len, 0);
        self.height = height;
        Ok(())
    }

    /// Pixel value, 0 for any position outside the bitmap.
    #[inline]
    pub fn pixel(&self, x: i64, y: i64) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0;
        }
        let byte = self.data[y as usize * self.stride + (x as usize >> 3)];
        (byte >> (7 - (x & 7))) & 1
    }

    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, value: u8) {
        let index = y as usize * self.stride + (x as usize >> 3);
        let mask = 0x80u8 >> (x & 7);
        if value & 1 != 0 {
            self.data[index] |= mask;
        } else {
            self.data[index] &= !mask;
        }
    }

    /// Copies row `from` into row `to`, or clears `to` when `from` is `None`.
    pub fn copy_row(&mut self, from: Option<u32>, to: u32) {
        let target = to as usize * self.stride;
        match from {
            Some(from) => {
                let source = from as usize * self.stride;
                self.data
                    .copy_within(source..source + self.stride, target);
            }
            None => self.data[target..target + self.stride].fill(0),
        }
    }

    /// True when row `y` equals row `other`, or is white when `other` is `None`.
    pub fn row_equals(&self, y: u32, other: Option<u32>) -> bool {
        match other {
            Some(other) => self.row(y) == self.row(other),
            None => self.row(y).iter().all(|&b| b == 0),
        }
    }
}

/// Moves the AT pixel to `tx` columns left of the coded pixel from stripe row `row` on.
/// A `tx` of 0 restores the default position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtMove {
    pub row: u32,
    pub tx: u8,
}

/// Everything besides the coding state that describes one stripe of one layer.
pub struct StripeParams<'a> {
    pub rows: Range<u32>,
    pub width: u32,
    pub options: Options,
    /// Moves announced in front of this SDE, ordered by row.
    pub at_moves: &'a [AtMove],
    /// Next lower layer; `None` on the lowest resolution layer.
    pub lower: Option<&'a Bitmap>,
    /// Set when deterministic prediction is on.
    pub dp_table: Option<&'a DpTable>,
}

/// Coding state of one (plane, layer) pair that persists between SDEs.
#[derive(Debug, Clone)]
pub struct CodingState {
    pub contexts: Vec<u8>,
    /// 0 when the previous line (lowest layer) or the current line pair
    /// (differential layer) is typical.
    pub lntp: u8,
    /// Horizontal AT offset, 0 for the default position.
    pub at_x: u8,
    /// Rows above this one read as white.
    pub reset_row: u32,
}

impl CodingState {
    pub fn new(differential: bool) -> Self {
        let size = if differential {
            DIFFERENTIAL_CONTEXTS
        } else {
            LOWEST_LAYER_CONTEXTS
        };
        Self {
            contexts: vec![0; size],
            lntp: 1,
            at_x: 0,
            reset_row: 0,
        }
    }

    /// State after SDRST; `next_row` is the first row of the following stripe.
    pub fn reset(&mut self, next_row: u32) {
        self.contexts.fill(0);
        self.lntp = 1;
        self.at_x = 0;
        self.reset_row = next_row;
    }

    pub fn apply_at_moves(&mut self, moves: &[AtMove], stripe_row: u32) {
        for at in moves.iter().filter(|at| at.row == stripe_row) {
            self.at_x = at.tx;
        }
    }

    /// Row whose content a typical line repeats, `None` when it is white.
    pub fn previous_row(&self, y: u32) -> Option<u32> {
        (y > self.reset_row).then(|| y - 1)
    }
}

/// View of the layer being coded; rows above the reset row read as white.
#[derive(Clone, Copy)]
pub struct HighView<'a> {
    pub bitmap: &'a Bitmap,
    pub top: u32,
}

impl HighView<'_> {
    #[inline]
    pub(crate) fn get(&self, x: i64, y: i64) -> usize {
        if y < self.top as i64 {
            0
        } else {
            self.bitmap.pixel(x, y) as usize
        }
    }
}

/// View of the next lower layer as seen from one stripe.
///
/// Rows above `top` read as white and rows from `rows_end` on repeat the
/// last row of the stripe.
#[derive(Clone, Copy)]
pub struct LowView<'a> {
    pub bitmap: &'a Bitmap,
    pub top: u32,
    pub rows_end: u32,
}

impl<'a> LowView<'a> {
    /// View for the high resolution stripe ending at `high_rows_end`, after a
    /// reset at high resolution row `reset_row`.
    pub fn for_stripe(bitmap: &'a Bitmap, reset_row: u32, high_rows_end: u32) -> Self {
        Self {
            bitmap,
            top: reset_row >> 1,
            rows_end: high_rows_end.div_ceil(2),
        }
    }

    #[inline]
    pub(crate) fn get(&self, x: i64, y: i64) -> u8 {
        if y < self.top as i64 {
            0
        } else {
            self.bitmap.pixel(x, y.min(self.rows_end as i64 - 1))
        }
    }

    /// Colour of the 3x3 neighbourhood around `(x, y)` if it is uniform.
    pub fn uniform_neighbourhood(&self, x: u32, y: u32) -> Option<u8> {
        let (x, y) = (x as i64, y as i64);
        let colour = self.get(x, y);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if self.get(x + dx, y + dy) != colour {
                    return None;
                }
            }
        }
        Some(colour)
    }
}

/// Context of the typical prediction flag on the lowest layer.
pub fn tpb_context(options: Options) -> usize {
    if options.contains(Options::LRLTWO) {
        TPB2CX
    } else {
        TPB3CX
    }
}

/// Context of pixel `(x, y)` on the lowest resolution layer.
#[inline]
pub fn lowest_layer_context(view: &HighView, x: u32, y: u32, at_x: u8, two_line: bool) -> usize {
    let (x, y) = (x as i64, y as i64);
    let at = if at_x == 0 {
        view.get(x + 2, y - 1)
    } else {
        view.get(x - at_x as i64, y)
    };

    if two_line {
        view.get(x - 3, y - 1) << 9
            | view.get(x - 2, y - 1) << 8
            | view.get(x - 1, y - 1) << 7
            | view.get(x, y - 1) << 6
            | view.get(x + 1, y - 1) << 5
            | at << 4
            | view.get(x - 4, y) << 3
            | view.get(x - 3, y) << 2
            | view.get(x - 2, y) << 1
            | view.get(x - 1, y)
    } else {
        view.get(x - 1, y - 2) << 9
            | view.get(x, y - 2) << 8
            | view.get(x + 1, y - 2) << 7
            | view.get(x - 2, y - 1) << 6
            | view.get(x - 1, y - 1) << 5
            | view.get(x, y - 1) << 4
            | view.get(x + 1, y - 1) << 3
            | at << 2
            | view.get(x - 2, y) << 1
            | view.get(x - 1, y)
    }
}

/// Context of pixel `(x, y)` on a differential layer.
#[inline]
pub fn differential_context(high: &HighView, low: &LowView, x: u32, y: u32, at_x: u8) -> usize {
    let (lx, ly) = ((x >> 1) as i64, (y >> 1) as i64);
    // Low resolution columns left and right of the pixel
    let (left, right) = if x & 1 == 1 { (lx, lx + 1) } else { (lx - 1, lx) };
    let odd_column = (x & 1) as usize;
    let odd_row = (y & 1) as usize;
    let (x, y) = (x as i64, y as i64);
    let at = if at_x == 0 {
        high.get(x - 1, y - 1)
    } else {
        high.get(x - at_x as i64, y)
    };

    odd_row << 11
        | odd_column << 10
        | (low.get(left, ly + 1) as usize) << 9
        | (low.get(right, ly + 1) as usize) << 8
        | (low.get(left, ly) as usize) << 7
        | (low.get(right, ly) as usize) << 6
        | high.get(x, y - 2) << 5
        | at << 4
        | high.get(x, y - 1) << 3
        | high.get(x + 1, y - 1) << 2
        | high.get(x - 2, y) << 1
        | high.get(x - 1, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TPDCX;

    fn checkerboard(width: u32, height: u32) -> Bitmap {
        let mut bitmap = Bitmap::with_size(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                bitmap.set_pixel(x, y, ((x + y) & 1) as u8);
            }
        }
        bitmap
    }

    #[test]
    fn test_pixel_access() {
        let mut bitmap = Bitmap::with_size(10, 3).unwrap();
        assert_eq!(bitmap.stride(), 2);
        bitmap.set_pixel(9, 2, 1);
        assert_eq!(bitmap.pixel(9, 2), 1);
        assert_eq!(bitmap.row(2), &[0x00, 0x40]);
        assert_eq!(bitmap.pixel(10, 2), 0);
        assert_eq!(bitmap.pixel(-1, 0), 0);
        bitmap.set_pixel(9, 2, 0);
        assert!(bitmap.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_resize_and_rows() {
        let mut bitmap = Bitmap::new(8);
        bitmap.push_row().unwrap();
        bitmap.row_mut(0)[0] = 0xa5;
        bitmap.push_row().unwrap();
        assert!(!bitmap.row_equals(1, Some(0)));
        bitmap.copy_row(Some(0), 1);
        assert!(bitmap.row_equals(1, Some(0)));
        bitmap.copy_row(None, 1);
        assert!(bitmap.row_equals(1, None));
        bitmap.resize(1).unwrap();
        assert_eq!(bitmap.as_bytes(), &[0xa5]);
        assert!(Bitmap::from_packed(8, 2, vec![0]).is_err());
    }

    #[test]
    fn test_lowest_layer_context() {
        let bitmap = checkerboard(16, 4);
        let view = HighView {
            bitmap: &bitmap,
            top: 0,
        };
        // Row 0 only sees pixels to the left in the same row.
        assert_eq!(lowest_layer_context(&view, 3, 0, 0, false), 0b10);
        assert_eq!(lowest_layer_context(&view, 4, 2, 0, false), 0b10_1101_0101);

        let reset = HighView {
            bitmap: &bitmap,
            top: 2,
        };
        assert_eq!(
            lowest_layer_context(&reset, 4, 2, 0, false),
            lowest_layer_context(&view, 4, 0, 0, false)
        );
    }

    #[test]
    fn test_at_pixel_moves() {
        let mut bitmap = Bitmap::with_size(16, 2).unwrap();
        bitmap.set_pixel(2, 1, 1);
        let view = HighView {
            bitmap: &bitmap,
            top: 0,
        };
        assert_eq!(lowest_layer_context(&view, 8, 1, 6, false) & 0x04, 0x04);
        assert_eq!(lowest_layer_context(&view, 8, 1, 0, false) & 0x04, 0);
        assert_eq!(lowest_layer_context(&view, 8, 1, 6, true) & 0x10, 0x10);
    }

    #[test]
    fn test_differential_context() {
        let mut high = Bitmap::with_size(8, 8).unwrap();
        let mut low = Bitmap::with_size(4, 4).unwrap();
        let high_view = HighView {
            bitmap: &high,
            top: 0,
        };
        let low_view = LowView::for_stripe(&low, 0, 8);
        assert_eq!(differential_context(&high_view, &low_view, 3, 2, 0), 1 << 10);
        assert_eq!(differential_context(&high_view, &low_view, 3, 3, 0), 3 << 10);

        low.set_pixel(1, 1, 1);
        high.set_pixel(0, 2, 1);
        let high_view = HighView {
            bitmap: &high,
            top: 0,
        };
        let low_view = LowView::for_stripe(&low, 0, 8);
        // The low pixel is right of an even column and left of an odd one.
        assert_eq!(differential_context(&high_view, &low_view, 2, 3, 0), 0x840);
        assert_eq!(differential_context(&high_view, &low_view, 3, 2, 0), 0x480);
        assert_eq!(differential_context(&high_view, &low_view, 3, 2, 3), 0x490);
    }

    #[test]
    fn test_low_view_clipping() {
        let mut low = Bitmap::with_size(4, 4).unwrap();
        let view = LowView::for_stripe(&low, 0, 8);
        assert_eq!(view.uniform_neighbourhood(1, 1), Some(0));
        low.set_pixel(3, 3, 1);
        low.set_pixel(0, 1, 1);
        let view = LowView::for_stripe(&low, 0, 8);
        assert_eq!(view.uniform_neighbourhood(2, 2), None);
        assert_eq!(view.get(0, 1), 1);

        // A stripe of four high resolution rows sees two low rows; the rows
        // below repeat its last row.
        let clipped = LowView::for_stripe(&low, 0, 4);
        assert_eq!(clipped.uniform_neighbourhood(2, 2), Some(0));
        assert_eq!(clipped.get(0, 3), 1);
        assert_eq!(clipped.get(3, 3), 0);

        let after_reset = LowView::for_stripe(&low, 4, 8);
        assert_eq!(after_reset.get(0, 1), 0);
        assert_eq!(after_reset.get(3, 3), 1);
    }

    #[test]
    fn test_tp_contexts_are_distinct() {
        assert_ne!(TPB2CX, TPB3CX);
        assert!(TPDCX < DIFFERENTIAL_CONTEXTS);
        assert_eq!(tpb_context(Options::LRLTWO), TPB2CX);
        assert_eq!(tpb_context(Options::empty()), TPB3CX);
    }

    #[test]
    fn test_coding_state_reset() {
        let mut state = CodingState::new(false);
        state.contexts[5] = 0x85;
        state.lntp = 0;
        state.apply_at_moves(&[AtMove { row: 0, tx: 4 }], 0);
        assert_eq!(state.at_x, 4);
        state.reset(16);
        assert_eq!(state.contexts[5], 0);
        assert_eq!((state.lntp, state.at_x, state.reset_row), (1, 0, 16));
        assert_eq!(state.previous_row(16), None);
        assert_eq!(state.previous_row(17), Some(16));
    }
}
