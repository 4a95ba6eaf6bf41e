//! Bitmap Image Header (BIH) of a JBIG bi-level image entity.
//!
//! The BIH is a fixed 20 byte block (ITU-T T.82, 6.2.2) that may be followed by a
//! private 1728 byte deterministic prediction table. Multi-byte fields are big-endian.

use std::ops::Range;

use bitflags::bitflags;

use crate::constants::{BIH_SIZE, DP_TABLE_SIZE, MAXIMUM_AT_OFFSET, MAXIMUM_LAYER};
use crate::error::JbigError;

bitflags! {
    /// Order byte of the BIH; controls the nesting of the SDE loops.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Order: u8 {
        const HITOLO = 0x08;
        const SEQ = 0x04;
        const ILEAVE = 0x02;
        const SMID = 0x01;
    }
}

bitflags! {
    /// Options byte of the BIH.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Options: u8 {
        const LRLTWO = 0x40;
        const VLENGTH = 0x20;
        const TPDON = 0x10;
        const TPBON = 0x08;
        const DPON = 0x04;
        const DPPRIV = 0x02;
        const DPLAST = 0x01;
    }
}

/// Position of the YD field inside the BIH.
pub const YD_OFFSET: usize = 8;

/// Reads a big-endian u32 starting at `offset`.
pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    ((bytes[offset] as u32) << 24)
        | ((bytes[offset + 1] as u32) << 16)
        | ((bytes[offset + 2] as u32) << 8)
        | (bytes[offset + 3] as u32)
}

/// Divides `x` by `2^n`, rounding up.
pub fn ceil_half(x: u32, n: u32) -> u32 {
    if n >= 32 {
        return (x != 0) as u32;
    }
    ((x as u64 + (1u64 << n) - 1) >> n) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapHeader {
    /// Lowest resolution layer contained in this BIE.
    pub dl: u8,
    /// Highest resolution layer contained in this BIE.
    pub d: u8,
    pub planes: u8,
    /// Reserved byte, kept for exact re-serialization.
    pub fill: u8,
    /// Width at the highest resolution layer.
    pub xd: u32,
    /// Height at the highest resolution layer. NEWLEN may lower it.
    pub yd: u32,
    /// Stripe height at the lowest resolution layer.
    pub l0: u32,
    pub mx: u8,
    pub my: u8,
    pub order: Order,
    pub options: Options,
}

impl BitmapHeader {
    /// Parses the first 20 bytes of `data`. Field values are not validated.
    pub fn parse(data: &[u8]) -> Result<Self, JbigError> {
        if data.len() < BIH_SIZE {
            return Err(JbigError::HeaderTooShort);
        }

        Ok(Self {
            dl: data[0],
            d: data[1],
            planes: data[2],
            fill: data[3],
            xd: read_u32(data, 4),
            yd: read_u32(data, YD_OFFSET),
            l0: read_u32(data, 12),
            mx: data[16],
            my: data[17],
            order: Order::from_bits_retain(data[18]),
            options: Options::from_bits_retain(data[19]),
        })
    }

    pub fn to_bytes(&self) -> [u8; BIH_SIZE] {
        let mut bytes = [0u8; BIH_SIZE];
        bytes[0] = self.dl;
        bytes[1] = self.d;
        bytes[2] = self.planes;
        bytes[3] = self.fill;
        bytes[4..8].copy_from_slice(&self.xd.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.yd.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.l0.to_be_bytes());
        bytes[16] = self.mx;
        bytes[17] = self.my;
        bytes[18] = self.order.bits();
        bytes[19] = self.options.bits();
        bytes
    }

    /// A private DPTABLE follows the BIH iff DPON and DPPRIV are set and DPLAST is not.
    pub fn has_dp_table(&self) -> bool {
        let dp = Options::DPON | Options::DPPRIV | Options::DPLAST;
        self.options.intersection(dp) == Options::DPON | Options::DPPRIV
    }

    /// Bytes preceding the BID: BIH plus optional DPTABLE.
    pub fn header_len(&self) -> usize {
        if self.has_dp_table() {
            BIH_SIZE + DP_TABLE_SIZE
        } else {
            BIH_SIZE
        }
    }

    pub fn check_dp_table(&self, available: usize) -> Result<(), JbigError> {
        if available < self.header_len() {
            return Err(JbigError::DpTableTooShort);
        }
        Ok(())
    }

    /// Checks that the header describes an image this crate can decode.
    pub fn validate(&self) -> Result<(), JbigError> {
        if self.d > MAXIMUM_LAYER || self.dl > self.d {
            return Err(JbigError::InvalidHeader);
        }
        if self.planes == 0 || self.xd == 0 || self.yd == 0 || self.l0 == 0 {
            return Err(JbigError::InvalidHeader);
        }
        if self.fill != 0 {
            return Err(JbigError::InvalidHeader);
        }
        if self.order.bits() & 0xf0 != 0 || self.options.bits() & 0x80 != 0 {
            return Err(JbigError::InvalidHeader);
        }
        if self.mx > MAXIMUM_AT_OFFSET {
            return Err(JbigError::InvalidHeader);
        }
        if self.my != 0 {
            return Err(JbigError::VerticalAtNotSupported);
        }
        order_nesting(self.order)?;
        if self.order.contains(Order::HITOLO) && self.d > self.dl {
            return Err(JbigError::HighToLowNotSupported);
        }
        // Stripe height at the highest layer must fit 32 bits.
        if ((self.l0 as u64) << self.d) > u32::MAX as u64 {
            return Err(JbigError::InvalidHeader);
        }
        Ok(())
    }

    pub fn layer_width(&self, layer: u8) -> u32 {
        ceil_half(self.xd, (self.d - layer) as u32)
    }

    pub fn layer_height(&self, layer: u8) -> u32 {
        ceil_half(self.yd, (self.d - layer) as u32)
    }

    /// Number of stripes, derived from the height of the lowest resolution layer.
    pub fn stripes(&self) -> u32 {
        if self.l0 == 0 {
            return 0;
        }
        ceil_half(self.yd, self.d as u32).div_ceil(self.l0)
    }

    /// Stripe height at `layer`.
    pub fn stripe_height(&self, layer: u8) -> u32 {
        self.l0 << layer
    }

    /// Rows of `layer` covered by `stripe`, clipped to the layer height.
    pub fn stripe_rows(&self, stripe: u32, layer: u8) -> Range<u32> {
        let height = self.layer_height(layer) as u64;
        let step = self.stripe_height(layer) as u64;
        let start = (stripe as u64 * step).min(height);
        let end = (start + step).min(height);
        start as u32..end as u32
    }

    /// Number of resolution layers in this BIE.
    pub fn layers(&self) -> u32 {
        (self.d - self.dl) as u32 + 1
    }
}

/// Loop level (0 = outermost) of stripe, layer and plane for each order combination.
const LOOP_LEVELS: [Option<[usize; 3]>; 8] = [
    Some([2, 1, 0]),
    None,
    Some([2, 0, 1]),
    Some([1, 0, 2]),
    Some([0, 2, 1]),
    Some([1, 2, 0]),
    Some([0, 1, 2]),
    None,
];

/// Index of the stripe, layer and plane counters within the loop nest defined by `order`.
pub fn order_nesting(order: Order) -> Result<[usize; 3], JbigError> {
    LOOP_LEVELS[(order.bits() & 0x07) as usize].ok_or(JbigError::InvalidOrder)
}

/// Position in the sequence of SDEs of a BIE.
///
/// Counters are kept per loop level, outermost first; the order bits decide
/// which of stripe, layer and plane each level counts.
#[derive(Debug, Clone)]
pub struct SdeCursor {
    levels: [usize; 3],
    counters: [u32; 3],
    limits: [u32; 3],
    dl: u8,
    done: bool,
}

impl SdeCursor {
    pub fn new(header: &BitmapHeader) -> Result<Self, JbigError> {
        let levels = order_nesting(header.order)?;
        let mut limits = [0u32; 3];
        limits[levels[0]] = header.stripes();
        limits[levels[1]] = header.layers();
        limits[levels[2]] = header.planes as u32;
        Ok(Self {
            levels,
            counters: [0; 3],
            limits,
            dl: header.dl,
            done: limits.contains(&0),
        })
    }

    /// True once every SDE has been visited.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn stripe(&self) -> u32 {
        self.counters[self.levels[0]]
    }

    pub fn layer(&self) -> u8 {
        self.dl + self.counters[self.levels[1]] as u8
    }

    pub fn plane(&self) -> u8 {
        self.counters[self.levels[2]] as u8
    }

    pub fn advance(&mut self) {
        if !self.done {
            self.increment(2);
        }
    }

    fn increment(&mut self, mut level: usize) {
        loop {
            self.counters[level] += 1;
            if self.counters[level] < self.limits[level] {
                return;
            }
            self.counters[level] = 0;
            if level == 0 {
                self.done = true;
                return;
            }
            level -= 1;
        }
    }

    /// True if the current or a later SDE belongs to a layer not above `max_layer`.
    pub fn reaches_layer(&self, max_layer: u8) -> bool {
        if self.done {
            return false;
        }
        if self.layer() <= max_layer {
            return true;
        }
        // Any outer loop that can still advance starts the layer loop over.
        (0..self.levels[1]).any(|level| self.counters[level] + 1 < self.limits[level])
    }

    /// Changes the number of stripes, skipping positions that no longer exist.
    pub fn set_stripes(&mut self, stripes: u32) {
        let level = self.levels[0];
        self.limits[level] = stripes;
        if stripes == 0 {
            self.done = true;
            return;
        }
        if !self.done && self.counters[level] >= stripes {
            self.counters[level..].fill(0);
            if level == 0 {
                self.done = true;
            } else {
                self.increment(level - 1);
            }
        }
    }
}

impl Iterator for SdeCursor {
    /// (stripe, layer, plane)
    type Item = (u32, u8, u8);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = (self.stripe(), self.layer(), self.plane());
        self.advance();
        Some(item)
    }
}
