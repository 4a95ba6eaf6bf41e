//! Deterministic prediction in differential layers (ITU-T T.82 6.6).
//!
//! A pixel is predicted when the resolution reduction leaves it only one
//! possible value given the low resolution pixels and the high resolution
//! pixels coded before it. The table has 6912 two bit entries (0 or 1 for a
//! predicted pixel, 2 when there is no prediction) packed four to a byte, the
//! layout of a private DPTABLE.

use crate::constants::DP_TABLE_SIZE;
use crate::error::JbigError;
use crate::template::{HighView, LowView};

// Table for the standard resolution reduction.
const DEFAULT_DP_TABLE: [u8; DP_TABLE_SIZE] = [
    0x2a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x2a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
    0x2a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x0a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
    0x2a, 0xaa, 0xaa, 0xaa, 0x0a, 0xaa, 0xaa, 0xaa, 0x22, 0x2a, 0xaa, 0xaa, 0x22, 0xaa, 0xaa, 0xaa,
    0x0a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xa9, 0x22, 0x0a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
    0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xa0, 0x00, 0x2a, 0xaa, 0xaa, 0xaa, 0x0a, 0xaa, 0xa5, 0x55,
    0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x95, 0x55, 0x2a, 0xaa, 0xa5, 0x55, 0xaa, 0xaa, 0xa5, 0xa9,
    0x2a, 0xaa, 0xaa, 0xaa, 0x2a, 0xaa, 0xaa, 0xaa, 0x0a, 0xaa, 0xaa, 0xa0, 0x8a, 0xaa, 0xaa, 0xaa,
    0x2a, 0xaa, 0xa5, 0x55, 0xaa, 0xaa, 0xaa, 0x92, 0x5a, 0xaa, 0xaa, 0xa6, 0xaa, 0x0a, 0xaa, 0xa6,
    0x8a, 0xaa, 0xaa, 0xaa, 0x0a, 0x2a, 0xaa, 0xaa, 0x80, 0x2a, 0xaa, 0xaa, 0x00, 0x0a, 0xaa, 0xa9,
    0x8a, 0xaa, 0xaa, 0xaa, 0x5a, 0xaa, 0xaa, 0xa9, 0xaa, 0xaa, 0xaa, 0xa9, 0xaa, 0x5a, 0xaa, 0xa9,
    0x82, 0x0a, 0xaa, 0xaa, 0xa0, 0x0a, 0xaa, 0xaa, 0x88, 0x82, 0xaa, 0xaa, 0x8a, 0x02, 0xaa, 0xaa,
    0xa0, 0x0a, 0xaa, 0xaa, 0x0a, 0x0a, 0xaa, 0xa9, 0x99, 0xa2, 0xaa, 0xaa, 0xaa, 0x02, 0xaa, 0xaa,
    0xaa, 0xaa, 0x6a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x2a, 0xaa, 0x6a, 0xaa, 0x2a, 0xaa, 0x5a, 0xaa,
    0xaa, 0xaa, 0xaa, 0xaa, 0x2a, 0xaa, 0x6a, 0xaa, 0x2a, 0xaa, 0x5a, 0xaa, 0xaa, 0x5a, 0xaa, 0xaa,
    0x08, 0xaa, 0x55, 0x55, 0x08, 0x2a, 0x55, 0x55, 0x0a, 0xaa, 0x96, 0xaa, 0x4a, 0xaa, 0xa5, 0x6a,
    0x2a, 0xaa, 0x5a, 0xaa, 0x0a, 0xaa, 0x9a, 0xaa, 0xaa, 0xaa, 0xa8, 0xa8, 0xaa, 0x0a, 0xa5, 0xaa,
    0x8a, 0xaa, 0x9a, 0xaa, 0x82, 0x0a, 0xaa, 0xaa, 0x80, 0x2a, 0xaa, 0xa8, 0xa0, 0x0a, 0xaa, 0xa6,
    0x8a, 0x2a, 0xa9, 0x55, 0xa2, 0x2a, 0xa5, 0x9a, 0xa0, 0x0a, 0xa6, 0x9a, 0xa0, 0xaa, 0xaa, 0xaa,
    0x82, 0x0a, 0xaa, 0xa0, 0xa0, 0x0a, 0xaa, 0xa6, 0xa8, 0x8a, 0xaa, 0xaa, 0x88, 0xa2, 0xaa, 0xa6,
    0xa8, 0x8a, 0xaa, 0xa0, 0x00, 0x8a, 0xaa, 0xa6, 0xaa, 0xa2, 0xaa, 0xa9, 0xa0, 0xa8, 0xa9, 0xa9,
    0x2a, 0xaa, 0xa5, 0x5a, 0x2a, 0xaa, 0x5a, 0xaa, 0xa9, 0x9a, 0xaa, 0x00, 0xa6, 0x9a, 0xa8, 0x80,
    0x00, 0x00, 0xaa, 0xaa, 0x2a, 0xaa, 0xa0, 0x00, 0xa0, 0xaa, 0xaa, 0xaa, 0xa0, 0x96, 0xaa, 0xaa,
    0x8a, 0xaa, 0x9a, 0x5a, 0x8a, 0xaa, 0xa6, 0x6a, 0xa0, 0x0a, 0xa5, 0x9a, 0x2a, 0xaa, 0xa9, 0xaa,
    0x8a, 0xaa, 0xaa, 0x8a, 0x02, 0xaa, 0x95, 0x6a, 0x20, 0x0a, 0xaa, 0xa0, 0xa0, 0xa6, 0xaa, 0xaa,
    0xa2, 0x2a, 0xa5, 0x5a, 0xaa, 0x8a, 0xaa, 0xa0, 0xaa, 0x8a, 0xaa, 0xa6, 0xaa, 0xa2, 0xaa, 0xa9,
    0xa0, 0x0a, 0xaa, 0xaa, 0x08, 0x6a, 0xaa, 0xa8, 0xa2, 0xa2, 0xaa, 0xaa, 0xa0, 0xa0, 0xaa, 0xaa,
    0xa8, 0xaa, 0xaa, 0xaa, 0xaa, 0xa2, 0xaa, 0xa9, 0xaa, 0xaa, 0xaa, 0xa9, 0xa8, 0xa8, 0xaa, 0xaa,
    0xaa, 0xaa, 0xaa, 0xaa, 0xa0, 0xa2, 0xaa, 0xa9, 0x88, 0xa8, 0xaa, 0xaa, 0xa0, 0xa8, 0xaa, 0xaa,
    0xaa, 0xaa, 0x55, 0x55, 0xaa, 0xaa, 0x55, 0x55, 0x2a, 0xaa, 0x95, 0x55, 0xaa, 0xaa, 0xaa, 0xaa,
    0xaa, 0xaa, 0x55, 0x55, 0x2a, 0xaa, 0xaa, 0xaa, 0x2a, 0xaa, 0x9a, 0xaa, 0xaa, 0xaa, 0xaa, 0x82,
    0x0a, 0xaa, 0x55, 0x55, 0xaa, 0xa2, 0xaa, 0x59, 0x6a, 0xaa, 0xaa, 0xa6, 0xa0, 0xa2, 0xaa, 0x55,
    0x2a, 0xaa, 0x9a, 0xaa, 0xaa, 0xaa, 0xa8, 0x62, 0xaa, 0x2a, 0xa4, 0x6a, 0xa0, 0x0a, 0xaa, 0xa9,
    0x8a, 0xaa, 0xa5, 0x95, 0x52, 0x2a, 0xa9, 0x55, 0xa8, 0x82, 0xaa, 0xaa, 0x08, 0xaa, 0xaa, 0xa6,
    0xa2, 0x0a, 0xaa, 0xa5, 0xa0, 0x0a, 0xaa, 0xa6, 0xaa, 0x8a, 0xaa, 0xa6, 0xaa, 0xa2, 0xaa, 0xa6,
    0xa0, 0x8a, 0xa9, 0x65, 0xaa, 0xa6, 0xaa, 0xa9, 0x9a, 0x92, 0xaa, 0xa9, 0xaa, 0xaa, 0xaa, 0x99,
    0xa6, 0x5a, 0xaa, 0xaa, 0xa5, 0x5a, 0xaa, 0x2a, 0xaa, 0xa0, 0xaa, 0xa9, 0xa0, 0x02, 0xaa, 0xa9,
    0x00, 0x00, 0x55, 0x55, 0x2a, 0xaa, 0x9a, 0xaa, 0x8a, 0xaa, 0xa6, 0x55, 0xaa, 0x2a, 0xa6, 0x5a,
    0x0a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x96, 0x6a, 0x82, 0x2a, 0xa5, 0x55, 0xaa, 0x0a, 0xa9, 0x9a,
    0x8a, 0x0a, 0xa5, 0x55, 0xa2, 0x0a, 0xaa, 0x59, 0xa0, 0x0a, 0xaa, 0x9a, 0xaa, 0x0a, 0xaa, 0xa5,
    0x82, 0x2a, 0xa5, 0x55, 0xa0, 0xaa, 0xa9, 0x5a, 0x56, 0xaa, 0xaa, 0x95, 0xaa, 0xa2, 0xaa, 0xa4,
    0xa8, 0x0a, 0xaa, 0xaa, 0xa6, 0x8a, 0xaa, 0xa6, 0xaa, 0xa2, 0xaa, 0xa5, 0xaa, 0xa0, 0xaa, 0xa9,
    0xaa, 0x8a, 0xaa, 0xaa, 0xa6, 0x6a, 0xaa, 0xaa, 0xa0, 0x00, 0xaa, 0xa5, 0xa0, 0x00, 0xaa, 0xa5,
    0xaa, 0xa2, 0xaa, 0xa5, 0xaa, 0xa8, 0xaa, 0xa9, 0xaa, 0xa8, 0xaa, 0xa9, 0xaa, 0xaa, 0xaa, 0xaa,
    0xaa, 0xa0, 0xaa, 0xa9, 0xaa, 0xa8, 0xaa, 0xa9, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xa8, 0xaa, 0xaa,
    0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
    0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xa2, 0xaa, 0xa6,
    0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x2a, 0xaa, 0x6a, 0xaa, 0x8a, 0xaa, 0x9a, 0xaa,
    0xaa, 0xaa, 0xaa, 0xaa, 0x2a, 0xaa, 0x6a, 0xaa, 0xa5, 0x59, 0xa0, 0x08, 0xaa, 0x5a, 0xaa, 0x0a,
    0xaa, 0xaa, 0xaa, 0xaa, 0x80, 0x00, 0x95, 0x55, 0x80, 0x00, 0x95, 0x55, 0xa0, 0x0a, 0xa5, 0x5a,
    0x82, 0xaa, 0x96, 0xaa, 0xaa, 0x6a, 0xaa, 0x2a, 0xa8, 0x2a, 0xa9, 0x6a, 0xa0, 0xaa, 0xa5, 0xaa,
    0x80, 0x00, 0x95, 0x55, 0xa0, 0x0a, 0xa5, 0x5a, 0xa8, 0x8a, 0xa9, 0x9a, 0x88, 0x88, 0x99, 0x99,
    0xa9, 0x95, 0xa8, 0x80, 0x00, 0x8a, 0x55, 0x9a, 0xaa, 0xa6, 0xaa, 0xa2, 0xa2, 0xaa, 0xa6, 0xaa,
    0x2a, 0xaa, 0x6a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xa2, 0x20, 0xa6, 0x65, 0xa9, 0x65, 0xa8, 0x20,
    0x00, 0x00, 0x55, 0x55, 0x00, 0x00, 0x55, 0x55, 0xa0, 0x00, 0xa5, 0x55, 0xa0, 0xa8, 0xa5, 0xa9,
    0xaa, 0xaa, 0xaa, 0xaa, 0x8a, 0xaa, 0x9a, 0xaa, 0xaa, 0x6a, 0xaa, 0x2a, 0x22, 0x1a, 0x66, 0x4a,
    0x80, 0x00, 0x95, 0x55, 0x2a, 0xaa, 0x6a, 0xaa, 0x20, 0x10, 0x65, 0x45, 0xa0, 0xa8, 0xa5, 0xa9,
    0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x95, 0xaa, 0x80, 0xaa, 0x8a, 0xaa, 0x9a, 0xaa, 0xa2, 0xaa, 0xa6,
    0xa0, 0x00, 0xa5, 0x55, 0x08, 0x80, 0x59, 0x95, 0xa2, 0xa0, 0xa6, 0xa5, 0xa0, 0xa4, 0xa5, 0xa1,
    0xa8, 0xa6, 0xa9, 0xa2, 0xaa, 0xa6, 0xaa, 0xa2, 0xaa, 0xaa, 0xaa, 0xaa, 0xa8, 0xa8, 0xa9, 0xa9,
    0xaa, 0xa8, 0xaa, 0xa9, 0xa0, 0xa2, 0xa5, 0xa6, 0x88, 0xa8, 0x99, 0xa9, 0xa0, 0xa8, 0xa5, 0xa9,
    0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x2a, 0xaa, 0x6a, 0xaa, 0x2a, 0xaa, 0x6a, 0xaa,
    0xaa, 0xaa, 0xaa, 0xaa, 0x2a, 0xaa, 0x6a, 0xaa, 0x2a, 0xaa, 0x6a, 0xaa, 0xaa, 0x56, 0xaa, 0x02,
    0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xa2, 0xaa, 0xa6, 0xa5, 0x59, 0xa0, 0x08, 0xa5, 0xaa, 0xa0, 0xaa,
    0x2a, 0xaa, 0x6a, 0xaa, 0xa5, 0xa6, 0xa0, 0xa2, 0xa9, 0x9a, 0xa8, 0x8a, 0xa1, 0x1a, 0xa4, 0x4a,
    0x8a, 0x2a, 0x9a, 0x6a, 0xa6, 0xaa, 0xa2, 0xaa, 0xa9, 0x95, 0xa8, 0x80, 0x08, 0x0a, 0x59, 0x5a,
    0xa5, 0x5a, 0xa0, 0x0a, 0xa0, 0x0a, 0xa5, 0x5a, 0xaa, 0x8a, 0xaa, 0x9a, 0xaa, 0xaa, 0xaa, 0xaa,
    0xa2, 0x8a, 0xa6, 0x9a, 0xaa, 0x0a, 0xaa, 0x5a, 0xaa, 0xa6, 0xaa, 0xa2, 0xaa, 0x2a, 0xaa, 0x6a,
    0xa8, 0xaa, 0xa9, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xa2, 0xaa, 0xa6, 0xa5, 0x56, 0xa0, 0x02,
    0xaa, 0xaa, 0xaa, 0xaa, 0x2a, 0xaa, 0x6a, 0xaa, 0x8a, 0xaa, 0x9a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
    0x00, 0x00, 0x55, 0x55, 0xaa, 0xaa, 0xaa, 0xaa, 0x8a, 0xaa, 0x9a, 0xaa, 0xa2, 0x2a, 0xa6, 0x6a,
    0x8a, 0xaa, 0x9a, 0xaa, 0xa5, 0xa6, 0xa0, 0xa2, 0xa1, 0x2a, 0xa4, 0x6a, 0xaa, 0x5a, 0xaa, 0x0a,
    0x9a, 0xaa, 0x8a, 0xaa, 0xa2, 0xaa, 0xa6, 0xaa, 0xa8, 0x6a, 0xa9, 0x2a, 0xaa, 0xa8, 0xaa, 0xa9,
    0xa9, 0x55, 0xa8, 0x00, 0xa8, 0x8a, 0xa9, 0x9a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xa2, 0xaa, 0xa6,
    0xaa, 0x80, 0xaa, 0x95, 0xaa, 0xa2, 0xaa, 0xa6, 0xa5, 0x5a, 0xa0, 0x0a, 0xa0, 0x5a, 0xa5, 0x0a,
    0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
    0xaa, 0xa2, 0xaa, 0xa6, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xa8, 0xaa, 0xa9,
    0x2a, 0xaa, 0x6a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x8a, 0xaa, 0x9a, 0xaa,
    0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x8a, 0xaa, 0x9a, 0xaa, 0xaa, 0x56, 0xaa, 0x02,
    0xa2, 0x00, 0xa6, 0x55, 0xa6, 0x95, 0xa2, 0x80, 0xa6, 0xaa, 0xa2, 0xaa, 0x21, 0x2a, 0x64, 0x6a,
    0x8a, 0xaa, 0x9a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xa2, 0x1a, 0xa6, 0x4a, 0xa5, 0xaa, 0xa0, 0xaa,
    0xaa, 0xaa, 0xaa, 0xaa, 0xa9, 0xa5, 0xa8, 0xa0, 0xaa, 0x86, 0xaa, 0x92, 0xaa, 0xa6, 0xaa, 0xa2,
    0xa5, 0x95, 0xa0, 0x80, 0xa8, 0x8a, 0xa9, 0x9a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
    0xa8, 0xaa, 0xa9, 0xaa, 0xaa, 0xa2, 0xaa, 0xa6, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0x88, 0xaa, 0x99,
    0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xa2, 0xaa, 0xa6, 0xaa, 0xa8, 0xaa, 0xa9, 0xaa, 0xaa, 0xaa, 0xaa,
    0xa5, 0x5a, 0xa0, 0x0a, 0x8a, 0xaa, 0x9a, 0xaa, 0xa5, 0xaa, 0xa0, 0xaa, 0xa2, 0x2a, 0xa6, 0x6a,
    0xaa, 0xaa, 0xaa, 0xaa, 0x9a, 0xaa, 0x8a, 0xaa, 0xaa, 0x00, 0xaa, 0x55, 0xaa, 0x80, 0xaa, 0x95,
    0xaa, 0x5a, 0xaa, 0x0a, 0xa2, 0x2a, 0xa6, 0x6a, 0xaa, 0xaa, 0xaa, 0xaa, 0xa5, 0x5a, 0xa0, 0x0a,
    0xa0, 0x20, 0xa5, 0x65, 0xa8, 0x6a, 0xa9, 0x2a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xa0, 0xaa, 0xa5,
    0xa8, 0x8a, 0xa9, 0x9a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xa2, 0xaa, 0xa6, 0xaa, 0xa8, 0xaa, 0xa9,
    0xaa, 0xa0, 0xaa, 0xa5, 0xaa, 0x52, 0xaa, 0x06, 0xaa, 0xa8, 0xaa, 0xa9, 0xaa, 0xaa, 0xaa, 0xaa,
    0xaa, 0xa2, 0xaa, 0xa6, 0xaa, 0xa8, 0xaa, 0xa9, 0xaa, 0xa8, 0xaa, 0xa9, 0xaa, 0xaa, 0xaa, 0xaa,
    0xaa, 0xa8, 0xaa, 0xa9, 0xaa, 0xa8, 0xaa, 0xa9, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
    0x00, 0x00, 0x55, 0x55, 0x00, 0x00, 0x55, 0x55, 0x80, 0x00, 0x95, 0x55, 0x2a, 0xaa, 0x6a, 0xaa,
    0x00, 0x00, 0x55, 0x55, 0xaa, 0xaa, 0xaa, 0xaa, 0x9a, 0xaa, 0x8a, 0xaa, 0xaa, 0x2a, 0xaa, 0x6a,
    0xa0, 0x00, 0xa5, 0x55, 0xaa, 0x08, 0xaa, 0x59, 0x21, 0x00, 0x64, 0x55, 0xaa, 0x08, 0xaa, 0x59,
    0x8a, 0xaa, 0x9a, 0xaa, 0xa2, 0x2a, 0xa6, 0x6a, 0xa6, 0x8a, 0xa2, 0x9a, 0xaa, 0xa8, 0xaa, 0xa9,
    0xa0, 0x00, 0xa5, 0x55, 0x08, 0x80, 0x59, 0x95, 0xaa, 0xa8, 0xaa, 0xa9, 0xaa, 0x02, 0xaa, 0x56,
    0xa8, 0xa0, 0xa9, 0xa5, 0xaa, 0xa2, 0xaa, 0xa6, 0xaa, 0xa2, 0xaa, 0xa6, 0xaa, 0xaa, 0xaa, 0xaa,
    0xaa, 0x20, 0xaa, 0x65, 0xaa, 0x04, 0xaa, 0x51, 0x8a, 0x88, 0x9a, 0x99, 0xaa, 0x08, 0xaa, 0x59,
    0xa5, 0x5a, 0xa0, 0x0a, 0xa5, 0x8a, 0xa0, 0x9a, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xa8, 0xaa, 0xa9,
    0xaa, 0xaa, 0xaa, 0xaa, 0x9a, 0xaa, 0x8a, 0xaa, 0xa2, 0x00, 0xa6, 0x55, 0xa6, 0x8a, 0xa2, 0x9a,
    0xa0, 0x00, 0xa5, 0x55, 0x92, 0x2a, 0x86, 0x6a, 0xa8, 0x80, 0xa9, 0x95, 0xa0, 0xaa, 0xa5, 0xaa,
    0xa0, 0xa0, 0xa5, 0xa5, 0xa8, 0xa0, 0xa9, 0xa5, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xa0, 0xaa, 0xa5,
    0xa8, 0x80, 0xa9, 0x95, 0xaa, 0x0a, 0xaa, 0x5a, 0x00, 0x00, 0x55, 0x55, 0xaa, 0xaa, 0xaa, 0xaa,
    0xaa, 0xa0, 0xaa, 0xa5, 0xa5, 0xa2, 0xa0, 0xa6, 0xaa, 0xa8, 0xaa, 0xa9, 0xaa, 0xaa, 0xaa, 0xaa,
    0xaa, 0xa0, 0xaa, 0xa5, 0xa6, 0x66, 0xa2, 0x22, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
    0xaa, 0xa8, 0xaa, 0xa9, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
    0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0xaa,
];

// First entry of each spatial phase: even/even, even/odd, odd/even and odd/odd
// (row, column) parity of the high resolution pixel.
const PHASE_OFFSET: [usize; 4] = [0, 256, 768, 2816];

// High resolution neighbours of each phase in raster order, as (dx, dy).
const PHASE_NEIGHBOURS: [&[(i64, i64)]; 4] = [
    &[(-1, -1), (0, -1), (1, -1), (-1, 0)],
    &[(-2, -1), (-1, -1), (0, -1), (-2, 0), (-1, 0)],
    &[(-1, -2), (0, -2), (1, -2), (-1, -1), (0, -1), (1, -1), (-1, 0)],
    &[
        (-2, -2),
        (-1, -2),
        (0, -2),
        (-2, -1),
        (-1, -1),
        (0, -1),
        (-2, 0),
        (-1, 0),
    ],
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DpTable {
    entries: Vec<u8>,
}

impl Default for DpTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_DP_TABLE.to_vec(),
        }
    }
}

impl DpTable {
    /// Reads a private DPTABLE from the first 1728 bytes of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self, JbigError> {
        let entries = data.get(..DP_TABLE_SIZE).ok_or(JbigError::DpTableTooShort)?;
        Ok(Self {
            entries: entries.to_vec(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.entries
    }

    fn entry(&self, index: usize) -> u8 {
        (self.entries[index >> 2] >> (6 - 2 * (index & 3))) & 3
    }

    /// Value of pixel `(x, y)` if it is determined by its neighbourhood.
    pub fn predict(&self, high: &HighView, low: &LowView, x: u32, y: u32) -> Option<u8> {
        let phase = (((y & 1) << 1) | (x & 1)) as usize;
        let (lx, ly) = ((x >> 1) as i64, (y >> 1) as i64);
        let (x, y) = (x as i64, y as i64);

        let mut index = low.get(lx - 1, ly - 1) as usize
            | (low.get(lx, ly - 1) as usize) << 1
            | (low.get(lx - 1, ly) as usize) << 2
            | (low.get(lx, ly) as usize) << 3;
        for (bit, (dx, dy)) in PHASE_NEIGHBOURS[phase].iter().enumerate() {
            index |= high.get(x + dx, y + dy) << (4 + bit);
        }
        let value = self.entry(PHASE_OFFSET[phase] + index);
        (value < 2).then_some(value)
    }
}
