// The BIH is always 20 bytes long (ITU-T T.82, 6.2).
pub const BIH_SIZE: usize = 20;

// Size of a private deterministic prediction table following the BIH.
pub const DP_TABLE_SIZE: usize = 1728;

pub const MARKER_ESC: u8 = 0xFF;
pub const MARKER_STUFF: u8 = 0x00;

// Payload sizes of the variable marker segments (without the two marker bytes).
pub const NEWLEN_PAYLOAD_SIZE: usize = 4;
pub const ATMOVE_PAYLOAD_SIZE: usize = 6;
pub const COMMENT_LENGTH_SIZE: usize = 4;

// Highest resolution layer index that still fits a 32 bit shift.
pub const MAXIMUM_LAYER: u8 = 31;

// Maximum horizontal AT offset that can be announced in MX.
pub const MAXIMUM_AT_OFFSET: u8 = 127;

// Smallest non-default horizontal AT offset; smaller offsets fall on the fixed template.
pub const MINIMUM_AT_OFFSET: u8 = 3;

// Number of ATMOVE segments accepted in front of a single SDE.
pub const MAXIMUM_AT_MOVES: usize = 64;

// Contexts of the 10 bit lowest-layer templates and the 12 bit differential template.
pub const LOWEST_LAYER_CONTEXTS: usize = 1024;
pub const DIFFERENTIAL_CONTEXTS: usize = 4096;

// Contexts used to code the typical prediction flag of a line (pair).
pub const TPB2CX: usize = 0x195;
pub const TPB3CX: usize = 0x0e5;
pub const TPDCX: usize = 0xc3f;

// Widest pixel value produced by the plane merger.
pub const MAXIMUM_MERGE_PLANES: u8 = 32;

// Chunk size used when pushing merged pixels to a sink.
pub const MERGE_CHUNK_SIZE: usize = 4096;

// Input block size used by the command line driver for streamed decoding.
pub const DRIVER_READ_CHUNK: usize = 8000;
