//! Adaptive binary arithmetic coder (ITU-T T.82, 6.8 and 6.10).
//!
//! The probability estimation is the 113 state table shared with ITU-T T.81
//! Annex D. A context state is one byte: the MPS in bit 7, the table index in
//! bits 0..=6. Renormalization of the decoder happens lazily before a symbol.

use crate::constants::{MARKER_ESC, MARKER_STUFF};

#[derive(Clone, Copy)]
struct QmState {
    lsz: u16,
    /// Next index after an LPS, with bit 7 set when the MPS has to flip.
    nlps: u8,
    nmps: u8,
}

const fn st(lsz: u16, nlps: u8, nmps: u8, switch: bool) -> QmState {
    QmState {
        lsz,
        nlps: if switch { nlps | 0x80 } else { nlps },
        nmps,
    }
}

// Probability estimation: LSZ, NLPS (MPS switch in bit 7), NMPS
const QM_TABLE: [QmState; 113] = [
    st(0x5a1d, 1, 1, true),
    st(0x2586, 14, 2, false),
    st(0x1114, 16, 3, false),
    st(0x080b, 18, 4, false),
    st(0x03d8, 20, 5, false),
    st(0x01da, 23, 6, false),
    st(0x00e5, 25, 7, false),
    st(0x006f, 28, 8, false),
    st(0x0036, 30, 9, false),
    st(0x001a, 33, 10, false),
    st(0x000d, 35, 11, false),
    st(0x0006, 9, 12, false),
    st(0x0003, 10, 13, false),
    st(0x0001, 12, 13, false),
    st(0x5a7f, 15, 15, true),
    st(0x3f25, 36, 16, false),
    st(0x2cf2, 38, 17, false),
    st(0x207c, 39, 18, false),
    st(0x17b9, 40, 19, false),
    st(0x1182, 42, 20, false),
    st(0x0cef, 43, 21, false),
    st(0x09a1, 45, 22, false),
    st(0x072f, 46, 23, false),
    st(0x055c, 48, 24, false),
    st(0x0406, 49, 25, false),
    st(0x0303, 51, 26, false),
    st(0x0240, 52, 27, false),
    st(0x01b1, 54, 28, false),
    st(0x0144, 56, 29, false),
    st(0x00f5, 57, 30, false),
    st(0x00b7, 59, 31, false),
    st(0x008a, 60, 32, false),
    st(0x0068, 62, 33, false),
    st(0x004e, 63, 34, false),
    st(0x003b, 32, 35, false),
    st(0x002c, 33, 9, false),
    st(0x5ae1, 37, 37, true),
    st(0x484c, 64, 38, false),
    st(0x3a0d, 65, 39, false),
    st(0x2ef1, 67, 40, false),
    st(0x261f, 68, 41, false),
    st(0x1f33, 69, 42, false),
    st(0x19a8, 70, 43, false),
    st(0x1518, 72, 44, false),
    st(0x1177, 73, 45, false),
    st(0x0e74, 74, 46, false),
    st(0x0bfb, 75, 47, false),
    st(0x09f8, 77, 48, false),
    st(0x0861, 78, 49, false),
    st(0x0706, 79, 50, false),
    st(0x05cd, 48, 51, false),
    st(0x04de, 50, 52, false),
    st(0x040f, 50, 53, false),
    st(0x0363, 51, 54, false),
    st(0x02d4, 52, 55, false),
    st(0x025c, 53, 56, false),
    st(0x01f8, 54, 57, false),
    st(0x01a4, 55, 58, false),
    st(0x0160, 56, 59, false),
    st(0x0125, 57, 60, false),
    st(0x00f6, 58, 61, false),
    st(0x00cb, 59, 62, false),
    st(0x00ab, 61, 63, false),
    st(0x008f, 61, 32, false),
    st(0x5b12, 65, 65, true),
    st(0x4d04, 80, 66, false),
    st(0x412c, 81, 67, false),
    st(0x37d8, 82, 68, false),
    st(0x2fe8, 83, 69, false),
    st(0x293c, 84, 70, false),
    st(0x2379, 86, 71, false),
    st(0x1edf, 87, 72, false),
    st(0x1aa9, 87, 73, false),
    st(0x174e, 72, 74, false),
    st(0x1424, 72, 75, false),
    st(0x119c, 74, 76, false),
    st(0x0f6b, 74, 77, false),
    st(0x0d51, 75, 78, false),
    st(0x0bb6, 77, 79, false),
    st(0x0a40, 77, 48, false),
    st(0x5832, 80, 81, true),
    st(0x4d1c, 88, 82, false),
    st(0x438e, 89, 83, false),
    st(0x3bdd, 90, 84, false),
    st(0x34ee, 91, 85, false),
    st(0x2eae, 92, 86, false),
    st(0x299a, 93, 87, false),
    st(0x2516, 86, 71, false),
    st(0x5570, 88, 89, true),
    st(0x4ca9, 95, 90, false),
    st(0x44d9, 96, 91, false),
    st(0x3e22, 97, 92, false),
    st(0x3824, 99, 93, false),
    st(0x32b4, 99, 94, false),
    st(0x2e17, 93, 86, false),
    st(0x56a8, 95, 96, true),
    st(0x4f46, 101, 97, false),
    st(0x47e5, 102, 98, false),
    st(0x41cf, 103, 99, false),
    st(0x3c3d, 104, 100, false),
    st(0x375e, 99, 93, false),
    st(0x5231, 105, 102, false),
    st(0x4c0f, 106, 103, false),
    st(0x4639, 107, 104, false),
    st(0x415e, 103, 99, false),
    st(0x5627, 105, 106, true),
    st(0x50e7, 108, 107, false),
    st(0x4b85, 109, 103, false),
    st(0x5597, 110, 109, false),
    st(0x504f, 111, 107, false),
    st(0x5a10, 110, 111, true),
    st(0x5522, 112, 109, false),
    st(0x59eb, 112, 111, true),
];

#[inline]
fn next_after_mps(state: &mut u8, index: usize) {
    *state = (*state & 0x80) | QM_TABLE[index].nmps;
}

#[inline]
fn next_after_lps(state: &mut u8, index: usize) {
    *state = (*state & 0x80) ^ QM_TABLE[index].nlps;
}

/// Decoder over the PSCD of a single SDE, byte stuffing included.
///
/// Data past the end of the PSCD reads as zero bits.
pub struct ArithmeticDecoder<'a> {
    data: &'a [u8],
    position: usize,
    c: u32,
    a: u32,
    ct: i32,
    startup: bool,
}

impl<'a> ArithmeticDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            c: 0,
            a: 1,
            ct: 0,
            startup: true,
        }
    }

    fn byte_in(&mut self) {
        let Some(&byte) = self.data.get(self.position) else {
            self.ct = -1;
            return;
        };

        if byte == MARKER_ESC {
            if self.data.get(self.position + 1) == Some(&MARKER_STUFF) {
                self.c |= 0xffu32 << (8 - self.ct);
                self.ct += 8;
                self.position += 2;
            } else {
                self.ct = -1;
            }
        } else {
            self.c |= (byte as u32) << (8 - self.ct);
            self.ct += 8;
            self.position += 1;
        }
    }

    fn renormalize(&mut self) {
        while self.a < 0x8000 || self.startup {
            while (0..=8).contains(&self.ct) {
                self.byte_in();
            }
            self.c <<= 1;
            self.a <<= 1;
            if self.ct >= 0 {
                self.ct -= 1;
            }
            if self.a == 0x10000 {
                self.startup = false;
            }
        }
    }

    /// Decodes one pixel in the context whose state is `state`.
    pub fn decode(&mut self, state: &mut u8) -> u8 {
        self.renormalize();

        let index = (*state & 0x7f) as usize;
        let mps = *state >> 7;
        let lsz = QM_TABLE[index].lsz as u32;

        self.a -= lsz;
        if (self.c >> 16) < self.a {
            if self.a >= 0x8000 {
                return mps;
            }
            // Conditional exchange in the MPS sub-interval
            if self.a < lsz {
                next_after_lps(state, index);
                1 - mps
            } else {
                next_after_mps(state, index);
                mps
            }
        } else {
            self.c -= self.a << 16;
            let pixel = if self.a < lsz {
                next_after_mps(state, index);
                mps
            } else {
                next_after_lps(state, index);
                1 - mps
            };
            self.a = lsz;
            pixel
        }
    }
}

/// Encoder producing one stuffed PSCD segment per [`ArithmeticEncoder::flush`].
pub struct ArithmeticEncoder {
    c: u32,
    a: u32,
    ct: u32,
    // Number of 0xff bytes held back until a possible carry is resolved
    sc: u32,
    buffer: Option<u8>,
    output: Vec<u8>,
}

impl Default for ArithmeticEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArithmeticEncoder {
    pub fn new() -> Self {
        Self {
            c: 0,
            a: 0x10000,
            ct: 11,
            sc: 0,
            buffer: None,
            output: Vec::new(),
        }
    }

    fn emit(&mut self, byte: u8) {
        self.output.push(byte);
        if byte == MARKER_ESC {
            self.output.push(MARKER_STUFF);
        }
    }

    fn emit_held_ff(&mut self) {
        for _ in 0..self.sc {
            self.output.push(MARKER_ESC);
            self.output.push(MARKER_STUFF);
        }
        self.sc = 0;
    }

    fn emit_held_zero(&mut self) {
        for _ in 0..self.sc {
            self.output.push(0x00);
        }
        self.sc = 0;
    }

    /// Encodes `pixel` (0 or 1) in the context whose state is `state`.
    pub fn encode(&mut self, state: &mut u8, pixel: u8) {
        let index = (*state & 0x7f) as usize;
        let lsz = QM_TABLE[index].lsz as u32;

        if (pixel & 1) != (*state >> 7) {
            self.a -= lsz;
            if self.a >= lsz {
                self.c += self.a;
                self.a = lsz;
            }
            next_after_lps(state, index);
        } else {
            self.a -= lsz;
            if self.a & 0xffff_8000 != 0 {
                return;
            }
            if self.a < lsz {
                self.c += self.a;
                self.a = lsz;
            }
            next_after_mps(state, index);
        }

        loop {
            self.a <<= 1;
            self.c <<= 1;
            self.ct -= 1;
            if self.ct == 0 {
                self.byte_out();
            }
            if self.a >= 0x8000 {
                break;
            }
        }
    }

    fn byte_out(&mut self) {
        let temp = self.c >> 19;
        if temp & 0xffff_ff00 != 0 {
            // Carry into the buffered byte and all held back 0xff bytes
            if let Some(buffer) = self.buffer {
                self.emit(buffer.wrapping_add(1));
            }
            self.emit_held_zero();
            self.buffer = Some((temp & 0xff) as u8);
        } else if temp == 0xff {
            self.sc += 1;
        } else {
            if let Some(buffer) = self.buffer {
                self.emit(buffer);
            }
            self.emit_held_ff();
            self.buffer = Some(temp as u8);
        }
        self.c &= 0x7ffff;
        self.ct = 8;
    }

    /// Terminates the current code segment and returns its bytes.
    ///
    /// Trailing zero bytes are omitted. The encoder is ready for a new segment
    /// afterwards; context states are owned by the caller and stay untouched.
    pub fn flush(&mut self) -> Vec<u8> {
        let temp = (self.a - 1 + self.c) & 0xffff_0000;
        self.c = if temp < self.c { temp + 0x8000 } else { temp };
        self.c <<= self.ct;

        if self.c & 0xf800_0000 != 0 {
            if let Some(buffer) = self.buffer {
                self.emit(buffer.wrapping_add(1));
            }
            if self.c & 0x07ff_f800 != 0 {
                self.emit_held_zero();
            }
        } else {
            if let Some(buffer) = self.buffer {
                self.emit(buffer);
            }
            self.emit_held_ff();
        }

        if self.c & 0x07ff_f800 != 0 {
            self.emit(((self.c >> 19) & 0xff) as u8);
            if self.c & 0x0007_f800 != 0 {
                self.emit(((self.c >> 11) & 0xff) as u8);
            }
        }

        let mut output = std::mem::take(&mut self.output);
        *self = Self::new();
        while output.last() == Some(&0x00) {
            output.pop();
        }
        // A final 0xff keeps its stuffing byte.
        if output.last() == Some(&MARKER_ESC) {
            output.push(MARKER_STUFF);
        }
        output
    }
}
