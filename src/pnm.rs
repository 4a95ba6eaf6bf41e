//! Netpbm reading and writing for the command line tools.
//!
//! Reading covers P1 and P4 (PBM) and P2 and P5 (PGM) with `#` comments in the
//! header. Writing only emits the headers; pixel rows are written by the caller.

use std::io::{self, Write};

use log::warn;
use thiserror::Error;

use crate::constants::MAXIMUM_MERGE_PLANES;
use crate::error::JbigError;
use crate::plane_merger::{PlaneCoding, split_planes};
use crate::template::Bitmap;

#[derive(Debug, Error)]
pub enum PnmError {
    #[error("does not look like a PBM file")]
    NotPnm,
    #[error("unsupported PBM type P{0}")]
    UnsupportedType(char),
    #[error("invalid header: {0}")]
    InvalidHeader(&'static str),
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error(transparent)]
    Jbig(#[from] JbigError),
}

pub fn write_pbm_header<W: Write + ?Sized>(
    sink: &mut W,
    width: u32,
    height: u32,
) -> io::Result<()> {
    write!(sink, "P4\n{width} {height}\n")
}

pub fn write_pgm_header<W: Write + ?Sized>(
    sink: &mut W,
    width: u32,
    height: u32,
    maxval: u64,
) -> io::Result<()> {
    write!(sink, "P5\n{width} {height}\n{maxval}\n")
}

/// Image read from a PBM or PGM file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PnmImage {
    /// PBM; a set bit is black.
    Bilevel(Bitmap),
    /// PGM with `bits` significant bits per pixel, each stored in
    /// `ceil(bits/8)` big-endian bytes.
    Gray {
        width: u32,
        height: u32,
        bits: u8,
        pixels: Vec<u8>,
    },
}

impl PnmImage {
    pub fn width(&self) -> u32 {
        match self {
            Self::Bilevel(bitmap) => bitmap.width(),
            Self::Gray { width, .. } => *width,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Self::Bilevel(bitmap) => bitmap.height(),
            Self::Gray { height, .. } => *height,
        }
    }

    /// Bits per pixel, which is the number of bit planes.
    pub fn bits(&self) -> u8 {
        match self {
            Self::Bilevel(_) => 1,
            Self::Gray { bits, .. } => *bits,
        }
    }

    /// The `count` most significant bit planes.
    pub fn into_planes(self, count: u8, coding: PlaneCoding) -> Result<Vec<Bitmap>, JbigError> {
        match self {
            Self::Bilevel(bitmap) => Ok(vec![bitmap]),
            Self::Gray {
                width,
                height,
                bits,
                pixels,
            } => split_planes(width, height, bits, &pixels, count, coding),
        }
    }
}

struct PnmReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> PnmReader<'a> {
    fn peek(&self) -> Option<u8> {
        self.data.get(self.position).copied()
    }

    fn skip_comment(&mut self) {
        while let Some(byte) = self.peek() {
            self.position += 1;
            if byte == b'\r' || byte == b'\n' {
                break;
            }
        }
    }

    /// Skips anything up to the next number, including comments, and reads it.
    fn read_uint(&mut self) -> Result<u32, PnmError> {
        loop {
            match self.peek() {
                None => return Err(PnmError::UnexpectedEof),
                Some(b'#') => self.skip_comment(),
                Some(byte) if byte.is_ascii_digit() => break,
                Some(_) => self.position += 1,
            }
        }
        let mut value = 0u32;
        while let Some(byte) = self.peek().filter(u8::is_ascii_digit) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add((byte - b'0') as u32))
                .ok_or(PnmError::InvalidHeader("number too large"))?;
            self.position += 1;
        }
        Ok(value)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], PnmError> {
        let end = self
            .position
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(PnmError::UnexpectedEof)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }
}

/// Parses a complete PBM or PGM file.
pub fn read_pnm(data: &[u8]) -> Result<PnmImage, PnmError> {
    let mut reader = PnmReader { data, position: 0 };
    while let Some(byte) = reader.peek() {
        match byte {
            b'#' => reader.skip_comment(),
            byte if byte.is_ascii_whitespace() => reader.position += 1,
            _ => break,
        }
    }
    if reader.peek() != Some(b'P') {
        return Err(PnmError::NotPnm);
    }
    reader.position += 1;
    let kind = reader.peek().ok_or(PnmError::UnexpectedEof)?;
    reader.position += 1;

    let width = reader.read_uint()?;
    let height = reader.read_uint()?;
    if width == 0 || height == 0 {
        return Err(PnmError::InvalidHeader("empty image"));
    }
    let maxval = match kind {
        b'2' | b'5' => reader.read_uint()?,
        _ => 1,
    };
    // Single whitespace byte before the raster.
    reader.position += 1;

    let stride = (width as usize).div_ceil(8);
    let pixel_count = width as usize * height as usize;
    match kind {
        b'1' => {
            let mut bitmap = Bitmap::with_size(width, height)?;
            for y in 0..height {
                for x in 0..width {
                    bitmap.set_pixel(x, y, (reader.read_uint()? & 1) as u8);
                }
            }
            Ok(PnmImage::Bilevel(bitmap))
        }
        b'4' => {
            let mut data = reader.take(stride * height as usize)?.to_vec();
            if width % 8 != 0 {
                let padding = (1u8 << (8 - width % 8)) - 1;
                let last = |y: usize| data[y * stride + stride - 1];
                if let Some(y) = (0..height as usize).find(|&y| last(y) & padding != 0) {
                    warn!(
                        "no zero padding in last byte ({:#04x}) of line {}",
                        last(y),
                        y + 1
                    );
                }
                for row in data.chunks_exact_mut(stride) {
                    row[stride - 1] &= !padding;
                }
            }
            Ok(PnmImage::Bilevel(Bitmap::from_packed(width, height, data)?))
        }
        b'2' | b'5' => {
            let bits = (u32::BITS - maxval.leading_zeros()) as u8;
            if bits == 0 || bits > MAXIMUM_MERGE_PLANES {
                return Err(PnmError::InvalidHeader("unsupported maximum value"));
            }
            let pixel_size = (bits as usize).div_ceil(8);
            let pixels = if kind == b'5' {
                reader.take(pixel_count * pixel_size)?.to_vec()
            } else {
                let mut pixels = Vec::with_capacity(pixel_count * pixel_size);
                for _ in 0..pixel_count {
                    let value = reader.read_uint()?;
                    pixels.extend_from_slice(&value.to_be_bytes()[4 - pixel_size..]);
                }
                pixels
            };
            Ok(PnmImage::Gray {
                width,
                height,
                bits,
                pixels,
            })
        }
        other => Err(PnmError::UnsupportedType(other as char)),
    }
}
