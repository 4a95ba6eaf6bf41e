//! Conversion between bit planes and multi-bit pixels.
//!
//! Plane 0 carries the most significant bit. The bitstream does not record
//! whether the planes hold Gray or binary coded values, so the caller chooses.

use std::io::Write;

use crate::constants::{MAXIMUM_MERGE_PLANES, MERGE_CHUNK_SIZE};
use crate::error::JbigError;
use crate::template::Bitmap;

/// Decoded planes of the highest decoded resolution layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Packed 1 bpp rows per plane, MSB first, rows padded to bytes.
    pub planes: Vec<Vec<u8>>,
}

impl DecodedImage {
    /// Bytes per row of a plane.
    pub fn stride(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    /// Bytes per pixel of the merged output.
    pub fn merged_pixel_size(&self) -> usize {
        self.planes.len().div_ceil(8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaneCoding {
    #[default]
    Gray,
    Binary,
}

#[inline]
fn plane_bit(plane: &[u8], stride: usize, x: usize, y: usize) -> u32 {
    ((plane[y * stride + (x >> 3)] >> (7 - (x & 7))) & 1) as u32
}

/// Writes every pixel as `ceil(P/8)` big-endian bytes, row by row, in chunks.
pub fn merge_planes<W: Write + ?Sized>(
    image: &DecodedImage,
    coding: PlaneCoding,
    sink: &mut W,
) -> Result<(), JbigError> {
    let plane_count = image.planes.len();
    if plane_count > MAXIMUM_MERGE_PLANES as usize {
        return Err(JbigError::TooManyPlanes);
    }
    let stride = image.stride();
    let pixel_size = image.merged_pixel_size();
    let gray = (coding == PlaneCoding::Gray) as u32;

    let mut chunk = Vec::with_capacity(MERGE_CHUNK_SIZE + pixel_size);
    for y in 0..image.height as usize {
        for x in 0..image.width as usize {
            let mut value = 0u32;
            for plane in &image.planes {
                let bit = plane_bit(plane, stride, x, y);
                value = (value << 1) | (bit ^ (gray & value & 1));
            }
            chunk.extend_from_slice(&value.to_be_bytes()[4 - pixel_size..]);
            if chunk.len() >= MERGE_CHUNK_SIZE {
                sink.write_all(&chunk)
                    .map_err(|_| JbigError::CallbackFailed)?;
                chunk.clear();
            }
        }
    }
    if !chunk.is_empty() {
        sink.write_all(&chunk)
            .map_err(|_| JbigError::CallbackFailed)?;
    }
    Ok(())
}

/// Splits `bits`-bit pixels (stored in `ceil(bits/8)` big-endian bytes) into
/// the `encode_planes` most significant bit planes.
pub fn split_planes(
    width: u32,
    height: u32,
    bits: u8,
    pixels: &[u8],
    encode_planes: u8,
    coding: PlaneCoding,
) -> Result<Vec<Bitmap>, JbigError> {
    if bits == 0 || bits > MAXIMUM_MERGE_PLANES {
        return Err(JbigError::InvalidArgumentPlaneCount);
    }
    if encode_planes == 0 || encode_planes > bits {
        return Err(JbigError::InvalidArgumentPlaneCount);
    }
    let pixel_size = (bits as usize).div_ceil(8);
    let expected = width as usize * height as usize * pixel_size;
    if pixels.len() < expected {
        return Err(JbigError::InvalidArgumentSize);
    }

    let mut planes = (0..encode_planes)
        .map(|_| Bitmap::with_size(width, height))
        .collect::<Result<Vec<_>, _>>()?;

    let mut offset = 0;
    for y in 0..height {
        for x in 0..width {
            let mut value = 0u32;
            for &byte in &pixels[offset..offset + pixel_size] {
                value = (value << 8) | byte as u32;
            }
            offset += pixel_size;
            if coding == PlaneCoding::Gray {
                value ^= value >> 1;
            }
            for (p, plane) in planes.iter_mut().enumerate() {
                let bit = (value >> (bits as usize - 1 - p)) & 1;
                if bit != 0 {
                    plane.set_pixel(x, y, 1);
                }
            }
        }
    }
    Ok(planes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_planes() -> DecodedImage {
        // 8x1 image, pixel x carries the planes of value x
        DecodedImage {
            width: 8,
            height: 1,
            planes: vec![vec![0b0000_1111], vec![0b0011_0011], vec![0b0101_0101]],
        }
    }

    #[test]
    fn test_binary_merge() {
        let mut out = Vec::new();
        merge_planes(&three_planes(), PlaneCoding::Binary, &mut out).unwrap();
        assert_eq!(out, [0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_gray_merge() {
        let mut out = Vec::new();
        merge_planes(&three_planes(), PlaneCoding::Gray, &mut out).unwrap();
        assert_eq!(out, [0, 1, 3, 2, 7, 6, 4, 5]);
    }

    #[test]
    fn test_wide_pixels_are_big_endian() {
        let image = DecodedImage {
            width: 1,
            height: 1,
            planes: (0..12).map(|p| vec![if p == 3 { 0x80 } else { 0 }]).collect(),
        };
        assert_eq!(image.merged_pixel_size(), 2);
        let mut out = Vec::new();
        merge_planes(&image, PlaneCoding::Binary, &mut out).unwrap();
        assert_eq!(out, [0x01, 0x00]);
    }

    #[test]
    fn test_too_many_planes() {
        let image = DecodedImage {
            width: 1,
            height: 1,
            planes: vec![vec![0]; 33],
        };
        assert_eq!(
            merge_planes(&image, PlaneCoding::Gray, &mut Vec::new()),
            Err(JbigError::TooManyPlanes)
        );
    }

    #[test]
    fn test_sink_failure() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        assert_eq!(
            merge_planes(&three_planes(), PlaneCoding::Binary, &mut Broken),
            Err(JbigError::CallbackFailed)
        );
    }

    #[test]
    fn test_split_inverts_merge() {
        let pixels: Vec<u8> = (0..8).collect();
        for coding in [PlaneCoding::Gray, PlaneCoding::Binary] {
            let planes = split_planes(8, 1, 3, &pixels, 3, coding).unwrap();
            let image = DecodedImage {
                width: 8,
                height: 1,
                planes: planes.into_iter().map(Bitmap::into_bytes).collect(),
            };
            let mut out = Vec::new();
            merge_planes(&image, coding, &mut out).unwrap();
            assert_eq!(out, pixels);
        }
    }

    #[test]
    fn test_split_keeps_most_significant_planes() {
        let planes = split_planes(2, 1, 8, &[0x80, 0x7f], 1, PlaneCoding::Binary).unwrap();
        assert_eq!(planes.len(), 1);
        assert_eq!(planes[0].as_bytes(), &[0x80]);
        assert!(split_planes(2, 1, 8, &[0x80], 1, PlaneCoding::Binary).is_err());
    }
}
