//! Human readable listing of a BIE: header fields and one line per PSCD run
//! or marker segment, each prefixed with its byte offset.

use std::io::{self, Write};

use crate::bitmap_header::{BitmapHeader, Options, Order};
use crate::constants::{BIH_SIZE, DP_TABLE_SIZE};
use crate::jbig_marker_code::MarkerCode;
use crate::marker_scanner::{MarkerSegment, SegmentIter, SegmentKind};

fn flag(set: bool, name: &'static str) -> &'static str {
    if set { name } else { "" }
}

fn write_header<W: Write + ?Sized>(out: &mut W, header: &BitmapHeader) -> io::Result<()> {
    write!(
        out,
        "BIH:\n\n  DL = {}\n  D  = {}\n  P  = {}\n  -  = {}\n  XD = {}\n  YD = {}\n  L0 = {}\n  MX = {}\n  MY = {}\n",
        header.dl,
        header.d,
        header.planes,
        header.fill,
        header.xd,
        header.yd,
        header.l0,
        header.mx,
        header.my
    )?;

    let order = header.order;
    writeln!(
        out,
        "  order   = {} {}{}{}{}{}",
        order.bits(),
        flag(order.contains(Order::HITOLO), " HITOLO"),
        flag(order.contains(Order::SEQ), " SEQ"),
        flag(order.contains(Order::ILEAVE), " ILEAVE"),
        flag(order.contains(Order::SMID), " SMID"),
        flag(order.bits() & 0xf0 != 0, " other")
    )?;

    let options = header.options;
    writeln!(
        out,
        "  options = {} {}{}{}{}{}{}{}{}",
        options.bits(),
        flag(options.contains(Options::LRLTWO), " LRLTWO"),
        flag(options.contains(Options::VLENGTH), " VLENGTH"),
        flag(options.contains(Options::TPDON), " TPDON"),
        flag(options.contains(Options::TPBON), " TPBON"),
        flag(options.contains(Options::DPON), " DPON"),
        flag(options.contains(Options::DPPRIV), " DPPRIV"),
        flag(options.contains(Options::DPLAST), " DPLAST"),
        flag(options.bits() & 0x80 != 0, " other")
    )?;

    // The header is not validated here, so DL may exceed D.
    let stripes = header.stripes() as i64;
    let layers = header.d as i64 - header.dl as i64 + 1;
    let planes = header.planes as i64;
    write!(
        out,
        "\n  {stripes} stripes, {layers} layers, {planes} planes = {} SDEs\n\n",
        stripes * layers * planes
    )
}

fn write_marker<W: Write + ?Sized>(
    out: &mut W,
    offset: usize,
    segment: MarkerSegment,
    sde: &mut u32,
) -> io::Result<()> {
    write!(out, "{offset:06x}: ESC ")?;
    match segment {
        MarkerSegment::StripeNormal | MarkerSegment::StripeReset => {
            let name = if segment == MarkerSegment::StripeNormal {
                MarkerCode::StripeNormal.name()
            } else {
                MarkerCode::StripeReset.name()
            };
            writeln!(out, "{name} #{sde}")?;
            *sde += 1;
            Ok(())
        }
        MarkerSegment::Abort => writeln!(out, "ABORT"),
        MarkerSegment::NewLength(yd) => writeln!(out, "NEWLEN YD = {yd}"),
        MarkerSegment::AtMove { yat, tx, ty } => {
            writeln!(out, "ATMOVE YAT = {yat}, tX = {tx}, tY = {ty}")
        }
        MarkerSegment::Comment(length) => writeln!(out, "COMMENT LC = {length}"),
        MarkerSegment::Unknown(code) => writeln!(out, "0x{code:02x}"),
    }
}

/// Reports the segment at `offset` that the BID walk could not step over.
fn write_truncated<W: Write + ?Sized>(
    out: &mut W,
    bie: &[u8],
    offset: usize,
) -> io::Result<()> {
    let rest = &bie[offset..];
    if rest.len() < 2 {
        return writeln!(out, "{offset:06x}: Error: single byte 0x{:02x} left", rest[0]);
    }
    if let Ok(code) = MarkerCode::try_from(rest[1]) {
        let payload = code.payload_len();
        if rest.len() < 2 + payload {
            writeln!(out, "{offset:06x}: ESC {} unexpected EOF", code.name())?;
        } else if code == MarkerCode::Comment {
            // Length field is intact, the comment body is cut short.
            let length = u32::from_be_bytes([rest[2], rest[3], rest[4], rest[5]]);
            writeln!(out, "{offset:06x}: ESC COMMENT LC = {length}")?;
        }
    }
    writeln!(out, "Error encountered!")
}

/// Writes the listing of the complete BIE `bie` to `out`.
///
/// Problems with the BIE are part of the listing; only write failures are errors.
pub fn diagnose_bie<W: Write + ?Sized>(bie: &[u8], out: &mut W) -> io::Result<()> {
    let Ok(header) = BitmapHeader::parse(bie) else {
        return writeln!(
            out,
            "Error: Input file is {} < {BIH_SIZE} bytes long and therefore does not contain an intact BIE header!",
            bie.len()
        );
    };
    write_header(out, &header)?;

    write!(out, "BID:\n\n")?;
    if bie.len() < header.header_len() {
        return writeln!(
            out,
            "Error: Input file is {} < {BIH_SIZE}+{DP_TABLE_SIZE} bytes long and therefore does not contain an intact BIE header with DPTABLE!",
            bie.len()
        );
    }

    let mut sde = 0;
    let mut segments = SegmentIter::new(bie, header.header_len());
    for segment in segments.by_ref() {
        let Ok(segment) = segment else {
            break;
        };
        match segment.kind {
            SegmentKind::Pscd => writeln!(out, "{:06x}: PSCD", segment.offset)?,
            SegmentKind::Marker(marker) => {
                write_marker(out, segment.offset, marker, &mut sde)?;
                if let MarkerSegment::Unknown(_) = marker {
                    return writeln!(out, "Error encountered!");
                }
            }
        }
    }
    if segments.position() < bie.len() {
        write_truncated(out, bie, segments.position())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(bie: &[u8]) -> String {
        let mut out = Vec::new();
        diagnose_bie(bie, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn sample_header() -> Vec<u8> {
        vec![0, 0, 1, 0, 0, 0, 0, 16, 0, 0, 0, 16, 0, 0, 0, 8, 8, 0, 0x03, 0x08]
    }

    #[test]
    fn test_header_listing() {
        let text = listing(&sample_header());
        assert!(text.starts_with("BIH:\n\n  DL = 0\n  D  = 0\n  P  = 1\n  -  = 0\n"));
        assert!(text.contains("  XD = 16\n  YD = 16\n  L0 = 8\n  MX = 8\n  MY = 0\n"));
        assert!(text.contains("  order   = 3  ILEAVE SMID\n"));
        assert!(text.contains("  options = 8  TPBON\n"));
        assert!(text.contains("\n  2 stripes, 1 layers, 1 planes = 2 SDEs\n\nBID:\n\n"));
    }

    #[test]
    fn test_bid_listing() {
        let mut bie = sample_header();
        bie.extend_from_slice(&[0xff, 0x07, 0, 0, 0, 2, b'h', b'i']);
        bie.extend_from_slice(&[0xff, 0x06, 0, 0, 0, 3, 4, 0]);
        bie.extend_from_slice(&[0x12, 0xff, 0x00, 0x34, 0xff, 0x02]);
        bie.extend_from_slice(&[0xff, 0x05, 0, 0, 0, 9]);
        bie.extend_from_slice(&[0xff, 0x03, 0xff, 0x04]);
        let text = listing(&bie);
        let bid = text.split("BID:\n\n").nth(1).unwrap();
        assert_eq!(
            bid,
            "000014: ESC COMMENT LC = 2\n\
             00001c: ESC ATMOVE YAT = 3, tX = 4, tY = 0\n\
             000024: PSCD\n\
             000028: ESC SDNORM #0\n\
             00002a: ESC NEWLEN YD = 9\n\
             000030: ESC SDRST #1\n\
             000032: ESC ABORT\n"
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            listing(&[0; 5]),
            "Error: Input file is 5 < 20 bytes long and therefore does not contain an intact BIE header!\n"
        );

        let mut bie = sample_header();
        bie.extend_from_slice(&[0x00, 0xff]);
        assert!(listing(&bie).ends_with("000014: PSCD\n000015: Error: single byte 0xff left\n"));

        let mut bie = sample_header();
        bie.extend_from_slice(&[0xff, 0x05, 0]);
        assert!(listing(&bie).ends_with("000014: ESC NEWLEN unexpected EOF\nError encountered!\n"));

        let mut bie = sample_header();
        bie.extend_from_slice(&[0xff, 0x09, 0xff, 0x02]);
        assert!(listing(&bie).ends_with("000014: ESC 0x09\nError encountered!\n"));

        let mut bie = sample_header();
        bie[19] = 0x06;
        assert!(listing(&bie).ends_with("does not contain an intact BIE header with DPTABLE!\n"));
    }
}
