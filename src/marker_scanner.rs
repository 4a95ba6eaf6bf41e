//! Separation of the BID into plain stripe coded data (PSCD) and marker segments.
//!
//! Two front ends share the marker decoding: [`MarkerScanner`] is a push scanner
//! for input that arrives in arbitrary pieces, [`SegmentIter`] walks a complete
//! in-memory BID and reports the offset of every item.

use log::debug;

use crate::bitmap_header::{BitmapHeader, YD_OFFSET, read_u32};
use crate::constants::{MARKER_ESC, MARKER_STUFF};
use crate::error::JbigError;
use crate::jbig_marker_code::MarkerCode;

/// A decoded marker segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSegment {
    StripeNormal,
    StripeReset,
    Abort,
    NewLength(u32),
    AtMove { yat: u32, tx: u8, ty: u8 },
    Comment(u32),
    Unknown(u8),
}

impl MarkerSegment {
    /// Builds the segment for `code` from its complete fixed payload.
    fn from_payload(code: MarkerCode, payload: &[u8]) -> Self {
        match code {
            MarkerCode::StripeNormal => Self::StripeNormal,
            MarkerCode::StripeReset => Self::StripeReset,
            MarkerCode::Abort => Self::Abort,
            MarkerCode::NewLength => Self::NewLength(read_u32(payload, 0)),
            MarkerCode::AtMove => Self::AtMove {
                yat: read_u32(payload, 0),
                tx: payload[4],
                ty: payload[5],
            },
            MarkerCode::Comment => Self::Comment(read_u32(payload, 0)),
            MarkerCode::Stuff | MarkerCode::Reserve => Self::Unknown(code.into()),
        }
    }
}

/// Recognized marker code with a payload, or `None` for codes without one.
fn payload_code(byte: u8) -> Option<MarkerCode> {
    match MarkerCode::try_from(byte) {
        Ok(code) if code.payload_len() > 0 => Some(code),
        _ => None,
    }
}

fn marker_without_payload(byte: u8) -> MarkerSegment {
    match MarkerCode::try_from(byte) {
        Ok(code) => MarkerSegment::from_payload(code, &[]),
        Err(_) => MarkerSegment::Unknown(byte),
    }
}

/// Returns the length of the PSCD run at the start of `data`.
///
/// The run ends before an escape that introduces a marker, or before a final
/// lone escape byte whose meaning is not known yet.
fn pscd_run(data: &[u8]) -> usize {
    let mut i = 0;
    while i < data.len() {
        if data[i] == MARKER_ESC {
            match data.get(i + 1) {
                Some(&MARKER_STUFF) => i += 2,
                _ => break,
            }
        } else {
            i += 1;
        }
    }
    i
}

const STUFFED_ESC: [u8; 2] = [MARKER_ESC, MARKER_STUFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScannerState {
    ScanningData,
    AtEscape,
    MarkerPayload {
        code: MarkerCode,
        buffer: [u8; 6],
        filled: usize,
    },
    SkipComment {
        remaining: u32,
    },
}

/// Item reported by [`MarkerScanner::scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEvent<'a> {
    /// PSCD bytes with byte stuffing left in place.
    Data(&'a [u8]),
    Marker(MarkerSegment),
}

/// Incremental scanner that survives arbitrary splits of its input.
#[derive(Debug, Clone)]
pub struct MarkerScanner {
    state: ScannerState,
}

impl Default for MarkerScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerScanner {
    pub fn new() -> Self {
        Self {
            state: ScannerState::ScanningData,
        }
    }

    /// True when no marker is partially read.
    pub fn is_idle(&self) -> bool {
        self.state == ScannerState::ScanningData
    }

    /// Consumes a prefix of `input`, returning its length and at most one event.
    ///
    /// A return of `(0, None)` means `input` is empty.
    pub fn scan<'a>(&mut self, input: &'a [u8]) -> (usize, Option<ScanEvent<'a>>) {
        if input.is_empty() {
            return (0, None);
        }

        match self.state {
            ScannerState::ScanningData => {
                let run = pscd_run(input);
                if run > 0 {
                    (run, Some(ScanEvent::Data(&input[..run])))
                } else {
                    self.state = ScannerState::AtEscape;
                    (1, None)
                }
            }
            ScannerState::AtEscape => {
                let byte = input[0];
                if byte == MARKER_STUFF {
                    self.state = ScannerState::ScanningData;
                    return (1, Some(ScanEvent::Data(&STUFFED_ESC)));
                }
                match payload_code(byte) {
                    Some(code) => {
                        self.state = ScannerState::MarkerPayload {
                            code,
                            buffer: [0; 6],
                            filled: 0,
                        };
                        (1, None)
                    }
                    None => {
                        self.state = ScannerState::ScanningData;
                        (1, Some(ScanEvent::Marker(marker_without_payload(byte))))
                    }
                }
            }
            ScannerState::MarkerPayload {
                code,
                mut buffer,
                filled,
            } => {
                let need = code.payload_len();
                let take = (need - filled).min(input.len());
                buffer[filled..filled + take].copy_from_slice(&input[..take]);
                let filled = filled + take;
                if filled < need {
                    self.state = ScannerState::MarkerPayload {
                        code,
                        buffer,
                        filled,
                    };
                    return (take, None);
                }

                let segment = MarkerSegment::from_payload(code, &buffer[..need]);
                self.state = match segment {
                    MarkerSegment::Comment(length) if length > 0 => {
                        ScannerState::SkipComment { remaining: length }
                    }
                    _ => ScannerState::ScanningData,
                };
                (take, Some(ScanEvent::Marker(segment)))
            }
            ScannerState::SkipComment { remaining } => {
                let take = (remaining as usize).min(input.len());
                let remaining = remaining - take as u32;
                self.state = if remaining == 0 {
                    ScannerState::ScanningData
                } else {
                    ScannerState::SkipComment { remaining }
                };
                (take, None)
            }
        }
    }

    /// Fails if the input ended inside a marker segment.
    pub fn finish(&self) -> Result<(), JbigError> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(JbigError::TruncatedMarker)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Pscd,
    Marker(MarkerSegment),
}

/// One item of a complete BID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Offset of the first byte, relative to the slice given to [`SegmentIter::new`].
    pub offset: usize,
    /// Length including marker payload and comment body.
    pub len: usize,
    pub kind: SegmentKind,
}

/// Iterator over the PSCD runs and marker segments of a complete BID.
///
/// After the first error the iterator is exhausted; [`SegmentIter::position`]
/// then points at the offending byte.
pub struct SegmentIter<'a> {
    data: &'a [u8],
    position: usize,
    failed: bool,
}

impl<'a> SegmentIter<'a> {
    /// Iterates over `data[start..]`; offsets are reported relative to `data`.
    pub fn new(data: &'a [u8], start: usize) -> Self {
        Self {
            data,
            position: start.min(data.len()),
            failed: false,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    fn next_segment(&mut self) -> Result<Segment, JbigError> {
        let offset = self.position;
        let rest = &self.data[offset..];

        let run = pscd_run(rest);
        if run > 0 {
            self.position += run;
            return Ok(Segment {
                offset,
                len: run,
                kind: SegmentKind::Pscd,
            });
        }

        let Some(&byte) = rest.get(1) else {
            return Err(JbigError::TruncatedMarker);
        };
        let (kind, len) = match payload_code(byte) {
            None => (SegmentKind::Marker(marker_without_payload(byte)), 2),
            Some(code) => {
                let end = 2 + code.payload_len();
                if rest.len() < end {
                    return Err(JbigError::TruncatedMarker);
                }
                let segment = MarkerSegment::from_payload(code, &rest[2..end]);
                let len = match segment {
                    MarkerSegment::Comment(length) => {
                        let total = end as u64 + length as u64;
                        if (rest.len() as u64) < total {
                            return Err(JbigError::TruncatedMarker);
                        }
                        total as usize
                    }
                    _ => end,
                };
                (SegmentKind::Marker(segment), len)
            }
        };

        self.position += len;
        Ok(Segment { offset, len, kind })
    }
}

impl Iterator for SegmentIter<'_> {
    type Item = Result<Segment, JbigError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.position >= self.data.len() {
            return None;
        }
        let result = self.next_segment();
        self.failed = result.is_err();
        Some(result)
    }
}

/// Copies the value of the first NEWLEN segment into the YD field of the BIH.
///
/// This is the first pass over a complete VLENGTH BIE; the BIE is left unchanged
/// when it contains no NEWLEN.
pub fn apply_newlen(bie: &mut [u8]) -> Result<(), JbigError> {
    let header = BitmapHeader::parse(bie)?;
    header.check_dp_table(bie.len())?;

    let mut new_height = None;
    for segment in SegmentIter::new(bie, header.header_len()) {
        if let SegmentKind::Marker(MarkerSegment::NewLength(yd)) = segment?.kind {
            new_height = Some(yd);
            break;
        }
    }

    if let Some(yd) = new_height {
        debug!("NEWLEN changes YD from {} to {}", header.yd, yd);
        bie[YD_OFFSET..YD_OFFSET + 4].copy_from_slice(&yd.to_be_bytes());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BID: [u8; 22] = [
        0x12, 0xff, 0x00, 0x34, 0xff, 0x02, // PSCD with stuffing, SDNORM
        0xff, 0x06, 0, 0, 0, 5, 4, 0, // ATMOVE yat=5 tx=4
        0xff, 0x07, 0, 0, 0, 2, 0xff, 0xff, // COMMENT with two body bytes
    ];

    fn collect_events(chunks: &[&[u8]]) -> (Vec<u8>, Vec<MarkerSegment>) {
        let mut scanner = MarkerScanner::new();
        let mut data = Vec::new();
        let mut markers = Vec::new();
        for chunk in chunks {
            let mut rest = *chunk;
            while !rest.is_empty() {
                let (used, event) = scanner.scan(rest);
                rest = &rest[used..];
                match event {
                    Some(ScanEvent::Data(bytes)) => data.extend_from_slice(bytes),
                    Some(ScanEvent::Marker(marker)) => markers.push(marker),
                    None => {}
                }
            }
        }
        assert!(scanner.finish().is_ok());
        (data, markers)
    }

    #[test]
    fn test_scanner_whole_input() {
        let (data, markers) = collect_events(&[&BID]);
        assert_eq!(data, [0x12, 0xff, 0x00, 0x34]);
        assert_eq!(
            markers,
            [
                MarkerSegment::StripeNormal,
                MarkerSegment::AtMove {
                    yat: 5,
                    tx: 4,
                    ty: 0
                },
                MarkerSegment::Comment(2),
            ]
        );
    }

    #[test]
    fn test_scanner_byte_by_byte() {
        let chunks: Vec<&[u8]> = BID.chunks(1).collect();
        assert_eq!(collect_events(&chunks), collect_events(&[&BID]));
    }

    #[test]
    fn test_scanner_truncated() {
        let mut scanner = MarkerScanner::new();
        let (used, _) = scanner.scan(&[0xff]);
        assert_eq!(used, 1);
        assert_eq!(scanner.finish(), Err(JbigError::TruncatedMarker));

        let mut scanner = MarkerScanner::new();
        let mut rest: &[u8] = &[0xff, 0x05, 0x00];
        while !rest.is_empty() {
            let (used, _) = scanner.scan(rest);
            rest = &rest[used..];
        }
        assert_eq!(scanner.finish(), Err(JbigError::TruncatedMarker));
    }

    #[test]
    fn test_unknown_marker_has_no_payload() {
        let (data, markers) = collect_events(&[&[0xff, 0x42, 0x01]]);
        assert_eq!(markers, [MarkerSegment::Unknown(0x42)]);
        assert_eq!(data, [0x01]);
    }

    #[test]
    fn test_segment_iter() {
        let segments: Vec<Segment> = SegmentIter::new(&BID, 0)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0].kind, SegmentKind::Pscd);
        assert_eq!(segments[0].len, 4);
        assert_eq!(segments[1].offset, 4);
        assert_eq!(segments[2].offset, 6);
        assert_eq!(segments[3].offset, 14);
        assert_eq!(segments[3].len, 8);
    }

    #[test]
    fn test_segment_iter_errors() {
        let mut iter = SegmentIter::new(&[0x10, 0xff], 0);
        assert_eq!(iter.next().unwrap().unwrap().kind, SegmentKind::Pscd);
        assert_eq!(iter.next(), Some(Err(JbigError::TruncatedMarker)));
        assert_eq!(iter.position(), 1);
        assert_eq!(iter.next(), None);

        let mut iter = SegmentIter::new(&[0xff, 0x07, 0, 0, 0, 9, 1], 0);
        assert_eq!(iter.next(), Some(Err(JbigError::TruncatedMarker)));
    }

    #[test]
    fn test_apply_newlen() {
        let mut bie = vec![0, 0, 1, 0, 0, 0, 0, 8, 0, 0, 0, 100, 0, 0, 0, 128, 0, 0, 0, 0x20];
        bie.extend_from_slice(&[0x00, 0xff, 0x02, 0xff, 0x05, 0, 0, 0, 40]);
        apply_newlen(&mut bie).unwrap();
        assert_eq!(BitmapHeader::parse(&bie).unwrap().yd, 40);

        let mut short = vec![0u8; 12];
        assert_eq!(apply_newlen(&mut short), Err(JbigError::HeaderTooShort));
    }
}
