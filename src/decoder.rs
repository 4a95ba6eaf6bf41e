//! Incremental decoder for one or more consecutive BIEs.
//!
//! Input may be delivered in pieces of any size. [`JbigDecoder::feed`] consumes
//! a prefix of each piece and reports whether more data is needed, the image is
//! complete, or decoding stopped early at a resolution layer limit or an ABORT.

use log::{debug, trace};

use crate::bitmap_header::{BitmapHeader, Options, SdeCursor, ceil_half};
use crate::constants::{BIH_SIZE, MARKER_ESC, MAXIMUM_AT_MOVES, MINIMUM_AT_OFFSET};
use crate::deterministic_prediction::DpTable;
use crate::error::JbigError;
use crate::marker_scanner::{MarkerScanner, MarkerSegment, ScanEvent};
use crate::plane_merger::DecodedImage;
use crate::stripe_decoder::decode_stripe;
use crate::template::{AtMove, Bitmap, CodingState, StripeParams};

/// Outcome of a successful [`JbigDecoder::feed`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// All input was consumed and the BIE is not finished yet.
    NeedMoreData,
    /// The BIE is finished; remaining input may hold a further BIE.
    Complete,
    /// Decoding stopped at the resolution limit or at an ABORT marker.
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    Header,
    Data,
    Trailer,
    Interrupted,
    Failed,
}

pub struct JbigDecoder {
    state: DecoderState,
    max_width: u32,
    max_height: u32,
    header_bytes: Vec<u8>,
    header: Option<BitmapHeader>,
    /// Highest layer of the current BIE that is decoded.
    dmax: u8,
    cursor: Option<SdeCursor>,
    scanner: MarkerScanner,
    stripe_data: Vec<u8>,
    in_stripe: bool,
    at_moves: Vec<AtMove>,
    /// Indexed by plane, then layer.
    bitmaps: Vec<Vec<Bitmap>>,
    /// Indexed by plane, then layer above DL.
    coding: Vec<Vec<CodingState>>,
    /// Table of the last BIE with DPON; DPLAST refers back to it.
    dp_table: Option<DpTable>,
}

impl Default for JbigDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl JbigDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Header,
            max_width: u32::MAX,
            max_height: u32::MAX,
            header_bytes: Vec::with_capacity(BIH_SIZE),
            header: None,
            dmax: 0,
            cursor: None,
            scanner: MarkerScanner::new(),
            stripe_data: Vec::new(),
            in_stripe: false,
            at_moves: Vec::new(),
            bitmaps: Vec::new(),
            coding: Vec::new(),
            dp_table: None,
        }
    }

    /// Limits the size of the decoded image.
    ///
    /// Higher resolution layers that exceed the limit are not decoded and
    /// [`JbigDecoder::feed`] returns [`DecodeStatus::Interrupted`] once the
    /// largest fitting layer is complete.
    pub fn set_max_size(&mut self, max_width: u32, max_height: u32) {
        self.max_width = max_width;
        self.max_height = max_height;
    }

    /// Consumes a prefix of `data` and returns its length with the decoder status.
    ///
    /// After an error the decoder is unusable and further calls fail with
    /// [`JbigError::InvalidOperation`].
    pub fn feed(&mut self, data: &[u8]) -> Result<(usize, DecodeStatus), JbigError> {
        if self.state == DecoderState::Failed {
            return Err(JbigError::InvalidOperation);
        }
        let result = self.process(data);
        if let Err(error) = result {
            debug!("decoding failed: {error}");
            self.state = DecoderState::Failed;
        }
        result
    }

    fn process(&mut self, data: &[u8]) -> Result<(usize, DecodeStatus), JbigError> {
        let mut position = 0;
        let mut completed = false;
        loop {
            match self.state {
                DecoderState::Header => {
                    if let Some(status) = self.read_header(data, &mut position)? {
                        return Ok((position, status));
                    }
                }
                DecoderState::Data => {
                    if position == data.len() {
                        return Ok((position, DecodeStatus::NeedMoreData));
                    }
                    let (used, event) = self.scanner.scan(&data[position..]);
                    position += used;
                    let status = match event {
                        None => None,
                        Some(ScanEvent::Data(bytes)) => {
                            self.append_stripe_data(bytes)?;
                            None
                        }
                        Some(ScanEvent::Marker(segment)) => self.on_marker(segment)?,
                    };
                    match status {
                        None => {}
                        Some(DecodeStatus::Complete) => completed = true,
                        Some(status) => return Ok((position, status)),
                    }
                }
                DecoderState::Trailer => {
                    let next_bie = position < data.len()
                        && self.scanner.is_idle()
                        && data[position] != MARKER_ESC;
                    if position == data.len() || (next_bie && completed) {
                        return Ok((position, DecodeStatus::Complete));
                    }
                    if next_bie {
                        debug!("next BIE starts");
                        self.state = DecoderState::Header;
                        continue;
                    }
                    let (used, event) = self.scanner.scan(&data[position..]);
                    position += used;
                    match event {
                        None => {}
                        Some(ScanEvent::Marker(MarkerSegment::NewLength(yd))) => {
                            self.apply_new_length(yd)?;
                        }
                        Some(ScanEvent::Marker(MarkerSegment::Comment(length))) => {
                            debug!("skipping {length} byte comment");
                        }
                        Some(_) => return Err(JbigError::UnexpectedMarker),
                    }
                }
                DecoderState::Interrupted => {
                    return Ok((position, DecodeStatus::Interrupted));
                }
                DecoderState::Failed => return Err(JbigError::InvalidOperation),
            }
        }
    }

    /// Collects the BIH and the optional DPTABLE.
    ///
    /// Returns `None` once the header is complete and decoding moved on.
    fn read_header(
        &mut self,
        data: &[u8],
        position: &mut usize,
    ) -> Result<Option<DecodeStatus>, JbigError> {
        loop {
            let need = if self.header_bytes.len() < BIH_SIZE {
                BIH_SIZE
            } else {
                BitmapHeader::parse(&self.header_bytes)?.header_len()
            };
            if self.header_bytes.len() >= need {
                break;
            }
            if *position == data.len() {
                return Ok(Some(DecodeStatus::NeedMoreData));
            }
            let take = (need - self.header_bytes.len()).min(data.len() - *position);
            self.header_bytes
                .extend_from_slice(&data[*position..*position + take]);
            *position += take;
            if self.header_bytes.len() == BIH_SIZE {
                BitmapHeader::parse(&self.header_bytes)?.validate()?;
            }
        }

        let header = BitmapHeader::parse(&self.header_bytes)?;
        let private_table = if header.has_dp_table() {
            Some(DpTable::from_bytes(&self.header_bytes[BIH_SIZE..])?)
        } else {
            None
        };
        self.header_bytes.clear();
        if self.begin_bie(header, private_table)? {
            self.state = DecoderState::Data;
            Ok(None)
        } else {
            self.state = DecoderState::Interrupted;
            Ok(Some(DecodeStatus::Interrupted))
        }
    }

    /// Sets up decoding of a BIE; returns false if none of its layers fits the size limit.
    fn begin_bie(
        &mut self,
        header: BitmapHeader,
        private_table: Option<DpTable>,
    ) -> Result<bool, JbigError> {
        let first = self.header.is_none();
        match &self.header {
            None if header.dl != 0 => return Err(JbigError::InconsistentLayers),
            None => {}
            Some(previous) => {
                if header.dl != previous.d + 1 {
                    return Err(JbigError::InconsistentLayers);
                }
                let shift = (header.d - previous.d) as u32;
                if header.planes != previous.planes
                    || ceil_half(header.xd, shift) != previous.xd
                    || ceil_half(header.yd, shift) != previous.yd
                {
                    return Err(JbigError::InconsistentLayers);
                }
            }
        }
        if header.options.contains(Options::DPON) {
            match private_table {
                Some(table) => self.dp_table = Some(table),
                // DPLAST: the table of an earlier BIE stays in use.
                None if header.options.contains(Options::DPPRIV) => {
                    if self.dp_table.is_none() {
                        return Err(JbigError::MissingDpTable);
                    }
                }
                None => self.dp_table = Some(DpTable::default()),
            }
        }

        debug!(
            "BIH: {}x{}, layers {}..={}, {} planes, L0 {}, order {:#04x}, options {:#04x}",
            header.xd,
            header.yd,
            header.dl,
            header.d,
            header.planes,
            header.l0,
            header.order.bits(),
            header.options.bits()
        );

        let fits = |layer: u8| {
            header.layer_width(layer) <= self.max_width
                && header.layer_height(layer) <= self.max_height
        };
        let Some(dmax) = (header.dl..=header.d).rev().find(|&layer| fits(layer)) else {
            if first {
                return Err(JbigError::LimitExceeded);
            }
            debug!("no layer of this BIE fits {}x{}", self.max_width, self.max_height);
            return Ok(false);
        };
        if dmax < header.d {
            debug!("decoding up to layer {dmax} of {}", header.d);
        }

        if first {
            self.bitmaps = (0..header.planes).map(|_| Vec::new()).collect();
        }
        for layers in &mut self.bitmaps {
            // Only the top layer of the previous BIE is read again.
            let keep = header.dl.saturating_sub(1) as usize;
            for bitmap in layers.iter_mut().take(keep) {
                *bitmap = Bitmap::new(bitmap.width());
            }
            for layer in layers.len() as u8..=dmax {
                layers.push(Bitmap::new(header.layer_width(layer)));
            }
        }
        self.coding = (0..header.planes)
            .map(|_| {
                (header.dl..=dmax)
                    .map(|layer| CodingState::new(layer > 0))
                    .collect()
            })
            .collect();

        self.cursor = Some(SdeCursor::new(&header)?);
        self.scanner = MarkerScanner::new();
        self.stripe_data.clear();
        self.in_stripe = false;
        self.at_moves.clear();
        self.header = Some(header);
        self.dmax = dmax;
        Ok(true)
    }

    fn append_stripe_data(&mut self, bytes: &[u8]) -> Result<(), JbigError> {
        let cursor = self.cursor.as_ref().ok_or(JbigError::InvalidOperation)?;
        if cursor.is_done() {
            return Err(JbigError::UnexpectedMarker);
        }
        self.in_stripe = true;
        if cursor.layer() <= self.dmax {
            self.stripe_data
                .try_reserve(bytes.len())
                .map_err(|_| JbigError::NotEnoughMemory)?;
            self.stripe_data.extend_from_slice(bytes);
        }
        Ok(())
    }

    fn on_marker(&mut self, segment: MarkerSegment) -> Result<Option<DecodeStatus>, JbigError> {
        match segment {
            MarkerSegment::StripeNormal => self.finish_stripe(false)?,
            MarkerSegment::StripeReset => self.finish_stripe(true)?,
            MarkerSegment::Abort => {
                debug!("ABORT marker");
                self.state = DecoderState::Interrupted;
                return Ok(Some(DecodeStatus::Interrupted));
            }
            MarkerSegment::NewLength(yd) => {
                if self.in_stripe {
                    return Err(JbigError::UnexpectedMarker);
                }
                self.apply_new_length(yd)?;
            }
            MarkerSegment::AtMove { yat, tx, ty } => {
                self.add_at_move(yat, tx, ty)?;
                return Ok(None);
            }
            MarkerSegment::Comment(length) => {
                debug!("skipping {length} byte comment");
                return Ok(None);
            }
            MarkerSegment::Unknown(code) => {
                debug!("unknown marker {code:#04x}");
                return Err(JbigError::UnknownMarker);
            }
        }
        Ok(self.progress())
    }

    fn add_at_move(&mut self, yat: u32, tx: u8, ty: u8) -> Result<(), JbigError> {
        let header = self.header.as_ref().ok_or(JbigError::InvalidOperation)?;
        let cursor = self.cursor.as_ref().ok_or(JbigError::InvalidOperation)?;
        if self.in_stripe || cursor.is_done() {
            return Err(JbigError::UnexpectedMarker);
        }
        if ty != 0 || (tx != 0 && (tx < MINIMUM_AT_OFFSET || tx > header.mx)) {
            return Err(JbigError::InvalidAtMove);
        }
        let rows = header.stripe_rows(cursor.stripe(), cursor.layer());
        if yat >= rows.end - rows.start
            || self.at_moves.len() >= MAXIMUM_AT_MOVES
            || self.at_moves.last().is_some_and(|last| yat <= last.row)
        {
            return Err(JbigError::InvalidAtMove);
        }
        debug!("ATMOVE at row {yat} of the stripe to tx {tx}");
        self.at_moves.push(AtMove { row: yat, tx });
        Ok(())
    }

    /// Shrinks the image height after a NEWLEN marker.
    fn apply_new_length(&mut self, yd: u32) -> Result<(), JbigError> {
        let header = self.header.as_mut().ok_or(JbigError::InvalidOperation)?;
        if !header.options.contains(Options::VLENGTH) || yd == 0 || yd > header.yd {
            return Err(JbigError::InvalidNewLength);
        }
        debug!("NEWLEN: height {} -> {yd}", header.yd);
        header.yd = yd;
        for layers in &mut self.bitmaps {
            for layer in header.dl..=self.dmax {
                let height = header.layer_height(layer);
                let bitmap = &mut layers[layer as usize];
                if bitmap.height() > height {
                    bitmap.resize(height)?;
                }
            }
        }
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.set_stripes(header.stripes());
        }
        Ok(())
    }

    /// Decodes the collected PSCD when an SDNORM or SDRST ends the current SDE.
    fn finish_stripe(&mut self, reset: bool) -> Result<(), JbigError> {
        let header = self.header.ok_or(JbigError::InvalidOperation)?;
        let cursor = self.cursor.as_mut().ok_or(JbigError::InvalidOperation)?;
        if cursor.is_done() {
            return Err(JbigError::UnexpectedMarker);
        }
        let (stripe, layer, plane) = (cursor.stripe(), cursor.layer(), cursor.plane());

        if layer <= self.dmax {
            let rows = header.stripe_rows(stripe, layer);
            let (lower, upper) = self.bitmaps[plane as usize].split_at_mut(layer as usize);
            let dp_on = header.options.contains(Options::DPON);
            let params = StripeParams {
                rows: rows.clone(),
                width: header.layer_width(layer),
                options: header.options,
                at_moves: &self.at_moves,
                lower: lower.last().filter(|_| layer > 0),
                dp_table: self.dp_table.as_ref().filter(|_| dp_on),
            };
            let state = &mut self.coding[plane as usize][(layer - header.dl) as usize];
            decode_stripe(&self.stripe_data, &params, state, &mut upper[0])?;
            if reset {
                state.reset(rows.end);
            }
            trace!("SDE stripe {stripe} layer {layer} plane {plane} decoded");
        } else {
            trace!("SDE stripe {stripe} layer {layer} plane {plane} skipped");
        }

        self.stripe_data.clear();
        self.in_stripe = false;
        self.at_moves.clear();
        cursor.advance();
        Ok(())
    }

    /// Checks whether the SDEs that are decoded are all done.
    fn progress(&mut self) -> Option<DecodeStatus> {
        let header = self.header.as_ref()?;
        let cursor = self.cursor.as_ref()?;
        if cursor.reaches_layer(self.dmax) {
            return None;
        }
        if self.dmax < header.d {
            debug!("layer {} complete, stopping", self.dmax);
            self.state = DecoderState::Interrupted;
            Some(DecodeStatus::Interrupted)
        } else {
            debug!("BIE complete");
            self.state = DecoderState::Trailer;
            Some(DecodeStatus::Complete)
        }
    }

    /// Checks that the input did not end inside a marker segment.
    ///
    /// Call once all input has been fed.
    pub fn finish(&self) -> Result<(), JbigError> {
        if self.state == DecoderState::Failed {
            return Err(JbigError::InvalidOperation);
        }
        self.scanner.finish()
    }

    /// Header of the BIE most recently started.
    pub fn header(&self) -> Option<&BitmapHeader> {
        self.header.as_ref()
    }

    /// Highest layer that holds decoded rows.
    fn image_layer(&self) -> Option<u8> {
        let header = self.header.as_ref()?;
        let decoded = (0..=self.dmax).rev().find(|&layer| {
            self.bitmaps
                .iter()
                .any(|layers| layers.get(layer as usize).is_some_and(|b| b.height() > 0))
        });
        Some(decoded.unwrap_or(header.dl))
    }

    /// Width of the decoded image, 0 before a header was read.
    pub fn width(&self) -> u32 {
        match (self.header.as_ref(), self.image_layer()) {
            (Some(header), Some(layer)) => header.layer_width(layer),
            _ => 0,
        }
    }

    /// Height of the decoded image, 0 before a header was read.
    pub fn height(&self) -> u32 {
        match (self.header.as_ref(), self.image_layer()) {
            (Some(header), Some(layer)) => header.layer_height(layer),
            _ => 0,
        }
    }

    pub fn planes(&self) -> u8 {
        self.header.as_ref().map_or(0, |header| header.planes)
    }

    /// Bytes of one decoded plane.
    pub fn image_size(&self) -> usize {
        (self.width() as usize).div_ceil(8) * self.height() as usize
    }

    /// Copy of one decoded plane; rows that were never decoded are white.
    pub fn plane_bitmap(&self, plane: u8) -> Result<Bitmap, JbigError> {
        let layer = self.image_layer().ok_or(JbigError::InvalidOperation)?;
        if plane >= self.planes() {
            return Err(JbigError::PlaneOutOfRange);
        }
        let mut bitmap = self.bitmaps[plane as usize][layer as usize].clone();
        bitmap.resize(self.height())?;
        Ok(bitmap)
    }

    /// Takes the decoded planes of the highest decoded layer.
    pub fn into_image(mut self) -> Result<DecodedImage, JbigError> {
        let layer = self.image_layer().ok_or(JbigError::InvalidOperation)? as usize;
        let (width, height) = (self.width(), self.height());
        let planes = self
            .bitmaps
            .iter_mut()
            .map(|layers| {
                let mut bitmap = std::mem::replace(&mut layers[layer], Bitmap::new(width));
                bitmap.resize(height)?;
                Ok(bitmap.into_bytes())
            })
            .collect::<Result<Vec<_>, JbigError>>()?;
        Ok(DecodedImage {
            width,
            height,
            planes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap_header::Order;
    use crate::encoder::{EncoderOptions, JbigEncoder, LayerSelection};

    fn header(xd: u32, yd: u32, options: Options) -> BitmapHeader {
        BitmapHeader {
            dl: 0,
            d: 0,
            planes: 1,
            fill: 0,
            xd,
            yd,
            l0: 8,
            mx: 8,
            my: 0,
            order: Order::empty(),
            options,
        }
    }

    /// An all white, 16 pixel wide image in stripes of eight lines, coded
    /// without typical prediction as jbigkit writes it: the first SDE holds
    /// 128 white pixels of context 0, the later ones stay empty.
    fn white_bie(header: &BitmapHeader) -> Vec<u8> {
        assert_eq!((header.xd, header.l0), (16, 8));
        let mut bie = header.to_bytes().to_vec();
        bie.push(0x4c);
        for _ in 0..header.stripes() {
            bie.extend_from_slice(&[0xff, 0x02]);
        }
        bie
    }

    #[test]
    fn test_header_in_pieces() {
        let bie = white_bie(&header(16, 16, Options::empty()));
        let mut decoder = JbigDecoder::new();
        assert_eq!(decoder.feed(&bie[..7]).unwrap(), (7, DecodeStatus::NeedMoreData));
        assert!(decoder.header().is_none());
        assert_eq!(decoder.feed(&bie[7..]).unwrap(), (bie.len() - 7, DecodeStatus::Complete));
        assert_eq!((decoder.width(), decoder.height(), decoder.planes()), (16, 16, 1));
        assert_eq!(decoder.image_size(), 32);
        let image = decoder.into_image().unwrap();
        assert!(image.planes[0].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_private_dp_table_is_read() {
        let header = header(16, 8, Options::DPON | Options::DPPRIV);
        let table = DpTable::from_bytes(&[0x55; 1728]).unwrap();
        let mut bie = header.to_bytes().to_vec();
        bie.extend_from_slice(table.as_bytes());
        bie.extend_from_slice(&[0x4c, 0xff, 0x02]);
        let mut decoder = JbigDecoder::new();
        assert_eq!(decoder.feed(&bie[..100]).unwrap(), (100, DecodeStatus::NeedMoreData));
        assert_eq!(
            decoder.feed(&bie[100..]).unwrap(),
            (bie.len() - 100, DecodeStatus::Complete)
        );
        assert_eq!(decoder.dp_table, Some(table));
    }

    #[test]
    fn test_dplast_needs_an_earlier_table() {
        let dplast = header(16, 8, Options::DPON | Options::DPPRIV | Options::DPLAST);
        let mut decoder = JbigDecoder::new();
        assert_eq!(
            decoder.feed(&dplast.to_bytes()),
            Err(JbigError::MissingDpTable)
        );

        let mut decoder = JbigDecoder::new();
        let plain = white_bie(&header(16, 8, Options::DPON));
        assert_eq!(decoder.feed(&plain).unwrap().1, DecodeStatus::Complete);
        assert_eq!(decoder.dp_table, Some(DpTable::default()));
    }

    #[test]
    fn test_error_makes_decoder_unusable() {
        let mut bytes = header(16, 16, Options::empty()).to_bytes();
        bytes[3] = 1;
        let mut decoder = JbigDecoder::new();
        assert_eq!(decoder.feed(&bytes), Err(JbigError::InvalidHeader));
        assert_eq!(decoder.feed(&bytes), Err(JbigError::InvalidOperation));
    }

    #[test]
    fn test_abort_interrupts() {
        let mut bie = header(16, 16, Options::empty()).to_bytes().to_vec();
        bie.extend_from_slice(&[0xff, 0x04, 0x12]);
        let mut decoder = JbigDecoder::new();
        assert_eq!(decoder.feed(&bie).unwrap(), (22, DecodeStatus::Interrupted));
        assert_eq!(decoder.feed(&bie[22..]).unwrap(), (0, DecodeStatus::Interrupted));
    }

    #[test]
    fn test_size_limit_on_single_layer() {
        let bie = white_bie(&header(16, 16, Options::empty()));
        let mut decoder = JbigDecoder::new();
        decoder.set_max_size(8, 100);
        assert_eq!(decoder.feed(&bie), Err(JbigError::LimitExceeded));
    }

    #[test]
    fn test_unknown_marker() {
        let mut bie = header(16, 16, Options::empty()).to_bytes().to_vec();
        bie.extend_from_slice(&[0x00, 0xff, 0x09]);
        let mut decoder = JbigDecoder::new();
        assert_eq!(decoder.feed(&bie), Err(JbigError::UnknownMarker));
    }

    #[test]
    fn test_newlen_requires_vlength() {
        let mut bie = white_bie(&header(16, 16, Options::empty()));
        bie.extend_from_slice(&[0xff, 0x05, 0, 0, 0, 10]);
        let mut decoder = JbigDecoder::new();
        assert_eq!(decoder.feed(&bie), Err(JbigError::InvalidNewLength));
    }

    #[test]
    fn test_trailing_newlen_shrinks_image() {
        let mut bie = white_bie(&header(16, 30, Options::VLENGTH));
        bie.truncate(BIH_SIZE + 3);
        bie.extend_from_slice(&[0xff, 0x05, 0, 0, 0, 6]);
        let mut decoder = JbigDecoder::new();
        let (used, status) = decoder.feed(&bie).unwrap();
        assert_eq!((used, status), (bie.len(), DecodeStatus::Complete));
        assert_eq!(decoder.height(), 6);
        assert_eq!(decoder.into_image().unwrap().planes[0].len(), 12);
    }

    #[test]
    fn test_at_move_validation() {
        let base = header(16, 16, Options::empty()).to_bytes().to_vec();
        for (payload, expected) in [
            ([0, 0, 0, 1, 2, 0], JbigError::InvalidAtMove),
            ([0, 0, 0, 1, 9, 0], JbigError::InvalidAtMove),
            ([0, 0, 0, 1, 4, 1], JbigError::InvalidAtMove),
            ([0, 0, 0, 8, 4, 0], JbigError::InvalidAtMove),
        ] {
            let mut bie = base.clone();
            bie.extend_from_slice(&[0xff, 0x06]);
            bie.extend_from_slice(&payload);
            let mut decoder = JbigDecoder::new();
            assert_eq!(decoder.feed(&bie), Err(expected));
        }

        let mut bie = base.clone();
        bie.extend_from_slice(&[0xff, 0x06, 0, 0, 0, 3, 5, 0, 0xff, 0x02, 0xff, 0x02]);
        let mut decoder = JbigDecoder::new();
        assert_eq!(decoder.feed(&bie).unwrap().1, DecodeStatus::Complete);
    }

    #[test]
    fn test_marker_inside_stripe_data() {
        let mut bie = header(16, 16, Options::VLENGTH).to_bytes().to_vec();
        bie.extend_from_slice(&[0x12, 0xff, 0x05, 0, 0, 0, 4]);
        let mut decoder = JbigDecoder::new();
        assert_eq!(decoder.feed(&bie), Err(JbigError::UnexpectedMarker));
    }

    #[test]
    fn test_continuation_must_follow_layers() {
        let bie = white_bie(&header(16, 16, Options::empty()));
        let mut decoder = JbigDecoder::new();
        assert_eq!(decoder.feed(&bie).unwrap().1, DecodeStatus::Complete);

        let mut next = header(32, 32, Options::empty());
        next.dl = 2;
        next.d = 2;
        assert_eq!(
            decoder.feed(&next.to_bytes()),
            Err(JbigError::InconsistentLayers)
        );
    }

    #[test]
    fn test_continuation_after_higher_layers() {
        let options = EncoderOptions {
            layers: LayerSelection::Count(2),
            ..EncoderOptions::default()
        };
        let image = Bitmap::with_size(16, 16).unwrap();
        let bie = JbigEncoder::new(16, 16, vec![image], options)
            .unwrap()
            .encode_to_vec()
            .unwrap();
        let mut decoder = JbigDecoder::new();
        assert_eq!(decoder.feed(&bie).unwrap(), (bie.len(), DecodeStatus::Complete));

        // Layers 0..=0 cannot follow a BIE that ended at layer 2.
        let next = header(16, 16, Options::empty());
        assert_eq!(
            decoder.feed(&next.to_bytes()),
            Err(JbigError::InconsistentLayers)
        );
    }

    #[test]
    fn test_finish_reports_truncated_marker() {
        let bie = white_bie(&header(16, 16, Options::empty()));
        let mut decoder = JbigDecoder::new();
        let cut = bie.len() - 1;
        assert_eq!(decoder.feed(&bie[..cut]).unwrap(), (cut, DecodeStatus::NeedMoreData));
        assert_eq!(decoder.finish(), Err(JbigError::TruncatedMarker));
        decoder.feed(&bie[cut..]).unwrap();
        assert_eq!(decoder.finish(), Ok(()));
    }
}
