//! Sequential and progressive JBIG encoder producing one BIE.

use std::io::Write;

use log::{debug, trace};

use crate::arithmetic_coder::ArithmeticEncoder;
use crate::bitmap_header::{BitmapHeader, Options, Order, SdeCursor, ceil_half};
use crate::constants::{
    MARKER_ESC, MAXIMUM_AT_MOVES, MAXIMUM_AT_OFFSET, MAXIMUM_LAYER, MINIMUM_AT_OFFSET,
};
use crate::deterministic_prediction::DpTable;
use crate::error::JbigError;
use crate::jbig_marker_code::MarkerCode;
use crate::resolution_reduction::reduce_resolution;
use crate::stripe_encoder::encode_stripe;
use crate::template::{AtMove, Bitmap, CodingState, StripeParams};

/// Upper bound for the automatically chosen number of differential layers.
const MAXIMUM_AUTO_LAYERS: u8 = 6;

/// How the number of differential layers is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSelection {
    /// Exactly this many differential layers.
    Count(u8),
    /// As few layers as needed for the lowest layer to fit the given size.
    LowestLayerMax { width: u32, height: u32 },
}

/// ATMOVE written in front of the SDE at (`stripe`, `layer`, `plane`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedAtMove {
    pub stripe: u32,
    pub layer: u8,
    pub plane: u8,
    pub at: AtMove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderOptions {
    pub order: Order,
    pub options: Options,
    /// Lines per stripe in layer 0; derived from the image height when `None`.
    pub l0: Option<u32>,
    pub mx: u8,
    pub layers: LayerSelection,
    /// Lowest layer written to the BIE.
    pub lowest_layer: Option<u8>,
    /// Highest layer written to the BIE.
    pub highest_layer: Option<u8>,
    pub at_moves: Vec<PlannedAtMove>,
    /// Terminate every SDE with SDRST instead of SDNORM.
    pub reset_stripes: bool,
    pub comment: Option<Vec<u8>>,
    /// Larger height announced in the BIH and corrected by NEWLEN.
    pub announced_height: Option<u32>,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            order: Order::ILEAVE | Order::SMID,
            options: Options::TPDON | Options::TPBON | Options::DPON,
            l0: None,
            mx: 8,
            layers: LayerSelection::LowestLayerMax {
                width: 640,
                height: 480,
            },
            lowest_layer: None,
            highest_layer: None,
            at_moves: Vec::new(),
            reset_stripes: false,
            comment: None,
            announced_height: None,
        }
    }
}

/// Stripe height giving about 35 stripes, at most 128 lines per stripe at the top layer.
pub fn default_l0(height: u32, d: u8) -> u32 {
    let mut l0 = ceil_half(height, d as u32) / 35;
    while l0 > 0 && ((l0 as u64) << d) > 128 {
        l0 -= 1;
    }
    l0.max(2)
}

/// Writes the byte level structures of a BIE to a sink.
struct BieWriter<'a, W: Write> {
    sink: &'a mut W,
    written: usize,
}

impl<'a, W: Write> BieWriter<'a, W> {
    fn new(sink: &'a mut W) -> Self {
        Self { sink, written: 0 }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), JbigError> {
        self.sink
            .write_all(bytes)
            .map_err(|_| JbigError::CallbackFailed)?;
        self.written += bytes.len();
        Ok(())
    }

    fn write_byte(&mut self, value: u8) -> Result<(), JbigError> {
        self.write_bytes(&[value])
    }

    fn write_u32(&mut self, value: u32) -> Result<(), JbigError> {
        self.write_bytes(&value.to_be_bytes())
    }

    fn write_marker(&mut self, marker: MarkerCode) -> Result<(), JbigError> {
        self.write_byte(MARKER_ESC)?;
        self.write_byte(marker.into())
    }

    fn write_at_move(&mut self, at: &AtMove) -> Result<(), JbigError> {
        self.write_marker(MarkerCode::AtMove)?;
        self.write_u32(at.row)?;
        self.write_byte(at.tx)?;
        self.write_byte(0)
    }

    fn write_new_length(&mut self, yd: u32) -> Result<(), JbigError> {
        self.write_marker(MarkerCode::NewLength)?;
        self.write_u32(yd)
    }

    fn write_comment(&mut self, comment: &[u8]) -> Result<(), JbigError> {
        let length = u32::try_from(comment.len()).map_err(|_| JbigError::InvalidArgumentSize)?;
        self.write_marker(MarkerCode::Comment)?;
        self.write_u32(length)?;
        self.write_bytes(comment)
    }
}

/// Layer and header selection resolved from [`EncoderOptions`].
#[derive(Debug, Clone, Copy)]
struct LayerPlan {
    /// Total number of differential layers of the full image.
    d: u8,
    /// Header of the BIE as encoded.
    header: BitmapHeader,
    /// Header as written, with the announced height.
    written: BitmapHeader,
}

pub struct JbigEncoder {
    width: u32,
    height: u32,
    planes: Vec<Bitmap>,
    options: EncoderOptions,
}

impl JbigEncoder {
    /// Takes the bit planes of the image, most significant first.
    pub fn new(
        width: u32,
        height: u32,
        planes: Vec<Bitmap>,
        options: EncoderOptions,
    ) -> Result<Self, JbigError> {
        if width == 0 {
            return Err(JbigError::InvalidArgumentWidth);
        }
        if height == 0 {
            return Err(JbigError::InvalidArgumentHeight);
        }
        if planes.is_empty() || planes.len() > u8::MAX as usize {
            return Err(JbigError::InvalidArgumentPlaneCount);
        }
        if planes
            .iter()
            .any(|plane| plane.width() != width || plane.height() != height)
        {
            return Err(JbigError::InvalidArgumentSize);
        }
        if options.mx > MAXIMUM_AT_OFFSET {
            return Err(JbigError::InvalidArgument);
        }
        if options.l0 == Some(0) {
            return Err(JbigError::InvalidArgumentStripeHeight);
        }
        if let LayerSelection::Count(d) = options.layers
            && d > MAXIMUM_LAYER
        {
            return Err(JbigError::InvalidArgumentLayers);
        }
        Ok(Self {
            width,
            height,
            planes,
            options,
        })
    }

    fn plan(&self) -> Result<LayerPlan, JbigError> {
        let options = &self.options;
        let d = match options.layers {
            LayerSelection::Count(d) => d,
            LayerSelection::LowestLayerMax { width, height } => (0..MAXIMUM_AUTO_LAYERS)
                .find(|&d| {
                    ceil_half(self.width, d as u32) <= width
                        && ceil_half(self.height, d as u32) <= height
                })
                .unwrap_or(MAXIMUM_AUTO_LAYERS),
        };
        let dh = options.highest_layer.filter(|&dh| dh <= d).unwrap_or(d);
        let dl = options.lowest_layer.filter(|&dl| dl <= dh).unwrap_or(0);
        let l0 = options.l0.unwrap_or_else(|| default_l0(self.height, d));
        let shift = (d - dh) as u32;

        let header = BitmapHeader {
            dl,
            d: dh,
            planes: self.planes.len() as u8,
            fill: 0,
            xd: ceil_half(self.width, shift),
            yd: ceil_half(self.height, shift),
            l0,
            mx: options.mx,
            my: 0,
            order: options.order,
            options: options.options,
        };
        header.validate()?;

        let mut written = header;
        if let Some(announced) = options.announced_height {
            if announced < self.height {
                return Err(JbigError::InvalidArgumentHeight);
            }
            written.yd = ceil_half(announced, shift);
            written.options |= Options::VLENGTH;
        }
        Ok(LayerPlan { d, header, written })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Header of the BIE as it will be written.
    pub fn header(&self) -> Result<BitmapHeader, JbigError> {
        Ok(self.plan()?.written)
    }

    /// Number of differential layers of the full resolution image.
    pub fn differential_layers(&self) -> Result<u8, JbigError> {
        Ok(self.plan()?.d)
    }

    /// Resolution layers `0..=dh` of one plane, built by repeated halving.
    fn pyramid(&self, plane: &Bitmap, plan: &LayerPlan) -> Result<Vec<Bitmap>, JbigError> {
        let mut layers = vec![plane.clone()];
        for layer in (0..plan.d).rev() {
            let next = reduce_resolution(
                &layers[layers.len() - 1],
                plan.header.stripe_height(layer),
                self.options.reset_stripes,
            )?;
            layers.push(next);
        }
        layers.reverse();
        layers.truncate(plan.header.d as usize + 1);
        Ok(layers)
    }

    fn at_moves_for(
        &self,
        header: &BitmapHeader,
        stripe: u32,
        layer: u8,
        plane: u8,
    ) -> Result<Vec<AtMove>, JbigError> {
        let mut moves: Vec<AtMove> = self
            .options
            .at_moves
            .iter()
            .filter(|m| (m.stripe, m.layer, m.plane) == (stripe, layer, plane))
            .map(|m| m.at)
            .collect();
        moves.sort_by_key(|at| at.row);

        let rows = header.stripe_rows(stripe, layer);
        let invalid = moves.len() > MAXIMUM_AT_MOVES
            || moves.windows(2).any(|pair| pair[0].row == pair[1].row)
            || moves.iter().any(|at| {
                at.row >= rows.end - rows.start
                    || (at.tx != 0 && (at.tx < MINIMUM_AT_OFFSET || at.tx > header.mx))
            });
        if invalid {
            return Err(JbigError::InvalidArgument);
        }
        Ok(moves)
    }

    /// Encodes the BIE into `sink` and returns the number of bytes written.
    pub fn encode<W: Write>(&self, sink: &mut W) -> Result<usize, JbigError> {
        let plan = self.plan()?;
        let header = plan.header;
        debug!(
            "encoding {}x{} with {} planes, layers {}..={} of {}, L0 {}",
            self.width, self.height, header.planes, header.dl, header.d, plan.d, header.l0
        );

        let pyramids = self
            .planes
            .iter()
            .map(|plane| self.pyramid(plane, &plan))
            .collect::<Result<Vec<_>, _>>()?;
        let mut states: Vec<Vec<CodingState>> = (0..header.planes)
            .map(|_| {
                (header.dl..=header.d)
                    .map(|layer| CodingState::new(layer > 0))
                    .collect()
            })
            .collect();

        // NEWLEN follows the first SDE unless that SDE changes with the height.
        let new_length = (plan.written.yd != header.yd).then_some(header.yd);
        let newlen_after_first = (header.dl..=header.d)
            .all(|layer| header.stripe_rows(0, layer) == plan.written.stripe_rows(0, layer));

        // Prediction always follows the standard table; DPPRIV transmits it.
        let dp_table = DpTable::default();
        let dp_on = header.options.contains(Options::DPON);

        let mut out = BieWriter::new(sink);
        out.write_bytes(&plan.written.to_bytes())?;
        if plan.written.has_dp_table() {
            out.write_bytes(dp_table.as_bytes())?;
        }
        if let Some(comment) = &self.options.comment {
            out.write_comment(comment)?;
        }
        if let Some(yd) = new_length.filter(|_| !newlen_after_first) {
            out.write_new_length(yd)?;
        }

        let mut coder = ArithmeticEncoder::new();
        for (index, (stripe, layer, plane)) in SdeCursor::new(&header)?.enumerate() {
            let at_moves = self.at_moves_for(&header, stripe, layer, plane)?;
            for at in &at_moves {
                out.write_at_move(at)?;
            }

            let layers = &pyramids[plane as usize];
            let rows = header.stripe_rows(stripe, layer);
            let params = StripeParams {
                rows: rows.clone(),
                width: header.layer_width(layer),
                options: header.options,
                at_moves: &at_moves,
                lower: (layer > 0).then(|| &layers[layer as usize - 1]),
                dp_table: dp_on.then_some(&dp_table),
            };
            let state = &mut states[plane as usize][(layer - header.dl) as usize];
            let pscd = encode_stripe(&mut coder, &params, state, &layers[layer as usize]);
            out.write_bytes(&pscd)?;

            if self.options.reset_stripes {
                out.write_marker(MarkerCode::StripeReset)?;
                state.reset(rows.end);
            } else {
                out.write_marker(MarkerCode::StripeNormal)?;
            }
            trace!("SDE {index}: stripe {stripe} layer {layer} plane {plane}");

            if index == 0
                && let Some(yd) = new_length.filter(|_| newlen_after_first)
            {
                out.write_new_length(yd)?;
            }
        }
        debug!("BIE has {} bytes", out.written);
        Ok(out.written)
    }

    pub fn encode_to_vec(&self) -> Result<Vec<u8>, JbigError> {
        let mut bie = Vec::new();
        self.encode(&mut bie)?;
        Ok(bie)
    }
}
