use log::trace;

use crate::arithmetic_coder::ArithmeticDecoder;
use crate::bitmap_header::Options;
use crate::constants::TPDCX;
use crate::error::JbigError;
use crate::template::{
    Bitmap, CodingState, HighView, LowView, StripeParams, differential_context,
    lowest_layer_context, tpb_context,
};

/// Decodes the PSCD of one SDE into the rows `params.rows` of `bitmap`.
///
/// `bitmap` grows row by row; rows it already holds are overwritten.
pub fn decode_stripe(
    pscd: &[u8],
    params: &StripeParams,
    state: &mut CodingState,
    bitmap: &mut Bitmap,
) -> Result<(), JbigError> {
    trace!(
        "decoding rows {:?} from {} PSCD bytes",
        params.rows,
        pscd.len()
    );
    let mut decoder = ArithmeticDecoder::new(pscd);
    match params.lower {
        None => decode_lowest(&mut decoder, params, state, bitmap),
        Some(lower) => decode_differential(&mut decoder, params, lower, state, bitmap),
    }
}

fn prepare_row(bitmap: &mut Bitmap, y: u32) -> Result<(), JbigError> {
    while bitmap.height() <= y {
        bitmap.push_row()?;
    }
    bitmap.copy_row(None, y);
    Ok(())
}

fn decode_lowest(
    decoder: &mut ArithmeticDecoder,
    params: &StripeParams,
    state: &mut CodingState,
    bitmap: &mut Bitmap,
) -> Result<(), JbigError> {
    let two_line = params.options.contains(Options::LRLTWO);
    let typical_prediction = params.options.contains(Options::TPBON);
    let tp_context = tpb_context(params.options);

    for y in params.rows.clone() {
        prepare_row(bitmap, y)?;
        state.apply_at_moves(params.at_moves, y - params.rows.start);

        if typical_prediction {
            state.lntp ^= decoder.decode(&mut state.contexts[tp_context]) ^ 1;
            if state.lntp == 0 {
                bitmap.copy_row(state.previous_row(y), y);
                continue;
            }
        }

        for x in 0..params.width {
            let view = HighView {
                bitmap: &*bitmap,
                top: state.reset_row,
            };
            let cx = lowest_layer_context(&view, x, y, state.at_x, two_line);
            if decoder.decode(&mut state.contexts[cx]) != 0 {
                bitmap.set_pixel(x, y, 1);
            }
        }
    }
    Ok(())
}

fn decode_differential(
    decoder: &mut ArithmeticDecoder,
    params: &StripeParams,
    lower: &Bitmap,
    state: &mut CodingState,
    bitmap: &mut Bitmap,
) -> Result<(), JbigError> {
    let typical_prediction = params.options.contains(Options::TPDON);
    let low = LowView::for_stripe(lower, state.reset_row, params.rows.end);

    for y in params.rows.clone() {
        prepare_row(bitmap, y)?;
        state.apply_at_moves(params.at_moves, y - params.rows.start);

        if typical_prediction && y & 1 == 0 {
            state.lntp = decoder.decode(&mut state.contexts[TPDCX]);
        }

        for x in 0..params.width {
            if typical_prediction && state.lntp == 0 {
                if let Some(colour) = low.uniform_neighbourhood(x >> 1, y >> 1) {
                    bitmap.set_pixel(x, y, colour);
                    continue;
                }
            }

            let view = HighView {
                bitmap: &*bitmap,
                top: state.reset_row,
            };
            let pixel = match params.dp_table.and_then(|dp| dp.predict(&view, &low, x, y)) {
                Some(pixel) => pixel,
                None => {
                    let cx = differential_context(&view, &low, x, y, state.at_x);
                    decoder.decode(&mut state.contexts[cx])
                }
            };
            if pixel != 0 {
                bitmap.set_pixel(x, y, 1);
            }
        }
    }
    Ok(())
}
