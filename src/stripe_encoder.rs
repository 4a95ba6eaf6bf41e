use log::trace;

use crate::arithmetic_coder::ArithmeticEncoder;
use crate::bitmap_header::Options;
use crate::constants::TPDCX;
use crate::template::{
    Bitmap, CodingState, HighView, LowView, StripeParams, differential_context,
    lowest_layer_context, tpb_context,
};

/// Encodes the rows `params.rows` of `bitmap` and returns the flushed PSCD.
///
/// The result still needs its SDNORM or SDRST terminator.
pub fn encode_stripe(
    encoder: &mut ArithmeticEncoder,
    params: &StripeParams,
    state: &mut CodingState,
    bitmap: &Bitmap,
) -> Vec<u8> {
    match params.lower {
        None => encode_lowest(encoder, params, state, bitmap),
        Some(lower) => encode_differential(encoder, params, lower, state, bitmap),
    }
    let pscd = encoder.flush();
    trace!("encoded rows {:?} into {} PSCD bytes", params.rows, pscd.len());
    pscd
}

fn encode_lowest(
    encoder: &mut ArithmeticEncoder,
    params: &StripeParams,
    state: &mut CodingState,
    bitmap: &Bitmap,
) {
    let two_line = params.options.contains(Options::LRLTWO);
    let typical_prediction = params.options.contains(Options::TPBON);
    let tp_context = tpb_context(params.options);
    let view = HighView {
        bitmap,
        top: state.reset_row,
    };

    for y in params.rows.clone() {
        state.apply_at_moves(params.at_moves, y - params.rows.start);

        if typical_prediction {
            let lntp = !bitmap.row_equals(y, state.previous_row(y)) as u8;
            encoder.encode(&mut state.contexts[tp_context], lntp ^ state.lntp ^ 1);
            state.lntp = lntp;
            if lntp == 0 {
                continue;
            }
        }

        for x in 0..params.width {
            let cx = lowest_layer_context(&view, x, y, state.at_x, two_line);
            encoder.encode(&mut state.contexts[cx], bitmap.pixel(x as i64, y as i64));
        }
    }
}

/// True when every pixel of the line pair starting at `y` that lies on a uniform
/// low resolution neighbourhood has the colour of that neighbourhood.
///
/// Pixels right of the image count as white; a last single line is checked alone.
fn pair_is_typical(bitmap: &Bitmap, low: &LowView, y: u32, rows_end: u32) -> bool {
    let rows = if y + 1 < rows_end { y..y + 2 } else { y..y + 1 };
    (0..low.bitmap.width()).all(|lx| match low.uniform_neighbourhood(lx, y >> 1) {
        None => true,
        Some(colour) => rows.clone().all(|row| {
            bitmap.pixel(2 * lx as i64, row as i64) == colour
                && bitmap.pixel(2 * lx as i64 + 1, row as i64) == colour
        }),
    })
}

fn encode_differential(
    encoder: &mut ArithmeticEncoder,
    params: &StripeParams,
    lower: &Bitmap,
    state: &mut CodingState,
    bitmap: &Bitmap,
) {
    let typical_prediction = params.options.contains(Options::TPDON);
    let low = LowView::for_stripe(lower, state.reset_row, params.rows.end);
    let view = HighView {
        bitmap,
        top: state.reset_row,
    };

    for y in params.rows.clone() {
        state.apply_at_moves(params.at_moves, y - params.rows.start);

        if typical_prediction && y & 1 == 0 {
            state.lntp = !pair_is_typical(bitmap, &low, y, params.rows.end) as u8;
            encoder.encode(&mut state.contexts[TPDCX], state.lntp);
        }

        for x in 0..params.width {
            if typical_prediction
                && state.lntp == 0
                && low.uniform_neighbourhood(x >> 1, y >> 1).is_some()
            {
                continue;
            }
            if params
                .dp_table
                .is_some_and(|dp| dp.predict(&view, &low, x, y).is_some())
            {
                continue;
            }
            let cx = differential_context(&view, &low, x, y, state.at_x);
            encoder.encode(&mut state.contexts[cx], bitmap.pixel(x as i64, y as i64));
        }
    }
}
