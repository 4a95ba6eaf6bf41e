pub mod constants;
pub mod error;

pub use bitmap_header::{BitmapHeader, Options, Order};
pub use decoder::{DecodeStatus, JbigDecoder};
pub use deterministic_prediction::DpTable;
pub use encoder::{EncoderOptions, JbigEncoder, LayerSelection, PlannedAtMove};
pub use error::JbigError;
pub use plane_merger::{DecodedImage, PlaneCoding, merge_planes, split_planes};
pub use template::{AtMove, Bitmap};

pub mod arithmetic_coder;
pub mod bitmap_header;
pub mod decoder;
pub mod deterministic_prediction;
pub mod diagnose;
pub mod encoder;
pub mod jbig_marker_code;
pub mod logger;
pub mod marker_scanner;
pub mod plane_merger;
pub mod pnm;
pub mod resolution_reduction;
pub mod stripe_decoder;
pub mod stripe_encoder;
pub mod template;
