use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JbigError {
    #[error("Not enough memory available")]
    NotEnoughMemory = 1,
    #[error("Output callback failed")]
    CallbackFailed = 2,
    #[error("Unexpected end of input data")]
    NeedMoreData = 4,

    // Header errors
    #[error("Input is shorter than the 20 byte bitmap header")]
    HeaderTooShort = 10,
    #[error("Input is too short to contain the 1728 byte DPTABLE")]
    DpTableTooShort = 11,
    #[error("Invalid parameter in bitmap header")]
    InvalidHeader = 12,
    #[error("Invalid combination of order bits")]
    InvalidOrder = 13,
    #[error("HITOLO layer order is not supported")]
    HighToLowNotSupported = 14,
    #[error("DPLAST refers to a DPTABLE that was never transmitted")]
    MissingDpTable = 16,

    // Marker segment errors
    #[error("Unknown marker segment encountered")]
    UnknownMarker = 20,
    #[error("Marker segment truncated by end of input")]
    TruncatedMarker = 21,
    #[error("Marker segment not allowed at this position")]
    UnexpectedMarker = 22,
    #[error("Invalid ATMOVE marker segment")]
    InvalidAtMove = 23,
    #[error("AT pixel with vertical offset is not supported")]
    VerticalAtNotSupported = 24,
    #[error("Invalid NEWLEN marker segment")]
    InvalidNewLength = 25,

    // Decoder errors
    #[error("Progressive BIE does not continue the previously decoded image")]
    InconsistentLayers = 30,
    #[error("Lowest resolution layer exceeds the maximum decode size")]
    LimitExceeded = 31,
    #[error("Image has too many planes to merge")]
    TooManyPlanes = 32,
    #[error("Plane index out of range")]
    PlaneOutOfRange = 33,

    // Logic errors
    #[error("Invalid operation")]
    InvalidOperation = 100,
    #[error("Invalid argument")]
    InvalidArgument = 101,
    #[error("Invalid argument width")]
    InvalidArgumentWidth = 102,
    #[error("Invalid argument height")]
    InvalidArgumentHeight = 103,
    #[error("Invalid argument plane count")]
    InvalidArgumentPlaneCount = 104,
    #[error("Invalid argument stripe height")]
    InvalidArgumentStripeHeight = 105,
    #[error("Invalid argument layers")]
    InvalidArgumentLayers = 106,
    #[error("Invalid argument size")]
    InvalidArgumentSize = 107,
}

impl JbigError {
    /// Numeric code of the error, stable across releases.
    pub fn code(self) -> i32 {
        self as i32
    }
}
