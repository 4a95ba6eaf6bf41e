use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::constants::{ATMOVE_PAYLOAD_SIZE, COMMENT_LENGTH_SIZE, NEWLEN_PAYLOAD_SIZE};

/// Second byte of an escape sequence in the BID (ITU-T T.82, 6.2.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum MarkerCode {
    /// STUFF: a literal 0xFF inside PSCD.
    Stuff = 0x00,

    /// RESERVE: reserved for future use.
    Reserve = 0x01,

    /// SDNORM: normal end of a stripe data entity.
    StripeNormal = 0x02,

    /// SDRST: end of a stripe data entity, coder state is reset afterwards.
    StripeReset = 0x03,

    /// ABORT: the encoder gave up, the BIE ends here.
    Abort = 0x04,

    /// NEWLEN: replaces the image height YD announced in the BIH.
    NewLength = 0x05,

    /// ATMOVE: moves the adaptive template pixel.
    AtMove = 0x06,

    /// COMMENT: private data that decoders skip.
    Comment = 0x07,
}

impl MarkerCode {
    /// Number of fixed payload bytes following the two marker bytes.
    ///
    /// COMMENT reports only its length field; the comment body follows it.
    pub fn payload_len(self) -> usize {
        match self {
            Self::NewLength => NEWLEN_PAYLOAD_SIZE,
            Self::AtMove => ATMOVE_PAYLOAD_SIZE,
            Self::Comment => COMMENT_LENGTH_SIZE,
            _ => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Stuff => "STUFF",
            Self::Reserve => "RESERVE",
            Self::StripeNormal => "SDNORM",
            Self::StripeReset => "SDRST",
            Self::Abort => "ABORT",
            Self::NewLength => "NEWLEN",
            Self::AtMove => "ATMOVE",
            Self::Comment => "COMMENT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_from_byte() {
        assert_eq!(MarkerCode::try_from(0x02).unwrap(), MarkerCode::StripeNormal);
        assert_eq!(MarkerCode::try_from(0x07).unwrap(), MarkerCode::Comment);
        assert!(MarkerCode::try_from(0x08).is_err());
        assert_eq!(u8::from(MarkerCode::AtMove), 0x06);
    }

    #[test]
    fn test_payload_len() {
        assert_eq!(MarkerCode::StripeNormal.payload_len(), 0);
        assert_eq!(MarkerCode::NewLength.payload_len(), 4);
        assert_eq!(MarkerCode::AtMove.payload_len(), 6);
        assert_eq!(MarkerCode::Comment.payload_len(), 4);
    }
}
