// Decoder and encoder validation against BIEs made by jbigkit.
//
// Every BIE under tests/jbigkit_test_images codes image.pbm (97 x 61). The
// file names give the parameters handed to jbigkit's encoder; the encoder
// tests rebuild each BIE with the same parameters and expect the same bytes.
// progressive_lowest.pbm is what jbigkit decodes from progressive.jbg when
// limited to 30 x 20 pixels.

#[cfg(test)]
mod jbigkit_validation {
    use std::fs;
    use std::process::Command;

    use jbig_rs::pnm::read_pnm;
    use jbig_rs::{
        Bitmap, DecodeStatus, EncoderOptions, JbigDecoder, JbigEncoder, LayerSelection, Options,
        Order, PlaneCoding,
    };

    const IMAGES: &str = "tests/jbigkit_test_images";

    fn read(name: &str) -> Vec<u8> {
        let path = format!("{IMAGES}/{name}");
        fs::read(&path).unwrap_or_else(|e| panic!("Failed to read {path}: {e}"))
    }

    fn read_bitmap(name: &str) -> Bitmap {
        read_pnm(&read(name))
            .unwrap()
            .into_planes(1, PlaneCoding::Gray)
            .unwrap()
            .remove(0)
    }

    fn decode(bie: &[u8], chunk: usize) -> JbigDecoder {
        let mut decoder = JbigDecoder::new();
        let mut status = DecodeStatus::NeedMoreData;
        for piece in bie.chunks(chunk) {
            let mut rest = piece;
            while !rest.is_empty() {
                let (used, next) = decoder.feed(rest).unwrap();
                rest = &rest[used..];
                status = next;
            }
        }
        assert_eq!(status, DecodeStatus::Complete);
        decoder.finish().unwrap();
        decoder
    }

    /// Decodes `name.jbg` and compares it with image.pbm.
    fn check_decode(name: &str) {
        let bie = read(&format!("{name}.jbg"));
        let expected = read_bitmap("image.pbm");
        let decoder = decode(&bie, bie.len());
        assert_eq!((decoder.width(), decoder.height()), (97, 61), "{name}");
        assert_eq!(decoder.plane_bitmap(0).unwrap(), expected, "{name}");
    }

    /// Encodes image.pbm and compares the BIE with `name.jbg`.
    fn check_encode(name: &str, options: EncoderOptions) {
        let bitmap = read_bitmap("image.pbm");
        let bie = JbigEncoder::new(97, 61, vec![bitmap], options)
            .unwrap()
            .encode_to_vec()
            .unwrap();
        let expected = read(&format!("{name}.jbg"));
        if let Some(offset) = bie.iter().zip(&expected).position(|(a, b)| a != b) {
            panic!("{name}: first difference at byte {offset}");
        }
        assert_eq!(bie.len(), expected.len(), "{name}");
    }

    fn options(layers: u8, order: Order, flags: Options, l0: u32) -> EncoderOptions {
        EncoderOptions {
            order,
            options: flags,
            l0: Some(l0),
            mx: 0,
            layers: LayerSelection::Count(layers),
            ..EncoderOptions::default()
        }
    }

    #[test]
    fn test_decode_sequential_lrltwo() {
        check_decode("sequential_lrltwo");
    }

    #[test]
    fn test_decode_sequential_sdrst() {
        check_decode("sequential_sdrst");
    }

    #[test]
    fn test_decode_sequential_seq() {
        check_decode("sequential_seq");
    }

    #[test]
    fn test_decode_sequential_mx8() {
        check_decode("sequential_mx8");
    }

    #[test]
    fn test_decode_progressive() {
        check_decode("progressive");
    }

    #[test]
    fn test_decode_progressive_dppriv() {
        check_decode("progressive_dppriv");
    }

    #[test]
    fn test_decode_progressive_sdrst() {
        check_decode("progressive_sdrst");
    }

    #[test]
    fn test_decode_byte_by_byte() {
        let bie = read("progressive_sdrst.jbg");
        let decoder = decode(&bie, 1);
        assert_eq!(decoder.plane_bitmap(0).unwrap(), read_bitmap("image.pbm"));
    }

    #[test]
    fn test_decode_lowest_layer() {
        let bie = read("progressive.jbg");
        let mut decoder = JbigDecoder::new();
        decoder.set_max_size(30, 20);
        let (_, status) = decoder.feed(&bie).unwrap();
        assert_eq!(status, DecodeStatus::Interrupted);
        assert_eq!((decoder.width(), decoder.height()), (25, 16));
        assert_eq!(
            decoder.plane_bitmap(0).unwrap(),
            read_bitmap("progressive_lowest.pbm")
        );
    }

    #[test]
    fn test_jbgtopbm_output() {
        let target = std::env::temp_dir().join(format!(
            "jbig-rs-{}-jbigkit-progressive.pbm",
            std::process::id()
        ));
        let output = Command::new(env!("CARGO_BIN_EXE_jbgtopbm"))
            .arg(format!("{IMAGES}/progressive_dppriv.jbg"))
            .arg(&target)
            .output()
            .unwrap();
        let written = fs::read(&target);
        let _ = fs::remove_file(&target);
        assert!(
            output.status.success(),
            "{}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert_eq!(written.unwrap(), read("image.pbm"));
    }

    #[test]
    fn test_encode_sequential_lrltwo() {
        let flags = Options::TPBON | Options::LRLTWO;
        check_encode("sequential_lrltwo", options(0, Order::empty(), flags, 8));
    }

    #[test]
    fn test_encode_sequential_sdrst() {
        let options = EncoderOptions {
            reset_stripes: true,
            ..options(0, Order::empty(), Options::TPBON, 8)
        };
        check_encode("sequential_sdrst", options);
    }

    #[test]
    fn test_encode_sequential_seq() {
        check_encode("sequential_seq", options(0, Order::SEQ, Options::TPBON, 16));
    }

    #[test]
    fn test_encode_sequential_mx8() {
        let options = EncoderOptions {
            mx: 8,
            ..options(0, Order::empty(), Options::TPBON, 8)
        };
        check_encode("sequential_mx8", options);
    }

    #[test]
    fn test_encode_progressive() {
        let flags = Options::TPDON | Options::TPBON | Options::DPON;
        let order = Order::ILEAVE | Order::SMID;
        check_encode("progressive", options(2, order, flags, 4));
    }

    #[test]
    fn test_encode_progressive_dppriv() {
        let flags = Options::TPDON | Options::TPBON | Options::DPON | Options::DPPRIV;
        let order = Order::ILEAVE | Order::SMID;
        check_encode("progressive_dppriv", options(2, order, flags, 4));
    }

    #[test]
    fn test_encode_progressive_sdrst() {
        let flags = Options::TPDON | Options::TPBON | Options::DPON;
        let options = EncoderOptions {
            reset_stripes: true,
            ..options(1, Order::ILEAVE | Order::SMID, flags, 4)
        };
        check_encode("progressive_sdrst", options);
    }
}
