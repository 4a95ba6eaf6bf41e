// Encoder to decoder round trips through the public library API.
//
// Images are synthetic so that every coding path (typical prediction, AT
// pixels, several layers and planes) sees both uniform and busy regions.

#[cfg(test)]
mod round_trip {
    use jbig_rs::{
        Bitmap, DecodeStatus, EncoderOptions, JbigDecoder, JbigEncoder, LayerSelection, Options,
        Order, PlaneCoding, merge_planes, split_planes,
    };

    fn pattern(width: u32, height: u32, seed: u32) -> Bitmap {
        let mut bitmap = Bitmap::with_size(width, height).unwrap();
        let mut noise = seed.wrapping_mul(2_654_435_761).max(1);
        for y in 0..height {
            for x in 0..width {
                noise ^= noise << 13;
                noise ^= noise >> 17;
                noise ^= noise << 5;
                let disc = (x as i64 - 20).pow(2) + (y as i64 - 12).pow(2) < 81;
                let bars = y > height / 2 && (x / 3) % 2 == 0;
                let speckle = y >= height - 4 && noise % 5 == 0;
                if disc || bars || speckle {
                    bitmap.set_pixel(x, y, 1);
                }
            }
        }
        bitmap
    }

    fn encode(bitmap: &Bitmap, options: EncoderOptions) -> Vec<u8> {
        JbigEncoder::new(bitmap.width(), bitmap.height(), vec![bitmap.clone()], options)
            .unwrap()
            .encode_to_vec()
            .unwrap()
    }

    /// Feeds `bie` in pieces of `chunk` bytes until nothing is left.
    fn decode_in_chunks(bie: &[u8], chunk: usize, decoder: &mut JbigDecoder) -> DecodeStatus {
        let mut status = DecodeStatus::NeedMoreData;
        for piece in bie.chunks(chunk) {
            let mut rest = piece;
            while !rest.is_empty() {
                let (used, next) = decoder.feed(rest).unwrap();
                rest = &rest[used..];
                status = next;
                if status == DecodeStatus::Interrupted {
                    return status;
                }
            }
        }
        status
    }

    fn decode(bie: &[u8]) -> JbigDecoder {
        let mut decoder = JbigDecoder::new();
        assert_eq!(
            decode_in_chunks(bie, bie.len(), &mut decoder),
            DecodeStatus::Complete
        );
        decoder
    }

    #[test]
    fn test_sequential_default_options() {
        let bitmap = pattern(57, 33, 1);
        let bie = encode(&bitmap, EncoderOptions::default());
        let decoder = decode(&bie);
        assert_eq!((decoder.width(), decoder.height()), (57, 33));
        assert_eq!(decoder.plane_bitmap(0).unwrap(), bitmap);
    }

    #[test]
    fn test_progressive_layers() {
        let bitmap = pattern(64, 40, 2);
        let options = EncoderOptions {
            layers: LayerSelection::Count(2),
            l0: Some(3),
            ..EncoderOptions::default()
        };
        let bie = encode(&bitmap, options);
        assert_eq!(bie[1], 2);
        let decoder = decode(&bie);
        assert_eq!(decoder.plane_bitmap(0).unwrap(), bitmap);
    }

    #[test]
    fn test_option_combinations() {
        let bitmap = pattern(40, 29, 3);
        let combinations = [
            (Order::empty(), Options::empty()),
            (Order::SEQ, Options::LRLTWO),
            (Order::SEQ | Order::ILEAVE, Options::TPDON | Options::TPBON),
            (Order::ILEAVE, Options::TPBON | Options::LRLTWO),
        ];
        for (order, flags) in combinations {
            let options = EncoderOptions {
                order,
                options: flags,
                layers: LayerSelection::Count(1),
                l0: Some(4),
                ..EncoderOptions::default()
            };
            let decoder = decode(&encode(&bitmap, options));
            assert_eq!(
                decoder.plane_bitmap(0).unwrap(),
                bitmap,
                "order {order:?} options {flags:?}"
            );
        }
    }

    #[test]
    fn test_chunk_size_does_not_matter() {
        let bitmap = pattern(48, 36, 4);
        let options = EncoderOptions {
            layers: LayerSelection::Count(2),
            l0: Some(2),
            reset_stripes: true,
            comment: Some(b"chunked".to_vec()),
            ..EncoderOptions::default()
        };
        let bie = encode(&bitmap, options);
        let whole = decode(&bie).into_image().unwrap();

        for chunk in [1, 2, 7, 64] {
            let mut decoder = JbigDecoder::new();
            assert_eq!(
                decode_in_chunks(&bie, chunk, &mut decoder),
                DecodeStatus::Complete
            );
            assert_eq!(decoder.into_image().unwrap(), whole, "chunk size {chunk}");
        }
    }

    #[test]
    fn test_image_size_of_small_bitmap() {
        let bitmap = pattern(16, 16, 5);
        let decoder = decode(&encode(&bitmap, EncoderOptions::default()));
        assert_eq!(decoder.image_size(), 32);
        assert_eq!(decoder.planes(), 1);
    }

    #[test]
    fn test_all_white_image() {
        let bitmap = Bitmap::with_size(100, 20).unwrap();
        let bie = encode(&bitmap, EncoderOptions::default());
        let decoder = decode(&bie);
        assert!(decoder.plane_bitmap(0).unwrap().as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_resolution_limit_interrupts() {
        let bitmap = pattern(64, 40, 6);
        let options = EncoderOptions {
            layers: LayerSelection::Count(2),
            ..EncoderOptions::default()
        };
        let bie = encode(&bitmap, options);

        let mut decoder = JbigDecoder::new();
        decoder.set_max_size(20, 20);
        assert_eq!(
            decode_in_chunks(&bie, 5, &mut decoder),
            DecodeStatus::Interrupted
        );
        assert_eq!((decoder.width(), decoder.height()), (16, 10));
        assert_eq!(decoder.image_size(), 20);
    }

    #[test]
    fn test_concatenated_bies() {
        let bitmap = pattern(64, 40, 7);
        let part = |lowest, highest| EncoderOptions {
            layers: LayerSelection::Count(2),
            lowest_layer: Some(lowest),
            highest_layer: Some(highest),
            ..EncoderOptions::default()
        };
        let mut stream = encode(&bitmap, part(0, 0));
        let first_len = stream.len();
        stream.extend(encode(&bitmap, part(1, 2)));

        let mut decoder = JbigDecoder::new();
        let (used, status) = decoder.feed(&stream).unwrap();
        assert_eq!((used, status), (first_len, DecodeStatus::Complete));
        assert_eq!((decoder.width(), decoder.height()), (16, 10));

        let (used, status) = decoder.feed(&stream[first_len..]).unwrap();
        assert_eq!((used, status), (stream.len() - first_len, DecodeStatus::Complete));
        assert_eq!(decoder.plane_bitmap(0).unwrap(), bitmap);
    }

    #[test]
    fn test_announced_height_is_corrected() {
        let bitmap = pattern(30, 25, 8);
        let options = EncoderOptions {
            announced_height: Some(1000),
            l0: Some(8),
            ..EncoderOptions::default()
        };
        let bie = encode(&bitmap, options);
        assert_eq!(&bie[8..12], &1000u32.to_be_bytes());
        assert_ne!(bie[19] & Options::VLENGTH.bits(), 0);

        let decoder = decode(&bie);
        assert_eq!(decoder.height(), 25);
        assert_eq!(decoder.plane_bitmap(0).unwrap(), bitmap);
    }

    #[test]
    fn test_gray_coded_planes() {
        let (width, height) = (23, 9);
        let pixels: Vec<u8> = (0..width * height).map(|i| (i * 7 % 61) as u8).collect();
        for coding in [PlaneCoding::Gray, PlaneCoding::Binary] {
            let planes = split_planes(width, height, 6, &pixels, 6, coding).unwrap();
            let options = EncoderOptions {
                layers: LayerSelection::Count(1),
                ..EncoderOptions::default()
            };
            let bie = JbigEncoder::new(width, height, planes, options)
                .unwrap()
                .encode_to_vec()
                .unwrap();

            let decoder = decode(&bie);
            assert_eq!(decoder.planes(), 6);
            let image = decoder.into_image().unwrap();
            let mut merged = Vec::new();
            merge_planes(&image, coding, &mut merged).unwrap();
            assert_eq!(merged, pixels, "{coding:?}");
        }
    }
}
