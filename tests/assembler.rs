mod tests {
    use aero_node::color::{Rgb, luma_white, min_white, no_white, rgbw};
    use aero_node::{ChannelLayout, ConfigError, FrameAssembler, MapError, UniverseMapper};

    const MAX_PIXELS: usize = 600;

    fn rgb_assembler() -> FrameAssembler<MAX_PIXELS> {
        let mapper = UniverseMapper::for_position(5, 537, 512, 3).unwrap();
        FrameAssembler::new(mapper, ChannelLayout::Rgb(no_white)).unwrap()
    }

    #[test]
    fn test_white_policies() {
        let color = Rgb {
            r: 200,
            g: 100,
            b: 50,
        };
        assert_eq!(no_white(color), 0);
        assert_eq!(min_white(color), 50);
        assert_eq!(
            luma_white(Rgb {
                r: 255,
                g: 255,
                b: 255
            }),
            255
        );
        assert_eq!(luma_white(Rgb { r: 0, g: 0, b: 0 }), 0);
    }

    #[test]
    fn test_apply_rgb_universe() {
        let mut assembler = rgb_assembler();
        let payload: Vec<u8> = (0..170).flat_map(|i| [i as u8, 1, 2]).collect();

        let range = assembler.apply(17, &payload).unwrap();
        assert_eq!(range.start, 170);

        let frame = assembler.frame();
        assert_eq!(frame.len(), 537);
        assert_eq!(frame.get(169), Some(rgbw(0, 0, 0, 0)));
        assert_eq!(frame.get(170), Some(rgbw(0, 1, 2, 0)));
        assert_eq!(frame.get(339), Some(rgbw(169, 1, 2, 0)));
        assert_eq!(frame.get(340), Some(rgbw(0, 0, 0, 0)));
    }

    #[test]
    fn test_apply_rgb_with_white_policy() {
        let mapper = UniverseMapper::for_position(1, 10, 512, 3).unwrap();
        let mut assembler =
            FrameAssembler::<MAX_PIXELS>::new(mapper, ChannelLayout::Rgb(min_white)).unwrap();

        assembler.apply(0, &[30, 20, 10, 5, 6, 7]).unwrap();
        assert_eq!(assembler.frame().get(0), Some(rgbw(30, 20, 10, 10)));
        assert_eq!(assembler.frame().get(1), Some(rgbw(5, 6, 7, 5)));
    }

    #[test]
    fn test_apply_rgbw_universe() {
        let mapper = UniverseMapper::for_position(1, 660, 512, 4).unwrap();
        let mut assembler =
            FrameAssembler::<MAX_PIXELS>::new(mapper, ChannelLayout::Rgbw).unwrap();
        assert_eq!(assembler.mapper().universes(), 0..6);

        // Trailing partial pixel is ignored
        assembler.apply(1, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]).unwrap();
        let frame = assembler.frame();
        assert_eq!(frame.get(128), Some(rgbw(1, 2, 3, 4)));
        assert_eq!(frame.get(129), Some(rgbw(5, 6, 7, 8)));
        assert_eq!(frame.get(130), Some(rgbw(0, 0, 0, 0)));
    }

    #[test]
    fn test_apply_clamps_last_universe() {
        let mut assembler = rgb_assembler();
        let payload = [255u8; 512];

        let range = assembler.apply(19, &payload).unwrap();
        assert_eq!(range.last(), Some(536));
        assert_eq!(assembler.frame().get(536), Some(rgbw(255, 255, 255, 0)));
        assert_eq!(assembler.frame().len(), 537);
    }

    #[test]
    fn test_apply_out_of_range_leaves_frame() {
        let mut assembler = rgb_assembler();
        let before = assembler.frame().clone();

        let result = assembler.apply(3, &[255u8; 512]);
        assert!(matches!(result, Err(MapError::BelowRange { .. })));
        let result = assembler.apply(40, &[255u8; 512]);
        assert!(matches!(result, Err(MapError::BeyondRange { .. })));

        assert_eq!(assembler.frame().as_slice(), before.as_slice());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let payload: Vec<u8> = (0..512).map(|i| (i * 7) as u8).collect();

        let mut once = rgb_assembler();
        once.apply(18, &payload).unwrap();

        let mut twice = rgb_assembler();
        twice.apply(18, &payload).unwrap();
        twice.apply(18, &payload).unwrap();

        assert_eq!(once.frame().as_slice(), twice.frame().as_slice());
    }

    #[test]
    fn test_layout_must_match_mapper() {
        let rgbw_mapper = UniverseMapper::for_position(1, 300, 512, 4).unwrap();
        let result = FrameAssembler::<MAX_PIXELS>::new(rgbw_mapper, ChannelLayout::Rgb(no_white));
        assert_eq!(
            result.unwrap_err(),
            ConfigError::LayoutMismatch {
                mapper: 4,
                layout: 3
            }
        );

        // A matching RGB mapper decodes every whole pixel of the payload
        let rgb_mapper = UniverseMapper::for_position(1, 300, 512, 3).unwrap();
        let mut assembler =
            FrameAssembler::<MAX_PIXELS>::new(rgb_mapper, ChannelLayout::Rgb(no_white)).unwrap();
        let range = assembler.apply(0, &[1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4]).unwrap();
        assert_eq!(range.len(), 4);
        assert_eq!(assembler.frame().get(3), Some(rgbw(4, 4, 4, 0)));
    }
}
