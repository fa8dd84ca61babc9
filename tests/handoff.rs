mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use aero_node::color::rgbw;
    use aero_node::{
        ChannelLayout, Consumed, FrameAssembler, FrameHandoff, PixelFrame, PublishOutcome,
        UniverseMapper,
    };
    use proptest::prelude::*;

    const MAX_PIXELS: usize = 300;

    fn filled(len: usize, value: u8) -> PixelFrame<MAX_PIXELS> {
        let mut frame = PixelFrame::new(len);
        frame.fill(rgbw(value, value, value, value));
        frame
    }

    #[test]
    fn test_take_requires_publish() {
        let handoff = FrameHandoff::<MAX_PIXELS>::new();
        let mut out = PixelFrame::new(10);
        assert_eq!(handoff.try_take(&mut out), None);

        assert_eq!(handoff.publish(&filled(10, 7)), PublishOutcome::Published(1));
        assert_eq!(handoff.try_take(&mut out), Some(Consumed::Frame(1)));
        assert_eq!(out.get(9), Some(rgbw(7, 7, 7, 7)));

        // Ready flag cleared by the take
        assert_eq!(handoff.try_take(&mut out), None);
    }

    #[test]
    fn test_latest_frame_wins() {
        let handoff = FrameHandoff::<MAX_PIXELS>::new();
        let publisher = handoff.publisher();
        let receiver = handoff.receiver();

        publisher.publish(&filled(4, 1));
        publisher.publish(&filled(4, 2));
        publisher.publish(&filled(4, 3));

        let mut out = PixelFrame::new(4);
        assert_eq!(receiver.try_take(&mut out), Some(Consumed::Frame(3)));
        assert_eq!(out.as_slice(), filled(4, 3).as_slice());
        assert_eq!(receiver.try_take(&mut out), None);
    }

    #[test]
    fn test_hold_suppresses_publication() {
        let handoff = FrameHandoff::<MAX_PIXELS>::new();
        let hold = rgbw(0, 0, 40, 0);
        let mut out = PixelFrame::new(8);

        handoff.publish(&filled(8, 1));
        handoff.hold(hold);
        assert!(handoff.is_held());
        assert_eq!(handoff.publish(&filled(8, 2)), PublishOutcome::Suppressed);

        assert_eq!(handoff.try_take(&mut out), Some(Consumed::Hold(hold)));
        assert!(out.as_slice().iter().all(|pixel| *pixel == hold));
        assert_eq!(handoff.generation(), 1);

        handoff.release();
        assert_eq!(handoff.publish(&filled(8, 3)), PublishOutcome::Published(2));
        assert_eq!(handoff.try_take(&mut out), Some(Consumed::Frame(2)));
        assert_eq!(out.get(0), Some(rgbw(3, 3, 3, 3)));
    }

    #[test]
    fn test_wait_wakes_on_publish() {
        let handoff = FrameHandoff::<MAX_PIXELS>::new();
        let mut out = PixelFrame::new(16);

        thread::scope(|scope| {
            scope.spawn(|| {
                thread::sleep(std::time::Duration::from_millis(20));
                handoff.publish(&filled(16, 9));
            });
            embassy_futures::block_on(handoff.receiver().wait());
        });

        assert_eq!(handoff.try_take(&mut out), Some(Consumed::Frame(1)));
    }

    /// A reader must never see pixels of two publish generations in one frame.
    #[test]
    fn test_publish_is_atomic_across_threads() {
        const GENERATIONS: u32 = 2_000;

        let handoff = FrameHandoff::<MAX_PIXELS>::new();
        let done = AtomicBool::new(false);
        let mapper = UniverseMapper::for_position(1, MAX_PIXELS, 512, 4).unwrap();

        thread::scope(|scope| {
            scope.spawn(|| {
                let mut assembler =
                    FrameAssembler::<MAX_PIXELS>::new(mapper, ChannelLayout::Rgbw).unwrap();
                let publisher = handoff.publisher();
                for generation in 1..=GENERATIONS {
                    let payload = [generation as u8; 512];
                    for universe in mapper.universes() {
                        assembler.apply(universe, &payload).unwrap();
                    }
                    publisher.publish(assembler.frame());
                }
                done.store(true, Ordering::Release);
            });

            let receiver = handoff.receiver();
            let mut out = PixelFrame::new(MAX_PIXELS);
            let mut seen = 0;
            loop {
                let finished = done.load(Ordering::Acquire);
                if let Some(Consumed::Frame(generation)) = receiver.try_take(&mut out) {
                    let expected = rgbw(
                        generation as u8,
                        generation as u8,
                        generation as u8,
                        generation as u8,
                    );
                    assert!(
                        out.as_slice().iter().all(|pixel| *pixel == expected),
                        "torn frame in generation {generation}"
                    );
                    assert!(generation > seen, "generations must increase");
                    seen = generation;
                }
                if finished {
                    assert_eq!(seen, GENERATIONS, "last generation never observed");
                    break;
                }
            }
        });
    }

    proptest! {
        #[test]
        fn taken_frame_is_last_published(values in prop::collection::vec(any::<u8>(), 1..16)) {
            let handoff = FrameHandoff::<MAX_PIXELS>::new();
            for value in &values {
                handoff.publish(&filled(12, *value));
            }

            let mut out = PixelFrame::new(12);
            let taken = handoff.try_take(&mut out);
            prop_assert_eq!(taken, Some(Consumed::Frame(values.len() as u32)));
            let last = *values.last().unwrap();
            let expected = filled(12, last);
            prop_assert_eq!(out.as_slice(), expected.as_slice());
        }
    }
}
