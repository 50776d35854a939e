use super::*;
use crate::capture::timeline::sample_times;
use crate::foundation::core::Dimensions;
use crate::source::decoder::SourceInput;
use crate::source::synthetic::{SyntheticDecodeService, SyntheticSource};

fn open(duration_secs: f64) -> SourceHandle {
    let input: SourceInput = SyntheticSource {
        width: 8,
        height: 4,
        duration_secs,
        tag: 7,
    }
    .to_input("clip.json")
    .unwrap();
    SourceHandle::open(&SyntheticDecodeService, &input, Duration::from_secs(1)).unwrap()
}

#[test]
fn visits_every_timestamp_in_order() {
    let mut source = open(3.0);
    let mut surface = RasterSurface::new(Dimensions::new(8, 4).unwrap());
    let times = sample_times(3.0, 1.0).unwrap();

    let mut seen = Vec::new();
    let stats = SeekStepper::new()
        .run(&mut source, &mut surface, &times, &CancelToken::new(), |step| {
            let px = step.surface.frame().pixel(0, 0).unwrap();
            let (tag, t) = SyntheticSource::decode_pixel(px);
            assert_eq!(tag, 7);
            seen.push((step.index, step.timestamp_secs, t));
            Ok(())
        })
        .unwrap();

    assert_eq!(stats.frames, 4);
    assert_eq!(stats.first_ts, Some(0.0));
    assert_eq!(stats.last_ts, Some(3.0));
    for (i, (index, ts, drawn)) in seen.into_iter().enumerate() {
        assert_eq!(index, i);
        assert_eq!(ts, i as f64);
        assert!((drawn - ts).abs() < 1e-3);
    }
    assert_eq!(surface.draw_count(), 4);
}

#[test]
fn cancelled_token_stops_before_the_next_seek() {
    let mut source = open(5.0);
    let mut surface = RasterSurface::new(Dimensions::new(8, 4).unwrap());
    let cancel = CancelToken::new();
    let times = sample_times(5.0, 1.0).unwrap();

    let mut frames = 0;
    let err = SeekStepper::new()
        .run(&mut source, &mut surface, &times, &cancel, |_| {
            frames += 1;
            if frames == 2 {
                cancel.cancel();
            }
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, FramecapError::Cancelled));
    assert_eq!(frames, 2);
}

#[test]
fn hand_off_error_aborts_the_run() {
    let mut source = open(5.0);
    let mut surface = RasterSurface::new(Dimensions::new(8, 4).unwrap());
    let times = sample_times(5.0, 1.0).unwrap();

    let mut calls = 0;
    let err = SeekStepper::new()
        .run(&mut source, &mut surface, &times, &CancelToken::new(), |_| {
            calls += 1;
            Err(FramecapError::flush("sink closed"))
        })
        .unwrap_err();
    assert!(matches!(err, FramecapError::EncodeFlushFailed(_)));
    assert_eq!(calls, 1);
}

#[test]
fn rejects_decreasing_timestamps() {
    let mut source = open(5.0);
    let mut surface = RasterSurface::new(Dimensions::new(8, 4).unwrap());
    let err = SeekStepper::new()
        .run(&mut source, &mut surface, &[1.0, 0.5], &CancelToken::new(), |_| Ok(()))
        .unwrap_err();
    assert!(matches!(err, FramecapError::Validation(_)));
}

#[test]
fn pacing_is_fraction_of_interval() {
    let stepper = SeekStepper::with_pacing(0.9, 0.1).unwrap();
    let pacing = stepper.pacing().unwrap();
    assert!((pacing.as_secs_f64() - 0.09).abs() < 1e-9);
    assert!(SeekStepper::with_pacing(0.0, 1.0).unwrap().pacing().is_none());
    assert!(SeekStepper::with_pacing(1.5, 1.0).is_err());
    assert!(SeekStepper::with_pacing(0.5, 0.0).is_err());
}
