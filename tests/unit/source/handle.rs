use super::*;
use crate::source::decoder::MediaInfo;
use crate::source::synthetic::{SyntheticDecodeService, SyntheticSource};

#[derive(Clone, Copy)]
enum Behavior {
    Stall,
    Fail,
    Drop,
}

struct Scripted {
    info: MediaInfo,
    behavior: Behavior,
    stalled: Vec<SeekSignal>,
    abandoned: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl Decoder for Scripted {
    fn info(&self) -> MediaInfo {
        self.info
    }

    fn request_seek(&mut self, signal: SeekSignal) {
        match self.behavior {
            Behavior::Stall => self.stalled.push(signal),
            Behavior::Fail => signal.fail("corrupt packet"),
            Behavior::Drop => drop(signal),
        }
    }

    fn abandon_seek(&mut self) {
        self.abandoned
            .store(true, std::sync::atomic::Ordering::SeqCst);
        self.stalled.clear();
    }
}

struct ScriptedService {
    info: MediaInfo,
    behavior: Behavior,
    abandoned: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl ScriptedService {
    fn new(behavior: Behavior) -> Self {
        Self {
            info: MediaInfo {
                width: 8,
                height: 6,
                duration_secs: 2.0,
            },
            behavior,
            abandoned: Default::default(),
        }
    }
}

impl DecodeService for ScriptedService {
    fn open(&self, _input: &SourceInput) -> FramecapResult<Box<dyn Decoder>> {
        Ok(Box::new(Scripted {
            info: self.info,
            behavior: self.behavior,
            stalled: Vec::new(),
            abandoned: self.abandoned.clone(),
        }))
    }
}

fn input() -> SourceInput {
    SourceInput::new("clip.webm", vec![1u8, 2, 3])
}

fn synthetic(duration_secs: f64) -> SourceInput {
    SyntheticSource {
        width: 16,
        height: 9,
        duration_secs,
        tag: 3,
    }
    .to_input("pattern.json")
    .unwrap()
}

#[test]
fn open_resolves_descriptor() {
    let h = SourceHandle::open(&SyntheticDecodeService, &synthetic(4.5), DEFAULT_SEEK_TIMEOUT)
        .unwrap();
    let d = h.descriptor();
    assert_eq!(d.native_width(), 16);
    assert_eq!(d.native_height(), 9);
    assert_eq!(d.duration_secs, 4.5);
    assert_eq!(d.origin.name, "pattern.json");
}

#[test]
fn open_rejects_empty_input() {
    let err = SourceHandle::open(
        &SyntheticDecodeService,
        &SourceInput::new("empty", Vec::<u8>::new()),
        DEFAULT_SEEK_TIMEOUT,
    )
    .unwrap_err();
    assert!(matches!(err, FramecapError::UnsupportedFormat(_)));
}

#[test]
fn open_rejects_zero_dimensions() {
    let mut svc = ScriptedService::new(Behavior::Fail);
    svc.info.width = 0;
    let err = SourceHandle::open(&svc, &input(), DEFAULT_SEEK_TIMEOUT).unwrap_err();
    assert!(matches!(err, FramecapError::UnsupportedFormat(_)));
}

#[test]
fn seek_then_current_raster() {
    let mut h =
        SourceHandle::open(&SyntheticDecodeService, &synthetic(2.0), DEFAULT_SEEK_TIMEOUT).unwrap();
    assert!(h.current_raster().is_err());
    h.seek_to(1.5).unwrap();
    let px = h.current_raster().unwrap().pixel(0, 0).unwrap();
    let (tag, t) = SyntheticSource::decode_pixel(px);
    assert_eq!(tag, 3);
    assert!((t - 1.5).abs() < 1e-9);
}

#[test]
fn seek_past_duration_is_clamped() {
    let mut h =
        SourceHandle::open(&SyntheticDecodeService, &synthetic(2.0), DEFAULT_SEEK_TIMEOUT).unwrap();
    h.seek_to(9.0).unwrap();
    let (_, t) = SyntheticSource::decode_pixel(h.current_raster().unwrap().pixel(0, 0).unwrap());
    assert!((t - 2.0).abs() < 1e-9);
}

#[test]
fn stalled_seek_times_out_and_is_abandoned() {
    let svc = ScriptedService::new(Behavior::Stall);
    let mut h = SourceHandle::open(&svc, &input(), Duration::from_millis(30)).unwrap();
    let err = h.seek_to(1.0).unwrap_err();
    assert!(matches!(err, FramecapError::SeekTimeout { .. }));
    assert!(svc.abandoned.load(std::sync::atomic::Ordering::SeqCst));
}

#[test]
fn failed_seek_is_decode_interrupted() {
    let svc = ScriptedService::new(Behavior::Fail);
    let mut h = SourceHandle::open(&svc, &input(), DEFAULT_SEEK_TIMEOUT).unwrap();
    let err = h.seek_to(0.5).unwrap_err();
    assert!(matches!(err, FramecapError::DecodeInterrupted(_)));
    assert!(err.to_string().contains("corrupt packet"));
}

#[test]
fn dropped_signal_is_decode_interrupted() {
    let svc = ScriptedService::new(Behavior::Drop);
    let mut h = SourceHandle::open(&svc, &input(), DEFAULT_SEEK_TIMEOUT).unwrap();
    let err = h.seek_to(0.5).unwrap_err();
    assert!(matches!(err, FramecapError::DecodeInterrupted(_)));
}

#[test]
fn non_finite_target_is_rejected() {
    let mut h =
        SourceHandle::open(&SyntheticDecodeService, &synthetic(2.0), DEFAULT_SEEK_TIMEOUT).unwrap();
    assert!(matches!(
        h.seek_to(f64::NAN).unwrap_err(),
        FramecapError::Validation(_)
    ));
}
