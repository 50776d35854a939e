use super::*;

#[test]
fn fps_from_f64_reduces() {
    assert_eq!(Fps::from_f64(30.0).unwrap(), Fps { num: 30, den: 1 });
    assert_eq!(Fps::from_f64(29.97).unwrap(), Fps { num: 2997, den: 100 });
    assert_eq!(Fps::from_f64(0.5).unwrap(), Fps { num: 1, den: 2 });
}

#[test]
fn fps_rejects_non_positive() {
    assert!(Fps::from_f64(0.0).is_err());
    assert!(Fps::from_f64(-1.0).is_err());
    assert!(Fps::from_f64(f64::NAN).is_err());
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(1, 0).is_err());
}

#[test]
fn fps_frame_duration() {
    let fps = Fps::new(10, 1).unwrap();
    assert!((fps.frame_duration_secs() - 0.1).abs() < 1e-12);
    assert!((fps.frames_to_secs(25) - 2.5).abs() < 1e-12);
}

#[test]
fn derive_keeps_aspect_ratio() {
    let native = Dimensions::new(1920, 1080).unwrap();
    let d = Dimensions::derive(native, 640).unwrap();
    assert_eq!(d, Dimensions { width: 640, height: 360 });

    let odd = Dimensions::new(1000, 333).unwrap();
    let d = Dimensions::derive(odd, 500).unwrap();
    // 166.5 rounds away from zero.
    assert_eq!(d.height, 167);
}

#[test]
fn derive_never_upscales() {
    let native = Dimensions::new(320, 240).unwrap();
    let d = Dimensions::derive(native, 1280).unwrap();
    assert_eq!(d, native);
}

#[test]
fn derive_rejects_zero_target() {
    let native = Dimensions::new(320, 240).unwrap();
    assert!(Dimensions::derive(native, 0).is_err());
}

#[test]
fn fit_within_keeps_aspect_and_never_upscales() {
    let bounds = Dimensions::new(640, 360).unwrap();
    let square = Dimensions::new(160, 160).unwrap();
    assert_eq!(square.fit_within(bounds), square);

    let big_square = Dimensions::new(720, 720).unwrap();
    assert_eq!(
        big_square.fit_within(bounds),
        Dimensions::new(360, 360).unwrap()
    );

    let wide = Dimensions::new(1280, 720).unwrap();
    assert_eq!(wide.fit_within(bounds), bounds);

    let tall = Dimensions::new(100, 2000).unwrap();
    assert_eq!(tall.fit_within(bounds), Dimensions::new(18, 360).unwrap());
}
