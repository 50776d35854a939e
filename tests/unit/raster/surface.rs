use super::*;

fn solid(w: u32, h: u32, rgba: [u8; 4]) -> FrameRGBA {
    let data = rgba.repeat((w * h) as usize);
    FrameRGBA::from_raw(w, h, data).unwrap()
}

#[test]
fn new_surface_is_opaque_black() {
    let s = RasterSurface::new(Dimensions::new(4, 2).unwrap());
    assert_eq!(s.frame().data.len(), 4 * 2 * 4);
    assert_eq!(s.frame().pixel(3, 1), Some([0, 0, 0, 255]));
    assert_eq!(s.draw_count(), 0);
}

#[test]
fn draw_same_size_copies_exactly() {
    let mut s = RasterSurface::new(Dimensions::new(8, 8).unwrap());
    let src = solid(8, 8, [10, 20, 30, 255]);
    s.draw(&src).unwrap();
    assert_eq!(s.frame(), &src);
    assert_eq!(s.draw_count(), 1);
}

#[test]
fn draw_downscales_into_surface_size() {
    let mut s = RasterSurface::new(Dimensions::new(4, 2).unwrap());
    s.draw(&solid(16, 8, [200, 100, 50, 255])).unwrap();
    assert_eq!(s.dimensions(), Dimensions::new(4, 2).unwrap());
    assert_eq!(s.frame().pixel(2, 1), Some([200, 100, 50, 255]));
}

#[test]
fn draw_overwrites_previous_contents() {
    let mut s = RasterSurface::new(Dimensions::new(2, 2).unwrap());
    s.draw(&solid(2, 2, [1, 1, 1, 255])).unwrap();
    let copy = s.copy_frame();
    s.draw(&solid(2, 2, [9, 9, 9, 255])).unwrap();
    assert_eq!(copy.pixel(0, 0), Some([1, 1, 1, 255]));
    assert_eq!(s.frame().pixel(0, 0), Some([9, 9, 9, 255]));
}

#[test]
fn draw_rejects_malformed_source() {
    let mut s = RasterSurface::new(Dimensions::new(2, 2).unwrap());
    let bad = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 3],
    };
    assert!(s.draw(&bad).is_err());
}

#[test]
fn resize_reallocates_and_resets_draws() {
    let mut s = RasterSurface::new(Dimensions::new(2, 2).unwrap());
    s.draw(&solid(2, 2, [5, 5, 5, 255])).unwrap();
    s.resize(Dimensions::new(6, 4).unwrap());
    assert_eq!(s.frame().data.len(), 6 * 4 * 4);
    assert_eq!(s.draw_count(), 0);
}

#[test]
fn snapshot_is_decodable_png() {
    let mut s = RasterSurface::new(Dimensions::new(6, 4).unwrap());
    s.draw(&solid(6, 4, [0, 255, 0, 255])).unwrap();
    let png = s.snapshot_png().unwrap();
    let img = image::load_from_memory_with_format(&png, image::ImageFormat::Png)
        .unwrap()
        .to_rgba8();
    assert_eq!(img.dimensions(), (6, 4));
    assert_eq!(img.get_pixel(5, 3).0, [0, 255, 0, 255]);
}

#[test]
fn fit_centers_a_smaller_source_without_upscaling() {
    let mut s = RasterSurface::new(Dimensions::new(8, 4).unwrap()).with_mode(DrawMode::Fit);
    s.draw(&solid(8, 4, [255, 255, 255, 255])).unwrap();
    s.draw(&solid(2, 2, [200, 0, 0, 255])).unwrap();

    let black = Some([0, 0, 0, 255]);
    let red = Some([200, 0, 0, 255]);
    assert_eq!(s.frame().pixel(3, 1), red);
    assert_eq!(s.frame().pixel(4, 2), red);
    assert_eq!(s.frame().pixel(2, 1), black);
    assert_eq!(s.frame().pixel(5, 2), black);
    assert_eq!(s.frame().pixel(3, 0), black);
    assert_eq!(s.frame().pixel(4, 3), black);
    assert_eq!(s.frame().pixel(0, 0), black);
}

#[test]
fn fit_downscales_keeping_aspect() {
    let mut s = RasterSurface::new(Dimensions::new(8, 4).unwrap()).with_mode(DrawMode::Fit);
    s.draw(&solid(16, 16, [0, 180, 0, 255])).unwrap();

    let green = Some([0, 180, 0, 255]);
    let black = Some([0, 0, 0, 255]);
    assert_eq!(s.frame().pixel(2, 0), green);
    assert_eq!(s.frame().pixel(5, 3), green);
    assert_eq!(s.frame().pixel(1, 0), black);
    assert_eq!(s.frame().pixel(6, 3), black);
}

#[test]
fn fit_fills_when_aspect_matches() {
    let mut s = RasterSurface::new(Dimensions::new(4, 2).unwrap()).with_mode(DrawMode::Fit);
    s.draw(&solid(16, 8, [200, 100, 50, 255])).unwrap();
    assert_eq!(s.frame().pixel(0, 0), Some([200, 100, 50, 255]));
    assert_eq!(s.frame().pixel(3, 1), Some([200, 100, 50, 255]));
}
