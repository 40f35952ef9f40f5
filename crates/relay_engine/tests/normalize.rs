use std::fs;
use std::path::Path;

use image::codecs::webp::WebPEncoder;
use image::ExtendedColorType;
use relay_engine::{normalize, NormalizeError};
use tempfile::TempDir;

fn write_webp(path: &Path) {
    let pixels: Vec<u8> = vec![255; 2 * 2 * 4];
    let file = fs::File::create(path).unwrap();
    WebPEncoder::new_lossless(file)
        .encode(&pixels, 2, 2, ExtendedColorType::Rgba8)
        .unwrap();
}

#[test]
fn webp_becomes_png_and_the_original_is_deleted() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("weverse_1.webp");
    write_webp(&source);

    let target = normalize(&source).unwrap();
    assert_eq!(target, temp.path().join("weverse_1.png"));
    assert!(target.exists());
    assert!(!source.exists());

    // The result decodes as a real PNG.
    let decoded = image::open(&target).unwrap();
    assert_eq!(decoded.width(), 2);
    assert_eq!(decoded.height(), 2);
}

#[test]
fn supported_formats_pass_through_untouched() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("a.jpg");
    fs::write(&source, "not really a jpeg").unwrap();

    let target = normalize(&source).unwrap();
    assert_eq!(target, source);
    assert!(source.exists());
}

#[test]
fn a_broken_webp_keeps_the_original_on_disk() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("bad.webp");
    fs::write(&source, "garbage").unwrap();

    let err = normalize(&source).unwrap_err();
    assert!(matches!(err, NormalizeError::Convert { .. }));
    assert!(source.exists());
}
