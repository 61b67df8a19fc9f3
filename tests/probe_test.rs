//! End-to-end probe runs over real encoded images.

use std::path::{Path, PathBuf};

use image::{GrayImage, RgbImage, RgbaImage};

use imgprobe::probe;
use imgprobe::report::ProbeConfig;

fn write_rgba_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 0x40, 255])
    })
    .save(&path)
    .unwrap();
    path
}

fn config(image: PathBuf, result_file: Option<PathBuf>) -> ProbeConfig {
    ProbeConfig {
        image,
        verbose: false,
        result_file,
    }
}

#[test]
fn safe_image_yields_success_result_file() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_rgba_png(dir.path(), "probe.png", 100, 100);
    let out = dir.path().join("out.txt");

    let safe = probe::run(&config(image, Some(out.clone()))).unwrap();

    assert!(safe);
    // Exactly the token, no trailing data.
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "success");
}

#[test]
fn oversized_image_fails_dimension_ceiling() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_rgba_png(dir.path(), "wide.png", 20_000, 100);
    let out = dir.path().join("out.txt");

    let safe = probe::run(&config(image, Some(out.clone()))).unwrap();

    assert!(!safe);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "failure");
}

#[test]
fn result_file_is_truncated_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_rgba_png(dir.path(), "probe.png", 16, 16);
    let out = dir.path().join("out.txt");
    std::fs::write(&out, "stale contents much longer than the verdict").unwrap();

    probe::run(&config(image, Some(out.clone()))).unwrap();

    assert_eq!(std::fs::read_to_string(&out).unwrap(), "success");
}

#[test]
fn corrupt_file_yields_failure_without_crashing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.png");
    // Valid PNG signature, garbage body: passes the sniff, fails the decoder.
    let mut bytes = vec![137u8, 80, 78, 71, 13, 10, 26, 10];
    bytes.extend_from_slice(&[0u8; 64]);
    std::fs::write(&path, &bytes).unwrap();
    let out = dir.path().join("out.txt");

    let safe = probe::run(&config(path, Some(out.clone()))).unwrap();

    assert!(!safe);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "failure");
}

#[test]
fn rgb_and_gray_images_probe_safely() {
    let dir = tempfile::tempdir().unwrap();

    let rgb_path = dir.path().join("rgb.png");
    RgbImage::from_pixel(64, 32, image::Rgb([1, 2, 3]))
        .save(&rgb_path)
        .unwrap();
    assert!(probe::run(&config(rgb_path, None)).unwrap());

    let gray_path = dir.path().join("gray.png");
    GrayImage::from_pixel(64, 32, image::Luma([0x7F]))
        .save(&gray_path)
        .unwrap();
    assert!(probe::run(&config(gray_path, None)).unwrap());
}

#[test]
fn verbose_run_reports_and_still_returns_verdict() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_rgba_png(dir.path(), "probe.png", 32, 32);

    let config = ProbeConfig {
        image,
        verbose: true,
        result_file: None,
    };
    assert!(probe::run(&config).unwrap());
}
