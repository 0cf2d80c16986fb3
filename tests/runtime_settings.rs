// 全局运行时配置会被整个进程共享，所以这里只放一个测试，按顺序切换设置。
use std::fs;

use image::{GrayImage, Luma};
use rasterbridge::config::{self, DEFAULT_MAX_DECODED_PIXELS, RasterConfig, Verbosity};
use rasterbridge::{Frame, PixelFormat, RasterError, load, snapshot};
use serde_json::json;

fn snapshot_files(dir: &std::path::Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("stage-"))
        .count()
}

#[test]
fn runtime_settings_drive_snapshots_and_limits() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("stage-%02d.pgm");
    let template = template.to_str().unwrap();
    let frame = Frame::new(4, 4, PixelFormat::Gray8).unwrap();

    config::replace_config(RasterConfig::default());
    assert_eq!(config::verbosity(), Verbosity::Normal);
    snapshot(template, 1, &frame).unwrap();
    assert_eq!(snapshot_files(dir.path()), 0);

    config::apply_runtime_settings(&json!({ "verbosity": "debug-save" }));
    snapshot(template, 2, &frame).unwrap();
    assert_eq!(snapshot_files(dir.path()), 1);
    assert!(dir.path().join("stage-02.pgm").exists());

    // 非法值被忽略，其余字段照常生效
    config::apply_runtime_settings(&json!({ "verbosity": "loud", "maxDecodedPixels": 8 }));
    let current = config::config_snapshot();
    assert_eq!(current.verbosity, Verbosity::DebugSave);
    assert_eq!(current.max_decoded_pixels, 8);

    let image_path = dir.path().join("big.png");
    GrayImage::from_pixel(3, 3, Luma([0])).save(&image_path).unwrap();
    assert!(matches!(
        load(&image_path),
        Err(RasterError::ResourceLimit { .. })
    ));

    config::apply_runtime_settings(&json!({ "verbosity": 1, "maxDecodedPixels": 0 }));
    let current = config::config_snapshot();
    assert_eq!(current.verbosity, Verbosity::Normal);
    assert_eq!(current.max_decoded_pixels, 8);
    snapshot(template, 3, &frame).unwrap();
    assert_eq!(snapshot_files(dir.path()), 1);

    config::replace_config(RasterConfig::default());
    assert_eq!(config::config_snapshot().max_decoded_pixels, DEFAULT_MAX_DECODED_PIXELS);
    assert_eq!(load(&image_path).unwrap().format(), PixelFormat::Gray8);
}
