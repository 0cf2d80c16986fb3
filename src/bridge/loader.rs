//! # 加载模块
//!
//! ## 设计思路
//!
//! 加载流程固定为：打开容器 → 选择数据流 → 初始化解码器 → 解出一帧 → 规范化像素格式。
//! 任何一步失败都直接返回错误，不会交出部分结果。
//!
//! ## 实现思路
//!
//! - 规范化在加载时一次完成：下游只需要理解五种规范格式。
//! - 调色板图立即展开为 RGB：读取索引时使用索引平面自己的行跨度，
//!   写入时使用目标帧自己的行跨度，两者不要求相等。
//! - 解码像素上限在分配像素缓冲之前检查。
//! - 容器与解码器按值在流程中传递，提前返回时自动释放。

use std::path::Path;
use std::time::Instant;

use crate::codec::{Container, DecodedFormat, DecodedFrame, StreamDecoder, StreamInfo};
use crate::config::{self, RasterConfig, Verbosity};
use crate::error::RasterError;
use crate::frame::{Frame, PixelFormat};

/// 从文件加载一帧并规范化像素格式。
///
/// # 示例
/// ```rust,no_run
/// use rasterbridge::{PixelFormat, load};
///
/// let frame = load("scan.png")?;
/// assert_ne!(frame.format(), PixelFormat::Pal8);
/// # Ok::<(), rasterbridge::RasterError>(())
/// ```
pub fn load(path: impl AsRef<Path>) -> Result<Frame, RasterError> {
    let path = path.as_ref();
    let config = config::config_snapshot();
    let started = Instant::now();

    let container = Container::open(path)?;
    if config.verbosity >= Verbosity::More {
        container.dump();
    }

    let stream = select_stream(&container)?;
    let decoder = StreamDecoder::open(&stream, container.into_reader(), path)?;
    check_pixel_budget(path, decoder.dimensions(), &config)?;

    let decoded = decoder.decode(path)?;
    let source_format = decoded.format.clone();
    let frame = normalize(path, decoded)?;

    log::info!(
        "✅ 图片加载成功 - 文件: {} 尺寸: {}x{} 格式: {}{} 耗时: {}ms",
        path.display(),
        frame.width(),
        frame.height(),
        frame.format(),
        match source_format {
            DecodedFormat::Canonical(PixelFormat::Pal8) => "（由调色板展开）",
            _ => "",
        },
        started.elapsed().as_millis()
    );

    Ok(frame)
}

/// 只考虑第一个数据流，且它必须能解码出画面。
fn select_stream(container: &Container) -> Result<StreamInfo, RasterError> {
    let first = container
        .streams()
        .first()
        .ok_or_else(|| RasterError::NoImageStream {
            path: container.path().to_path_buf(),
        })?;

    if !first.kind.is_visual() {
        return Err(RasterError::WrongStreamKind {
            path: container.path().to_path_buf(),
            kind: first.kind.as_str().to_string(),
        });
    }

    Ok(first.clone())
}

fn check_pixel_budget(
    path: &Path,
    (width, height): (u32, u32),
    config: &RasterConfig,
) -> Result<(), RasterError> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels > config.max_decoded_pixels {
        return Err(RasterError::ResourceLimit {
            path: path.to_path_buf(),
            detail: format!(
                "图片像素过大：{}x{} = {} 像素（限制：{} 像素）",
                width, height, pixels, config.max_decoded_pixels
            ),
        });
    }
    Ok(())
}

/// 把解码结果转换为规范格式的帧。
pub(crate) fn normalize(path: &Path, decoded: DecodedFrame) -> Result<Frame, RasterError> {
    match decoded.format {
        DecodedFormat::Canonical(PixelFormat::Pal8) => expand_palette(path, &decoded),
        DecodedFormat::Canonical(format) => Frame::from_plane(
            decoded.width,
            decoded.height,
            format,
            decoded.stride,
            decoded.data,
            None,
        )
        .map_err(|e| RasterError::decode(path, e.to_string())),
        DecodedFormat::Other(format) => Err(RasterError::UnsupportedPixelFormat {
            path: path.to_path_buf(),
            format,
        }),
    }
}

fn expand_palette(path: &Path, decoded: &DecodedFrame) -> Result<Frame, RasterError> {
    let palette = decoded
        .palette
        .as_deref()
        .ok_or_else(|| RasterError::decode(path, "索引图缺少调色板"))?;

    let (width, height) = (decoded.width, decoded.height);
    let stride = decoded.stride;
    let plane_fits = stride >= width as usize
        && stride
            .checked_mul(height as usize)
            .is_some_and(|len| len <= decoded.data.len());
    if !plane_fits {
        return Err(RasterError::decode(
            path,
            format!(
                "索引平面过小：{} 字节，行跨度 {}，尺寸 {}x{}",
                decoded.data.len(),
                stride,
                width,
                height
            ),
        ));
    }

    let mut frame =
        Frame::new(width, height, PixelFormat::Rgb24).map_err(|e| RasterError::ContextAllocation {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    for y in 0..height {
        let row = &decoded.data[y as usize * stride..];
        for x in 0..width {
            let index = row[x as usize];
            frame.set_pixel(x, y, palette[index as usize]);
        }
    }

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{BLACK, PALETTE_SIZE, Palette, WHITE};
    use proptest::prelude::*;

    fn indexed(
        width: u32,
        height: u32,
        stride: usize,
        data: Vec<u8>,
        palette: Palette,
    ) -> DecodedFrame {
        DecodedFrame {
            width,
            height,
            format: DecodedFormat::Canonical(PixelFormat::Pal8),
            stride,
            data,
            palette: Some(Box::new(palette)),
        }
    }

    fn two_color_palette() -> Palette {
        let mut palette = [0xFF00_0000; PALETTE_SIZE];
        palette[0] = 0xFFFF_FFFF;
        palette[1] = 0xFF00_0000;
        palette
    }

    #[test]
    fn palette_expands_to_rgb() {
        let decoded = indexed(2, 2, 2, vec![0, 1, 1, 0], two_color_palette());
        let frame = normalize(Path::new("scan.png"), decoded).unwrap();

        assert_eq!(frame.format(), PixelFormat::Rgb24);
        assert_eq!(frame.get_pixel(0, 0), WHITE);
        assert_eq!(frame.get_pixel(1, 0), BLACK);
        assert_eq!(frame.get_pixel(0, 1), BLACK);
        assert_eq!(frame.get_pixel(1, 1), WHITE);
    }

    #[test]
    fn palette_expansion_uses_source_stride() {
        // 每行 3 个索引后跟 2 字节填充，目标帧为紧凑 RGB。
        let data = vec![0, 1, 0, 7, 7, 1, 0, 1, 7, 7];
        let decoded = indexed(3, 2, 5, data, two_color_palette());
        let frame = normalize(Path::new("padded.png"), decoded).unwrap();

        assert_eq!(frame.stride(), 9);
        assert_eq!(frame.get_pixel(0, 1), BLACK);
        assert_eq!(frame.get_pixel(1, 1), WHITE);
        assert_eq!(frame.get_pixel(2, 1), BLACK);
    }

    #[test]
    fn truncated_index_plane_is_a_decode_error() {
        let decoded = indexed(2, 2, 2, vec![0, 1, 1], two_color_palette());
        assert!(matches!(
            normalize(Path::new("short.png"), decoded),
            Err(RasterError::Decode { .. })
        ));
    }

    #[test]
    fn canonical_formats_pass_through_unchanged() {
        let decoded = DecodedFrame {
            width: 2,
            height: 1,
            format: DecodedFormat::Canonical(PixelFormat::Gray8A),
            stride: 4,
            data: vec![10, 255, 20, 128],
            palette: None,
        };
        let frame = normalize(Path::new("ya.png"), decoded).unwrap();
        assert_eq!(frame.format(), PixelFormat::Gray8A);
        assert_eq!(frame.data(), &[10, 255, 20, 128]);
    }

    #[test]
    fn other_formats_name_the_file() {
        let decoded = DecodedFrame {
            width: 1,
            height: 1,
            format: DecodedFormat::Other("Rgba8".to_string()),
            stride: 4,
            data: vec![0; 4],
            palette: None,
        };
        let err = normalize(Path::new("alpha.png"), decoded).unwrap_err();
        assert!(matches!(err, RasterError::UnsupportedPixelFormat { ref format, .. } if format == "Rgba8"));
        assert!(err.to_string().contains("alpha.png"));
    }

    #[test]
    fn pixel_budget_is_enforced() {
        let config = RasterConfig {
            max_decoded_pixels: 100,
            ..RasterConfig::default()
        };
        assert!(check_pixel_budget(Path::new("a.png"), (10, 10), &config).is_ok());
        assert!(matches!(
            check_pixel_budget(Path::new("a.png"), (11, 10), &config),
            Err(RasterError::ResourceLimit { .. })
        ));
    }

    proptest! {
        #[test]
        fn expanded_pixels_match_palette_lookup(
            width in 1u32..12,
            height in 1u32..12,
            padding in 0usize..4,
            seed in any::<u64>(),
            palette in proptest::collection::vec(any::<u32>(), PALETTE_SIZE),
        ) {
            let stride = width as usize + padding;
            let data: Vec<u8> = (0..stride * height as usize)
                .map(|i| (seed.rotate_left(i as u32 % 64) ^ i as u64) as u8)
                .collect();
            let mut table = [0u32; PALETTE_SIZE];
            table.copy_from_slice(&palette);

            let decoded = indexed(width, height, stride, data.clone(), table);
            let frame = normalize(Path::new("prop.png"), decoded).unwrap();

            prop_assert_eq!(frame.format(), PixelFormat::Rgb24);
            for y in 0..height {
                for x in 0..width {
                    let index = data[y as usize * stride + x as usize];
                    prop_assert_eq!(frame.get_pixel(x, y), table[index as usize] & WHITE);
                }
            }
        }
    }
}
