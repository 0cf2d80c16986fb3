//! # 保存模块
//!
//! ## 设计思路
//!
//! 保存流程固定为：确定输出容器 → 映射编码格式 → 规范化目标格式 → 必要时转换帧 →
//! 查找编码器 → 创建输出流 → 打开编码器 → 打开文件 → 写头 → 编码 → 写包 → 写尾。
//! 任何一步失败都立即返回，且不会留下写了一半的文件。
//!
//! ## 实现思路
//!
//! - 只有帧格式与编码格式不同时才分配临时帧（`Cow::Owned`），否则直接借用调用方的帧。
//! - 临时帧随 `Cow` 离开作用域释放；调用方的帧永远不会被修改或释放。

use std::borrow::Cow;
use std::path::Path;
use std::time::Instant;

use crate::codec::{self, Encoder, Muxer};
use crate::config::{self, Verbosity};
use crate::error::RasterError;
use crate::frame::{Frame, PixelFormat, copy_area};

/// 按目标像素格式把帧写入文件。
///
/// # 示例
/// ```rust,no_run
/// use rasterbridge::{Frame, PixelFormat, save};
///
/// let frame = Frame::new(64, 64, PixelFormat::Rgb24)?;
/// save("out.pbm", &frame, PixelFormat::MonoWhite)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn save(path: impl AsRef<Path>, frame: &Frame, desired: PixelFormat) -> Result<(), RasterError> {
    let path = path.as_ref();
    let config = config::config_snapshot();
    let started = Instant::now();

    let (container_kind, output_codec) = codec::output_target(desired);
    let encode_format = codec::encode_format(desired);

    let output = coerce(path, frame, encode_format)?;

    let encoder = Encoder::find(output_codec).ok_or_else(|| RasterError::EncoderNotFound {
        path: path.to_path_buf(),
        codec: output_codec.name().to_string(),
    })?;

    let mut muxer = Muxer::new(container_kind, path);
    let stream = muxer
        .new_stream(encoder.codec(), output.width(), output.height(), encode_format)?
        .clone();

    let encoder = encoder.open(&stream, path)?;
    if config.verbosity >= Verbosity::More {
        muxer.dump();
    }

    muxer.open()?;
    muxer.write_header()?;
    let packet = encoder.encode(&output, path)?;
    muxer.write_packet(&packet)?;
    muxer.write_trailer()?;

    log::info!(
        "💾 图片保存成功 - 文件: {} 编码: {} 尺寸: {}x{}{} 耗时: {}ms",
        path.display(),
        output_codec.name(),
        output.width(),
        output.height(),
        if matches!(output, Cow::Owned(_)) {
            format!("（由 {} 转换）", frame.format())
        } else {
            String::new()
        },
        started.elapsed().as_millis()
    );

    Ok(())
}

/// 帧已是目标格式时直接借用，否则分配临时帧并逐像素转换。
fn coerce<'a>(
    path: &Path,
    frame: &'a Frame,
    format: PixelFormat,
) -> Result<Cow<'a, Frame>, RasterError> {
    if frame.format() == format {
        return Ok(Cow::Borrowed(frame));
    }

    let mut converted = Frame::new(frame.width(), frame.height(), format).map_err(|e| {
        RasterError::ContextAllocation {
            path: path.to_path_buf(),
            detail: e.to_string(),
        }
    })?;
    copy_area(0, 0, frame.width(), frame.height(), frame, 0, 0, &mut converted);
    Ok(Cow::Owned(converted))
}
