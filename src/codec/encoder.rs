//! # 编码模块
//!
//! ## 设计思路
//!
//! 编码分为“查找编码器 → 按输出流参数打开 → 把一帧编码成一个数据包”三步，
//! 每一步都有自己的失败类型，方便定位问题。
//!
//! ## 实现思路
//!
//! - 编码器由 `image` 的 `PnmEncoder` 提供，按编码格式选择 P6 / P5 / P4 子类型。
//! - 打开时校验输出流参数与编码器是否匹配（像素格式、尺寸、时间基）。
//! - 编码前把帧整理成紧凑样本（去掉行尾填充；1 位黑白展开为 0 黑 / 1 白的样本，
//!   与 P4 头部的最大值 1 对应）。

use std::path::Path;

use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{ExtendedColorType, ImageEncoder, ImageFormat};

use super::mapping::OutputCodec;
use crate::error::RasterError;
use crate::frame::{Frame, PixelFormat};

/// 时间基（分数）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBase {
    pub num: u32,
    pub den: u32,
}

impl TimeBase {
    /// 静态图片使用单位时间基。
    pub const UNIT: TimeBase = TimeBase { num: 1, den: 1 };
}

/// 输出流参数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputStream {
    pub index: usize,
    pub codec: OutputCodec,
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    pub time_base: TimeBase,
}

/// 一个编码后的数据包。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub stream_index: usize,
    pub data: Vec<u8>,
}

/// 尚未打开的编码器。
#[derive(Debug, Clone, Copy)]
pub struct Encoder {
    codec: OutputCodec,
}

impl Encoder {
    /// 查找编码器；后端未启用 PNM 写入时返回 `None`。
    pub fn find(codec: OutputCodec) -> Option<Self> {
        ImageFormat::Pnm
            .writing_enabled()
            .then_some(Self { codec })
    }

    pub fn codec(&self) -> OutputCodec {
        self.codec
    }

    /// 按输出流参数打开编码器。
    pub fn open(self, stream: &OutputStream, path: &Path) -> Result<OpenEncoder, RasterError> {
        let codec_open = |detail: String| RasterError::CodecOpen {
            path: path.to_path_buf(),
            detail,
        };

        if stream.codec != self.codec {
            return Err(codec_open(format!(
                "输出流编码 {} 与编码器 {} 不一致",
                stream.codec.name(),
                self.codec.name()
            )));
        }
        if stream.pixel_format != self.codec.pixel_format() {
            return Err(codec_open(format!(
                "{} 编码器不支持像素格式 {}",
                self.codec.name(),
                stream.pixel_format
            )));
        }
        if stream.width == 0 || stream.height == 0 {
            return Err(codec_open(format!(
                "输出尺寸无效：{}x{}",
                stream.width, stream.height
            )));
        }
        if stream.time_base.num == 0 || stream.time_base.den == 0 {
            return Err(codec_open("时间基无效".to_string()));
        }

        Ok(OpenEncoder {
            codec: self.codec,
            stream: stream.clone(),
        })
    }
}

/// 已打开的编码器，绑定到一个输出流。
#[derive(Debug)]
pub struct OpenEncoder {
    codec: OutputCodec,
    stream: OutputStream,
}

impl OpenEncoder {
    /// 把一帧编码为恰好一个数据包。
    pub fn encode(&self, frame: &Frame, path: &Path) -> Result<Packet, RasterError> {
        let encode_error = |detail: String| RasterError::Encode {
            path: path.to_path_buf(),
            detail,
        };

        if frame.format() != self.stream.pixel_format
            || frame.width() != self.stream.width
            || frame.height() != self.stream.height
        {
            return Err(encode_error(format!(
                "帧参数 {}x{} {} 与输出流 {}x{} {} 不一致",
                frame.width(),
                frame.height(),
                frame.format(),
                self.stream.width,
                self.stream.height,
                self.stream.pixel_format
            )));
        }

        let (subtype, color_type) = match self.codec {
            OutputCodec::Ppm => (
                PnmSubtype::Pixmap(SampleEncoding::Binary),
                ExtendedColorType::Rgb8,
            ),
            OutputCodec::Pgm => (
                PnmSubtype::Graymap(SampleEncoding::Binary),
                ExtendedColorType::L8,
            ),
            OutputCodec::Pbm => (
                PnmSubtype::Bitmap(SampleEncoding::Binary),
                ExtendedColorType::L8,
            ),
        };

        let samples = tight_samples(frame);
        let mut data = Vec::new();
        PnmEncoder::new(&mut data)
            .with_subtype(subtype)
            .write_image(&samples, frame.width(), frame.height(), color_type)
            .map_err(|e| encode_error(e.to_string()))?;

        Ok(Packet {
            stream_index: self.stream.index,
            data,
        })
    }
}

/// 去掉行尾填充的样本；1 位黑白展开为每像素一个字节（黑 0，白 1）。
fn tight_samples(frame: &Frame) -> Vec<u8> {
    let width = frame.width() as usize;
    let row_len = frame.format().min_stride(frame.width()).max(width);
    let mut samples = Vec::with_capacity(row_len * frame.height() as usize);

    for y in 0..frame.height() {
        let row = frame.row(y);
        match frame.format() {
            PixelFormat::MonoBlack | PixelFormat::MonoWhite => {
                let black_bit = frame.format() == PixelFormat::MonoWhite;
                samples.extend((0..width).map(|x| {
                    let bit = row[x / 8] & (0x80 >> (x % 8)) != 0;
                    if bit == black_bit { 0 } else { 1 }
                }));
            }
            _ => samples.extend_from_slice(row),
        }
    }
    samples
}
