//! # 解码模块
//!
//! ## 设计思路
//!
//! 按数据流的编码格式选择解码器，并且只解出一帧。
//! 解码结果保留后端给出的原始像素表示（包括调色板索引平面），规范化交给加载器。
//!
//! ## 实现思路
//!
//! - PNG：直接使用 `png` crate 且不做任何变换，这样索引图仍然是“索引平面 + 调色板”。
//!   1 位灰度视为黑白（0 为黑）；2/4 位灰度放大到 8 位；低位深索引展开为 8 位索引。
//! - PNM：使用 `image` 的 `PnmDecoder`，PBM 子类型报告为 1 位黑白（1 为黑）。
//! - 其它 `image` 能读取的格式：按解码器报告的颜色类型映射。
//! - 像素缓冲区使用 `try_reserve_exact` 分配，失败时报告内存分配错误而不是直接中止。

use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::codecs::pnm::{PnmDecoder, PnmSubtype};
use image::{ColorType, ImageDecoder, ImageFormat, ImageReader};

use super::probe::StreamInfo;
use crate::error::RasterError;
use crate::frame::{PALETTE_SIZE, Palette, PixelFormat};

/// 调色板中未定义项的取值：不透明黑。
const UNSET_PALETTE_ENTRY: u32 = 0xFF00_0000;

/// 解码器输出的像素表示。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedFormat {
    Canonical(PixelFormat),
    /// 规范格式之外的表示，保留后端名称用于报错。
    Other(String),
}

/// 解码出的单帧原始数据。
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub format: DecodedFormat,
    pub stride: usize,
    pub data: Vec<u8>,
    pub palette: Option<Box<Palette>>,
}

/// 已初始化的单流解码器。
pub enum StreamDecoder {
    Png(png::Reader<BufReader<File>>),
    Image {
        decoder: Box<dyn ImageDecoder>,
        /// PBM：1 位黑白，`image` 以 0 / 255 的灰度交付。
        bitmap: bool,
    },
}

impl StreamDecoder {
    /// 为数据流查找并初始化解码器。
    pub fn open(
        stream: &StreamInfo,
        reader: BufReader<File>,
        path: &Path,
    ) -> Result<Self, RasterError> {
        let unsupported = |detail: String| RasterError::UnsupportedCodec {
            path: path.to_path_buf(),
            detail,
        };

        let format = stream
            .codec
            .ok_or_else(|| unsupported(format!("没有可用的解码器：{}", stream.mime)))?;
        if !format.reading_enabled() {
            return Err(unsupported(format!("解码器未启用：{:?}", format)));
        }

        match format {
            ImageFormat::Png => {
                let mut decoder = png::Decoder::new(reader);
                decoder.set_transformations(png::Transformations::IDENTITY);
                let reader = decoder
                    .read_info()
                    .map_err(|e| unsupported(format!("PNG 解码器初始化失败：{}", e)))?;
                Ok(Self::Png(reader))
            }
            ImageFormat::Pnm => {
                let decoder = PnmDecoder::new(reader)
                    .map_err(|e| unsupported(format!("PNM 解码器初始化失败：{}", e)))?;
                let bitmap = matches!(decoder.subtype(), PnmSubtype::Bitmap(_));
                Ok(Self::Image {
                    decoder: Box::new(decoder),
                    bitmap,
                })
            }
            other => {
                let decoder = ImageReader::with_format(reader, other)
                    .into_decoder()
                    .map_err(|e| unsupported(format!("{:?} 解码器初始化失败：{}", other, e)))?;
                Ok(Self::Image {
                    decoder: Box::new(decoder),
                    bitmap: false,
                })
            }
        }
    }

    /// 文件头声明的尺寸。
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Png(reader) => reader.info().size(),
            Self::Image { decoder, .. } => decoder.dimensions(),
        }
    }

    /// 解码恰好一帧。
    pub fn decode(self, path: &Path) -> Result<DecodedFrame, RasterError> {
        match self {
            Self::Png(reader) => decode_png(reader, path),
            Self::Image { decoder, bitmap } => decode_image(decoder, bitmap, path),
        }
    }
}

fn allocate(len: usize, path: &Path) -> Result<Vec<u8>, RasterError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|e| RasterError::ContextAllocation {
            path: path.to_path_buf(),
            detail: format!("无法分配 {} 字节像素缓冲：{}", len, e),
        })?;
    buffer.resize(len, 0);
    Ok(buffer)
}

fn decode_png(
    mut reader: png::Reader<BufReader<File>>,
    path: &Path,
) -> Result<DecodedFrame, RasterError> {
    let mut buffer = allocate(reader.output_buffer_size(), path)?;
    let output = reader
        .next_frame(&mut buffer)
        .map_err(|e| RasterError::decode(path, format!("PNG 帧解码失败：{}", e)))?;
    buffer.truncate(output.buffer_size());

    let (width, height) = (output.width, output.height);
    let stride = output.line_size;
    let frame = |format: PixelFormat, stride: usize, data: Vec<u8>| DecodedFrame {
        width,
        height,
        format: DecodedFormat::Canonical(format),
        stride,
        data,
        palette: None,
    };

    use png::{BitDepth, ColorType as PngColor};
    let decoded = match (output.color_type, output.bit_depth) {
        (PngColor::Grayscale, BitDepth::One) => frame(PixelFormat::MonoBlack, stride, buffer),
        (PngColor::Grayscale, depth @ (BitDepth::Two | BitDepth::Four)) => {
            let bits = depth as u8;
            let scale = u8::MAX / ((1u8 << bits) - 1);
            let mut samples = unpack_samples(&buffer, stride, width, height, bits);
            samples.iter_mut().for_each(|sample| *sample *= scale);
            frame(PixelFormat::Gray8, width as usize, samples)
        }
        (PngColor::Grayscale, BitDepth::Eight) => frame(PixelFormat::Gray8, stride, buffer),
        (PngColor::GrayscaleAlpha, BitDepth::Eight) => frame(PixelFormat::Gray8A, stride, buffer),
        (PngColor::Rgb, BitDepth::Eight) => frame(PixelFormat::Rgb24, stride, buffer),
        (PngColor::Indexed, depth) => {
            let info = reader.info();
            let plte = info
                .palette
                .as_ref()
                .ok_or_else(|| RasterError::decode(path, "索引图缺少调色板（PLTE）"))?;
            let palette = pack_palette(plte, info.trns.as_deref());

            let (stride, indices) = match depth {
                BitDepth::Eight => (stride, buffer),
                BitDepth::Sixteen => {
                    return Err(RasterError::decode(path, "索引图位深无效：16"));
                }
                packed => (
                    width as usize,
                    unpack_samples(&buffer, stride, width, height, packed as u8),
                ),
            };

            DecodedFrame {
                palette: Some(palette),
                ..frame(PixelFormat::Pal8, stride, indices)
            }
        }
        (color, depth) => DecodedFrame {
            format: DecodedFormat::Other(format!("PNG {:?} {} 位", color, depth as u8)),
            ..frame(PixelFormat::Gray8, stride, buffer)
        },
    };

    Ok(decoded)
}

fn decode_image(
    decoder: Box<dyn ImageDecoder>,
    bitmap: bool,
    path: &Path,
) -> Result<DecodedFrame, RasterError> {
    let (width, height) = decoder.dimensions();
    let color = decoder.color_type();
    let len = usize::try_from(decoder.total_bytes()).map_err(|_| RasterError::ContextAllocation {
        path: path.to_path_buf(),
        detail: format!("像素缓冲过大：{} 字节", decoder.total_bytes()),
    })?;

    let mut buffer = allocate(len, path)?;
    decoder
        .read_image_boxed(&mut buffer)
        .map_err(|e| RasterError::decode(path, format!("图像解码失败：{}", e)))?;

    let bytes_per_pixel = usize::from(color.bytes_per_pixel());
    let tight_stride = width as usize * bytes_per_pixel;
    let (format, stride, data) = match color {
        ColorType::L8 if bitmap => {
            let stride = PixelFormat::MonoWhite.min_stride(width);
            (
                DecodedFormat::Canonical(PixelFormat::MonoWhite),
                stride,
                pack_bitmap(&buffer, width, height),
            )
        }
        ColorType::L8 => (DecodedFormat::Canonical(PixelFormat::Gray8), tight_stride, buffer),
        ColorType::La8 => (DecodedFormat::Canonical(PixelFormat::Gray8A), tight_stride, buffer),
        ColorType::Rgb8 => (DecodedFormat::Canonical(PixelFormat::Rgb24), tight_stride, buffer),
        other => (DecodedFormat::Other(format!("{:?}", other)), tight_stride, buffer),
    };

    Ok(DecodedFrame {
        width,
        height,
        format,
        stride,
        data,
        palette: None,
    })
}

/// PLTE（RGB 三元组）与可选 tRNS（alpha）打包为 `0xAARRGGBB`。
fn pack_palette(plte: &Cow<'_, [u8]>, trns: Option<&[u8]>) -> Box<Palette> {
    let mut palette = Box::new([UNSET_PALETTE_ENTRY; PALETTE_SIZE]);
    for (index, entry) in plte.chunks_exact(3).take(PALETTE_SIZE).enumerate() {
        let alpha = trns
            .and_then(|alpha| alpha.get(index).copied())
            .unwrap_or(u8::MAX);
        palette[index] = (u32::from(alpha) << 24)
            | (u32::from(entry[0]) << 16)
            | (u32::from(entry[1]) << 8)
            | u32::from(entry[2]);
    }
    palette
}

/// 把高位在前的 1/2/4 位样本展开为每像素一个字节（紧凑行）。
fn unpack_samples(packed: &[u8], stride: usize, width: u32, height: u32, bits: u8) -> Vec<u8> {
    let per_byte = (8 / bits) as usize;
    let mask = (1u8 << bits) - 1;
    let width = width as usize;

    let mut samples = Vec::with_capacity(width * height as usize);
    for row in packed.chunks(stride).take(height as usize) {
        for x in 0..width {
            let shift = 8 - bits as usize * (x % per_byte + 1);
            samples.push((row[x / per_byte] >> shift) & mask);
        }
    }
    samples
}

/// PBM 灰度样本（0 为黑）打包为 1 位、1 为黑的行。
fn pack_bitmap(samples: &[u8], width: u32, height: u32) -> Vec<u8> {
    let width = width as usize;
    let stride = PixelFormat::MonoWhite.min_stride(width as u32);
    let mut packed = vec![0u8; stride * height as usize];
    for (row, out) in samples.chunks(width).zip(packed.chunks_mut(stride)) {
        for (x, &sample) in row.iter().enumerate() {
            if sample == 0 {
                out[x / 8] |= 0x80 >> (x % 8);
            }
        }
    }
    packed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_packs_rgb_with_optional_alpha() {
        let plte: Cow<'_, [u8]> = Cow::Owned(vec![0xFF, 0xFF, 0xFF, 0x10, 0x20, 0x30]);
        let palette = pack_palette(&plte, Some(&[0x80]));
        assert_eq!(palette[0], 0x80FF_FFFF);
        assert_eq!(palette[1], 0xFF10_2030);
        assert_eq!(palette[2], UNSET_PALETTE_ENTRY);
    }

    #[test]
    fn two_bit_samples_unpack_per_row() {
        let packed = [0b0001_1000, 0xAA, 0b1110_0100, 0xAA];
        let samples = unpack_samples(&packed, 2, 3, 2, 2);
        assert_eq!(samples, vec![0, 1, 2, 3, 2, 1]);
    }

    #[test]
    fn four_bit_samples_unpack() {
        let samples = unpack_samples(&[0xF1, 0x20], 2, 3, 1, 4);
        assert_eq!(samples, vec![15, 1, 2]);
    }

    #[test]
    fn bitmap_packs_black_as_one() {
        let samples = [0, 255, 255, 0, 0, 0, 0, 0, 255, 0];
        let packed = pack_bitmap(&samples, 10, 1);
        assert_eq!(packed, vec![0b1001_1111, 0b0100_0000]);
    }
}
