//! 规范像素格式到输出容器 / 编码格式的映射。
//!
//! 映射是对 `PixelFormat` 的穷举 `match`：新增格式而未补充映射时无法编译。

use crate::frame::PixelFormat;

/// 输出容器类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// 通用的单帧静态图片容器。
    StillImage,
}

impl ContainerKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::StillImage => "image2",
        }
    }
}

/// 输出编码格式，全部为无损 PNM 家族。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCodec {
    /// 全彩，P6。
    Ppm,
    /// 灰度，P5。
    Pgm,
    /// 1 位黑白，P4。
    Pbm,
}

impl OutputCodec {
    pub fn name(self) -> &'static str {
        match self {
            Self::Ppm => "ppm",
            Self::Pgm => "pgm",
            Self::Pbm => "pbm",
        }
    }

    /// 编码器接受的唯一像素格式。
    pub fn pixel_format(self) -> PixelFormat {
        match self {
            Self::Ppm => PixelFormat::Rgb24,
            Self::Pgm => PixelFormat::Gray8,
            Self::Pbm => PixelFormat::MonoWhite,
        }
    }
}

/// 目标像素格式对应的输出容器与编码格式。
pub fn output_target(desired: PixelFormat) -> (ContainerKind, OutputCodec) {
    let codec = match desired {
        PixelFormat::Rgb24 | PixelFormat::Pal8 => OutputCodec::Ppm,
        PixelFormat::Gray8 | PixelFormat::Gray8A => OutputCodec::Pgm,
        PixelFormat::MonoBlack | PixelFormat::MonoWhite => OutputCodec::Pbm,
    };
    (ContainerKind::StillImage, codec)
}

/// 编码时实际写入的像素格式：灰度 + alpha 归为灰度，两种黑白归为同一种，调色板展开为 RGB。
pub fn encode_format(desired: PixelFormat) -> PixelFormat {
    output_target(desired).1.pixel_format()
}
