//! # 光栅帧模块
//!
//! ## 设计思路
//!
//! 内存中的帧只使用少量“规范像素格式”，下游处理只需要理解这几种表示：
//! 8 位灰度、带 alpha 的 8 位灰度、24 位 RGB、两种 1 位黑白，以及仅在解码阶段出现的
//! 8 位索引（调色板）格式。
//!
//! ## 实现思路
//!
//! - `PixelFormat` 是封闭枚举，所有按格式分支的地方都使用穷举 `match`。
//! - `Frame` 持有单平面字节缓冲与行跨度（stride），行跨度可以大于最小行宽。
//! - 构造时校验不变量：`stride >= 最小行宽`，`buffer.len() >= stride * height`，
//!   索引格式必须带 256 项调色板。
//! - 像素读写见 `pixel`，区域复制见 `copy`。

mod copy;
mod pixel;

pub use copy::copy_area;
pub use pixel::{BLACK, BLACK_THRESHOLD, WHITE, blue, grayscale, green, red, rgb};

use crate::error::{FrameError, RasterError};

/// 调色板项数。
pub const PALETTE_SIZE: usize = 256;

/// 调色板：每项为 `0xAARRGGBB`。
pub type Palette = [u32; PALETTE_SIZE];

/// 规范像素格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8 位灰度。
    Gray8,
    /// 8 位灰度 + 8 位 alpha。
    Gray8A,
    /// 24 位 RGB。
    Rgb24,
    /// 1 位黑白，0 为黑、1 为白，高位在前。
    MonoBlack,
    /// 1 位黑白，0 为白、1 为黑，高位在前。
    MonoWhite,
    /// 8 位调色板索引。
    Pal8,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 6] = [
        Self::Gray8,
        Self::Gray8A,
        Self::Rgb24,
        Self::MonoBlack,
        Self::MonoWhite,
        Self::Pal8,
    ];

    pub fn bits_per_pixel(self) -> usize {
        match self {
            Self::Gray8 | Self::Pal8 => 8,
            Self::Gray8A => 16,
            Self::Rgb24 => 24,
            Self::MonoBlack | Self::MonoWhite => 1,
        }
    }

    /// 存放 `width` 个像素所需的最小行宽（字节）。
    pub fn min_stride(self, width: u32) -> usize {
        (width as usize * self.bits_per_pixel()).div_ceil(8)
    }

    pub fn is_monochrome(self) -> bool {
        matches!(self, Self::MonoBlack | Self::MonoWhite)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gray8 => "gray8",
            Self::Gray8A => "gray8a",
            Self::Rgb24 => "rgb24",
            Self::MonoBlack => "monoblack",
            Self::MonoWhite => "monowhite",
            Self::Pal8 => "pal8",
        }
    }

    /// 解析格式名称，接受常用别名（`gray` / `rgb` / `mono`）。
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(value: &str) -> Result<Self, RasterError> {
        match value.trim().to_lowercase().as_str() {
            "gray" | "grey" | "gray8" => Ok(Self::Gray8),
            "gray8a" | "ya8" => Ok(Self::Gray8A),
            "rgb" | "rgb24" | "color" => Ok(Self::Rgb24),
            "mono" | "monowhite" | "bw" => Ok(Self::MonoWhite),
            "monoblack" => Ok(Self::MonoBlack),
            "pal8" => Ok(Self::Pal8),
            other => Err(RasterError::InvalidSetting(format!(
                "未知像素格式：{}（可选：rgb / gray / mono）",
                other
            ))),
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 内存中的光栅帧。
///
/// 帧独立拥有自己的像素缓冲；克隆是深拷贝。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    format: PixelFormat,
    stride: usize,
    data: Vec<u8>,
    palette: Option<Box<Palette>>,
}

impl Frame {
    /// 分配一个全零的紧凑帧（行跨度等于最小行宽）。
    ///
    /// 索引格式附带全零调色板。
    ///
    /// # 示例
    /// ```rust
    /// use rasterbridge::{Frame, PixelFormat};
    ///
    /// let frame = Frame::new(10, 2, PixelFormat::MonoWhite)?;
    /// assert_eq!(frame.stride(), 2);
    /// # Ok::<(), rasterbridge::error::FrameError>(())
    /// ```
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self, FrameError> {
        check_dimensions(width, height)?;
        let stride = format.min_stride(width);
        let len = stride
            .checked_mul(height as usize)
            .ok_or(FrameError::Allocation(usize::MAX))?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| FrameError::Allocation(len))?;
        data.resize(len, 0);

        let palette = (format == PixelFormat::Pal8).then(|| Box::new([0u32; PALETTE_SIZE]));

        Ok(Self {
            width,
            height,
            format,
            stride,
            data,
            palette,
        })
    }

    /// 由已有平面缓冲构造帧，校验全部不变量。
    pub fn from_plane(
        width: u32,
        height: u32,
        format: PixelFormat,
        stride: usize,
        data: Vec<u8>,
        palette: Option<Box<Palette>>,
    ) -> Result<Self, FrameError> {
        check_dimensions(width, height)?;

        let required_stride = format.min_stride(width);
        if stride < required_stride {
            return Err(FrameError::StrideTooSmall {
                stride,
                required: required_stride,
            });
        }

        let required_len = stride
            .checked_mul(height as usize)
            .ok_or(FrameError::BufferTooSmall {
                len: data.len(),
                required: usize::MAX,
            })?;
        if data.len() < required_len {
            return Err(FrameError::BufferTooSmall {
                len: data.len(),
                required: required_len,
            });
        }

        let palette = match format {
            PixelFormat::Pal8 => Some(palette.ok_or(FrameError::MissingPalette)?),
            _ => None,
        };

        Ok(Self {
            width,
            height,
            format,
            stride,
            data,
            palette,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// 行跨度（字节）。
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// 仅索引格式带调色板。
    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_deref()
    }

    pub fn palette_mut(&mut self) -> Option<&mut Palette> {
        self.palette.as_deref_mut()
    }

    /// 第 `y` 行的有效字节（不含行尾填充）。
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.format.min_stride(self.width)]
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        let len = self.format.min_stride(self.width);
        &mut self.data[start..start + len]
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), FrameError> {
    if width == 0 || height == 0 {
        return Err(FrameError::InvalidDimensions { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_frames_are_tightly_packed() {
        let cases = [
            (PixelFormat::Gray8, 7),
            (PixelFormat::Gray8A, 14),
            (PixelFormat::Rgb24, 21),
            (PixelFormat::MonoBlack, 1),
            (PixelFormat::MonoWhite, 1),
            (PixelFormat::Pal8, 7),
        ];

        for (format, stride) in cases {
            let frame = Frame::new(7, 3, format).expect("allocation should succeed");
            assert_eq!(frame.stride(), stride, "{format}");
            assert_eq!(frame.data().len(), stride * 3, "{format}");
            assert_eq!(frame.palette().is_some(), format == PixelFormat::Pal8);
        }
    }

    #[test]
    fn mono_stride_rounds_up_to_whole_bytes() {
        assert_eq!(PixelFormat::MonoWhite.min_stride(8), 1);
        assert_eq!(PixelFormat::MonoWhite.min_stride(9), 2);
        assert_eq!(PixelFormat::MonoBlack.min_stride(17), 3);
    }

    #[test]
    fn zero_sized_frames_are_rejected() {
        assert_eq!(
            Frame::new(0, 4, PixelFormat::Gray8),
            Err(FrameError::InvalidDimensions { width: 0, height: 4 })
        );
    }

    #[test]
    fn from_plane_checks_stride_and_length() {
        assert_eq!(
            Frame::from_plane(4, 2, PixelFormat::Rgb24, 10, vec![0; 40], None),
            Err(FrameError::StrideTooSmall {
                stride: 10,
                required: 12
            })
        );
        assert_eq!(
            Frame::from_plane(4, 2, PixelFormat::Gray8, 6, vec![0; 11], None),
            Err(FrameError::BufferTooSmall {
                len: 11,
                required: 12
            })
        );
        assert_eq!(
            Frame::from_plane(4, 2, PixelFormat::Pal8, 4, vec![0; 8], None),
            Err(FrameError::MissingPalette)
        );
    }

    #[test]
    fn padded_rows_exclude_padding() {
        let data = vec![1, 2, 3, 99, 4, 5, 6, 99];
        let frame = Frame::from_plane(3, 2, PixelFormat::Gray8, 4, data, None)
            .expect("valid padded plane");
        assert_eq!(frame.row(0), &[1, 2, 3]);
        assert_eq!(frame.row(1), &[4, 5, 6]);
    }

    #[test]
    fn palette_is_dropped_for_direct_color_formats() {
        let frame = Frame::from_plane(
            1,
            1,
            PixelFormat::Gray8,
            1,
            vec![0],
            Some(Box::new([0; PALETTE_SIZE])),
        )
        .expect("valid plane");
        assert!(frame.palette().is_none());
    }

    #[test]
    fn format_names_parse_with_aliases() {
        assert_eq!(PixelFormat::from_str("gray").unwrap(), PixelFormat::Gray8);
        assert_eq!(PixelFormat::from_str("RGB").unwrap(), PixelFormat::Rgb24);
        assert_eq!(PixelFormat::from_str("mono").unwrap(), PixelFormat::MonoWhite);
        for format in PixelFormat::ALL {
            assert_eq!(PixelFormat::from_str(format.as_str()).unwrap(), format);
        }
        assert!(PixelFormat::from_str("cmyk").is_err());
    }
}
