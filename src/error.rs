//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 加载 / 保存链路中的每一个步骤都对应一个独立的错误分支，调用方可以按分支匹配，
//! 而不是解析字符串。所有分支都携带出错的文件路径，以及后端能给出的诊断信息。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 后端错误（`std::io::Error`、`image::ImageError`、`png::DecodingError`）在出错的那一步
//!   通过 `map_err` 转换，保证“哪一步失败就报哪一类错误”。
//! - 帧缓冲区自身的约束错误使用独立的 `FrameError`，不依赖文件路径。

use std::path::{Path, PathBuf};

/// 加载 / 保存链路的统一错误类型。
///
/// 所有错误对当前操作都是致命的：不会返回部分结果，也不会在内部重试。
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("无法打开文件 {}：{detail}", .path.display())]
    ContainerOpen { path: PathBuf, detail: String },

    #[error("无法打开文件 {}：缺少数据流", .path.display())]
    NoImageStream { path: PathBuf },

    #[error("无法打开文件 {}：首个数据流类型错误（{kind}）", .path.display())]
    WrongStreamKind { path: PathBuf, kind: String },

    #[error("无法打开文件 {}：不支持的编码格式（{detail}）", .path.display())]
    UnsupportedCodec { path: PathBuf, detail: String },

    #[error("解码 {} 失败：{detail}", .path.display())]
    Decode { path: PathBuf, detail: String },

    #[error("无法打开文件 {}：不支持的像素格式（{format}）", .path.display())]
    UnsupportedPixelFormat { path: PathBuf, format: String },

    #[error("写入 {} 失败：找不到输出编码器（{codec}）", .path.display())]
    EncoderNotFound { path: PathBuf, codec: String },

    #[error("写入 {} 失败：无法创建输出流（{detail}）", .path.display())]
    StreamAllocation { path: PathBuf, detail: String },

    #[error("写入 {} 失败：无法打开编码器（{detail}）", .path.display())]
    CodecOpen { path: PathBuf, detail: String },

    #[error("文件 {} 读写失败：{detail}", .path.display())]
    Io { path: PathBuf, detail: String },

    #[error("编码 {} 失败：{detail}", .path.display())]
    Encode { path: PathBuf, detail: String },

    #[error("处理 {} 时内存分配失败：{detail}", .path.display())]
    ContextAllocation { path: PathBuf, detail: String },

    #[error("资源限制（{}）：{detail}", .path.display())]
    ResourceLimit { path: PathBuf, detail: String },

    #[error("调试文件名模板无效 `{template}`：{detail}")]
    InvalidTemplate { template: String, detail: String },

    #[error("参数无效：{0}")]
    InvalidSetting(String),
}

impl RasterError {
    /// 出错的文件路径（模板与参数错误没有路径）。
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::ContainerOpen { path, .. }
            | Self::NoImageStream { path }
            | Self::WrongStreamKind { path, .. }
            | Self::UnsupportedCodec { path, .. }
            | Self::Decode { path, .. }
            | Self::UnsupportedPixelFormat { path, .. }
            | Self::EncoderNotFound { path, .. }
            | Self::StreamAllocation { path, .. }
            | Self::CodecOpen { path, .. }
            | Self::Io { path, .. }
            | Self::Encode { path, .. }
            | Self::ContextAllocation { path, .. }
            | Self::ResourceLimit { path, .. } => Some(path),
            Self::InvalidTemplate { .. } | Self::InvalidSetting(_) => None,
        }
    }

    /// 稳定的错误代码，便于日志检索与断言。
    pub fn code(&self) -> &'static str {
        match self {
            Self::ContainerOpen { .. } => "CONTAINER_OPEN",
            Self::NoImageStream { .. } => "NO_IMAGE_STREAM",
            Self::WrongStreamKind { .. } => "WRONG_STREAM_KIND",
            Self::UnsupportedCodec { .. } => "UNSUPPORTED_CODEC",
            Self::Decode { .. } => "DECODE",
            Self::UnsupportedPixelFormat { .. } => "UNSUPPORTED_PIXEL_FORMAT",
            Self::EncoderNotFound { .. } => "ENCODER_NOT_FOUND",
            Self::StreamAllocation { .. } => "STREAM_ALLOCATION",
            Self::CodecOpen { .. } => "CODEC_OPEN",
            Self::Io { .. } => "IO",
            Self::Encode { .. } => "ENCODE",
            Self::ContextAllocation { .. } => "CONTEXT_ALLOCATION",
            Self::ResourceLimit { .. } => "RESOURCE_LIMIT",
            Self::InvalidTemplate { .. } => "INVALID_TEMPLATE",
            Self::InvalidSetting(_) => "INVALID_SETTING",
        }
    }

    pub(crate) fn io(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            detail: err.to_string(),
        }
    }

    pub(crate) fn decode(path: &Path, detail: impl Into<String>) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            detail: detail.into(),
        }
    }
}

/// 帧缓冲区约束错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("帧尺寸无效：{width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("行跨度过小：{stride}（至少 {required}）")]
    StrideTooSmall { stride: usize, required: usize },

    #[error("像素缓冲区过小：{len} 字节（至少 {required}）")]
    BufferTooSmall { len: usize, required: usize },

    #[error("索引格式缺少调色板")]
    MissingPalette,

    #[error("帧内存分配失败：{0} 字节")]
    Allocation(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_file_error_carries_its_path() {
        let err = RasterError::NoImageStream {
            path: PathBuf::from("scan.png"),
        };
        assert_eq!(err.path(), Some(Path::new("scan.png")));
        assert_eq!(err.code(), "NO_IMAGE_STREAM");
        assert!(err.to_string().contains("scan.png"));
    }

    #[test]
    fn template_errors_have_no_path() {
        let err = RasterError::InvalidTemplate {
            template: "a%d%d".to_string(),
            detail: "多个占位符".to_string(),
        };
        assert!(err.path().is_none());
        assert!(err.to_string().contains("a%d%d"));
    }
}
