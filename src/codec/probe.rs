//! # 容器探测模块
//!
//! ## 设计思路
//!
//! 在真正解码之前先回答两个问题：这是不是一个媒体容器？它的首个数据流是什么类型？
//! 只看文件头部，尽早失败，避免为无法处理的文件分配解码资源。
//!
//! ## 实现思路
//!
//! - 读取前 `PROBE_WINDOW_BYTES` 字节，之后把读取位置复位到文件开头，交给解码器。
//! - 先用 `infer` 按签名分类（图片 / 视频 / 音频 / 其它），
//!   `infer` 不认识的签名（PNM 家族、TGA 等）再交给 `image::guess_format`。
//! - 空文件视为“没有任何数据流”；两者都无法识别时视为容器打开失败。
//! - 静态图片容器只有一个数据流，编码格式用 `image::ImageFormat` 表示。

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::error::RasterError;

const PROBE_WINDOW_BYTES: usize = 4096;

/// 数据流类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Image,
    Video,
    Audio,
}

impl StreamKind {
    /// 图像与视频流都可以解码出画面。
    pub fn is_visual(self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

/// 探测得到的数据流信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub index: usize,
    pub kind: StreamKind,
    /// 解码该流所需的编码格式；`None` 表示后端不认识。
    pub codec: Option<ImageFormat>,
    pub mime: &'static str,
}

/// 已打开并完成探测的输入容器。
///
/// 持有文件句柄，离开作用域即释放。
pub struct Container {
    path: PathBuf,
    reader: BufReader<File>,
    streams: Vec<StreamInfo>,
    byte_len: u64,
}

impl Container {
    /// 打开文件并探测数据流。
    pub fn open(path: &Path) -> Result<Self, RasterError> {
        let open_error = |detail: String| RasterError::ContainerOpen {
            path: path.to_path_buf(),
            detail,
        };

        let file = File::open(path).map_err(|e| open_error(e.to_string()))?;
        let byte_len = file
            .metadata()
            .map_err(|e| open_error(format!("无法读取文件信息：{}", e)))?
            .len();

        let mut reader = BufReader::new(file);
        let mut head = Vec::with_capacity(PROBE_WINDOW_BYTES);
        reader
            .by_ref()
            .take(PROBE_WINDOW_BYTES as u64)
            .read_to_end(&mut head)
            .map_err(|e| open_error(format!("读取文件头失败：{}", e)))?;
        reader
            .rewind()
            .map_err(|e| open_error(format!("文件头复位失败：{}", e)))?;

        let streams =
            probe_streams(&head).ok_or_else(|| open_error("无法识别容器格式".to_string()))?;

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            streams,
            byte_len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    /// 交出已复位到开头的读取器，容器本身随之结束。
    pub fn into_reader(self) -> BufReader<File> {
        self.reader
    }

    /// 以日志形式输出容器与数据流信息。
    pub fn dump(&self) {
        log::info!(
            "📦 输入容器 {} - 大小: {} 字节, 数据流: {}",
            self.path.display(),
            self.byte_len,
            self.streams.len()
        );
        for stream in &self.streams {
            log::info!(
                "    流 #{}: {} ({}, 编码: {})",
                stream.index,
                stream.kind.as_str(),
                stream.mime,
                stream
                    .codec
                    .map_or_else(|| "未知".to_string(), |codec| format!("{:?}", codec))
            );
        }
    }
}

/// 根据文件头推断数据流；无法识别时返回 `None`。
pub(crate) fn probe_streams(head: &[u8]) -> Option<Vec<StreamInfo>> {
    if head.is_empty() {
        return Some(Vec::new());
    }

    if let Some(kind) = infer::get(head) {
        let stream_kind = match kind.matcher_type() {
            infer::MatcherType::Image => StreamKind::Image,
            infer::MatcherType::Video => StreamKind::Video,
            infer::MatcherType::Audio => StreamKind::Audio,
            _ => return None,
        };

        let codec = match stream_kind {
            StreamKind::Image => ImageFormat::from_mime_type(kind.mime_type())
                .or_else(|| image::guess_format(head).ok()),
            StreamKind::Video | StreamKind::Audio => None,
        };

        return Some(vec![StreamInfo {
            index: 0,
            kind: stream_kind,
            codec,
            mime: kind.mime_type(),
        }]);
    }

    let format = image::guess_format(head).ok()?;
    Some(vec![StreamInfo {
        index: 0,
        kind: StreamKind::Image,
        codec: Some(format),
        mime: format.to_mime_type(),
    }])
}
