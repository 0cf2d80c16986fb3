//! # 输出容器模块
//!
//! ## 设计思路
//!
//! 输出容器只有一个数据流、一个数据包。写入按“打开目标 → 写头 → 写包 → 写尾”进行，
//! 任何一步失败都立即返回，并且不留下写了一半的文件。
//!
//! ## 实现思路
//!
//! - 目标文件由 `OutputFile` 持有，采用 RAII：未提交就被丢弃时删除该文件。
//!   打开时截断已存在的同名文件，因此失败时目标文件被删除，包括已存在的同名文件。
//! - 写尾时刷新缓冲并同步到磁盘，成功后才标记为已提交。
//! - 静态图片容器没有独立的头尾字节，头尾步骤只做状态校验与落盘。

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::encoder::{OutputStream, Packet, TimeBase};
use super::mapping::{ContainerKind, OutputCodec};
use crate::error::RasterError;
use crate::frame::PixelFormat;

/// 正在写入的目标文件。
///
/// 未调用 `commit` 就被丢弃时删除文件。
struct OutputFile {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    committed: bool,
}

impl OutputFile {
    fn create(path: &Path) -> Result<Self, RasterError> {
        let file = File::create(path)
            .map_err(|e| RasterError::io(path, format!("无法打开输出文件：{}", e)))?;
        Ok(Self {
            writer: Some(BufWriter::new(file)),
            path: path.to_path_buf(),
            committed: false,
        })
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>, RasterError> {
        self.writer
            .as_mut()
            .ok_or_else(|| RasterError::io(&self.path, "输出文件已关闭"))
    }

    fn commit(&mut self) -> Result<(), RasterError> {
        let path = self.path.clone();
        let writer = self.writer()?;
        writer
            .flush()
            .map_err(|e| RasterError::io(&path, format!("刷新输出失败：{}", e)))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| RasterError::io(&path, format!("同步输出失败：{}", e)))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for OutputFile {
    fn drop(&mut self) {
        drop(self.writer.take());
        if self.committed {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => log::debug!("🧹 已删除未完成的输出文件: {}", self.path.display()),
            Err(err) => log::warn!(
                "⚠️ 删除未完成的输出文件失败 {}: {}",
                self.path.display(),
                err
            ),
        }
    }
}

/// 单流输出容器。
pub struct Muxer {
    kind: ContainerKind,
    path: PathBuf,
    stream: Option<OutputStream>,
    output: Option<OutputFile>,
    header_written: bool,
}

impl Muxer {
    pub fn new(kind: ContainerKind, path: &Path) -> Self {
        Self {
            kind,
            path: path.to_path_buf(),
            stream: None,
            output: None,
            header_written: false,
        }
    }

    /// 创建唯一的输出流，时间基固定为 1/1。
    pub fn new_stream(
        &mut self,
        codec: OutputCodec,
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
    ) -> Result<&OutputStream, RasterError> {
        let allocation_error = |detail: String| RasterError::StreamAllocation {
            path: self.path.clone(),
            detail,
        };

        if self.stream.is_some() {
            return Err(allocation_error(format!(
                "{} 容器只允许一个数据流",
                self.kind.name()
            )));
        }
        if width == 0 || height == 0 {
            return Err(allocation_error(format!("输出尺寸无效：{}x{}", width, height)));
        }

        Ok(self.stream.insert(OutputStream {
            index: 0,
            codec,
            width,
            height,
            pixel_format,
            time_base: TimeBase::UNIT,
        }))
    }

    /// 以日志形式输出容器与数据流信息。
    pub fn dump(&self) {
        log::info!(
            "📦 输出容器 {} - 格式: {}",
            self.path.display(),
            self.kind.name()
        );
        if let Some(stream) = &self.stream {
            log::info!(
                "    流 #{}: {} {}x{} {} (时间基 {}/{})",
                stream.index,
                stream.codec.name(),
                stream.width,
                stream.height,
                stream.pixel_format,
                stream.time_base.num,
                stream.time_base.den
            );
        }
    }

    /// 打开目标文件。
    pub fn open(&mut self) -> Result<(), RasterError> {
        if self.output.is_some() {
            return Err(RasterError::io(&self.path, "输出文件已打开"));
        }
        self.output = Some(OutputFile::create(&self.path)?);
        Ok(())
    }

    pub fn write_header(&mut self) -> Result<(), RasterError> {
        if self.stream.is_none() {
            return Err(RasterError::io(&self.path, "写头失败：没有输出流"));
        }
        if self.output.is_none() {
            return Err(RasterError::io(&self.path, "写头失败：输出文件未打开"));
        }
        self.header_written = true;
        Ok(())
    }

    pub fn write_packet(&mut self, packet: &Packet) -> Result<(), RasterError> {
        if !self.header_written {
            return Err(RasterError::io(&self.path, "写包失败：尚未写头"));
        }
        let stream_index = self.stream.as_ref().map(|stream| stream.index);
        if stream_index != Some(packet.stream_index) {
            return Err(RasterError::io(
                &self.path,
                format!("写包失败：数据包属于未知数据流 #{}", packet.stream_index),
            ));
        }

        let path = self.path.clone();
        let output = self
            .output
            .as_mut()
            .ok_or_else(|| RasterError::io(&path, "写包失败：输出文件未打开"))?;
        output
            .writer()?
            .write_all(&packet.data)
            .map_err(|e| RasterError::io(&path, format!("写包失败：{}", e)))
    }

    /// 写尾并提交文件；之后容器不可再用。
    pub fn write_trailer(mut self) -> Result<(), RasterError> {
        if !self.header_written {
            return Err(RasterError::io(&self.path, "写尾失败：尚未写头"));
        }
        let path = self.path.clone();
        self.output
            .as_mut()
            .ok_or_else(|| RasterError::io(&path, "写尾失败：输出文件未打开"))?
            .commit()
    }
}
