//! # 编解码后端模块（codec）
//!
//! ## 设计思路
//!
//! 把“容器 / 数据流 / 编解码器”这一层与加载、保存的业务流程分开：
//!
//! - `probe`：打开输入容器，探测数据流类型与编码格式
//! - `decoder`：按编码格式选择解码器，解出一帧原始像素
//! - `mapping`：规范像素格式 → 输出容器 / 编码格式
//! - `encoder`：查找、打开编码器，把一帧编码成一个数据包
//! - `muxer`：单流输出容器，负责落盘与失败清理
//!
//! ## 实现思路
//!
//! 每个句柄（文件、解码器、编码器、输出文件）都由拥有它的值管理，
//! 任何提前返回都会在离开作用域时释放之前获得的句柄。

mod decoder;
mod encoder;
mod mapping;
mod muxer;
mod probe;

pub use decoder::{DecodedFormat, DecodedFrame, StreamDecoder};
pub use encoder::{Encoder, OpenEncoder, OutputStream, Packet, TimeBase};
pub use mapping::{ContainerKind, OutputCodec, encode_format, output_target};
pub use muxer::Muxer;
pub use probe::{Container, StreamInfo, StreamKind};
