//! # rasterbridge：光栅图片文件与内存帧之间的桥
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  调用方（处理流水线 / CLI）               │
//! │        load ──→ 处理阶段 ──→ save      snapshot           │
//! └───────┬───────────────────────────┬──────────────────────┘
//!         ↕ Result<T, RasterError>    ↕
//! ┌───────┼───────────────────────────┼──────────────────────┐
//! │  ┌─ bridge ───── load / save / snapshot 流程编排          │
//! │  │                                                       │
//! │  ├─ codec ────── 容器探测 · 解码 · 格式映射 · 编码 · 落盘 │
//! │  │                                                       │
//! │  ├─ frame ────── 规范像素格式 · 帧缓冲 · 像素读写 · 区域复制│
//! │  │                                                       │
//! │  ├─ config ───── 输出级别 · 解码像素上限（运行时只读）    │
//! │  └─ error ────── RasterError（统一错误类型）              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`bridge`] | 加载、保存、调试快照三条流程 |
//! | [`codec`] | 输入容器探测、解码器选择、输出编码与容器写入 |
//! | [`frame`] | `Frame` / `PixelFormat`，像素读写与区域复制 |
//! | [`config`] | `Verbosity`、`RasterConfig` 与全局运行时配置 |
//! | [`error`] | `RasterError` / `FrameError` |

pub mod bridge;
pub mod codec;
pub mod config;
pub mod error;
pub mod frame;

pub use bridge::{load, save, snapshot};
pub use error::{FrameError, RasterError};
pub use frame::{Frame, PixelFormat};
