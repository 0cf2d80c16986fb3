//! # 加载 / 保存模块（bridge）
//!
//! ## 设计思路
//!
//! 对外只有三个入口：
//!
//! ```text
//! load(path)                 文件 → 规范格式的帧
//!    ↓
//! （外部处理阶段）
//!    ↓
//! save(path, frame, format)  帧 → 无损 PNM 文件
//!
//! snapshot(template, i, frame)  任意阶段之后按输出级别保存调试快照
//! ```
//!
//! ## 实现思路
//!
//! 三个入口都是同步、无共享可变状态的；每次调用独占自己的容器与编解码器句柄，
//! 返回前全部释放。容器 / 编解码细节在 `codec` 模块。

mod loader;
mod saver;
mod snapshot;

pub use loader::load;
pub use saver::save;
pub use snapshot::{render_template, snapshot, snapshot_at};
