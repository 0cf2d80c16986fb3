//! # 配置模块
//!
//! ## 设计思路
//!
//! 加载 / 保存本身是无状态的，唯一需要跨调用共享的是“运行时配置”：
//! 输出详细程度（决定是否落盘调试快照）以及解码像素上限。
//! 这些值对核心逻辑只读，由外层（命令行、设置文件）写入。
//!
//! ## 实现思路
//!
//! - `Default` 提供可直接使用的配置。
//! - `Verbosity` 负责档位字符串 / 数字解析与反向输出。
//! - 全局配置保存在 `Lazy<RwLock<RasterConfig>>` 中，单次调用通过 `config_snapshot`
//!   取得一致快照，避免处理中途配置漂移。
//! - `apply_runtime_settings` 从设置 JSON 中读取字段，非法值记录警告并保留原值。

use std::sync::RwLock;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::RasterError;

/// 默认解码像素上限（`width * height`）。
pub const DEFAULT_MAX_DECODED_PIXELS: u64 = 40_000_000;

/// 输出详细程度。
///
/// 档位有序：`Quiet < Normal < More < Debug < DebugSave`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verbosity {
    Quiet,
    Normal,
    /// 额外输出容器 / 数据流信息。
    More,
    Debug,
    /// 在各处理阶段之后写出调试快照。
    DebugSave,
}

/// 调试快照生效的最低档位。
pub const DEBUG_SAVE_THRESHOLD: Verbosity = Verbosity::DebugSave;

impl Verbosity {
    /// 从外部字符串解析档位，同时接受数字级别（`-1` ~ `4`）。
    ///
    /// # 示例
    /// ```rust
    /// use rasterbridge::config::Verbosity;
    ///
    /// assert_eq!(Verbosity::from_str("debug-save")?, Verbosity::DebugSave);
    /// assert_eq!(Verbosity::from_str("2")?, Verbosity::More);
    /// # Ok::<(), rasterbridge::RasterError>(())
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(value: &str) -> Result<Self, RasterError> {
        let normalized = value.trim().to_lowercase();
        if let Ok(level) = normalized.parse::<i64>() {
            return Self::from_level(level).ok_or_else(|| {
                RasterError::InvalidSetting(format!("未知输出级别：{}（可选：-1 ~ 4）", level))
            });
        }

        match normalized.as_str() {
            "quiet" => Ok(Self::Quiet),
            "normal" => Ok(Self::Normal),
            "more" => Ok(Self::More),
            "debug" => Ok(Self::Debug),
            "debug-save" | "debug_save" | "debugsave" => Ok(Self::DebugSave),
            other => Err(RasterError::InvalidSetting(format!(
                "未知输出级别：{}（可选：quiet / normal / more / debug / debug-save）",
                other
            ))),
        }
    }

    /// 数字级别映射：`-1` 静默，`0`/`1` 常规，`2` 详细，`3` 调试，`4` 调试并保存。
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            -1 => Some(Self::Quiet),
            0 | 1 => Some(Self::Normal),
            2 => Some(Self::More),
            3 => Some(Self::Debug),
            4 => Some(Self::DebugSave),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quiet => "quiet",
            Self::Normal => "normal",
            Self::More => "more",
            Self::Debug => "debug",
            Self::DebugSave => "debug-save",
        }
    }
}

/// 运行时配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RasterConfig {
    /// 当前输出详细程度。
    pub verbosity: Verbosity,
    /// 解码后的像素上限（`width * height`），在分配像素缓冲区之前检查。
    pub max_decoded_pixels: u64,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            max_decoded_pixels: DEFAULT_MAX_DECODED_PIXELS,
        }
    }
}

static RUNTIME_CONFIG: Lazy<RwLock<RasterConfig>> =
    Lazy::new(|| RwLock::new(RasterConfig::default()));

/// 获取配置快照。
///
/// 作用：保证单次加载 / 保存使用一致参数。锁中毒时仍返回最后写入的值。
pub fn config_snapshot() -> RasterConfig {
    RUNTIME_CONFIG
        .read()
        .map(|cfg| cfg.clone())
        .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
}

/// 当前输出详细程度。
pub fn verbosity() -> Verbosity {
    config_snapshot().verbosity
}

/// 整体替换运行时配置。
pub fn replace_config(config: RasterConfig) {
    let mut current = RUNTIME_CONFIG
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *current = config;
}

pub fn set_verbosity(verbosity: Verbosity) {
    let mut current = RUNTIME_CONFIG
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    current.verbosity = verbosity;
    log::debug!("⚙️ 输出级别已更新: {}", verbosity.as_str());
}

/// 从设置 JSON 中读取运行时配置。
///
/// 识别字段：`verbosity`（字符串或数字）、`maxDecodedPixels`（正整数）。
/// 缺失字段保持不变；非法值记录警告并忽略。
pub fn apply_runtime_settings(settings: &serde_json::Value) {
    let mut next = config_snapshot();

    if let Some(value) = settings.get("verbosity") {
        let parsed = match value {
            serde_json::Value::String(text) => Verbosity::from_str(text).ok(),
            serde_json::Value::Number(number) => number.as_i64().and_then(Verbosity::from_level),
            _ => None,
        };
        match parsed {
            Some(verbosity) => next.verbosity = verbosity,
            None => log::warn!("⚠️ 忽略非法输出级别设置: {}", value),
        }
    }

    if let Some(value) = settings.get("maxDecodedPixels") {
        match value.as_u64().filter(|pixels| *pixels > 0) {
            Some(pixels) => next.max_decoded_pixels = pixels,
            None => log::warn!("⚠️ 忽略非法像素上限设置: {}", value),
        }
    }

    log::debug!(
        "⚙️ 运行时配置已更新 - verbosity={} max_decoded_pixels={}",
        next.verbosity.as_str(),
        next.max_decoded_pixels
    );
    replace_config(next);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels_are_ordered() {
        assert!(Verbosity::Quiet < Verbosity::Normal);
        assert!(Verbosity::Debug < DEBUG_SAVE_THRESHOLD);
        assert!(Verbosity::DebugSave >= DEBUG_SAVE_THRESHOLD);
    }

    #[test]
    fn verbosity_parses_names_and_levels() {
        assert_eq!(Verbosity::from_str(" More ").unwrap(), Verbosity::More);
        assert_eq!(Verbosity::from_str("debug_save").unwrap(), Verbosity::DebugSave);
        assert_eq!(Verbosity::from_str("-1").unwrap(), Verbosity::Quiet);
        assert_eq!(Verbosity::from_str("0").unwrap(), Verbosity::Normal);
        assert!(matches!(
            Verbosity::from_str("loud"),
            Err(RasterError::InvalidSetting(_))
        ));
        assert!(Verbosity::from_str("9").is_err());
    }

    #[test]
    fn verbosity_round_trips_through_as_str() {
        for verbosity in [
            Verbosity::Quiet,
            Verbosity::Normal,
            Verbosity::More,
            Verbosity::Debug,
            Verbosity::DebugSave,
        ] {
            assert_eq!(Verbosity::from_str(verbosity.as_str()).unwrap(), verbosity);
        }
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: RasterConfig =
            serde_json::from_str(r#"{"verbosity":"debug-save"}"#).expect("valid config json");
        assert_eq!(config.verbosity, Verbosity::DebugSave);
        assert_eq!(config.max_decoded_pixels, DEFAULT_MAX_DECODED_PIXELS);
    }
}
