//! 调试快照。
//!
//! 输出级别达到 `DEBUG_SAVE_THRESHOLD` 时，按文件名模板把帧原样保存一份；
//! 低于阈值时不做任何 I/O。模板使用 printf 风格的整数占位符：`%d`、`%4d`、`%03d`，
//! `%%` 表示字面百分号。

use std::path::PathBuf;

use super::saver::save;
use crate::config::{self, DEBUG_SAVE_THRESHOLD, Verbosity};
use crate::error::RasterError;
use crate::frame::Frame;

/// 按当前全局输出级别决定是否保存调试快照。
///
/// # 示例
/// ```rust,no_run
/// use rasterbridge::{Frame, PixelFormat, snapshot};
///
/// let frame = Frame::new(8, 8, PixelFormat::Gray8)?;
/// snapshot("_debug-%02d.pnm", 3, &frame)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn snapshot(template: &str, index: u32, frame: &Frame) -> Result<(), RasterError> {
    snapshot_at(config::verbosity(), template, index, frame).map(|_| ())
}

/// 按给定输出级别保存调试快照，返回实际写入的路径。
pub fn snapshot_at(
    verbosity: Verbosity,
    template: &str,
    index: u32,
    frame: &Frame,
) -> Result<Option<PathBuf>, RasterError> {
    if verbosity < DEBUG_SAVE_THRESHOLD {
        return Ok(None);
    }

    let path = PathBuf::from(render_template(template, index)?);
    log::debug!("🐞 保存调试快照 #{} - 文件: {}", index, path.display());
    save(&path, frame, frame.format())?;
    Ok(Some(path))
}

/// 把 `index` 代入模板中唯一的整数占位符；没有占位符时原样返回。
pub fn render_template(template: &str, index: u32) -> Result<String, RasterError> {
    let invalid = |detail: &str| RasterError::InvalidTemplate {
        template: template.to_string(),
        detail: detail.to_string(),
    };

    let mut rendered = String::with_capacity(template.len() + 8);
    let mut placeholders = 0;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            rendered.push(c);
            continue;
        }
        if chars.next_if_eq(&'%').is_some() {
            rendered.push('%');
            continue;
        }

        let zero_pad = chars.next_if_eq(&'0').is_some();
        let mut width = 0usize;
        while let Some(digit) = chars.next_if(char::is_ascii_digit) {
            width = width
                .checked_mul(10)
                .and_then(|w| w.checked_add(digit as usize - '0' as usize))
                .filter(|w| *w <= 64)
                .ok_or_else(|| invalid("占位符宽度过大"))?;
        }

        match chars.next() {
            Some('d' | 'i' | 'u') => {}
            Some(_) => return Err(invalid("只支持整数占位符")),
            None => return Err(invalid("占位符不完整")),
        }

        placeholders += 1;
        if placeholders > 1 {
            return Err(invalid("只允许一个整数占位符"));
        }

        if zero_pad {
            rendered.push_str(&format!("{:0width$}", index, width = width));
        } else {
            rendered.push_str(&format!("{:width$}", index, width = width));
        }
    }

    Ok(rendered)
}
