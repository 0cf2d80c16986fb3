//! 区域复制。

use super::{Frame, PixelFormat};

/// 把 `src` 中 `(src_x, src_y)` 起、`width x height` 的矩形复制到 `dst` 的 `(dst_x, dst_y)`。
///
/// 两帧格式不同时逐像素转换；矩形按两帧边界裁剪。
/// 格式相同且为字节对齐格式时按行整体复制。调色板帧的调色板不随之复制。
#[allow(clippy::too_many_arguments)]
pub fn copy_area(
    src_x: u32,
    src_y: u32,
    width: u32,
    height: u32,
    src: &Frame,
    dst_x: u32,
    dst_y: u32,
    dst: &mut Frame,
) {
    let width = clip_span(width, src_x, src.width(), dst_x, dst.width());
    let height = clip_span(height, src_y, src.height(), dst_y, dst.height());
    if width == 0 || height == 0 {
        return;
    }

    let byte_aligned = !src.format().is_monochrome() && src.format() != PixelFormat::Pal8;
    if src.format() == dst.format() && byte_aligned {
        let bytes_per_pixel = src.format().bits_per_pixel() / 8;
        let len = width as usize * bytes_per_pixel;
        let src_offset = src_x as usize * bytes_per_pixel;
        let dst_offset = dst_x as usize * bytes_per_pixel;
        for row in 0..height {
            let from = &src.row(src_y + row)[src_offset..src_offset + len];
            dst.row_mut(dst_y + row)[dst_offset..dst_offset + len].copy_from_slice(from);
        }
        return;
    }

    for y in 0..height {
        for x in 0..width {
            let color = src.get_pixel(src_x + x, src_y + y);
            dst.set_pixel(dst_x + x, dst_y + y, color);
        }
    }
}

fn clip_span(span: u32, src_start: u32, src_len: u32, dst_start: u32, dst_len: u32) -> u32 {
    span.min(src_len.saturating_sub(src_start))
        .min(dst_len.saturating_sub(dst_start))
}
