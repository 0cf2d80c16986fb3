//! 像素读写。
//!
//! 颜色统一用打包的 `0xRRGGBB` 表示，读写时按帧格式转换：
//! 灰度取三通道整数平均值，1 位格式中平均值低于 `BLACK_THRESHOLD` 的像素为黑。
//! 越界读取返回白色，越界写入被忽略。

use super::{Frame, PixelFormat};

pub const WHITE: u32 = 0x00FF_FFFF;
pub const BLACK: u32 = 0x0000_0000;

/// 1 位格式的黑色阈值：`255 * (1 - 0.33)`。
pub const BLACK_THRESHOLD: u8 = 170;

pub fn rgb(r: u8, g: u8, b: u8) -> u32 {
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

pub fn red(color: u32) -> u8 {
    (color >> 16) as u8
}

pub fn green(color: u32) -> u8 {
    (color >> 8) as u8
}

pub fn blue(color: u32) -> u8 {
    color as u8
}

pub fn grayscale(color: u32) -> u8 {
    ((u32::from(red(color)) + u32::from(green(color)) + u32::from(blue(color))) / 3) as u8
}

fn gray_color(value: u8) -> u32 {
    rgb(value, value, value)
}

fn mono_bit(row: &[u8], x: u32) -> bool {
    row[(x / 8) as usize] & (0x80 >> (x % 8)) != 0
}

impl Frame {
    /// 读取 `(x, y)` 处的颜色。
    pub fn get_pixel(&self, x: u32, y: u32) -> u32 {
        if !self.contains(x, y) {
            return WHITE;
        }

        let row = self.row(y);
        let x_us = x as usize;
        match self.format {
            PixelFormat::Gray8 => gray_color(row[x_us]),
            PixelFormat::Gray8A => gray_color(row[x_us * 2]),
            PixelFormat::Rgb24 => {
                let i = x_us * 3;
                rgb(row[i], row[i + 1], row[i + 2])
            }
            PixelFormat::MonoBlack => {
                if mono_bit(row, x) { WHITE } else { BLACK }
            }
            PixelFormat::MonoWhite => {
                if mono_bit(row, x) { BLACK } else { WHITE }
            }
            PixelFormat::Pal8 => {
                let entry = self
                    .palette
                    .as_deref()
                    .map_or(BLACK, |palette| palette[row[x_us] as usize]);
                entry & WHITE
            }
        }
    }

    /// 写入 `(x, y)` 处的颜色（只使用低 24 位）。
    pub fn set_pixel(&mut self, x: u32, y: u32, color: u32) {
        if !self.contains(x, y) {
            return;
        }

        let format = self.format;
        let palette_index = match format {
            PixelFormat::Pal8 => self
                .palette
                .as_deref()
                .map_or(0, |palette| nearest_palette_index(palette, color)),
            _ => 0,
        };

        let row = self.row_mut(y);
        let x_us = x as usize;
        match format {
            PixelFormat::Gray8 => row[x_us] = grayscale(color),
            PixelFormat::Gray8A => {
                row[x_us * 2] = grayscale(color);
                row[x_us * 2 + 1] = u8::MAX;
            }
            PixelFormat::Rgb24 => {
                let i = x_us * 3;
                row[i] = red(color);
                row[i + 1] = green(color);
                row[i + 2] = blue(color);
            }
            PixelFormat::MonoBlack | PixelFormat::MonoWhite => {
                let black = grayscale(color) < BLACK_THRESHOLD;
                let bit_set = black == (format == PixelFormat::MonoWhite);
                let mask = 0x80u8 >> (x % 8);
                let byte = &mut row[(x / 8) as usize];
                if bit_set {
                    *byte |= mask;
                } else {
                    *byte &= !mask;
                }
            }
            PixelFormat::Pal8 => row[x_us] = palette_index,
        }
    }
}

/// 调色板中与 `color` 欧氏距离最近的项。
fn nearest_palette_index(palette: &[u32], color: u32) -> u8 {
    let distance = |entry: u32| {
        let dr = i32::from(red(entry)) - i32::from(red(color));
        let dg = i32::from(green(entry)) - i32::from(green(color));
        let db = i32::from(blue(entry)) - i32::from(blue(color));
        dr * dr + dg * dg + db * db
    };

    palette
        .iter()
        .enumerate()
        .min_by_key(|(_, entry)| distance(**entry))
        .map_or(0, |(index, _)| index as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_round_trips_through_components() {
        let color = rgb(0x12, 0x34, 0x56);
        assert_eq!(color, 0x123456);
        assert_eq!((red(color), green(color), blue(color)), (0x12, 0x34, 0x56));
        assert_eq!(grayscale(rgb(30, 60, 90)), 60);
    }

    #[test]
    fn gray_formats_store_mean_value() {
        let mut frame = Frame::new(2, 1, PixelFormat::Gray8A).unwrap();
        frame.set_pixel(1, 0, rgb(10, 20, 30));
        assert_eq!(frame.row(0), &[0, 0, 20, 255]);
        assert_eq!(frame.get_pixel(1, 0), rgb(20, 20, 20));
    }

    #[test]
    fn mono_formats_use_opposite_bit_meaning() {
        let mut white_is_zero = Frame::new(9, 1, PixelFormat::MonoWhite).unwrap();
        let mut black_is_zero = Frame::new(9, 1, PixelFormat::MonoBlack).unwrap();

        for frame in [&mut white_is_zero, &mut black_is_zero] {
            for x in 0..9 {
                frame.set_pixel(x, 0, WHITE);
            }
            frame.set_pixel(0, 0, BLACK);
            frame.set_pixel(8, 0, rgb(100, 100, 100));
        }

        assert_eq!(white_is_zero.row(0), &[0b1000_0000, 0b1000_0000]);
        assert_eq!(black_is_zero.row(0), &[0b0111_1111, 0b0000_0000]);
        for frame in [&white_is_zero, &black_is_zero] {
            assert_eq!(frame.get_pixel(0, 0), BLACK);
            assert_eq!(frame.get_pixel(1, 0), WHITE);
            assert_eq!(frame.get_pixel(8, 0), BLACK);
        }
    }

    #[test]
    fn mono_threshold_boundary() {
        let mut frame = Frame::new(2, 1, PixelFormat::MonoWhite).unwrap();
        frame.set_pixel(0, 0, rgb(169, 169, 169));
        frame.set_pixel(1, 0, rgb(170, 170, 170));
        assert_eq!(frame.get_pixel(0, 0), BLACK);
        assert_eq!(frame.get_pixel(1, 0), WHITE);
    }

    #[test]
    fn palette_lookup_ignores_alpha() {
        let mut frame = Frame::new(2, 1, PixelFormat::Pal8).unwrap();
        let palette = frame.palette_mut().unwrap();
        palette[0] = 0xFF00_00FF;
        palette[1] = 0x80FF_0000;
        frame.data_mut().copy_from_slice(&[1, 0]);

        assert_eq!(frame.get_pixel(0, 0), 0xFF0000);
        assert_eq!(frame.get_pixel(1, 0), 0x0000FF);

        frame.set_pixel(0, 0, rgb(0, 0, 250));
        assert_eq!(frame.row(0)[0], 0);
    }

    #[test]
    fn out_of_bounds_access_is_harmless() {
        let mut frame = Frame::new(1, 1, PixelFormat::Rgb24).unwrap();
        frame.set_pixel(5, 5, BLACK);
        assert_eq!(frame.get_pixel(5, 5), WHITE);
        assert_eq!(frame.get_pixel(0, 0), BLACK);
    }
}
