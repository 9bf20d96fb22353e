//! 粒子颜色
//!
//! 线性 RGB，各通道取值 `[0, 1]`。不透明度由独立曲线控制，因此这里没有 alpha。

use serde::{Deserialize, Serialize};

/// RGB 颜色
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// 灰度颜色（三通道相同）
    pub const fn gray(value: f32) -> Self {
        Self::new(value, value, value)
    }

    /// 从打包的 `0xRRGGBB` 整数解码
    pub fn from_packed(rgb: u32) -> Self {
        let channel = |shift: u32| ((rgb >> shift) & 0xFF) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 3]> for Color {
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self::new(r, g, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_decoding() {
        assert_eq!(Color::from_packed(0xFFFFFF), Color::WHITE);
        assert_eq!(Color::from_packed(0x000000), Color::BLACK);

        let c = Color::from_packed(0xFF8000);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
    }
}
