//! 锚点
//!
//! 宿主 UI 层提供的二维原点。发射器以锚点为生成坐标原点，
//! 粒子系统只读取锚点，从不修改。

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::{ParticleError, ParticleResult};

/// 二维锚点 + 可选的统一缩放
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Anchor {
    pub position: Vec2,
    /// 统一缩放倍数，作用于生成位置、速度和尺寸曲线
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
}

impl Default for Anchor {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: None,
        }
    }
}

impl Anchor {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            scale: None,
        }
    }

    pub fn at(x: f32, y: f32) -> Self {
        Self::new(Vec2::new(x, y))
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn scale_multiplier(&self) -> f32 {
        self.scale.unwrap_or(1.0)
    }

    /// 把发射器局部坐标转换为锚点所在空间
    pub fn transform_point(&self, local: Vec2) -> Vec2 {
        self.position + local * self.scale_multiplier()
    }

    /// 把本锚点嵌套进父锚点：位置经父锚点变换，缩放相乘
    pub fn nested_in(&self, parent: &Anchor) -> Anchor {
        let scale = match (self.scale, parent.scale) {
            (None, None) => None,
            _ => Some(self.scale_multiplier() * parent.scale_multiplier()),
        };
        Anchor {
            position: parent.transform_point(self.position),
            scale,
        }
    }

    pub fn validate(&self) -> ParticleResult<()> {
        if !self.position.is_finite() {
            return Err(ParticleError::InvalidGeometry(format!(
                "anchor position {} is not finite",
                self.position
            )));
        }
        match self.scale {
            Some(scale) if !scale.is_finite() || scale <= 0.0 => Err(
                ParticleError::InvalidGeometry(format!("anchor scale {scale} must be positive")),
            ),
            _ => Ok(()),
        }
    }
}
