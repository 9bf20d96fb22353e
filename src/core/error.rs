//! 统一错误处理模块
//!
//! 粒子系统只有两类失败：
//!
//! - **构造期错误**：贴图/几何尺寸缺失或非法、容量为零、曲线为空、范围非法。
//!   这些错误在创建系统或发射器时立即返回，不做重试。
//! - **运行期**：容量耗尽不是错误，超出容量的生成请求被静默丢弃。

use thiserror::Error;

/// 粒子系统错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParticleError {
    #[error("Particle capacity must be greater than zero")]
    ZeroCapacity,

    #[error("Sprite texture is missing")]
    MissingTexture,

    #[error("Invalid sprite texture size: {width}x{height}")]
    InvalidTexture { width: u32, height: u32 },

    #[error("Invalid quad geometry: {0}")]
    InvalidGeometry(String),

    #[error("Curve has no control points")]
    EmptyCurve,

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid emission schedule: {0}")]
    InvalidEmission(String),

    #[error("Gravity must be finite, got ({x}, {y})")]
    InvalidGravity { x: f32, y: f32 },

    #[error("Unknown particle system id: {0}")]
    UnknownSystem(usize),
}

/// 粒子系统结果类型别名
pub type ParticleResult<T> = Result<T, ParticleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParticleError::InvalidTexture {
            width: 0,
            height: 64,
        };
        assert_eq!(err.to_string(), "Invalid sprite texture size: 0x64");

        assert_eq!(
            ParticleError::EmptyCurve.to_string(),
            "Curve has no control points"
        );
    }

    #[test]
    fn test_error_is_comparable() {
        let a: ParticleResult<()> = Err(ParticleError::ZeroCapacity);
        assert_eq!(a, Err(ParticleError::ZeroCapacity));
    }
}
