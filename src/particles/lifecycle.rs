//! 生命周期积分器
//!
//! 每帧对粒子执行固定顺序的更新：先推进生命比例，再做物理积分，
//! 最后用更新后的生命比例采样曲线。

use glam::Vec2;

use super::particle::Particle;
use crate::core::{ParticleError, ParticleResult};

/// 默认重力（向下）
pub const DEFAULT_GRAVITY: Vec2 = Vec2::new(0.0, -9.81);

/// 生命比例距离 1 小于该值即视为死亡，吸收 f32 步长本身的舍入误差
pub const DEATH_TOLERANCE: f64 = 1.0e-6;

/// 生命周期积分器，每个粒子系统共享一个重力向量
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrator {
    gravity: Vec2,
}

impl Default for Integrator {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
        }
    }
}

impl Integrator {
    pub fn new(gravity: Vec2) -> ParticleResult<Self> {
        let mut integrator = Self::default();
        integrator.set_gravity(gravity)?;
        Ok(integrator)
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) -> ParticleResult<()> {
        if !gravity.is_finite() {
            return Err(ParticleError::InvalidGravity {
                x: gravity.x,
                y: gravity.y,
            });
        }
        self.gravity = gravity;
        Ok(())
    }

    /// 推进粒子 `dt` 秒，返回粒子是否仍然存活
    ///
    /// 存活秒数以 f64 累加，生命比例由它换算，不逐步累加 f32 比例。
    /// 死亡的粒子生命比例被钉在 1，其余状态保持不变。
    pub fn advance(&self, particle: &mut Particle, dt: f32) -> bool {
        particle.age_seconds += f64::from(dt);
        let fraction = particle.age_seconds * f64::from(particle.inverse_lifetime);
        // NaN 也视为死亡
        if !(fraction < 1.0 - DEATH_TOLERANCE) {
            particle.age_fraction = 1.0;
            return false;
        }
        particle.age_fraction = fraction as f32;

        particle.velocity += self.gravity * dt;
        particle.position += particle.velocity * dt;
        particle.rotation += particle.angular_velocity * dt;
        particle.sample_curves();
        true
    }

    /// 推进所有粒子，返回本次死亡的数量
    pub fn advance_all(&self, particles: &mut [Particle], dt: f32) -> usize {
        particles
            .iter_mut()
            .map(|particle| self.advance(particle, dt))
            .filter(|alive| !alive)
            .count()
    }
}
