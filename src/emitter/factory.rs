//! 粒子工厂
//!
//! 每种发射形状只负责采样局部生成位置，其余属性由共享的
//! [`ParticleTemplate`] 解析。所有随机分量独立采样。

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::anchor::Anchor;
use crate::core::{ParticleError, ParticleResult};
use crate::curve::{ColorCurveDef, ScalarCurveDef};
use crate::particles::{Integrator, Particle};
use crate::range::{RadialRange, Sample, ScalarRange, Value, VectorRange};

/// 粒子模板：除生成位置以外的全部粒子属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleTemplate {
    /// 寿命（秒）
    pub lifetime: Value<ScalarRange>,
    /// 初始尺寸，乘到尺寸曲线上
    pub scale: Value<ScalarRange>,
    /// 初始角度（度）
    pub angle: Value<ScalarRange>,
    /// 初始速度
    pub velocity: Value<RadialRange>,
    /// 角速度（度/秒）
    pub angular_velocity: Value<ScalarRange>,
    /// 尺寸曲线
    pub scale_curve: ScalarCurveDef,
    /// 颜色曲线
    pub color_curve: ColorCurveDef,
    /// 不透明度曲线
    pub opacity_curve: ScalarCurveDef,
}

impl Default for ParticleTemplate {
    fn default() -> Self {
        Self {
            lifetime: Value::Fixed(1.0),
            scale: Value::Fixed(1.0),
            angle: Value::Fixed(0.0),
            velocity: Value::Fixed(Vec2::ZERO),
            angular_velocity: Value::Fixed(0.0),
            scale_curve: ScalarCurveDef::constant(Value::Fixed(1.0)),
            color_curve: ColorCurveDef::constant(Default::default()),
            opacity_curve: ScalarCurveDef::constant(Value::Fixed(1.0)),
        }
    }
}

impl ParticleTemplate {
    pub fn validate(&self) -> ParticleResult<()> {
        self.lifetime.validate()?;
        if self.lifetime.lower_bound() <= 0.0 {
            return Err(ParticleError::InvalidRange(format!(
                "lifetime must be positive, got {:?}",
                self.lifetime
            )));
        }
        self.scale.validate()?;
        self.angle.validate()?;
        self.velocity.validate()?;
        self.angular_velocity.validate()?;
        self.scale_curve.validate()?;
        self.color_curve.validate()?;
        self.opacity_curve.validate()
    }

    /// 在局部位置 `local` 解析出一个新粒子（生命比例为 0）
    pub fn instantiate<G: Rng + ?Sized>(&self, local: Vec2, anchor: &Anchor, rng: &mut G) -> Particle {
        let multiplier = anchor.scale_multiplier();

        let lifetime = self.lifetime.resolve(rng);
        let rotation = self.angle.resolve(rng).to_radians();
        let angular_velocity = self.angular_velocity.resolve(rng).to_radians();
        let velocity = self.velocity.resolve(rng) * multiplier;
        let initial_scale = self.scale.resolve(rng) * multiplier;

        let scale_curve = self.scale_curve.resolve(rng).scaled(initial_scale);
        let color_curve = self.color_curve.resolve(rng);
        let opacity_curve = self.opacity_curve.resolve(rng);

        Particle::new(lifetime, anchor.transform_point(local))
            .with_velocity(velocity)
            .with_rotation(rotation, angular_velocity)
            .with_curves(scale_curve, color_curve, opacity_curve)
    }
}

/// 形状相关的粒子工厂
pub trait ParticleFactory {
    /// 粒子模板
    fn template(&self) -> &ParticleTemplate;

    /// 采样发射器局部坐标下的生成位置
    fn sample_position<G: Rng + ?Sized>(&self, rng: &mut G) -> Vec2;

    fn validate(&self) -> ParticleResult<()>;

    /// 生成一个粒子，并按 `elapsed_time_offset` 预先老化
    ///
    /// 预老化期间就已死亡的粒子返回 `None`，不会进入粒子存储。
    fn build<G: Rng + ?Sized>(
        &self,
        anchor: &Anchor,
        integrator: &Integrator,
        elapsed_time_offset: f32,
        rng: &mut G,
    ) -> Option<Particle> {
        let local = self.sample_position(rng);
        let mut particle = self.template().instantiate(local, anchor, rng);
        if elapsed_time_offset > 0.0 && !integrator.advance(&mut particle, elapsed_time_offset) {
            return None;
        }
        Some(particle)
    }
}

/// 矩形区域发射
#[derive(Debug, Clone, PartialEq)]
pub struct RectangleFactory {
    pub position: Value<VectorRange>,
    pub template: ParticleTemplate,
}

impl RectangleFactory {
    pub fn new(template: ParticleTemplate, position: Value<VectorRange>) -> Self {
        Self { position, template }
    }
}

impl ParticleFactory for RectangleFactory {
    fn template(&self) -> &ParticleTemplate {
        &self.template
    }

    fn sample_position<G: Rng + ?Sized>(&self, rng: &mut G) -> Vec2 {
        self.position.resolve(rng)
    }

    fn validate(&self) -> ParticleResult<()> {
        self.position.validate()?;
        self.template.validate()
    }
}

/// 圆形/环形区域发射
#[derive(Debug, Clone, PartialEq)]
pub struct CircleFactory {
    /// 半径范围作为强度，角度范围限定扇区
    pub position: RadialRange,
    pub template: ParticleTemplate,
}

impl CircleFactory {
    pub fn new(template: ParticleTemplate, position: RadialRange) -> Self {
        Self { position, template }
    }
}

impl ParticleFactory for CircleFactory {
    fn template(&self) -> &ParticleTemplate {
        &self.template
    }

    fn sample_position<G: Rng + ?Sized>(&self, rng: &mut G) -> Vec2 {
        self.position.sample(rng)
    }

    fn validate(&self) -> ParticleResult<()> {
        if self.position.power_min < 0.0 {
            return Err(ParticleError::InvalidRange(format!(
                "circle radius must not be negative, got {}",
                self.position.power_min
            )));
        }
        self.position.validate()?;
        self.template.validate()
    }
}
