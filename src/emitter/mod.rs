//! 粒子发射器
//!
//! 发射器 = 发射调度器 + 形状工厂 + 锚点。调度器决定"何时、生成多少"，
//! 工厂决定"在哪里、带什么属性"，锚点把局部坐标变换到世界坐标。

pub mod factory;
pub mod scheduler;

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::anchor::Anchor;
use crate::core::ParticleResult;
use crate::particles::{Integrator, Particle, ParticleSystem};
use crate::range::{RadialRange, Value, VectorRange};

pub use factory::{CircleFactory, ParticleFactory, ParticleTemplate, RectangleFactory};
pub use scheduler::{EmissionSchedule, EmissionScheduler, PlaybackState};

// ============================================================================
// 配置
// ============================================================================

/// 发射形状配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeConfig {
    /// 矩形区域
    Rectangle { position: Value<VectorRange> },
    /// 圆形/扇形区域
    Circle { position: RadialRange },
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self::Rectangle {
            position: Value::Fixed(glam::Vec2::ZERO),
        }
    }
}

/// 发射器配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    pub schedule: EmissionSchedule,
    pub shape: ShapeConfig,
    pub particle: ParticleTemplate,
    pub anchor: Anchor,
}

impl EmitterConfig {
    pub fn validate(&self) -> ParticleResult<()> {
        self.schedule.validate()?;
        self.anchor.validate()?;
        self.build_shape().validate()
    }

    fn build_shape(&self) -> EmitterShape {
        match &self.shape {
            ShapeConfig::Rectangle { position } => {
                EmitterShape::Rectangle(RectangleFactory::new(self.particle.clone(), *position))
            }
            ShapeConfig::Circle { position } => {
                EmitterShape::Circle(CircleFactory::new(self.particle.clone(), *position))
            }
        }
    }
}

// ============================================================================
// 发射器
// ============================================================================

/// 单次 tick 的发射结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmitterTick {
    /// 调度器发出的生成请求
    pub requested: u32,
    /// 进入粒子存储的粒子
    pub admitted: u32,
    /// 容量已满被丢弃
    pub dropped: u32,
    /// 预老化期间已死亡
    pub expired: u32,
}

impl AddAssign for EmitterTick {
    fn add_assign(&mut self, other: Self) {
        self.requested += other.requested;
        self.admitted += other.admitted;
        self.dropped += other.dropped;
        self.expired += other.expired;
    }
}

/// 发射器能力
pub trait Emitter {
    /// 推进 `dt` 秒并把生成的粒子加入 `system`
    fn tick(&mut self, dt: f32, system: &mut ParticleSystem) -> EmitterTick;

    fn play(&mut self);

    fn stop(&mut self);

    fn is_playing(&self) -> bool;
}

/// 发射形状
#[derive(Debug, Clone, PartialEq)]
pub enum EmitterShape {
    Rectangle(RectangleFactory),
    Circle(CircleFactory),
}

impl EmitterShape {
    pub fn validate(&self) -> ParticleResult<()> {
        match self {
            Self::Rectangle(factory) => factory.validate(),
            Self::Circle(factory) => factory.validate(),
        }
    }

    fn build<G: rand::Rng + ?Sized>(
        &self,
        anchor: &Anchor,
        integrator: &Integrator,
        offset: f32,
        rng: &mut G,
    ) -> Option<Particle> {
        match self {
            Self::Rectangle(factory) => factory.build(anchor, integrator, offset, rng),
            Self::Circle(factory) => factory.build(anchor, integrator, offset, rng),
        }
    }
}

/// 粒子发射器
#[derive(Debug, Clone)]
pub struct ParticleEmitter {
    shape: EmitterShape,
    scheduler: EmissionScheduler,
    anchor: Anchor,
}

impl ParticleEmitter {
    /// 创建发射器，形状和调度配置非法时立即失败
    pub fn new(shape: EmitterShape, schedule: EmissionSchedule) -> ParticleResult<Self> {
        shape.validate()?;
        let scheduler = EmissionScheduler::new(schedule)?;
        tracing::debug!(
            target: "particles",
            total_spawn_count = schedule.total_spawn_count,
            cycle_duration = schedule.cycle_duration,
            infinite_loop = schedule.infinite_loop,
            "Particle emitter created"
        );
        Ok(Self {
            shape,
            scheduler,
            anchor: Anchor::default(),
        })
    }

    pub fn from_config(config: &EmitterConfig) -> ParticleResult<Self> {
        config.anchor.validate()?;
        Ok(Self::new(config.build_shape(), config.schedule)?.with_anchor(config.anchor))
    }

    /// 矩形发射器
    pub fn rectangle(
        template: ParticleTemplate,
        position: Value<VectorRange>,
        schedule: EmissionSchedule,
    ) -> ParticleResult<Self> {
        Self::new(
            EmitterShape::Rectangle(RectangleFactory::new(template, position)),
            schedule,
        )
    }

    /// 圆形发射器
    pub fn circle(
        template: ParticleTemplate,
        position: RadialRange,
        schedule: EmissionSchedule,
    ) -> ParticleResult<Self> {
        Self::new(EmitterShape::Circle(CircleFactory::new(template, position)), schedule)
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    /// 宿主每帧可更新锚点，下一次 tick 生效
    pub fn set_anchor(&mut self, anchor: Anchor) {
        self.anchor = anchor;
    }

    pub fn shape(&self) -> &EmitterShape {
        &self.shape
    }

    pub fn scheduler(&self) -> &EmissionScheduler {
        &self.scheduler
    }
}

impl Emitter for ParticleEmitter {
    /// 生成位置以发射器锚点为原点，发射器锚点再嵌套在粒子系统锚点内
    fn tick(&mut self, dt: f32, system: &mut ParticleSystem) -> EmitterTick {
        let Self {
            shape,
            scheduler,
            anchor,
        } = self;
        let origin = anchor.nested_in(system.anchor());
        let mut rng = rand::thread_rng();
        let mut result = EmitterTick::default();

        let requested = scheduler.tick(dt, |offset| {
            match shape.build(&origin, system.integrator(), offset, &mut rng) {
                Some(particle) => {
                    if system.spawn(particle) {
                        result.admitted += 1;
                    } else {
                        result.dropped += 1;
                    }
                }
                None => {
                    system.record_expired();
                    result.expired += 1;
                }
            }
        });
        result.requested = requested;

        if result.dropped > 0 {
            tracing::trace!(
                target: "particles",
                dropped = result.dropped,
                capacity = system.capacity(),
                "Spawn requests dropped at capacity"
            );
        }
        result
    }

    fn play(&mut self) {
        if !self.scheduler.is_playing() {
            tracing::debug!(target: "particles", "Particle emitter playing");
        }
        self.scheduler.play();
    }

    fn stop(&mut self) {
        if self.scheduler.is_playing() {
            tracing::debug!(target: "particles", "Particle emitter stopped");
        }
        self.scheduler.stop();
    }

    fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::ParticleSystemConfig;
    use glam::Vec2;

    fn system(capacity: usize) -> ParticleSystem {
        ParticleSystem::new(ParticleSystemConfig {
            gravity: Vec2::ZERO,
            ..ParticleSystemConfig::with_capacity(capacity)
        })
        .unwrap()
    }

    fn long_lived() -> ParticleTemplate {
        ParticleTemplate {
            lifetime: Value::Fixed(10.0),
            ..Default::default()
        }
    }

    fn schedule(count: u32, duration: f32, infinite_loop: bool) -> EmissionSchedule {
        EmissionSchedule {
            infinite_loop,
            total_spawn_count: count,
            cycle_duration: duration,
            autoplay: true,
        }
    }

    #[test]
    fn test_tick_reports_drops() {
        let mut system = system(3);
        let mut emitter =
            ParticleEmitter::rectangle(ParticleTemplate::default(), Vec2::ZERO.into(), schedule(5, 0.5, false))
                .unwrap();

        let tick = emitter.tick(0.25, &mut system);
        // step = 0.125，偏移 0.25 / 0.125，寿命 1 秒全部存活
        assert_eq!(tick.requested, 2);
        assert_eq!(tick.admitted, 2);

        let tick = emitter.tick(0.25, &mut system);
        assert_eq!(tick.requested, 3);
        assert_eq!(tick.admitted, 1);
        assert_eq!(tick.dropped, 2);
        assert_eq!(system.stats().total_dropped, 2);
        assert!(!emitter.is_playing());
    }

    #[test]
    fn test_expired_particles_are_counted() {
        let mut system = system(16);
        let template = ParticleTemplate {
            lifetime: Value::Fixed(0.1),
            ..Default::default()
        };
        let mut emitter =
            ParticleEmitter::rectangle(template, Vec2::ZERO.into(), schedule(3, 1.0, false)).unwrap();

        // 偏移 1.0 / 0.5 / 0.0，前两个在预老化时死亡
        let tick = emitter.tick(1.0, &mut system);
        assert_eq!(tick.requested, 3);
        assert_eq!(tick.expired, 2);
        assert_eq!(tick.admitted, 1);
        assert_eq!(system.stats().total_expired, 2);
    }

    #[test]
    fn test_anchor_moves_spawn_position() {
        let mut system = system(4);
        let mut emitter =
            ParticleEmitter::rectangle(long_lived(), Vec2::new(1.0, 0.0).into(), schedule(1, 1.0, true))
                .unwrap()
                .with_anchor(Anchor::at(5.0, 5.0));

        emitter.tick(1.0, &mut system);
        emitter.set_anchor(Anchor::at(-5.0, 0.0).with_scale(3.0));
        emitter.tick(1.0, &mut system);

        let positions: Vec<Vec2> = system.particles().map(|p| p.position()).collect();
        assert!(positions.contains(&Vec2::new(6.0, 5.0)));
        assert!(positions.contains(&Vec2::new(-2.0, 0.0)));
    }

    #[test]
    fn test_system_anchor_is_parent_origin() {
        let mut system = ParticleSystem::new(ParticleSystemConfig {
            gravity: Vec2::ZERO,
            anchor: Anchor::at(100.0, 0.0).with_scale(2.0),
            ..ParticleSystemConfig::with_capacity(4)
        })
        .unwrap();
        let mut emitter =
            ParticleEmitter::rectangle(long_lived(), Vec2::new(1.0, 0.0).into(), schedule(1, 1.0, true))
                .unwrap()
                .with_anchor(Anchor::at(5.0, 5.0));

        emitter.tick(1.0, &mut system);
        system.set_anchor(Anchor::default());
        emitter.tick(1.0, &mut system);

        let positions: Vec<Vec2> = system.particles().map(|p| p.position()).collect();
        assert!(positions.contains(&Vec2::new(112.0, 10.0)));
        assert!(positions.contains(&Vec2::new(6.0, 5.0)));
    }

    #[test]
    fn test_stopped_emitter_is_inert() {
        let mut system = system(4);
        let mut emitter = ParticleEmitter::circle(
            long_lived(),
            RadialRange::disc(1.0),
            EmissionSchedule {
                autoplay: false,
                ..schedule(4, 1.0, true)
            },
        )
        .unwrap();

        assert_eq!(emitter.tick(2.0, &mut system), EmitterTick::default());
        emitter.play();
        assert_eq!(emitter.tick(1.0, &mut system).admitted, 4);
        emitter.stop();
        assert!(!emitter.is_playing());
        assert_eq!(emitter.scheduler().current_time(), 0.0);
    }

    #[test]
    fn test_config_roundtrip_through_toml() {
        let config: EmitterConfig = toml::from_str(
            r#"
            [schedule]
            total_spawn_count = 20
            cycle_duration = 2.0
            infinite_loop = true

            [shape]
            kind = "circle"
            position = { power_min = 0.0, power_max = 4.0, angle_min = 0.0, angle_max = 180.0 }

            [particle]
            lifetime = { min = 0.5, max = 1.5 }
            velocity = { power_min = 10.0, power_max = 20.0, angle_min = 45.0, angle_max = 135.0 }
            scale_curve = [1.0, { min = 0.5, max = 2.0 }, 0.0]
            color_curve = [0xFF8800, 0x000000]
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.schedule.total_spawn_count, 20);
        assert!(matches!(config.shape, ShapeConfig::Circle { .. }));
        assert_eq!(config.particle.scale_curve.points().len(), 3);

        let emitter = ParticleEmitter::from_config(&config).unwrap();
        assert!(emitter.is_playing());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EmitterConfig {
            schedule: schedule(10, -1.0, false),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(ParticleEmitter::from_config(&config).is_err());
    }
}
