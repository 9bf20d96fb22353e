//! 粒子系统与粒子系统管理器
//!
//! [`ParticleSystem`] 拥有粒子存储、积分器（重力）和实例缓冲区，
//! 每帧执行"积分 → 移除死亡粒子 → 发布"两阶段更新。
//!
//! [`ParticleSystemManager`] 管理多个粒子系统及其发射器，保证每帧先执行所有
//! 发射器，再更新粒子系统，使新生成的粒子在同一帧内可见。

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::lifecycle::{Integrator, DEFAULT_GRAVITY};
use super::particle::Particle;
use super::store::{InstanceSnapshot, ParticleStore};
use crate::anchor::Anchor;
use crate::core::{ParticleError, ParticleResult};
use crate::emitter::{Emitter, EmitterTick, ParticleEmitter};
use crate::impl_default;

// ============================================================================
// 配置
// ============================================================================

/// 贴图尺寸（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureSize {
    pub width: u32,
    pub height: u32,
}

/// 渲染端使用的精灵描述：共享四边形 + 贴图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteDescriptor {
    /// 粒子贴图
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<TextureSize>,
    /// 四边形尺寸
    pub quad_size: Vec2,
}

impl_default!(SpriteDescriptor {
    texture: Some(TextureSize {
        width: 1,
        height: 1,
    }),
    quad_size: Vec2::ONE,
});

impl SpriteDescriptor {
    pub fn new(width: u32, height: u32, quad_size: Vec2) -> Self {
        Self {
            texture: Some(TextureSize { width, height }),
            quad_size,
        }
    }

    /// 以贴图像素尺寸作为四边形尺寸
    pub fn from_texture(width: u32, height: u32) -> Self {
        Self::new(width, height, Vec2::new(width as f32, height as f32))
    }

    pub fn validate(&self) -> ParticleResult<()> {
        let texture = self.texture.ok_or(ParticleError::MissingTexture)?;
        if texture.width == 0 || texture.height == 0 {
            return Err(ParticleError::InvalidTexture {
                width: texture.width,
                height: texture.height,
            });
        }
        if !self.quad_size.is_finite() || self.quad_size.cmple(Vec2::ZERO).any() {
            return Err(ParticleError::InvalidGeometry(format!(
                "quad size {} must be finite and positive",
                self.quad_size
            )));
        }
        Ok(())
    }
}

/// 粒子系统配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleSystemConfig {
    /// 最大粒子数（实例缓冲区容量）
    pub capacity: usize,
    /// 重力
    #[serde(default = "default_gravity")]
    pub gravity: Vec2,
    /// 精灵描述
    #[serde(default)]
    pub sprite: SpriteDescriptor,
    /// 锚点，指向该系统的发射器以它为父级原点
    #[serde(default)]
    pub anchor: Anchor,
}

fn default_gravity() -> Vec2 {
    DEFAULT_GRAVITY
}

impl_default!(ParticleSystemConfig {
    capacity: 1000,
    gravity: DEFAULT_GRAVITY,
    sprite: SpriteDescriptor::default(),
    anchor: Anchor::default(),
});

impl ParticleSystemConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> ParticleResult<()> {
        if self.capacity == 0 {
            return Err(ParticleError::ZeroCapacity);
        }
        if !self.gravity.is_finite() {
            return Err(ParticleError::InvalidGravity {
                x: self.gravity.x,
                y: self.gravity.y,
            });
        }
        self.sprite.validate()?;
        self.anchor.validate()
    }
}

// ============================================================================
// 粒子系统
// ============================================================================

/// 粒子系统统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParticleSystemStats {
    /// 当前存活粒子数
    pub live_count: usize,
    /// 累计接纳的粒子数
    pub total_spawned: u64,
    /// 因容量已满被丢弃的生成请求
    pub total_dropped: u64,
    /// 预老化后已死亡、未被接纳的粒子
    pub total_expired: u64,
    /// 寿命结束被移除的粒子
    pub total_removed: u64,
}

/// 粒子系统
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    store: ParticleStore,
    integrator: Integrator,
    anchor: Anchor,
    sprite: SpriteDescriptor,
    stats: ParticleSystemStats,
}

impl ParticleSystem {
    /// 创建粒子系统，配置非法时立即失败
    pub fn new(config: ParticleSystemConfig) -> ParticleResult<Self> {
        config.validate()?;
        let system = Self {
            store: ParticleStore::new(config.capacity)?,
            integrator: Integrator::new(config.gravity)?,
            anchor: config.anchor,
            sprite: config.sprite,
            stats: ParticleSystemStats::default(),
        };
        tracing::debug!(
            target: "particles",
            capacity = config.capacity,
            gravity = %config.gravity,
            "Particle system created"
        );
        Ok(system)
    }

    /// 使用默认配置和指定容量创建
    pub fn with_capacity(capacity: usize) -> ParticleResult<Self> {
        Self::new(ParticleSystemConfig::with_capacity(capacity))
    }

    /// 加入一个粒子，容量已满时丢弃并返回 `false`
    pub fn spawn(&mut self, particle: Particle) -> bool {
        if self.store.spawn(particle) {
            self.stats.total_spawned += 1;
            true
        } else {
            self.stats.total_dropped += 1;
            false
        }
    }

    /// 记录一个在预老化阶段就已死亡的粒子
    pub(crate) fn record_expired(&mut self) {
        self.stats.total_expired += 1;
    }

    /// 推进所有粒子，不移除、不发布
    pub fn integrate(&mut self, dt: f32) -> usize {
        self.integrator.advance_all(self.store.particles_mut(), dt)
    }

    /// 每帧更新：积分、移除死亡粒子、重新发布实例缓冲区
    pub fn update(&mut self, dt: f32) -> InstanceSnapshot<'_> {
        self.integrate(dt);
        let removed = self.store.remove_dead();
        self.stats.total_removed += removed as u64;
        self.stats.live_count = self.store.len();
        tracing::trace!(
            target: "particles",
            live = self.stats.live_count,
            removed,
            "Particle system updated"
        );
        self.store.publish()
    }

    /// 最近一次发布的快照
    pub fn snapshot(&self) -> InstanceSnapshot<'_> {
        self.store.snapshot()
    }

    /// 渲染端读取并清除脏标记
    pub fn take_dirty(&mut self) -> bool {
        self.store.take_dirty()
    }

    pub fn integrator(&self) -> &Integrator {
        &self.integrator
    }

    pub fn gravity(&self) -> Vec2 {
        self.integrator.gravity()
    }

    pub fn set_gravity(&mut self, gravity: Vec2) -> ParticleResult<()> {
        self.integrator.set_gravity(gravity)
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    pub fn set_anchor(&mut self, anchor: Anchor) {
        self.anchor = anchor;
    }

    pub fn sprite(&self) -> &SpriteDescriptor {
        &self.sprite
    }

    pub fn stats(&self) -> ParticleSystemStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn is_full(&self) -> bool {
        self.store.is_full()
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.store.iter()
    }

    pub fn clear(&mut self) {
        self.store.clear();
        self.stats.live_count = 0;
    }
}

// ============================================================================
// 粒子系统管理器
// ============================================================================

/// 粒子系统 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemId(usize);

/// 发射器 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmitterId(usize);

struct EmitterSlot {
    target: SystemId,
    emitter: ParticleEmitter,
}

/// 粒子系统管理器
///
/// 每帧先按加入顺序执行所有发射器，再更新所有粒子系统。
/// 多个发射器可以指向同一个系统，容量不足时先到先得。
#[derive(Default)]
pub struct ParticleSystemManager {
    systems: Vec<ParticleSystem>,
    emitters: Vec<EmitterSlot>,
}

impl ParticleSystemManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加粒子系统
    pub fn add_system(&mut self, system: ParticleSystem) -> SystemId {
        let id = SystemId(self.systems.len());
        self.systems.push(system);
        id
    }

    /// 添加指向 `target` 的发射器
    pub fn add_emitter(
        &mut self,
        target: SystemId,
        emitter: ParticleEmitter,
    ) -> ParticleResult<EmitterId> {
        if target.0 >= self.systems.len() {
            return Err(ParticleError::UnknownSystem(target.0));
        }
        let id = EmitterId(self.emitters.len());
        self.emitters.push(EmitterSlot { target, emitter });
        Ok(id)
    }

    pub fn system(&self, id: SystemId) -> Option<&ParticleSystem> {
        self.systems.get(id.0)
    }

    pub fn system_mut(&mut self, id: SystemId) -> Option<&mut ParticleSystem> {
        self.systems.get_mut(id.0)
    }

    pub fn emitter(&self, id: EmitterId) -> Option<&ParticleEmitter> {
        self.emitters.get(id.0).map(|slot| &slot.emitter)
    }

    pub fn emitter_mut(&mut self, id: EmitterId) -> Option<&mut ParticleEmitter> {
        self.emitters.get_mut(id.0).map(|slot| &mut slot.emitter)
    }

    /// 按加入顺序遍历所有粒子系统
    pub fn systems(&self) -> impl Iterator<Item = (SystemId, &ParticleSystem)> {
        self.systems
            .iter()
            .enumerate()
            .map(|(index, system)| (SystemId(index), system))
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    pub fn emitter_count(&self) -> usize {
        self.emitters.len()
    }

    /// 推进一帧：发射器先生成，粒子系统再积分并发布
    pub fn update(&mut self, dt: f32) -> EmitterTick {
        let mut frame = EmitterTick::default();
        for slot in &mut self.emitters {
            if let Some(system) = self.systems.get_mut(slot.target.0) {
                frame += slot.emitter.tick(dt, system);
            }
        }
        for system in &mut self.systems {
            system.update(dt);
        }
        frame
    }

    pub fn play_all(&mut self) {
        for slot in &mut self.emitters {
            slot.emitter.play();
        }
    }

    pub fn stop_all(&mut self) {
        for slot in &mut self.emitters {
            slot.emitter.stop();
        }
    }

    /// 所有发射器都已停止
    pub fn is_idle(&self) -> bool {
        self.emitters.iter().all(|slot| !slot.emitter.is_playing())
    }
}
