//! 固定容量粒子存储
//!
//! 存储与实例缓冲区在构造时分配，之后不再扩容。
//! 满容量时的生成请求被静默丢弃（不排队、不扩容）。

use super::particle::{Particle, ParticleInstance};
use crate::core::{ParticleError, ParticleResult};

/// 粒子存储
#[derive(Debug, Clone)]
pub struct ParticleStore {
    /// 存活粒子
    particles: Vec<Particle>,
    /// 实例缓冲区，与存活粒子按下标对齐
    instances: Box<[ParticleInstance]>,
    /// 最近一次发布的实例数
    published: usize,
    /// 发布后尚未被渲染端读取
    dirty: bool,
}

impl ParticleStore {
    pub fn new(capacity: usize) -> ParticleResult<Self> {
        if capacity == 0 {
            return Err(ParticleError::ZeroCapacity);
        }
        Ok(Self {
            particles: Vec::with_capacity(capacity),
            instances: vec![ParticleInstance::default(); capacity].into_boxed_slice(),
            published: 0,
            dirty: false,
        })
    }

    pub fn capacity(&self) -> usize {
        self.instances.len()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.particles.len() >= self.capacity()
    }

    /// 加入一个粒子，容量已满时返回 `false`
    pub fn spawn(&mut self, particle: Particle) -> bool {
        if self.is_full() {
            return false;
        }
        self.particles.push(particle);
        true
    }

    /// 移除已死亡的粒子，返回移除数量
    ///
    /// 使用 swap-remove，存活粒子之间的顺序不保证。
    pub fn remove_dead(&mut self) -> usize {
        let before = self.particles.len();
        let mut index = 0;
        while index < self.particles.len() {
            if self.particles[index].is_alive() {
                index += 1;
            } else {
                self.particles.swap_remove(index);
            }
        }
        before - self.particles.len()
    }

    /// 用当前存活粒子重写实例缓冲区
    pub fn publish(&mut self) -> InstanceSnapshot<'_> {
        let live = self.particles.len();
        for (slot, particle) in self.instances[..live].iter_mut().zip(&self.particles) {
            *slot = particle.to_instance();
        }
        self.published = live;
        self.dirty = true;
        self.snapshot()
    }

    /// 最近一次发布的快照
    pub fn snapshot(&self) -> InstanceSnapshot<'_> {
        InstanceSnapshot {
            instances: &self.instances[..self.published],
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// 渲染端读取脏标记并清除
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// 清空所有粒子，下一次发布的实例数为 0
    pub fn clear(&mut self) {
        self.particles.clear();
        self.published = 0;
        self.dirty = true;
    }
}

/// 实例缓冲区的只读视图
#[derive(Debug, Clone, Copy)]
pub struct InstanceSnapshot<'a> {
    instances: &'a [ParticleInstance],
}

impl<'a> InstanceSnapshot<'a> {
    /// 渲染端需要绘制的实例数
    pub fn live_count(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instances(&self) -> &'a [ParticleInstance] {
        self.instances
    }

    /// 上传到 GPU 用的字节视图
    pub fn as_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.instances)
    }
}
