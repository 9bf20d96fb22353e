//! bevy_ecs 集成
//!
//! 粒子系统和发射器作为组件挂在实体上，发射器通过 `target` 指向其
//! 粒子系统所在的实体。两个系统必须按顺序执行：先发射，再更新。

use bevy_ecs::prelude::*;

use crate::emitter::{Emitter, EmitterTick, ParticleEmitter};
use crate::particles::ParticleSystem;

/// 粒子模拟使用的帧时间
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct ParticleTime {
    pub delta_seconds: f32,
}

/// 最近一帧所有发射器的汇总结果
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct ParticleFrameStats {
    pub emitted: EmitterTick,
}

#[derive(Component, Debug, Clone)]
pub struct ParticleSystemComponent(pub ParticleSystem);

#[derive(Component, Debug, Clone)]
pub struct EmitterComponent {
    pub emitter: ParticleEmitter,
    /// 带有 [`ParticleSystemComponent`] 的实体
    pub target: Entity,
}

impl EmitterComponent {
    pub fn new(emitter: ParticleEmitter, target: Entity) -> Self {
        Self { emitter, target }
    }
}

pub fn particle_emitter_update_system(
    time: Res<ParticleTime>,
    mut frame: ResMut<ParticleFrameStats>,
    mut emitters: Query<&mut EmitterComponent>,
    mut systems: Query<&mut ParticleSystemComponent>,
) {
    let mut emitted = EmitterTick::default();
    for mut component in emitters.iter_mut() {
        let component = &mut *component;
        match systems.get_mut(component.target) {
            Ok(mut system) => emitted += component.emitter.tick(time.delta_seconds, &mut system.0),
            Err(_) => {
                tracing::warn!(
                    target: "particles",
                    target_entity = ?component.target,
                    "Emitter target has no particle system"
                );
            }
        }
    }
    frame.emitted = emitted;
}

pub fn particle_system_update_system(
    time: Res<ParticleTime>,
    mut systems: Query<&mut ParticleSystemComponent>,
) {
    for mut system in systems.iter_mut() {
        system.0.update(time.delta_seconds);
    }
}

/// 注册粒子资源
pub fn init_particle_resources(world: &mut World) {
    world.init_resource::<ParticleTime>();
    world.init_resource::<ParticleFrameStats>();
}

/// 按"先发射，后更新"的顺序注册粒子系统
pub fn add_particle_systems(schedule: &mut Schedule) {
    schedule.add_systems(
        (
            particle_emitter_update_system,
            particle_system_update_system,
        )
            .chain(),
    );
}
