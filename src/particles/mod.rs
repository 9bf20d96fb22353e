//! 粒子核心：粒子记录、生命周期积分、固定容量存储与粒子系统

pub mod lifecycle;
pub mod particle;
pub mod store;
pub mod system;

pub use lifecycle::{Integrator, DEATH_TOLERANCE, DEFAULT_GRAVITY};
pub use particle::{Particle, ParticleInstance};
pub use store::{InstanceSnapshot, ParticleStore};
pub use system::{
    EmitterId, ParticleSystem, ParticleSystemConfig, ParticleSystemManager, ParticleSystemStats,
    SpriteDescriptor, SystemId, TextureSize,
};
