//! # Game Engine Particles
//!
//! CPU-side 2D particle simulation that feeds a GPU instance buffer.
//!
//! ## Features
//!
//! - **Emitters**: rectangle and circle shapes with per-particle random ranges
//! - **Emission Scheduling**: finite or looping cycles, sub-frame spawn offsets
//! - **Lifecycle Curves**: scale, color and opacity over normalized age
//! - **Fixed Capacity**: instance buffer allocated once, excess spawns dropped
//! - **ECS Integration**: bevy_ecs components and chained update systems
//!
//! ## Frame Ordering
//!
//! Every frame runs emitters first, then integrates each particle system and
//! republishes its instance buffer, so particles spawned this frame are drawn
//! this frame.
//!
//! ### Example
//!
//! ```ignore
//! use game_engine_particles::config::EffectConfig;
//!
//! let mut manager = EffectConfig::load_or_default("fire.toml").build()?;
//! loop {
//!     manager.update(1.0 / 60.0);
//!     for (_, system) in manager.systems() {
//!         upload(system.snapshot().as_bytes());
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Errors and shared macros
//! - [`range`]: Random ranges and fixed-or-range values
//! - [`curve`]: Lifecycle curves
//! - [`particles`]: Particle records, integrator, store and systems
//! - [`emitter`]: Emission scheduling and shape factories
//! - [`ecs`]: bevy_ecs integration
//! - [`config`]: Effect configuration and logging setup

/// Errors and shared macros
#[macro_use]
pub mod core;
/// Random ranges sampled per particle
pub mod range;
/// RGB color
pub mod color;
/// Lifecycle curves
pub mod curve;
/// Host-provided spawn origin
pub mod anchor;
/// Particle records, lifecycle integrator, fixed-capacity store and systems
pub mod particles;
/// Emission scheduling and particle factories
pub mod emitter;
/// bevy_ecs integration
pub mod ecs;
/// Effect configuration and logging
pub mod config;

pub use crate::anchor::Anchor;
pub use crate::color::Color;
pub use crate::config::{ConfigError, ConfigResult, EffectConfig};
pub use crate::core::{ParticleError, ParticleResult};
pub use crate::curve::Curve;
pub use crate::emitter::{Emitter, EmitterTick, ParticleEmitter};
pub use crate::particles::{
    InstanceSnapshot, ParticleInstance, ParticleSystem, ParticleSystemConfig,
    ParticleSystemManager,
};
pub use crate::range::Value;
