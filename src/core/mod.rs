//! 核心模块
//!
//! - `error` - 错误类型定义
//! - `macros` - 减少样板代码的宏

pub mod error;
#[macro_use]
pub mod macros;

pub use error::{ParticleError, ParticleResult};
