//! 特效配置系统
//!
//! 一个特效 = 一个粒子系统 + 若干发射器。支持 TOML/JSON 文件、
//! 环境变量覆盖，加载后立即验证。

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub mod logging;

pub use logging::{init_logging, LogLevel, LoggingConfig};

use crate::core::ParticleError;
use crate::emitter::{EmitterConfig, ParticleEmitter};
use crate::particles::{ParticleSystem, ParticleSystemConfig, ParticleSystemManager};

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(#[from] ParticleError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 特效配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// 粒子系统
    pub system: ParticleSystemConfig,
    /// 指向该系统的发射器，按顺序执行
    pub emitters: Vec<EmitterConfig>,
    /// 日志配置
    pub logging: LoggingConfig,
}

impl EffectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析并验证配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析并验证配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: Self =
            serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 保存为JSON文件
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 从环境变量覆盖配置，无法解析的值被忽略
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("PARTICLES_CAPACITY") {
            if let Ok(capacity) = val.parse() {
                self.system.capacity = capacity;
            }
        }
        if let Ok(val) = env::var("PARTICLES_GRAVITY_X") {
            if let Ok(x) = val.parse() {
                self.system.gravity.x = x;
            }
        }
        if let Ok(val) = env::var("PARTICLES_GRAVITY_Y") {
            if let Ok(y) = val.parse() {
                self.system.gravity.y = y;
            }
        }
        if let Ok(val) = env::var("PARTICLES_LOG_LEVEL") {
            if let Ok(level) = val.parse() {
                self.logging.level = level;
            }
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.system.validate()?;
        for emitter in &self.emitters {
            emitter.validate()?;
        }
        Ok(())
    }

    /// 加载配置文件，失败时回退到默认配置
    ///
    /// 按扩展名选择格式（`.json` 为JSON，其余按TOML解析），
    /// 随后应用环境变量覆盖。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let loaded = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        };

        let mut config = match loaded {
            Ok(config) => {
                tracing::debug!(target: "particles", path = %path.display(), "Loaded effect config");
                config
            }
            Err(err) => {
                tracing::warn!(
                    target: "particles",
                    path = %path.display(),
                    error = %err,
                    "Failed to load effect config, using defaults"
                );
                Self::default()
            }
        };
        config.apply_env_overrides();
        config
    }

    /// 创建粒子系统及其全部发射器
    pub fn build(&self) -> ConfigResult<ParticleSystemManager> {
        self.validate()?;
        let mut manager = ParticleSystemManager::new();
        let target = manager.add_system(ParticleSystem::new(self.system.clone())?);
        for emitter in &self.emitters {
            manager.add_emitter(target, ParticleEmitter::from_config(emitter)?)?;
        }
        Ok(manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::{EmissionSchedule, ShapeConfig};
    use crate::range::VectorRange;
    use glam::Vec2;

    const FIRE: &str = r#"
        [system]
        capacity = 256
        gravity = [0.0, 30.0]

        [system.sprite]
        texture = { width = 32, height = 32 }
        quad_size = [16.0, 16.0]

        [[emitters]]
        schedule = { infinite_loop = true, total_spawn_count = 60, cycle_duration = 1.0 }
        shape = { kind = "rectangle", position = { min = [-8.0, 0.0], max = [8.0, 0.0] } }

        [emitters.particle]
        lifetime = { min = 0.6, max = 1.2 }
        velocity = { power_min = 20.0, power_max = 40.0, angle_min = 80.0, angle_max = 100.0 }
        scale_curve = [1.0, 0.2]
        color_curve = [0xFFDD55, 0xFF5500, 0x330000]
        opacity_curve = [1.0, 1.0, 0.0]

        [logging]
        level = "debug"
    "#;

    #[test]
    fn test_default_config() {
        let config = EffectConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.build().is_ok());
    }

    #[test]
    fn test_parse_fire_effect() {
        let config = EffectConfig::from_toml_str(FIRE).unwrap();
        assert_eq!(config.system.capacity, 256);
        assert_eq!(config.system.gravity, Vec2::new(0.0, 30.0));
        assert_eq!(config.emitters.len(), 1);
        assert_eq!(config.logging.level, LogLevel::Debug);

        let manager = config.build().unwrap();
        assert_eq!(manager.system_count(), 1);
        assert_eq!(manager.emitter_count(), 1);
    }

    #[test]
    fn test_validation_errors() {
        let zero = EffectConfig::from_toml_str("[system]\ncapacity = 0");
        assert!(matches!(
            zero,
            Err(ConfigError::ValidationError(ParticleError::ZeroCapacity))
        ));

        let empty_curve = FIRE.replace("scale_curve = [1.0, 0.2]", "scale_curve = []");
        assert!(matches!(
            EffectConfig::from_toml_str(&empty_curve),
            Err(ConfigError::ValidationError(ParticleError::EmptyCurve))
        ));

        let bad_duration = FIRE.replace("cycle_duration = 1.0", "cycle_duration = 0.0");
        assert!(matches!(
            EffectConfig::from_toml_str(&bad_duration),
            Err(ConfigError::ValidationError(ParticleError::InvalidEmission(_)))
        ));

        assert!(matches!(
            EffectConfig::from_toml_str("[system\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_json_serialization() {
        let mut config = EffectConfig::default();
        config.emitters.push(EmitterConfig {
            schedule: EmissionSchedule {
                total_spawn_count: 5,
                ..Default::default()
            },
            shape: ShapeConfig::Rectangle {
                position: VectorRange::centered(Vec2::splat(2.0)).into(),
            },
            ..Default::default()
        });

        let json = serde_json::to_string(&config).unwrap();
        let parsed = EffectConfig::from_json_str(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_save_and_load_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = EffectConfig::from_toml_str(FIRE).unwrap();

        let toml_path = dir.path().join("fire.toml");
        config.save_toml(&toml_path).unwrap();
        assert_eq!(EffectConfig::from_toml_file(&toml_path).unwrap(), config);

        let json_path = dir.path().join("fire.json");
        config.save_json(&json_path).unwrap();
        assert_eq!(EffectConfig::from_json_file(&json_path).unwrap(), config);
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = EffectConfig::load_or_default(dir.path().join("missing.toml"));
        assert_eq!(config.system.capacity, ParticleSystemConfig::default().capacity);

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        let config = EffectConfig::load_or_default(&broken);
        assert!(config.emitters.is_empty());
    }

    #[test]
    fn test_missing_file_is_file_error() {
        assert!(matches!(
            EffectConfig::from_toml_file("/nonexistent/effect.toml"),
            Err(ConfigError::FileError(_))
        ));
    }
}
