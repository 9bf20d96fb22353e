//! 日志配置

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::impl_default;

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `RUST_LOG` 未设置时使用的级别
    pub level: LogLevel,
    /// 是否输出事件的 target
    pub with_target: bool,
    /// 是否使用 ANSI 颜色
    pub ansi: bool,
}

impl_default!(LoggingConfig {
    level: LogLevel::Info,
    with_target: true,
    ansi: true,
});

impl LoggingConfig {
    /// 构造过滤器：优先使用 `RUST_LOG`，否则使用配置的级别
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
    }
}

/// 安装全局 fmt 订阅者
///
/// 已经安装过订阅者时返回 `false`，重复调用无副作用。
pub fn init_logging(config: &LoggingConfig) -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_target(config.with_target)
        .with_ansi(config.ansi)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(target: "particles", level = %config.level, "Logging initialized");
    }
    installed
}
