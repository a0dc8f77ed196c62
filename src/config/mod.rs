//! 统一配置系统
//!
//! 提供TOML/JSON配置文件和环境变量覆盖，启动时加载一次

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod graphics;
pub mod simulation;

pub use graphics::{GraphicsConfig, PipelineCacheConfig, Resolution};
pub use simulation::SimulationConfig;

use crate::impl_default;
use crate::render::targets::SampleCount;
use crate::simulation::ParameterTransport;

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
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 引擎主配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 图形配置
    #[serde(default)]
    pub graphics: GraphicsConfig,

    /// 模拟配置
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| env::var(key).ok());
    }

    /// 使用给定的查找函数覆盖配置，无法解析的值被忽略
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(count) = lookup("PARTICLES_COUNT").and_then(|v| v.parse().ok()) {
            self.simulation.particle_count = count;
        }
        if let Some(samples) = lookup("PARTICLES_SAMPLES")
            .and_then(|v| v.parse::<u32>().ok())
            .and_then(|v| SampleCount::try_from(v).ok())
        {
            self.graphics.sample_count = samples;
        }
        if let Some(transport) = lookup("PARTICLES_TRANSPORT").and_then(|v| match v.as_str() {
            "push_constant" => Some(ParameterTransport::PushConstant),
            "uniform_buffer" => Some(ParameterTransport::UniformBuffer),
            _ => None,
        }) {
            self.simulation.parameter_transport = transport;
        }
        if let Some(vsync) = lookup("PARTICLES_VSYNC").and_then(|v| v.parse().ok()) {
            self.graphics.vsync = vsync;
        }
        if let Some(width) = lookup("PARTICLES_WIDTH").and_then(|v| v.parse().ok()) {
            self.graphics.resolution.width = width;
        }
        if let Some(height) = lookup("PARTICLES_HEIGHT").and_then(|v| v.parse().ok()) {
            self.graphics.resolution.height = height;
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.graphics.validate()?;
        self.simulation.validate()?;
        Ok(())
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./particles.toml
    /// 2. ./particles.json
    /// 3. {config_dir}/gpu_particles/particles.toml
    /// 4. 使用默认配置
    ///
    /// 返回配置及其来源路径（默认配置时为 `None`）。
    pub fn load_or_default() -> (Self, Option<PathBuf>) {
        let mut candidates = vec![
            PathBuf::from("particles.toml"),
            PathBuf::from("particles.json"),
        ];
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("gpu_particles").join("particles.toml"));
        }

        for path in candidates {
            let loaded = match path.extension().and_then(|e| e.to_str()) {
                Some("json") => Self::from_json_file(&path),
                _ => Self::from_toml_file(&path),
            };
            match loaded {
                Ok(config) => return (config, Some(path)),
                Err(ConfigError::FileError(_)) => continue,
                Err(e) => {
                    eprintln!("Ignoring config {}: {}", path.display(), e);
                }
            }
        }

        (Self::default(), None)
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（`RUST_LOG` 优先）
    pub level: LogLevel,
}

impl_default!(LoggingConfig {
    level: LogLevel::Info,
});

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
    /// 作为 `EnvFilter` 指令使用
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
