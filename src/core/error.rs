//! 统一错误处理模块
//!
//! 提供引擎范围内的统一错误类型定义
//!
//! ## 错误分层
//!
//! - **启动期错误**: 后端、实例、设备、管线创建失败，沿调用链返回到 `Engine::run`，
//!   这是唯一允许终止进程的位置
//! - **运行期错误**: 管线缓存读写、未知触摸点等，只记录日志并降级处理，不会中断主循环

use thiserror::Error;

use crate::config::ConfigError;

/// 引擎核心错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Window creation failed: {0}")]
    Window(String),

    #[error("Event loop error: {0}")]
    EventLoop(String),
}

/// 渲染系统错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Failed to request adapter: no compatible GPU found")]
    NoAdapter,

    #[error("Failed to request device: {0}")]
    DeviceRequest(String),

    #[error("Failed to create surface: {0}")]
    SurfaceCreation(String),

    #[error("Surface is not supported by the selected adapter")]
    IncompatibleSurface,

    #[error("Failed to load shader {name}: {reason}")]
    ShaderLoad { name: String, reason: String },

    #[error("Failed to create pipeline {name}: {reason}")]
    PipelineCreation { name: String, reason: String },

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Dispatch of {groups} workgroups exceeds the device limit of {limit}")]
    DispatchLimit { groups: u32, limit: u32 },

    #[error("Invalid render state: {0}")]
    InvalidState(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
pub type RenderResult<T> = Result<T, RenderError>;
