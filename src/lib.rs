//! # GPU Particles
//!
//! 实时 GPU 粒子模拟与渲染：计算着色器在鼠标/触摸吸引力作用下推进粒子，
//! 图形管线把粒子绘制为点，并支持多重采样抗锯齿。
//!
//! ## Modules
//!
//! - [`core`]: 引擎入口、主循环与错误类型
//! - [`config`]: TOML/JSON 配置与环境变量覆盖
//! - [`platform`]: 窗口事件与窗口管理命令
//! - [`simulation`]: 粒子数据、模拟参数与输入桥接
//! - [`render`]: 设备、管线、交换链与帧驱动

pub mod config;
pub mod core;
pub mod platform;
pub mod render;
pub mod simulation;

pub use crate::core::{Engine, EngineError, EngineResult};
