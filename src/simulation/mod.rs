//! 粒子模拟模块
//!
//! - `particle` - 粒子布局与初始分布
//! - `params` - 每帧模拟参数及其上传方式
//! - `kernel` - 计算调度网格与 CPU 参考内核
//! - `touch` - 多点触控集合
//! - `bridge` - 输入事件到模拟参数的桥接

pub mod bridge;
pub mod kernel;
pub mod params;
pub mod particle;
pub mod touch;

pub use bridge::{BridgeAction, InputBridge};
pub use kernel::{dispatch_group_count, unsimulated_particles, WORKGROUP_SIZE};
pub use params::{normalize_position, ParameterTransport, SimulationParams};
pub use particle::{spawn_particles, Particle, PARTICLE_STRIDE};
pub use touch::{TouchPoint, TouchSet};
