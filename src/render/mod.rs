//! 渲染模块
//!
//! - `context` - 实例、适配器、设备与队列
//! - `shaders` - 着色器二进制加载
//! - `pipeline_cache` - 管线编译缓存持久化
//! - `pipeline` - 计算管线与图形管线
//! - `buffers` - 粒子缓冲区
//! - `targets` - 渲染通道布局与多重采样目标
//! - `swapchain` - 交换链描述与表面配置
//! - `frame` - 帧驱动与表面生命周期
//! - `particles` - 粒子渲染器

pub mod buffers;
pub mod context;
pub mod frame;
pub mod particles;
pub mod pipeline;
pub mod pipeline_cache;
pub mod shaders;
pub mod swapchain;
pub mod targets;

pub use buffers::ParticleBufferStore;
pub use context::GpuContext;
pub use frame::{FrameDriver, FrameRecorder, FrameStatus, RendererState, SurfaceSlot};
pub use particles::ParticleRenderer;
pub use pipeline::PipelineBuilder;
pub use pipeline_cache::PipelineCacheStore;
pub use shaders::{ShaderBlob, ShaderSet};
pub use swapchain::{Invalidation, Swapchain, SwapchainDesc};
pub use targets::{RenderPassLayout, SampleCount, TargetState};
