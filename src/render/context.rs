//! GPU 设备上下文
//!
//! 持有 wgpu 实例、适配器、设备与队列。所有 GPU 调用只在 `GpuContext`
//! 存活期间有效：它先于任何渲染资源创建，并在渲染器和表面之后销毁。

use std::sync::Arc;

use winit::window::Window;

use crate::core::error::{RenderError, RenderResult};

use super::targets::SampleCount;

/// 可选特性，适配器支持时启用
const OPTIONAL_FEATURES: wgpu::Features = wgpu::Features::PIPELINE_CACHE
    .union(wgpu::Features::PUSH_CONSTANTS)
    .union(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES);

/// GPU 上下文
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// 创建实例，`WGPU_BACKEND` 环境变量可覆盖后端选择
    pub fn create_instance() -> wgpu::Instance {
        wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::util::backend_bits_from_env().unwrap_or(wgpu::Backends::PRIMARY),
            ..Default::default()
        })
    }

    /// 为窗口创建呈现表面
    pub fn create_surface(
        instance: &wgpu::Instance,
        window: Arc<Window>,
    ) -> RenderResult<wgpu::Surface<'static>> {
        instance
            .create_surface(window)
            .map_err(|e| RenderError::SurfaceCreation(e.to_string()))
    }

    /// 请求适配器和设备
    ///
    /// `compatible_surface` 为 `None` 时用于离屏渲染（测试）。
    pub async fn new(
        instance: wgpu::Instance,
        compatible_surface: Option<&wgpu::Surface<'_>>,
    ) -> RenderResult<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let info = adapter.get_info();
        tracing::info!(
            target: "render",
            "Using adapter {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let features = adapter.features() & OPTIONAL_FEATURES;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Particle Device"),
                    required_features: features,
                    required_limits: adapter.limits(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| RenderError::DeviceRequest(e.to_string()))?;

        tracing::debug!(target: "render", "Enabled optional features: {:?}", features);

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    pub fn features(&self) -> wgpu::Features {
        self.device.features()
    }

    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    pub fn supports_push_constants(&self) -> bool {
        self.features().contains(wgpu::Features::PUSH_CONSTANTS)
    }

    pub fn supports_pipeline_cache(&self) -> bool {
        self.features().contains(wgpu::Features::PIPELINE_CACHE)
    }

    /// 该格式是否可用指定采样数作为渲染目标
    pub fn supports_sample_count(&self, format: wgpu::TextureFormat, samples: SampleCount) -> bool {
        if !samples.is_multisampled() {
            return true;
        }
        let features = if self
            .features()
            .contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES)
        {
            self.adapter.get_texture_format_features(format)
        } else {
            format.guaranteed_format_features(self.features())
        };
        features.flags.sample_count_supported(samples.count())
    }

    /// 阻塞直到所有已提交的 GPU 工作完成
    pub fn wait_idle(&self) {
        let _ = self.device.poll(wgpu::Maintain::Wait);
    }

    /// 在验证错误作用域内执行，捕获的错误以字符串返回
    pub fn scoped<T>(&self, f: impl FnOnce() -> T) -> Result<T, String> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f();
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(error.to_string()),
            None => Ok(value),
        }
    }
}
