//! 交换链描述与表面配置

use crate::core::error::{RenderError, RenderResult};
use crate::render::context::GpuContext;

use super::targets::SampleCount;

/// 一次描述变更使哪些资源失效
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Invalidation {
    /// 需要重新配置表面
    pub surface: bool,
    /// 多重采样目标与每帧视图
    pub targets: bool,
    pub render_pass: bool,
    pub pipeline: bool,
}

impl Invalidation {
    pub const NONE: Invalidation = Invalidation {
        surface: false,
        targets: false,
        render_pass: false,
        pipeline: false,
    };

    pub fn all() -> Self {
        Self {
            surface: true,
            targets: true,
            render_pass: true,
            pipeline: true,
        }
    }

    pub fn merge(&mut self, other: Invalidation) {
        self.surface |= other.surface;
        self.targets |= other.targets;
        self.render_pass |= other.render_pass;
        self.pipeline |= other.pipeline;
    }

    pub fn any(&self) -> bool {
        self.surface || self.targets || self.render_pass || self.pipeline
    }

    /// 是否需要重建除表面以外的渲染资源
    pub fn needs_rebuild(&self) -> bool {
        self.targets || self.render_pass || self.pipeline
    }
}

/// 交换链描述 `{格式, 尺寸, 采样数}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapchainDesc {
    pub format: wgpu::TextureFormat,
    pub extent: (u32, u32),
    pub sample_count: SampleCount,
}

impl SwapchainDesc {
    pub fn new(format: wgpu::TextureFormat, extent: (u32, u32), sample_count: SampleCount) -> Self {
        Self {
            format,
            extent,
            sample_count,
        }
    }

    /// 尺寸为零（最小化）时不能配置表面
    pub fn is_renderable(&self) -> bool {
        self.extent.0 > 0 && self.extent.1 > 0
    }

    /// 改变尺寸：表面和多重采样目标失效，管线保持不变
    pub fn resize(&mut self, width: u32, height: u32) -> Invalidation {
        if self.extent == (width, height) {
            return Invalidation::NONE;
        }
        self.extent = (width, height);
        Invalidation {
            surface: true,
            targets: true,
            ..Invalidation::NONE
        }
    }

    /// 改变采样数：目标、渲染通道和管线都失效
    pub fn set_sample_count(&mut self, sample_count: SampleCount) -> Invalidation {
        if self.sample_count == sample_count {
            return Invalidation::NONE;
        }
        self.sample_count = sample_count;
        Invalidation {
            targets: true,
            render_pass: true,
            pipeline: true,
            ..Invalidation::NONE
        }
    }

    /// 改变输出格式（表面重新获得后可能发生）
    pub fn set_format(&mut self, format: wgpu::TextureFormat) -> Invalidation {
        if self.format == format {
            return Invalidation::NONE;
        }
        self.format = format;
        Invalidation::all()
    }
}

/// 已配置的呈现表面
pub struct Swapchain {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
}

impl Swapchain {
    /// 查询表面能力并选择格式与呈现模式
    ///
    /// 表面此时尚未配置，需要调用 [`Swapchain::configure`]。
    pub fn new(gpu: &GpuContext, surface: wgpu::Surface<'static>, vsync: bool) -> RenderResult<Self> {
        if !gpu.adapter.is_surface_supported(&surface) {
            return Err(RenderError::IncompatibleSurface);
        }

        let caps = surface.get_capabilities(&gpu.adapter);
        let format = preferred_format(&caps.formats).ok_or(RenderError::IncompatibleSurface)?;
        let present_mode = select_present_mode(&caps.present_modes, vsync);
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        tracing::info!(
            target: "render",
            "Surface format {:?}, present mode {:?}",
            format,
            present_mode
        );

        Ok(Self {
            surface,
            config: wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: 0,
                height: 0,
                present_mode,
                desired_maximum_frame_latency: 2,
                alpha_mode,
                view_formats: vec![],
            },
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn extent(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// 按描述配置表面；尺寸为零时跳过
    pub fn configure(&mut self, gpu: &GpuContext, desc: &SwapchainDesc) -> bool {
        if !desc.is_renderable() {
            return false;
        }
        self.config.width = desc.extent.0;
        self.config.height = desc.extent.1;
        self.surface.configure(&gpu.device, &self.config);
        true
    }

    pub fn acquire(&self) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.surface.get_current_texture()
    }
}

/// 优先选择 sRGB 格式
pub fn preferred_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|format| format.is_srgb())
        .or_else(|| formats.first().copied())
}

/// 垂直同步使用 Fifo，否则依次尝试 Mailbox、Immediate
pub fn select_present_mode(modes: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    if vsync {
        return wgpu::PresentMode::Fifo;
    }
    [wgpu::PresentMode::Mailbox, wgpu::PresentMode::Immediate]
        .into_iter()
        .find(|mode| modes.contains(mode))
        .unwrap_or(wgpu::PresentMode::Fifo)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

    #[test]
    fn test_resize_invalidates_targets_only() {
        let mut desc = SwapchainDesc::new(FORMAT, (800, 600), SampleCount::X4);
        let invalidation = desc.resize(1024, 768);
        assert_eq!(desc.extent, (1024, 768));
        assert!(invalidation.surface && invalidation.targets);
        assert!(!invalidation.render_pass && !invalidation.pipeline);

        assert_eq!(desc.resize(1024, 768), Invalidation::NONE);
    }

    #[test]
    fn test_sample_count_change_invalidates_pipeline() {
        let mut desc = SwapchainDesc::new(FORMAT, (800, 600), SampleCount::X1);
        let invalidation = desc.set_sample_count(SampleCount::X8);
        assert!(invalidation.render_pass && invalidation.pipeline && invalidation.targets);
        assert!(!invalidation.surface);
        assert_eq!(desc.set_sample_count(SampleCount::X8), Invalidation::NONE);
    }

    #[test]
    fn test_format_change_invalidates_everything() {
        let mut desc = SwapchainDesc::new(FORMAT, (800, 600), SampleCount::X1);
        assert_eq!(
            desc.set_format(wgpu::TextureFormat::Rgba8UnormSrgb),
            Invalidation::all()
        );
        assert_eq!(
            desc.set_format(wgpu::TextureFormat::Rgba8UnormSrgb),
            Invalidation::NONE
        );
    }

    #[test]
    fn test_zero_extent_is_not_renderable() {
        let mut desc = SwapchainDesc::new(FORMAT, (800, 600), SampleCount::X1);
        desc.resize(0, 600);
        assert!(!desc.is_renderable());
    }

    #[test]
    fn test_merge() {
        let mut pending = Invalidation::NONE;
        assert!(!pending.any());
        pending.merge(Invalidation {
            targets: true,
            ..Invalidation::NONE
        });
        pending.merge(Invalidation {
            pipeline: true,
            ..Invalidation::NONE
        });
        assert!(pending.targets && pending.pipeline);
        assert!(!pending.surface);
        assert!(pending.needs_rebuild());
    }

    #[test]
    fn test_preferred_format() {
        let formats = [
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Bgra8UnormSrgb,
        ];
        assert_eq!(preferred_format(&formats), Some(wgpu::TextureFormat::Bgra8UnormSrgb));
        assert_eq!(
            preferred_format(&[wgpu::TextureFormat::Rgba16Float]),
            Some(wgpu::TextureFormat::Rgba16Float)
        );
        assert_eq!(preferred_format(&[]), None);
    }

    #[test]
    fn test_present_mode_selection() {
        let modes = [wgpu::PresentMode::Fifo, wgpu::PresentMode::Immediate];
        assert_eq!(select_present_mode(&modes, true), wgpu::PresentMode::Fifo);
        assert_eq!(select_present_mode(&modes, false), wgpu::PresentMode::Immediate);
        assert_eq!(
            select_present_mode(&[wgpu::PresentMode::Fifo], false),
            wgpu::PresentMode::Fifo
        );
    }
}
