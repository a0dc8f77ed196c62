//! 帧驱动与表面生命周期
//!
//! 状态机：`Uninitialized → Ready ⇄ SurfaceLost`。
//!
//! [`FrameDriver`] 负责获取交换链图像、提交和呈现，以及尺寸变化和表面丢失/恢复；
//! 粒子相关的逻辑通过 [`FrameRecorder`] 注入，只提供“重建目标资源”和
//! “为这一帧录制命令”两个步骤。
//!
//! wgpu 的命令缓冲区只能提交一次，因此每帧都重新录制。
//! 描述变更产生的失效先累积在 `pending` 中，在下一帧录制之前统一处理。

use crate::core::error::{RenderError, RenderResult};

use super::context::GpuContext;
use super::swapchain::{Invalidation, Swapchain, SwapchainDesc};
use super::targets::SampleCount;

/// 采用新表面的格式；新格式不支持当前采样数时退回 1x
pub fn adopt_surface_format(
    desc: &mut SwapchainDesc,
    format: wgpu::TextureFormat,
    supports: impl Fn(wgpu::TextureFormat, SampleCount) -> bool,
) -> Invalidation {
    let mut invalidation = desc.set_format(format);
    if !invalidation.any() {
        return invalidation;
    }

    tracing::info!(target: "render", "Surface format changed to {:?}", format);
    if !supports(format, desc.sample_count) {
        tracing::warn!(
            target: "render",
            "{}x MSAA is not supported for {:?}, falling back to 1x",
            desc.sample_count.count(),
            format
        );
        invalidation.merge(desc.set_sample_count(SampleCount::X1));
    }
    invalidation
}

/// 渲染器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RendererState {
    #[default]
    Uninitialized,
    Ready,
    SurfaceLost,
}

/// 持有至多一个呈现表面的状态槽
///
/// 丢失或替换表面时把旧表面交还给调用方，由调用方在设备空闲后释放。
#[derive(Debug)]
pub struct SurfaceSlot<S> {
    state: RendererState,
    surface: Option<S>,
}

impl<S> Default for SurfaceSlot<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SurfaceSlot<S> {
    pub fn new() -> Self {
        Self {
            state: RendererState::Uninitialized,
            surface: None,
        }
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    /// `Uninitialized → Ready`
    pub fn initialize(&mut self, surface: S) -> RenderResult<()> {
        if self.state != RendererState::Uninitialized {
            return Err(RenderError::InvalidState(format!(
                "cannot initialize surface in state {:?}",
                self.state
            )));
        }
        self.surface = Some(surface);
        self.state = RendererState::Ready;
        Ok(())
    }

    /// `Ready → SurfaceLost`，返回旧表面
    pub fn lose(&mut self) -> Option<S> {
        if self.state == RendererState::Ready {
            self.state = RendererState::SurfaceLost;
        }
        self.surface.take()
    }

    /// `SurfaceLost → Ready`；在 `Ready` 时调用会替换并返回当前表面
    pub fn regain(&mut self, surface: S) -> RenderResult<Option<S>> {
        if self.state == RendererState::Uninitialized {
            return Err(RenderError::InvalidState(
                "surface regained before initialization".to_string(),
            ));
        }
        self.state = RendererState::Ready;
        Ok(self.surface.replace(surface))
    }

    /// 只有 `Ready` 状态下才有可用表面
    pub fn current(&self) -> Option<&S> {
        match self.state {
            RendererState::Ready => self.surface.as_ref(),
            _ => None,
        }
    }

    pub fn current_mut(&mut self) -> Option<&mut S> {
        match self.state {
            RendererState::Ready => self.surface.as_mut(),
            _ => None,
        }
    }
}

/// 由具体渲染器实现的每帧策略
pub trait FrameRecorder {
    /// 处理失效：重建多重采样目标、渲染通道布局和图形管线
    fn prepare_targets(
        &mut self,
        gpu: &GpuContext,
        desc: &SwapchainDesc,
        invalidation: Invalidation,
    ) -> RenderResult<()>;

    /// 为这一帧录制命令，`view` 是本帧交换链图像的视图
    fn record(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        desc: &SwapchainDesc,
    ) -> RenderResult<()>;
}

/// 单帧结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Presented,
    Skipped,
}

/// 通用帧驱动
pub struct FrameDriver<R: FrameRecorder> {
    recorder: R,
    slot: SurfaceSlot<Swapchain>,
    desc: SwapchainDesc,
    pending: Invalidation,
    vsync: bool,
}

impl<R: FrameRecorder> FrameDriver<R> {
    /// 建立交换链并构建渲染器，完成后处于 `Ready`
    pub fn new<F>(
        gpu: &GpuContext,
        surface: wgpu::Surface<'static>,
        extent: (u32, u32),
        sample_count: SampleCount,
        vsync: bool,
        build: F,
    ) -> RenderResult<Self>
    where
        F: FnOnce(&GpuContext, &SwapchainDesc) -> RenderResult<R>,
    {
        let mut swapchain = Swapchain::new(gpu, surface, vsync)?;
        let format = swapchain.format();

        let sample_count = if gpu.supports_sample_count(format, sample_count) {
            sample_count
        } else {
            tracing::warn!(
                target: "render",
                "{}x MSAA is not supported for {:?}, falling back to 1x",
                sample_count.count(),
                format
            );
            SampleCount::X1
        };

        let desc = SwapchainDesc::new(format, extent, sample_count);
        let mut pending = Invalidation::all();
        let mut recorder = build(gpu, &desc)?;

        if desc.is_renderable() {
            swapchain.configure(gpu, &desc);
            recorder.prepare_targets(gpu, &desc, pending)?;
            pending = Invalidation::NONE;
        }

        let mut slot = SurfaceSlot::new();
        slot.initialize(swapchain)?;

        Ok(Self {
            recorder,
            slot,
            desc,
            pending,
            vsync,
        })
    }

    pub fn state(&self) -> RendererState {
        self.slot.state()
    }

    pub fn desc(&self) -> &SwapchainDesc {
        &self.desc
    }

    pub fn pending(&self) -> Invalidation {
        self.pending
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut R {
        &mut self.recorder
    }

    /// 录制、提交并呈现一帧
    pub fn render_frame(&mut self, gpu: &GpuContext) -> RenderResult<FrameStatus> {
        if !self.desc.is_renderable() {
            return Ok(FrameStatus::Skipped);
        }
        let Some(swapchain) = self.slot.current_mut() else {
            return Ok(FrameStatus::Skipped);
        };

        if self.pending.surface {
            swapchain.configure(gpu, &self.desc);
        }
        if self.pending.needs_rebuild() {
            self.recorder.prepare_targets(gpu, &self.desc, self.pending)?;
        }
        self.pending = Invalidation::NONE;

        let frame = match swapchain.acquire() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!(target: "render", "Timed out acquiring swapchain image");
                return Ok(FrameStatus::Skipped);
            }
            Err(wgpu::SurfaceError::Outdated) | Err(wgpu::SurfaceError::Lost) => {
                tracing::debug!(target: "render", "Swapchain out of date, reconfiguring");
                self.pending.surface = true;
                return Ok(FrameStatus::Skipped);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(RenderError::Surface("out of memory".to_string()));
            }
            #[allow(unreachable_patterns)]
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.recorder
            .record(gpu, &mut encoder, &view, &self.desc)?;
        gpu.queue.submit(Some(encoder.finish()));

        let suboptimal = frame.suboptimal;
        frame.present();
        if suboptimal {
            self.pending.surface = true;
        }

        Ok(FrameStatus::Presented)
    }

    /// 窗口尺寸变化；尺寸为零时只记录，等到非零尺寸再配置
    pub fn resize(&mut self, width: u32, height: u32) {
        let invalidation = self.desc.resize(width, height);
        if invalidation.any() {
            tracing::info!(target: "render", "Resized to {}x{}", width, height);
        }
        self.pending.merge(invalidation);
    }

    /// 切换采样数；不支持时保持当前值并返回 `false`
    pub fn set_sample_count(&mut self, gpu: &GpuContext, sample_count: SampleCount) -> bool {
        if !gpu.supports_sample_count(self.desc.format, sample_count) {
            tracing::warn!(
                target: "render",
                "{}x MSAA is not supported for {:?}, keeping {}x",
                sample_count.count(),
                self.desc.format,
                self.desc.sample_count.count()
            );
            return false;
        }

        let invalidation = self.desc.set_sample_count(sample_count);
        if invalidation.any() {
            tracing::info!(
                target: "render",
                "Changing sample count to {}",
                sample_count.count()
            );
        }
        self.pending.merge(invalidation);
        true
    }

    /// 表面被平台销毁：等待 GPU 空闲后释放交换链
    pub fn surface_destroyed(&mut self, gpu: &GpuContext) {
        if self.slot.state() != RendererState::Ready {
            return;
        }
        gpu.wait_idle();
        drop(self.slot.lose());
        tracing::info!(target: "render", "Surface destroyed");
    }

    /// 平台提供了新表面：重新查询格式，格式变化时使渲染通道和管线失效
    pub fn surface_created(
        &mut self,
        gpu: &GpuContext,
        surface: wgpu::Surface<'static>,
    ) -> RenderResult<()> {
        let swapchain = Swapchain::new(gpu, surface, self.vsync)?;
        let format = swapchain.format();

        let mut invalidation = adopt_surface_format(&mut self.desc, format, |format, samples| {
            gpu.supports_sample_count(format, samples)
        });
        invalidation.surface = true;
        self.pending.merge(invalidation);

        if let Some(previous) = self.slot.regain(swapchain)? {
            gpu.wait_idle();
            drop(previous);
        }
        tracing::info!(target: "render", "Surface created");
        Ok(())
    }
}
