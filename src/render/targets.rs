//! 渲染通道与多重采样目标管理
//!
//! 渲染通道布局、多重采样中间目标和图形管线必须始终与当前的
//! `(格式, 采样数)` 保持一致。本模块把重建决策做成纯数据（[`RebuildPlan`]），
//! 由 [`TargetState`] 记录已经提交的结果，GPU 对象的实际创建交给调用方。
//!
//! 重建顺序：多重采样目标 → 渲染通道布局 → 图形管线 → 每帧视图。
//!
//! ## 通道依赖
//!
//! wgpu 在计算通道与渲染通道之间自动跟踪缓冲区用途：
//! 计算着色器的存储写入在后续渲染通道读取顶点之前完成可见。
//! 颜色附件的外部依赖同样由 wgpu 生成，这里只描述附件本身。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::error::{RenderError, RenderResult};
use crate::render::context::GpuContext;

use super::swapchain::{Invalidation, SwapchainDesc};

/// 清屏颜色（不透明黑色）
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

/// 多重采样数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SampleCount {
    #[default]
    X1,
    X2,
    X4,
    X8,
}

impl SampleCount {
    pub const ALL: [SampleCount; 4] = [
        SampleCount::X1,
        SampleCount::X2,
        SampleCount::X4,
        SampleCount::X8,
    ];

    pub fn count(self) -> u32 {
        match self {
            SampleCount::X1 => 1,
            SampleCount::X2 => 2,
            SampleCount::X4 => 4,
            SampleCount::X8 => 8,
        }
    }

    /// 是否需要多重采样中间目标
    pub fn is_multisampled(self) -> bool {
        self != SampleCount::X1
    }
}

/// 不支持的采样数
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Unsupported sample count {0}, expected 1, 2, 4 or 8")]
pub struct InvalidSampleCount(pub u32);

impl TryFrom<u32> for SampleCount {
    type Error = InvalidSampleCount;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SampleCount::X1),
            2 => Ok(SampleCount::X2),
            4 => Ok(SampleCount::X4),
            8 => Ok(SampleCount::X8),
            other => Err(InvalidSampleCount(other)),
        }
    }
}

impl From<SampleCount> for u32 {
    fn from(samples: SampleCount) -> u32 {
        samples.count()
    }
}

/// 附件角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentRole {
    /// 多重采样中间目标
    Multisample,
    /// 交换链图像（无 MSAA 时直接渲染，有 MSAA 时作为解析目标）
    Swapchain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadAction {
    Clear,
    DontCare,
}

impl LoadAction {
    /// wgpu 没有 don't-care 加载，用 `Load` 代替
    pub fn load_op(self) -> wgpu::LoadOp<wgpu::Color> {
        match self {
            LoadAction::Clear => wgpu::LoadOp::Clear(CLEAR_COLOR),
            LoadAction::DontCare => wgpu::LoadOp::Load,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    Store,
    DontCare,
}

impl StoreAction {
    pub fn store_op(self) -> wgpu::StoreOp {
        match self {
            StoreAction::Store => wgpu::StoreOp::Store,
            StoreAction::DontCare => wgpu::StoreOp::Discard,
        }
    }
}

/// 单个附件的描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentDesc {
    pub role: AttachmentRole,
    pub samples: SampleCount,
    pub load: LoadAction,
    pub store: StoreAction,
}

/// 渲染通道布局
///
/// 图形管线按此布局编译，因此格式或采样数变化时两者一起重建。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPassLayout {
    pub format: wgpu::TextureFormat,
    pub samples: SampleCount,
}

impl RenderPassLayout {
    pub fn new(format: wgpu::TextureFormat, samples: SampleCount) -> Self {
        Self { format, samples }
    }

    pub fn for_desc(desc: &SwapchainDesc) -> Self {
        Self::new(desc.format, desc.sample_count)
    }

    /// 附件列表
    ///
    /// - 无 MSAA：交换链图像，clear/store
    /// - MSAA：多重采样目标 clear/discard，交换链图像作为解析目标接收结果
    pub fn attachments(&self) -> Vec<AttachmentDesc> {
        if !self.samples.is_multisampled() {
            return vec![AttachmentDesc {
                role: AttachmentRole::Swapchain,
                samples: SampleCount::X1,
                load: LoadAction::Clear,
                store: StoreAction::Store,
            }];
        }

        vec![
            AttachmentDesc {
                role: AttachmentRole::Multisample,
                samples: self.samples,
                load: LoadAction::Clear,
                store: StoreAction::DontCare,
            },
            AttachmentDesc {
                role: AttachmentRole::Swapchain,
                samples: SampleCount::X1,
                load: LoadAction::DontCare,
                store: StoreAction::Store,
            },
        ]
    }

    /// 生成本帧的颜色附件
    ///
    /// 渲染附件取 `attachments()` 的第一项；MSAA 时交换链图像作为解析目标，
    /// wgpu 中解析目标没有独立的 load/store。
    pub fn color_attachment<'a>(
        &self,
        frame: &'a wgpu::TextureView,
        multisample: Option<&'a MultisampleTarget>,
    ) -> RenderResult<wgpu::RenderPassColorAttachment<'a>> {
        let attachments = self.attachments();
        let rendered = attachments[0];

        let (view, resolve_target) = match rendered.role {
            AttachmentRole::Swapchain => (frame, None),
            AttachmentRole::Multisample => {
                let target = multisample.ok_or_else(|| {
                    RenderError::InvalidState(format!(
                        "render pass expects a {}x multisample target but none exists",
                        self.samples.count()
                    ))
                })?;
                if target.samples() != rendered.samples || target.format() != self.format {
                    return Err(RenderError::InvalidState(
                        "multisample target does not match the render pass layout".to_string(),
                    ));
                }
                (target.view(), Some(frame))
            }
        };

        Ok(wgpu::RenderPassColorAttachment {
            view,
            resolve_target,
            ops: wgpu::Operations {
                load: rendered.load.load_op(),
                store: rendered.store.store_op(),
            },
        })
    }
}

/// 多重采样中间目标
pub struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    extent: (u32, u32),
    samples: SampleCount,
    format: wgpu::TextureFormat,
}

impl MultisampleTarget {
    pub fn new(gpu: &GpuContext, desc: &SwapchainDesc) -> RenderResult<Self> {
        let (width, height) = desc.extent;
        let texture = gpu
            .scoped(|| {
                gpu.device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("Multisample Target"),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: desc.sample_count.count(),
                    dimension: wgpu::TextureDimension::D2,
                    format: desc.format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
            })
            .map_err(|reason| {
                RenderError::InvalidState(format!("failed to create multisample target: {}", reason))
            })?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        tracing::debug!(
            target: "render",
            "Created {}x multisample target ({}x{})",
            desc.sample_count.count(),
            width,
            height
        );

        Ok(Self {
            _texture: texture,
            view,
            extent: desc.extent,
            samples: desc.sample_count,
            format: desc.format,
        })
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn extent(&self) -> (u32, u32) {
        self.extent
    }

    pub fn samples(&self) -> SampleCount {
        self.samples
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

/// 多重采样目标的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultisampleAction {
    Keep,
    /// 创建或替换
    Create,
    Destroy,
}

/// 一次重建需要执行的步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildPlan {
    pub multisample: MultisampleAction,
    pub render_pass: bool,
    pub pipeline: bool,
}

impl RebuildPlan {
    /// 根据已提交状态、目标描述和待处理失效计算重建步骤
    pub fn plan(state: &TargetState, desc: &SwapchainDesc, invalidation: Invalidation) -> Self {
        let wanted_target = desc
            .sample_count
            .is_multisampled()
            .then_some((desc.extent, desc.sample_count, desc.format));

        let multisample = match (wanted_target, state.multisample) {
            (None, None) => MultisampleAction::Keep,
            (None, Some(_)) => MultisampleAction::Destroy,
            (Some(wanted), Some(current)) if wanted == current && !invalidation.targets => {
                MultisampleAction::Keep
            }
            (Some(_), _) => MultisampleAction::Create,
        };

        let layout = RenderPassLayout::for_desc(desc);
        let render_pass = invalidation.render_pass || state.render_pass != Some(layout);
        // 管线必须针对最新的渲染通道布局编译
        let pipeline = render_pass || invalidation.pipeline || state.pipeline != Some(layout);

        Self {
            multisample,
            render_pass,
            pipeline,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.multisample == MultisampleAction::Keep && !self.render_pass && !self.pipeline
    }
}

/// 已提交的目标状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetState {
    multisample: Option<((u32, u32), SampleCount, wgpu::TextureFormat)>,
    render_pass: Option<RenderPassLayout>,
    pipeline: Option<RenderPassLayout>,
}

impl TargetState {
    /// 记录执行完毕的重建计划
    pub fn commit(&mut self, desc: &SwapchainDesc, plan: &RebuildPlan) {
        match plan.multisample {
            MultisampleAction::Keep => {}
            MultisampleAction::Create => {
                self.multisample = Some((desc.extent, desc.sample_count, desc.format));
            }
            MultisampleAction::Destroy => self.multisample = None,
        }

        let layout = RenderPassLayout::for_desc(desc);
        if plan.render_pass {
            self.render_pass = Some(layout);
        }
        if plan.pipeline {
            self.pipeline = Some(layout);
        }
    }

    pub fn has_multisample_target(&self) -> bool {
        self.multisample.is_some()
    }

    pub fn render_pass(&self) -> Option<RenderPassLayout> {
        self.render_pass
    }

    /// 渲染通道、管线与多重采样目标是否都与描述一致
    pub fn is_consistent_with(&self, desc: &SwapchainDesc) -> bool {
        let layout = RenderPassLayout::for_desc(desc);
        let target_ok = match self.multisample {
            Some(target) => {
                desc.sample_count.is_multisampled()
                    && target == (desc.extent, desc.sample_count, desc.format)
            }
            None => !desc.sample_count.is_multisampled(),
        };
        target_ok && self.render_pass == Some(layout) && self.pipeline == Some(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

    fn settle(state: &mut TargetState, desc: &SwapchainDesc, invalidation: Invalidation) -> RebuildPlan {
        let plan = RebuildPlan::plan(state, desc, invalidation);
        state.commit(desc, &plan);
        plan
    }

    #[test]
    fn test_sample_count_conversion() {
        for samples in SampleCount::ALL {
            assert_eq!(SampleCount::try_from(samples.count()), Ok(samples));
        }
        assert_eq!(SampleCount::try_from(3), Err(InvalidSampleCount(3)));
        assert_eq!(u32::from(SampleCount::X8), 8);
    }

    #[test]
    fn test_attachments_without_msaa() {
        let layout = RenderPassLayout::new(FORMAT, SampleCount::X1);
        let attachments = layout.attachments();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].role, AttachmentRole::Swapchain);
        assert_eq!(attachments[0].load, LoadAction::Clear);
        assert_eq!(attachments[0].store, StoreAction::Store);
    }

    #[test]
    fn test_attachments_with_msaa_resolve_into_swapchain() {
        let layout = RenderPassLayout::new(FORMAT, SampleCount::X4);
        let attachments = layout.attachments();
        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].role, AttachmentRole::Multisample);
        assert_eq!(attachments[0].samples, SampleCount::X4);
        assert_eq!(attachments[0].store, StoreAction::DontCare);
        assert_eq!(attachments[1].role, AttachmentRole::Swapchain);
        assert_eq!(attachments[1].load, LoadAction::DontCare);
        assert_eq!(attachments[1].store, StoreAction::Store);
    }

    #[test]
    fn test_attachment_actions_map_to_wgpu_ops() {
        assert!(matches!(
            LoadAction::Clear.load_op(),
            wgpu::LoadOp::Clear(color) if color == CLEAR_COLOR
        ));
        assert!(matches!(LoadAction::DontCare.load_op(), wgpu::LoadOp::Load));
        assert_eq!(StoreAction::Store.store_op(), wgpu::StoreOp::Store);
        assert_eq!(StoreAction::DontCare.store_op(), wgpu::StoreOp::Discard);
    }

    #[test]
    fn test_initial_plan_builds_everything() {
        let desc = SwapchainDesc::new(FORMAT, (800, 600), SampleCount::X4);
        let plan = RebuildPlan::plan(&TargetState::default(), &desc, Invalidation::all());
        assert_eq!(plan.multisample, MultisampleAction::Create);
        assert!(plan.render_pass && plan.pipeline);
    }

    #[test]
    fn test_resize_only_recreates_multisample_target() {
        let mut desc = SwapchainDesc::new(FORMAT, (800, 600), SampleCount::X4);
        let mut state = TargetState::default();
        settle(&mut state, &desc, Invalidation::all());

        let invalidation = desc.resize(1024, 768);
        let plan = settle(&mut state, &desc, invalidation);

        assert_eq!(plan.multisample, MultisampleAction::Create);
        assert!(!plan.render_pass);
        assert!(!plan.pipeline);
        assert!(state.is_consistent_with(&desc));
    }

    #[test]
    fn test_resize_without_msaa_keeps_pipeline() {
        let mut desc = SwapchainDesc::new(FORMAT, (800, 600), SampleCount::X1);
        let mut state = TargetState::default();
        settle(&mut state, &desc, Invalidation::all());

        let invalidation = desc.resize(640, 480);
        let plan = settle(&mut state, &desc, invalidation);
        assert!(plan.is_empty());
        assert!(state.is_consistent_with(&desc));
    }

    #[test]
    fn test_toggle_to_single_sample_destroys_target() {
        let mut desc = SwapchainDesc::new(FORMAT, (800, 600), SampleCount::X8);
        let mut state = TargetState::default();
        settle(&mut state, &desc, Invalidation::all());
        assert!(state.has_multisample_target());

        let invalidation = desc.set_sample_count(SampleCount::X1);
        let plan = settle(&mut state, &desc, invalidation);

        assert_eq!(plan.multisample, MultisampleAction::Destroy);
        assert!(plan.render_pass && plan.pipeline);
        assert!(!state.has_multisample_target());
        assert!(state.is_consistent_with(&desc));
    }

    #[test]
    fn test_stale_state_is_inconsistent() {
        let mut desc = SwapchainDesc::new(FORMAT, (800, 600), SampleCount::X1);
        let mut state = TargetState::default();
        settle(&mut state, &desc, Invalidation::all());

        desc.set_sample_count(SampleCount::X2);
        assert!(!state.is_consistent_with(&desc));
    }

    #[derive(Debug, Clone)]
    enum Change {
        Samples(SampleCount),
        Resize(u32, u32),
        Format(bool),
    }

    fn change() -> impl Strategy<Value = Change> {
        prop_oneof![
            prop::sample::select(SampleCount::ALL.to_vec()).prop_map(Change::Samples),
            (1u32..4096, 1u32..4096).prop_map(|(w, h)| Change::Resize(w, h)),
            any::<bool>().prop_map(Change::Format),
        ]
    }

    proptest! {
        #[test]
        fn test_targets_stay_consistent(changes in prop::collection::vec(change(), 1..40)) {
            let mut desc = SwapchainDesc::new(FORMAT, (800, 600), SampleCount::X1);
            let mut state = TargetState::default();
            settle(&mut state, &desc, Invalidation::all());

            for change in changes {
                let invalidation = match change {
                    Change::Samples(samples) => desc.set_sample_count(samples),
                    Change::Resize(w, h) => desc.resize(w, h),
                    Change::Format(srgb) => desc.set_format(if srgb {
                        wgpu::TextureFormat::Bgra8UnormSrgb
                    } else {
                        wgpu::TextureFormat::Rgba8Unorm
                    }),
                };
                settle(&mut state, &desc, invalidation);

                prop_assert!(state.is_consistent_with(&desc));
                prop_assert_eq!(
                    state.has_multisample_target(),
                    desc.sample_count.count() > 1
                );
                prop_assert_eq!(
                    RenderPassLayout::for_desc(&desc).attachments().len(),
                    if desc.sample_count.is_multisampled() { 2 } else { 1 }
                );
            }
        }
    }
}
