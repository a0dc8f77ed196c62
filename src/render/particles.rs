//! 粒子渲染器
//!
//! 每帧的命令序列：
//! 1. 写入模拟参数（uniform 缓冲区写入，或在计算通道内设置 push constant）
//! 2. 绑定计算管线，一维调度 `particle_count / 16` 个工作组
//! 3. 计算通道结束；wgpu 在下一个通道读取顶点之前插入存储写入到顶点读取的屏障
//! 4. 渲染通道：清为不透明黑色，视口与裁剪设为当前尺寸，绘制 `particle_count` 个点

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{GraphicsConfig, SimulationConfig};
use crate::core::error::{RenderError, RenderResult};
use crate::simulation::{
    dispatch_group_count, spawn_particles, unsimulated_particles, ParameterTransport,
    SimulationParams, WORKGROUP_SIZE,
};

use super::buffers::ParticleBufferStore;
use super::context::GpuContext;
use super::frame::FrameRecorder;
use super::pipeline::PipelineBuilder;
use super::pipeline_cache::PipelineCacheStore;
use super::shaders::ShaderSet;
use super::swapchain::{Invalidation, SwapchainDesc};
use super::targets::{
    MultisampleAction, MultisampleTarget, RebuildPlan, RenderPassLayout, TargetState,
};

/// 参数上传方式：设备不支持 push constant 时退回 uniform 缓冲区
pub fn resolve_transport(requested: ParameterTransport, push_supported: bool) -> ParameterTransport {
    if requested == ParameterTransport::PushConstant && !push_supported {
        tracing::warn!(
            target: "render",
            "Push constants are not supported by this device, using a uniform buffer"
        );
        return ParameterTransport::UniformBuffer;
    }
    requested
}

/// 检查调度网格；尾部粒子不会被模拟，只记录警告
pub fn checked_group_count(particle_count: u32, limit: u32) -> RenderResult<u32> {
    let remainder = unsimulated_particles(particle_count);
    if remainder > 0 {
        tracing::warn!(
            target: "render",
            "Particle count {} is not a multiple of {}; {} particles will not be simulated",
            particle_count,
            WORKGROUP_SIZE,
            remainder
        );
    }

    let groups = dispatch_group_count(particle_count);
    if groups > limit {
        return Err(RenderError::DispatchLimit { groups, limit });
    }
    Ok(groups)
}

/// 粒子模拟与渲染
pub struct ParticleRenderer {
    buffers: ParticleBufferStore,
    transport: ParameterTransport,
    group_count: u32,
    params: SimulationParams,

    compute_pipeline: wgpu::ComputePipeline,
    compute_bind_group: wgpu::BindGroup,

    vertex_shader: wgpu::ShaderModule,
    fragment_shader: wgpu::ShaderModule,
    graphics_layout: wgpu::PipelineLayout,
    render_pipeline: Option<wgpu::RenderPipeline>,
    multisample: Option<MultisampleTarget>,
    targets: TargetState,

    cache: PipelineCacheStore,
}

impl ParticleRenderer {
    /// 上传粒子并创建计算管线；图形管线在 `prepare_targets` 中按交换链描述创建
    pub fn new(
        gpu: &GpuContext,
        graphics: &GraphicsConfig,
        simulation: &SimulationConfig,
    ) -> RenderResult<Self> {
        let transport = resolve_transport(
            simulation.parameter_transport,
            gpu.supports_push_constants(),
        );
        let group_count = checked_group_count(
            simulation.particle_count,
            gpu.limits().max_compute_workgroups_per_dimension,
        )?;

        let mut rng = StdRng::seed_from_u64(simulation.resolved_seed());
        let particles = spawn_particles(simulation.particle_count, simulation.spawn_extent, &mut rng);
        let buffers = ParticleBufferStore::new(&gpu.device, &particles, transport);
        drop(particles);

        let shaders = ShaderSet::load(graphics.shader_directory.as_deref(), transport)?;
        let vertex_shader = shaders.vertex.create_module(gpu)?;
        let fragment_shader = shaders.fragment.create_module(gpu)?;
        let compute_shader = shaders.compute.create_module(gpu)?;

        let cache = PipelineCacheStore::new(graphics.pipeline_cache.resolved_directory());

        let bind_group_layout = PipelineBuilder::compute_bind_group_layout(&gpu.device, transport);
        let compute_layout =
            PipelineBuilder::compute_pipeline_layout(&gpu.device, &bind_group_layout, transport);
        let compute_pipeline =
            PipelineBuilder::create_compute_pipeline(gpu, &cache, &compute_shader, &compute_layout)?;

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: buffers.particles().as_entire_binding(),
        }];
        if let Some(params) = buffers.params() {
            entries.push(wgpu::BindGroupEntry {
                binding: 1,
                resource: params.as_entire_binding(),
            });
        }
        let compute_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Compute Bind Group"),
            layout: &bind_group_layout,
            entries: &entries,
        });

        let graphics_layout = PipelineBuilder::graphics_pipeline_layout(&gpu.device);

        tracing::info!(
            target: "render",
            "Particle renderer ready: {} particles, {} workgroups, {:?}",
            buffers.count(),
            group_count,
            transport
        );

        Ok(Self {
            buffers,
            transport,
            group_count,
            params: SimulationParams::default(),
            compute_pipeline,
            compute_bind_group,
            vertex_shader,
            fragment_shader,
            graphics_layout,
            render_pipeline: None,
            multisample: None,
            targets: TargetState::default(),
            cache,
        })
    }

    /// 设置下一帧使用的模拟参数
    pub fn set_params(&mut self, params: SimulationParams) {
        self.params = params;
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn transport(&self) -> ParameterTransport {
        self.transport
    }

    pub fn particle_count(&self) -> u32 {
        self.buffers.count()
    }

    pub fn group_count(&self) -> u32 {
        self.group_count
    }

    pub fn buffers(&self) -> &ParticleBufferStore {
        &self.buffers
    }

    pub fn targets(&self) -> &TargetState {
        &self.targets
    }

    pub fn has_multisample_target(&self) -> bool {
        self.multisample.is_some()
    }

    fn record_compute(&self, encoder: &mut wgpu::CommandEncoder) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Particle Simulation"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.compute_pipeline);
        pass.set_bind_group(0, &self.compute_bind_group, &[]);
        if self.transport == ParameterTransport::PushConstant {
            pass.set_push_constants(0, bytemuck::bytes_of(&self.params));
        }
        pass.dispatch_workgroups(self.group_count, 1, 1);
    }
}

impl FrameRecorder for ParticleRenderer {
    fn prepare_targets(
        &mut self,
        gpu: &GpuContext,
        desc: &SwapchainDesc,
        invalidation: Invalidation,
    ) -> RenderResult<()> {
        let plan = RebuildPlan::plan(&self.targets, desc, invalidation);
        if plan.is_empty() {
            return Ok(());
        }

        match plan.multisample {
            MultisampleAction::Keep => {}
            MultisampleAction::Create => {
                self.multisample = Some(MultisampleTarget::new(gpu, desc)?);
            }
            MultisampleAction::Destroy => self.multisample = None,
        }

        if plan.pipeline {
            // 创建失败时不保留旧管线
            self.render_pipeline = None;
            let layout = RenderPassLayout::for_desc(desc);
            self.render_pipeline = Some(PipelineBuilder::create_graphics_pipeline(
                gpu,
                &self.cache,
                &self.vertex_shader,
                &self.fragment_shader,
                &self.graphics_layout,
                layout,
            )?);
        }

        self.targets.commit(desc, &plan);
        tracing::debug!(target: "render", "Rebuilt render targets: {:?}", plan);
        Ok(())
    }

    fn record(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        desc: &SwapchainDesc,
    ) -> RenderResult<()> {
        if !self.targets.is_consistent_with(desc) {
            return Err(RenderError::InvalidState(
                "render targets are stale for the current swapchain".to_string(),
            ));
        }
        let pipeline = self
            .render_pipeline
            .as_ref()
            .ok_or_else(|| RenderError::InvalidState("graphics pipeline missing".to_string()))?;
        let layout = self
            .targets
            .render_pass()
            .ok_or_else(|| RenderError::InvalidState("render pass missing".to_string()))?;

        self.buffers.write_params(&gpu.queue, &self.params);
        self.record_compute(encoder);

        let attachment = layout.color_attachment(view, self.multisample.as_ref())?;
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Particle Render Pass"),
            color_attachments: &[Some(attachment)],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let (width, height) = desc.extent;
        pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
        pass.set_scissor_rect(0, 0, width, height);
        pass.set_pipeline(pipeline);
        pass.set_vertex_buffer(0, self.buffers.particles().slice(..));
        pass.draw(0..self.buffers.count(), 0..1);

        Ok(())
    }
}
