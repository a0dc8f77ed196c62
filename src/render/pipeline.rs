//! 管线创建
//!
//! 计算管线（模拟）与图形管线（点渲染）共享同一个粒子缓冲区。
//! 两条管线都会尝试加载磁盘上的编译缓存作为提示，创建后尽力写回。

use crate::core::error::{RenderError, RenderResult};
use crate::simulation::{ParameterTransport, Particle, SimulationParams};

use super::context::GpuContext;
use super::pipeline_cache::PipelineCacheStore;
use super::shaders::ENTRY_POINT;
use super::targets::RenderPassLayout;

/// 图形管线缓存文件名
pub const GRAPHICS_CACHE: &str = "graphics";
/// 计算管线缓存文件名
pub const COMPUTE_CACHE: &str = "compute";

/// 管线构建器
pub struct PipelineBuilder;

impl PipelineBuilder {
    /// 计算管线的绑定布局：binding 0 为粒子存储缓冲区，
    /// uniform 方式下 binding 1 为参数缓冲区
    pub fn compute_bind_group_layout(
        device: &wgpu::Device,
        transport: ParameterTransport,
    ) -> wgpu::BindGroupLayout {
        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: false },
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<Particle>() as u64),
            },
            count: None,
        }];

        if transport == ParameterTransport::UniformBuffer {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(SimulationParams::SIZE),
                },
                count: None,
            });
        }

        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Compute Bind Group Layout"),
            entries: &entries,
        })
    }

    /// push constant 范围（仅 push constant 方式）
    pub fn push_constant_ranges(transport: ParameterTransport) -> Vec<wgpu::PushConstantRange> {
        match transport {
            ParameterTransport::PushConstant => vec![wgpu::PushConstantRange {
                stages: wgpu::ShaderStages::COMPUTE,
                range: 0..SimulationParams::SIZE as u32,
            }],
            ParameterTransport::UniformBuffer => Vec::new(),
        }
    }

    pub fn compute_pipeline_layout(
        device: &wgpu::Device,
        bind_group_layout: &wgpu::BindGroupLayout,
        transport: ParameterTransport,
    ) -> wgpu::PipelineLayout {
        device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Compute Pipeline Layout"),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &Self::push_constant_ranges(transport),
        })
    }

    /// 图形管线不绑定任何资源，粒子作为唯一顶点缓冲区输入
    pub fn graphics_pipeline_layout(device: &wgpu::Device) -> wgpu::PipelineLayout {
        device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Graphics Pipeline Layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        })
    }

    /// 直通 alpha 混合：颜色 `src*srcAlpha + dst*(1-srcAlpha)`，alpha 保持目标值
    pub fn blend_state() -> wgpu::BlendState {
        wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Zero,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        }
    }

    pub fn primitive_state() -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::PointList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        }
    }

    /// 创建图形管线
    ///
    /// 视口与裁剪矩形在录制时设置；`render_pass` 必须是当前的布局。
    pub fn create_graphics_pipeline(
        gpu: &GpuContext,
        cache_store: &PipelineCacheStore,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
        layout: &wgpu::PipelineLayout,
        render_pass: RenderPassLayout,
    ) -> RenderResult<wgpu::RenderPipeline> {
        let cache = cache_store.open(gpu, GRAPHICS_CACHE);

        let pipeline = gpu
            .scoped(|| {
                gpu.device
                    .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                        label: Some("Particle Render Pipeline"),
                        layout: Some(layout),
                        vertex: wgpu::VertexState {
                            module: vertex,
                            entry_point: ENTRY_POINT,
                            buffers: &[Particle::vertex_buffer_layout()],
                            compilation_options: wgpu::PipelineCompilationOptions::default(),
                        },
                        fragment: Some(wgpu::FragmentState {
                            module: fragment,
                            entry_point: ENTRY_POINT,
                            targets: &[Some(wgpu::ColorTargetState {
                                format: render_pass.format,
                                blend: Some(Self::blend_state()),
                                write_mask: wgpu::ColorWrites::ALL,
                            })],
                            compilation_options: wgpu::PipelineCompilationOptions::default(),
                        }),
                        primitive: Self::primitive_state(),
                        depth_stencil: None,
                        multisample: wgpu::MultisampleState {
                            count: render_pass.samples.count(),
                            mask: !0,
                            alpha_to_coverage_enabled: false,
                        },
                        multiview: None,
                        cache: cache.as_ref().map(|c| &c.cache),
                    })
            })
            .map_err(|reason| RenderError::PipelineCreation {
                name: GRAPHICS_CACHE.to_string(),
                reason,
            })?;

        if let Some(cache) = &cache {
            cache_store.persist(cache);
        }

        tracing::info!(
            target: "render",
            "Created graphics pipeline ({:?}, {}x MSAA)",
            render_pass.format,
            render_pass.samples.count()
        );
        Ok(pipeline)
    }

    /// 创建计算管线，工作组大小在着色器中固定
    pub fn create_compute_pipeline(
        gpu: &GpuContext,
        cache_store: &PipelineCacheStore,
        module: &wgpu::ShaderModule,
        layout: &wgpu::PipelineLayout,
    ) -> RenderResult<wgpu::ComputePipeline> {
        let cache = cache_store.open(gpu, COMPUTE_CACHE);

        let pipeline = gpu
            .scoped(|| {
                gpu.device
                    .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                        label: Some("Particle Compute Pipeline"),
                        layout: Some(layout),
                        module,
                        entry_point: ENTRY_POINT,
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                        cache: cache.as_ref().map(|c| &c.cache),
                    })
            })
            .map_err(|reason| RenderError::PipelineCreation {
                name: COMPUTE_CACHE.to_string(),
                reason,
            })?;

        if let Some(cache) = &cache {
            cache_store.persist(cache);
        }

        tracing::info!(target: "render", "Created compute pipeline");
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_keeps_destination_alpha() {
        let blend = PipelineBuilder::blend_state();
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        assert_eq!(blend.alpha.src_factor, wgpu::BlendFactor::Zero);
        assert_eq!(blend.alpha.dst_factor, wgpu::BlendFactor::One);
    }

    #[test]
    fn test_points_without_culling() {
        let primitive = PipelineBuilder::primitive_state();
        assert_eq!(primitive.topology, wgpu::PrimitiveTopology::PointList);
        assert_eq!(primitive.cull_mode, None);
    }

    #[test]
    fn test_push_constant_range_matches_params() {
        let ranges = PipelineBuilder::push_constant_ranges(ParameterTransport::PushConstant);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].range, 0..16);
        assert!(PipelineBuilder::push_constant_ranges(ParameterTransport::UniformBuffer).is_empty());
    }
}
