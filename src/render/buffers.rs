//! 粒子缓冲区
//!
//! 进程内只有一个粒子缓冲区，创建后大小不变。它同时作为顶点缓冲区和存储缓冲区，
//! 初始上传之后只由计算着色器写入，CPU 端不保留副本。

use wgpu::util::DeviceExt;

use crate::simulation::{ParameterTransport, Particle, SimulationParams};

/// 粒子与参数缓冲区
pub struct ParticleBufferStore {
    particles: wgpu::Buffer,
    count: u32,
    /// 仅在 uniform 上传方式下存在
    params: Option<wgpu::Buffer>,
}

impl ParticleBufferStore {
    pub fn new(device: &wgpu::Device, particles: &[Particle], transport: ParameterTransport) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Buffer"),
            contents: bytemuck::cast_slice(particles),
            usage: wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
        });

        let params = (transport == ParameterTransport::UniformBuffer).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Simulation Params"),
                contents: bytemuck::bytes_of(&SimulationParams::default()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        });

        tracing::info!(
            target: "render",
            "Uploaded {} particles ({} KiB)",
            particles.len(),
            buffer.size() / 1024
        );

        Self {
            particles: buffer,
            count: particles.len() as u32,
            params,
        }
    }

    pub fn particles(&self) -> &wgpu::Buffer {
        &self.particles
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn params(&self) -> Option<&wgpu::Buffer> {
        self.params.as_ref()
    }

    /// 写入本帧参数；push constant 方式下没有参数缓冲区，直接忽略
    pub fn write_params(&self, queue: &wgpu::Queue, params: &SimulationParams) {
        if let Some(buffer) = &self.params {
            queue.write_buffer(buffer, 0, bytemuck::bytes_of(params));
        }
    }
}
