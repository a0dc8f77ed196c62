//! 粒子数据布局与初始分布

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rand::Rng;

/// GPU 粒子
///
/// 同一块缓冲区既作为计算着色器的 storage buffer，也作为顶点缓冲区，
/// 因此布局必须与 WGSL 中的 `Particle` 以及顶点属性完全一致。
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Particle {
    // not using glam to keep the WGSL layout obvious
    pub pos: [f32; 2],
    pub vel: [f32; 2],
}

/// 单个粒子的字节跨度
pub const PARTICLE_STRIDE: wgpu::BufferAddress = std::mem::size_of::<Particle>() as u64;

impl Particle {
    pub fn position(&self) -> Vec2 {
        Vec2::from(self.pos)
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::from(self.vel)
    }

    /// 顶点缓冲区布局：position vec2 @0，velocity vec2 @8，步长 16 字节
    pub fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
        ];

        wgpu::VertexBufferLayout {
            array_stride: PARTICLE_STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// 在边长为 `2 * extent` 的正方形内均匀生成粒子，初速度为零
pub fn spawn_particles<R: Rng + ?Sized>(count: u32, extent: f32, rng: &mut R) -> Vec<Particle> {
    (0..count)
        .map(|_| Particle {
            pos: [rng.gen_range(-extent..=extent), rng.gen_range(-extent..=extent)],
            vel: [0.0, 0.0],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_particle_layout_matches_vertex_stride() {
        assert_eq!(PARTICLE_STRIDE, 16);
        let layout = Particle::vertex_buffer_layout();
        assert_eq!(layout.array_stride, 16);
        assert_eq!(layout.attributes[0].offset, 0);
        assert_eq!(layout.attributes[1].offset, 8);
        assert_eq!(layout.attributes[1].shader_location, 1);
    }

    #[test]
    fn test_spawn_count() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(spawn_particles(1024, 0.85, &mut rng).len(), 1024);
        assert!(spawn_particles(0, 0.85, &mut rng).is_empty());
    }

    proptest! {
        #[test]
        fn test_spawned_particles_are_bounded_and_at_rest(
            seed in any::<u64>(),
            count in 1u32..2048,
            extent in 0.01f32..=1.0,
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let particles = spawn_particles(count, extent, &mut rng);

            prop_assert_eq!(particles.len(), count as usize);
            for p in &particles {
                prop_assert!(p.pos[0].abs() <= extent);
                prop_assert!(p.pos[1].abs() <= extent);
                prop_assert_eq!(p.vel, [0.0, 0.0]);
            }
        }
    }
}
