//! 计算调度与 CPU 参考内核
//!
//! `particles.comp.wgsl` 中的积分规则在这里有一份逐行对应的 CPU 实现，
//! 供测试和基准测试验证调度覆盖率与力的方向。修改任意一侧时必须同步另一侧。

use glam::Vec2;

use super::params::SimulationParams;
use super::particle::Particle;

/// 计算着色器的工作组大小（与 `@workgroup_size(16)` 一致）
pub const WORKGROUP_SIZE: u32 = 16;

/// 吸引力系数
pub const ATTRACTION: f32 = 0.1;
/// 距离下限，避免在吸引点附近发散
pub const MIN_DISTANCE: f32 = 0.05;
/// 速度衰减率（每秒）
pub const FRICTION: f32 = 0.5;

/// 一维调度的工作组数量
///
/// 粒子数不是 [`WORKGROUP_SIZE`] 的整数倍时，最后不足一组的粒子不会被模拟。
pub fn dispatch_group_count(particle_count: u32) -> u32 {
    particle_count / WORKGROUP_SIZE
}

/// 不会被模拟的尾部粒子数
pub fn unsimulated_particles(particle_count: u32) -> u32 {
    particle_count % WORKGROUP_SIZE
}

/// 调度网格覆盖的全局调用索引，顺序与 `global_invocation_id.x` 相同
pub fn invocation_indices(particle_count: u32) -> impl Iterator<Item = u32> {
    (0..dispatch_group_count(particle_count))
        .flat_map(|group| (0..WORKGROUP_SIZE).map(move |local| group * WORKGROUP_SIZE + local))
}

/// 单个粒子的积分步
pub fn step_particle(particle: &mut Particle, params: &SimulationParams) {
    let dt = params.delta_time;
    let pos = particle.position();

    let to_attractor = params.attraction_position() - pos;
    let distance = to_attractor.length().max(MIN_DISTANCE);
    let accel: Vec2 =
        params.attraction_strength * ATTRACTION * to_attractor / (distance * distance * distance);

    let vel = particle.velocity() * (-FRICTION * dt).exp() + accel * dt;
    particle.pos = (pos + vel * dt).to_array();
    particle.vel = vel.to_array();
}

/// 按 GPU 的调度网格推进一帧
pub fn simulate(particles: &mut [Particle], params: &SimulationParams) {
    for index in invocation_indices(particles.len() as u32) {
        step_particle(&mut particles[index as usize], params);
    }
}
