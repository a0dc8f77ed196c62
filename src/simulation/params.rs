//! 每帧模拟参数

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// 计算着色器读取的参数块（16 字节，可作为 push constant 或 uniform）
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SimulationParams {
    pub delta_time: f32,
    pub attraction_strength: f32,
    /// 吸引点（标准化设备坐标）
    pub attraction_position: [f32; 2],
}

impl SimulationParams {
    pub const SIZE: wgpu::BufferAddress = std::mem::size_of::<SimulationParams>() as u64;

    pub fn new(delta_time: f32, attraction_strength: f32, attraction_position: Vec2) -> Self {
        Self {
            delta_time,
            attraction_strength,
            attraction_position: attraction_position.to_array(),
        }
    }

    pub fn attraction_position(&self) -> Vec2 {
        Vec2::from(self.attraction_position)
    }
}

/// 参数上传方式
///
/// 两种方式在功能上等价；push constant 省去一个描述符绑定，
/// 但需要适配器支持 `Features::PUSH_CONSTANTS`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterTransport {
    PushConstant,
    #[default]
    UniformBuffer,
}

/// 像素坐标转换为标准化设备坐标
pub fn normalize_position(pixel: Vec2, width: u32, height: u32) -> Vec2 {
    if width == 0 || height == 0 {
        return Vec2::ZERO;
    }
    Vec2::new(
        2.0 * (pixel.x / width as f32) - 1.0,
        2.0 * (pixel.y / height as f32) - 1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_size_fits_push_constant_block() {
        assert_eq!(SimulationParams::SIZE, 16);
    }

    #[test]
    fn test_normalize_position() {
        assert_eq!(normalize_position(Vec2::new(400.0, 250.0), 800, 500), Vec2::ZERO);
        assert_eq!(
            normalize_position(Vec2::new(600.0, 375.0), 800, 500),
            Vec2::new(0.5, 0.5)
        );
        assert_eq!(
            normalize_position(Vec2::new(0.0, 500.0), 800, 500),
            Vec2::new(-1.0, 1.0)
        );
        assert_eq!(normalize_position(Vec2::new(10.0, 10.0), 0, 500), Vec2::ZERO);
    }

    #[test]
    fn test_transport_serde_names() {
        let t: ParameterTransport = serde_json::from_str("\"push_constant\"").unwrap();
        assert_eq!(t, ParameterTransport::PushConstant);
        assert_eq!(
            serde_json::to_string(&ParameterTransport::UniformBuffer).unwrap(),
            "\"uniform_buffer\""
        );
    }
}
