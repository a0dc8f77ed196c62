use super::{ConfigError, ConfigResult};
use crate::impl_default;
use crate::simulation::ParameterTransport;
use serde::{Deserialize, Serialize};

/// 模拟配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// 粒子数量（决定缓冲区大小与调度网格）
    ///
    /// 不是工作组大小整数倍时，尾部粒子不会被模拟。
    pub particle_count: u32,

    /// 模拟参数上传方式
    pub parameter_transport: ParameterTransport,

    /// 初始分布正方形的半边长（标准化设备坐标）
    pub spawn_extent: f32,

    /// 随机种子，未设置时使用当前时间
    pub seed: Option<u64>,

    /// 每秒输出一次帧率
    pub report_fps: bool,
}

impl_default!(SimulationConfig {
    particle_count: 750_000,
    parameter_transport: ParameterTransport::UniformBuffer,
    spawn_extent: 0.85,
    seed: None,
    report_fps: true,
});

impl SimulationConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.particle_count == 0 {
            return Err(ConfigError::ValidationError(
                "particle_count must be greater than zero".to_string(),
            ));
        }
        if !(self.spawn_extent > 0.0 && self.spawn_extent <= 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "spawn_extent must lie in (0, 1], got {}",
                self.spawn_extent
            )));
        }
        Ok(())
    }

    /// 解析随机种子
    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default()
        })
    }
}
