use super::{ConfigError, ConfigResult};
use crate::impl_default;
use crate::render::targets::SampleCount;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 图形配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    /// 初始窗口分辨率
    pub resolution: Resolution,

    /// 多重采样数（1/2/4/8）
    pub sample_count: SampleCount,

    /// 垂直同步
    pub vsync: bool,

    /// 管线编译缓存
    pub pipeline_cache: PipelineCacheConfig,

    /// 覆盖内置着色器的目录：particles.vert / particles.frag，
    /// 计算着色器在 uniform 方式下为 particles.comp，push constant 方式下为 particles_push.comp
    pub shader_directory: Option<PathBuf>,
}

impl_default!(GraphicsConfig {
    resolution: Resolution::default(),
    sample_count: SampleCount::X1,
    vsync: true,
    pipeline_cache: PipelineCacheConfig::default(),
    shader_directory: None,
});

impl GraphicsConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(ConfigError::ValidationError(
                "Invalid resolution".to_string(),
            ));
        }
        Ok(())
    }
}

/// 分辨率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// 宽度（像素）
    pub width: u32,
    /// 高度（像素）
    pub height: u32,
}

impl_default!(Resolution {
    width: 1100,
    height: 800,
});

/// 管线缓存配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineCacheConfig {
    /// 是否启用
    pub enabled: bool,
    /// 缓存目录，未设置时使用平台缓存目录
    pub directory: Option<PathBuf>,
}

impl_default!(PipelineCacheConfig {
    enabled: true,
    directory: None,
});

impl PipelineCacheConfig {
    /// 实际使用的缓存目录；禁用时返回 `None`
    pub fn resolved_directory(&self) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        self.directory.clone().or_else(Self::default_cache_dir)
    }

    /// 获取默认缓存目录
    fn default_cache_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|dir| dir.join("gpu_particles").join("pipeline_cache"))
    }
}
