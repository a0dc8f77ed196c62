//! 着色器二进制
//!
//! 着色器以不透明字节数组提供：内置 WGSL 源码，或从配置目录读取的
//! 同名文件（WGSL 文本或 SPIR-V 二进制，按魔数区分）。

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::Path;

use crate::core::error::{RenderError, RenderResult};
use crate::simulation::ParameterTransport;

use super::context::GpuContext;

/// SPIR-V 魔数（小端）
const SPIRV_MAGIC: u32 = 0x0723_0203;

/// 着色器入口函数名
pub const ENTRY_POINT: &str = "main";

const VERTEX_WGSL: &[u8] = include_bytes!("shaders/particles.vert.wgsl");
const FRAGMENT_WGSL: &[u8] = include_bytes!("shaders/particles.frag.wgsl");
const COMPUTE_WGSL: &[u8] = include_bytes!("shaders/particles.comp.wgsl");
const COMPUTE_PUSH_WGSL: &[u8] = include_bytes!("shaders/particles_push.comp.wgsl");

/// 单个着色器二进制
#[derive(Debug, Clone)]
pub struct ShaderBlob {
    name: String,
    bytes: Cow<'static, [u8]>,
}

impl ShaderBlob {
    pub fn embedded(name: &str, bytes: &'static [u8]) -> Self {
        Self {
            name: name.to_string(),
            bytes: Cow::Borrowed(bytes),
        }
    }

    pub fn new(name: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            bytes: Cow::Owned(bytes),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_spirv(&self) -> bool {
        self.bytes.len() >= 4
            && u32::from_le_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]])
                == SPIRV_MAGIC
    }

    fn load_error(&self, reason: impl Into<String>) -> RenderError {
        RenderError::ShaderLoad {
            name: self.name.clone(),
            reason: reason.into(),
        }
    }

    /// 转换为 wgpu 着色器源
    pub fn source(&self) -> RenderResult<wgpu::ShaderSource<'_>> {
        if self.is_spirv() {
            if self.bytes.len() % 4 != 0 {
                return Err(self.load_error("SPIR-V length is not a multiple of 4"));
            }
            return Ok(wgpu::util::make_spirv(&self.bytes));
        }

        std::str::from_utf8(&self.bytes)
            .map(|text| wgpu::ShaderSource::Wgsl(Cow::Borrowed(text)))
            .map_err(|e| self.load_error(format!("not SPIR-V and not UTF-8 WGSL: {}", e)))
    }

    pub fn create_module(&self, gpu: &GpuContext) -> RenderResult<wgpu::ShaderModule> {
        let source = self.source()?;
        gpu.scoped(|| {
            gpu.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(self.name.as_str()),
                source,
            })
        })
        .map_err(|reason| self.load_error(reason))
    }
}

/// 顶点、片段、计算三个着色器
#[derive(Debug, Clone)]
pub struct ShaderSet {
    pub vertex: ShaderBlob,
    pub fragment: ShaderBlob,
    pub compute: ShaderBlob,
}

impl ShaderSet {
    /// 内置着色器；计算着色器按参数上传方式选择
    pub fn embedded(transport: ParameterTransport) -> Self {
        let compute = match transport {
            ParameterTransport::UniformBuffer => COMPUTE_WGSL,
            ParameterTransport::PushConstant => COMPUTE_PUSH_WGSL,
        };
        Self {
            vertex: ShaderBlob::embedded("particles.vert", VERTEX_WGSL),
            fragment: ShaderBlob::embedded("particles.frag", FRAGMENT_WGSL),
            compute: ShaderBlob::embedded(Self::compute_name(transport), compute),
        }
    }

    /// 加载着色器，目录中存在的同名文件覆盖内置版本
    pub fn load(directory: Option<&Path>, transport: ParameterTransport) -> RenderResult<Self> {
        let mut set = Self::embedded(transport);
        let Some(dir) = directory else {
            return Ok(set);
        };

        for blob in [&mut set.vertex, &mut set.fragment, &mut set.compute] {
            let path = dir.join(blob.name());
            match fs::read(&path) {
                Ok(bytes) => {
                    tracing::info!(target: "render", "Loaded shader override {}", path.display());
                    *blob = ShaderBlob::new(blob.name(), bytes);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!(
                        target: "render",
                        "No override for {}, using embedded shader",
                        blob.name()
                    );
                }
                Err(e) => return Err(blob.load_error(e.to_string())),
            }
        }

        Ok(set)
    }

    fn compute_name(transport: ParameterTransport) -> &'static str {
        match transport {
            ParameterTransport::UniformBuffer => "particles.comp",
            ParameterTransport::PushConstant => "particles_push.comp",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_shaders_are_wgsl() {
        let set = ShaderSet::embedded(ParameterTransport::UniformBuffer);
        for blob in [&set.vertex, &set.fragment, &set.compute] {
            assert!(!blob.is_spirv());
            assert!(matches!(blob.source(), Ok(wgpu::ShaderSource::Wgsl(_))));
        }
    }

    #[test]
    fn test_transport_selects_compute_shader() {
        let uniform = ShaderSet::embedded(ParameterTransport::UniformBuffer);
        let push = ShaderSet::embedded(ParameterTransport::PushConstant);
        assert_eq!(uniform.compute.name(), "particles.comp");
        assert_eq!(push.compute.name(), "particles_push.comp");

        let text = |blob: &ShaderBlob| match blob.source() {
            Ok(wgpu::ShaderSource::Wgsl(text)) => text.into_owned(),
            _ => String::new(),
        };
        assert!(text(&uniform.compute).contains("var<uniform>"));
        assert!(text(&push.compute).contains("var<push_constant>"));
        assert!(text(&push.compute).contains("@workgroup_size(16)"));
    }

    #[test]
    fn test_spirv_detection() {
        let mut bytes = SPIRV_MAGIC.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0; 4]);
        let blob = ShaderBlob::new("blob.comp", bytes);
        assert!(blob.is_spirv());

        let truncated = ShaderBlob::new("bad.comp", vec![0x03, 0x02, 0x23, 0x07, 0x00]);
        assert!(matches!(
            truncated.source(),
            Err(RenderError::ShaderLoad { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let blob = ShaderBlob::new("garbage.frag", vec![0xff, 0xfe, 0xfd]);
        assert!(matches!(blob.source(), Err(RenderError::ShaderLoad { .. })));
    }

    #[test]
    fn test_directory_override() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("particles.frag"),
            "@fragment fn main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }",
        )
        .unwrap();

        let set = ShaderSet::load(Some(dir.path()), ParameterTransport::UniformBuffer).unwrap();
        let fragment = match set.fragment.source() {
            Ok(wgpu::ShaderSource::Wgsl(text)) => text.into_owned(),
            _ => String::new(),
        };
        assert!(fragment.contains("vec4<f32>(1.0)"));
        // 未覆盖的着色器保持内置版本
        assert_eq!(set.vertex.bytes.as_ref(), VERTEX_WGSL);
    }

    #[test]
    fn test_directory_override_for_push_constants() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("particles.comp"), "// uniform").unwrap();
        fs::write(dir.path().join("particles_push.comp"), "// push").unwrap();

        let set = ShaderSet::load(Some(dir.path()), ParameterTransport::PushConstant).unwrap();
        assert_eq!(set.compute.name(), "particles_push.comp");
        assert_eq!(set.compute.bytes.as_ref(), b"// push");
    }
}
