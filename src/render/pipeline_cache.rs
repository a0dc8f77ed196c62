//! 管线编译缓存持久化
//!
//! 每个管线（"graphics"、"compute"）一个缓存文件，文件名带上
//! `wgpu::util::pipeline_cache_key` 生成的适配器键，换驱动或换显卡后自动失效。
//! 读写失败只记录警告，管线照常在没有缓存的情况下创建。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::context::GpuContext;

/// 已打开的管线缓存
pub struct OpenedCache {
    pub cache: wgpu::PipelineCache,
    name: String,
    key: String,
}

/// 管线缓存文件存储
#[derive(Debug, Clone)]
pub struct PipelineCacheStore {
    dir: Option<PathBuf>,
}

impl PipelineCacheStore {
    /// `dir` 为 `None` 时禁用缓存
    pub fn new(dir: Option<PathBuf>) -> Self {
        if let Some(dir) = &dir {
            tracing::debug!(target: "render", "Pipeline cache directory: {}", dir.display());
        }
        Self { dir }
    }

    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub fn directory(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn path(&self, name: &str, key: &str) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{}-{}.bin", name, key)))
    }

    /// 读取缓存数据；不存在或读取失败返回 `None`
    pub fn load(&self, name: &str, key: &str) -> Option<Vec<u8>> {
        let path = self.path(name, key)?;
        match fs::read(&path) {
            Ok(data) => {
                tracing::debug!(
                    target: "render",
                    "Loaded {} pipeline cache ({} bytes)",
                    name,
                    data.len()
                );
                Some(data)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(target: "render", "No {} pipeline cache yet", name);
                None
            }
            Err(e) => {
                tracing::warn!(
                    target: "render",
                    "Failed to read pipeline cache {}: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// 写入缓存数据，先写临时文件再重命名
    pub fn save(&self, name: &str, key: &str, data: &[u8]) -> bool {
        let Some(path) = self.path(name, key) else {
            return false;
        };

        match Self::write_atomic(&path, data) {
            Ok(()) => {
                tracing::debug!(
                    target: "render",
                    "Saved {} pipeline cache ({} bytes)",
                    name,
                    data.len()
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    target: "render",
                    "Failed to write pipeline cache {}: {}",
                    path.display(),
                    e
                );
                false
            }
        }
    }

    fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("bin.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, path)
    }

    /// 创建管线缓存对象，用磁盘上的数据作为提示
    ///
    /// 设备不支持 `PIPELINE_CACHE` 或后端没有缓存键时返回 `None`。
    pub fn open(&self, gpu: &GpuContext, name: &str) -> Option<OpenedCache> {
        self.dir.as_ref()?;
        if !gpu.supports_pipeline_cache() {
            return None;
        }
        let key = wgpu::util::pipeline_cache_key(&gpu.adapter.get_info())?;
        let data = self.load(name, &key);

        // SAFETY: 数据只来自本存储在相同缓存键下写入的 `get_data` 结果；
        // `fallback: true` 让 wgpu 在头部校验失败时退回空缓存。
        let cache = unsafe {
            gpu.device
                .create_pipeline_cache(&wgpu::PipelineCacheDescriptor {
                    label: Some(name),
                    data: data.as_deref(),
                    fallback: true,
                })
        };

        Some(OpenedCache {
            cache,
            name: name.to_string(),
            key,
        })
    }

    /// 尽力保存编译后的缓存内容
    pub fn persist(&self, opened: &OpenedCache) {
        if let Some(data) = opened.cache.get_data() {
            self.save(&opened.name, &opened.key, &data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_cache_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = PipelineCacheStore::new(Some(dir.path().to_path_buf()));
        assert_eq!(store.load("graphics", "vulkan_1234"), None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = PipelineCacheStore::new(Some(dir.path().join("nested")));

        assert!(store.save("compute", "key", &[1, 2, 3, 4]));
        assert_eq!(store.load("compute", "key"), Some(vec![1, 2, 3, 4]));
        // 其他名字或键互不干扰
        assert_eq!(store.load("graphics", "key"), None);
        assert_eq!(store.load("compute", "other"), None);
        assert!(dir.path().join("nested").join("compute-key.bin").exists());
    }

    #[test]
    fn test_overwrite_replaces_previous_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = PipelineCacheStore::new(Some(dir.path().to_path_buf()));
        store.save("graphics", "key", &[9; 16]);
        store.save("graphics", "key", &[7; 8]);
        assert_eq!(store.load("graphics", "key"), Some(vec![7; 8]));
    }

    #[test]
    fn test_unwritable_directory_is_non_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"not a directory").unwrap();

        let store = PipelineCacheStore::new(Some(blocker.join("cache")));
        assert!(!store.save("graphics", "key", &[1, 2, 3]));
        assert_eq!(store.load("graphics", "key"), None);
    }

    #[test]
    fn test_disabled_store() {
        let store = PipelineCacheStore::disabled();
        assert!(store.directory().is_none());
        assert!(!store.save("graphics", "key", &[1]));
        assert_eq!(store.load("graphics", "key"), None);
    }
}
