//! 核心宏定义
//!
//! 提供统一的宏来减少配置结构体的样板代码

/// 为结构体实现Default trait的宏
///
/// 使用示例:
/// ```rust
/// use gpu_particles::impl_default;
///
/// struct CacheSettings {
///     enabled: bool,
///     name: String,
/// }
///
/// impl_default!(CacheSettings {
///     enabled: true,
///     name: String::from("graphics"),
/// });
///
/// assert!(CacheSettings::default().enabled);
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}
