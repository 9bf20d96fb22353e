//! 核心宏定义

/// 为配置结构体实现 Default trait 的宏
///
/// 使用示例:
/// ```ignore
/// struct Schedule {
///     count: u32,
///     duration: f32,
/// }
///
/// impl_default!(Schedule {
///     count: 10,
///     duration: 1.0,
/// });
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
