//! 对象缓存模块
//!
//! 后端以插件形式注册（ctor），启动时按配置选择，redis 不可用时回退 moka。

pub mod object_cache;
pub mod register;
pub mod traits;

pub use traits::{CacheResult, ObjectCache};
