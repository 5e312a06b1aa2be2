use serde::{Deserialize, Serialize};

/// 运行时配置根结构，对应 config.toml 的各个表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub database: DatabaseConfig,
    pub upload: UploadConfig,
    pub cache: CacheConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// development / production，决定日志格式等行为
    pub environment: String,
    /// tracing 的过滤表达式，RUST_LOG 可覆盖
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 非空时走 Unix 套接字，忽略 host/port
    pub unix_socket_path: String,
    /// 0 表示按 CPU 数自动推导，上限 max_workers
    pub workers: usize,
    pub max_workers: usize,
    /// 请求体上限（字节），多部分表单的文件上限另见 upload 节
    pub max_payload_size: usize,
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// 读取请求头的毫秒数
    pub client_request: u64,
    /// 等待客户端断开的毫秒数
    pub client_disconnect: u64,
    /// keep-alive 秒数
    pub keep_alive: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// 会话有效期（秒）
    pub ttl: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 连接 URL，后端类型从 scheme 推断
    pub url: String,
    pub pool_size: u32,
    /// 连接超时（秒）
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: String,
    /// 单个附件上限（字节），作业 PDF 用这个
    pub max_size: usize,
    /// 头像等图片的上限（字节）
    pub image_max_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(rename = "type")]
    pub cache_type: String,
    /// 未显式给 TTL 的缓存项的默认存活秒数
    pub default_ttl: u64,
    pub redis: RedisConfig,
    pub memory: MemoryConfig,
}

/// 后端只用一条 multiplexed 连接，不设连接池参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub key_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub max_capacity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 允许的跨域来源，会话走 Cookie 所以不能用通配
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub max_age: usize,
}
