use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use std::sync::OnceLock;

use super::AppConfig;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// 常用部署参数的环境变量别名，优先级高于配置文件与 COURSEHUB_ 前缀变量
fn apply_env_aliases(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_override_option("app.environment", std::env::var("APP_ENV").ok())?
        .set_override_option("app.log_level", std::env::var("RUST_LOG").ok())?
        .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
        .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
        .set_override_option("server.unix_socket_path", std::env::var("UNIX_SOCKET").ok())?
        .set_override_option("server.workers", std::env::var("CPU_COUNT").ok())?
        .set_override_option("session.ttl", std::env::var("SESSION_TTL").ok())?
        .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
        .set_override_option("upload.dir", std::env::var("UPLOAD_DIR").ok())?
        .set_override_option("cache.default_ttl", std::env::var("CACHE_TTL").ok())?
        .set_override_option("cache.redis.url", std::env::var("REDIS_URL").ok())?
        .set_override_option(
            "cache.redis.key_prefix",
            std::env::var("REDIS_KEY_PREFIX").ok(),
        )
}

impl AppConfig {
    /// 加载配置
    ///
    /// 来源从低到高：config.toml、config.{APP_ENV}.toml、COURSEHUB_ 前缀环境变量、
    /// 常用别名环境变量（DATABASE_URL 等）。
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                File::with_name(&format!(
                    "config.{}",
                    std::env::var("APP_ENV").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            .add_source(
                Environment::with_prefix("COURSEHUB")
                    .separator("_")
                    .try_parsing(true),
            );

        builder = apply_env_aliases(builder)?;

        let config = builder.build()?;
        let mut app_config: AppConfig = config.try_deserialize()?;
        app_config.normalize()?;

        Ok(app_config)
    }

    /// 推导缺省值并拒绝无法运行的配置
    fn normalize(&mut self) -> Result<(), ConfigError> {
        if self.server.workers == 0 {
            self.server.workers = num_cpus::get().min(self.server.max_workers);
        }
        if self.session.ttl == 0 {
            return Err(ConfigError::Message(
                "session.ttl must be greater than 0".to_string(),
            ));
        }
        if self.session.cookie_name.is_empty() {
            return Err(ConfigError::Message(
                "session.cookie_name must not be empty".to_string(),
            ));
        }
        if self.upload.max_size == 0 || self.upload.image_max_size == 0 {
            return Err(ConfigError::Message(
                "upload size limits must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// 获取全局配置实例
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    /// 初始化配置 (在应用启动时调用)
    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))?;
        Ok(())
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    /// 获取服务器绑定地址
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取 Unix 套接字路径 (如果配置了)
    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        if self.server.unix_socket_path.is_empty() {
            None
        } else {
            Some(&self.server.unix_socket_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::structs::*;

    fn sample_config() -> AppConfig {
        AppConfig {
            app: AppSettings {
                environment: "development".to_string(),
                log_level: "info".to_string(),
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                unix_socket_path: String::new(),
                workers: 0,
                max_workers: 8,
                max_payload_size: 10 * 1024 * 1024,
                timeouts: TimeoutConfig {
                    client_request: 5000,
                    client_disconnect: 1000,
                    keep_alive: 30,
                },
            },
            session: SessionConfig {
                cookie_name: "coursehub_session".to_string(),
                ttl: 604800,
            },
            database: DatabaseConfig {
                url: "sqlite://coursehub.db?mode=rwc".to_string(),
                pool_size: 5,
                timeout: 10,
            },
            cache: CacheConfig {
                cache_type: "moka".to_string(),
                default_ttl: 3600,
                redis: RedisConfig {
                    url: "redis://127.0.0.1:6379".to_string(),
                    key_prefix: "coursehub".to_string(),
                },
                memory: MemoryConfig { max_capacity: 1000 },
            },
            cors: CorsConfig {
                allowed_origins: vec![],
                allowed_methods: vec![],
                allowed_headers: vec![],
                max_age: 3600,
            },
            upload: UploadConfig {
                dir: "uploads".to_string(),
                max_size: 10 * 1024 * 1024,
                image_max_size: 2 * 1024 * 1024,
            },
        }
    }

    #[test]
    fn test_environment_helpers() {
        let mut config = sample_config();
        assert!(config.is_development());
        assert!(!config.is_production());

        config.app.environment = "production".to_string();
        assert!(config.is_production());
    }

    #[test]
    fn test_bind_address() {
        let config = sample_config();
        assert_eq!(config.server_bind_address(), "127.0.0.1:8080");
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_socket_path_empty_means_tcp() {
        let mut config = sample_config();
        assert!(config.unix_socket_path().is_none());

        config.server.unix_socket_path = "/tmp/coursehub.sock".to_string();
        assert_eq!(config.unix_socket_path(), Some("/tmp/coursehub.sock"));
    }

    #[test]
    fn test_normalize_fills_workers_and_rejects_zero_ttl() {
        let mut config = sample_config();
        config.normalize().unwrap();
        assert!(config.server.workers > 0);
        assert!(config.server.workers <= config.server.max_workers);

        let mut config = sample_config();
        config.session.ttl = 0;
        assert!(config.normalize().is_err());

        let mut config = sample_config();
        config.upload.max_size = 0;
        assert!(config.normalize().is_err());
    }
}
