use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::models::roles::entities::Role;
use crate::models::users::requests::NewUser;
use crate::storage::Storage;
use crate::utils::file_store::FileStore;
use crate::utils::password::hash_password;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

/// 创建缓存实例，配置的后端不可用时回退到内存缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>, String> {
    let configured = AppConfig::get().cache.cache_type.as_str();

    let mut candidates = vec![configured];
    if configured != "moka" {
        candidates.push("moka");
    }

    for backend in candidates {
        let Some(constructor) = get_object_cache_plugin(backend) else {
            warn!("Cache backend '{}' not found in registry", backend);
            continue;
        };
        match constructor().await {
            Ok(cache) => {
                warn!("Cache backend ready: {}", backend);
                return Ok(Arc::from(cache));
            }
            Err(e) => warn!("Cache backend '{}' failed: {}", backend, e),
        }
    }

    Err(format!(
        "No cache backend available (tried: {configured}, registered: {})",
        crate::cache::register::registered_backends().join(", ")
    ))
}

/// 生成随机密码
fn generate_random_password(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%";
    let mut rng = rand::rng();
    std::iter::repeat_with(|| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .take(length)
        .collect()
}

/// 补齐缺失的内置角色（student / instructor / admin），已存在的不动
async fn seed_roles(storage: &Arc<dyn Storage>) {
    let existing = match storage.list_roles().await {
        Ok(roles) => roles,
        Err(e) => {
            warn!("Failed to list roles: {}, skipping role seed", e);
            return;
        }
    };

    for name in Role::builtin_names() {
        if existing.iter().any(|role| role.name == *name) {
            continue;
        }
        match storage.create_role(name).await {
            Ok(role) => info!("Seeded role '{}' (ID: {})", role.name, role.id),
            Err(e) => warn!("Failed to seed role '{}': {}", name, e),
        }
    }
}

/// 用户表为空时创建默认管理员，密码优先取 ADMIN_PASSWORD 环境变量
async fn seed_admin(storage: &Arc<dyn Storage>) {
    match storage.count_users().await {
        Ok(0) => info!("No users yet, creating default admin account"),
        Ok(count) => {
            debug!("Database already has {} user(s), skipping admin seed", count);
            return;
        }
        Err(e) => {
            warn!("Failed to count users: {}, skipping admin seed", e);
            return;
        }
    }

    let password = match std::env::var("ADMIN_PASSWORD") {
        Ok(pwd) if !pwd.is_empty() => pwd,
        _ => {
            let pwd = generate_random_password(16);
            warn!("ADMIN_PASSWORD not set, generated admin password: {}", pwd);
            warn!("Save it now, it will not be shown again");
            pwd
        }
    };

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash admin password: {}, skipping admin seed", e);
            return;
        }
    };

    let admin = NewUser {
        name: "Administrator".to_string(),
        username: "admin".to_string(),
        email: "admin@localhost".to_string(),
        password_hash,
        birth_date: None,
        title: None,
        university_id: None,
        phone: None,
        image: None,
    };

    let user = match storage.create_user(admin).await {
        Ok(user) => user,
        Err(e) => {
            warn!("Failed to create admin account: {}", e);
            return;
        }
    };

    // 挂上 admin 角色，角色注册表在 seed_roles 里已经补齐
    match storage.get_role_by_name(Role::ADMIN).await {
        Ok(Some(role)) => {
            if let Err(e) = storage.assign_role(user.id, role.id).await {
                warn!("Failed to assign admin role to seeded account: {}", e);
            }
        }
        Ok(None) => warn!("Role '{}' missing, seeded admin has no role", Role::ADMIN),
        Err(e) => warn!("Failed to look up admin role: {}", e),
    }

    info!(
        "Default admin account created (ID: {}, username: {})",
        user.id, user.username
    );
}

/// 上传目录不存在时提前建好
fn prepare_upload_dir() {
    let store = FileStore::from_config();
    match store.ensure_dir() {
        Ok(()) => debug!("Upload directory ready: {}", store.dir().display()),
        Err(e) => warn!("Failed to prepare upload directory: {}", e),
    }
}

/// 服务器启动前的准备：TLS provider、存储与迁移、种子数据、缓存
pub async fn prepare_server_startup() -> StartupContext {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
    }

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    seed_roles(&storage).await;
    seed_admin(&storage).await;

    prepare_upload_dir();

    let cache = create_cache().await.expect("Failed to create cache");

    StartupContext { storage, cache }
}
