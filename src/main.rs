use actix_cors::Cors;
use actix_web::middleware::{Compress, DefaultHeaders};
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use human_panic::setup_panic;
use tracing::{debug, warn};

use rust_coursehub::config::AppConfig;
use rust_coursehub::models::AppStartTime;
use rust_coursehub::routes;
use rust_coursehub::runtime::lifetime;
use rust_coursehub::utils::{json_error_handler, query_error_handler};

/// 初始化日志，开发环境带文件行号，生产环境输出 JSON
///
/// 返回的 guard 负责刷写异步日志缓冲，必须存活到进程结束。
fn init_tracing(config: &AppConfig) -> tracing_appender::non_blocking::WorkerGuard {
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let filter = tracing_subscriber::EnvFilter::new(&config.app.log_level);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking_writer);

    if config.is_development() {
        builder
            .with_ansi(true)
            .with_file(true)
            .with_line_number(true)
            .init();
    } else {
        builder.json().init();
    }

    guard
}

/// 会话依赖 Cookie，跨域来源必须显式配置并开启 credentials
fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .supports_credentials()
        .max_age(config.cors.max_age);
    for origin in &config.cors.allowed_origins {
        cors = cors.allowed_origin(origin);
    }
    cors = cors.allowed_methods(config.cors.allowed_methods.iter().map(String::as_str));
    for header in &config.cors.allowed_headers {
        cors = cors.allowed_header(header.as_str());
    }
    cors
}

/// API 响应默认不缓存，前端静态资源在自己的 handler 里单独放宽
fn default_headers(config: &AppConfig) -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Connection", "keep-alive"))
        .add((
            "Keep-Alive",
            format!("timeout={}, max=1000", config.server.timeouts.keep_alive),
        ))
        .add(("Cache-Control", "no-cache, no-store, must-revalidate"))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    setup_panic!();
    AppConfig::init().expect("Failed to initialize configuration");
    let config = AppConfig::get();

    let _guard = init_tracing(config);

    warn!(
        "{} v{} starting (env: {})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.app.environment
    );

    // 存储、缓存、角色与管理员种子都在这一步完成
    let startup = lifetime::startup::prepare_server_startup().await;
    let storage = startup.storage.clone();
    let cache = startup.cache.clone();

    debug!(
        "Startup preparation took {} ms",
        chrono::Utc::now()
            .signed_duration_since(app_start_time.start_datetime)
            .num_milliseconds()
    );

    warn!("HTTP workers: {}", config.server.workers);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(build_cors(config))
            .wrap(Compress::default())
            .wrap(default_headers(config))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PayloadConfig::new(config.server.max_payload_size))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(cache.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .configure(routes::configure_auth_routes)
            .configure(routes::configure_user_routes)
            .configure(routes::configure_role_routes)
            .configure(routes::configure_course_routes)
            .configure(routes::configure_assignment_routes)
            // 前端 fallback 必须留在最后，否则会吃掉 API 路由
            .configure(routes::configure_frontend_routes)
    })
    .keep_alive(std::time::Duration::from_secs(
        config.server.timeouts.keep_alive,
    ))
    .client_request_timeout(std::time::Duration::from_millis(
        config.server.timeouts.client_request,
    ))
    .client_disconnect_timeout(std::time::Duration::from_millis(
        config.server.timeouts.client_disconnect,
    ))
    .workers(config.server.workers);

    #[cfg(unix)]
    let server = if let Some(socket_path) = config.unix_socket_path() {
        // 上次异常退出可能留下旧的 socket 文件
        if std::path::Path::new(socket_path).exists() {
            std::fs::remove_file(socket_path)?;
        }
        warn!("Listening on unix socket {}", socket_path);
        server.bind_uds(socket_path)?
    } else {
        let addr = config.server_bind_address();
        warn!("Listening on http://{}", addr);
        server.bind(addr)?
    };

    #[cfg(not(unix))]
    let server = {
        let addr = config.server_bind_address();
        warn!("Listening on http://{}", addr);
        server.bind(addr)?
    };

    tokio::select! {
        res = server.run() => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown() => {
            warn!("Graceful shutdown: all tasks completed");
        }
    }

    Ok(())
}
