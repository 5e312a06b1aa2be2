//! 前端静态资源路由
//!
//! 使用 rust-embed 把前端构建产物打进二进制，未匹配的路由一律回退到
//! index.html（SPA fallback），带 hash 的静态资源设置长缓存。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use rust_embed::Embed;
use std::path::Path;

/// 编译时从 frontend/dist/ 嵌入的前端构建产物
#[derive(Embed)]
#[folder = "frontend/dist/"]
struct FrontendAssets;

/// 构建产物里会出现的扩展名与 MIME 类型
const CONTENT_TYPES: &[(&str, &str)] = &[
    ("html", "text/html; charset=utf-8"),
    ("js", "application/javascript; charset=utf-8"),
    ("mjs", "application/javascript; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("json", "application/json; charset=utf-8"),
    ("map", "application/json; charset=utf-8"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("webp", "image/webp"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("txt", "text/plain; charset=utf-8"),
];

fn extension_of(path: &str) -> &str {
    Path::new(path).extension().and_then(|s| s.to_str()).unwrap_or("")
}

fn content_type_for(path: &str) -> &'static str {
    let ext = extension_of(path);
    CONTENT_TYPES
        .iter()
        .find(|(registered, _)| registered.eq_ignore_ascii_case(ext))
        .map_or("application/octet-stream", |(_, mime)| *mime)
}

/// 带内容 hash 的静态资源可以长期缓存，HTML 等入口文件不行
fn is_immutable_asset(path: &str) -> bool {
    matches!(
        extension_of(path),
        "js" | "css" | "woff" | "woff2" | "ttf" | "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp"
    )
}

fn embedded_file(path: &str) -> Option<Vec<u8>> {
    FrontendAssets::get(path).map(|f| f.data.to_vec())
}

/// 前端资源请求处理，未命中时回退到 index.html
pub async fn serve_frontend(req: HttpRequest) -> ActixResult<HttpResponse> {
    let path = req.match_info().query("tail").trim_start_matches('/');

    let (content, file_path) = if path.is_empty() {
        (embedded_file("index.html"), "index.html")
    } else if let Some(content) = embedded_file(path) {
        (Some(content), path)
    } else {
        // SPA fallback
        (embedded_file("index.html"), "index.html")
    };

    let Some(data) = content else {
        // 连 index.html 都没有说明前端未构建
        return Ok(HttpResponse::NotFound()
            .content_type("text/html; charset=utf-8")
            .body(MISSING_FRONTEND_PAGE));
    };

    let cache_control = if is_immutable_asset(file_path) {
        "public, max-age=31536000, immutable"
    } else {
        "no-cache, no-store, must-revalidate"
    };

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(file_path))
        .insert_header(("Cache-Control", cache_control))
        .body(data))
}

const MISSING_FRONTEND_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>CourseHub</title>
</head>
<body>
    <h1>Frontend assets missing</h1>
    <p>Build the frontend and recompile the server:</p>
    <pre>cd frontend && bun install && bun run build</pre>
</body>
</html>"#;

/// 配置前端路由，所有非 API 的 GET 请求都交给前端处理
pub fn configure_frontend_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/{tail:.*}", web::get().to(serve_frontend));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("index.html"), "text/html; charset=utf-8");
        assert_eq!(
            content_type_for("app.js"),
            "application/javascript; charset=utf-8"
        );
        assert_eq!(content_type_for("style.css"), "text/css; charset=utf-8");
        assert_eq!(content_type_for("logo.png"), "image/png");
        assert_eq!(content_type_for("unknown.xyz"), "application/octet-stream");
    }

    #[test]
    fn test_is_immutable_asset() {
        assert!(is_immutable_asset("assets/app-abc123.js"));
        assert!(is_immutable_asset("assets/style-def456.css"));
        assert!(!is_immutable_asset("index.html"));
        assert!(!is_immutable_asset("manifest.json"));
    }
}
