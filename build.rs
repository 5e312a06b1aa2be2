use std::env;
use std::fs;
use std::path::PathBuf;

// 前端产物不存在时生成的占位页，保证 rust-embed 指向的目录在编译前就绪
const PLACEHOLDER_PAGE: &str = r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>CourseHub</title>
</head>
<body style="font-family: sans-serif; max-width: 40em; margin: 6em auto; text-align: center;">
<h1>CourseHub 后端已启动</h1>
<p>前端尚未构建，当前仅提供 <code>/api/v1</code> 接口。</p>
<p>构建前端：<code>cd frontend &amp;&amp; bun install &amp;&amp; bun run build</code></p>
</body>
</html>
"#;

fn main() {
    println!("cargo:rerun-if-changed=frontend/dist");

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    let dist = PathBuf::from(manifest_dir).join("frontend").join("dist");

    if dist.join("index.html").exists() {
        return;
    }

    println!("cargo:warning=frontend/dist 缺少构建产物，使用占位页（仅 API 可用）");

    fs::create_dir_all(dist.join("assets")).expect("Failed to create frontend/dist");
    fs::write(dist.join("index.html"), PLACEHOLDER_PAGE)
        .expect("Failed to write placeholder index.html");

    let favicon = dist.join("favicon.ico");
    if !favicon.exists() {
        fs::write(&favicon, []).expect("Failed to write placeholder favicon");
    }
}
