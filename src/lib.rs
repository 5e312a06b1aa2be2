//! CourseHub - 课程管理平台后端服务
//!
//! 基于 Actix Web 的课程与作业管理后端，提供用户注册登录、
//! 管理员建用户、课程与作业管理等 REST 接口，认证采用
//! 服务端会话加 HttpOnly Cookie。
//!
//! # 架构
//! - `cache`: 缓存层（Moka/Redis），承载会话与用户缓存
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `middlewares`: 会话认证、角色授权与限流中间件
//! - `models`: 数据模型定义
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层
//! - `storage`: 数据存储层（SeaORM）
//! - `utils`: 表单校验、文件存储等工具

pub mod cache;
pub mod config;
pub mod entity;
pub mod errors;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
