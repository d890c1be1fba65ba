// crates/gf_config/src/lib.rs

//! GridFlow Config Layer
//!
//! 批量分层的 JSON 配置：输出目录、流向算法、比例容差、输出无数据值，
//! 以及每个子流域的输入文件。
//!
//! # 模块概览
//!
//! - [`layering_config`]: `LayeringConfig` 与 `SubbasinInputs`
//! - [`error`]: 配置错误类型

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod layering_config;

// 重导出核心类型
pub use error::ConfigError;
pub use layering_config::{LayeringConfig, SubbasinInputs};
