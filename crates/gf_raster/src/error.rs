// crates/gf_raster/src/error.rs

//! 栅格错误类型定义
//!
//! 所有错误最终可转换为 `GfError` 以实现跨层错误传递。

use gf_foundation::GfError;
use std::path::PathBuf;
use thiserror::Error;

/// 栅格模块结果类型别名
pub type RasterResult<T> = Result<T, RasterError>;

/// 栅格错误枚举
#[derive(Error, Debug)]
pub enum RasterError {
    /// 文件不存在
    #[error("栅格文件不存在: {path}")]
    FileNotFound {
        /// 文件路径
        path: PathBuf,
    },

    /// 底层 IO 错误
    #[error("栅格 IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 文件解析错误
    #[error("栅格解析错误: {file}:{line} - {message}")]
    Parse {
        /// 文件路径
        file: PathBuf,
        /// 行号
        line: usize,
        /// 错误信息
        message: String,
    },

    /// 数据长度与行列数不符
    #[error("栅格大小不匹配: {name} 期望 {expected}, 实际 {actual}")]
    SizeMismatch {
        /// 数据名称
        name: String,
        /// 期望长度
        expected: usize,
        /// 实际长度
        actual: usize,
    },

    /// 请求的输出格式未编译进来
    #[error("不支持的栅格格式: {name}")]
    UnsupportedFormat {
        /// 格式名
        name: String,
    },

    /// 外部栅格驱动 (GDAL) 错误
    #[error("栅格驱动错误: {message}")]
    Driver {
        /// 驱动返回的信息
        message: String,
    },

    /// 目录中不存在该栅格
    #[error("未找到栅格: {name}")]
    UnknownGrid {
        /// 栅格名称
        name: String,
    },
}

impl RasterError {
    /// 解析错误
    pub fn parse(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}

#[cfg(feature = "gdal")]
impl From<crate::drivers::gdal::GdalError> for RasterError {
    fn from(err: crate::drivers::gdal::GdalError) -> Self {
        Self::Driver {
            message: err.to_string(),
        }
    }
}

impl From<RasterError> for GfError {
    fn from(err: RasterError) -> Self {
        match err {
            RasterError::FileNotFound { path } => GfError::file_not_found(path),
            RasterError::Io(e) => GfError::io_with_source("栅格读写失败", e),
            RasterError::Parse { file, line, message } => GfError::parse(file, line, message),
            RasterError::SizeMismatch {
                name,
                expected,
                actual,
            } => GfError::invalid_input(format!(
                "栅格 {name} 大小不匹配: 期望 {expected}, 实际 {actual}"
            )),
            RasterError::UnknownGrid { name } => GfError::not_found(name),
            RasterError::UnsupportedFormat { name } => {
                GfError::invalid_config("grid_format", name, "未启用对应的栅格驱动")
            }
            RasterError::Driver { message } => GfError::io(message),
        }
    }
}
