// crates/gf_foundation/src/error.rs

//! 跨 crate 统一错误
//!
//! 栅格、分层、配置各自定义错误枚举，在 crate 边界转换为 [`GfError`]。
//! 命令行层只面对这一种错误（经 `anyhow` 包装后附加上下文）。
//!
//! ```
//! use gf_foundation::error::{GfError, GfResult};
//!
//! fn open_subbasin(id: u32) -> GfResult<()> {
//!     Err(GfError::not_found(format!("子流域 {id}")))
//! }
//! assert!(open_subbasin(7).unwrap_err().to_string().contains("7"));
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// 统一结果类型
pub type GfResult<T> = Result<T, GfError>;

/// GridFlow 错误类型
#[derive(Error, Debug)]
pub enum GfError {
    /// 读写失败
    #[error("读写失败: {message}")]
    Io {
        /// 上下文
        message: String,
        /// 底层 IO 错误
        #[source]
        source: Option<std::io::Error>,
    },

    /// 输入文件缺失
    #[error("找不到文件 {path}")]
    FileNotFound {
        /// 路径
        path: PathBuf,
    },

    /// 文本格式解析失败
    #[error("{file}:{line}: {message}")]
    ParseError {
        /// 文件路径
        file: PathBuf,
        /// 行号（从 1 开始）
        line: usize,
        /// 错误信息
        message: String,
    },

    /// 输入数据非法
    #[error("输入非法: {message}")]
    InvalidInput {
        /// 原因
        message: String,
    },

    /// 长度与预计算值不符
    #[error("{name}: 预计长度 {expected}, 实际 {actual}")]
    SizeMismatch {
        /// 数组名称
        name: &'static str,
        /// 预计长度
        expected: usize,
        /// 实际长度
        actual: usize,
    },

    /// 构建出的结构自相矛盾
    #[error("一致性检查失败: {message}")]
    Consistency {
        /// 原因
        message: String,
    },

    /// 输入之间或配置项之间不匹配
    #[error("配置错误: {message}")]
    Config {
        /// 原因
        message: String,
    },

    /// 单个配置项取值非法
    #[error("配置项 {key} = {value} 非法: {reason}")]
    InvalidConfig {
        /// 键
        key: String,
        /// 值
        value: String,
        /// 原因
        reason: String,
    },

    /// JSON 编解码失败
    #[error("序列化失败: {message}")]
    Serialization {
        /// 原因
        message: String,
    },

    /// 按名称查找的资源不存在
    #[error("未找到 {resource}")]
    NotFound {
        /// 资源名称
        resource: String,
    },
}

impl GfError {
    /// 无底层错误的读写失败
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// 带底层错误的读写失败
    pub fn io_with_source(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    /// 输入文件缺失
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// 解析失败，行号从 1 开始
    pub fn parse(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// 输入非法
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 长度不符
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 一致性检查失败
    pub fn consistency(message: impl Into<String>) -> Self {
        Self::Consistency {
            message: message.into(),
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 单个配置项非法，`value` 原样出现在错误信息中
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 序列化失败
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// 资源不存在
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }
}

impl From<std::io::Error> for GfError {
    fn from(err: std::io::Error) -> Self {
        Self::io_with_source(err.to_string(), err)
    }
}

/// 条件不满足时返回错误，错误经 `Into` 转换为函数的错误类型
///
/// ```
/// use gf_foundation::{ensure, GfError, GfResult};
///
/// fn n_layers(n_valid: usize) -> GfResult<usize> {
///     ensure!(n_valid > 0, GfError::invalid_input("没有有效单元"));
///     Ok(n_valid)
/// }
/// assert!(n_layers(0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err(($err).into());
        }
    };
}

/// 解包 `Option`，为 `None` 时返回错误
#[macro_export]
macro_rules! require {
    ($opt:expr, $err:expr $(,)?) => {
        match $opt {
            Some(v) => v,
            None => return Err(($err).into()),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_points_at_line() {
        let err = GfError::parse("fd.asc", 7, "列数不足");
        assert_eq!(err.to_string(), "fd.asc:7: 列数不足");
    }

    #[test]
    fn test_io_conversion_keeps_source() {
        use std::error::Error as _;
        let err: GfError = std::io::Error::new(std::io::ErrorKind::NotFound, "mask.asc").into();
        assert!(matches!(err, GfError::Io { source: Some(_), .. }));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_ensure_converts_error_type() {
        #[derive(Debug)]
        struct Wrapped(GfError);
        impl From<GfError> for Wrapped {
            fn from(e: GfError) -> Self {
                Self(e)
            }
        }
        fn check(n: usize) -> Result<usize, Wrapped> {
            ensure!(n % 2 == 0, GfError::size_mismatch("cells", n + 1, n));
            Ok(n / 2)
        }
        assert_eq!(check(4).unwrap(), 2);
        assert!(matches!(check(3).unwrap_err().0, GfError::SizeMismatch { expected: 4, .. }));
    }

    #[test]
    fn test_require() {
        fn first_layer(layers: &[usize]) -> GfResult<usize> {
            let n = require!(layers.first(), GfError::not_found("第 0 层"));
            Ok(*n)
        }
        assert_eq!(first_layer(&[6, 2, 1]).unwrap(), 6);
        assert!(matches!(first_layer(&[]).unwrap_err(), GfError::NotFound { .. }));
    }
}
