// crates/gf_layering/src/error.rs

//! 汇流分层错误类型
//!
//! 错误按检测位置分为四类（见 [`FailureKind`]），均在检测处记录日志后返回，
//! 由调用方决定中止整个流程还是跳过该子流域。

use gf_foundation::GfError;
use gf_raster::RasterError;
use thiserror::Error;

/// 分层模块结果类型别名
pub type LayeringResult<T> = Result<T, LayeringError>;

/// 失败类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 输入栅格缺失或不可读
    Io,
    /// 掩膜与流向栅格范围或有效单元数不一致
    Configuration,
    /// 构建结果与预期不一致
    DataConsistency,
    /// 波前耗尽但仍有未分层单元
    Layering,
}

/// 分层错误枚举
#[derive(Error, Debug)]
pub enum LayeringError {
    /// 输入读取失败
    #[error("输入读取失败: {name}: {reason}")]
    Io {
        /// 输入名称
        name: String,
        /// 失败原因
        reason: String,
    },

    /// 栅格层错误
    #[error("栅格错误: {0}")]
    Raster(#[from] RasterError),

    /// 输入之间不一致
    #[error("配置不一致: {message}")]
    Configuration {
        /// 具体信息
        message: String,
    },

    /// 非法的流向编码
    #[error("非法流向值 {value} (行 {row}, 列 {col}): {reason}")]
    MalformedDirection {
        /// 行号
        row: usize,
        /// 列号
        col: usize,
        /// 原始值
        value: f64,
        /// 原因
        reason: &'static str,
    },

    /// 构建结果不一致
    #[error("数据不一致: {message}")]
    DataConsistency {
        /// 具体信息
        message: String,
    },

    /// 扁平数组长度与预计算长度不符
    #[error("{name} 长度不匹配: 期望 {expected}, 实际写入 {actual}")]
    LengthMismatch {
        /// 数组名称
        name: &'static str,
        /// 预计算长度
        expected: usize,
        /// 实际写入长度
        actual: usize,
    },

    /// 分层未能覆盖全部单元
    #[error("{pass} 分层失败: {unassigned} 个单元未分层 (首个单元 {first})，流向场可能存在环")]
    Layering {
        /// 分层方向
        pass: &'static str,
        /// 未分层单元数
        unassigned: usize,
        /// 第一个未分层单元编号
        first: usize,
    },
}

impl LayeringError {
    /// 输入读取失败
    pub fn io(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Io {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// 配置不一致
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// 数据不一致
    pub fn consistency(message: impl Into<String>) -> Self {
        Self::DataConsistency {
            message: message.into(),
        }
    }

    /// 错误所属类别
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Io { .. } | Self::Raster(_) => FailureKind::Io,
            Self::Configuration { .. } => FailureKind::Configuration,
            Self::MalformedDirection { .. }
            | Self::DataConsistency { .. }
            | Self::LengthMismatch { .. } => FailureKind::DataConsistency,
            Self::Layering { .. } => FailureKind::Layering,
        }
    }
}

impl From<LayeringError> for GfError {
    fn from(err: LayeringError) -> Self {
        match err {
            LayeringError::Io { name, reason } => GfError::io(format!("{name}: {reason}")),
            LayeringError::Raster(e) => e.into(),
            LayeringError::Configuration { message } => GfError::config(message),
            LayeringError::LengthMismatch {
                name,
                expected,
                actual,
            } => GfError::size_mismatch(name, expected, actual),
            other @ (LayeringError::MalformedDirection { .. }
            | LayeringError::DataConsistency { .. }
            | LayeringError::Layering { .. }) => GfError::consistency(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(LayeringError::io("fd", "missing").kind(), FailureKind::Io);
        assert_eq!(
            LayeringError::configuration("extent").kind(),
            FailureKind::Configuration
        );
        assert_eq!(
            LayeringError::LengthMismatch {
                name: "flow_in",
                expected: 3,
                actual: 2
            }
            .kind(),
            FailureKind::DataConsistency
        );
        assert_eq!(
            LayeringError::Layering {
                pass: "up-down",
                unassigned: 2,
                first: 0
            }
            .kind(),
            FailureKind::Layering
        );
    }

    #[test]
    fn test_conversion_to_foundation() {
        let err: GfError = LayeringError::LengthMismatch {
            name: "flow_out",
            expected: 10,
            actual: 9,
        }
        .into();
        assert!(matches!(err, GfError::SizeMismatch { expected: 10, actual: 9, .. }));

        let err: GfError = LayeringError::Layering {
            pass: "down-up",
            unassigned: 1,
            first: 4,
        }
        .into();
        assert!(err.to_string().contains("down-up"));
    }
}
