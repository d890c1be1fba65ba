// crates/gf_foundation/src/validation.rs

//! 运行时验证报告
//!
//! 收集构建过程中的非致命问题（例如流量分配比例之和偏离 1），
//! 致命问题仍然通过 `Result` 返回。
//!
//! ```
//! use gf_foundation::validation::{ValidationReport, ValidationWarning};
//!
//! let mut report = ValidationReport::new();
//! report.add_warning(ValidationWarning::FractionSum {
//!     cell_id: 3,
//!     row: 0,
//!     col: 3,
//!     sum: 0.9,
//!     tolerance: 1e-4,
//! });
//! assert!(report.has_warnings());
//! assert_eq!(report.warning_count(), 1);
//! ```

use std::fmt;

/// 验证报告
#[derive(Debug, Default, Clone)]
pub struct ValidationReport {
    /// 警告列表
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// 创建空的验证报告
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加警告
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// 是否有警告
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// 警告数量
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "验证报告: 警告 {} 个", self.warning_count())?;
        for (i, warn) in self.warnings.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, warn)?;
        }
        Ok(())
    }
}

/// 验证警告类型
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    /// 单元流出比例之和偏离 1
    FractionSum {
        /// 单元 ID
        cell_id: usize,
        /// 行号
        row: usize,
        /// 列号
        col: usize,
        /// 比例之和
        sum: f64,
        /// 允许偏差
        tolerance: f64,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FractionSum {
                cell_id,
                row,
                col,
                sum,
                tolerance,
            } => write!(
                f,
                "单元{} ({}, {}): 流出比例之和 {:.6} 偏离 1 超过 {}",
                cell_id, row, col, sum, tolerance
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(cell_id: usize) -> ValidationWarning {
        ValidationWarning::FractionSum {
            cell_id,
            row: 1,
            col: 1,
            sum: 0.5,
            tolerance: 1e-4,
        }
    }

    #[test]
    fn test_empty_report() {
        let report = ValidationReport::new();
        assert!(!report.has_warnings());
        assert_eq!(report.warning_count(), 0);
    }

    #[test]
    fn test_display_contains_details() {
        let mut report = ValidationReport::new();
        report.add_warning(warning(4));
        let text = report.to_string();
        assert!(text.contains("警告 1 个"));
        assert!(text.contains("单元4"));
    }
}
