// crates/gf_foundation/src/lib.rs

//! GridFlow Foundation Layer
//!
//! 零业务逻辑的基础层，为整个工作区提供共享抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型与 `ensure!`/`require!` 宏
//! - [`index`]: 强类型索引（有效单元、层）
//! - [`validation`]: 非致命问题的验证报告
//!
//! # 示例
//!
//! ```
//! use gf_foundation::{
//!     error::{GfError, GfResult},
//!     index::CellId,
//! };
//!
//! fn first_cell(n_valid: usize) -> GfResult<CellId> {
//!     gf_foundation::ensure!(n_valid > 0, GfError::invalid_input("没有有效单元"));
//!     Ok(CellId::new(0))
//! }
//!
//! assert_eq!(first_cell(3).unwrap().get(), 0);
//! assert!(first_cell(0).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod index;
pub mod validation;

// 重导出常用类型
pub use error::{GfError, GfResult};
pub use index::{CellId, LayerId, INVALID_INDEX};
pub use validation::{ValidationReport, ValidationWarning};

