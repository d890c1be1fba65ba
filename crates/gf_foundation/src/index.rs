// crates/gf_foundation/src/index.rs

//! 强类型索引
//!
//! 有效单元在压缩编号空间中的 ID 与分层编号都是 `usize`，
//! 用新类型区分以防止与栅格线性位置混用。
//!
//! ```
//! use gf_foundation::index::{cell, CellId};
//!
//! let c = cell(5);
//! assert!(c.is_valid());
//! assert!(CellId::INVALID.is_invalid());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// 无效索引标记
pub const INVALID_INDEX: usize = usize::MAX;

macro_rules! define_index {
    ($(#[$meta:meta])* $name:ident, $doc:literal) => {
        #[doc = $doc]
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(pub usize);

        impl $name {
            /// 无效索引常量
            pub const INVALID: Self = Self(INVALID_INDEX);

            /// 创建新索引
            #[inline]
            pub const fn new(idx: usize) -> Self {
                Self(idx)
            }

            /// 获取索引值
            #[inline]
            pub const fn get(self) -> usize {
                self.0
            }

            /// 检查是否有效
            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 != INVALID_INDEX
            }

            /// 检查是否无效
            #[inline]
            pub const fn is_invalid(self) -> bool {
                self.0 == INVALID_INDEX
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(idx: usize) -> Self { Self::new(idx) }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(idx: $name) -> usize { idx.get() }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", stringify!($name), self.0)
                } else {
                    write!(f, "{}(INVALID)", stringify!($name))
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}", self.0)
                } else {
                    write!(f, "INVALID")
                }
            }
        }

        impl Default for $name {
            fn default() -> Self { Self::INVALID }
        }
    };
}

define_index!(CellId, "有效单元的压缩编号（行优先，跳过无数据单元）");
define_index!(LayerId, "汇流分层编号（0 为首层）");

/// 创建单元编号
#[inline]
pub const fn cell(idx: usize) -> CellId {
    CellId::new(idx)
}

/// 创建层编号
#[inline]
pub const fn layer(idx: usize) -> LayerId {
    LayerId::new(idx)
}
