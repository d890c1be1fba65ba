// crates/gf_layering/src/ragged.rs

//! 扁平变长二维数组
//!
//! 编码格式 `[n, count_0, v_00, ..., count_1, v_10, ...]`，总长度为
//! `n + Σcount + 1`。例如
//!
//! ```text
//! 4 0 1 0 1 1 2 7 8
//! ```
//!
//! 表示 4 行：第 0 行为空，第 1 行 `[0]`，第 2 行 `[1]`，第 3 行 `[7, 8]`。

use crate::error::{LayeringError, LayeringResult};
use tracing::error;

/// 扁平变长二维数组
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RaggedArray {
    data: Vec<f64>,
}

impl RaggedArray {
    /// 预计算长度
    #[inline]
    pub const fn expected_len(n_rows: usize, total_items: usize) -> usize {
        n_rows + total_items + 1
    }

    /// 从扁平数据解析并校验结构
    pub fn from_flat(data: Vec<f64>) -> LayeringResult<Self> {
        let malformed = |msg: &str| LayeringError::consistency(format!("变长数组格式错误: {msg}"));
        let n = *data.first().ok_or_else(|| malformed("空数组"))?;
        if n < 0.0 || n.fract() != 0.0 {
            return Err(malformed("行数不是非负整数"));
        }
        let mut pos = 1usize;
        for _ in 0..n as usize {
            let count = *data.get(pos).ok_or_else(|| malformed("行计数缺失"))?;
            if count < 0.0 || count.fract() != 0.0 {
                return Err(malformed("行计数不是非负整数"));
            }
            pos = (count as usize)
                .checked_add(1)
                .and_then(|step| pos.checked_add(step))
                .filter(|&next| next <= data.len())
                .ok_or_else(|| malformed("行计数超出数组长度"))?;
        }
        if pos != data.len() {
            return Err(malformed("数组长度与计数不符"));
        }
        Ok(Self { data })
    }

    /// 扁平数据
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// 扁平长度
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否为空（未初始化）
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 行数
    pub fn n_rows(&self) -> usize {
        self.data.first().map_or(0, |&n| n as usize)
    }

    /// 按行遍历
    pub fn rows(&self) -> RaggedRows<'_> {
        RaggedRows {
            data: &self.data,
            pos: 1,
            remaining: self.n_rows(),
        }
    }
}

/// 行迭代器
pub struct RaggedRows<'a> {
    data: &'a [f64],
    pos: usize,
    remaining: usize,
}

impl<'a> Iterator for RaggedRows<'a> {
    type Item = &'a [f64];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let count = *self.data.get(self.pos)? as usize;
        let start = self.pos + 1;
        let row = self.data.get(start..start + count)?;
        self.pos = start + count;
        self.remaining -= 1;
        Some(row)
    }
}

/// 逐行写入并在结束时校验总长度
#[derive(Debug)]
pub struct RaggedWriter {
    name: &'static str,
    expected: usize,
    data: Vec<f64>,
}

impl RaggedWriter {
    /// 创建写入器并写入行数
    pub fn new(name: &'static str, n_rows: usize, expected_len: usize) -> Self {
        let mut data = Vec::with_capacity(expected_len);
        data.push(n_rows as f64);
        Self {
            name,
            expected: expected_len,
            data,
        }
    }

    /// 写入一行: 先计数后元素
    pub fn push_row<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = f64>,
        I::IntoIter: ExactSizeIterator,
    {
        let items = items.into_iter();
        self.data.push(items.len() as f64);
        self.data.extend(items);
    }

    /// 已写入长度
    #[inline]
    pub fn written(&self) -> usize {
        self.data.len()
    }

    /// 结束写入，长度不符时返回错误且不产生输出
    pub fn finish(self) -> LayeringResult<RaggedArray> {
        if self.data.len() != self.expected {
            error!(
                "构建 {} 失败: 预计算长度 {}, 实际写入 {}",
                self.name,
                self.expected,
                self.data.len()
            );
            return Err(LayeringError::LengthMismatch {
                name: self.name,
                expected: self.expected,
                actual: self.data.len(),
            });
        }
        Ok(RaggedArray { data: self.data })
    }
}
