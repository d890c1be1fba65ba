// crates/gf_raster/src/raster.rs

//! 栅格数据管理
//!
//! 提供行优先存储的二维栅格及其访问、校验方法。

use crate::error::{RasterError, RasterResult};
use serde::{Deserialize, Serialize};

/// 栅格地理头信息
///
/// 仅原样透传到输出栅格，不参与任何计算。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridHeader {
    /// 左下角 X 坐标
    pub xll: f64,
    /// 左下角 Y 坐标
    pub yll: f64,
    /// 单元大小
    pub cell_size: f64,
}

impl Default for GridHeader {
    fn default() -> Self {
        Self {
            xll: 0.0,
            yll: 0.0,
            cell_size: 1.0,
        }
    }
}

/// 栅格数据
#[derive(Debug, Clone, PartialEq)]
pub struct RasterData {
    /// 数据（行优先）
    pub data: Vec<f64>,
    /// 行数
    pub rows: usize,
    /// 列数
    pub cols: usize,
    /// 无数据值
    pub nodata: f64,
    /// 地理头信息
    pub header: GridHeader,
}

impl RasterData {
    /// 创建以无数据值填充的栅格
    pub fn new(rows: usize, cols: usize, nodata: f64) -> Self {
        Self {
            data: vec![nodata; rows * cols],
            rows,
            cols,
            nodata,
            header: GridHeader::default(),
        }
    }

    /// 从数据创建
    pub fn from_data(data: Vec<f64>, rows: usize, cols: usize, nodata: f64) -> RasterResult<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(RasterError::SizeMismatch {
                name: "raster data".to_string(),
                expected: rows.saturating_mul(cols),
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            rows,
            cols,
            nodata,
            header: GridHeader::default(),
        })
    }

    /// 设置地理头信息
    pub fn with_header(mut self, header: GridHeader) -> Self {
        self.header = header;
        self
    }

    /// 单元总数
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否为空栅格
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 读取原始值，越界返回 `None`
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// 读取有效值，越界或无数据返回 `None`
    #[inline]
    pub fn valid_value(&self, row: usize, col: usize) -> Option<f64> {
        self.get(row, col).filter(|&v| !self.is_nodata_value(v))
    }

    /// 判断是否为无数据
    #[inline]
    pub fn is_nodata_value(&self, value: f64) -> bool {
        value.is_nan() || (self.nodata.is_finite() && (value - self.nodata).abs() < 1e-10)
    }

    /// 指定单元是否为无数据（越界视为无数据）
    #[inline]
    pub fn is_nodata(&self, row: usize, col: usize) -> bool {
        self.valid_value(row, col).is_none()
    }

    /// 有效单元数量
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&v| !self.is_nodata_value(v)).count()
    }

    /// 行列数是否与另一栅格一致
    pub fn same_extent(&self, other: &RasterData) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    /// 替换无数据值，已有的无数据单元同步改写为新值
    pub fn replace_nodata(&mut self, new_nodata: f64) {
        if self.nodata == new_nodata {
            return;
        }
        for i in 0..self.data.len() {
            if self.is_nodata_value(self.data[i]) {
                self.data[i] = new_nodata;
            }
        }
        self.nodata = new_nodata;
    }
}
