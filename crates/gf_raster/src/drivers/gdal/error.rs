// crates/gf_raster/src/drivers/gdal/error.rs

//! GDAL 错误类型

use thiserror::Error;

/// GDAL 驱动错误
#[derive(Error, Debug)]
pub enum GdalError {
    /// 打开数据集失败
    #[error("打开数据集失败: {path}: {message}")]
    OpenFailed {
        /// 数据集路径
        path: String,
        /// GDAL 返回的信息
        message: String,
    },

    /// 波段不存在
    #[error("波段 {0} 不存在")]
    BandNotFound(usize),

    /// 读取波段失败
    #[error("读取波段失败: {0}")]
    ReadFailed(String),

    /// 写出失败
    #[error("写出栅格失败: {0}")]
    WriteFailed(String),

    /// 其他 GDAL 错误
    #[error("GDAL 错误: {0}")]
    Other(String),
}

impl From<::gdal::errors::GdalError> for GdalError {
    fn from(e: ::gdal::errors::GdalError) -> Self {
        GdalError::Other(e.to_string())
    }
}
