// crates/gf_raster/src/drivers/gdal/mod.rs

//! GDAL 栅格驱动
//!
//! 通过 GDAL 读取 GeoTIFF、ASCII Grid 等任意栅格格式的第一个波段，
//! 并以 GeoTIFF 写出分层栅格。
//!
//! # 依赖
//!
//! 需要启用 `gdal` feature 并安装 GDAL 库；未启用时文件读写退回
//! [`super::ascii`] 驱动。

mod driver;
mod error;

pub use driver::{write_gdal_grid, GdalDriver, GdalRasterSource};
pub use error::GdalError;
