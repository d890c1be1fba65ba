// crates/gf_raster/src/lib.rs

//! 栅格数据访问
//!
//! 为汇流分层核心提供只读的二维栅格：行列数、无数据值、逐单元读取
//! 以及越界/无数据校验。
//!
//! # 模块
//!
//! - [`raster`]: 栅格数据容器 `RasterData`
//! - [`source`]: `RasterSource` 能力接口及两种实现（文件、内存目录）
//! - [`drivers`]: ESRI ASCII Grid 读写驱动，`gdal` feature 下的 GDAL 驱动
//! - [`error`]: 栅格错误类型
//!
//! # 示例
//!
//! ```
//! use gf_raster::{MemoryRasterSource, RasterData, RasterSource};
//!
//! let grid = RasterData::from_data(vec![1.0, 2.0, -9999.0, 4.0], 2, 2, -9999.0).unwrap();
//! let mut catalog = MemoryRasterSource::new();
//! catalog.insert("0_MASK", grid);
//!
//! let mask = catalog.load("0_MASK").unwrap();
//! assert_eq!(mask.valid_count(), 3);
//! ```

#![warn(missing_docs)]

pub mod drivers;
pub mod error;
pub mod raster;
pub mod source;

// 重导出常用类型
pub use drivers::ascii::{read_ascii_grid, write_ascii_grid};
pub use drivers::GridFormat;
pub use error::{RasterError, RasterResult};
pub use raster::{GridHeader, RasterData};
pub use source::{file_source, AsciiGridSource, MemoryRasterSource, RasterSource};

#[cfg(feature = "gdal")]
pub use drivers::gdal::{GdalDriver, GdalRasterSource};
