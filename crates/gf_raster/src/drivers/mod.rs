// crates/gf_raster/src/drivers/mod.rs

//! 栅格文件驱动
//!
//! - [`ascii`]: ESRI ASCII Grid (`.asc`) 读写，始终可用
//! - `gdal`: 经 GDAL 读取任意格式、写出 GeoTIFF，需启用 `gdal` feature

pub mod ascii;

#[cfg(feature = "gdal")]
pub mod gdal;

pub use ascii::{parse_ascii_grid, read_ascii_grid, write_ascii_grid};

use crate::error::{RasterError, RasterResult};
use crate::raster::RasterData;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// 输出栅格格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridFormat {
    /// ESRI ASCII Grid
    #[default]
    #[serde(rename = "ascii")]
    AsciiGrid,
    /// GeoTIFF（GDAL `GTiff` 驱动）
    #[cfg(feature = "gdal")]
    GeoTiff,
}

impl GridFormat {
    /// 文件扩展名（不含点）
    pub fn extension(self) -> &'static str {
        match self {
            GridFormat::AsciiGrid => "asc",
            #[cfg(feature = "gdal")]
            GridFormat::GeoTiff => "tif",
        }
    }

    /// 以本格式写出栅格
    pub fn write(self, path: &Path, raster: &RasterData) -> RasterResult<()> {
        match self {
            GridFormat::AsciiGrid => write_ascii_grid(path, raster),
            #[cfg(feature = "gdal")]
            GridFormat::GeoTiff => self::gdal::write_gdal_grid(path, raster, "GTiff"),
        }
    }
}

impl fmt::Display for GridFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridFormat::AsciiGrid => f.write_str("ascii"),
            #[cfg(feature = "gdal")]
            GridFormat::GeoTiff => f.write_str("geotiff"),
        }
    }
}

impl FromStr for GridFormat {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" | "asc" => Ok(GridFormat::AsciiGrid),
            #[cfg(feature = "gdal")]
            "geotiff" | "gtiff" | "tif" => Ok(GridFormat::GeoTiff),
            _ => Err(RasterError::UnsupportedFormat {
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grid_format() {
        assert_eq!("ASC".parse::<GridFormat>().unwrap(), GridFormat::AsciiGrid);
        assert_eq!(GridFormat::default().extension(), "asc");
        assert!(matches!(
            "png".parse::<GridFormat>(),
            Err(RasterError::UnsupportedFormat { .. })
        ));
    }

    #[cfg(not(feature = "gdal"))]
    #[test]
    fn test_geotiff_needs_gdal_feature() {
        assert!("geotiff".parse::<GridFormat>().is_err());
    }

    #[cfg(feature = "gdal")]
    #[test]
    fn test_geotiff_extension() {
        assert_eq!("tif".parse::<GridFormat>().unwrap().extension(), "tif");
    }
}
