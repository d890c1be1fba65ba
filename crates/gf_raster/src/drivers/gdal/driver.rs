// crates/gf_raster/src/drivers/gdal/driver.rs

//! GDAL 栅格驱动实现

use super::error::GdalError;
use crate::drivers::ascii::DEFAULT_NODATA;
use crate::error::{RasterError, RasterResult};
use crate::raster::{GridHeader, RasterData};
use crate::source::{resolve_path, RasterSource};
use ::gdal::raster::Buffer;
use ::gdal::{Dataset, DriverManager};
use std::path::{Path, PathBuf};
use tracing::debug;

/// GDAL 栅格驱动
pub struct GdalDriver {
    dataset: Dataset,
    path: PathBuf,
}

impl GdalDriver {
    /// 打开栅格文件
    pub fn open(path: impl AsRef<Path>) -> RasterResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RasterError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let dataset = Dataset::open(path).map_err(|e| GdalError::OpenFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            dataset,
            path: path.to_path_buf(),
        })
    }

    /// (行数, 列数)
    pub fn shape(&self) -> (usize, usize) {
        let (width, height) = self.dataset.raster_size();
        (height, width)
    }

    /// 波段数
    pub fn band_count(&self) -> usize {
        self.dataset.raster_count() as usize
    }

    /// 地理头信息，北向上的仿射变换换算为左下角坐标
    pub fn header(&self) -> RasterResult<GridHeader> {
        let gt = self.dataset.geo_transform().map_err(GdalError::from)?;
        let (rows, _) = self.shape();
        Ok(GridHeader {
            xll: gt[0],
            yll: gt[3] + rows as f64 * gt[5],
            cell_size: gt[1].abs(),
        })
    }

    /// 读取指定波段 (从 1 开始)
    pub fn read_band(&self, band_idx: usize) -> RasterResult<RasterData> {
        if band_idx == 0 || band_idx > self.band_count() {
            return Err(GdalError::BandNotFound(band_idx).into());
        }
        let band = self
            .dataset
            .rasterband(band_idx as _)
            .map_err(GdalError::from)?;
        let nodata = band.no_data_value().unwrap_or(DEFAULT_NODATA);

        let (rows, cols) = self.shape();
        let buffer: Buffer<f64> = band
            .read_as::<f64>((0, 0), (cols, rows), (cols, rows), None)
            .map_err(|e| GdalError::ReadFailed(format!("{}: {e}", self.path.display())))?;
        let (_, data) = buffer.into_shape_and_vec();

        let header = self.header()?;
        let raster = RasterData::from_data(data, rows, cols, nodata)?.with_header(header);
        debug!(
            "GDAL 读取 {} 波段 {band_idx}: {rows} 行 x {cols} 列, 有效单元 {}",
            self.path.display(),
            raster.valid_count()
        );
        Ok(raster)
    }
}

/// 以指定 GDAL 驱动写出单波段 `f64` 栅格
pub fn write_gdal_grid(path: &Path, raster: &RasterData, driver_name: &str) -> RasterResult<()> {
    let driver = DriverManager::get_driver_by_name(driver_name).map_err(GdalError::from)?;
    let mut dataset = driver
        .create_with_band_type::<f64, _>(path, raster.cols as _, raster.rows as _, 1)
        .map_err(|e| GdalError::WriteFailed(format!("{}: {e}", path.display())))?;

    let cs = raster.header.cell_size;
    let top = raster.header.yll + raster.rows as f64 * cs;
    dataset
        .set_geo_transform(&[raster.header.xll, cs, 0.0, top, 0.0, -cs])
        .map_err(GdalError::from)?;

    let mut band = dataset.rasterband(1).map_err(GdalError::from)?;
    band.set_no_data_value(Some(raster.nodata))
        .map_err(GdalError::from)?;
    let mut buffer = Buffer::new((raster.cols, raster.rows), raster.data.clone());
    band.write((0, 0), (raster.cols, raster.rows), &mut buffer)
        .map_err(|e| GdalError::WriteFailed(format!("{}: {e}", path.display())))?;
    debug!("GDAL ({driver_name}) 写出 {}", path.display());
    Ok(())
}

/// GDAL 文件数据源
///
/// 名称为文件路径；相对路径基于 `root` 解析，读取第一个波段。
#[derive(Debug, Clone, Default)]
pub struct GdalRasterSource {
    root: Option<PathBuf>,
}

impl GdalRasterSource {
    /// 使用当前工作目录解析相对路径
    pub fn new() -> Self {
        Self { root: None }
    }

    /// 指定相对路径的根目录
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }
}

impl RasterSource for GdalRasterSource {
    fn backend(&self) -> &'static str {
        "gdal"
    }

    fn exists(&self, name: &str) -> bool {
        resolve_path(self.root.as_deref(), name).is_file()
    }

    fn load(&self, name: &str) -> RasterResult<RasterData> {
        GdalDriver::open(resolve_path(self.root.as_deref(), name))?.read_band(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = GdalRasterSource::new().load("/definitely/not/here.tif").unwrap_err();
        assert!(matches!(err, RasterError::FileNotFound { .. }));
    }

    #[test]
    fn test_geotiff_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layers.tif");
        let grid = RasterData::from_data(vec![0.0, 1.0, -9999.0, 2.0], 2, 2, -9999.0)
            .unwrap()
            .with_header(GridHeader {
                xll: 100.0,
                yll: 200.0,
                cell_size: 30.0,
            });
        write_gdal_grid(&path, &grid, "GTiff").unwrap();

        let back = GdalRasterSource::with_root(dir.path()).load("layers.tif").unwrap();
        assert_eq!(back.data, grid.data);
        assert_eq!(back.nodata, -9999.0);
        assert_eq!(back.header, grid.header);
    }
}
