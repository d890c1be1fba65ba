// crates/gf_raster/src/source.rs

//! 栅格数据源
//!
//! `RasterSource` 按名称加载二维栅格。文件后端与内存目录后端在构造时
//! 选择，调用方只依赖 trait 对象。

use crate::drivers::ascii::read_ascii_grid;
use crate::error::{RasterError, RasterResult};
use crate::raster::RasterData;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 栅格数据源 trait
pub trait RasterSource: Send + Sync {
    /// 后端描述，用于日志
    fn backend(&self) -> &'static str;

    /// 指定名称的栅格是否存在
    fn exists(&self, name: &str) -> bool;

    /// 加载栅格，所有权转移给调用方
    fn load(&self, name: &str) -> RasterResult<RasterData>;
}

// ============================================================
// 文件后端
// ============================================================

/// ASCII Grid 文件数据源
///
/// 名称为文件路径；相对路径基于 `root` 解析。
#[derive(Debug, Clone, Default)]
pub struct AsciiGridSource {
    root: Option<PathBuf>,
}

impl AsciiGridSource {
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

    /// 解析完整路径
    pub fn resolve(&self, name: &str) -> PathBuf {
        resolve_path(self.root.as_deref(), name)
    }
}

impl RasterSource for AsciiGridSource {
    fn backend(&self) -> &'static str {
        "ascii-grid"
    }

    fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_file()
    }

    fn load(&self, name: &str) -> RasterResult<RasterData> {
        read_ascii_grid(&self.resolve(name))
    }
}

/// 相对路径基于 `root` 解析，绝对路径原样返回
pub(crate) fn resolve_path(root: Option<&Path>, name: &str) -> PathBuf {
    let path = Path::new(name);
    match root {
        Some(root) if path.is_relative() => root.join(path),
        _ => path.to_path_buf(),
    }
}

/// 按编译特性选择文件后端：启用 `gdal` 时读取任意 GDAL 格式，否则读取 ASCII Grid
pub fn file_source(root: Option<&Path>) -> Box<dyn RasterSource> {
    #[cfg(feature = "gdal")]
    {
        Box::new(match root {
            Some(root) => crate::drivers::gdal::GdalRasterSource::with_root(root),
            None => crate::drivers::gdal::GdalRasterSource::new(),
        })
    }
    #[cfg(not(feature = "gdal"))]
    {
        Box::new(match root {
            Some(root) => AsciiGridSource::with_root(root),
            None => AsciiGridSource::new(),
        })
    }
}

// ============================================================
// 内存目录后端
// ============================================================

/// 内存中的命名栅格目录
///
/// 与数据库后端行为一致：按名称存取，名称不存在时返回 `UnknownGrid`。
#[derive(Debug, Clone, Default)]
pub struct MemoryRasterSource {
    grids: HashMap<String, RasterData>,
}

impl MemoryRasterSource {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或替换栅格
    pub fn insert(&mut self, name: impl Into<String>, raster: RasterData) {
        let name = name.into();
        debug!("内存目录登记栅格 {} ({} x {})", name, raster.rows, raster.cols);
        self.grids.insert(name, raster);
    }

    /// 链式插入
    pub fn with(mut self, name: impl Into<String>, raster: RasterData) -> Self {
        self.insert(name, raster);
        self
    }

    /// 已登记的栅格数量
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    /// 目录是否为空
    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

impl RasterSource for MemoryRasterSource {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn exists(&self, name: &str) -> bool {
        self.grids.contains_key(name)
    }

    fn load(&self, name: &str) -> RasterResult<RasterData> {
        self.grids
            .get(name)
            .cloned()
            .ok_or_else(|| RasterError::UnknownGrid {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_roundtrip() {
        let grid = RasterData::new(2, 2, -9999.0);
        let source = MemoryRasterSource::new().with("0_MASK", grid.clone());
        assert!(source.exists("0_MASK"));
        assert_eq!(source.load("0_MASK").unwrap(), grid);
    }

    #[test]
    fn test_memory_source_unknown() {
        let source = MemoryRasterSource::new();
        let err = source.load("missing").unwrap_err();
        assert!(matches!(err, RasterError::UnknownGrid { .. }));
    }

    #[test]
    fn test_ascii_source_resolve() {
        let source = AsciiGridSource::with_root("/data");
        assert_eq!(source.resolve("fd.asc"), PathBuf::from("/data/fd.asc"));
        assert_eq!(source.resolve("/abs/fd.asc"), PathBuf::from("/abs/fd.asc"));
    }

    #[test]
    fn test_file_source_reads_ascii_grid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("mask.asc"),
            "ncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\nNODATA_value -9999\n1 -9999\n",
        )
        .unwrap();
        let source = file_source(Some(dir.path()));
        assert!(source.exists("mask.asc"));
        assert_eq!(source.load("mask.asc").unwrap().valid_count(), 1);
    }

    #[test]
    fn test_ascii_source_missing_file() {
        let source = AsciiGridSource::new();
        let err = source.load("/definitely/not/here.asc").unwrap_err();
        assert!(matches!(err, RasterError::FileNotFound { .. }));
    }
}
