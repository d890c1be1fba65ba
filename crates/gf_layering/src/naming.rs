// crates/gf_layering/src/naming.rs

//! 输入与输出命名约定
//!
//! 子流域编号 0 表示整个流域。邻接数组使用算法标签（`D8`/`DINF`/`MFDMD`），
//! 分层数组与目录模式的输入栅格使用算法后缀（D8 为空）。

use crate::model::FlowMethod;
use std::path::{Path, PathBuf};

/// 一个子流域、一种算法下的输出名称
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactNames {
    subbasin_id: u32,
    method: FlowMethod,
}

impl ArtifactNames {
    /// 创建
    pub const fn new(subbasin_id: u32, method: FlowMethod) -> Self {
        Self {
            subbasin_id,
            method,
        }
    }

    /// 子流域编号
    #[inline]
    pub fn subbasin_id(&self) -> u32 {
        self.subbasin_id
    }

    /// 流向算法
    #[inline]
    pub fn method(&self) -> FlowMethod {
        self.method
    }

    /// `{id}_FLOWIN_INDEX_{tag}`
    pub fn flow_in_index(&self) -> String {
        format!("{}_FLOWIN_INDEX_{}", self.subbasin_id, self.method.tag())
    }

    /// `{id}_FLOWOUT_INDEX_{tag}`
    pub fn flow_out_index(&self) -> String {
        format!("{}_FLOWOUT_INDEX_{}", self.subbasin_id, self.method.tag())
    }

    /// `{id}_FLOWIN_FRACTION_{tag}`
    pub fn flow_in_fraction(&self) -> String {
        format!("{}_FLOWIN_FRACTION_{}", self.subbasin_id, self.method.tag())
    }

    /// `{id}_FLOWOUT_FRACTION_{tag}`
    pub fn flow_out_fraction(&self) -> String {
        format!("{}_FLOWOUT_FRACTION_{}", self.subbasin_id, self.method.tag())
    }

    /// `{id}_ROUTING_LAYERS_UP_DOWN{suffix}`
    pub fn layers_up_down(&self) -> String {
        format!("{}_ROUTING_LAYERS_UP_DOWN{}", self.subbasin_id, self.method.suffix())
    }

    /// `{id}_ROUTING_LAYERS_DOWN_UP{suffix}`
    pub fn layers_down_up(&self) -> String {
        format!("{}_ROUTING_LAYERS_DOWN_UP{}", self.subbasin_id, self.method.suffix())
    }

    /// 全部数组名称（D8 不含比例数组）
    pub fn array_names(&self) -> Vec<String> {
        let mut names = vec![self.flow_in_index(), self.flow_out_index()];
        if self.method.is_fractional() {
            names.push(self.flow_in_fraction());
            names.push(self.flow_out_fraction());
        }
        names.push(self.layers_up_down());
        names.push(self.layers_down_up());
        names
    }
}

/// 目录模式下按名称查找的输入栅格
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogNames {
    subbasin_id: u32,
    method: FlowMethod,
}

impl CatalogNames {
    /// 创建
    pub const fn new(subbasin_id: u32, method: FlowMethod) -> Self {
        Self {
            subbasin_id,
            method,
        }
    }

    /// 流向栅格
    pub fn flow_dir(&self) -> String {
        format!("{}_FLOW_DIR{}", self.subbasin_id, self.method.suffix())
    }

    /// 掩膜栅格
    pub fn mask(&self) -> String {
        format!("{}_MASK", self.subbasin_id)
    }

    /// 比例栅格名称，D8 为空，MFD-md 按逆时针序号 1..=8
    pub fn fractions(&self) -> Vec<String> {
        match self.method {
            FlowMethod::D8 => Vec::new(),
            FlowMethod::Dinf => vec![format!("{}_FLOW_FRACTION_DINF", self.subbasin_id)],
            FlowMethod::MfdMd => (1..=8)
                .map(|k| format!("{}_FLOW_FRACTION_MFDMD_{k}", self.subbasin_id))
                .collect(),
        }
    }
}

/// MFD-md 八个比例文件的路径 `{core}_{k}.{ext}`
///
/// ```
/// use gf_layering::naming::mfd_fraction_paths;
/// use std::path::Path;
///
/// let paths = mfd_fraction_paths(Path::new("data/frac.asc"));
/// assert_eq!(paths[0], Path::new("data/frac_1.asc"));
/// assert_eq!(paths[7], Path::new("data/frac_8.asc"));
/// ```
pub fn mfd_fraction_paths(path: &Path) -> Vec<PathBuf> {
    let core = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());
    (1..=8)
        .map(|k| {
            let name = match &ext {
                Some(ext) => format!("{core}_{k}.{ext}"),
                None => format!("{core}_{k}"),
            };
            path.with_file_name(name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_d8_names() {
        let names = ArtifactNames::new(0, FlowMethod::D8);
        assert_eq!(names.flow_in_index(), "0_FLOWIN_INDEX_D8");
        assert_eq!(names.flow_out_index(), "0_FLOWOUT_INDEX_D8");
        assert_eq!(names.layers_up_down(), "0_ROUTING_LAYERS_UP_DOWN");
        assert_eq!(names.layers_down_up(), "0_ROUTING_LAYERS_DOWN_UP");
        assert_eq!(names.array_names().len(), 4);
    }

    #[test]
    fn test_fractional_names() {
        let names = ArtifactNames::new(3, FlowMethod::MfdMd);
        assert_eq!(names.flow_in_fraction(), "3_FLOWIN_FRACTION_MFDMD");
        assert_eq!(names.flow_out_fraction(), "3_FLOWOUT_FRACTION_MFDMD");
        assert_eq!(names.layers_down_up(), "3_ROUTING_LAYERS_DOWN_UP_MFDMD");
        assert_eq!(names.array_names().len(), 6);

        let dinf = ArtifactNames::new(1, FlowMethod::Dinf);
        assert_eq!(dinf.layers_up_down(), "1_ROUTING_LAYERS_UP_DOWN_DINF");
    }

    #[test]
    fn test_catalog_names() {
        let d8 = CatalogNames::new(2, FlowMethod::D8);
        assert_eq!(d8.flow_dir(), "2_FLOW_DIR");
        assert_eq!(d8.mask(), "2_MASK");
        assert!(d8.fractions().is_empty());

        let dinf = CatalogNames::new(2, FlowMethod::Dinf);
        assert_eq!(dinf.flow_dir(), "2_FLOW_DIR_DINF");
        assert_eq!(dinf.fractions(), vec!["2_FLOW_FRACTION_DINF".to_string()]);

        let mfd = CatalogNames::new(0, FlowMethod::MfdMd);
        let fr = mfd.fractions();
        assert_eq!(fr.len(), 8);
        assert_eq!(fr[4], "0_FLOW_FRACTION_MFDMD_5");
    }

    #[test]
    fn test_mfd_paths_without_extension() {
        let paths = mfd_fraction_paths(Path::new("frac"));
        assert_eq!(paths.len(), 8);
        assert_eq!(paths[2], Path::new("frac_3"));
    }
}
