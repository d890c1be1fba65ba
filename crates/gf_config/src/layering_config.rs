// crates/gf_config/src/layering_config.rs

//! 批量分层配置
//!
//! ```json
//! {
//!   "output_dir": "output",
//!   "method": "DINF",
//!   "subbasins": [
//!     { "id": 0, "flow_dir": "fd_dinf.asc", "mask": "mask.asc", "fraction": "frac.asc" }
//!   ]
//! }
//! ```
//!
//! 子流域的相对路径基于 `input_dir` 解析（缺省为当前目录）。

use crate::error::ConfigError;
use gf_layering::{
    FlowMethod, GridLayering, InputNames, DEFAULT_FRACTION_TOLERANCE, DEFAULT_OUT_NODATA,
};
use gf_raster::GridFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// 批量分层配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayeringConfig {
    /// 输入根目录
    #[serde(default)]
    pub input_dir: Option<PathBuf>,

    /// 输出目录
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// 流向算法
    #[serde(default)]
    pub method: FlowMethod,

    /// 流出比例之和的容差
    #[serde(default = "default_tolerance")]
    pub fraction_tolerance: f64,

    /// 输出无数据值
    #[serde(default = "default_out_nodata")]
    pub out_nodata: f64,

    /// 是否写出文本表
    #[serde(default = "default_true")]
    pub write_text: bool,

    /// 分层栅格输出格式
    #[serde(default)]
    pub grid_format: GridFormat,

    /// 子流域列表
    #[serde(default)]
    pub subbasins: Vec<SubbasinInputs>,
}

fn default_output_dir() -> PathBuf { PathBuf::from("output") }
fn default_tolerance() -> f64 { DEFAULT_FRACTION_TOLERANCE }
fn default_out_nodata() -> f64 { DEFAULT_OUT_NODATA }
fn default_true() -> bool { true }

/// 单个子流域的输入文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubbasinInputs {
    /// 子流域编号，0 为整个流域
    pub id: u32,
    /// 流向栅格
    pub flow_dir: PathBuf,
    /// 掩膜栅格，缺省时流向栅格兼作掩膜
    #[serde(default)]
    pub mask: Option<PathBuf>,
    /// 比例栅格（Dinf 为单个文件，MFD-md 为八个文件的公共前缀）
    #[serde(default)]
    pub fraction: Option<PathBuf>,
}

impl SubbasinInputs {
    /// 转换为数据源可解析的名称
    pub fn input_names(&self, method: FlowMethod) -> InputNames {
        InputNames::from_paths(
            method,
            &self.flow_dir,
            self.mask.as_deref(),
            self.fraction.as_deref(),
        )
    }
}

impl Default for LayeringConfig {
    fn default() -> Self {
        Self {
            input_dir: None,
            output_dir: default_output_dir(),
            method: FlowMethod::default(),
            fraction_tolerance: default_tolerance(),
            out_nodata: default_out_nodata(),
            write_text: true,
            grid_format: GridFormat::default(),
            subbasins: Vec::new(),
        }
    }
}

impl LayeringConfig {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// 从 JSON 文本解析并验证
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: LayeringConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fraction_tolerance > 0.0 && self.fraction_tolerance < 1.0) {
            return Err(ConfigError::invalid(
                "fraction_tolerance",
                self.fraction_tolerance,
                "必须在 (0, 1) 范围内",
            ));
        }
        if !self.out_nodata.is_finite() {
            return Err(ConfigError::invalid("out_nodata", self.out_nodata, "必须为有限值"));
        }

        let mut seen = HashSet::new();
        for sub in &self.subbasins {
            if !seen.insert(sub.id) {
                return Err(ConfigError::DuplicateSubbasin(sub.id));
            }
            if sub.flow_dir.as_os_str().is_empty() {
                return Err(ConfigError::Missing(format!("subbasins[{}].flow_dir", sub.id)));
            }
            if self.method.is_fractional() && sub.fraction.is_none() {
                return Err(ConfigError::Missing(format!(
                    "subbasins[{}].fraction ({} 需要比例栅格)",
                    sub.id, self.method
                )));
            }
        }
        Ok(())
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }

    /// 为子流域创建引擎
    pub fn engine_for(&self, sub: &SubbasinInputs) -> GridLayering {
        GridLayering::new(sub.id, self.method)
            .with_tolerance(self.fraction_tolerance)
            .with_out_nodata(self.out_nodata)
    }
}
