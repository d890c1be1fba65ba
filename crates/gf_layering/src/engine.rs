// crates/gf_layering/src/engine.rs

//! 子流域分层引擎
//!
//! 每个 [`GridLayering`] 实例绑定一个子流域和一种流向算法：
//!
//! 1. [`GridLayering::load_data`] 从数据源读取并校验输入栅格，所有权转移给实例；
//! 2. [`GridLayering::build`] 依次执行索引、反向流向、计数、邻接、两次分层，
//!    结果全部暂存在内存中；
//! 3. [`GridLayering::execute`] 在构建成功后才写出产物，任何一步失败都不写出。
//!
//! 实例之间没有共享的可变状态，多个子流域可以各用一个实例并发处理。

use crate::adjacency::{build_flow_in, build_flow_out, AdjacencyArrays};
use crate::cell_index::ValidCellIndex;
use crate::degree::DegreeCounts;
use crate::error::{LayeringError, LayeringResult};
use crate::layering::{layer_down_up, layer_up_down, LayerAssignment};
use crate::model::{FlowMethod, FlowModel};
use crate::naming::{mfd_fraction_paths, ArtifactNames, CatalogNames};
use crate::output::{format_adjacency_table, ArtifactStore, TableKind};
use crate::ragged::RaggedArray;
use crate::reverse::build_reverse_directions;
use gf_foundation::require;
use gf_foundation::validation::ValidationReport;
use gf_raster::{GridHeader, RasterData, RasterSource};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, error, info};

/// 默认比例和容差
pub const DEFAULT_FRACTION_TOLERANCE: f64 = 1e-4;
/// 默认输出无数据值
pub const DEFAULT_OUT_NODATA: f64 = -9999.0;

/// 输入栅格名称
///
/// 名称交由 [`RasterSource`] 解析：文件后端为路径，目录后端为目录中的名称。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputNames {
    /// 流向栅格
    pub flow_dir: String,
    /// 掩膜栅格，`None` 表示流向栅格兼作掩膜
    pub mask: Option<String>,
    /// 比例栅格，数量由算法决定
    pub fractions: Vec<String>,
}

impl InputNames {
    /// 目录模式下的约定名称
    pub fn catalog(subbasin_id: u32, method: FlowMethod) -> Self {
        let names = CatalogNames::new(subbasin_id, method);
        Self {
            flow_dir: names.flow_dir(),
            mask: Some(names.mask()),
            fractions: names.fractions(),
        }
    }

    /// 文件模式
    ///
    /// 掩膜路径与流向路径相同时流向栅格兼作掩膜；MFD-md 的比例路径
    /// 展开为 `{core}_{k}.{ext}` 八个文件。
    pub fn from_paths(
        method: FlowMethod,
        flow_dir: &Path,
        mask: Option<&Path>,
        fraction: Option<&Path>,
    ) -> Self {
        let to_name = |p: &Path| p.to_string_lossy().into_owned();
        let mask = mask.filter(|m| *m != flow_dir).map(to_name);
        let fractions = match (method, fraction) {
            (FlowMethod::D8, _) | (_, None) => Vec::new(),
            (FlowMethod::Dinf, Some(f)) => vec![to_name(f)],
            (FlowMethod::MfdMd, Some(f)) => mfd_fraction_paths(f).iter().map(|p| to_name(p.as_path())).collect(),
        };
        Self {
            flow_dir: to_name(flow_dir),
            mask,
            fractions,
        }
    }

    fn all(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.flow_dir.as_str())
            .chain(self.mask.as_deref())
            .chain(self.fractions.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone)]
struct LoadedGrids {
    flow_dir: RasterData,
    mask: Option<RasterData>,
    fractions: Vec<RasterData>,
}

impl LoadedGrids {
    fn mask(&self) -> &RasterData {
        self.mask.as_ref().unwrap_or(&self.flow_dir)
    }
}

/// 子流域分层引擎
#[derive(Debug, Clone)]
pub struct GridLayering {
    subbasin_id: u32,
    method: FlowMethod,
    tolerance: f64,
    out_nodata: f64,
    grids: Option<LoadedGrids>,
}

impl GridLayering {
    /// 创建引擎
    pub fn new(subbasin_id: u32, method: FlowMethod) -> Self {
        Self {
            subbasin_id,
            method,
            tolerance: DEFAULT_FRACTION_TOLERANCE,
            out_nodata: DEFAULT_OUT_NODATA,
            grids: None,
        }
    }

    /// 设置比例和容差
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// 设置输出无数据值
    pub fn with_out_nodata(mut self, nodata: f64) -> Self {
        self.out_nodata = nodata;
        self
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

    /// 输出名称
    #[inline]
    pub fn names(&self) -> ArtifactNames {
        ArtifactNames::new(self.subbasin_id, self.method)
    }

    /// 是否已加载输入
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.grids.is_some()
    }

    /// 从数据源加载输入
    pub fn load_data(&mut self, source: &dyn RasterSource, names: &InputNames) -> LayeringResult<()> {
        info!(
            "子流域 {} ({}) 从 {} 加载输入: {}",
            self.subbasin_id,
            self.method,
            source.backend(),
            names.flow_dir
        );
        for name in names.all() {
            if !source.exists(name) {
                error!("子流域 {} 缺少输入栅格 {}", self.subbasin_id, name);
                return Err(LayeringError::io(name, format!("{} 中不存在", source.backend())));
            }
        }

        let flow_dir = source.load(&names.flow_dir)?;
        let mask = names.mask.as_deref().map(|m| source.load(m)).transpose()?;
        let fractions = names
            .fractions
            .iter()
            .map(|f| source.load(f))
            .collect::<Result<Vec<_>, _>>()?;
        self.load_grids(flow_dir, mask, fractions)
    }

    /// 使用已加载的栅格
    ///
    /// 校验掩膜、流向与比例栅格之间的一致性，流向栅格的无数据值统一改写为
    /// 输出无数据值。
    pub fn load_grids(
        &mut self,
        mut flow_dir: RasterData,
        mut mask: Option<RasterData>,
        fractions: Vec<RasterData>,
    ) -> LayeringResult<()> {
        self.grids = None;
        flow_dir.replace_nodata(self.out_nodata);
        if let Some(m) = mask.as_mut() {
            m.replace_nodata(self.out_nodata);
        }

        if let Some(m) = &mask {
            check_coverage("流向栅格", m, &flow_dir)?;
        }
        let mask_ref = mask.as_ref().unwrap_or(&flow_dir);

        if fractions.len() != self.method.fraction_layers() {
            error!(
                "子流域 {} ({}) 需要 {} 个比例栅格, 实际 {}",
                self.subbasin_id,
                self.method,
                self.method.fraction_layers(),
                fractions.len()
            );
            return Err(LayeringError::configuration(format!(
                "{} 需要 {} 个比例栅格, 实际 {}",
                self.method,
                self.method.fraction_layers(),
                fractions.len()
            )));
        }
        match self.method {
            FlowMethod::D8 => {}
            FlowMethod::Dinf => check_coverage("比例栅格", mask_ref, &fractions[0])?,
            FlowMethod::MfdMd => {
                for (k, f) in fractions.iter().enumerate() {
                    check_extent(&format!("第 {} 个比例栅格", k + 1), mask_ref, f)?;
                }
            }
        }

        debug!(
            "子流域 {} 输入校验通过: {} x {}, 有效单元 {}",
            self.subbasin_id,
            flow_dir.rows,
            flow_dir.cols,
            mask_ref.valid_count()
        );
        self.grids = Some(LoadedGrids {
            flow_dir,
            mask,
            fractions,
        });
        Ok(())
    }

    /// 在内存中完成全部构建
    pub fn build(&self) -> LayeringResult<LayeringOutput> {
        let grids = require!(
            self.grids.as_ref(),
            LayeringError::configuration(format!("子流域 {} 尚未加载输入", self.subbasin_id))
        );

        let index = ValidCellIndex::from_mask(grids.mask());
        let model = FlowModel::load(self.method, &index, &grids.flow_dir, &grids.fractions)?;
        let reverse = build_reverse_directions(&index, &model);
        let mut degrees = DegreeCounts::count(&index, &model, &reverse);
        let declared_in = degrees.total_in();

        let mut report = ValidationReport::new();
        let flow_in = build_flow_in(&index, &model, &reverse, &mut degrees)?;
        let flow_out = build_flow_out(&index, &model, &degrees, self.tolerance, &mut report)?;

        let up_down = layer_up_down(&degrees, &flow_out.adjacency)?;
        let down_up = layer_down_up(&degrees, &flow_in.adjacency)?;
        let up_down_array = up_down.to_ragged("routing_layers_up_down")?;
        let down_up_array = down_up.to_ragged("routing_layers_down_up")?;

        Ok(LayeringOutput {
            names: self.names(),
            header: grids.flow_dir.header,
            out_nodata: self.out_nodata,
            dropped_in_edges: declared_in - degrees.total_in(),
            index,
            flow_in,
            flow_out,
            up_down,
            down_up,
            up_down_array,
            down_up_array,
            report,
        })
    }

    /// 构建并写出全部产物
    pub fn execute(&self, store: &mut dyn ArtifactStore) -> LayeringResult<LayeringSummary> {
        let output = self.build()?;
        output.persist(store)?;
        let summary = output.summary();
        info!(
            "子流域 {} ({}) 分层完成: {} 个有效单元, 自上而下 {} 层, 自下而上 {} 层, 比例警告 {} 条",
            summary.subbasin_id,
            summary.method,
            summary.n_valid,
            summary.up_down_layers,
            summary.down_up_layers,
            summary.fraction_warnings
        );
        Ok(summary)
    }
}

/// 掩膜有效单元必须与目标栅格的有效单元完全一致
fn check_coverage(what: &str, mask: &RasterData, grid: &RasterData) -> LayeringResult<()> {
    check_extent(what, mask, grid)?;
    let (mask_valid, grid_valid) = (mask.valid_count(), grid.valid_count());
    if mask_valid != grid_valid {
        error!("{what}有效单元数 {grid_valid} 与掩膜 {mask_valid} 不一致");
        return Err(LayeringError::configuration(format!(
            "{what}有效单元数 {grid_valid} 与掩膜 {mask_valid} 不一致"
        )));
    }
    for row in 0..mask.rows {
        for col in 0..mask.cols {
            if !mask.is_nodata(row, col) && grid.is_nodata(row, col) {
                error!("{what}在掩膜有效单元 ({row}, {col}) 处为无数据");
                return Err(LayeringError::configuration(format!(
                    "{what}在掩膜有效单元 ({row}, {col}) 处为无数据"
                )));
            }
        }
    }
    Ok(())
}

fn check_extent(what: &str, mask: &RasterData, grid: &RasterData) -> LayeringResult<()> {
    if !mask.same_extent(grid) {
        error!(
            "{what}范围 {} x {} 与掩膜 {} x {} 不一致",
            grid.rows, grid.cols, mask.rows, mask.cols
        );
        return Err(LayeringError::configuration(format!(
            "{what}范围 {} x {} 与掩膜 {} x {} 不一致",
            grid.rows, grid.cols, mask.rows, mask.cols
        )));
    }
    Ok(())
}

/// 暂存在内存中的构建结果
#[derive(Debug, Clone)]
pub struct LayeringOutput {
    names: ArtifactNames,
    header: GridHeader,
    out_nodata: f64,
    dropped_in_edges: usize,
    /// 有效单元索引
    pub index: ValidCellIndex,
    /// 流入邻接
    pub flow_in: AdjacencyArrays,
    /// 流出邻接
    pub flow_out: AdjacencyArrays,
    /// 自上而下分层
    pub up_down: LayerAssignment,
    /// 自下而上分层
    pub down_up: LayerAssignment,
    /// 自上而下分层数组
    pub up_down_array: RaggedArray,
    /// 自下而上分层数组
    pub down_up_array: RaggedArray,
    /// 比例和偏差等非致命问题
    pub report: ValidationReport,
}

impl LayeringOutput {
    /// 输出名称
    pub fn names(&self) -> ArtifactNames {
        self.names
    }

    /// 按栅格展开的层号
    pub fn layer_grid(&self, layers: &LayerAssignment) -> LayeringResult<RasterData> {
        let data = layers.to_grid(&self.index, self.out_nodata);
        Ok(
            RasterData::from_data(data, self.index.rows(), self.index.cols(), self.out_nodata)?
                .with_header(self.header),
        )
    }

    /// 写出全部产物
    ///
    /// 栅格在写出前全部生成；全部产物暂存成功后一次发布，
    /// 任何一步失败都丢弃暂存内容，不留下部分输出。
    pub fn persist(&self, store: &mut dyn ArtifactStore) -> LayeringResult<()> {
        let up_grid = self.layer_grid(&self.up_down)?;
        let down_grid = self.layer_grid(&self.down_up)?;

        match self
            .stage_all(store, &up_grid, &down_grid)
            .and_then(|()| store.commit())
        {
            Ok(n) => {
                debug!(
                    "子流域 {} 的 {n} 个产物已写入 {}",
                    self.names.subbasin_id(),
                    store.backend()
                );
                Ok(())
            }
            Err(e) => {
                store.discard();
                error!("子流域 {} 产物写出失败: {e}", self.names.subbasin_id());
                Err(e)
            }
        }
    }

    fn stage_all(
        &self,
        store: &mut dyn ArtifactStore,
        up_grid: &RasterData,
        down_grid: &RasterData,
    ) -> LayeringResult<()> {
        let names = self.names;
        store.put_array(&names.flow_in_index(), self.flow_in.ids.as_slice())?;
        store.put_array(&names.flow_out_index(), self.flow_out.ids.as_slice())?;
        if let Some(f) = &self.flow_in.fractions {
            store.put_array(&names.flow_in_fraction(), f.as_slice())?;
        }
        if let Some(f) = &self.flow_out.fractions {
            store.put_array(&names.flow_out_fraction(), f.as_slice())?;
        }
        store.put_array(&names.layers_up_down(), self.up_down_array.as_slice())?;
        store.put_array(&names.layers_down_up(), self.down_up_array.as_slice())?;

        store.put_table(
            &names.flow_in_index(),
            &format_adjacency_table(&self.flow_in.adjacency, TableKind::Upstream),
        )?;
        store.put_table(
            &names.flow_out_index(),
            &format_adjacency_table(&self.flow_out.adjacency, TableKind::Downstream),
        )?;

        store.put_grid(&names.layers_up_down(), up_grid)?;
        store.put_grid(&names.layers_down_up(), down_grid)
    }

    /// 汇总信息
    pub fn summary(&self) -> LayeringSummary {
        LayeringSummary {
            subbasin_id: self.names.subbasin_id(),
            method: self.names.method(),
            n_valid: self.index.n_valid(),
            flow_in_edges: self.flow_in.adjacency.edge_count(),
            flow_out_edges: self.flow_out.adjacency.edge_count(),
            dropped_in_edges: self.dropped_in_edges,
            up_down_layers: self.up_down.n_layers(),
            down_up_layers: self.down_up.n_layers(),
            widest_up_down: self.up_down.widest(),
            widest_down_up: self.down_up.widest(),
            fraction_warnings: self.report.warning_count(),
        }
    }
}

/// 一次分层的汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayeringSummary {
    /// 子流域编号
    pub subbasin_id: u32,
    /// 流向算法
    pub method: FlowMethod,
    /// 有效单元数
    pub n_valid: usize,
    /// 流入边数
    pub flow_in_edges: usize,
    /// 流出边数
    pub flow_out_edges: usize,
    /// 未通过互证检查的入边数
    pub dropped_in_edges: usize,
    /// 自上而下层数
    pub up_down_layers: usize,
    /// 自下而上层数
    pub down_up_layers: usize,
    /// 自上而下最宽层
    pub widest_up_down: usize,
    /// 自下而上最宽层
    pub widest_down_up: usize,
    /// 比例和偏差警告数
    pub fraction_warnings: usize,
}
