// crates/gf_layering/src/adjacency.rs

//! 上下游邻接构建
//!
//! 邻接关系内部以 CSR 形式保存，输出时编码为 [`RaggedArray`]。
//!
//! # 入边的互证检查
//!
//! 反向流向声明的每条入边都要由供水单元自身的流向确认：供水单元必须有效，
//! 其流向集合必须包含指回当前单元的比特，多流向算法下该方向的比例必须
//! 存在且非负。未通过检查的入边被丢弃，同时当前单元的上游计数同步减少，
//! 因此写出的数组长度始终等于按计数预计算的长度。

use crate::cell_index::ValidCellIndex;
use crate::degree::DegreeCounts;
use crate::direction::CompressedDirection;
use crate::error::{LayeringError, LayeringResult};
use crate::model::FlowModel;
use crate::ragged::{RaggedArray, RaggedWriter};
use gf_foundation::index::CellId;
use gf_foundation::validation::{ValidationReport, ValidationWarning};
use tracing::{debug, error, warn};

/// CSR 邻接表
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Adjacency {
    offsets: Vec<usize>,
    neighbors: Vec<CellId>,
    fractions: Option<Vec<f64>>,
}

impl Adjacency {
    fn with_capacity(n_cells: usize, edges: usize, fractional: bool) -> Self {
        let mut offsets = Vec::with_capacity(n_cells + 1);
        offsets.push(0);
        Self {
            offsets,
            neighbors: Vec::with_capacity(edges),
            fractions: fractional.then(|| Vec::with_capacity(edges)),
        }
    }

    fn push(&mut self, neighbor: CellId, fraction: Option<f64>) {
        self.neighbors.push(neighbor);
        if let Some(fracs) = self.fractions.as_mut() {
            fracs.push(fraction.unwrap_or(0.0));
        }
    }

    fn close_row(&mut self) {
        self.offsets.push(self.neighbors.len());
    }

    /// 单元数量
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// 边总数
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.neighbors.len()
    }

    /// 单元的邻居
    #[inline]
    pub fn neighbors(&self, cell: CellId) -> &[CellId] {
        let i = cell.get();
        &self.neighbors[self.offsets[i]..self.offsets[i + 1]]
    }

    /// 单元各边的比例（仅多流向算法）
    #[inline]
    pub fn fractions(&self, cell: CellId) -> Option<&[f64]> {
        let i = cell.get();
        self.fractions
            .as_ref()
            .map(|f| &f[self.offsets[i]..self.offsets[i + 1]])
    }

    /// 单元的邻居数量
    #[inline]
    pub fn count(&self, cell: CellId) -> usize {
        let i = cell.get();
        self.offsets[i + 1] - self.offsets[i]
    }

    /// 全部单元的邻居数量
    pub fn counts(&self) -> Vec<u32> {
        self.offsets.windows(2).map(|w| (w[1] - w[0]) as u32).collect()
    }

    /// 是否带比例
    #[inline]
    pub fn is_fractional(&self) -> bool {
        self.fractions.is_some()
    }

    /// 编码邻居编号数组
    pub fn encode_ids(&self, name: &'static str, expected_edges: usize) -> LayeringResult<RaggedArray> {
        let n = self.n_cells();
        let mut writer = RaggedWriter::new(name, n, RaggedArray::expected_len(n, expected_edges));
        for i in 0..n {
            writer.push_row(self.neighbors(CellId::new(i)).iter().map(|c| c.get() as f64));
        }
        writer.finish()
    }

    /// 编码比例数组，与编号数组同形，比例替换编号
    pub fn encode_fractions(
        &self,
        name: &'static str,
        expected_edges: usize,
    ) -> LayeringResult<Option<RaggedArray>> {
        let Some(all) = self.fractions.as_ref() else {
            return Ok(None);
        };
        let n = self.n_cells();
        let mut writer = RaggedWriter::new(name, n, RaggedArray::expected_len(n, expected_edges));
        for i in 0..n {
            writer.push_row(all[self.offsets[i]..self.offsets[i + 1]].iter().copied());
        }
        writer.finish().map(Some)
    }
}

/// 邻接表及其扁平编码
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyArrays {
    /// 邻接表
    pub adjacency: Adjacency,
    /// 编号数组
    pub ids: RaggedArray,
    /// 比例数组（仅多流向算法）
    pub fractions: Option<RaggedArray>,
}

// ============================================================
// 上游（流入）
// ============================================================

/// 构建流入邻接
///
/// 被丢弃的入边会同步从 `degrees.in_degree` 中扣除。
pub fn build_flow_in(
    index: &ValidCellIndex,
    model: &FlowModel,
    reverse: &[CompressedDirection],
    degrees: &mut DegreeCounts,
) -> LayeringResult<AdjacencyArrays> {
    if reverse.len() != index.n_valid() || degrees.in_degree.len() != index.n_valid() {
        return Err(LayeringError::consistency(format!(
            "反向流向长度 {} / 入度长度 {} 与有效单元数 {} 不一致",
            reverse.len(),
            degrees.in_degree.len(),
            index.n_valid()
        )));
    }

    let fractional = model.method().is_fractional();
    let mut adj = Adjacency::with_capacity(index.n_valid(), degrees.total_in(), fractional);
    let mut dropped_total = 0usize;

    for (id, row, col) in index.iter() {
        let mut retained = 0u32;
        for d in reverse[id.get()].iter() {
            let Some(source) = index.neighbor(row, col, d.offset()) else {
                debug!("单元 {id} ({row}, {col}) 的上游 {d} 不是有效单元, 丢弃");
                continue;
            };
            let source_out = d.reverse();
            if !model.direction(source).contains(source_out) {
                debug!(
                    "单元 {id} ({row}, {col}) 的上游 {source} 流向 {:?} 不含 {source_out}, 丢弃",
                    model.direction(source)
                );
                continue;
            }
            let fraction = if fractional {
                match model.fraction(source, source_out) {
                    Some(f) if f >= 0.0 => Some(f),
                    other => {
                        debug!("单元 {id} 的上游 {source} 在 {source_out} 方向比例无效 ({other:?}), 丢弃");
                        continue;
                    }
                }
            } else {
                None
            };
            adj.push(source, fraction);
            retained += 1;
        }
        adj.close_row();

        let declared = degrees.in_degree[id.get()];
        if retained != declared {
            dropped_total += (declared - retained.min(declared)) as usize;
            degrees.in_degree[id.get()] = retained;
        }
    }

    if dropped_total > 0 {
        warn!("流入邻接构建丢弃 {dropped_total} 条未通过互证检查的入边, 已重新计数");
    }

    let expected = degrees.total_in();
    let ids = adj.encode_ids("flow_in_index", expected)?;
    let fractions = adj.encode_fractions("flow_in_fraction", expected)?;
    Ok(AdjacencyArrays {
        adjacency: adj,
        ids,
        fractions,
    })
}

// ============================================================
// 下游（流出）
// ============================================================

/// 构建流出邻接
///
/// 指向无效单元的方向被跳过；有效方向缺少比例或比例为负时失败。
/// 所有出向目标均有效的单元，其比例和偏离 1 超过 `tolerance` 时记为警告。
pub fn build_flow_out(
    index: &ValidCellIndex,
    model: &FlowModel,
    degrees: &DegreeCounts,
    tolerance: f64,
    report: &mut ValidationReport,
) -> LayeringResult<AdjacencyArrays> {
    if degrees.out_degree.len() != index.n_valid() {
        return Err(LayeringError::consistency(format!(
            "出度长度 {} 与有效单元数 {} 不一致",
            degrees.out_degree.len(),
            index.n_valid()
        )));
    }

    let fractional = model.method().is_fractional();
    let mut adj = Adjacency::with_capacity(index.n_valid(), degrees.total_out(), fractional);

    for (id, row, col) in index.iter() {
        let mut all_targets_valid = true;
        let mut fraction_sum = 0.0;
        for (d, fraction) in model.out_edges(id) {
            let Some(target) = index.neighbor(row, col, d.offset()) else {
                all_targets_valid = false;
                continue;
            };
            let fraction = if fractional {
                match fraction {
                    Some(f) if f >= 0.0 => Some(f),
                    _ => {
                        error!(
                            "流出方向缺少比例: 单元 {id}, 行 {row}, 列 {col}, 下游数 {}, 压缩流向 {}, 分量方向 {}",
                            degrees.out_degree[id.get()],
                            model.direction(id).bits(),
                            d.bit()
                        );
                        return Err(LayeringError::consistency(format!(
                            "单元 {id} ({row}, {col}) 在方向 {d} 上缺少有效比例: {fraction:?}"
                        )));
                    }
                }
            } else {
                None
            };
            fraction_sum += fraction.unwrap_or(0.0);
            adj.push(target, fraction);
        }
        adj.close_row();

        if fractional
            && all_targets_valid
            && adj.count(id) > 0
            && (fraction_sum - 1.0).abs() > tolerance
        {
            warn!("单元 {id} ({row}, {col}) 流出比例之和为 {fraction_sum:.6}");
            report.add_warning(ValidationWarning::FractionSum {
                cell_id: id.get(),
                row,
                col,
                sum: fraction_sum,
                tolerance,
            });
        }
    }

    let expected = degrees.total_out();
    let ids = adj.encode_ids("flow_out_index", expected)?;
    let fractions = adj.encode_fractions("flow_out_fraction", expected)?;
    Ok(AdjacencyArrays {
        adjacency: adj,
        ids,
        fractions,
    })
}
