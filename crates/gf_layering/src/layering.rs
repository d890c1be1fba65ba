// crates/gf_layering/src/layering.rs

//! 汇流分层
//!
//! 两个方向共用同一个逐层剥离（Kahn 波前）算法：
//!
//! - 自上而下：剩余计数取入度，已分层单元沿流出邻接递减下游单元的计数；
//! - 自下而上：剩余计数取出度，已分层单元沿流入邻接递减上游单元的计数。
//!
//! 单元的层号等于其全部前驱层号的最大值加一，无前驱单元为第 0 层，
//! 同层单元之间不存在直接或间接依赖，可以并行处理。

use crate::adjacency::Adjacency;
use crate::cell_index::ValidCellIndex;
use crate::degree::DegreeCounts;
use crate::error::{LayeringError, LayeringResult};
use crate::ragged::{RaggedArray, RaggedWriter};
use gf_foundation::ensure;
use gf_foundation::index::{CellId, LayerId};
use tracing::{debug, error};

/// 分层方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayeringPass {
    /// 从源头到出口
    UpDown,
    /// 从出口到源头
    DownUp,
}

impl LayeringPass {
    /// 方向名称
    pub const fn name(self) -> &'static str {
        match self {
            Self::UpDown => "up-down",
            Self::DownUp => "down-up",
        }
    }
}

/// 分层结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerAssignment {
    pass: LayeringPass,
    layer_of: Vec<LayerId>,
    groups: Vec<Vec<CellId>>,
}

impl LayerAssignment {
    /// 分层方向
    #[inline]
    pub fn pass(&self) -> LayeringPass {
        self.pass
    }

    /// 层数
    #[inline]
    pub fn n_layers(&self) -> usize {
        self.groups.len()
    }

    /// 单元数
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.layer_of.len()
    }

    /// 单元所在层
    #[inline]
    pub fn layer_of(&self, cell: CellId) -> LayerId {
        self.layer_of[cell.get()]
    }

    /// 指定层的单元（按编号升序）
    #[inline]
    pub fn layer(&self, layer: LayerId) -> &[CellId] {
        self.groups.get(layer.get()).map_or(&[], Vec::as_slice)
    }

    /// 全部分组
    #[inline]
    pub fn groups(&self) -> &[Vec<CellId>] {
        &self.groups
    }

    /// 最宽层的单元数
    pub fn widest(&self) -> usize {
        self.groups.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// 编码为 `[n_layers, count_0, ids..., count_1, ids...]`
    pub fn to_ragged(&self, name: &'static str) -> LayeringResult<RaggedArray> {
        let mut writer = RaggedWriter::new(
            name,
            self.n_layers(),
            RaggedArray::expected_len(self.n_layers(), self.n_cells()),
        );
        for group in &self.groups {
            writer.push_row(group.iter().map(|c| c.get() as f64));
        }
        writer.finish()
    }

    /// 按栅格位置展开层号，无效单元填充 `nodata`
    pub fn to_grid(&self, index: &ValidCellIndex, nodata: f64) -> Vec<f64> {
        let values: Vec<f64> = self.layer_of.iter().map(|l| l.get() as f64).collect();
        index.scatter(&values, nodata)
    }
}

/// 通用波前剥离
///
/// `remaining[c]` 为单元 c 尚未完成的前驱数，`successors` 给出每个单元完成后
/// 需要递减计数的后继单元。
pub fn assign_layers(
    pass: LayeringPass,
    remaining: &[u32],
    successors: &Adjacency,
) -> LayeringResult<LayerAssignment> {
    let n = remaining.len();
    ensure!(
        successors.n_cells() == n,
        LayeringError::consistency(format!(
            "{} 分层: 计数长度 {} 与邻接单元数 {} 不一致",
            pass.name(),
            n,
            successors.n_cells()
        ))
    );

    let mut remaining = remaining.to_vec();
    let mut layer_of = vec![LayerId::INVALID; n];
    let mut groups: Vec<Vec<CellId>> = Vec::new();
    let mut current: Vec<CellId> = (0..n)
        .filter(|&i| remaining[i] == 0)
        .map(CellId::new)
        .collect();
    let mut assigned = 0usize;

    while !current.is_empty() {
        let layer = LayerId::new(groups.len());
        let mut next = Vec::new();
        for &cell in &current {
            layer_of[cell.get()] = layer;
            for &succ in successors.neighbors(cell) {
                let r = &mut remaining[succ.get()];
                if *r == 0 {
                    error!(
                        "{} 分层: 单元 {succ} 的剩余计数已为 0, 仍被前驱 {cell} 递减",
                        pass.name()
                    );
                    return Err(LayeringError::consistency(format!(
                        "{} 分层: 单元 {succ} 的前驱数与邻接不一致",
                        pass.name()
                    )));
                }
                *r -= 1;
                if *r == 0 {
                    next.push(succ);
                }
            }
        }
        assigned += current.len();
        groups.push(current);
        next.sort_unstable();
        current = next;
    }

    if assigned != n {
        let first = layer_of
            .iter()
            .position(|l| l.is_invalid())
            .unwrap_or_default();
        error!(
            "{} 分层: 波前耗尽后仍有 {} 个单元未分层, 首个单元 {}",
            pass.name(),
            n - assigned,
            first
        );
        return Err(LayeringError::Layering {
            pass: pass.name(),
            unassigned: n - assigned,
            first,
        });
    }

    debug!("{} 分层完成: {} 层, {} 个单元", pass.name(), groups.len(), n);
    Ok(LayerAssignment {
        pass,
        layer_of,
        groups,
    })
}

/// 自上而下分层: 入度驱动，沿流出邻接传播
pub fn layer_up_down(degrees: &DegreeCounts, flow_out: &Adjacency) -> LayeringResult<LayerAssignment> {
    assign_layers(LayeringPass::UpDown, &degrees.in_degree, flow_out)
}

/// 自下而上分层: 出度驱动，沿流入邻接传播
pub fn layer_down_up(degrees: &DegreeCounts, flow_in: &Adjacency) -> LayeringResult<LayerAssignment> {
    assign_layers(LayeringPass::DownUp, &degrees.out_degree, flow_in)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::{build_flow_in, build_flow_out};
    use crate::direction::CompressedDirection;
    use crate::model::FlowModel;
    use crate::reverse::build_reverse_directions;
    use gf_foundation::validation::ValidationReport;
    use gf_raster::RasterData;

    struct Built {
        degrees: DegreeCounts,
        flow_in: Adjacency,
        flow_out: Adjacency,
    }

    fn build(bits: &[u8], rows: usize, cols: usize) -> Built {
        let mask = RasterData::from_data(vec![1.0; rows * cols], rows, cols, -9999.0).unwrap();
        let index = ValidCellIndex::from_mask(&mask);
        let model = FlowModel::mfd_md(
            bits.iter().map(|&b| CompressedDirection::from_bits(b)).collect(),
            bits.iter()
                .map(|&b| {
                    let n = b.count_ones().max(1) as f64;
                    [Some(1.0 / n); 8]
                })
                .collect(),
        )
        .unwrap();
        let reverse = build_reverse_directions(&index, &model);
        let mut degrees = DegreeCounts::count(&index, &model, &reverse);
        let mut report = ValidationReport::new();
        let flow_in = build_flow_in(&index, &model, &reverse, &mut degrees).unwrap();
        let flow_out = build_flow_out(&index, &model, &degrees, 1e-4, &mut report).unwrap();
        Built {
            degrees,
            flow_in: flow_in.adjacency,
            flow_out: flow_out.adjacency,
        }
    }

    #[test]
    fn test_chain_layers() {
        // 0 -> 1 -> 2 -> 3
        let b = build(&[1, 1, 1, 0], 1, 4);
        let up = layer_up_down(&b.degrees, &b.flow_out).unwrap();
        let down = layer_down_up(&b.degrees, &b.flow_in).unwrap();
        assert_eq!(up.n_layers(), 4);
        assert_eq!(down.n_layers(), 4);
        for i in 0..4 {
            assert_eq!(up.layer_of(CellId::new(i)).get(), i);
            assert_eq!(down.layer_of(CellId::new(i)).get(), 3 - i);
        }
    }

    #[test]
    fn test_longest_path_rule() {
        // 0 -> 1 -> 3, 2 -> 3 ：单元 3 取最长路径
        // 行布局 2x2: 0=(0,0) E, 1=(0,1) S, 2=(1,0) E, 3=(1,1) 无
        let b = build(&[1, 4, 1, 0], 2, 2);
        let up = layer_up_down(&b.degrees, &b.flow_out).unwrap();
        assert_eq!(up.layer(LayerId::new(0)), &[CellId::new(0), CellId::new(2)]);
        assert_eq!(up.layer(LayerId::new(1)), &[CellId::new(1)]);
        assert_eq!(up.layer(LayerId::new(2)), &[CellId::new(3)]);

        let down = layer_down_up(&b.degrees, &b.flow_in).unwrap();
        assert_eq!(down.layer(LayerId::new(0)), &[CellId::new(3)]);
        assert_eq!(down.layer(LayerId::new(1)), &[CellId::new(1), CellId::new(2)]);
        assert_eq!(down.layer(LayerId::new(2)), &[CellId::new(0)]);
    }

    #[test]
    fn test_cycle_is_reported() {
        // 0 <-> 1
        let b = build(&[1, 16], 1, 2);
        let err = layer_up_down(&b.degrees, &b.flow_out).unwrap_err();
        assert!(matches!(
            err,
            LayeringError::Layering {
                unassigned: 2,
                first: 0,
                ..
            }
        ));
        assert!(layer_down_up(&b.degrees, &b.flow_in).is_err());
    }

    #[test]
    fn test_ragged_encoding_counts_every_cell() {
        let b = build(&[1, 4, 1, 0], 2, 2);
        let up = layer_up_down(&b.degrees, &b.flow_out).unwrap();
        let arr = up.to_ragged("layers").unwrap();
        assert_eq!(arr.as_slice(), &[3.0, 2.0, 0.0, 2.0, 1.0, 1.0, 1.0, 3.0]);
        let total: usize = arr.rows().map(<[f64]>::len).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn test_mismatched_lengths() {
        let b = build(&[1, 0], 1, 2);
        let err = assign_layers(LayeringPass::UpDown, &[0], &b.flow_out).unwrap_err();
        assert!(matches!(err, LayeringError::DataConsistency { .. }));
    }

    #[test]
    fn test_empty_grid() {
        let adj = Adjacency::default();
        let res = assign_layers(LayeringPass::UpDown, &[], &adj).unwrap();
        assert_eq!(res.n_layers(), 0);
        assert_eq!(res.widest(), 0);
    }
}
