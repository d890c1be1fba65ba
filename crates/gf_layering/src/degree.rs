// crates/gf_layering/src/degree.rs

//! 上下游单元计数
//!
//! 入度 = 反向流向的置位数；出度 = 自身流向中指向有效单元的置位数。
//! 指向栅格外或无数据单元的方向不计入出度，这类单元在自下而上分层中
//! 与真正的出口同属第 0 层。

use crate::cell_index::ValidCellIndex;
use crate::direction::CompressedDirection;
use crate::model::FlowModel;

/// 每个有效单元的上下游数量
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DegreeCounts {
    /// 上游单元数
    pub in_degree: Vec<u32>,
    /// 下游单元数
    pub out_degree: Vec<u32>,
}

impl DegreeCounts {
    /// 从反向流向和流向模型计数
    pub fn count(
        index: &ValidCellIndex,
        model: &FlowModel,
        reverse: &[CompressedDirection],
    ) -> Self {
        Self {
            in_degree: count_flow_in_cells(reverse),
            out_degree: count_flow_out_cells(index, model),
        }
    }

    /// 入边总数
    pub fn total_in(&self) -> usize {
        self.in_degree.iter().map(|&d| d as usize).sum()
    }

    /// 出边总数
    pub fn total_out(&self) -> usize {
        self.out_degree.iter().map(|&d| d as usize).sum()
    }
}

/// 入度: 反向流向的置位数
pub fn count_flow_in_cells(reverse: &[CompressedDirection]) -> Vec<u32> {
    reverse.iter().map(|r| r.count()).collect()
}

/// 出度: 指向有效单元的流向置位数
pub fn count_flow_out_cells(index: &ValidCellIndex, model: &FlowModel) -> Vec<u32> {
    index
        .iter()
        .map(|(id, row, col)| {
            model
                .direction(id)
                .iter()
                .filter(|d| index.neighbor(row, col, d.offset()).is_some())
                .count() as u32
        })
        .collect()
}
