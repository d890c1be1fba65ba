// crates/gf_layering/src/reverse.rs

//! 反向流向矩阵
//!
//! 对每个有效单元，汇总所有流入它的邻居方向。例如单元 (i, j) 的上游为
//! (i, j+1)、(i-1, j)、(i+1, j)，则其反向流向为 E + N + S = 1 + 64 + 4 = 69。

use crate::cell_index::ValidCellIndex;
use crate::direction::{CompressedDirection, Direction};
use crate::model::FlowModel;

/// 计算每个有效单元的反向流向
///
/// 邻居越界、被掩膜或为无数据时跳过。
pub fn build_reverse_directions(
    index: &ValidCellIndex,
    model: &FlowModel,
) -> Vec<CompressedDirection> {
    index
        .iter()
        .map(|(_, row, col)| {
            Direction::ALL
                .into_iter()
                .filter(|&d| {
                    index
                        .neighbor(row, col, d.offset())
                        .is_some_and(|n| model.direction(n).contains(d.reverse()))
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gf_raster::RasterData;

    fn setup(fd: &[f64], rows: usize, cols: usize) -> (ValidCellIndex, FlowModel) {
        let raster = RasterData::from_data(fd.to_vec(), rows, cols, -9999.0).unwrap();
        let index = ValidCellIndex::from_mask(&raster);
        let dirs = index
            .iter()
            .map(|(_, r, c)| {
                CompressedDirection::from_bits(raster.get(r, c).unwrap_or(0.0) as u8)
            })
            .collect();
        (index, FlowModel::d8(dirs))
    }

    #[test]
    fn test_center_receives_from_three_neighbors() {
        // 中心单元 (1,1): 东侧流向西(16)，北侧流向南(4)，南侧流向北(64)
        #[rustfmt::skip]
        let fd = [
            0.0, 4.0, 0.0,
            0.0, 0.0, 16.0,
            0.0, 64.0, 0.0,
        ];
        let (index, model) = setup(&fd, 3, 3);
        let reverse = build_reverse_directions(&index, &model);
        let center = index.id_at(1, 1).unwrap().get();
        assert_eq!(reverse[center].bits(), 1 + 64 + 4);
    }

    #[test]
    fn test_masked_neighbors_skipped() {
        // 左侧单元流向东，但右侧为无数据
        let fd = [1.0, -9999.0];
        let (index, model) = setup(&fd, 1, 2);
        let reverse = build_reverse_directions(&index, &model);
        assert_eq!(reverse.len(), 1);
        assert!(reverse[0].is_empty());
    }
}
