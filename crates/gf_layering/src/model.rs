// crates/gf_layering/src/model.rs

//! 流向模型
//!
//! D8、Dinf、MFD-md 三种算法的差异只在于每个单元允许的方向个数和
//! 每条出边的流量分配比例来源，这里用同一个 [`FlowModel`] 表达：
//!
//! - D8: 单方向，比例恒为 1
//! - Dinf: 至多两个方向，栅格记录第一方向（解压顺序中的首个比特）的比例 `f`，
//!   第二方向取 `1 - f`
//! - MFD-md: 至多八个方向，八个栅格按逆时针序号分别记录各方向比例

use crate::cell_index::ValidCellIndex;
use crate::direction::{CompressedDirection, Direction};
use crate::error::{LayeringError, LayeringResult};
use gf_foundation::index::CellId;
use gf_raster::RasterData;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// 流向算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FlowMethod {
    /// D8 单流向
    #[default]
    #[serde(rename = "D8")]
    D8,
    /// Dinf (Tarboton, 1997)
    #[serde(rename = "DINF")]
    Dinf,
    /// MFD-md (Qin et al., 2007)
    #[serde(rename = "MFDMD")]
    MfdMd,
}

impl FlowMethod {
    /// 全部算法
    pub const ALL: [Self; 3] = [Self::D8, Self::Dinf, Self::MfdMd];

    /// 算法标签，用于邻接数组名称
    pub const fn tag(self) -> &'static str {
        match self {
            Self::D8 => "D8",
            Self::Dinf => "DINF",
            Self::MfdMd => "MFDMD",
        }
    }

    /// 分层数组与输入栅格名称后缀，D8 为空
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::D8 => "",
            Self::Dinf => "_DINF",
            Self::MfdMd => "_MFDMD",
        }
    }

    /// 单元允许的最大方向数
    pub const fn max_directions(self) -> u32 {
        match self {
            Self::D8 => 1,
            Self::Dinf => 2,
            Self::MfdMd => 8,
        }
    }

    /// 所需比例栅格数量
    pub const fn fraction_layers(self) -> usize {
        match self {
            Self::D8 => 0,
            Self::Dinf => 1,
            Self::MfdMd => 8,
        }
    }

    /// 是否输出流量比例数组
    pub const fn is_fractional(self) -> bool {
        !matches!(self, Self::D8)
    }
}

impl fmt::Display for FlowMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FlowMethod {
    type Err = LayeringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "d8" => Ok(Self::D8),
            "dinf" => Ok(Self::Dinf),
            "mfdmd" => Ok(Self::MfdMd),
            _ => Err(LayeringError::configuration(format!("未知的流向算法: {s}"))),
        }
    }
}

/// 每个有效单元的流量比例表
#[derive(Debug, Clone, PartialEq)]
pub enum FractionTable {
    /// D8: 唯一出边比例为 1
    Unit,
    /// Dinf: 第一方向比例，`None` 表示无数据
    FirstDirection(Vec<Option<f64>>),
    /// MFD-md: `[cell][ccw_index - 1]`
    PerDirection(Vec<[Option<f64>; 8]>),
}

/// 单元出边: 方向与比例
pub type OutEdges = SmallVec<[(Direction, Option<f64>); 8]>;

/// 流向模型
#[derive(Debug, Clone, PartialEq)]
pub struct FlowModel {
    method: FlowMethod,
    directions: Vec<CompressedDirection>,
    fractions: FractionTable,
}

impl FlowModel {
    /// D8 模型
    pub fn d8(directions: Vec<CompressedDirection>) -> Self {
        Self {
            method: FlowMethod::D8,
            directions,
            fractions: FractionTable::Unit,
        }
    }

    /// Dinf 模型
    pub fn dinf(
        directions: Vec<CompressedDirection>,
        first_fraction: Vec<Option<f64>>,
    ) -> LayeringResult<Self> {
        check_table_len(directions.len(), first_fraction.len())?;
        Ok(Self {
            method: FlowMethod::Dinf,
            directions,
            fractions: FractionTable::FirstDirection(first_fraction),
        })
    }

    /// MFD-md 模型
    pub fn mfd_md(
        directions: Vec<CompressedDirection>,
        fractions: Vec<[Option<f64>; 8]>,
    ) -> LayeringResult<Self> {
        check_table_len(directions.len(), fractions.len())?;
        Ok(Self {
            method: FlowMethod::MfdMd,
            directions,
            fractions: FractionTable::PerDirection(fractions),
        })
    }

    /// 从栅格解码有效单元的流向与比例
    ///
    /// `fraction_grids` 的数量必须等于 [`FlowMethod::fraction_layers`]，
    /// MFD-md 按逆时针序号 1..=8 排列。
    pub fn load(
        method: FlowMethod,
        index: &ValidCellIndex,
        flow_dir: &RasterData,
        fraction_grids: &[RasterData],
    ) -> LayeringResult<Self> {
        if fraction_grids.len() != method.fraction_layers() {
            return Err(LayeringError::configuration(format!(
                "{method} 需要 {} 个比例栅格, 实际 {}",
                method.fraction_layers(),
                fraction_grids.len()
            )));
        }

        let mut directions = Vec::with_capacity(index.n_valid());
        for (_, row, col) in index.iter() {
            let value = flow_dir
                .valid_value(row, col)
                .ok_or_else(|| {
                    LayeringError::configuration(format!(
                        "流向栅格在有效单元 ({row}, {col}) 处为无数据"
                    ))
                })?;
            let dir = CompressedDirection::from_value(value, row, col)?;
            if dir.count() > method.max_directions() {
                return Err(LayeringError::MalformedDirection {
                    row,
                    col,
                    value,
                    reason: "方向个数超过该流向算法上限",
                });
            }
            directions.push(dir);
        }

        let read = |grid: &RasterData, row: usize, col: usize| grid.valid_value(row, col);
        match method {
            FlowMethod::D8 => Ok(Self::d8(directions)),
            FlowMethod::Dinf => {
                let first = index
                    .iter()
                    .map(|(_, r, c)| read(&fraction_grids[0], r, c))
                    .collect();
                Self::dinf(directions, first)
            }
            FlowMethod::MfdMd => {
                let table = index
                    .iter()
                    .map(|(_, r, c)| {
                        let mut slots = [None; 8];
                        for (k, slot) in slots.iter_mut().enumerate() {
                            *slot = read(&fraction_grids[k], r, c);
                        }
                        slots
                    })
                    .collect();
                Self::mfd_md(directions, table)
            }
        }
    }

    /// 流向算法
    #[inline]
    pub fn method(&self) -> FlowMethod {
        self.method
    }

    /// 单元数量
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.directions.len()
    }

    /// 单元的压缩流向
    #[inline]
    pub fn direction(&self, cell: CellId) -> CompressedDirection {
        self.directions[cell.get()]
    }

    /// 全部单元的压缩流向
    #[inline]
    pub fn directions(&self) -> &[CompressedDirection] {
        &self.directions
    }

    /// 单元在指定方向上的流出比例
    ///
    /// 该方向不在单元流向集合中，或比例为无数据时返回 `None`。
    pub fn fraction(&self, cell: CellId, dir: Direction) -> Option<f64> {
        let own = self.direction(cell);
        if !own.contains(dir) {
            return None;
        }
        match &self.fractions {
            FractionTable::Unit => Some(1.0),
            FractionTable::FirstDirection(first) => {
                let f = first[cell.get()]?;
                let mut dirs = own.iter();
                if dirs.next() == Some(dir) {
                    Some(f)
                } else {
                    Some(1.0 - f)
                }
            }
            FractionTable::PerDirection(table) => table[cell.get()][dir.ccw_index() - 1],
        }
    }

    /// 单元的全部出边（按解压顺序）
    pub fn out_edges(&self, cell: CellId) -> OutEdges {
        self.direction(cell)
            .iter()
            .map(|d| (d, self.fraction(cell, d)))
            .collect()
    }
}

fn check_table_len(directions: usize, fractions: usize) -> LayeringResult<()> {
    if directions != fractions {
        return Err(LayeringError::configuration(format!(
            "流向与比例表长度不一致: {directions} vs {fractions}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirs(bits: &[u8]) -> Vec<CompressedDirection> {
        bits.iter().map(|&b| CompressedDirection::from_bits(b)).collect()
    }

    #[test]
    fn test_method_names() {
        assert_eq!(FlowMethod::D8.tag(), "D8");
        assert_eq!(FlowMethod::D8.suffix(), "");
        assert_eq!(FlowMethod::Dinf.suffix(), "_DINF");
        assert_eq!(FlowMethod::MfdMd.tag(), "MFDMD");
        assert_eq!("mfd-md".parse::<FlowMethod>().unwrap(), FlowMethod::MfdMd);
        assert_eq!("DINF".parse::<FlowMethod>().unwrap(), FlowMethod::Dinf);
        assert!("d16".parse::<FlowMethod>().is_err());
    }

    #[test]
    fn test_d8_fraction_is_unit() {
        let m = FlowModel::d8(dirs(&[1, 0]));
        assert_eq!(m.fraction(CellId::new(0), Direction::E), Some(1.0));
        assert_eq!(m.fraction(CellId::new(0), Direction::S), None);
        assert!(m.out_edges(CellId::new(1)).is_empty());
    }

    #[test]
    fn test_dinf_second_direction_gets_complement() {
        // E(1) + SE(2)，第一方向为 E
        let m = FlowModel::dinf(dirs(&[3]), vec![Some(0.75)]).unwrap();
        let edges = m.out_edges(CellId::new(0));
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0], (Direction::E, Some(0.75)));
        assert_eq!(edges[1], (Direction::SE, Some(0.25)));
    }

    #[test]
    fn test_dinf_missing_fraction() {
        let m = FlowModel::dinf(dirs(&[3]), vec![None]).unwrap();
        assert_eq!(m.fraction(CellId::new(0), Direction::E), None);
    }

    #[test]
    fn test_mfd_fraction_by_ccw_slot() {
        let mut slots = [None; 8];
        slots[Direction::N.ccw_index() - 1] = Some(0.6);
        slots[Direction::E.ccw_index() - 1] = Some(0.4);
        let m = FlowModel::mfd_md(dirs(&[65]), vec![slots]).unwrap();
        assert_eq!(m.fraction(CellId::new(0), Direction::N), Some(0.6));
        assert_eq!(m.fraction(CellId::new(0), Direction::E), Some(0.4));
        assert_eq!(m.fraction(CellId::new(0), Direction::S), None);
    }

    #[test]
    fn test_table_length_mismatch() {
        assert!(FlowModel::dinf(dirs(&[1, 2]), vec![Some(1.0)]).is_err());
    }

    #[test]
    fn test_load_rejects_multi_bit_d8() {
        let mask = RasterData::from_data(vec![1.0, 1.0], 1, 2, -9999.0).unwrap();
        let fd = RasterData::from_data(vec![3.0, 0.0], 1, 2, -9999.0).unwrap();
        let index = ValidCellIndex::from_mask(&mask);
        let err = FlowModel::load(FlowMethod::D8, &index, &fd, &[]).unwrap_err();
        assert!(matches!(err, LayeringError::MalformedDirection { row: 0, col: 0, .. }));
    }

    #[test]
    fn test_load_requires_fraction_grids() {
        let mask = RasterData::from_data(vec![1.0], 1, 1, -9999.0).unwrap();
        let index = ValidCellIndex::from_mask(&mask);
        let err = FlowModel::load(FlowMethod::MfdMd, &index, &mask, &[]).unwrap_err();
        assert!(matches!(err, LayeringError::Configuration { .. }));
    }
}
