// crates/gf_layering/src/cell_index.rs

//! 有效单元索引
//!
//! 栅格位置 (row, col) 与有效单元压缩编号之间的双向映射。
//! 编号按行优先顺序递增分配，无数据单元不占编号。

use gf_foundation::index::CellId;
use gf_raster::RasterData;

/// 有效单元索引
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCellIndex {
    rows: usize,
    cols: usize,
    /// 线性位置 -> 编号，无效位置为 `CellId::INVALID`
    pos_index: Vec<CellId>,
    /// 编号 -> (行, 列)
    pos_rowcol: Vec<(usize, usize)>,
}

impl ValidCellIndex {
    /// 扫描掩膜建立索引
    pub fn from_mask(mask: &RasterData) -> Self {
        let mut pos_index = vec![CellId::INVALID; mask.rows * mask.cols];
        let mut pos_rowcol = Vec::new();
        for row in 0..mask.rows {
            for col in 0..mask.cols {
                let pos = row * mask.cols + col;
                if !mask.is_nodata_value(mask.data[pos]) {
                    pos_index[pos] = CellId::new(pos_rowcol.len());
                    pos_rowcol.push((row, col));
                }
            }
        }
        Self {
            rows: mask.rows,
            cols: mask.cols,
            pos_index,
            pos_rowcol,
        }
    }

    /// 行数
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// 列数
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// 有效单元数量
    #[inline]
    pub fn n_valid(&self) -> usize {
        self.pos_rowcol.len()
    }

    /// 指定位置的编号，越界或无效返回 `None`
    #[inline]
    pub fn id_at(&self, row: usize, col: usize) -> Option<CellId> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let id = self.pos_index[row * self.cols + col];
        id.is_valid().then_some(id)
    }

    /// 从 (row, col) 偏移 (drow, dcol) 后的邻居编号
    #[inline]
    pub fn neighbor(&self, row: usize, col: usize, offset: (isize, isize)) -> Option<CellId> {
        let r = row.checked_add_signed(offset.0)?;
        let c = col.checked_add_signed(offset.1)?;
        self.id_at(r, c)
    }

    /// 编号对应的 (行, 列)
    #[inline]
    pub fn row_col(&self, id: CellId) -> (usize, usize) {
        self.pos_rowcol[id.get()]
    }

    /// 按编号顺序遍历 (编号, 行, 列)
    pub fn iter(&self) -> impl Iterator<Item = (CellId, usize, usize)> + '_ {
        self.pos_rowcol
            .iter()
            .enumerate()
            .map(|(i, &(r, c))| (CellId::new(i), r, c))
    }

    /// 将按编号排列的值散布回 rows x cols 栅格，无效单元填充 `nodata`
    pub fn scatter(&self, values: &[f64], nodata: f64) -> Vec<f64> {
        let mut out = vec![nodata; self.rows * self.cols];
        for (i, &(r, c)) in self.pos_rowcol.iter().enumerate() {
            out[r * self.cols + c] = values[i];
        }
        out
    }
}
