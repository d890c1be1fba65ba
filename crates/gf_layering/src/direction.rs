// crates/gf_layering/src/direction.rs

//! 流向编码
//!
//! 八个邻居各占一个比特，多流向算法将多个比特按位或压缩成一个值：
//!
//! ```text
//!  32  64  128        NW  N  NE
//!  16   .    1        W   .   E
//!   8   4    2        SW  S  SE
//! ```
//!
//! 逆时针序号从东开始：E=1, NE=2, N=3, NW=4, W=5, SW=6, S=7, SE=8，
//! 下游所有消费者都必须使用这张表解码输出数组。

use crate::error::{LayeringError, LayeringResult};
use smallvec::SmallVec;
use std::fmt;

/// 逆时针序号 -> 比特值，下标 0 不使用
pub const FDCCW: [u8; 9] = [0, 1, 128, 64, 32, 16, 8, 4, 2];
/// 逆时针序号 -> 行偏移
pub const DROW: [isize; 9] = [0, 0, -1, -1, -1, 0, 1, 1, 1];
/// 逆时针序号 -> 列偏移
pub const DCOL: [isize; 9] = [0, 1, 1, 0, -1, -1, -1, 0, 1];

/// 解压时的比特遍历顺序
pub const CANONICAL_BITS: [u8; 8] = [1, 2, 4, 8, 16, 32, 64, 128];

/// 单一方向（恰好一个比特）
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Direction(u8);

impl Direction {
    /// 东
    pub const E: Self = Self(1);
    /// 东南
    pub const SE: Self = Self(2);
    /// 南
    pub const S: Self = Self(4);
    /// 西南
    pub const SW: Self = Self(8);
    /// 西
    pub const W: Self = Self(16);
    /// 西北
    pub const NW: Self = Self(32);
    /// 北
    pub const N: Self = Self(64);
    /// 东北
    pub const NE: Self = Self(128);

    /// 按解压顺序排列的全部方向
    pub const ALL: [Self; 8] = [
        Self::E,
        Self::SE,
        Self::S,
        Self::SW,
        Self::W,
        Self::NW,
        Self::N,
        Self::NE,
    ];

    /// 从单比特值创建，非规范值返回 `None`
    #[inline]
    pub const fn from_bit(bit: u8) -> Option<Self> {
        if bit.count_ones() == 1 {
            Some(Self(bit))
        } else {
            None
        }
    }

    /// 从逆时针序号 (1..=8) 创建
    #[inline]
    pub fn from_ccw_index(index: usize) -> Option<Self> {
        (1..=8).contains(&index).then(|| Self(FDCCW[index]))
    }

    /// 比特值
    #[inline]
    pub const fn bit(self) -> u8 {
        self.0
    }

    /// 逆时针序号 (1..=8)
    #[inline]
    pub const fn ccw_index(self) -> usize {
        match self.0 {
            1 => 1,
            128 => 2,
            64 => 3,
            32 => 4,
            16 => 5,
            8 => 6,
            4 => 7,
            _ => 8,
        }
    }

    /// 指向的邻居相对 (行, 列) 偏移
    #[inline]
    pub const fn offset(self) -> (isize, isize) {
        let i = self.ccw_index();
        (DROW[i], DCOL[i])
    }

    /// 反方向
    #[inline]
    pub const fn reverse(self) -> Self {
        // 高低半字节互换即反向: E<->W, SE<->NW, S<->N, SW<->NE
        Self(self.0.rotate_left(4))
    }

    /// 方位名称
    pub const fn name(self) -> &'static str {
        match self.0 {
            1 => "E",
            2 => "SE",
            4 => "S",
            8 => "SW",
            16 => "W",
            32 => "NW",
            64 => "N",
            _ => "NE",
        }
    }
}

impl fmt::Debug for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 压缩流向（零个或多个比特）
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CompressedDirection(u8);

impl CompressedDirection {
    /// 无流向（出口或洼地）
    pub const NONE: Self = Self(0);

    /// 从原始比特创建
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// 从栅格值解码，值必须是 0..=255 的整数
    pub fn from_value(value: f64, row: usize, col: usize) -> LayeringResult<Self> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(LayeringError::MalformedDirection {
                row,
                col,
                value,
                reason: "流向值必须为整数",
            });
        }
        if !(0.0..=255.0).contains(&value) {
            return Err(LayeringError::MalformedDirection {
                row,
                col,
                value,
                reason: "流向值超出 0..=255",
            });
        }
        Ok(Self(value as u8))
    }

    /// 原始比特
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// 是否为空
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// 方向个数（置位数）
    #[inline]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// 是否包含指定方向
    #[inline]
    pub const fn contains(self, dir: Direction) -> bool {
        self.0 & dir.0 != 0
    }

    /// 加入方向
    #[inline]
    pub fn insert(&mut self, dir: Direction) {
        self.0 |= dir.0;
    }

    /// 按解压顺序遍历包含的方向
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        uncompress(self.0).into_iter().map(Direction)
    }
}

impl fmt::Debug for CompressedDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompressedDirection({}: ", self.0)?;
        f.debug_list().entries(self.iter()).finish()?;
        write!(f, ")")
    }
}

impl FromIterator<Direction> for CompressedDirection {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut out = Self::NONE;
        for d in iter {
            out.insert(d);
        }
        out
    }
}

// ============================================================
// 数值接口
// ============================================================

/// 单比特值的逆时针序号 (1..=8)
pub fn ccw_index(bit: u8) -> LayeringResult<usize> {
    Direction::from_bit(bit)
        .map(Direction::ccw_index)
        .ok_or_else(|| LayeringError::consistency(format!("非规范流向比特: {bit}")))
}

/// 逆时针序号对应的 (行, 列) 偏移
pub fn neighbor_offset(ccw: usize) -> LayeringResult<(isize, isize)> {
    if (1..=8).contains(&ccw) {
        Ok((DROW[ccw], DCOL[ccw]))
    } else {
        Err(LayeringError::consistency(format!("逆时针序号越界: {ccw}")))
    }
}

/// 单比特值的反方向比特
pub fn reverse(bit: u8) -> LayeringResult<u8> {
    Direction::from_bit(bit)
        .map(|d| d.reverse().bit())
        .ok_or_else(|| LayeringError::consistency(format!("非规范流向比特: {bit}")))
}

/// 将压缩值分解为单比特值列表，0 返回空列表
pub fn uncompress(value: u8) -> SmallVec<[u8; 8]> {
    CANONICAL_BITS
        .iter()
        .copied()
        .filter(|&b| value & b != 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_is_involution() {
        for bit in CANONICAL_BITS {
            let r = reverse(bit).unwrap();
            assert_ne!(r, bit);
            assert_eq!(reverse(r).unwrap(), bit);
        }
    }

    #[test]
    fn test_reverse_pairs() {
        assert_eq!(Direction::E.reverse(), Direction::W);
        assert_eq!(Direction::NE.reverse(), Direction::SW);
        assert_eq!(Direction::N.reverse(), Direction::S);
        assert_eq!(Direction::NW.reverse(), Direction::SE);
    }

    #[test]
    fn test_ccw_index_is_bijection() {
        let mut seen = [false; 9];
        for bit in CANONICAL_BITS {
            let idx = ccw_index(bit).unwrap();
            assert!((1..=8).contains(&idx));
            assert!(!seen[idx]);
            seen[idx] = true;
            assert_eq!(FDCCW[idx], bit);
            assert_eq!(Direction::from_ccw_index(idx).unwrap().bit(), bit);
        }
        assert!(seen[1..].iter().all(|&s| s));
    }

    #[test]
    fn test_ccw_index_rejects_non_canonical() {
        assert!(ccw_index(0).is_err());
        assert!(ccw_index(3).is_err());
        assert!(reverse(96).is_err());
        assert!(neighbor_offset(0).is_err());
        assert!(neighbor_offset(9).is_err());
    }

    #[test]
    fn test_offsets_point_away_and_back() {
        for d in Direction::ALL {
            let (dr, dc) = d.offset();
            let (rr, rc) = d.reverse().offset();
            assert_eq!((dr + rr, dc + rc), (0, 0));
            assert!(dr != 0 || dc != 0);
        }
        assert_eq!(Direction::E.offset(), (0, 1));
        assert_eq!(Direction::NE.offset(), (-1, 1));
        assert_eq!(Direction::S.offset(), (1, 0));
        assert_eq!(neighbor_offset(8).unwrap(), (1, 1));
    }

    #[test]
    fn test_uncompress() {
        assert!(uncompress(0).is_empty());
        for bit in CANONICAL_BITS {
            assert_eq!(uncompress(bit).as_slice(), &[bit]);
        }
        assert_eq!(uncompress(69).as_slice(), &[1, 4, 64]);
        assert_eq!(uncompress(255).len(), 8);
    }

    #[test]
    fn test_compressed_from_value() {
        assert_eq!(CompressedDirection::from_value(69.0, 0, 0).unwrap().count(), 3);
        assert!(CompressedDirection::from_value(1.5, 0, 0).is_err());
        assert!(CompressedDirection::from_value(-1.0, 0, 0).is_err());
        assert!(CompressedDirection::from_value(256.0, 2, 3).is_err());
    }

    #[test]
    fn test_compressed_iter_follows_bit_order() {
        let mut c = CompressedDirection::NONE;
        c.insert(Direction::N);
        c.insert(Direction::E);
        assert_eq!(c.bits(), 65);
        let dirs: Vec<Direction> = c.iter().collect();
        assert_eq!(dirs, vec![Direction::E, Direction::N]);
        let collected: CompressedDirection = [Direction::S, Direction::W].into_iter().collect();
        assert_eq!(collected.bits(), 20);
        assert_eq!(CompressedDirection::from_bits(255).iter().count(), 8);
    }
}
