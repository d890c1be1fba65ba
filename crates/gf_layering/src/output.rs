// crates/gf_layering/src/output.rs

//! 输出持久化
//!
//! [`ArtifactStore`] 接收三类产物：扁平数值数组、邻接关系的文本表、
//! 按栅格展开的层号。`put_*` 只暂存，[`ArtifactStore::commit`] 才对外可见：
//! 目录后端把全部产物先写入目标目录下的临时文件，全部成功后再逐个重命名为
//! `.bin`/`.txt`/栅格文件；任何一步失败都不留下产物。内存后端保存在有序映射中。

use crate::adjacency::Adjacency;
use crate::error::{LayeringError, LayeringResult};
use gf_foundation::index::CellId;
use gf_raster::{GridFormat, RasterData};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// 产物存储 trait
pub trait ArtifactStore {
    /// 后端描述，用于日志
    fn backend(&self) -> &'static str;

    /// 暂存扁平数组
    fn put_array(&mut self, name: &str, data: &[f64]) -> LayeringResult<()>;

    /// 暂存文本表
    fn put_table(&mut self, name: &str, text: &str) -> LayeringResult<()>;

    /// 暂存栅格
    fn put_grid(&mut self, name: &str, grid: &RasterData) -> LayeringResult<()>;

    /// 发布全部暂存产物，返回发布数量
    ///
    /// 失败时已发布的部分被撤回，暂存内容被丢弃。
    fn commit(&mut self) -> LayeringResult<usize>;

    /// 丢弃全部暂存产物
    fn discard(&mut self);
}

// ============================================================
// 文本表
// ============================================================

/// 文本表类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// 上游表
    Upstream,
    /// 下游表
    Downstream,
}

impl TableKind {
    /// 表头
    pub const fn header(self, fractional: bool) -> &'static str {
        match (self, fractional) {
            (Self::Upstream, false) => "ID\tUpstreamCount\tUpstreamID",
            (Self::Upstream, true) => "ID\tUpstreamCount\tUpstreamID\tFlowInFraction",
            (Self::Downstream, false) => "ID\tDownstreamCount\tDownstreamID",
            (Self::Downstream, true) => "ID\tDownstreamCount\tDownstreamID\tFlowOutFraction",
        }
    }
}

/// 邻接关系的制表符分隔文本
///
/// 第一行为有效单元数，第二行为表头，之后每个单元一行；
/// 同一单元的多个邻居与比例以逗号分隔。
pub fn format_adjacency_table(adj: &Adjacency, kind: TableKind) -> String {
    let fractional = adj.is_fractional();
    let mut out = format!("{}\n{}\n", adj.n_cells(), kind.header(fractional));
    for i in 0..adj.n_cells() {
        let cell = CellId::new(i);
        let ids = join(adj.neighbors(cell).iter().map(|c| c.get()));
        out.push_str(&format!("{i}\t{}\t{ids}", adj.count(cell)));
        if let Some(fracs) = adj.fractions(cell) {
            out.push('\t');
            out.push_str(&join(fracs.iter()));
        }
        out.push('\n');
    }
    out
}

fn join<T: std::fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|item| item.to_string()).collect::<Vec<_>>().join(",")
}

// ============================================================
// 目录后端
// ============================================================

/// 已写完、尚未发布的文件
#[derive(Debug)]
struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
}

/// 写入目录的产物存储
///
/// 数组以小端 `f64` 写入 `{name}.bin`，文本表写入 `{name}.txt`，
/// 栅格按 [`GridFormat`] 写入。暂存文件与目标位于同一目录，
/// 发布只做重命名。
#[derive(Debug)]
pub struct DirectoryStore {
    root: PathBuf,
    write_text: bool,
    grid_format: GridFormat,
    staged: Vec<StagedFile>,
}

impl DirectoryStore {
    /// 创建
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_text: true,
            grid_format: GridFormat::default(),
            staged: Vec::new(),
        }
    }

    /// 是否写出文本表
    pub fn with_text(mut self, write_text: bool) -> Self {
        self.write_text = write_text;
        self
    }

    /// 栅格输出格式
    pub fn with_grid_format(mut self, grid_format: GridFormat) -> Self {
        self.grid_format = grid_format;
        self
    }

    /// 输出目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 暂存中的文件数
    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    /// 数组文件路径
    pub fn array_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.bin"))
    }

    /// 文本表路径
    pub fn table_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.txt"))
    }

    /// 栅格路径
    pub fn grid_path(&self, name: &str) -> PathBuf {
        self.root
            .join(format!("{name}.{}", self.grid_format.extension()))
    }

    /// 在目标目录创建临时文件并交给 `fill` 写入
    fn stage(
        &mut self,
        name: &str,
        target: PathBuf,
        fill: impl FnOnce(&mut NamedTempFile) -> LayeringResult<()>,
    ) -> LayeringResult<()> {
        let io_err = |e: std::io::Error| LayeringError::io(name, format!("{}: {e}", target.display()));
        std::fs::create_dir_all(&self.root).map_err(io_err)?;
        let mut temp = tempfile::Builder::new()
            .prefix(".gf-")
            .suffix(".part")
            .tempfile_in(&self.root)
            .map_err(io_err)?;
        fill(&mut temp)?;
        debug!("暂存 {} -> {}", temp.path().display(), target.display());
        self.staged.push(StagedFile { temp, target });
        Ok(())
    }

    fn stage_bytes(&mut self, name: &str, target: PathBuf, bytes: &[u8]) -> LayeringResult<()> {
        let reason = target.display().to_string();
        self.stage(name, target, |temp| {
            let mut writer = BufWriter::new(temp.as_file_mut());
            writer
                .write_all(bytes)
                .and_then(|()| writer.flush())
                .map_err(|e| LayeringError::io(name, format!("{reason}: {e}")))
        })
    }

    /// 撤回已发布的文件
    fn rollback(published: &[PathBuf]) {
        for path in published {
            if let Err(e) = std::fs::remove_file(path) {
                warn!("撤回 {} 失败: {e}", path.display());
            }
        }
    }
}

impl ArtifactStore for DirectoryStore {
    fn backend(&self) -> &'static str {
        "directory"
    }

    fn put_array(&mut self, name: &str, data: &[f64]) -> LayeringResult<()> {
        let mut bytes = Vec::with_capacity(data.len() * 8);
        for v in data {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let target = self.array_path(name);
        self.stage_bytes(name, target, &bytes)
    }

    fn put_table(&mut self, name: &str, text: &str) -> LayeringResult<()> {
        if !self.write_text {
            return Ok(());
        }
        let target = self.table_path(name);
        self.stage_bytes(name, target, text.as_bytes())
    }

    fn put_grid(&mut self, name: &str, grid: &RasterData) -> LayeringResult<()> {
        let target = self.grid_path(name);
        let format = self.grid_format;
        self.stage(name, target, |temp| Ok(format.write(temp.path(), grid)?))
    }

    fn commit(&mut self) -> LayeringResult<usize> {
        let staged = std::mem::take(&mut self.staged);
        if let Some(blocked) = staged.iter().find(|s| s.target.is_dir()) {
            return Err(LayeringError::io(
                blocked.target.display().to_string(),
                "目标路径已被目录占用",
            ));
        }

        let mut published = Vec::with_capacity(staged.len());
        for StagedFile { temp, target } in staged {
            if let Err(e) = temp.persist(&target) {
                Self::rollback(&published);
                return Err(LayeringError::io(
                    target.display().to_string(),
                    e.error.to_string(),
                ));
            }
            published.push(target);
        }
        debug!("{} 发布 {} 个文件", self.root.display(), published.len());
        Ok(published.len())
    }

    fn discard(&mut self) {
        if !self.staged.is_empty() {
            debug!("丢弃 {} 个暂存文件", self.staged.len());
        }
        self.staged.clear();
    }
}

/// 读取 `.bin` 数组
pub fn read_array(path: &Path) -> LayeringResult<Vec<f64>> {
    let name = path.display().to_string();
    let mut bytes = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .map_err(|e| LayeringError::io(&name, e.to_string()))?;
    if bytes.len() % 8 != 0 {
        return Err(LayeringError::io(
            name,
            format!("文件长度 {} 不是 8 的整数倍", bytes.len()),
        ));
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|c| {
            let mut b = [0u8; 8];
            b.copy_from_slice(c);
            f64::from_le_bytes(b)
        })
        .collect())
}

// ============================================================
// 内存后端
// ============================================================

/// 暂存的内存产物
#[derive(Debug, Clone)]
enum Pending {
    Array(String, Vec<f64>),
    Table(String, String),
    Grid(String, RasterData),
}

/// 内存中的产物存储
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    arrays: BTreeMap<String, Vec<f64>>,
    tables: BTreeMap<String, String>,
    grids: BTreeMap<String, RasterData>,
    pending: Vec<Pending>,
}

impl MemoryStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取数组
    pub fn array(&self, name: &str) -> Option<&[f64]> {
        self.arrays.get(name).map(Vec::as_slice)
    }

    /// 读取文本表
    pub fn table(&self, name: &str) -> Option<&str> {
        self.tables.get(name).map(String::as_str)
    }

    /// 读取栅格
    pub fn grid(&self, name: &str) -> Option<&RasterData> {
        self.grids.get(name)
    }

    /// 全部数组名称（有序）
    pub fn array_names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(String::as_str)
    }

    /// 已发布的产物总数
    pub fn len(&self) -> usize {
        self.arrays.len() + self.tables.len() + self.grids.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn put_array(&mut self, name: &str, data: &[f64]) -> LayeringResult<()> {
        self.pending.push(Pending::Array(name.to_string(), data.to_vec()));
        Ok(())
    }

    fn put_table(&mut self, name: &str, text: &str) -> LayeringResult<()> {
        self.pending.push(Pending::Table(name.to_string(), text.to_string()));
        Ok(())
    }

    fn put_grid(&mut self, name: &str, grid: &RasterData) -> LayeringResult<()> {
        self.pending.push(Pending::Grid(name.to_string(), grid.clone()));
        Ok(())
    }

    fn commit(&mut self) -> LayeringResult<usize> {
        let pending = std::mem::take(&mut self.pending);
        let n = pending.len();
        for item in pending {
            match item {
                Pending::Array(name, data) => {
                    self.arrays.insert(name, data);
                }
                Pending::Table(name, text) => {
                    self.tables.insert(name, text);
                }
                Pending::Grid(name, grid) => {
                    self.grids.insert(name, grid);
                }
            }
        }
        Ok(n)
    }

    fn discard(&mut self) {
        self.pending.clear();
    }
}
