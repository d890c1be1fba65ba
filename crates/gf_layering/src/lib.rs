// crates/gf_layering/src/lib.rs

//! 汇流拓扑与网格分层
//!
//! 由单元流向栅格（D8、Dinf 或 MFD-md）构建单元之间的有向无环汇流图，
//! 计算每个单元的上下游邻接，并为每个单元分配处理层：同层单元之间相互独立，
//! 所有依赖都位于更早的层。
//!
//! # 模块
//!
//! - [`direction`]: 方向比特编码、反向、逆时针序号
//! - [`cell_index`]: 有效单元压缩编号
//! - [`model`]: 三种流向算法的方向与比例
//! - [`reverse`]: 反向流向矩阵
//! - [`degree`]: 上下游单元计数
//! - [`ragged`]: 带计数的扁平锯齿数组
//! - [`adjacency`]: 流入、流出邻接
//! - [`layering`]: 自上而下与自下而上两次分层
//! - [`naming`]: 输入与输出命名
//! - [`output`]: 产物存储
//! - [`engine`]: 子流域分层引擎
//!
//! # 示例
//!
//! ```
//! use gf_layering::{FlowMethod, GridLayering, MemoryStore};
//! use gf_raster::RasterData;
//!
//! // 1 x 3 栅格: 0 -> 1 -> 2
//! let fd = RasterData::from_data(vec![1.0, 1.0, 0.0], 1, 3, -9999.0).unwrap();
//! let mut engine = GridLayering::new(0, FlowMethod::D8);
//! engine.load_grids(fd, None, Vec::new()).unwrap();
//!
//! let mut store = MemoryStore::new();
//! let summary = engine.execute(&mut store).unwrap();
//! assert_eq!(summary.up_down_layers, 3);
//! assert!(store.array("0_ROUTING_LAYERS_UP_DOWN").is_some());
//! ```

#![warn(missing_docs)]

pub mod adjacency;
pub mod cell_index;
pub mod degree;
pub mod direction;
pub mod engine;
pub mod error;
pub mod layering;
pub mod model;
pub mod naming;
pub mod output;
pub mod ragged;
pub mod reverse;

// 重导出常用类型
pub use adjacency::{build_flow_in, build_flow_out, Adjacency, AdjacencyArrays};
pub use cell_index::ValidCellIndex;
pub use degree::DegreeCounts;
pub use direction::{CompressedDirection, Direction};
pub use engine::{
    GridLayering, InputNames, LayeringOutput, LayeringSummary, DEFAULT_FRACTION_TOLERANCE,
    DEFAULT_OUT_NODATA,
};
pub use error::{FailureKind, LayeringError, LayeringResult};
pub use layering::{layer_down_up, layer_up_down, LayerAssignment, LayeringPass};
pub use model::{FlowMethod, FlowModel};
pub use naming::{ArtifactNames, CatalogNames};
pub use output::{ArtifactStore, DirectoryStore, MemoryStore};
pub use ragged::RaggedArray;
pub use reverse::build_reverse_directions;
