// apps/gf_cli/src/commands/info.rs

//! 信息显示命令
//!
//! 显示方向编码表、输出命名与默认配置，或解码已写出的 `.bin` 数组。

use anyhow::{Context, Result};
use clap::Args;
use gf_config::{LayeringConfig, SubbasinInputs};
use gf_layering::direction::{ccw_index, neighbor_offset, reverse, CANONICAL_BITS};
use gf_layering::naming::ArtifactNames;
use gf_layering::output::read_array;
use gf_layering::{Direction, FlowMethod, RaggedArray};
use std::path::{Path, PathBuf};

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 显示方向编码表
    #[arg(long)]
    pub directions: bool,

    /// 显示输出命名
    #[arg(long)]
    pub names: bool,

    /// 显示默认配置
    #[arg(long)]
    pub defaults: bool,

    /// 按行解码一个变长数组文件 (`.bin`)
    #[arg(long, value_name = "FILE")]
    pub array: Option<PathBuf>,

    /// 解码时最多显示的行数
    #[arg(long, default_value_t = 20)]
    pub rows: usize,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    if let Some(path) = &args.array {
        return print_ragged_array(path, args.rows);
    }
    let all = !args.directions && !args.names && !args.defaults;
    if args.directions || all {
        print_direction_table()?;
    }
    if args.names || all {
        println!();
        print_artifact_names();
    }
    if args.defaults || all {
        println!();
        print_default_config()?;
    }
    Ok(())
}

fn print_direction_table() -> Result<()> {
    println!("=== 方向编码 ===");
    println!("{:>4}  {:>4}  {:>4}  {:>5}  {:>5}  {:>7}", "方向", "比特", "序号", "drow", "dcol", "反向");
    for bit in CANONICAL_BITS {
        let ccw = ccw_index(bit)?;
        let (dr, dc) = neighbor_offset(ccw)?;
        println!(
            "{:>4}  {:>4}  {:>4}  {:>5}  {:>5}  {:>7}",
            Direction::from_bit(bit).map_or("?", Direction::name),
            bit,
            ccw,
            dr,
            dc,
            reverse(bit)?
        );
    }
    Ok(())
}

fn print_ragged_array(path: &Path, max_rows: usize) -> Result<()> {
    let data = read_array(path)?;
    let array = RaggedArray::from_flat(data)
        .with_context(|| format!("{} 不是变长数组", path.display()))?;
    println!("=== {} ===", path.display());
    println!("行数 {}, 扁平长度 {}", array.n_rows(), array.len());
    for (i, row) in array.rows().take(max_rows).enumerate() {
        let items: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        println!("{i:>6}: [{}]", items.join(", "));
    }
    if array.n_rows() > max_rows {
        println!("   ... 其余 {} 行省略", array.n_rows() - max_rows);
    }
    Ok(())
}

fn print_artifact_names() {
    println!("=== 输出命名 (子流域 0) ===");
    for method in FlowMethod::ALL {
        println!("[{method}]");
        for name in ArtifactNames::new(0, method).array_names() {
            println!("  {name}");
        }
    }
}

fn print_default_config() -> Result<()> {
    println!("=== 默认配置 ===");
    let config = LayeringConfig {
        subbasins: vec![SubbasinInputs {
            id: 0,
            flow_dir: PathBuf::from("flow_dir.asc"),
            mask: Some(PathBuf::from("mask.asc")),
            fraction: None,
        }],
        ..Default::default()
    };
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gf_layering::{ArtifactStore, DirectoryStore};

    #[test]
    fn test_direction_table_covers_all_bits() {
        assert!(print_direction_table().is_ok());
    }

    #[test]
    fn test_print_ragged_array() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::new(dir.path());
        store.put_array("0_ROUTING_LAYERS_UP_DOWN", &[2.0, 1.0, 0.0, 1.0, 1.0]).unwrap();
        store.put_array("broken", &[3.0, 5.0]).unwrap();
        store.commit().unwrap();

        assert!(print_ragged_array(&store.array_path("0_ROUTING_LAYERS_UP_DOWN"), 1).is_ok());
        let err = print_ragged_array(&store.array_path("broken"), 10).unwrap_err();
        assert!(format!("{err:#}").contains("broken.bin"));
    }
}
