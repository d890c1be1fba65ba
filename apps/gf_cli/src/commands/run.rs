// apps/gf_cli/src/commands/run.rs

//! 批量分层命令
//!
//! 每个子流域各用一个引擎实例，由 rayon 并发处理；
//! 单个子流域失败只记录错误，不影响其他子流域。

use super::{layer_subbasin, load_config};
use anyhow::{bail, Context, Result};
use clap::Args;
use gf_foundation::GfResult;
use gf_layering::LayeringSummary;
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

/// 批量分层参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 覆盖配置中的输出目录
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 并发线程数（0 为自动）
    #[arg(short = 'j', long, default_value = "0")]
    pub jobs: usize,

    /// 将汇总写入 JSON 文件
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

/// 执行批量分层
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== GridFlow 批量分层 ===");
    let mut config = load_config(&args.config)
        .with_context(|| format!("读取配置失败: {}", args.config.display()))?;
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    if config.subbasins.is_empty() {
        bail!("配置中没有子流域: {}", args.config.display());
    }

    info!(
        "算法 {}, {} 个子流域, 输出目录 {}",
        config.method,
        config.subbasins.len(),
        config.output_dir.display()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs)
        .thread_name(|i| format!("layer-{i}"))
        .build()
        .context("创建线程池失败")?;

    let start = Instant::now();
    let results: Vec<(u32, GfResult<LayeringSummary>)> = pool.install(|| {
        config
            .subbasins
            .par_iter()
            .map(|sub| (sub.id, layer_subbasin(&config, sub)))
            .collect()
    });

    let mut summaries = Vec::new();
    let mut failed = Vec::new();
    for (id, result) in results {
        match result {
            Ok(summary) => {
                if summary.fraction_warnings > 0 {
                    warn!("子流域 {id}: {} 个单元的流出比例之和偏离 1", summary.fraction_warnings);
                }
                summaries.push(summary);
            }
            Err(e) => {
                error!("子流域 {id} 失败: {e}");
                failed.push(id);
            }
        }
    }

    info!(
        "完成 {} / {} 个子流域, 耗时 {:.2} s",
        summaries.len(),
        config.subbasins.len(),
        start.elapsed().as_secs_f64()
    );

    if let Some(path) = &args.summary {
        let text = serde_json::to_string_pretty(&summaries)?;
        std::fs::write(path, text).with_context(|| format!("写出汇总失败: {}", path.display()))?;
    }

    if !failed.is_empty() {
        bail!("{} 个子流域失败: {:?}", failed.len(), failed);
    }
    Ok(())
}
