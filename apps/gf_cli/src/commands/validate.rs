// apps/gf_cli/src/commands/validate.rs

//! 配置验证命令
//!
//! 加载每个子流域的输入并在内存中完成构建，不写出任何产物。

use super::load_config;
use anyhow::{bail, Context, Result};
use clap::Args;
use gf_raster::file_source;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 严格模式（比例警告也视为错误）
    #[arg(long)]
    pub strict: bool,
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== GridFlow 配置验证 ===");
    let config = load_config(&args.config)
        .with_context(|| format!("读取配置失败: {}", args.config.display()))?;

    let source = file_source(config.input_dir.as_deref());

    let mut errors = 0usize;
    let mut warnings = 0usize;
    for sub in &config.subbasins {
        let mut engine = config.engine_for(sub);
        let built = engine
            .load_data(source.as_ref(), &sub.input_names(config.method))
            .and_then(|_| engine.build());
        match built {
            Ok(output) => {
                let n = output.report.warning_count();
                if n > 0 {
                    warn!("子流域 {}: {n} 个比例警告", sub.id);
                    for w in output.report.warnings.iter().take(5) {
                        warn!("  {w}");
                    }
                }
                warnings += n;
                println!(
                    "✓ 子流域 {}: {} 个有效单元, {} / {} 层",
                    sub.id,
                    output.index.n_valid(),
                    output.up_down.n_layers(),
                    output.down_up.n_layers()
                );
            }
            Err(e) => {
                error!("子流域 {}: {e}", sub.id);
                println!("✗ 子流域 {}: [{:?}] {e}", sub.id, e.kind());
                errors += 1;
            }
        }
    }

    println!("\n错误: {errors}, 警告: {warnings}");
    if errors > 0 || (args.strict && warnings > 0) {
        bail!("验证未通过");
    }
    Ok(())
}
