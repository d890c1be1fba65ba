// apps/gf_cli/src/main.rs

//! GridFlow 命令行界面
//!
//! 由流向栅格构建汇流邻接与分层数组。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// GridFlow 汇流分层命令行工具
#[derive(Parser)]
#[command(name = "gf_cli")]
#[command(version, about = "Flow-routing adjacency and grid layering for D8, Dinf and MFD-md")]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value_t = Level::INFO)]
    log_level: Level,

    /// 日志中显示线程名（批量并行时区分子流域）
    #[arg(long, global = true)]
    log_threads: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 对单个子流域分层
    Layer(commands::layer::LayerArgs),
    /// 按配置文件批量分层
    Run(commands::run::RunArgs),
    /// 只构建不写出，检查输入
    Validate(commands::validate::ValidateArgs),
    /// 显示方向表与默认配置
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_thread_names(cli.log_threads)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Layer(args) => commands::layer::execute(args),
        Commands::Run(args) => commands::run::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Info(args) => commands::info::execute(args),
    }
}
