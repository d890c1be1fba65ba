// apps/gf_cli/src/commands/layer.rs

//! 单个子流域分层命令

use super::layer_subbasin;
use anyhow::{Context, Result};
use clap::Args;
use gf_config::{LayeringConfig, SubbasinInputs};
use gf_layering::{FlowMethod, DEFAULT_FRACTION_TOLERANCE, DEFAULT_OUT_NODATA};
use gf_raster::GridFormat;
use std::path::PathBuf;
use tracing::info;

/// 单个子流域分层参数
#[derive(Args)]
pub struct LayerArgs {
    /// 流向栅格
    #[arg(short, long)]
    pub flow_dir: PathBuf,

    /// 掩膜栅格，缺省时流向栅格兼作掩膜
    #[arg(short, long)]
    pub mask: Option<PathBuf>,

    /// 比例栅格（MFD-md 时为 `{core}_{k}.{ext}` 的公共路径）
    #[arg(long)]
    pub fraction: Option<PathBuf>,

    /// 流向算法 (d8, dinf, mfdmd)
    #[arg(short = 'a', long, default_value = "d8")]
    pub method: FlowMethod,

    /// 子流域编号，0 为整个流域
    #[arg(short, long, default_value = "0")]
    pub subbasin: u32,

    /// 输出目录
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// 流出比例之和的容差
    #[arg(long, default_value_t = DEFAULT_FRACTION_TOLERANCE)]
    pub tolerance: f64,

    /// 输出无数据值
    #[arg(long, default_value_t = DEFAULT_OUT_NODATA, allow_hyphen_values = true)]
    pub nodata: f64,

    /// 分层栅格格式 (ascii；启用 gdal 时可选 geotiff)
    #[arg(long, default_value = "ascii")]
    pub grid_format: GridFormat,

    /// 不写出文本表
    #[arg(long)]
    pub no_text: bool,

    /// 以 JSON 打印汇总
    #[arg(long)]
    pub json: bool,
}

impl LayerArgs {
    fn to_config(&self) -> LayeringConfig {
        LayeringConfig {
            input_dir: None,
            output_dir: self.output.clone(),
            method: self.method,
            fraction_tolerance: self.tolerance,
            out_nodata: self.nodata,
            write_text: !self.no_text,
            grid_format: self.grid_format,
            subbasins: vec![SubbasinInputs {
                id: self.subbasin,
                flow_dir: self.flow_dir.clone(),
                mask: self.mask.clone(),
                fraction: self.fraction.clone(),
            }],
        }
    }
}

/// 执行单个子流域分层
pub fn execute(args: LayerArgs) -> Result<()> {
    info!("=== GridFlow 分层 ({}) ===", args.method);
    let config = args.to_config();
    config.validate().context("参数无效")?;

    let summary = layer_subbasin(&config, &config.subbasins[0])
        .with_context(|| format!("子流域 {} 分层失败", args.subbasin))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("子流域:        {}", summary.subbasin_id);
        println!("有效单元:      {}", summary.n_valid);
        println!("流入/流出边:   {} / {}", summary.flow_in_edges, summary.flow_out_edges);
        println!("丢弃入边:      {}", summary.dropped_in_edges);
        println!(
            "自上而下:      {} 层 (最宽 {})",
            summary.up_down_layers, summary.widest_up_down
        );
        println!(
            "自下而上:      {} 层 (最宽 {})",
            summary.down_up_layers, summary.widest_down_up
        );
        println!("比例警告:      {}", summary.fraction_warnings);
    }
    Ok(())
}
