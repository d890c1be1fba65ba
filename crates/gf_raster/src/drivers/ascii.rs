// crates/gf_raster/src/drivers/ascii.rs

//! ESRI ASCII Grid 驱动
//!
//! 文件格式：
//!
//! ```text
//! ncols         4
//! nrows         3
//! xllcorner     0.0
//! yllcorner     0.0
//! cellsize      30.0
//! NODATA_value  -9999
//! 1 2 4 8
//! ...
//! ```
//!
//! 头部键名不区分大小写，`xllcenter`/`yllcenter` 与 `*corner` 等价处理，
//! 缺省的 `NODATA_value` 取 -9999。

use crate::error::{RasterError, RasterResult};
use crate::raster::{GridHeader, RasterData};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// 缺省无数据值
pub const DEFAULT_NODATA: f64 = -9999.0;

/// 读取 ASCII Grid 文件
pub fn read_ascii_grid(path: &Path) -> RasterResult<RasterData> {
    if !path.exists() {
        return Err(RasterError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path)?;
    let raster = parse_ascii_grid(&text, path)?;
    debug!(
        "读取栅格 {}: {} 行 x {} 列, 有效单元 {}",
        path.display(),
        raster.rows,
        raster.cols,
        raster.valid_count()
    );
    Ok(raster)
}

/// 解析 ASCII Grid 文本，`path` 仅用于错误信息
pub fn parse_ascii_grid(text: &str, path: &Path) -> RasterResult<RasterData> {
    let mut rows: Option<usize> = None;
    let mut cols: Option<usize> = None;
    let mut header = GridHeader::default();
    let mut nodata = DEFAULT_NODATA;
    let mut values: Vec<f64> = Vec::new();
    let mut in_body = false;

    for (line_no, line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if !in_body {
            let mut tokens = trimmed.split_whitespace();
            let key = tokens.next().unwrap_or_default();
            if key.parse::<f64>().is_err() {
                let raw = tokens
                    .next()
                    .ok_or_else(|| RasterError::parse(path, line_no, format!("{key} 缺少取值")))?;
                let value: f64 = raw.parse().map_err(|_| {
                    RasterError::parse(path, line_no, format!("{key} 的取值无法解析: {raw}"))
                })?;
                match key.to_ascii_lowercase().as_str() {
                    "ncols" => cols = Some(parse_dimension(value, path, line_no)?),
                    "nrows" => rows = Some(parse_dimension(value, path, line_no)?),
                    "xllcorner" | "xllcenter" => header.xll = value,
                    "yllcorner" | "yllcenter" => header.yll = value,
                    "cellsize" => header.cell_size = value,
                    "nodata_value" => nodata = value,
                    other => {
                        return Err(RasterError::parse(
                            path,
                            line_no,
                            format!("未知的头部字段: {other}"),
                        ))
                    }
                }
                continue;
            }
            in_body = true;
        }

        for token in trimmed.split_whitespace() {
            let v: f64 = token.parse().map_err(|_| {
                RasterError::parse(path, line_no, format!("无法解析数值: {token}"))
            })?;
            values.push(v);
        }
    }

    let rows = rows.ok_or_else(|| RasterError::parse(path, 0, "缺少 nrows"))?;
    let cols = cols.ok_or_else(|| RasterError::parse(path, 0, "缺少 ncols"))?;
    let expected = rows
        .checked_mul(cols)
        .ok_or_else(|| RasterError::parse(path, 0, format!("行列数过大: {rows} x {cols}")))?;
    if values.len() != expected {
        return Err(RasterError::SizeMismatch {
            name: path.display().to_string(),
            expected,
            actual: values.len(),
        });
    }

    Ok(RasterData::from_data(values, rows, cols, nodata)?.with_header(header))
}

fn parse_dimension(value: f64, path: &Path, line: usize) -> RasterResult<usize> {
    if value < 0.0 || value.fract() != 0.0 {
        return Err(RasterError::parse(path, line, format!("行列数必须为非负整数: {value}")));
    }
    Ok(value as usize)
}

/// 写出 ASCII Grid 文件
pub fn write_ascii_grid(path: &Path, raster: &RasterData) -> RasterResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "ncols         {}", raster.cols)?;
    writeln!(writer, "nrows         {}", raster.rows)?;
    writeln!(writer, "xllcorner     {}", raster.header.xll)?;
    writeln!(writer, "yllcorner     {}", raster.header.yll)?;
    writeln!(writer, "cellsize      {}", raster.header.cell_size)?;
    writeln!(writer, "NODATA_value  {}", format_value(raster.nodata))?;

    let mut line = String::new();
    for row in raster.data.chunks(raster.cols.max(1)) {
        line.clear();
        for (i, &v) in row.iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            line.push_str(&format_value(v));
        }
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

/// 整数值不带小数点输出
fn format_value(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
