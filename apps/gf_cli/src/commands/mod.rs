// apps/gf_cli/src/commands/mod.rs

//! 子命令

pub mod info;
pub mod layer;
pub mod run;
pub mod validate;

use gf_config::{LayeringConfig, SubbasinInputs};
use gf_foundation::GfResult;
use gf_layering::{DirectoryStore, LayeringSummary};
use gf_raster::file_source;
use std::path::Path;
use tracing::info;

/// 读取并校验配置文件
pub(crate) fn load_config(path: &Path) -> GfResult<LayeringConfig> {
    Ok(LayeringConfig::from_file(path)?)
}

/// 加载、构建并写出一个子流域
pub(crate) fn layer_subbasin(
    config: &LayeringConfig,
    sub: &SubbasinInputs,
) -> GfResult<LayeringSummary> {
    let source = file_source(config.input_dir.as_deref());
    let mut engine = config.engine_for(sub);
    engine.load_data(source.as_ref(), &sub.input_names(config.method))?;

    let mut store = DirectoryStore::new(&config.output_dir)
        .with_text(config.write_text)
        .with_grid_format(config.grid_format);
    let summary = engine.execute(&mut store)?;
    info!("子流域 {} 产物写入 {}", sub.id, store.root().display());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gf_foundation::GfError;
    use gf_layering::FlowMethod;
    use gf_raster::{write_ascii_grid, RasterData};
    use std::path::PathBuf;

    #[test]
    fn test_layer_subbasin_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let fd = RasterData::from_data(vec![1.0, 1.0, 0.0], 1, 3, -9999.0).unwrap();
        write_ascii_grid(&dir.path().join("fd.asc"), &fd).unwrap();

        let config = LayeringConfig {
            input_dir: Some(dir.path().to_path_buf()),
            output_dir: dir.path().join("out"),
            method: FlowMethod::D8,
            write_text: false,
            subbasins: vec![SubbasinInputs {
                id: 7,
                flow_dir: PathBuf::from("fd.asc"),
                mask: None,
                fraction: None,
            }],
            ..Default::default()
        };
        let summary = layer_subbasin(&config, &config.subbasins[0]).unwrap();
        assert_eq!(summary.up_down_layers, 3);
        assert!(dir.path().join("out/7_FLOWIN_INDEX_D8.bin").is_file());
        assert!(dir.path().join("out/7_ROUTING_LAYERS_UP_DOWN.asc").is_file());
        assert!(!dir.path().join("out/7_FLOWIN_INDEX_D8.txt").exists());
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = LayeringConfig {
            input_dir: Some(dir.path().to_path_buf()),
            output_dir: dir.path().join("out"),
            subbasins: vec![SubbasinInputs {
                id: 1,
                flow_dir: PathBuf::from("absent.asc"),
                mask: None,
                fraction: None,
            }],
            ..Default::default()
        };
        let err = layer_subbasin(&config, &config.subbasins[0]).unwrap_err();
        assert!(matches!(err, GfError::Io { .. }), "{err:?}");
        assert!(err.to_string().contains("absent.asc"));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_load_config_errors_are_unified() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, GfError::Io { .. }));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config(&path).unwrap_err(), GfError::Serialization { .. }));
    }
}
