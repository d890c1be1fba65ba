//! 配置文件读写

use gf_config::{ConfigError, LayeringConfig, SubbasinInputs};
use gf_layering::FlowMethod;
use std::path::PathBuf;

#[test]
fn save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layering.json");

    let config = LayeringConfig {
        method: FlowMethod::MfdMd,
        write_text: false,
        subbasins: vec![SubbasinInputs {
            id: 1,
            flow_dir: PathBuf::from("1/fd.asc"),
            mask: Some(PathBuf::from("1/mask.asc")),
            fraction: Some(PathBuf::from("1/frac.asc")),
        }],
        ..Default::default()
    };
    config.save_to_file(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"MFDMD\""));

    let back = LayeringConfig::from_file(&path).unwrap();
    assert_eq!(back, config);
}

#[test]
fn missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = LayeringConfig::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn malformed_json() {
    let err = LayeringConfig::from_json_str("{ \"subbasins\": [ }").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
