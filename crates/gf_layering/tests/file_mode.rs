//! 文件模式：ASCII Grid 输入，目录输出

use gf_layering::output::read_array;
use gf_layering::{DirectoryStore, FailureKind, FlowMethod, GridLayering, InputNames};
use gf_raster::{write_ascii_grid, AsciiGridSource, RasterData};
use std::collections::BTreeMap;
use std::path::Path;

const ND: f64 = -9999.0;

fn write(path: &Path, data: Vec<f64>, rows: usize, cols: usize) {
    write_ascii_grid(path, &RasterData::from_data(data, rows, cols, ND).unwrap()).unwrap();
}

/// 目录中全部文件的内容
fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| {
            let path = e.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            (name, std::fs::read(&path).unwrap())
        })
        .collect()
}

/// 2 x 2 Dinf: 单元 0 流向 E(0.25) + S(0.75)，其余汇向右下角
fn write_dinf_inputs(dir: &Path) {
    write(&dir.join("fd.asc"), vec![5.0, 4.0, 1.0, 0.0], 2, 2);
    write(&dir.join("mask.asc"), vec![1.0; 4], 2, 2);
    write(&dir.join("frac.asc"), vec![0.25, 1.0, 1.0, 1.0], 2, 2);
}

fn run(method: FlowMethod, input: &Path, names: &InputNames, out: &Path) -> gf_layering::LayeringSummary {
    let mut engine = GridLayering::new(0, method);
    engine
        .load_data(&AsciiGridSource::with_root(input), names)
        .unwrap();
    let mut store = DirectoryStore::new(out);
    engine.execute(&mut store).unwrap()
}

#[test]
fn dinf_first_direction_fraction() {
    let dir = tempfile::tempdir().unwrap();
    write_dinf_inputs(dir.path());
    let names = InputNames::from_paths(
        FlowMethod::Dinf,
        Path::new("fd.asc"),
        Some(Path::new("mask.asc")),
        Some(Path::new("frac.asc")),
    );
    let out = dir.path().join("out");
    let summary = run(FlowMethod::Dinf, dir.path(), &names, &out);
    assert_eq!(summary.n_valid, 4);
    assert_eq!(summary.up_down_layers, 3);
    assert_eq!(summary.fraction_warnings, 0);

    let store = DirectoryStore::new(&out);
    let out_ids = read_array(&store.array_path("0_FLOWOUT_INDEX_DINF")).unwrap();
    let out_fr = read_array(&store.array_path("0_FLOWOUT_FRACTION_DINF")).unwrap();
    assert_eq!(out_ids, vec![4.0, 2.0, 1.0, 2.0, 1.0, 3.0, 1.0, 3.0, 0.0]);
    assert_eq!(out_fr, vec![4.0, 2.0, 0.25, 0.75, 1.0, 1.0, 1.0, 1.0, 0.0]);

    let in_ids = read_array(&store.array_path("0_FLOWIN_INDEX_DINF")).unwrap();
    let in_fr = read_array(&store.array_path("0_FLOWIN_FRACTION_DINF")).unwrap();
    assert_eq!(in_ids, vec![4.0, 0.0, 1.0, 0.0, 1.0, 0.0, 2.0, 2.0, 1.0]);
    assert_eq!(in_fr, vec![4.0, 0.0, 1.0, 0.25, 1.0, 0.75, 2.0, 1.0, 1.0]);

    let layers = read_array(&store.array_path("0_ROUTING_LAYERS_UP_DOWN_DINF")).unwrap();
    assert_eq!(layers, vec![3.0, 1.0, 0.0, 2.0, 1.0, 2.0, 1.0, 3.0]);
    assert!(store.grid_path("0_ROUTING_LAYERS_DOWN_UP_DINF").is_file());

    let table = std::fs::read_to_string(store.table_path("0_FLOWOUT_INDEX_DINF")).unwrap();
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines[1], "ID\tDownstreamCount\tDownstreamID\tFlowOutFraction");
    assert_eq!(lines[2], "0\t2\t1,2\t0.25,0.75");
}

#[test]
fn dinf_fraction_must_cover_mask() {
    let dir = tempfile::tempdir().unwrap();
    write_dinf_inputs(dir.path());
    write(&dir.path().join("frac.asc"), vec![0.25, 1.0, ND, 1.0], 2, 2);
    let names = InputNames::from_paths(
        FlowMethod::Dinf,
        Path::new("fd.asc"),
        None,
        Some(Path::new("frac.asc")),
    );
    let mut engine = GridLayering::new(0, FlowMethod::Dinf);
    let err = engine
        .load_data(&AsciiGridSource::with_root(dir.path()), &names)
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Configuration);
}

#[test]
fn mfd_fraction_files_are_expanded() {
    let dir = tempfile::tempdir().unwrap();
    // 单元 0: E(0.5) + SE(0.25) + S(0.25)
    write(&dir.path().join("fd.asc"), vec![7.0, 4.0, 1.0, 0.0], 2, 2);
    for k in 1..=8 {
        let data = match k {
            1 => vec![0.5, ND, 1.0, ND],
            7 => vec![0.25, 1.0, ND, ND],
            8 => vec![0.25, ND, ND, ND],
            _ => vec![ND; 4],
        };
        write(&dir.path().join(format!("frac_{k}.asc")), data, 2, 2);
    }
    let names = InputNames::from_paths(
        FlowMethod::MfdMd,
        Path::new("fd.asc"),
        Some(Path::new("fd.asc")),
        Some(Path::new("frac.asc")),
    );
    assert!(names.mask.is_none());

    let out = dir.path().join("out");
    let summary = run(FlowMethod::MfdMd, dir.path(), &names, &out);
    assert_eq!(summary.flow_out_edges, 5);
    assert_eq!(summary.fraction_warnings, 0);
    assert_eq!(summary.up_down_layers, 3);
    assert_eq!(summary.widest_up_down, 2);

    let store = DirectoryStore::new(&out);
    let in_fr = read_array(&store.array_path("0_FLOWIN_FRACTION_MFDMD")).unwrap();
    assert_eq!(&in_fr[6..], &[3.0, 1.0, 0.25, 1.0]);
}

#[test]
fn missing_fraction_file_is_io_failure() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("fd.asc"), vec![1.0, 0.0], 1, 2);
    for k in 1..=7 {
        write(&dir.path().join(format!("frac_{k}.asc")), vec![1.0, ND], 1, 2);
    }
    let names = InputNames::from_paths(
        FlowMethod::MfdMd,
        Path::new("fd.asc"),
        None,
        Some(Path::new("frac.asc")),
    );
    let mut engine = GridLayering::new(0, FlowMethod::MfdMd);
    let err = engine
        .load_data(&AsciiGridSource::with_root(dir.path()), &names)
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Io);
    assert!(err.to_string().contains("frac_8.asc"));
}

#[test]
fn rerun_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    write_dinf_inputs(dir.path());
    let names = InputNames::from_paths(
        FlowMethod::Dinf,
        Path::new("fd.asc"),
        Some(Path::new("mask.asc")),
        Some(Path::new("frac.asc")),
    );
    let first = dir.path().join("a");
    let second = dir.path().join("b");
    run(FlowMethod::Dinf, dir.path(), &names, &first);
    run(FlowMethod::Dinf, dir.path(), &names, &second);

    let a = snapshot(&first);
    let b = snapshot(&second);
    // 6 个数组、2 张表、2 个分层栅格
    assert_eq!(a.len(), 10);
    assert_eq!(a, b);
}

#[test]
fn failed_write_leaves_no_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    write_dinf_inputs(dir.path());
    let names = InputNames::from_paths(
        FlowMethod::Dinf,
        Path::new("fd.asc"),
        Some(Path::new("mask.asc")),
        Some(Path::new("frac.asc")),
    );
    let out = dir.path().join("out");
    let blocked = out.join("0_ROUTING_LAYERS_UP_DOWN_DINF.asc");
    std::fs::create_dir_all(&blocked).unwrap();

    let mut engine = GridLayering::new(0, FlowMethod::Dinf);
    engine
        .load_data(&AsciiGridSource::with_root(dir.path()), &names)
        .unwrap();
    let mut store = DirectoryStore::new(&out);
    let err = engine.execute(&mut store).unwrap_err();
    assert_eq!(err.kind(), FailureKind::Io);
    assert!(err.to_string().contains("0_ROUTING_LAYERS_UP_DOWN_DINF.asc"));

    // 只剩预先占位的目录，没有数组、表或暂存文件
    let left: Vec<_> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(left, vec![blocked]);
    assert_eq!(store.staged_count(), 0);
}
