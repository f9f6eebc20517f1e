use std::fs;

use geom_kernel::{Kernel, KernelBundle, KernelSolidHandle, MockKernel, TruckKernel};
use keycap_config::{KeyConfig, MinimalStem, StemSpec};
use keycap_export::*;
use keycap_ops::Keycap;

fn basic_config() -> KeyConfig {
    KeyConfig {
        tolerance: 0.05,
        tight_tolerance: 0.01,
        wall: 1.5,
        inner_radius: 0.0,
        corner_radius: 1.0,
        back_slope: 0.0,
        front_slope: 0.0,
        side_slope: 0.0,
        back_curve: 0.0,
        front_curve: 0.0,
        front_rise: 8.0,
        back_rise: 8.0,
        height: 18.0,
        width: 1.0,
        bump: false,
        stem: StemSpec::Minimal(MinimalStem::default()),
    }
}

fn build_key(kernel: &mut dyn KernelBundle) -> KernelSolidHandle {
    Keycap::new(&basic_config()).shape(kernel).unwrap()
}

#[test]
fn export_succeeds_for_every_format() {
    let mut kernel = MockKernel::new();
    let key = build_key(&mut kernel);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");

    for format in ExportFormat::ALL {
        let path = write_solid(&mut kernel, &key, format, &out, "esc").unwrap();
        assert_eq!(path, out.join(format!("esc.{}", format.extension())));
        let bytes = fs::read(&path).unwrap();
        assert!(!bytes.is_empty(), "{format} wrote an empty file");
    }
}

#[test]
fn truck_key_exports_to_every_format() {
    let mut kernel = TruckKernel::new();
    let key = build_key(&mut kernel);
    let dir = tempfile::tempdir().unwrap();

    for format in ExportFormat::ALL {
        let path = write_solid(&mut kernel, &key, format, dir.path(), "esc").unwrap();
        let bytes = fs::read(&path).unwrap();
        match format {
            ExportFormat::Stl => {
                let count = u32::from_le_bytes(bytes[80..84].try_into().unwrap()) as usize;
                assert!(count > 0);
                assert_eq!(bytes.len(), 84 + count * 50);
            }
            ExportFormat::ThreeMf => assert_eq!(&bytes[..2], b"PK"),
            ExportFormat::Step => {
                let text = String::from_utf8(bytes).unwrap();
                assert!(text.contains("ISO-10303-21"));
                assert!(text.contains("keycap-forge (esc)"));
            }
            ExportFormat::Brep => assert!(!bytes.is_empty()),
        }
    }
}

#[test]
fn stl_triangle_count_matches_tessellation() {
    let mut kernel = MockKernel::new();
    let key = build_key(&mut kernel);
    let mesh = kernel.tessellate(&key, MESH_TOLERANCE).unwrap();
    let bytes = export_solid(&mut kernel, &key, ExportFormat::Stl, "esc").unwrap();

    let count = u32::from_le_bytes(bytes[80..84].try_into().unwrap()) as usize;
    assert_eq!(count, mesh.triangle_count());
    assert_eq!(bytes.len(), 84 + count * 50);
}

#[test]
fn step_export_names_the_key() {
    let mut kernel = MockKernel::new();
    let key = build_key(&mut kernel);
    let bytes = export_solid(&mut kernel, &key, ExportFormat::Step, "enter").unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.starts_with("ISO-10303-21;"));
    assert!(text.contains("enter"));
}

#[test]
fn three_mf_export_is_a_zip() {
    let mut kernel = MockKernel::new();
    let key = build_key(&mut kernel);
    let bytes = export_solid(&mut kernel, &key, ExportFormat::ThreeMf, "f").unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn preview_lands_next_to_the_export() {
    let mut kernel = MockKernel::new();
    let key = build_key(&mut kernel);
    let dir = tempfile::tempdir().unwrap();
    let path = write_preview(&mut kernel, &key, dir.path(), "space").unwrap();
    assert_eq!(path, dir.path().join("space.preview.stl"));
    assert!(path.exists());
}

#[test]
fn unwritable_directory_reports_the_path() {
    let mut kernel = MockKernel::new();
    let key = build_key(&mut kernel);
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();

    let err = write_solid(&mut kernel, &key, ExportFormat::Stl, &blocker, "esc").unwrap_err();
    match err {
        ExportError::Io { path, .. } => assert!(path.starts_with(&blocker)),
        other => panic!("expected Io error, got {other:?}"),
    }
}
