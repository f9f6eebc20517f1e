use approx::assert_relative_eq;
use geom_kernel::{Kernel, KernelError, KernelIntrospect, KernelSolidHandle, MockKernel, TopoKind};
use keycap_config::{FormalStem, KeyConfig, MinimalStem, ReinforcedStem, StemSpec};
use keycap_ops::profile::height_profile;
use keycap_ops::select::{filter_parallel, group_by_axis, LAYER_TOLERANCE};
use keycap_ops::stem::{Minimal, Stem};
use keycap_ops::*;
use keycap_types::{Axis, Curve2d};
use proptest::prelude::*;

/// 18 mm square key, flat top, no slopes, 1.5 mm wall.
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

fn sculpted_config() -> KeyConfig {
    KeyConfig {
        back_slope: 5f64.to_radians(),
        front_slope: 10f64.to_radians(),
        side_slope: 8f64.to_radians(),
        back_curve: 0.6,
        front_curve: -0.4,
        back_rise: 10.0,
        inner_radius: 0.5,
        ..basic_config()
    }
}

// ── Outer Profile ──────────────────────────────────────────────────────────

#[test]
fn outer_profile_shrinks_with_negative_offset() {
    let mut kernel = MockKernel::new();
    let geom = KeyGeometry::new(&basic_config());
    let full = outer_profile(&mut kernel, &geom, 0.0).unwrap();
    let shrunk = outer_profile(&mut kernel, &geom, -1.5).unwrap();
    assert!(kernel.volume(&full).unwrap() > kernel.volume(&shrunk).unwrap());
}

#[test]
fn outer_profile_is_repeatable() {
    let mut kernel = MockKernel::new();
    let geom = KeyGeometry::new(&sculpted_config());
    let a = outer_profile(&mut kernel, &geom, 0.0).unwrap();
    let b = outer_profile(&mut kernel, &geom, 0.0).unwrap();
    assert_relative_eq!(kernel.volume(&a).unwrap(), kernel.volume(&b).unwrap());
    assert_eq!(kernel.list_faces(&a).len(), kernel.list_faces(&b).len());
    assert_eq!(kernel.list_edges(&a).len(), kernel.list_edges(&b).len());
}

#[test]
fn outer_rounding_leaves_bottom_edges_sharp() {
    let mut kernel = MockKernel::new();
    let sharp_geom = KeyGeometry::new(&KeyConfig {
        corner_radius: 0.0,
        ..basic_config()
    });
    let sharp = outer_profile(&mut kernel, &sharp_geom, 0.0).unwrap();
    let rounded = outer_profile(&mut kernel, &KeyGeometry::new(&basic_config()), 0.0).unwrap();

    // Fillet boundaries may touch the floor, but every long floor edge survives.
    let long_bottom_edges = |kernel: &MockKernel, solid: &KernelSolidHandle| {
        let edges = kernel.compute_all_signatures(solid, TopoKind::Edge);
        group_by_axis(edges, Axis::Z, LAYER_TOLERANCE)[0]
            .iter()
            .filter(|(_, sig)| sig.length.unwrap_or(0.0) > 1.0)
            .count()
    };
    assert_eq!(long_bottom_edges(&kernel, &sharp), 4);
    assert_eq!(long_bottom_edges(&kernel, &rounded), 4);
    assert!(kernel.list_faces(&rounded).len() > kernel.list_faces(&sharp).len());
}

#[test]
fn offset_corner_radius_is_clamped() {
    let mut kernel = MockKernel::new();
    let geom = KeyGeometry::new(&basic_config());
    // corner_radius 1.0 - 1.5 would be negative; the profile stays sharp.
    let inner = outer_profile(&mut kernel, &geom, -1.5).unwrap();
    let faces = kernel.compute_all_signatures(&inner, TopoKind::Face);
    assert!(faces
        .iter()
        .all(|(_, sig)| sig.surface_type.as_deref() != Some("cylindrical")));
}

#[test]
fn oversized_corner_radius_fails_loudly() {
    let mut kernel = MockKernel::new();
    let geom = KeyGeometry::new(&KeyConfig {
        corner_radius: 40.0,
        ..basic_config()
    });
    let err = outer_profile(&mut kernel, &geom, 0.0).unwrap_err();
    assert!(matches!(err, OpError::Kernel(KernelError::FilletFailed { .. })));
}

// ── Shell & Filler ─────────────────────────────────────────────────────────

#[test]
fn shell_is_outer_minus_inner() {
    let mut kernel = MockKernel::new();
    let geom = KeyGeometry::new(&basic_config());
    let outer = outer_profile(&mut kernel, &geom, 0.0).unwrap();
    let inner = inner_profile(&mut kernel, &geom).unwrap();
    let hollow = shell(&mut kernel, &geom, &outer).unwrap();

    let expected = kernel.volume(&outer).unwrap() - kernel.volume(&inner).unwrap();
    assert_relative_eq!(kernel.volume(&hollow).unwrap(), expected, epsilon = 1e-9);
    assert!(!kernel.list_faces(&hollow).is_empty());
}

#[test]
fn zero_wall_leaves_empty_shell() {
    let mut kernel = MockKernel::new();
    let geom = KeyGeometry::new(&KeyConfig {
        wall: 0.0,
        ..basic_config()
    });
    let outer = outer_profile(&mut kernel, &geom, 0.0).unwrap();
    let hollow = shell(&mut kernel, &geom, &outer).unwrap();
    assert_relative_eq!(kernel.volume(&hollow).unwrap(), 0.0);
}

#[test]
fn filler_is_bounded_by_outer() {
    let mut kernel = MockKernel::new();
    let geom = KeyGeometry::new(&basic_config());
    let outer = outer_profile(&mut kernel, &geom, 0.0).unwrap();
    let bound = filler_bound(&mut kernel, &geom).unwrap();
    let filler = top_filler(&mut kernel, &geom, &bound).unwrap();
    assert!(kernel.volume(&filler).unwrap() <= kernel.volume(&bound).unwrap() + 1e-9);
    assert!(kernel.volume(&bound).unwrap() < kernel.volume(&outer).unwrap());
}

#[test]
fn inner_profile_reaches_below_mounting_face() {
    let mut kernel = MockKernel::new();
    let geom = KeyGeometry::new(&basic_config());
    let inner = inner_profile(&mut kernel, &geom).unwrap();
    let lowest = kernel
        .compute_all_signatures(&inner, TopoKind::Vertex)
        .into_iter()
        .filter_map(|(_, sig)| sig.centroid)
        .map(|c| c[2])
        .fold(f64::INFINITY, f64::min);
    assert_relative_eq!(lowest, -CUT_OVERSHOOT, epsilon = 1e-9);
}

// ── Curvature ──────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn curvature_threshold_picks_closing_curve(curve in -2.0f64..2.0) {
        let geom = KeyGeometry::new(&basic_config());
        let wire = height_profile(&geom, 18.0, 8.0, curve).unwrap();
        let closing = wire.curves()[wire.len() - 1];
        if curve.abs() > EPS {
            match closing {
                Curve2d::Arc { start, mid, end } => {
                    prop_assert_eq!(start, [9.0, 8.0]);
                    prop_assert_eq!(end, [-9.0, 8.0]);
                    prop_assert!((mid[1] - (8.0 - curve)).abs() < 1e-12);
                }
                Curve2d::Segment { .. } => prop_assert!(false, "expected an arc for {}", curve),
            }
        } else {
            prop_assert!(!closing.is_arc());
        }
    }

    #[test]
    fn width_tracks_multiplier(height in 10.0f64..30.0, multiplier in 1.0f64..6.25) {
        let geom = KeyGeometry::new(&KeyConfig { height, width: multiplier, ..basic_config() });
        prop_assert_eq!(geom.width, height * multiplier);
        prop_assert!(geom.max_front_height >= geom.config.front_rise);
        prop_assert!(geom.max_back_height >= geom.config.back_rise);
    }
}

// ── Stems ──────────────────────────────────────────────────────────────────

#[test]
fn minimal_inner_edges_come_from_one_face() {
    let mut kernel = MockKernel::new();
    let config = KeyConfig {
        inner_radius: 0.5,
        ..basic_config()
    };
    let keycap = Keycap::new(&config);
    let geom = keycap.geometry().clone();
    let stem = Minimal(MinimalStem::default())
        .build(&mut kernel, &StemContext::new(&geom))
        .unwrap();

    let faces = filter_parallel(kernel.compute_all_signatures(&stem, TopoKind::Face), Axis::Z);
    let layers = group_by_axis(faces, Axis::Z, LAYER_TOLERANCE);
    // Block bottom, slot ceiling under the plinth, then the top.
    assert_eq!(layers.len(), 3);
    assert_relative_eq!(layers[2][0].1.centroid.unwrap()[2], 3.85 + 0.5 + 0.1, epsilon = 1e-9);

    let edges = keycap
        .stem()
        .select_inner_radius_edges(&kernel, &stem)
        .unwrap();
    let first_face_edges = kernel.face_edges(layers[2][0].0);
    assert_eq!(edges, first_face_edges);
}

#[test]
fn round_stems_select_whole_layer() {
    let mut kernel = MockKernel::new();
    for spec in [
        StemSpec::Formal(FormalStem::default()),
        StemSpec::Reinforced(ReinforcedStem::default()),
    ] {
        let config = KeyConfig {
            inner_radius: 0.5,
            stem: spec,
            ..basic_config()
        };
        let keycap = Keycap::new(&config);
        let shape = keycap.shape(&mut kernel).unwrap();
        let faces = filter_parallel(kernel.compute_all_signatures(&shape, TopoKind::Face), Axis::Z);
        assert!(group_by_axis(faces, Axis::Z, LAYER_TOLERANCE).len() > 2);
    }
}

// ── Assembly ───────────────────────────────────────────────────────────────

#[test]
fn basic_key_is_shell_filler_and_stem() {
    let mut kernel = MockKernel::new();
    let config = basic_config();
    let keycap = Keycap::new(&config);
    let shape = keycap.shape(&mut kernel).unwrap();

    let geom = keycap.geometry();
    let outer = outer_profile(&mut kernel, geom, 0.0).unwrap();
    let hollow = shell(&mut kernel, geom, &outer).unwrap();
    let bound = filler_bound(&mut kernel, geom).unwrap();
    let filler = top_filler(&mut kernel, geom, &bound).unwrap();
    let stem = keycap
        .stem()
        .build(&mut kernel, &StemContext::new(geom))
        .unwrap();
    let expected = kernel.volume(&hollow).unwrap()
        + kernel.volume(&filler).unwrap()
        + kernel.volume(&stem).unwrap();
    assert_relative_eq!(kernel.volume(&shape).unwrap(), expected, epsilon = 1e-9);
}

#[test]
fn filleting_kernel_reports_nothing_unrounded() {
    let mut kernel = MockKernel::new();
    let built = Keycap::new(&sculpted_config()).build(&mut kernel).unwrap();
    assert!(built.unrounded.is_empty());
    assert!(kernel.volume(&built.solid).unwrap() > 0.0);
}

#[test]
fn interior_fillet_removes_material() {
    let mut kernel = MockKernel::new();
    let config = KeyConfig {
        inner_radius: 0.5,
        ..basic_config()
    };
    let keycap = Keycap::new(&config);
    let shape = keycap.shape(&mut kernel).unwrap();
    let fillets = kernel
        .compute_all_signatures(&shape, TopoKind::Face)
        .into_iter()
        .filter(|(_, sig)| sig.surface_type.as_deref() == Some("cylindrical"))
        .count();
    // Outer rounding, stem corners and the interior fillet all leave faces.
    assert!(fillets > 0);
}

#[test]
fn bump_adds_material() {
    let mut kernel = MockKernel::new();
    let plain = Keycap::new(&basic_config()).shape(&mut kernel).unwrap();
    let bumped = Keycap::new(&KeyConfig {
        bump: true,
        ..basic_config()
    })
    .shape(&mut kernel)
    .unwrap();
    assert!(kernel.volume(&bumped).unwrap() > kernel.volume(&plain).unwrap());
}

#[test]
fn sculpted_key_builds_with_every_stem() {
    let mut kernel = MockKernel::new();
    for stem in [
        StemSpec::Minimal(MinimalStem::default()),
        StemSpec::Formal(FormalStem::default()),
        StemSpec::Reinforced(ReinforcedStem::default()),
    ] {
        let config = KeyConfig {
            stem,
            bump: true,
            ..sculpted_config()
        };
        let shape = Keycap::new(&config).shape(&mut kernel).unwrap();
        assert!(kernel.volume(&shape).unwrap() > 0.0);
    }
}

#[test]
fn wide_key_builds() {
    let mut kernel = MockKernel::new();
    let config = KeyConfig {
        width: 2.25,
        ..basic_config()
    };
    let keycap = Keycap::new(&config);
    assert_eq!(keycap.geometry().width, 40.5);
    keycap.shape(&mut kernel).unwrap();
}
