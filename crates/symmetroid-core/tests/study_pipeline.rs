//! End-to-end study runs with mock SDP solvers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use symmetroid_core::{ExternalSdp, FixedLocus, SdpOutcome, SymmetroidStudy};
use symmetroid_pencil::Pencil;
use symmetroid_types::{Component, ObjectiveDistribution, Point, StudyConfig};

/// M(x, y, z) = diag(1 + x, 1 + y, 1 + z).
fn diagonal_pencil() -> Pencil {
    let e = |k: usize| {
        let mut v = vec![0.0; 9];
        v[k * 4] = 1.0;
        v
    };
    let (a, b, c) = (e(0), e(1), e(2));
    let d = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
    Pencil::from_row_slices(3, [a.as_slice(), b.as_slice(), c.as_slice(), &d[..]]).unwrap()
}

/// Corner nodes of the spectrahedron {x, y, z >= -1} plus one mixed point.
fn nodes() -> Vec<Point> {
    vec![
        Point::new(-1.0, -1.0, 0.0), // diag(0, 0, 1)
        Point::new(-1.0, 0.0, -1.0), // diag(0, 1, 0)
        Point::new(0.0, -1.0, -1.0), // diag(1, 0, 0)
        Point::new(-3.0, 1.0, -1.0), // diag(-2, 2, 0): symmetroid
    ]
}

/// PSD: the minimizer is the corner whose free axis has the largest
/// objective coefficient. NSD: the component is empty.
fn corner_solver() -> ExternalSdp {
    ExternalSdp::new(|problem| match problem.component {
        Component::Psd => {
            let c = problem.objective;
            let free = (0..3)
                .max_by(|&i, &j| c[i].total_cmp(&c[j]))
                .unwrap_or(0);
            let mut v = [-1.0; 3];
            v[free] = 0.0;
            Ok(SdpOutcome::Solved(Point(v)))
        }
        Component::Nsd => Ok(SdpOutcome::Infeasible),
    })
}

fn study(config: StudyConfig) -> SymmetroidStudy {
    SymmetroidStudy::new(
        config,
        diagonal_pencil(),
        Arc::new(FixedLocus::new(nodes())),
        Arc::new(corner_solver()),
    )
    .unwrap()
}

#[test]
fn test_probabilities_cover_all_trials() {
    let mut s = study(StudyConfig::default());
    let sets = s.discover().unwrap();
    assert_eq!(sets.spectrahedral.len(), 3);
    assert_eq!(sets.symmetroid.len(), 1);

    s.sample(300);
    assert!(!s.state().nsd_component_exists());
    assert!(s.state().psd_component_exists());
    assert_eq!(s.state().psd_solved, 300);

    let ranking = s.rank().unwrap().to_vec();
    let total: f64 = ranking.iter().map(|r| r.probability).sum();
    assert!((total - 1.0).abs() < 1e-12);
    assert!(ranking.iter().all(|r| r.probability > 0.1));
    assert!(ranking
        .windows(2)
        .all(|w| w[0].probability >= w[1].probability));
}

#[test]
fn test_nsd_latched_after_one_call() {
    let nsd_calls = Arc::new(AtomicUsize::new(0));
    let counter = nsd_calls.clone();
    let solver = ExternalSdp::new(move |problem| match problem.component {
        Component::Psd => Ok(SdpOutcome::Unbounded),
        Component::Nsd => {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(SdpOutcome::Infeasible)
        }
    });
    let mut s = SymmetroidStudy::new(
        StudyConfig::default(),
        diagonal_pencil(),
        Arc::new(FixedLocus::new(nodes())),
        Arc::new(solver),
    )
    .unwrap();
    s.sample(20);
    s.sample(20);
    assert_eq!(nsd_calls.load(Ordering::SeqCst), 1);
    assert_eq!(s.state().trials, 40);
    assert_eq!(s.state().fully_unbounded_directions, 0);
}

#[test]
fn test_same_seed_same_ranking() {
    let config = StudyConfig {
        seed: 7,
        objective: ObjectiveDistribution::Sphere,
        ..Default::default()
    };
    let mut a = study(config.clone());
    let mut b = study(config);
    a.sample(100);
    b.sample(100);
    assert_eq!(a.rank().unwrap(), b.rank().unwrap());
}

#[test]
fn test_parallel_run_is_reproducible() {
    let config = StudyConfig {
        workers: 4,
        ..Default::default()
    };
    let mut a = study(config.clone());
    let mut b = study(config);
    a.sample(101);
    b.sample(101);
    assert_eq!(a.state().trials, 101);
    // Minima order varies with scheduling; counts do not.
    assert_eq!(a.rank().unwrap(), b.rank().unwrap());
}

#[test]
fn test_report_zero_trials() {
    let mut s = study(StudyConfig::default());
    let mut buf = Vec::new();
    s.report(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.starts_with("spectrahedral nodes: 3\nsymmetroid nodes: 4\n\nnode 1:\n"));
    assert!(!text.contains("probability"));
    assert!(!text.contains("has psd component"));
    assert!(text.contains("symmetroid node 1:\nlocation: [-3, 1, -1]\neigenvalues:\n"));
}

#[test]
fn test_report_after_sampling() {
    let mut s = study(StudyConfig::default());
    s.sample(50);
    let mut buf = Vec::new();
    s.report(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains("has psd component: true\nhas nsd component: false\n\n"));
    assert!(!text.contains("fraction of"));
    assert_eq!(text.matches("probability: ").count(), 3);
    assert!(!s.state().has_pending_minima());
}

#[test]
fn test_config_from_json_drives_study() {
    let config = StudyConfig::from_json(r#"{"tolerance": 0.01, "seed": 3, "objective": "sphere"}"#)
        .unwrap();
    assert_eq!(config.objective, ObjectiveDistribution::Sphere);
    let mut s = study(config);
    s.sample(10);
    assert_eq!(s.state().trials, 10);
    assert!(s.rank().unwrap().len() == 3);
}

#[test]
fn test_probability_bounded_when_both_minima_share_a_node() {
    // The PSD and NSD minima of every trial sit 1 away from the only node;
    // the 0.5 × 10 radius captures both.
    let pencil = Pencil::from_row_slices(
        2,
        [
            &[1.0, 0.0, 0.0, 0.0],
            &[0.0, 0.0, 0.0, 1.0],
            &[0.0; 4],
            &[1.0, 0.0, 0.0, 1.0],
        ],
    )
    .unwrap();
    let solver = ExternalSdp::new(|problem| match problem.component {
        Component::Psd => Ok(SdpOutcome::Solved(Point::new(9.0, 0.0, 0.0))),
        Component::Nsd => Ok(SdpOutcome::Solved(Point::new(11.0, 0.0, 0.0))),
    });
    let config = StudyConfig {
        tolerance: 0.5,
        ..Default::default()
    };
    let mut s = SymmetroidStudy::new(
        config,
        pencil,
        Arc::new(FixedLocus::new(vec![Point::new(10.0, 0.0, 0.0)])),
        Arc::new(solver),
    )
    .unwrap();
    s.sample(10);
    assert_eq!(s.state().fully_bounded_directions, 10);
    let ranking = s.rank().unwrap().to_vec();
    assert_eq!(ranking.len(), 1);
    assert!(ranking[0].probability <= 1.0);
    assert!((ranking[0].probability - 1.0).abs() < 1e-12);
    assert_eq!(s.processed()[0].occurrences, 10);
}

#[test]
fn test_probability_bounded_with_parallel_workers() {
    let config = StudyConfig {
        workers: 3,
        tolerance: 1.0,
        ..Default::default()
    };
    let solver = ExternalSdp::new(|problem| match problem.component {
        Component::Psd => Ok(SdpOutcome::Solved(Point::new(-1.0, -1.0, 0.0))),
        Component::Nsd => Ok(SdpOutcome::Solved(Point::new(-1.0, -1.0, 0.5))),
    });
    let mut s = SymmetroidStudy::new(
        config,
        diagonal_pencil(),
        Arc::new(FixedLocus::new(nodes())),
        Arc::new(solver),
    )
    .unwrap();
    s.sample(25);
    let ranking = s.rank().unwrap();
    assert!(ranking.iter().all(|r| (0.0..=1.0).contains(&r.probability)));
}

#[cfg(unix)]
#[test]
fn test_singular_locus_via_process() {
    use symmetroid_types::LocusConfig;

    let canned = "\
[1]:
   [1]:
      -1
   [2]:
      -1
   [3]:
      0
[2]:
   [1]:
      (-1+i)
   [2]:
      0
   [3]:
      0
[3]:
   [1]:
      -3
   [2]:
      1
   [3]:
      -1
";
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("canned.txt");
    std::fs::write(&template, canned).unwrap();
    let config = StudyConfig {
        locus: LocusConfig {
            program: "cat".into(),
            args: vec![],
            template: Some(template),
            timeout_ms: 10_000,
        },
        ..Default::default()
    };
    let mut s =
        SymmetroidStudy::with_singular(config, diagonal_pencil(), Arc::new(corner_solver()))
            .unwrap();
    let sets = s.discover().unwrap();
    assert_eq!(sets.spectrahedral.len(), 1);
    assert_eq!(sets.symmetroid.len(), 1);
    assert_eq!(sets.spectrahedral[0].point, Point::new(-1.0, -1.0, 0.0));
}
