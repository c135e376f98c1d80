use approx::assert_abs_diff_eq;
use lidscan::prelude::*;
use ndarray::Array2;

/// Deterministic pseudo-random cloud: n points on a noisy 2-D sheet embedded
/// in 3-D, flat row-major.
fn sheet_points(n: usize) -> Vec<f64> {
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 33) as f64) / (u32::MAX as f64)
    };
    let side = (n as f64).sqrt().ceil() as usize;
    (0..n)
        .flat_map(|i| {
            let u = (i % side) as f64 + 0.3 * next();
            let v = (i / side) as f64 + 0.3 * next();
            [u, v, 0.05 * (u + v)]
        })
        .collect()
}

#[test]
fn test_two_pass_scan_shape() {
    // N=500, B0=0.2, step=50 gives search sizes 100 then 50.
    let points = sheet_points(500);

    let result = Scan::new()
        .passes(2)
        .initial_fraction(0.2)
        .shrink_step(50.0)
        .build()
        .unwrap()
        .fit(&points, 3)
        .unwrap();

    assert_eq!(result.n_passes(), 2);
    assert_eq!(result.n_points(), 500);
    assert_eq!(result.search_schedule(), &[100, 50]);
    // fit_k = round(2 * log2(3)) = 3, held constant for the run
    assert_eq!(result.fit_k(), 3);

    for pass in 0..2 {
        let row = result.row(pass);
        assert_eq!(row.len(), 500);
        for &d in row {
            assert!(d.is_finite() && d >= 0.0);
        }
    }
}

#[test]
fn test_sheet_estimates_near_two() {
    // A flat sheet in 3-D has intrinsic dimension 2; the per-point MLE
    // median should land well below the ambient dimension.
    let points = sheet_points(400);

    let result = Scan::new()
        .passes(1)
        .initial_fraction(0.1)
        .shrink_step(0.0)
        .fit_k(12)
        .build()
        .unwrap()
        .fit(&points, 3)
        .unwrap();

    let mut row = result.row(0).to_vec();
    row.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let median = row[row.len() / 2];
    assert!(
        (1.2..=3.0).contains(&median),
        "median estimate {} is far from the expected 2",
        median
    );
}

#[test]
fn test_shrink_below_one_fails_after_first_pass() {
    // N=100: pass 0 uses round(0.2 * 100) = 20; pass 1 computes
    // round(20 - 50) = -30 and must fail before its search runs.
    let points = sheet_points(100);
    let runner = Scan::new()
        .passes(2)
        .initial_fraction(0.2)
        .shrink_step(50.0)
        .build()
        .unwrap();

    let mut sink = MemorySink::new();
    let mut executor = runner.executor(&points, 3, &mut sink).unwrap();

    assert!(executor.step().unwrap());
    let err = executor.step().unwrap_err();
    assert_eq!(
        err,
        ScanError::InvalidNeighborhoodSize {
            pass: 1,
            k: -30,
            max: 99
        }
    );

    // The completed first pass survives the failure.
    let partial = executor.finish();
    assert_eq!(partial.n_passes(), 1);
    assert_eq!(partial.search_schedule(), &[20]);
    assert_eq!(sink.frames().len(), 1);
}

#[test]
fn test_schedule_is_deterministic() {
    let points = sheet_points(300);
    let run = || {
        Scan::new()
            .passes(2)
            .initial_fraction(0.2)
            .shrink_step(20.0)
            .parallel(false)
            .build()
            .unwrap()
            .fit(&points, 3)
            .unwrap()
    };

    let a = run();
    let b = run();
    assert_eq!(a.search_schedule(), b.search_schedule());
    for pass in 0..a.n_passes() {
        for (x, y) in a.row(pass).iter().zip(b.row(pass)) {
            assert_abs_diff_eq!(*x, *y, epsilon = 0.0);
        }
    }
}

#[test]
fn test_ndarray_integration() {
    let flat = sheet_points(200);
    let arr = Array2::from_shape_vec((200, 3), flat).unwrap();

    let result = Scan::new()
        .passes(1)
        .initial_fraction(0.1)
        .shrink_step(0.0)
        .build()
        .unwrap()
        .fit(&arr, 3)
        .unwrap();

    assert_eq!(result.n_passes(), 1);
    assert_eq!(result.row(0).len(), 200);
}

#[test]
fn test_error_handling() {
    // 10 coordinates cannot form 3-D points.
    let points = vec![0.0_f64; 10];
    let runner = Scan::new::<f64>().build().unwrap();

    let err = runner.fit(&points, 3);
    assert!(err.is_err());

    match err {
        Err(ScanError::MismatchedInputs { .. }) => (), // Expected
        _ => panic!("Expected MismatchedInputs error"),
    }
}

#[test]
fn test_rejects_bad_configuration() {
    assert!(Scan::new::<f64>().passes(0).build().is_err());
    assert!(Scan::new::<f64>().initial_fraction(0.0).build().is_err());
    assert!(Scan::new::<f64>().initial_fraction(1.5).build().is_err());
    assert!(Scan::new::<f64>().shrink_step(-1.0).build().is_err());
}

#[test]
fn test_memory_sink_zero_pads_low_dimensions() {
    // 2-D input: every third sink coordinate must be zero.
    let points: Vec<f64> = (0..40).map(|i| (i as f64 * 0.7).sin()).collect();
    let runner = Scan::new()
        .passes(1)
        .initial_fraction(0.3)
        .shrink_step(0.0)
        .fit_k(4)
        .build()
        .unwrap();

    let mut sink = MemorySink::new();
    let result = runner.fit_with_sink(&points, 2, &mut sink).unwrap();

    assert_eq!(sink.frames().len(), 1);
    let frame = &sink.frames()[0];
    assert_eq!(frame.pass, 0);
    assert_eq!(frame.coords3.len(), 20 * 3);
    assert_eq!(frame.colors, result.row(0));
    for i in 0..20 {
        assert_eq!(frame.coords3[i * 3], points[i * 2]);
        assert_eq!(frame.coords3[i * 3 + 1], points[i * 2 + 1]);
        assert_eq!(frame.coords3[i * 3 + 2], 0.0);
    }
}

// ============================================================================
// Stub Collaborators
// ============================================================================

/// Canned neighbor search: point i gets neighbors i+1..i+k (mod n) at
/// distances 1..k, independent of geometry.
struct RingSearch;

impl NeighborSearch<f64> for RingSearch {
    fn search(
        &self,
        points: &[f64],
        dims: usize,
        k: usize,
    ) -> Result<NeighborTable<f64>, ScanError> {
        let n = points.len() / dims;
        if k < 1 || k >= n {
            return Err(ScanError::InvalidK { k, n });
        }
        let mut indices = Vec::with_capacity(n * k);
        let mut distances = Vec::with_capacity(n * k);
        for i in 0..n {
            for j in 1..=k {
                indices.push((i + j) % n);
                distances.push(j as f64);
            }
        }
        Ok(NeighborTable::from_flat(k, indices, distances))
    }
}

#[test]
fn test_stubbed_search_gives_uniform_rows() {
    // With identical canned distances everywhere, every point in a pass
    // must receive the same estimate.
    let points = sheet_points(50);
    let result = Scan::new()
        .passes(2)
        .initial_fraction(0.2)
        .shrink_step(2.0)
        .neighbor_search(RingSearch)
        .build()
        .unwrap()
        .fit(&points, 3)
        .unwrap();

    assert_eq!(result.search_schedule(), &[10, 8]);
    for pass in 0..2 {
        let row = result.row(pass);
        for &d in row {
            assert_abs_diff_eq!(d, row[0], epsilon = 1e-15);
        }
    }
}

/// Fitter that fails for one point once the search size shrinks to a target,
/// to exercise the fail-fast pass abandonment.
struct FailOnPoint {
    point: usize,
    at_search_k: usize,
}

impl DimensionFitter<f64> for FailOnPoint {
    fn fit(
        &self,
        point: usize,
        local_cloud: &[f64],
        dims: usize,
        fit_k: usize,
        neighbor_indices: &[usize],
        neighbor_distances: &[f64],
    ) -> Result<FitOutcome<f64>, ScanError> {
        if point == self.point && neighbor_distances.len() == self.at_search_k {
            return Err(ScanError::FitFailure {
                point,
                reason: "stubbed non-convergence".to_string(),
            });
        }
        MleFitter::new().fit(
            point,
            local_cloud,
            dims,
            fit_k,
            neighbor_indices,
            neighbor_distances,
        )
    }
}

#[test]
fn test_fit_failure_abandons_pass_keeps_earlier_rows() {
    // N=60, B0=0.2, step=5: pass 0 searches k=12, pass 1 searches k=7.
    // The stub fails point 7 only at k=7, so pass 0 completes and pass 1
    // produces no row.
    let points = sheet_points(60);
    let runner = Scan::new()
        .passes(2)
        .initial_fraction(0.2)
        .shrink_step(5.0)
        .parallel(false)
        .fitter(FailOnPoint {
            point: 7,
            at_search_k: 7,
        })
        .build()
        .unwrap();

    let mut sink = MemorySink::new();
    let mut executor = runner.executor(&points, 3, &mut sink).unwrap();

    assert!(executor.step().unwrap());
    let err = executor.step().unwrap_err();
    assert!(matches!(err, ScanError::FitFailure { point: 7, .. }));

    let partial = executor.finish();
    assert_eq!(partial.n_passes(), 1);
    assert_eq!(partial.row(0).len(), 60);
    assert_eq!(sink.frames().len(), 1);
}
