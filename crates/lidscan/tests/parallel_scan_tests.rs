use approx::assert_abs_diff_eq;
use lidscan::prelude::*;

/// Deterministic helix in 3-D, flat row-major.
fn helix_points(n: usize) -> Vec<f64> {
    (0..n)
        .flat_map(|i| {
            let t = i as f64 * 0.05;
            [t.cos(), t.sin(), 0.1 * t]
        })
        .collect()
}

#[test]
fn test_parallel_sequential_consistency() {
    let points = helix_points(300);

    let seq = Scan::new()
        .passes(2)
        .initial_fraction(0.2)
        .shrink_step(20.0)
        .parallel(false)
        .build()
        .unwrap()
        .fit(&points, 3)
        .unwrap();

    let par = Scan::new()
        .passes(2)
        .initial_fraction(0.2)
        .shrink_step(20.0)
        .parallel(true)
        .build()
        .unwrap()
        .fit(&points, 3)
        .unwrap();

    assert_eq!(seq.search_schedule(), par.search_schedule());
    for pass in 0..2 {
        let (s, p) = (seq.row(pass), par.row(pass));
        assert_eq!(s.len(), p.len());
        for i in 0..s.len() {
            assert_abs_diff_eq!(s[i], p[i], epsilon = 1e-12);
        }
    }
}

#[test]
fn test_parallel_tree_build_above_threshold() {
    // 1500 points exceeds the parallel KD-tree build threshold; the result
    // must be indistinguishable from a small sequential run's shape rules.
    let points = helix_points(1500);

    let result = Scan::new()
        .passes(1)
        .initial_fraction(0.05)
        .shrink_step(0.0)
        .build()
        .unwrap()
        .fit(&points, 3)
        .unwrap();

    assert_eq!(result.search_schedule(), &[75]);
    assert_eq!(result.row(0).len(), 1500);
    for &d in result.row(0) {
        assert!(d.is_finite() && d >= 0.0);
    }
}

#[test]
fn test_helix_estimates_near_one() {
    // A helix is a 1-D curve; with a tight fit neighborhood the median
    // estimate should sit near 1 regardless of execution mode.
    let points = helix_points(600);

    for parallel in [false, true] {
        let result = Scan::new()
            .passes(1)
            .initial_fraction(0.05)
            .shrink_step(0.0)
            .fit_k(8)
            .parallel(parallel)
            .build()
            .unwrap()
            .fit(&points, 3)
            .unwrap();

        let mut row = result.row(0).to_vec();
        row.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let median = row[row.len() / 2];
        assert!(
            (0.6..=1.6).contains(&median),
            "median estimate {} is far from the expected 1 (parallel = {})",
            median,
            parallel
        );
    }
}
