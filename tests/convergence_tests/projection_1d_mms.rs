//! Manufactured-solution convergence studies against the 1D reference engine.
use converge::reduce::SerialComm;
use converge::sweep::{run_sweep, ErrorSummary, SweepParameters};
use nalgebra::Complex;
use std::f64::consts::PI;
use std::fs::{create_dir_all, File};
use std::path::PathBuf;
use util::UniformGrid1dEngine;

fn u_smooth(x: f64) -> f64 {
    (2.0 * PI * x).sin() * x.exp()
}

/// For serializing to JSON for subsequent analysis/plots
fn export_summaries(study_name: &str, summaries: &[ErrorSummary<f64>]) {
    let base_path = PathBuf::from("data/convergence_tests/projection_1d_mms");
    create_dir_all(&base_path).unwrap();
    let path = base_path.join(format!("{study_name}_summary.json"));
    let mut file = File::create(path).unwrap();
    serde_json::to_writer_pretty(&mut file, summaries).expect("Failed to write JSON output");
}

fn assert_strictly_decreasing(errors: &[f64], label: &str) {
    for (i, window) in errors.windows(2).enumerate() {
        assert!(
            window[1] < window[0],
            "{label} errors must decrease under refinement, but e[{}] = {} >= e[{}] = {}",
            i + 1,
            window[1],
            i,
            window[0]
        );
    }
}

#[test]
#[allow(non_snake_case)]
fn smooth_solution_converges_at_theoretical_rates() {
    let engine = UniformGrid1dEngine::<f64>::new(u_smooth);
    let params = SweepParameters {
        resolutions: vec![4, 8, 16, 32, 64],
        degrees: vec![1, 2, 3],
        ..SweepParameters::default()
    };
    let summaries = run_sweep(&engine, &params, &SerialComm).unwrap();
    export_summaries("smooth_solution", &summaries);

    for summary in &summaries {
        let degree = summary.degree as f64;
        assert_strictly_decreasing(&summary.L2_errors, "L2");
        assert_strictly_decreasing(&summary.H1_seminorm_errors, "H1 seminorm");
        assert_strictly_decreasing(&summary.max_errors, "max");

        // The L2 rates must stabilize toward degree + 1 on the finest meshes; early entries
        // may be noisy due to coarse-mesh pre-asymptotic behavior.
        let n = summary.L2_rates.len();
        for &rate in &summary.L2_rates[n - 2..] {
            assert!(
                (rate - (degree + 1.0)).abs() <= 0.3,
                "degree {}: L2 rate {} deviates from expected order {}",
                summary.degree,
                rate,
                degree + 1.0
            );
        }

        // The H1 seminorm is a secondary diagnostic; require at least the theoretical order.
        let last_H1_rate = *summary.H1_seminorm_rates.last().unwrap();
        assert!(
            last_H1_rate > degree - 0.5,
            "degree {}: H1 seminorm rate {} fell below order {}",
            summary.degree,
            last_H1_rate,
            degree
        );
    }
}

#[test]
#[allow(non_snake_case)]
fn complex_exponential_converges_at_theoretical_rates() {
    let engine = UniformGrid1dEngine::<Complex<f64>>::new(|x| {
        Complex::new((2.0 * PI * x).cos(), (2.0 * PI * x).sin())
    });
    let params = SweepParameters {
        resolutions: vec![4, 8, 16, 32, 64],
        degrees: vec![2],
        ..SweepParameters::default()
    };
    let summaries = run_sweep(&engine, &params, &SerialComm).unwrap();
    export_summaries("complex_exponential", &summaries);

    let summary = &summaries[0];
    assert_strictly_decreasing(&summary.L2_errors, "L2");
    let n = summary.L2_rates.len();
    for &rate in &summary.L2_rates[n - 2..] {
        assert!(
            (rate - 3.0).abs() <= 0.3,
            "L2 rate {rate} deviates from the expected order 3 for quadratic elements"
        );
    }
}
