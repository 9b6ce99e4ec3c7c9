use converge::rates::{estimate_convergence_rates, ErrorSample, RateEstimationError};
use matrixcompare::assert_scalar_eq;
use proptest::prelude::*;

fn power_law_samples(constant: f64, rate: f64) -> Vec<ErrorSample<f64>> {
    [4, 8, 16, 32, 64]
        .iter()
        .map(|&n| {
            let h = 1.0 / n as f64;
            ErrorSample::new(h, constant * h.powf(rate))
        })
        .collect()
}

#[test]
fn synthetic_cubic_samples_reproduce_rate_three() {
    let samples = power_law_samples(2.0, 3.0);
    let rates = estimate_convergence_rates(&samples).unwrap();
    assert_eq!(rates.len(), samples.len() - 1);
    for rate in rates {
        assert_scalar_eq!(rate, 3.0, comp = abs, tol = 1e-12);
    }
}

#[test]
fn rates_are_independent_of_the_error_constant() {
    let rates_small = estimate_convergence_rates(&power_law_samples(2.0, 3.0)).unwrap();
    let rates_large = estimate_convergence_rates(&power_law_samples(123.456, 3.0)).unwrap();
    for (r1, r2) in rates_small.iter().zip(&rates_large) {
        assert_scalar_eq!(*r1, *r2, comp = abs, tol = 1e-12);
    }
}

#[test]
fn zero_error_sample_is_reported_as_degenerate() {
    let mut samples = power_law_samples(2.0, 3.0);
    samples[2].error = 0.0;
    let error = estimate_convergence_rates(&samples).unwrap_err();
    assert_eq!(error, RateEstimationError::DegenerateSample { index: 2 });
}

#[test]
fn negative_and_non_finite_error_samples_are_degenerate() {
    let mut samples = power_law_samples(2.0, 3.0);
    samples[1].error = -1e-3;
    assert_eq!(
        estimate_convergence_rates(&samples).unwrap_err(),
        RateEstimationError::DegenerateSample { index: 1 }
    );

    let mut samples = power_law_samples(2.0, 3.0);
    samples[4].error = f64::NAN;
    assert_eq!(
        estimate_convergence_rates(&samples).unwrap_err(),
        RateEstimationError::DegenerateSample { index: 4 }
    );
}

#[test]
fn non_decreasing_step_sizes_are_rejected() {
    let mut samples = power_law_samples(2.0, 3.0);
    samples[3].h = samples[2].h;
    assert_eq!(
        estimate_convergence_rates(&samples).unwrap_err(),
        RateEstimationError::NonDecreasingStepSize { index: 3 }
    );

    let mut samples = power_law_samples(2.0, 3.0);
    samples[0].h = 0.0;
    assert_eq!(
        estimate_convergence_rates(&samples).unwrap_err(),
        RateEstimationError::NonDecreasingStepSize { index: 0 }
    );
}

#[test]
fn fewer_than_two_samples_give_no_rates() {
    let no_samples: Vec<ErrorSample<f64>> = Vec::new();
    assert!(estimate_convergence_rates(&no_samples).unwrap().is_empty());

    let one_sample = vec![ErrorSample::new(0.25, 1e-3)];
    assert!(estimate_convergence_rates(&one_sample).unwrap().is_empty());
}

proptest! {
    #[test]
    fn power_law_samples_reproduce_their_rate(
        constant in 0.1f64..10.0,
        rate in 0.25f64..6.0,
    ) {
        let samples = power_law_samples(constant, rate);
        let rates = estimate_convergence_rates(&samples).unwrap();
        for r in rates {
            prop_assert!((r - rate).abs() <= 1e-8);
        }
    }
}
