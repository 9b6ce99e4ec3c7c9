//! The driver for resolution/degree sweeps of a convergence study.
use crate::engine::FiniteElementEngine;
use crate::error::{
    estimate_H1_seminorm_error, estimate_L2_error, estimate_max_error, RealScalarOf, DEFAULT_DEGREE_RAISE,
};
use crate::rates::{estimate_convergence_rates, ErrorSample};
use crate::reduce::Communicator;
use eyre::{bail, WrapErr};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Parameters of a convergence sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepParameters {
    /// Mesh resolution parameters, in strictly increasing order (so that `h = 1/N` strictly
    /// decreases across the sweep).
    pub resolutions: Vec<usize>,
    /// Polynomial degrees, each swept independently across all resolutions.
    pub degrees: Vec<usize>,
    /// Degree raise used for the $L^2$ error (see [`crate::error::estimate_L2_error`]).
    pub degree_raise: usize,
}

impl Default for SweepParameters {
    fn default() -> Self {
        Self {
            resolutions: vec![4, 8, 16, 32, 64],
            degrees: vec![1],
            degree_raise: DEFAULT_DEGREE_RAISE,
        }
    }
}

impl SweepParameters {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.resolutions.is_empty() {
            bail!("sweep must have at least one resolution");
        }
        if self.resolutions[0] == 0 {
            bail!("mesh resolution parameters must be positive");
        }
        for window in self.resolutions.windows(2) {
            if window[1] <= window[0] {
                bail!(
                    "resolutions must be strictly increasing, but {} does not increase from {}",
                    window[1],
                    window[0]
                );
            }
        }
        if self.degrees.is_empty() {
            bail!("sweep must have at least one polynomial degree");
        }
        if self.degrees.iter().any(|&p| p == 0) {
            bail!("polynomial degrees must be positive");
        }
        Ok(())
    }
}

/// Errors and rates collected by [`run_sweep`] for a single polynomial degree.
///
/// Serializable to JSON for subsequent analysis/plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct ErrorSummary<T> {
    pub degree: usize,
    /// Mesh sizes `h = 1/N`, in the same order as the error sequences.
    pub mesh_sizes: Vec<T>,
    pub L2_errors: Vec<T>,
    pub H1_seminorm_errors: Vec<T>,
    pub max_errors: Vec<T>,
    pub L2_rates: Vec<T>,
    pub H1_seminorm_rates: Vec<T>,
}

impl<T> ErrorSummary<T> {
    fn new(degree: usize) -> Self {
        Self {
            degree,
            mesh_sizes: Vec::new(),
            L2_errors: Vec::new(),
            H1_seminorm_errors: Vec::new(),
            max_errors: Vec::new(),
            L2_rates: Vec::new(),
            H1_seminorm_rates: Vec::new(),
        }
    }
}

/// Run a full convergence sweep: solve once per `(resolution, degree)` pair, estimate all
/// error norms, then estimate per-degree convergence rates for the $L^2$ and $H^1$ seminorm
/// errors.
///
/// Solver failures and degenerate rate inputs (e.g. exact recovery of the solution) abort
/// the sweep with an error annotated with the resolution/degree that triggered it.
#[allow(non_snake_case)]
pub fn run_sweep<E, C>(
    engine: &E,
    params: &SweepParameters,
    comm: &C,
) -> eyre::Result<Vec<ErrorSummary<RealScalarOf<E>>>>
where
    E: FiniteElementEngine,
    C: Communicator<RealScalarOf<E>>,
{
    params.validate()?;

    let mut summaries = Vec::with_capacity(params.degrees.len());
    for &degree in &params.degrees {
        let mut summary = ErrorSummary::new(degree);
        let mut L2_samples = Vec::with_capacity(params.resolutions.len());
        let mut H1_samples = Vec::with_capacity(params.resolutions.len());

        for &resolution in &params.resolutions {
            let (u_h, u_exact) = engine
                .solve(resolution, degree)
                .wrap_err_with(|| format!("solve failed for resolution {resolution}, degree {degree}"))?;

            let context = || format!("error estimation failed for resolution {resolution}, degree {degree}");
            let L2_error =
                estimate_L2_error(engine, &u_h, &u_exact, params.degree_raise, comm).wrap_err_with(context)?;
            let H1_seminorm_error =
                estimate_H1_seminorm_error(engine, &u_h, &u_exact, comm).wrap_err_with(context)?;
            let max_error = estimate_max_error(engine, &u_h, &u_exact, comm).wrap_err_with(context)?;

            let h: RealScalarOf<E> = nalgebra::convert(1.0 / resolution as f64);
            debug!(
                "degree {degree}, resolution {resolution}: L2 = {L2_error:?}, \
                 H1 seminorm = {H1_seminorm_error:?}, max = {max_error:?}"
            );

            L2_samples.push(ErrorSample::new(h.clone(), L2_error.clone()));
            H1_samples.push(ErrorSample::new(h.clone(), H1_seminorm_error.clone()));
            summary.mesh_sizes.push(h);
            summary.L2_errors.push(L2_error);
            summary.H1_seminorm_errors.push(H1_seminorm_error);
            summary.max_errors.push(max_error);
        }

        summary.L2_rates = estimate_convergence_rates(&L2_samples)
            .wrap_err_with(|| format!("L2 rate estimation failed for degree {degree}"))?;
        summary.H1_seminorm_rates = estimate_convergence_rates(&H1_samples)
            .wrap_err_with(|| format!("H1 seminorm rate estimation failed for degree {degree}"))?;

        info!(
            "degree {degree}: L2 rates {:?}, H1 seminorm rates {:?}",
            summary.L2_rates, summary.H1_seminorm_rates
        );
        summaries.push(summary);
    }
    Ok(summaries)
}
