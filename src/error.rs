//! Functionality for error estimation.
//!
//! All estimators follow the same local-then-reduce pattern: the engine computes the local
//! partition's contribution, the [`Communicator`] combines contributions into the single
//! global scalar, and every participant receives the same result.
use crate::engine::{EngineError, ExactSolution, FiniteElementEngine};
use crate::reduce::{Communicator, Reduction};
use crate::space::FiniteElementField;
use itertools::izip;
use nalgebra::{ComplexField, RealField};

/// The real scalar type underlying an engine's (possibly complex) scalar type.
pub type RealScalarOf<E> = <<E as FiniteElementEngine>::Scalar as ComplexField>::RealField;

/// The default number of degrees by which the approximation space is raised before
/// differencing in [`estimate_L2_error`].
pub const DEFAULT_DEGREE_RAISE: usize = 3;

fn interpolate_exact<E>(
    engine: &E,
    u_exact: &ExactSolution<E::Scalar, E::Expression>,
    target: &E::Space,
) -> Result<E::Field, EngineError>
where
    E: FiniteElementEngine,
{
    match u_exact {
        ExactSolution::ClosedForm(f) => engine.interpolate_function(&**f, target),
        ExactSolution::Symbolic(expr) => engine.interpolate_expression(expr, target),
    }
}

/// Estimate the squared $L^2$ error $\norm{u_h - u}^2_{L^2}$ of a discrete solution against
/// the manufactured exact solution.
///
/// Both `u_h` and the exact solution are interpolated into a common space of degree
/// `p + degree_raise` before differencing. Subtracting the two fields in their original
/// low-order representation amplifies round-off whenever the true error is small relative to
/// the solution magnitude; differencing in the raised space avoids this.
///
/// For complex-valued fields the squared norm is the sesquilinear product
/// $\int_\Omega e \, \bar e \, dx$, which is real and non-negative by construction.
#[allow(non_snake_case)]
pub fn estimate_L2_error_squared<E, C>(
    engine: &E,
    u_h: &E::Field,
    u_exact: &ExactSolution<E::Scalar, E::Expression>,
    degree_raise: usize,
    comm: &C,
) -> eyre::Result<RealScalarOf<E>>
where
    E: FiniteElementEngine,
    C: Communicator<RealScalarOf<E>>,
{
    let raised = engine.refined_space(u_h.space(), degree_raise)?;
    let u_h_raised = engine.interpolate_field(u_h, &raised)?;
    let u_exact_raised = interpolate_exact(engine, u_exact, &raised)?;
    let difference = engine.field_difference(&u_h_raised, &u_exact_raised)?;

    let local = engine.integrate_squared_modulus(&difference)?;
    Ok(comm.all_reduce(local.real(), Reduction::Sum))
}

/// Estimate the $L^2$ error $\norm{u_h - u}_{L^2}$ of a discrete solution against the
/// manufactured exact solution.
///
/// See [`estimate_L2_error_squared`] for the role of `degree_raise`
/// (default: [`DEFAULT_DEGREE_RAISE`]).
#[allow(non_snake_case)]
pub fn estimate_L2_error<E, C>(
    engine: &E,
    u_h: &E::Field,
    u_exact: &ExactSolution<E::Scalar, E::Expression>,
    degree_raise: usize,
    comm: &C,
) -> eyre::Result<RealScalarOf<E>>
where
    E: FiniteElementEngine,
    C: Communicator<RealScalarOf<E>>,
{
    Ok(estimate_L2_error_squared(engine, u_h, u_exact, degree_raise, comm)?.sqrt())
}

/// Estimate the squared $H^1$ *seminorm* error $\seminorm{u_h - u}^2_{H^1}$ of a discrete
/// solution against the manufactured exact solution.
///
/// The difference is formed directly in the original approximation space; the gradient error
/// is a secondary diagnostic and does not need the degree-raise treatment of the $L^2$ norm.
#[allow(non_snake_case)]
pub fn estimate_H1_seminorm_error_squared<E, C>(
    engine: &E,
    u_h: &E::Field,
    u_exact: &ExactSolution<E::Scalar, E::Expression>,
    comm: &C,
) -> eyre::Result<RealScalarOf<E>>
where
    E: FiniteElementEngine,
    C: Communicator<RealScalarOf<E>>,
{
    let u_exact_h = interpolate_exact(engine, u_exact, u_h.space())?;
    let difference = engine.field_difference(u_h, &u_exact_h)?;

    let local = engine.integrate_gradient_squared_modulus(&difference)?;
    Ok(comm.all_reduce(local.real(), Reduction::Sum))
}

/// Estimate the $H^1$ *seminorm* error $\seminorm{u_h - u}_{H^1}$ of a discrete solution
/// against the manufactured exact solution.
#[allow(non_snake_case)]
pub fn estimate_H1_seminorm_error<E, C>(
    engine: &E,
    u_h: &E::Field,
    u_exact: &ExactSolution<E::Scalar, E::Expression>,
    comm: &C,
) -> eyre::Result<RealScalarOf<E>>
where
    E: FiniteElementEngine,
    C: Communicator<RealScalarOf<E>>,
{
    Ok(estimate_H1_seminorm_error_squared(engine, u_h, u_exact, comm)?.sqrt())
}

/// Estimate the maximum pointwise dof error $\max_i |u_{h,i} - u_i|$ of a discrete solution
/// against the manufactured exact solution.
///
/// The exact solution is interpolated into the *same* space as `u_h` and the maximum modulus
/// of the dof-wise difference is taken over the locally owned dofs, then max-reduced across
/// partitions. For complex scalars the pointwise magnitude is the complex modulus.
pub fn estimate_max_error<E, C>(
    engine: &E,
    u_h: &E::Field,
    u_exact: &ExactSolution<E::Scalar, E::Expression>,
    comm: &C,
) -> eyre::Result<RealScalarOf<E>>
where
    E: FiniteElementEngine,
    C: Communicator<RealScalarOf<E>>,
{
    let u_exact_h = interpolate_exact(engine, u_exact, u_h.space())?;

    let u_h_dofs = u_h.dof_values();
    let u_exact_dofs = u_exact_h.dof_values();
    if u_h_dofs.len() != u_exact_dofs.len() {
        return Err(EngineError::IncompatibleSpaces(format!(
            "dof count mismatch between discrete solution ({}) and interpolated exact solution ({})",
            u_h_dofs.len(),
            u_exact_dofs.len()
        ))
        .into());
    }

    let local = izip!(u_h_dofs, u_exact_dofs)
        .map(|(a, b)| (a.clone() - b.clone()).modulus())
        .fold(nalgebra::zero(), |acc: RealScalarOf<E>, m| acc.max(m));
    Ok(comm.all_reduce(local, Reduction::Max))
}
