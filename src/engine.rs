//! The contract for the external PDE solver engine.
use crate::space::{FiniteElementField, FunctionSpace};
use nalgebra::ComplexField;
use thiserror::Error;

/// A point-evaluable function of physical coordinates.
///
/// The coordinate slice has the dimension of the engine's mesh, which the engine itself knows;
/// this crate only passes the function through.
#[allow(type_alias_bounds)]
pub type PointFunction<T: ComplexField> = dyn Fn(&[T::RealField]) -> T + Send + Sync;

/// The exact solution of a manufactured problem.
///
/// The reference workflow accepts either a plain callable or an expression native to the
/// engine's symbolic layer, dispatching by runtime type inspection. Here the two cases are an
/// explicit tagged variant, resolved once by matching.
pub enum ExactSolution<T: ComplexField, Expr> {
    /// A closed-form function evaluable at physical coordinates.
    ClosedForm(Box<PointFunction<T>>),
    /// An expression evaluable within the engine's own expression layer.
    Symbolic(Expr),
}

impl<T: ComplexField, Expr> ExactSolution<T, Expr> {
    pub fn from_fn(f: impl Fn(&[T::RealField]) -> T + Send + Sync + 'static) -> Self {
        Self::ClosedForm(Box::new(f))
    }

    pub fn from_expression(expr: Expr) -> Self {
        Self::Symbolic(expr)
    }
}

/// Failures reported by an engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine cannot consume the given exact-solution representation, e.g. a `Symbolic`
    /// exact solution handed to an engine without an expression layer.
    #[error("unsupported exact solution representation: {0}")]
    UnsupportedExactSolution(String),
    /// Two fields or spaces that were expected to live on the same mesh/partition do not.
    #[error("incompatible function spaces: {0}")]
    IncompatibleSpaces(String),
    /// Any other engine-side failure (singular system, mesh generation failure, ...).
    #[error(transparent)]
    Other(#[from] eyre::Report),
}

/// The external PDE solver engine consumed by convergence studies.
///
/// An implementation owns meshing, assembly and linear solves. For a domain-decomposed engine,
/// every operation acts on the *local* partition: integrals run over owned cells only and
/// fields expose owned dofs only, so that the caller can combine partial results through an
/// explicit reduction (see [`crate::reduce`]).
pub trait FiniteElementEngine {
    type Scalar: ComplexField;
    type Space: FunctionSpace;
    type Field: FiniteElementField<Scalar = Self::Scalar, Space = Self::Space>;
    /// The engine's native symbolic expression type. Engines without a symbolic layer may use
    /// any placeholder type and reject it in [`Self::interpolate_expression`].
    type Expression;

    /// Solve the configured problem for the given mesh resolution and polynomial degree,
    /// returning the discrete solution together with the manufactured exact solution.
    fn solve(
        &self,
        resolution: usize,
        degree: usize,
    ) -> Result<(Self::Field, ExactSolution<Self::Scalar, Self::Expression>), EngineError>;

    /// A space on the same mesh (and partition) as `space`, with polynomial degree raised by
    /// `degree_raise`.
    fn refined_space(&self, space: &Self::Space, degree_raise: usize) -> Result<Self::Space, EngineError>;

    /// Interpolate a discrete field into a (possibly higher-order) space on the same mesh.
    fn interpolate_field(&self, field: &Self::Field, target: &Self::Space) -> Result<Self::Field, EngineError>;

    /// Interpolate a closed-form function of physical coordinates into the target space.
    fn interpolate_function(
        &self,
        f: &PointFunction<Self::Scalar>,
        target: &Self::Space,
    ) -> Result<Self::Field, EngineError>;

    /// Interpolate a symbolic expression into the target space.
    fn interpolate_expression(
        &self,
        expr: &Self::Expression,
        target: &Self::Space,
    ) -> Result<Self::Field, EngineError>;

    /// The dof-wise difference `u - v` of two fields in the same space.
    fn field_difference(&self, u: &Self::Field, v: &Self::Field) -> Result<Self::Field, EngineError>;

    /// The local contribution to the sesquilinear integral $\int_\Omega e \, \bar e \, dx$,
    /// taken over the cells owned by this partition.
    ///
    /// The result is returned as the engine scalar; for complex fields its imaginary part
    /// vanishes by construction of the integrand.
    fn integrate_squared_modulus(&self, field: &Self::Field) -> Result<Self::Scalar, EngineError>;

    /// The local contribution to $\int_\Omega \nabla e \cdot \overline{\nabla e} \, dx$ over
    /// the cells owned by this partition.
    fn integrate_gradient_squared_modulus(&self, field: &Self::Field) -> Result<Self::Scalar, EngineError>;
}
