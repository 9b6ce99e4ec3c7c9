//! Contracts for function spaces and discrete fields produced by an external engine.
use nalgebra::ComplexField;

/// A function space on a fixed mesh, as exposed by the external engine.
///
/// The space is tied to a particular mesh and, for a domain-decomposed engine, to a particular
/// partition of that mesh. Only the properties needed for error estimation are part of the
/// contract.
pub trait FunctionSpace {
    /// The polynomial degree of the approximation space.
    fn polynomial_degree(&self) -> usize;

    /// The number of degrees of freedom *owned* by the local partition.
    ///
    /// Dofs shared with neighboring partitions (ghosts/halos) must be counted by exactly one
    /// partition, so that summing this quantity over all partitions gives the global dof count.
    fn num_local_dofs(&self) -> usize;
}

/// A discrete solution field: a function space together with its dof values.
pub trait FiniteElementField {
    type Scalar: ComplexField;
    type Space: FunctionSpace;

    fn space(&self) -> &Self::Space;

    /// The values of the locally owned degrees of freedom.
    ///
    /// The slice must have length [`FunctionSpace::num_local_dofs`] and must exclude ghost
    /// entries, so that dof-wise reductions across partitions never double-count.
    fn dof_values(&self) -> &[Self::Scalar];
}
