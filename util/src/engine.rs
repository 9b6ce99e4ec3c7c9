//! A 1D uniform-grid Lagrange engine on the unit interval.
//!
//! This is not a PDE solver: its `solve` produces a per-cell weighted least-squares
//! projection of the manufactured solution into a continuous Lagrange space, which is enough
//! to stand in for a real engine in convergence studies. The projection deliberately differs
//! from the nodal interpolant, so that all error norms are nonzero for generic smooth data
//! while polynomials up to the space degree are still recovered exactly.
//!
//! The engine supports domain decomposition into contiguous cell ranges: each partition owns
//! its cells, shares the boundary node with its left neighbor as a halo, and excludes that
//! halo from the owned dof values.
use converge::engine::{EngineError, ExactSolution, FiniteElementEngine, PointFunction};
use converge::space::{FiniteElementField, FunctionSpace};
use eyre::eyre;
use nalgebra::{ComplexField, DMatrix, DVector};
use std::sync::Arc;

use crate::quadrature;

/// A continuous Lagrange space of uniform degree on a uniform grid over [0, 1],
/// restricted to the cell range owned by one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformGridSpace {
    num_cells: usize,
    degree: usize,
    first_cell: usize,
    num_local_cells: usize,
    num_partitions: usize,
}

impl UniformGridSpace {
    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    pub fn h(&self) -> f64 {
        1.0 / self.num_cells as f64
    }

    /// Local node count, including the halo node shared with the left neighbor.
    fn num_local_nodes(&self) -> usize {
        self.num_local_cells * self.degree + 1
    }

    /// Physical coordinate of the local node with index `local_node`.
    fn local_node_coord(&self, local_node: usize) -> f64 {
        let global_node = self.first_cell * self.degree + local_node;
        global_node as f64 / (self.num_cells * self.degree) as f64
    }

    /// Whether two spaces live on the same grid and partition (their degrees may differ).
    fn same_grid(&self, other: &Self) -> bool {
        self.num_cells == other.num_cells
            && self.first_cell == other.first_cell
            && self.num_local_cells == other.num_local_cells
            && self.num_partitions == other.num_partitions
    }
}

impl FunctionSpace for UniformGridSpace {
    fn polynomial_degree(&self) -> usize {
        self.degree
    }

    fn num_local_dofs(&self) -> usize {
        // The halo node is owned by the left neighbor; only the first partition owns its
        // leftmost node.
        let leftmost = if self.first_cell == 0 { 1 } else { 0 };
        self.num_local_cells * self.degree + leftmost
    }
}

/// A field on a [`UniformGridSpace`], storing one value per local node (halo included).
#[derive(Debug, Clone, PartialEq)]
pub struct UniformGridField<T> {
    space: UniformGridSpace,
    dofs: Vec<T>,
}

impl<T: ComplexField<RealField = f64>> UniformGridField<T> {
    /// Construct a field directly from local node values (halo included).
    ///
    /// # Panics
    ///
    /// Panics if the value count does not match the local node count of the space.
    pub fn from_dof_values(space: UniformGridSpace, dofs: Vec<T>) -> Self {
        assert_eq!(dofs.len(), space.num_local_nodes(), "dof count must match local node count");
        Self { space, dofs }
    }

    /// All local node values, halo included.
    pub fn local_node_values(&self) -> &[T] {
        &self.dofs
    }
}

impl<T: ComplexField<RealField = f64>> FiniteElementField for UniformGridField<T> {
    type Scalar = T;
    type Space = UniformGridSpace;

    fn space(&self) -> &UniformGridSpace {
        &self.space
    }

    fn dof_values(&self) -> &[T] {
        if self.space.first_cell == 0 {
            &self.dofs
        } else {
            &self.dofs[1..]
        }
    }
}

/// An opaque evaluable expression, standing in for a real engine's symbolic layer.
#[derive(Clone)]
pub struct Expression1d<T> {
    f: Arc<dyn Fn(f64) -> T + Send + Sync>,
}

impl<T> Expression1d<T> {
    pub fn new(f: impl Fn(f64) -> T + Send + Sync + 'static) -> Self {
        Self { f: Arc::new(f) }
    }

    pub fn evaluate(&self, x: f64) -> T {
        (*self.f)(x)
    }
}

/// Equispaced Lagrange nodes on the reference cell [0, 1].
fn reference_nodes(degree: usize) -> Vec<f64> {
    (0..=degree).map(|k| k as f64 / degree as f64).collect()
}

/// Values of all Lagrange basis polynomials for the given nodes at `xi`.
fn lagrange_values(nodes: &[f64], xi: f64) -> Vec<f64> {
    (0..nodes.len())
        .map(|j| {
            (0..nodes.len())
                .filter(|&k| k != j)
                .map(|k| (xi - nodes[k]) / (nodes[j] - nodes[k]))
                .product()
        })
        .collect()
}

/// Derivatives of all Lagrange basis polynomials for the given nodes at `xi`.
fn lagrange_derivatives(nodes: &[f64], xi: f64) -> Vec<f64> {
    (0..nodes.len())
        .map(|j| {
            (0..nodes.len())
                .filter(|&m| m != j)
                .map(|m| {
                    let product: f64 = (0..nodes.len())
                        .filter(|&k| k != j && k != m)
                        .map(|k| (xi - nodes[k]) / (nodes[j] - nodes[k]))
                        .product();
                    product / (nodes[j] - nodes[m])
                })
                .sum()
        })
        .collect()
}

enum ExactRepresentation {
    ClosedForm,
    Expression,
}

/// The 1D reference engine. See the module docs for its semantics.
pub struct UniformGrid1dEngine<T> {
    solution: Arc<dyn Fn(f64) -> T + Send + Sync>,
    exact_representation: ExactRepresentation,
    supports_expressions: bool,
    partition_index: usize,
    partition_count: usize,
}

impl<T: ComplexField<RealField = f64>> UniformGrid1dEngine<T> {
    /// A single-partition engine for the given manufactured solution, reporting the exact
    /// solution in closed form.
    pub fn new(solution: impl Fn(f64) -> T + Send + Sync + 'static) -> Self {
        Self {
            solution: Arc::new(solution),
            exact_representation: ExactRepresentation::ClosedForm,
            supports_expressions: true,
            partition_index: 0,
            partition_count: 1,
        }
    }

    /// Report the exact solution as a symbolic expression instead of a closed-form callable.
    pub fn with_symbolic_exact(mut self) -> Self {
        self.exact_representation = ExactRepresentation::Expression;
        self
    }

    /// Disable the symbolic expression layer, so that symbolic exact solutions are rejected.
    pub fn without_expression_support(mut self) -> Self {
        self.supports_expressions = false;
        self
    }

    /// Restrict this engine instance to one partition of a domain decomposition.
    ///
    /// # Panics
    ///
    /// Panics if `index >= count` or `count` is zero.
    pub fn with_partition(mut self, index: usize, count: usize) -> Self {
        assert!(count > 0 && index < count, "invalid partition {index} of {count}");
        self.partition_index = index;
        self.partition_count = count;
        self
    }

    /// The space of the given global resolution and degree, restricted to this partition.
    pub fn space(&self, num_cells: usize, degree: usize) -> Result<UniformGridSpace, EngineError> {
        if num_cells == 0 || degree == 0 {
            return Err(eyre!("resolution and degree must be positive (got {num_cells}, {degree})").into());
        }
        if num_cells < self.partition_count {
            return Err(eyre!(
                "cannot split {num_cells} cells across {} partitions",
                self.partition_count
            )
            .into());
        }
        // Contiguous chunks; the first `remainder` partitions own one extra cell.
        let base = num_cells / self.partition_count;
        let remainder = num_cells % self.partition_count;
        let extra = self.partition_index.min(remainder);
        let first_cell = self.partition_index * base + extra;
        let num_local_cells = base + if self.partition_index < remainder { 1 } else { 0 };
        Ok(UniformGridSpace {
            num_cells,
            degree,
            first_cell,
            num_local_cells,
            num_partitions: self.partition_count,
        })
    }

    /// Weighted least-squares projection of the manufactured solution onto the polynomial
    /// space of a single (global) cell, expressed in nodal values.
    fn project_cell(&self, space: &UniformGridSpace, cell: usize) -> Result<Vec<T>, EngineError> {
        let p = space.degree;
        let n = p + 1;
        let nodes = reference_nodes(p);
        let (weights, points) = quadrature::gauss_01(p + 3);
        let h = space.h();
        let x0 = cell as f64 * h;

        // Normal equations (Aᵀ W A) c = Aᵀ W y in the nodal basis, where A holds the basis
        // values at the quadrature points and y the samples of the manufactured solution.
        let mut ata = DMatrix::<T>::zeros(n, n);
        let mut atb = DVector::<T>::zeros(n);
        for (w, xi) in weights.iter().zip(&points) {
            let phi = lagrange_values(&nodes, *xi);
            let y = (*self.solution)(x0 + xi * h);
            for j in 0..n {
                let w_phi_j = T::from_real(w * phi[j]);
                atb[j] += w_phi_j.clone() * y.clone();
                for k in 0..n {
                    ata[(j, k)] += w_phi_j.clone() * T::from_real(phi[k]);
                }
            }
        }

        let coefficients = ata
            .lu()
            .solve(&atb)
            .ok_or_else(|| eyre!("singular projection system on cell {cell}"))?;
        Ok(coefficients.iter().cloned().collect())
    }

    fn interpolate_with(
        &self,
        target: &UniformGridSpace,
        f: impl Fn(f64) -> T,
    ) -> UniformGridField<T> {
        let dofs = (0..target.num_local_nodes())
            .map(|local_node| f(target.local_node_coord(local_node)))
            .collect();
        UniformGridField {
            space: target.clone(),
            dofs,
        }
    }
}

impl<T: ComplexField<RealField = f64>> FiniteElementEngine for UniformGrid1dEngine<T> {
    type Scalar = T;
    type Space = UniformGridSpace;
    type Field = UniformGridField<T>;
    type Expression = Expression1d<T>;

    fn solve(
        &self,
        resolution: usize,
        degree: usize,
    ) -> Result<(Self::Field, ExactSolution<T, Expression1d<T>>), EngineError> {
        let space = self.space(resolution, degree)?;
        let p = space.degree;
        let first = space.first_cell;
        let last = first + space.num_local_cells;

        // Project the owned cells plus the immediate neighbor cells, so that shared-node
        // averaging below agrees bit-for-bit with what the neighboring partitions compute.
        let lo = first.saturating_sub(1);
        let hi = (last + 1).min(space.num_cells);
        let mut cell_values = Vec::with_capacity(hi - lo);
        for cell in lo..hi {
            cell_values.push(self.project_cell(&space, cell)?);
        }
        let projected = |cell: usize| &cell_values[cell - lo];

        let mut dofs = vec![T::zero(); space.num_local_nodes()];
        for cell in first..last {
            for j in 0..=p {
                dofs[(cell - first) * p + j] = projected(cell)[j].clone();
            }
        }
        // The per-cell projections are discontinuous; restore continuity by averaging the
        // two one-sided values at every interior cell boundary.
        for boundary in 0..=space.num_local_cells {
            let right_cell = first + boundary;
            if right_cell > 0 && right_cell < space.num_cells {
                let left_value = projected(right_cell - 1)[p].clone();
                let right_value = projected(right_cell)[0].clone();
                dofs[boundary * p] = (left_value + right_value) * T::from_real(0.5);
            }
        }
        let u_h = UniformGridField { space, dofs };

        let solution = Arc::clone(&self.solution);
        let exact = match self.exact_representation {
            ExactRepresentation::ClosedForm => ExactSolution::from_fn(move |x: &[f64]| (*solution)(x[0])),
            ExactRepresentation::Expression => {
                ExactSolution::from_expression(Expression1d { f: solution })
            }
        };
        Ok((u_h, exact))
    }

    fn refined_space(&self, space: &UniformGridSpace, degree_raise: usize) -> Result<UniformGridSpace, EngineError> {
        let mut raised = space.clone();
        raised.degree += degree_raise;
        Ok(raised)
    }

    fn interpolate_field(
        &self,
        field: &UniformGridField<T>,
        target: &UniformGridSpace,
    ) -> Result<UniformGridField<T>, EngineError> {
        let source = &field.space;
        if !source.same_grid(target) {
            return Err(EngineError::IncompatibleSpaces(format!(
                "source space (grid of {}) and target space (grid of {}) live on different grids",
                source.num_cells, target.num_cells
            )));
        }
        let p_source = source.degree;
        let p_target = target.degree;
        let nodes = reference_nodes(p_source);

        let dofs = (0..target.num_local_nodes())
            .map(|local_node| {
                // Evaluate the source field within the cell containing this target node. Nodes
                // on cell boundaries evaluate at xi = 0 or 1, where the basis values reduce to
                // exact Kronecker deltas, so neighboring partitions agree on shared nodes.
                let local_cell = (local_node / p_target).min(target.num_local_cells - 1);
                let xi = (local_node - local_cell * p_target) as f64 / p_target as f64;
                let phi = lagrange_values(&nodes, xi);
                let cell_dofs = &field.dofs[local_cell * p_source..local_cell * p_source + p_source + 1];
                cell_dofs
                    .iter()
                    .zip(&phi)
                    .map(|(dof, phi)| dof.clone() * T::from_real(*phi))
                    .fold(T::zero(), |acc, v| acc + v)
            })
            .collect();
        Ok(UniformGridField {
            space: target.clone(),
            dofs,
        })
    }

    fn interpolate_function(
        &self,
        f: &PointFunction<T>,
        target: &UniformGridSpace,
    ) -> Result<UniformGridField<T>, EngineError> {
        Ok(self.interpolate_with(target, |x| f(&[x])))
    }

    fn interpolate_expression(
        &self,
        expr: &Expression1d<T>,
        target: &UniformGridSpace,
    ) -> Result<UniformGridField<T>, EngineError> {
        if !self.supports_expressions {
            return Err(EngineError::UnsupportedExactSolution(
                "this engine has no symbolic expression layer".to_string(),
            ));
        }
        Ok(self.interpolate_with(target, |x| expr.evaluate(x)))
    }

    fn field_difference(
        &self,
        u: &UniformGridField<T>,
        v: &UniformGridField<T>,
    ) -> Result<UniformGridField<T>, EngineError> {
        if u.space != v.space {
            return Err(EngineError::IncompatibleSpaces(
                "fields of a difference must share the same space".to_string(),
            ));
        }
        let dofs = u
            .dofs
            .iter()
            .zip(&v.dofs)
            .map(|(a, b)| a.clone() - b.clone())
            .collect();
        Ok(UniformGridField {
            space: u.space.clone(),
            dofs,
        })
    }

    fn integrate_squared_modulus(&self, field: &UniformGridField<T>) -> Result<T, EngineError> {
        let space = &field.space;
        let p = space.degree;
        let nodes = reference_nodes(p);
        let (weights, points) = quadrature::gauss_01(p + 1);
        let h = space.h();

        let mut result = T::zero();
        for local_cell in 0..space.num_local_cells {
            let cell_dofs = &field.dofs[local_cell * p..local_cell * p + p + 1];
            for (w, xi) in weights.iter().zip(&points) {
                let phi = lagrange_values(&nodes, *xi);
                let value = cell_dofs
                    .iter()
                    .zip(&phi)
                    .map(|(dof, phi)| dof.clone() * T::from_real(*phi))
                    .fold(T::zero(), |acc, v| acc + v);
                result += T::from_real(w * h) * value.clone() * value.conjugate();
            }
        }
        Ok(result)
    }

    fn integrate_gradient_squared_modulus(&self, field: &UniformGridField<T>) -> Result<T, EngineError> {
        let space = &field.space;
        let p = space.degree;
        let nodes = reference_nodes(p);
        let (weights, points) = quadrature::gauss_01(p + 1);
        let h = space.h();

        let mut result = T::zero();
        for local_cell in 0..space.num_local_cells {
            let cell_dofs = &field.dofs[local_cell * p..local_cell * p + p + 1];
            for (w, xi) in weights.iter().zip(&points) {
                let dphi = lagrange_derivatives(&nodes, *xi);
                // Reference-cell derivative scaled by the inverse cell Jacobian 1/h.
                let gradient = cell_dofs
                    .iter()
                    .zip(&dphi)
                    .map(|(dof, dphi)| dof.clone() * T::from_real(dphi / h))
                    .fold(T::zero(), |acc, v| acc + v);
                result += T::from_real(w * h) * gradient.clone() * gradient.conjugate();
            }
        }
        Ok(result)
    }
}
