//! Test support: a self-contained 1D reference engine for exercising convergence studies.
pub mod engine;
pub mod quadrature;

pub use engine::{Expression1d, UniformGrid1dEngine, UniformGridField, UniformGridSpace};
