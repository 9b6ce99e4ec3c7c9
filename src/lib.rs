//! Convergence studies and reliable error norms for finite element solutions.
//!
//! This crate does not solve PDEs itself. It consumes an external solver engine through the
//! [`FiniteElementEngine`](crate::engine::FiniteElementEngine) contract and provides the pieces
//! of a manufactured-solution convergence study that must be numerically right:
//!
//! - error norms ($L^2$ with degree raising, $H^1$ seminorm, max norm) that are robust against
//!   catastrophic cancellation and correct for complex-valued fields,
//! - empirical convergence-rate estimation from `(h, E)` samples,
//! - a sweep driver that orchestrates the above across mesh resolutions and polynomial degrees,
//! - an explicit synchronous collective-reduction model for domain-decomposed engines.
pub mod engine;
pub mod error;
pub mod rates;
pub mod reduce;
pub mod space;
pub mod sweep;

pub extern crate nalgebra;
