pub mod analysis;
pub mod bifurcation;
pub mod chaos_game;
pub mod error;
pub mod logistic;
pub mod lorenz;
pub mod solvers;
/// The `chaos_core` crate is the numerical engine behind the chaos explorer.
/// Every operation is a pure, run-to-completion computation that takes a small
/// parameter set and hands back a fully materialized numeric array.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (ODEs/Maps),
///   `Steppable` (Solvers), `Linearization` (analytic Jacobians).
/// - **Solvers**: Numerical integrators (RK4, Tsit5) and iterators (DiscreteMap).
/// - **Systems**: the logistic map, its bifurcation sampler, the Lorenz flow and
///   the chaos game.
/// - **Analysis**: tangent-space Lyapunov exponents and the Kaplan-Yorke dimension.
pub mod traits;

pub use error::SimulationError;
