//! Browser bridge for `chaos_core`.
//!
//! Every export takes primitive parameters (or a plain settings object) and
//! returns flat `Float64Array`s ready for plotting.

pub mod flows;
pub mod fractals;
pub mod maps;
mod shared;
