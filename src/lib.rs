//! Client library for Leapcell tables. See [`leapcell_core`] for the API.

pub use leapcell_core::*;
