//! Shared foundations: identity, transform math, naming, path tokens, attribute names

pub mod constants;
pub mod ids;
pub mod naming;
pub mod paths;
pub mod transform;
