//! Python bindings (feature `pyo3`)
//!
//! The Python surface is deliberately small: projects cross the boundary as
//! JSON text or plain dicts, and builds run against an in-memory scene whose
//! snapshot is returned.

pub mod project;
pub mod types;
