//! Runtime version assertion probes.
//!
//! Probes language runtimes (node, python, dotnet, go, java) for their
//! reported version and asserts the observation against an expectation:
//! floating major (`22`), pinned major.minor (`3.9`), exact (`22.5.1`), or
//! negated major (`!6`). Batch runs are driven by a JSON probe manifest, and
//! the versions config that supplies default expectations doubles as the
//! input for CI build-matrix generation.

pub mod check;
pub mod manifest;
pub mod matrix;
pub mod probe;
pub mod report;
pub mod runtime;
pub mod version;
