//! Observability infrastructure.
//!
//! Structured tracing only; the library emits spans and events and leaves
//! subscriber installation to binaries and tests.

pub mod tracing;
