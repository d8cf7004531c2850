// Fletch - A fluent HTTP request/response pipeline for Rust
//
// Build a request, encode its body with a pluggable codec, run it through
// before/after hooks and decode the response.

// Re-export the client pipeline
pub use fletch_client::*;

/// Prelude for common imports.
///
/// ```
/// use fletch::prelude::*;
/// ```
pub mod prelude {
    pub use fletch_client::prelude::*;
}
