//! View Template Cache
//!
//! Fetches named template sources from the service, compiles them once,
//! and caches the compiled form. Dependents wait on a single completion
//! barrier: all registered templates are fetched in parallel and
//! initialization is gated on the whole batch, not on any individual
//! fetch. A failed fetch never hangs the barrier; it only leaves that
//! template unavailable.

pub mod cache;
pub mod render;

pub use cache::TemplateCache;
pub use render::CompiledTemplate;
