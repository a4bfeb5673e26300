//! Template Cache and Completion Barrier
//!
//! Names are registered up front with [`TemplateCache::add`], fetched in
//! one concurrent batch by [`TemplateCache::compile`], and read back with
//! [`TemplateCache::render`]. The compile call is the synchronization
//! point: it resolves exactly once, after every member of the batch has
//! settled, whether each fetch succeeded or not.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::Value;

use crate::remote::RemoteService;

use super::render::CompiledTemplate;

/// Fetch-and-compile cache for view templates.
pub struct TemplateCache {
    service: Arc<RemoteService>,
    pending: Vec<String>,
    templates: HashMap<String, CompiledTemplate>,
}

impl TemplateCache {
    pub fn new(service: Arc<RemoteService>) -> Self {
        Self {
            service,
            pending: Vec::new(),
            templates: HashMap::new(),
        }
    }

    /// Register a template name to be fetched by the next [`compile`].
    ///
    /// Chainable; registering the same name twice is harmless.
    ///
    /// [`compile`]: TemplateCache::compile
    pub fn add(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        if !self.pending.contains(&name) {
            self.pending.push(name);
        }
        self
    }

    /// Fetch and compile every registered template, concurrently.
    ///
    /// Resolves once the whole batch has settled. Failed fetches count
    /// toward completion but leave the entry absent, so a single bad
    /// template never hangs initialization. Names already compiled are
    /// cache hits and are not fetched again. Returns the number of
    /// templates loaded by this call.
    pub async fn compile(&mut self) -> usize {
        let batch: Vec<String> = self
            .pending
            .drain(..)
            .filter(|name| !self.templates.contains_key(name))
            .collect();

        if batch.is_empty() {
            return 0;
        }

        let fetches = batch
            .iter()
            .map(|name| self.service.template_source(name).send_text());
        let results = join_all(fetches).await;

        let mut loaded = 0;
        for (name, result) in batch.into_iter().zip(results) {
            match result {
                Ok(source) => {
                    tracing::debug!(template = %name, "Template compiled");
                    self.templates.insert(name, CompiledTemplate::compile(&source));
                    loaded += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        template = %name,
                        error = %e.message(),
                        "Template fetch failed; it will be unavailable"
                    );
                }
            }
        }

        loaded
    }

    /// Render a compiled template against a context.
    ///
    /// Returns `None` for unknown or not-yet-compiled names; callers
    /// degrade to an empty render rather than failing.
    pub fn render(&self, name: &str, context: &Value) -> Option<String> {
        let template = self.templates.get(name)?;
        Some(template.render(context))
    }

    /// Whether a template is present in the compiled cache.
    pub fn is_compiled(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Number of compiled templates.
    pub fn compiled_count(&self) -> usize {
        self.templates.len()
    }
}
