//! Serialized compilation passes with atomic publishing.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use pathq_core::Policy;

use crate::compile::{CompiledPolicy, PathQuery};
use crate::session::Session;
use crate::Result;

/// Owns a [`Session`] behind a lock and publishes the latest successful
/// compilation. Readers never block on a running pass.
pub struct PathQueryService {
    session: Mutex<Session>,
    published: ArcSwap<CompiledPolicy>,
}

impl PathQueryService {
    /// Start with `forwarding` alone published.
    pub fn new(session: Session, forwarding: Policy) -> Self {
        Self {
            session: Mutex::new(session),
            published: ArcSwap::from_pointee(CompiledPolicy::passthrough(forwarding)),
        }
    }

    /// Run `f` with exclusive access to the session.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.session.lock();
        f(&mut session)
    }

    /// Compile and publish. On failure the previous result stays published.
    pub fn recompile(
        &self,
        queries: &[PathQuery],
        forwarding: &Policy,
    ) -> Result<Arc<CompiledPolicy>> {
        let mut session = self.session.lock();
        match session.compile(queries, forwarding) {
            Ok(compiled) => {
                let compiled = Arc::new(compiled);
                self.published.store(Arc::clone(&compiled));
                let stats = compiled.stats();
                tracing::info!(
                    queries = stats.queries,
                    states = stats.states,
                    symbols = stats.symbols,
                    "published compiled policy"
                );
                Ok(compiled)
            }
            Err(err) => {
                tracing::warn!(%err, "compilation failed; keeping previous policy");
                Err(err)
            }
        }
    }

    pub fn current(&self) -> Arc<CompiledPolicy> {
        self.published.load_full()
    }

    /// Reset the session. The published result is left as is.
    pub fn reset(&self) {
        self.session.lock().reset();
    }
}
