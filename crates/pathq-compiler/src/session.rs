//! An explicitly owned compilation session.

use pathq_core::{BucketId, Field, Policy, Pred};

use crate::chargen::{AtomId, CharGen};
use crate::compile::{CompiledPolicy, PathCompiler, PathQuery};
use crate::path::{Atom, Leaf, Path};
use crate::{CompilerConfig, Result};

/// Character generator, query registry and configuration for a sequence of
/// passes. Atoms registered in one session are not valid in another, or
/// after [`Session::reset`].
#[derive(Debug, Default)]
pub struct Session {
    chargen: CharGen,
    compiler: PathCompiler,
    config: CompilerConfig,
    next_atom_id: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn chargen(&self) -> &CharGen {
        &self.chargen
    }

    pub fn compiler(&self) -> &PathCompiler {
        &self.compiler
    }

    /// Register an atom and return it as a path leaf.
    pub fn register(&mut self, atom: Atom) -> Result<Path> {
        let id = AtomId(self.next_atom_id);
        self.next_atom_id += 1;
        let class = self.chargen.register(atom.pred(), id)?;
        let token = self.chargen.token(atom.pred(), atom.kind());
        tracing::trace!(atom = %id, kind = %atom.kind(), %class, "registered atom");
        Ok(Path::leaf(Leaf {
            id,
            kind: atom.kind(),
            pred: atom.pred().clone(),
            fields: atom.fields().to_vec(),
            token,
            class,
            epoch: self.chargen.epoch(),
        }))
    }

    pub fn atom(&mut self, pred: Pred) -> Result<Path> {
        self.register(Atom::new(pred))
    }

    pub fn hook(&mut self, pred: Pred, fields: impl IntoIterator<Item = Field>) -> Result<Path> {
        self.register(Atom::hook(pred, fields))
    }

    pub fn end_path(&mut self, pred: Pred) -> Result<Path> {
        self.register(Atom::end_path(pred))
    }

    pub fn drop_atom(&mut self, pred: Pred) -> Result<Path> {
        self.register(Atom::drop(pred))
    }

    pub fn finalize(&mut self, query: PathQuery) -> Result<()> {
        self.compiler.finalize(query, &self.chargen).map(|_| ())
    }

    pub fn bind_hook(&mut self, hook: &Path, bucket: BucketId) {
        self.compiler.bind_hook(hook, bucket);
    }

    /// Compile `queries` against `forwarding`. Replaces previously finalized
    /// queries; hook bindings are kept.
    pub fn compile(&mut self, queries: &[PathQuery], forwarding: &Policy) -> Result<CompiledPolicy> {
        self.compiler
            .compile(&self.chargen, queries, forwarding, &self.config)
    }

    /// Compile the queries added with [`Session::finalize`].
    pub fn compile_finalized(&self, forwarding: &Policy) -> Result<CompiledPolicy> {
        self.compiler
            .compile_finalized(&self.chargen, forwarding, &self.config)
    }

    /// Clear the generator and the registry. Paths built before are stale.
    pub fn reset(&mut self) {
        self.chargen.clear();
        self.compiler.clear();
    }
}
