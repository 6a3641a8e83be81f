//! Query registry and the compilation pass.

use std::collections::HashMap;

use pathq_core::{BucketId, Field, Policy};

use super::compiled::{CompileStats, CompiledPolicy};
use super::emit;
use crate::automaton::{Dfa, Nfa, QueryId};
use crate::chargen::{AtomId, CharGen};
use crate::path::{AtomKind, Leaf, Path};
use crate::{CompileError, CompilerConfig, Result};

/// A path and the bucket that receives packets completing it.
#[derive(Clone, Debug)]
pub struct PathQuery {
    pub path: Path,
    pub bucket: BucketId,
}

impl PathQuery {
    pub fn new(path: Path, bucket: BucketId) -> Self {
        Self { path, bucket }
    }
}

/// Finalized queries and hook bindings for the current pass.
#[derive(Debug, Default)]
pub struct PathCompiler {
    queries: Vec<PathQuery>,
    /// Rendered expression of each query, for dumps.
    exprs: Vec<String>,
    hook_buckets: HashMap<AtomId, BucketId>,
}

impl PathCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query to the pass. Its leaves must come from the generator's
    /// current epoch.
    pub fn finalize(&mut self, query: PathQuery, chargen: &CharGen) -> Result<QueryId> {
        ensure_fresh(&query.path, chargen)?;
        let id = QueryId(self.queries.len() as u32);
        self.exprs.push(query.path.to_string());
        self.queries.push(query);
        Ok(id)
    }

    /// Route every hook leaf of `hook` to `bucket`.
    pub fn bind_hook(&mut self, hook: &Path, bucket: BucketId) {
        for leaf in hook.leaves() {
            if leaf.kind() == AtomKind::Hook {
                self.hook_buckets.insert(leaf.id(), bucket);
            }
        }
    }

    pub fn hook_bucket(&self, atom: AtomId) -> Option<BucketId> {
        self.hook_buckets.get(&atom).copied()
    }

    pub fn queries(&self) -> &[PathQuery] {
        &self.queries
    }

    pub fn exprs(&self) -> &[String] {
        &self.exprs
    }

    pub fn clear(&mut self) {
        self.queries.clear();
        self.exprs.clear();
        self.hook_buckets.clear();
    }

    /// Replace the finalized queries with `queries` and compile them.
    pub fn compile(
        &mut self,
        chargen: &CharGen,
        queries: &[PathQuery],
        forwarding: &Policy,
        config: &CompilerConfig,
    ) -> Result<CompiledPolicy> {
        self.queries.clear();
        self.exprs.clear();
        for query in queries {
            self.finalize(query.clone(), chargen)?;
        }
        self.compile_finalized(chargen, forwarding, config)
    }

    /// Compile the finalized queries together with `forwarding`.
    pub fn compile_finalized(
        &self,
        chargen: &CharGen,
        forwarding: &Policy,
        config: &CompilerConfig,
    ) -> Result<CompiledPolicy> {
        config.validate()?;
        if forwarding.mentions(Field::PathTag) {
            return Err(CompileError::ReservedField(Field::PathTag));
        }
        for query in &self.queries {
            ensure_fresh(&query.path, chargen)?;
            for leaf in query.path.leaves() {
                if leaf.kind() == AtomKind::Hook && self.hook_bucket(leaf.id()).is_none() {
                    return Err(CompileError::UnboundHook(leaf.id()));
                }
            }
        }
        if config.verify_partition {
            chargen.verify()?;
        }

        let nfa = Nfa::build(
            self.queries
                .iter()
                .enumerate()
                .map(|(i, q)| (QueryId(i as u32), &q.path)),
            chargen,
        );
        let dfa = Dfa::build(&nfa, &chargen.alphabet());
        emit::check_tag_space(&dfa, config)?;
        let fragments = emit::emit(&dfa, chargen, self)?;

        let stats = CompileStats {
            queries: self.queries.len(),
            symbols: chargen.len(),
            states: dfa.len(),
            max_tag: dfa.len().saturating_sub(1) as u64,
        };
        let symbols = chargen
            .alphabet()
            .into_iter()
            .map(|sym| (sym, chargen.region_pred(sym).clone()))
            .collect();
        tracing::debug!(?stats, "compiled path queries");

        Ok(CompiledPolicy::compose(
            fragments,
            forwarding.clone(),
            symbols,
            self.exprs.clone(),
            stats,
        ))
    }

    /// The leaf with the given id, if a finalized query contains it.
    pub(crate) fn leaf(&self, atom: AtomId) -> Option<&Leaf> {
        self.queries
            .iter()
            .flat_map(|q| q.path.leaves())
            .find(|leaf| leaf.id() == atom)
    }
}

fn ensure_fresh(path: &Path, chargen: &CharGen) -> Result<()> {
    match path.leaves().into_iter().find(|leaf| leaf.epoch() != chargen.epoch()) {
        Some(stale) => Err(CompileError::StaleAtom(stale.id())),
        None => Ok(()),
    }
}
