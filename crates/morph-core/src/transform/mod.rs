// Mutation engine core: the transformer contract, the constraint-gated
// random selection algorithm, and the per-unit bookkeeping that makes
// repeated application monotonic and terminating.

pub mod catalog;
pub mod outcome;
pub mod registry;
pub mod values;

pub use outcome::{Category, DebugArtifacts, MutationRecord, Outcome, Snapshot};
pub use registry::TransformerRegistry;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::tree::{NodeId, SyntaxTree, TreeError, Type};

/// Bound on the fresh-name redraw loop. Exceeding it is a fatal error, not
/// a spin.
pub const MAX_NAME_ATTEMPTS: usize = 64;

/// Fatal mutation errors. "No eligible target" is never one of these; it
/// is the `Outcome::Empty` value.
#[derive(thiserror::Error, Debug)]
pub enum MutationError {
    /// A type outside the supported tables reached the edit step. This is
    /// a contract violation between predicate and edit logic.
    #[error("{mutation}: unsupported type {ty} reached the edit step")]
    UnsupportedType {
        mutation: &'static str,
        ty: Type,
    },

    /// A structural edit or fragment resolution/recompilation failed. The
    /// tree may be left partially edited and must not be reused.
    #[error("tree operation failed: {0}")]
    Tree(#[from] TreeError),

    /// Fresh-name generation exhausted its retry bound
    #[error("{mutation}: no collision-free name after {attempts} attempts")]
    NameGeneration {
        mutation: &'static str,
        attempts: usize,
    },

    /// The tree violated a structural assumption of the edit (e.g. a
    /// method without a body block)
    #[error("{mutation}: malformed tree: {message}")]
    MalformedTree {
        mutation: &'static str,
        message: String,
    },
}

/// A named pure predicate over a tree root: "does at least one legal
/// target exist?". Cheap enough to run before every application attempt.
#[derive(Clone, Copy)]
pub struct Constraint {
    name: &'static str,
    check: fn(&SyntaxTree) -> bool,
}

impl Constraint {
    pub const fn new(name: &'static str, check: fn(&SyntaxTree) -> bool) -> Self {
        Self { name, check }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn holds(&self, tree: &SyntaxTree) -> bool {
        (self.check)(tree)
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint").field("name", &self.name).finish()
    }
}

/// One mutation unit of the catalog.
///
/// Usage invariant: a unit owns unsynchronized instance state (its RNG and
/// its ledger) and mutates the tree it is handed. One tree, one writer,
/// one thread; concurrent reuse of a unit instance is outside the
/// contract.
///
/// Reproducibility: two freshly constructed units of the same catalog
/// entry with equal `(seed, attempt_recompile, resolve_references)` and
/// mode flags are interchangeable. Their first applications to fresh
/// copies of the same tree produce the same edit and equal outcomes.
pub trait Transformer {
    /// Stable catalog-entry name, also used as the result name
    fn name(&self) -> &'static str;

    /// Locate a legal target at random and rewrite it. Returns
    /// `Ok(Outcome::Empty)` when no eligible target exists; every other
    /// failure is fatal.
    fn apply_at_random(&mut self, tree: &mut SyntaxTree) -> Result<Outcome, MutationError>;

    /// Constraints gating any structural access
    fn requirements(&self) -> Vec<Constraint>;

    /// Catalog entries this one must not be combined with. Declared for
    /// every entry; empty throughout the observed catalog, and no
    /// enforcement is wired anywhere.
    fn exclusive_with(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Classification tags attached to successful results
    fn categories(&self) -> BTreeSet<Category>;

    /// Reset the RNG stream. The already-mutated ledger survives a
    /// reseed; callers that want a pristine unit must construct one.
    fn set_seed(&mut self, seed: u64);

    /// Toggle debug artifacts on results. Never changes selection or the
    /// edit itself.
    fn set_debug(&mut self, debug: bool);

    fn set_attempt_recompile(&mut self, attempt: bool);

    fn set_resolve_references(&mut self, resolve: bool);
}

/// State shared by every catalog entry: the seeded RNG, the policy flags,
/// and the per-scope ledger of already mutated targets.
#[derive(Debug)]
pub struct TransformerCore {
    seed: u64,
    rng: StdRng,
    attempt_recompile: bool,
    resolve_references: bool,
    debug: bool,
    ledger: HashMap<NodeId, HashSet<NodeId>>,
}

impl TransformerCore {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            attempt_recompile: true,
            resolve_references: true,
            debug: false,
            ledger: HashMap::new(),
        }
    }

    /// Configuration tuple that defines unit equality. Mutation history is
    /// deliberately excluded.
    pub fn config(&self) -> (u64, bool, bool) {
        (self.seed, self.attempt_recompile, self.resolve_references)
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn set_attempt_recompile(&mut self, attempt: bool) {
        self.attempt_recompile = attempt;
    }

    pub fn set_resolve_references(&mut self, resolve: bool) {
        self.resolve_references = resolve;
    }

    /// Restart the RNG stream from a new seed. The ledger is intentionally
    /// kept: exhausted targets stay exhausted.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Whether a target is already ledgered for its scope
    pub fn is_ledgered(&self, scope: NodeId, target: NodeId) -> bool {
        self.ledger
            .get(&scope)
            .map(|set| set.contains(&target))
            .unwrap_or(false)
    }

    /// Record targets under a scope. Entries only ever accumulate.
    pub fn record(&mut self, scope: NodeId, targets: impl IntoIterator<Item = NodeId>) {
        self.ledger.entry(scope).or_default().extend(targets);
    }

    /// Constraint-gated random selection. Enumerates descendants matching
    /// the predicate in preorder, drops targets already ledgered for their
    /// scope (as derived by `scope_of`), and draws one survivor uniformly,
    /// consuming exactly one RNG draw of range `[0, pool)`.
    ///
    /// Re-run on every application; never cached. The pool changes as the
    /// tree changes, and the ledger guarantees monotonic exhaustion.
    pub fn select_target(
        &mut self,
        tree: &SyntaxTree,
        predicate: impl Fn(&SyntaxTree, NodeId) -> bool,
        scope_of: impl Fn(&SyntaxTree, NodeId) -> Option<NodeId>,
    ) -> Option<(NodeId, NodeId)> {
        let pool: Vec<(NodeId, NodeId)> = tree
            .find(|t, id| predicate(t, id))
            .into_iter()
            .filter_map(|id| scope_of(tree, id).map(|scope| (id, scope)))
            .filter(|&(id, scope)| !self.is_ledgered(scope, id))
            .collect();
        if pool.is_empty() {
            trace!("selection pool empty");
            return None;
        }
        let choice = self.rng.gen_range(0..pool.len());
        let (target, scope) = pool[choice];
        debug!(%target, %scope, pool = pool.len(), "selected mutation target");
        Some((target, scope))
    }

    /// Draw an index for inserting into a statement list of length `len`,
    /// never past `limit` (the first unreachable position). Consumes one
    /// draw even when only one index is legal, keeping the draw sequence
    /// independent of tree shape details.
    pub fn pick_insertion_index(&mut self, len: usize, limit: usize) -> usize {
        let upper = len.min(limit);
        self.rng.gen_range(0..=upper)
    }

    /// Generate an identifier not colliding with anything in `taken`.
    /// Bounded redraw loop: each attempt consumes one RNG draw; exceeding
    /// the bound is a fatal error rather than an unbounded spin.
    pub fn fresh_name(
        &mut self,
        mutation: &'static str,
        prefix: &str,
        taken: &HashSet<String>,
    ) -> Result<String, MutationError> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let candidate = format!("{prefix}_{:04x}", self.rng.gen_range(0u32..0x1_0000));
            if !taken.contains(&candidate) {
                return Ok(candidate);
            }
        }
        Err(MutationError::NameGeneration {
            mutation,
            attempts: MAX_NAME_ATTEMPTS,
        })
    }

    /// Draw uniformly from a fixed slice (e.g. the supported value types)
    pub fn pick_from<'a, T>(&mut self, options: &'a [T]) -> &'a T {
        &options[self.rng.gen_range(0..options.len())]
    }

    /// One unconstrained draw, for synthesized marker text
    pub fn marker(&mut self) -> u32 {
        self.rng.gen()
    }

    /// Step 5 of the contract: hand the synthesized fragment back to the
    /// tree library for resolution, honoring the policy flags. A failure
    /// is fatal and the tree must not be reused.
    pub fn recompile(
        &self,
        tree: &SyntaxTree,
        fragment: NodeId,
    ) -> Result<(), MutationError> {
        if !self.attempt_recompile {
            return Ok(());
        }
        tree.resolve_fragment(fragment, self.resolve_references)?;
        Ok(())
    }

    /// Steps 6 and 7 of the contract: ledger the targets and build the
    /// success record. `pre` must have been snapshotted before the edit.
    pub fn commit(
        &mut self,
        tree: &SyntaxTree,
        scope: NodeId,
        ledgered: Vec<NodeId>,
        name: &'static str,
        categories: BTreeSet<Category>,
        pre: Snapshot,
    ) -> Outcome {
        self.record(scope, ledgered);
        let debug_artifacts = if self.debug {
            let post = Snapshot::of(tree, scope);
            Some(DebugArtifacts {
                diff: outcome::render_diff(&pre.render(), &post.render()),
                post_snapshot: post,
            })
        } else {
            None
        };
        debug!(mutation = name, %scope, "mutation committed");
        Outcome::Success(MutationRecord {
            name: name.to_string(),
            categories,
            pre_snapshot: pre,
            debug: debug_artifacts,
        })
    }
}

/// Gate shared by every entry: evaluate all constraints before any
/// structural access.
pub(crate) fn constraints_hold(constraints: &[Constraint], tree: &SyntaxTree) -> bool {
    for constraint in constraints {
        if !constraint.holds(tree) {
            trace!(constraint = constraint.name(), "constraint failed");
            return false;
        }
    }
    true
}
