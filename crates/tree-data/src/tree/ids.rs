//! Id sanitization
//!
//! Rewrites empty, duplicate and rejected ids so every node in a forest has a
//! unique id, and reports each rewrite so external id sets (selection,
//! expansion) can follow along.

use derive_more::Display;
use log::{debug, warn};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::tree::traits::{Forest, TraversalOrder, TreeWalker};
use crate::tree::Node;

/// How replacement ids are suffixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdStrategy {
    /// `base-1`, `base-2`, ... counting up per base
    #[default]
    #[display(fmt = "counter")]
    Counter,
    /// `base-x7k2qa`, retried until unused
    #[display(fmt = "random-suffix")]
    RandomSuffix,
}

type Validator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Configuration for [`sanitize_ids`]
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeOptions {
    /// Suffixing scheme for generated ids.
    pub strategy: IdStrategy,

    /// Placed between the base and the suffix.
    pub separator: String,

    /// Maximum length, in characters, of the base derived from a node's value.
    pub max_base_len: usize,

    /// Base used when neither the value nor the old id yields one.
    pub fallback_base: String,

    /// Length of random suffixes; `0` is treated as `1`.
    pub suffix_len: usize,

    /// Seed for random suffixes; `None` draws from entropy.
    pub seed: Option<u64>,

    /// Extra rule an id must satisfy to be kept.
    #[serde(skip)]
    validator: Option<Validator>,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            strategy: IdStrategy::Counter,
            separator: "-".to_string(),
            max_base_len: 32,
            fallback_base: "node".to_string(),
            suffix_len: 6,
            seed: None,
            validator: None,
        }
    }
}

impl fmt::Debug for SanitizeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SanitizeOptions")
            .field("strategy", &self.strategy)
            .field("separator", &self.separator)
            .field("max_base_len", &self.max_base_len)
            .field("fallback_base", &self.fallback_base)
            .field("suffix_len", &self.suffix_len)
            .field("seed", &self.seed)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl SanitizeOptions {
    /// Create sanitize options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the suffixing strategy.
    pub fn strategy(mut self, strategy: IdStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the separator between base and suffix.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the maximum base length.
    pub fn max_base_len(mut self, len: usize) -> Self {
        self.max_base_len = len;
        self
    }

    /// Set the fallback base.
    pub fn fallback_base(mut self, base: impl Into<String>) -> Self {
        self.fallback_base = base.into();
        self
    }

    /// Set the random suffix length.
    pub fn suffix_len(mut self, len: usize) -> Self {
        self.suffix_len = len.max(1);
        self
    }

    /// Seed the random suffix generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Only keep ids accepted by `validator`.
    ///
    /// Generated ids are checked too; when a value-derived id is rejected the
    /// fallback base is used instead. A validator that rejects every
    /// candidate built from the fallback base still gets a unique id, but a
    /// later pass will rewrite that id again.
    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Check an id against the configured validator.
    pub fn is_valid(&self, id: &str) -> bool {
        !id.is_empty() && self.validator.as_ref().map_or(true, |valid| valid(id))
    }
}

/// Why an id was rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdFix {
    /// The node had no id
    #[display(fmt = "empty")]
    Empty,
    /// An earlier node already holds the id and keeps it
    #[display(fmt = "duplicate")]
    Duplicate,
    /// The validator rejected the id
    #[display(fmt = "invalid")]
    Invalid,
}

/// A single id rewrite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdChange {
    pub old: String,
    pub new: String,
    pub reason: IdFix,
}

/// Every id rewrite made by one sanitization pass, in pre-order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdRemap {
    changes: Vec<IdChange>,
}

impl IdRemap {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IdChange> {
        self.changes.iter()
    }

    pub fn changes(&self) -> &[IdChange] {
        &self.changes
    }

    /// New id for the first rewrite of `old`
    pub fn get(&self, old: &str) -> Option<&str> {
        self.changes
            .iter()
            .find(|change| change.old == old)
            .map(|change| change.new.as_str())
    }

    /// Old id to new id, keeping the first rewrite of each old id
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::with_capacity(self.changes.len());
        for change in &self.changes {
            map.entry(change.old.clone())
                .or_insert_with(|| change.new.clone());
        }
        map
    }

    /// Rewrite externally held ids in place
    ///
    /// Ids whose node was renamed because it was empty or invalid follow the
    /// rename. Duplicates are left alone: the first holder of a duplicated id
    /// keeps it, so references to it stay valid. Returns how many ids changed.
    pub fn apply(&self, ids: &mut [String]) -> usize {
        let mut changed = 0;
        for id in ids.iter_mut() {
            let renamed = self
                .changes
                .iter()
                .find(|change| change.reason != IdFix::Duplicate && change.old == *id);
            if let Some(change) = renamed {
                *id = change.new.clone();
                changed += 1;
            }
        }
        changed
    }

    fn push(&mut self, change: IdChange) {
        self.changes.push(change);
    }
}

impl<'a> IntoIterator for &'a IdRemap {
    type Item = &'a IdChange;
    type IntoIter = std::slice::Iter<'a, IdChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

/// Rewrite the ids of `nodes` with default options
///
/// See [`sanitize_ids`].
pub fn fix_ids(nodes: &mut [Node]) -> IdRemap {
    sanitize_nodes(nodes, HashSet::new(), &SanitizeOptions::default())
}

/// Make every id in the forest unique and valid
///
/// Walking in pre-order, the first node holding a valid id keeps it. Empty
/// ids, later repeats and ids rejected by the validator are replaced with ids
/// unique in the forest and distinct from every id in `candidate_ids`, the ids
/// the caller already uses elsewhere. Running it again on the result returns
/// an empty remap.
pub fn sanitize_ids<F, I, S>(forest: &mut F, candidate_ids: I, options: &SanitizeOptions) -> IdRemap
where
    F: Forest + ?Sized,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let reserved = candidate_ids.into_iter().map(Into::into).collect();
    sanitize_nodes(forest.roots_mut(), reserved, options)
}

fn sanitize_nodes(
    nodes: &mut [Node],
    reserved: HashSet<String>,
    options: &SanitizeOptions,
) -> IdRemap {
    // Decide which nodes keep their id before generating anything, so a
    // generated id can never collide with an id kept further down.
    let mut taken = reserved;
    let mut kept_ids = HashSet::new();
    let verdicts: Vec<Option<IdFix>> = TreeWalker::new(nodes, TraversalOrder::PreOrder)
        .map(|node| {
            if node.id.is_empty() {
                Some(IdFix::Empty)
            } else if !options.is_valid(&node.id) {
                Some(IdFix::Invalid)
            } else if !kept_ids.insert(node.id.as_str()) {
                Some(IdFix::Duplicate)
            } else {
                None
            }
        })
        .collect();
    taken.extend(kept_ids.into_iter().map(str::to_string));

    let mut generator = IdGenerator::new(taken, options);
    let mut remap = IdRemap::default();
    let mut verdicts = verdicts.into_iter();
    rewrite(nodes, &mut verdicts, &mut generator, &mut remap);

    if !remap.is_empty() {
        debug!("Sanitized {} node ids", remap.len());
    }
    remap
}

fn rewrite<V>(
    nodes: &mut [Node],
    verdicts: &mut V,
    generator: &mut IdGenerator<'_>,
    remap: &mut IdRemap,
) where
    V: Iterator<Item = Option<IdFix>>,
{
    for node in nodes.iter_mut() {
        if let Some(reason) = verdicts.next().flatten() {
            let new = generator.next_id(node);
            debug!("Rewriting {} id {:?} to {:?}", reason, node.id, new);
            let old = std::mem::replace(&mut node.id, new.clone());
            remap.push(IdChange { old, new, reason });
        }
        if let Some(children) = node.children.as_mut() {
            rewrite(children, verdicts, generator, remap);
        }
    }
}

/// Random draws per id before falling back to counting
const MAX_RANDOM_DRAWS: usize = 64;

/// Extra fallback-base candidates offered to a picky validator
const MAX_FALLBACK_ATTEMPTS: usize = 64;

struct IdGenerator<'o> {
    taken: HashSet<String>,
    counters: HashMap<String, usize>,
    rng: StdRng,
    options: &'o SanitizeOptions,
}

impl<'o> IdGenerator<'o> {
    fn new(taken: HashSet<String>, options: &'o SanitizeOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            taken,
            counters: HashMap::new(),
            rng,
            options,
        }
    }

    /// A fresh id for `node`, reserved so it is never handed out twice
    fn next_id(&mut self, node: &Node) -> String {
        let options = self.options;
        let base = [node.label(), node.id.clone()]
            .iter()
            .map(|source| normalize_base(source, options.max_base_len))
            .find(|base| !base.is_empty())
            .unwrap_or_else(|| options.fallback_base.clone());

        let mut id = self.next_free(&base);
        if !options.is_valid(&id) && base != options.fallback_base {
            id = self.next_free(&options.fallback_base);
        }
        let mut attempts = 0;
        while !options.is_valid(&id) && attempts < MAX_FALLBACK_ATTEMPTS {
            id = self.next_free(&options.fallback_base);
            attempts += 1;
        }
        if !options.is_valid(&id) {
            warn!("Validator rejects generated id {:?}; keeping it to stay unique", id);
        }

        self.taken.insert(id.clone());
        id
    }

    fn next_free(&mut self, base: &str) -> String {
        if self.options.strategy == IdStrategy::RandomSuffix {
            if let Some(id) = self.next_random(base) {
                return id;
            }
            debug!("Random suffixes for {:?} exhausted, counting instead", base);
        }
        self.next_counted(base)
    }

    /// `base-<n>` with the next unused `n` for this base
    fn next_counted(&mut self, base: &str) -> String {
        let counter = self.counters.entry(base.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{base}{}{counter}", self.options.separator);
            if !self.taken.contains(&candidate) {
                return candidate;
            }
        }
    }

    fn next_random(&mut self, base: &str) -> Option<String> {
        let options = self.options;
        let suffix_len = options.suffix_len.max(1);
        for _ in 0..MAX_RANDOM_DRAWS {
            let suffix: String = (&mut self.rng)
                .sample_iter(&Alphanumeric)
                .take(suffix_len)
                .map(|byte| char::from(byte).to_ascii_lowercase())
                .collect();
            let candidate = format!("{base}{}{suffix}", options.separator);
            if !self.taken.contains(&candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

/// Lowercase, collapse runs of non-alphanumerics to `-`, trim, truncate
fn normalize_base(source: &str, max_len: usize) -> String {
    let mut base = String::with_capacity(source.len().min(max_len));
    let mut pending_dash = false;
    let mut len = 0;

    for ch in source.chars().flat_map(char::to_lowercase) {
        if len >= max_len {
            break;
        }
        if ch.is_alphanumeric() {
            if pending_dash && !base.is_empty() {
                // A separator is only worth keeping with a character after it
                if len + 1 >= max_len {
                    break;
                }
                base.push('-');
                len += 1;
            }
            base.push(ch);
            len += 1;
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }

    base
}
