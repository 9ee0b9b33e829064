//! Root discovery, multi-root marking and bundle partitioning.
//!
//! A merge pass works on an immutable [`ModuleSet`]. Root attribution lives in
//! a [`RootMarks`] table created by the pass and dropped with it, so repeated
//! merges over the same modules start from a clean slate.
//!
//! ```text
//!   find_roots ──▶ mark_roots ──▶ partition per root ──▶ common bundle
//!   (in-degree 0    (BFS, one       (exclusive modules,     (modules reached
//!    + extras)       mark/root)      dependency-first)       from ≥ 2 roots)
//! ```

use std::collections::VecDeque;

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashSet};
use serde::Serialize;

use super::{ModuleIdx, ModuleSet, QueryPath};

/// Ordered output of one root (or of the shared modules).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Bundle {
    /// Query paths in load order: every module follows the modules it requires.
    pub modules: Vec<QueryPath>,
    /// Whether this bundle requires modules that were lifted into the common
    /// bundle, which must then be loaded first.
    pub uses_common: bool,
}

impl Bundle {
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn contains(&self, query_path: &QueryPath) -> bool {
        self.modules.contains(query_path)
    }
}

/// Result of partitioning a module set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeResult {
    /// One bundle per root, in root discovery order.
    pub bundles: IndexMap<QueryPath, Bundle, FxBuildHasher>,
    /// Modules reachable from two or more roots.
    pub common: Option<Bundle>,
}

impl MergeResult {
    pub fn roots(&self) -> impl Iterator<Item = &QueryPath> {
        self.bundles.keys()
    }

    pub fn bundle(&self, root: &QueryPath) -> Option<&Bundle> {
        self.bundles.get(root)
    }

    /// Every placed module, common bundle first, each exactly once.
    pub fn modules(&self) -> impl Iterator<Item = &QueryPath> {
        self.common
            .iter()
            .chain(self.bundles.values())
            .flat_map(|bundle| bundle.modules.iter())
    }

    pub fn module_count(&self) -> usize {
        self.modules().count()
    }
}

/// Root attribution for one merge pass.
///
/// For every module, the roots that can reach it, recorded once per root.
#[derive(Debug, Clone)]
pub struct RootMarks {
    roots: Vec<ModuleIdx>,
    marks: Vec<Vec<usize>>,
}

impl RootMarks {
    fn new(module_count: usize) -> Self {
        Self {
            roots: Vec::new(),
            marks: vec![Vec::new(); module_count],
        }
    }

    pub fn roots(&self) -> &[ModuleIdx] {
        &self.roots
    }

    /// Roots that reach `idx`, in marking order.
    pub fn roots_of(&self, idx: ModuleIdx) -> impl Iterator<Item = ModuleIdx> + '_ {
        self.marks[idx.index()].iter().map(|&slot| self.roots[slot])
    }

    pub fn reach_count(&self, idx: ModuleIdx) -> usize {
        self.marks[idx.index()].len()
    }

    /// Marks stay sorted: slots are handed out in increasing order and
    /// `release` keeps the remaining ones in place.
    fn carries(&self, idx: ModuleIdx, slot: usize) -> bool {
        self.marks[idx.index()].binary_search(&slot).is_ok()
    }

    /// During `mark_from`, `slot` is the newest slot, so it can only be last.
    fn carries_newest(&self, idx: ModuleIdx, slot: usize) -> bool {
        self.marks[idx.index()].last() == Some(&slot)
    }

    /// Add `root` and mark everything it reaches.
    ///
    /// A module already carrying the root is not enqueued again, which bounds
    /// the walk on circular chains and keeps attribution idempotent.
    fn mark_from(&mut self, set: &ModuleSet, root: ModuleIdx) {
        let slot = self.roots.len();
        self.roots.push(root);

        let mut queue = VecDeque::from([root]);
        while let Some(current) = queue.pop_front() {
            if self.carries_newest(current, slot) {
                continue;
            }
            self.marks[current.index()].push(slot);

            for dep in set.dependencies(current) {
                if !self.carries_newest(dep, slot) {
                    queue.push_back(dep);
                }
            }
        }
    }

    /// Drop `slot` from a module's marks, returning how many remain.
    fn release(&mut self, idx: ModuleIdx, slot: usize) -> usize {
        let marks = &mut self.marks[idx.index()];
        marks.retain(|&s| s != slot);
        marks.len()
    }
}

/// Entry modules: nothing in the set requires them. Explicit extra roots are
/// appended; duplicates and unknown paths are dropped.
pub fn find_roots(set: &ModuleSet, extra_roots: &[QueryPath]) -> Vec<ModuleIdx> {
    let required_by = set.required_by();
    let mut seen = FxHashSet::default();
    let mut roots = Vec::new();

    for idx in set.indices() {
        if required_by[idx.index()].is_empty() && seen.insert(idx) {
            roots.push(idx);
        }
    }

    for extra in extra_roots {
        match set.idx_of(extra) {
            Some(idx) => {
                if seen.insert(idx) {
                    roots.push(idx);
                }
            }
            None => tracing::warn!("export module {extra} is not part of the build, ignored"),
        }
    }

    roots
}

/// Mark every module with the roots that reach it.
pub fn mark_roots(set: &ModuleSet, roots: &[ModuleIdx]) -> RootMarks {
    let mut marks = RootMarks::new(set.len());
    for &root in roots {
        marks.mark_from(set, root);
    }
    marks
}

/// Partition `set` into per-root bundles plus a common bundle.
pub fn merge(set: &ModuleSet, extra_roots: &[QueryPath]) -> MergeResult {
    let roots = find_roots(set, extra_roots);
    let mut marks = mark_roots(set, &roots);

    // Cycles nobody enters would otherwise never be emitted.
    for idx in set.indices() {
        if marks.reach_count(idx) == 0 {
            tracing::debug!(
                "{} is only reachable through a cycle, promoted to root",
                set.get(idx).query_path
            );
            marks.mark_from(set, idx);
        }
    }

    tracing::debug!(
        "merge: {} modules, {} roots",
        set.len(),
        marks.roots().len()
    );

    let shared: Vec<bool> = set.indices().map(|idx| marks.reach_count(idx) >= 2).collect();
    let mut consumed = vec![false; set.len()];
    let mut shared_frontier = Vec::new();
    let mut in_frontier = vec![false; set.len()];
    let mut result = MergeResult::default();

    for slot in 0..marks.roots().len() {
        let root = marks.roots()[slot];
        let mut uses_common = false;

        let order = dependency_first(set, root, |idx| {
            if shared[idx.index()] {
                uses_common = true;
                if !in_frontier[idx.index()] {
                    in_frontier[idx.index()] = true;
                    shared_frontier.push(idx);
                }
                return false;
            }
            marks.carries(idx, slot) && !consumed[idx.index()]
        });

        for &idx in &order {
            if marks.release(idx, slot) == 0 {
                consumed[idx.index()] = true;
            }
        }

        result.bundles.insert(
            set.get(root).query_path.clone(),
            Bundle {
                modules: query_paths(set, &order),
                uses_common,
            },
        );
    }

    let mut in_common = vec![false; set.len()];
    let mut common = Vec::new();
    for start in shared_frontier {
        let order = dependency_first(set, start, |idx| {
            shared[idx.index()] && !in_common[idx.index()]
        });
        for idx in order {
            in_common[idx.index()] = true;
            common.push(idx);
        }
    }

    if !common.is_empty() {
        tracing::debug!("merge: {} modules lifted into the common bundle", common.len());
        result.common = Some(Bundle {
            modules: query_paths(set, &common),
            uses_common: false,
        });
    }

    result
}

/// Depth-first post-order walk from `start` over `requires` edges.
///
/// Dependencies are visited in declaration order, so the output lists every
/// module after the modules it requires, ties broken by first discovery. Only
/// modules accepted by `admit` are visited; back edges of a cycle are skipped.
pub fn dependency_first<F>(set: &ModuleSet, start: ModuleIdx, mut admit: F) -> Vec<ModuleIdx>
where
    F: FnMut(ModuleIdx) -> bool,
{
    struct Frame {
        node: ModuleIdx,
        cursor: usize,
    }

    let mut order = Vec::new();
    if !admit(start) {
        return order;
    }

    let mut visited = FxHashSet::default();
    visited.insert(start);
    let mut stack = vec![Frame {
        node: start,
        cursor: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let requires = &set.get(frame.node).requires;
        let mut next = None;
        while frame.cursor < requires.len() {
            let req = &requires[frame.cursor];
            frame.cursor += 1;
            if let Some(dep) = set.idx_of(req) {
                if !visited.contains(&dep) && admit(dep) {
                    visited.insert(dep);
                    next = Some(dep);
                    break;
                }
            }
        }

        match next {
            Some(dep) => stack.push(Frame {
                node: dep,
                cursor: 0,
            }),
            None => {
                order.push(frame.node);
                stack.pop();
            }
        }
    }

    order
}

fn query_paths(set: &ModuleSet, order: &[ModuleIdx]) -> Vec<QueryPath> {
    order
        .iter()
        .map(|&idx| set.get(idx).query_path.clone())
        .collect()
}
