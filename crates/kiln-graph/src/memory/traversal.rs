//! The depth-first walk every other component is built on.
//!
//! `walk` is the one place that guarantees termination on cyclic graphs:
//! a specifier already recorded in the caller's [`Tracing`] set is reported
//! through [`Visitor::revisit`] and never descended into again.

use rustc_hash::FxHashSet as HashSet;

use super::super::{Module, Specifier};
use super::graph::{GraphInner, ModuleGraph};

/// Set of specifiers already visited by a walk.
///
/// Callers own it so that several walks can share one boundary (e.g. one
/// propagation run over many roots finalizes each module at most once).
pub type Tracing = HashSet<Specifier>;

/// Which edges a walk follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Static (non-dynamic) imports, in source order.
    Static,
    /// Every import, static and dynamic, in source order.
    All,
    /// Reverse edges: the modules importing the current one.
    Dependents,
}

/// What a visitor wants the walk to do after entering a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    Continue,
    /// Do not descend into this node's edges; `leave` is still called.
    SkipChildren,
    /// Abort the whole walk.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    Completed,
    Stopped,
}

/// Callbacks driven by [`ModuleGraph::walk`].
///
/// `module` is `None` when an edge points at a specifier with no record
/// (never compiled, or removed). Visitors must not call back into the graph:
/// the walk holds its read lock.
pub trait Visitor {
    fn enter(&mut self, specifier: &Specifier, module: Option<&Module>, depth: usize)
    -> WalkControl;

    fn leave(&mut self, _specifier: &Specifier, _module: Option<&Module>) {}

    /// A specifier already in the tracing set was reached again.
    /// `on_path` is true when it is an ancestor of the current node (a cycle).
    fn revisit(&mut self, _specifier: &Specifier, _module: Option<&Module>, _on_path: bool) {}
}

impl<F> Visitor for F
where
    F: FnMut(&Specifier, Option<&Module>, usize) -> WalkControl,
{
    fn enter(&mut self, specifier: &Specifier, module: Option<&Module>, depth: usize) -> WalkControl {
        self(specifier, module, depth)
    }
}

struct Frame {
    specifier: Specifier,
    children: Vec<Specifier>,
    next: usize,
}

impl ModuleGraph {
    /// Depth-first walk from `start`.
    ///
    /// Each specifier is entered at most once per tracing set. The walk is
    /// iterative, so deep import chains do not grow the call stack.
    pub fn walk<V: Visitor>(
        &self,
        start: &Specifier,
        direction: Direction,
        tracing: &mut Tracing,
        visitor: &mut V,
    ) -> WalkOutcome {
        let inner = self.inner.read();
        let mut stack: Vec<Frame> = Vec::new();
        let mut on_path: HashSet<Specifier> = HashSet::default();

        if enter_node(&inner, start, 0, direction, tracing, &on_path, &mut stack, visitor)
            == WalkControl::Stop
        {
            return WalkOutcome::Stopped;
        }
        if let Some(frame) = stack.last() {
            on_path.insert(frame.specifier.clone());
        }

        while let Some(top) = stack.last_mut() {
            if top.next < top.children.len() {
                let child = top.children[top.next].clone();
                top.next += 1;
                let depth = stack.len();
                let before = stack.len();
                if enter_node(&inner, &child, depth, direction, tracing, &on_path, &mut stack, visitor)
                    == WalkControl::Stop
                {
                    return WalkOutcome::Stopped;
                }
                if stack.len() > before {
                    on_path.insert(child);
                }
            } else if let Some(frame) = stack.pop() {
                on_path.remove(&frame.specifier);
                let module = inner.modules.get(&frame.specifier).map(|m| &**m);
                visitor.leave(&frame.specifier, module);
            }
        }

        WalkOutcome::Completed
    }

    /// Every module that transitively imports `specifier` (statically or
    /// dynamically), nearest first. The specifier itself is excluded.
    pub fn transitive_dependents(&self, specifier: &Specifier) -> Vec<Specifier> {
        let mut found = Vec::new();
        let mut tracing = Tracing::default();
        self.walk(
            specifier,
            Direction::Dependents,
            &mut tracing,
            &mut |spec: &Specifier, _: Option<&Module>, depth: usize| {
                if depth > 0 {
                    found.push(spec.clone());
                }
                WalkControl::Continue
            },
        );
        found
    }

    /// Whether `from` reaches `to` through static imports.
    pub fn depends_on(&self, from: &Specifier, to: &Specifier) -> bool {
        let mut tracing = Tracing::default();
        let outcome = self.walk(
            from,
            Direction::Static,
            &mut tracing,
            &mut |spec: &Specifier, _: Option<&Module>, depth: usize| {
                if depth > 0 && spec == to {
                    WalkControl::Stop
                } else {
                    WalkControl::Continue
                }
            },
        );
        outcome == WalkOutcome::Stopped
    }
}

#[allow(clippy::too_many_arguments)]
fn enter_node<V: Visitor>(
    inner: &GraphInner,
    specifier: &Specifier,
    depth: usize,
    direction: Direction,
    tracing: &mut Tracing,
    on_path: &HashSet<Specifier>,
    stack: &mut Vec<Frame>,
    visitor: &mut V,
) -> WalkControl {
    let module = inner.modules.get(specifier).map(|m| &**m);

    if !tracing.insert(specifier.clone()) {
        visitor.revisit(specifier, module, on_path.contains(specifier));
        return WalkControl::SkipChildren;
    }

    match visitor.enter(specifier, module, depth) {
        WalkControl::Stop => WalkControl::Stop,
        WalkControl::SkipChildren => {
            visitor.leave(specifier, module);
            WalkControl::SkipChildren
        }
        WalkControl::Continue => {
            stack.push(Frame {
                specifier: specifier.clone(),
                children: children(inner, specifier, module, direction),
                next: 0,
            });
            WalkControl::Continue
        }
    }
}

fn children(
    inner: &GraphInner,
    specifier: &Specifier,
    module: Option<&Module>,
    direction: Direction,
) -> Vec<Specifier> {
    match direction {
        Direction::Static => module
            .map(|m| m.static_deps().map(|edge| edge.target.clone()).collect())
            .unwrap_or_default(),
        Direction::All => module
            .map(|m| m.deps.iter().map(|edge| edge.target.clone()).collect())
            .unwrap_or_default(),
        Direction::Dependents => {
            let mut dependents: Vec<Specifier> = inner
                .dependents
                .get(specifier)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default();
            dependents.sort();
            dependents
        }
    }
}
