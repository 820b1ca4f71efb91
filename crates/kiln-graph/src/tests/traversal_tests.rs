use super::{ready, spec};
use crate::{
    DependencyEdge, Direction, Module, ModuleGraph, Specifier, Tracing, Visitor, WalkControl,
    WalkOutcome,
};

#[derive(Default)]
struct Recorder {
    entered: Vec<(String, usize)>,
    left: Vec<String>,
    revisits: Vec<(String, bool)>,
}

impl Visitor for Recorder {
    fn enter(&mut self, specifier: &Specifier, _: Option<&Module>, depth: usize) -> WalkControl {
        self.entered.push((specifier.to_string(), depth));
        WalkControl::Continue
    }

    fn leave(&mut self, specifier: &Specifier, _: Option<&Module>) {
        self.left.push(specifier.to_string());
    }

    fn revisit(&mut self, specifier: &Specifier, _: Option<&Module>, on_path: bool) {
        self.revisits.push((specifier.to_string(), on_path));
    }
}

#[test]
fn walk_is_depth_first_in_source_order() {
    let graph = ModuleGraph::new();
    let a = ready(&graph, "/a.ts", "a", &["/b.ts", "/c.ts"]);
    ready(&graph, "/b.ts", "b", &["/d.ts"]);
    ready(&graph, "/c.ts", "c", &[]);
    ready(&graph, "/d.ts", "d", &[]);

    let mut recorder = Recorder::default();
    let outcome = graph.walk(&a, Direction::Static, &mut Tracing::default(), &mut recorder);

    assert_eq!(outcome, WalkOutcome::Completed);
    assert_eq!(
        recorder.entered,
        [
            ("/a.ts".to_string(), 0),
            ("/b.ts".to_string(), 1),
            ("/d.ts".to_string(), 2),
            ("/c.ts".to_string(), 1),
        ]
    );
    assert_eq!(recorder.left, ["/d.ts", "/b.ts", "/c.ts", "/a.ts"]);
}

#[test]
fn cycle_is_reported_as_on_path_revisit() {
    let graph = ModuleGraph::new();
    let a = ready(&graph, "/a.ts", "a", &["/b.ts"]);
    ready(&graph, "/b.ts", "b", &["/a.ts"]);

    let mut recorder = Recorder::default();
    let outcome = graph.walk(&a, Direction::Static, &mut Tracing::default(), &mut recorder);

    assert_eq!(outcome, WalkOutcome::Completed);
    assert_eq!(recorder.entered.len(), 2);
    assert_eq!(recorder.revisits, [("/a.ts".to_string(), true)]);
}

#[test]
fn diamond_revisit_is_not_on_path() {
    let graph = ModuleGraph::new();
    let a = ready(&graph, "/a.ts", "a", &["/b.ts", "/c.ts"]);
    ready(&graph, "/b.ts", "b", &["/d.ts"]);
    ready(&graph, "/c.ts", "c", &["/d.ts"]);
    ready(&graph, "/d.ts", "d", &[]);

    let mut recorder = Recorder::default();
    graph.walk(&a, Direction::Static, &mut Tracing::default(), &mut recorder);

    assert_eq!(recorder.revisits, [("/d.ts".to_string(), false)]);
}

#[test]
fn static_walk_skips_dynamic_edges() {
    let graph = ModuleGraph::new();
    let a = ready(&graph, "/a.ts", "a", &[]);
    graph
        .set_dependencies(&a, vec![DependencyEdge::dynamic(spec("/lazy.ts"))])
        .unwrap();
    ready(&graph, "/lazy.ts", "lazy", &[]);

    let mut seen = Vec::new();
    graph.walk(
        &a,
        Direction::Static,
        &mut Tracing::default(),
        &mut |s: &Specifier, _: Option<&Module>, _: usize| {
            seen.push(s.clone());
            WalkControl::Continue
        },
    );
    assert_eq!(seen, vec![a.clone()]);

    let mut tracing = Tracing::default();
    graph.walk(
        &a,
        Direction::All,
        &mut tracing,
        &mut |_: &Specifier, _: Option<&Module>, _: usize| WalkControl::Continue,
    );
    assert!(tracing.contains(&spec("/lazy.ts")));
}

#[test]
fn stop_aborts_walk() {
    let graph = ModuleGraph::new();
    let a = ready(&graph, "/a.ts", "a", &["/b.ts", "/c.ts"]);
    ready(&graph, "/b.ts", "b", &[]);
    ready(&graph, "/c.ts", "c", &[]);

    let mut count = 0;
    let outcome = graph.walk(
        &a,
        Direction::Static,
        &mut Tracing::default(),
        &mut |s: &Specifier, _: Option<&Module>, _: usize| {
            count += 1;
            if s.as_str() == "/b.ts" {
                WalkControl::Stop
            } else {
                WalkControl::Continue
            }
        },
    );
    assert_eq!(outcome, WalkOutcome::Stopped);
    assert_eq!(count, 2);
}

#[test]
fn shared_tracing_set_bounds_multiple_walks() {
    let graph = ModuleGraph::new();
    let a = ready(&graph, "/a.ts", "a", &["/shared.ts"]);
    let b = ready(&graph, "/b.ts", "b", &["/shared.ts"]);
    ready(&graph, "/shared.ts", "s", &[]);

    let mut tracing = Tracing::default();
    let mut entered = 0;
    for root in [&a, &b] {
        graph.walk(
            root,
            Direction::Static,
            &mut tracing,
            &mut |_: &Specifier, _: Option<&Module>, _: usize| {
                entered += 1;
                WalkControl::Continue
            },
        );
    }
    assert_eq!(entered, 3);
}

#[test]
fn missing_targets_are_entered_without_record() {
    let graph = ModuleGraph::new();
    let a = ready(&graph, "/a.ts", "a", &["/gone.ts"]);

    let mut missing = Vec::new();
    graph.walk(
        &a,
        Direction::Static,
        &mut Tracing::default(),
        &mut |s: &Specifier, m: Option<&Module>, _: usize| {
            if m.is_none() {
                missing.push(s.clone());
            }
            WalkControl::Continue
        },
    );
    assert_eq!(missing, vec![spec("/gone.ts")]);
}

#[test]
fn transitive_dependents_follow_reverse_edges() {
    let graph = ModuleGraph::new();
    ready(&graph, "/a.ts", "a", &["/b.ts"]);
    ready(&graph, "/b.ts", "b", &["/c.ts"]);
    let c = ready(&graph, "/c.ts", "c", &[]);
    ready(&graph, "/unrelated.ts", "u", &[]);

    assert_eq!(graph.transitive_dependents(&c), vec![spec("/b.ts"), spec("/a.ts")]);
    assert!(graph.depends_on(&spec("/a.ts"), &c));
    assert!(!graph.depends_on(&c, &spec("/a.ts")));
}

#[test]
fn transitive_dependents_terminate_on_cycles() {
    let graph = ModuleGraph::new();
    ready(&graph, "/a.ts", "a", &["/b.ts"]);
    let b = ready(&graph, "/b.ts", "b", &["/a.ts"]);

    assert_eq!(graph.transitive_dependents(&b), vec![spec("/a.ts")]);
}
