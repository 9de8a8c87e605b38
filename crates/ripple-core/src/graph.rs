//! Explicit labeled transition system
//!
//! States are interned once by name into dense [`StateId`]s. Labels,
//! successors and predecessors are kept in arrays indexed by that id so the
//! backward fixpoint operators never hash on the hot path.

use crate::{GraphError, StateId, StateSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A finite Kripke structure: named states, a labeling, a successor
/// relation and a set of initial states
///
/// A graph is built once and then only queried. It serializes to and from
/// a name-based description (see [`GraphDescription`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "GraphDescription", try_from = "GraphDescription")]
pub struct Graph {
    names: Vec<String>,
    index: HashMap<String, StateId>,
    labels: Vec<BTreeSet<String>>,
    succ: Vec<Vec<StateId>>,
    pred: Vec<Vec<StateId>>,
    initial: Vec<StateId>,
    edge_count: usize,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state with its propositions
    ///
    /// Idempotent on `name`: re-adding returns the existing handle and
    /// leaves the original labels untouched.
    pub fn add_state<I, S>(&mut self, name: impl Into<String>, labels: I) -> StateId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if let Some(&id) = self.index.get(&name) {
            return id;
        }

        let id = StateId::new(self.names.len());
        self.index.insert(name.clone(), id);
        self.names.push(name);
        self.labels.push(labels.into_iter().map(Into::into).collect());
        self.succ.push(Vec::new());
        self.pred.push(Vec::new());
        id
    }

    /// Add a transition; duplicate edges are ignored
    pub fn add_edge(&mut self, from: StateId, to: StateId) {
        self.check(from);
        self.check(to);
        if self.succ[from.index()].contains(&to) {
            return;
        }
        self.succ[from.index()].push(to);
        self.pred[to.index()].push(from);
        self.edge_count += 1;
    }

    /// Add a transition between two states identified by name
    pub fn add_edge_by_name(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        let from = self.lookup(from)?;
        let to = self.lookup(to)?;
        self.add_edge(from, to);
        Ok(())
    }

    /// Mark a state as initial; may be called for several states
    pub fn set_initial(&mut self, name: &str) -> Result<StateId, GraphError> {
        let id = self.lookup(name)?;
        self.mark_initial(id);
        Ok(id)
    }

    /// Mark a state as initial by handle
    pub fn mark_initial(&mut self, id: StateId) {
        self.check(id);
        if !self.initial.contains(&id) {
            self.initial.push(id);
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// All state handles in insertion order
    pub fn states(&self) -> impl ExactSizeIterator<Item = StateId> + '_ {
        (0..self.names.len()).map(StateId::new)
    }

    /// Successors of a state, in the order their edges were added
    pub fn succ(&self, id: StateId) -> &[StateId] {
        &self.succ[id.index()]
    }

    /// Predecessors of a state
    pub fn pred(&self, id: StateId) -> &[StateId] {
        &self.pred[id.index()]
    }

    pub fn has_label(&self, id: StateId, prop: &str) -> bool {
        self.labels[id.index()].contains(prop)
    }

    /// Propositions attached to a state, in sorted order
    pub fn labels(&self, id: StateId) -> impl Iterator<Item = &str> + '_ {
        self.labels[id.index()].iter().map(String::as_str)
    }

    pub fn name(&self, id: StateId) -> &str {
        &self.names[id.index()]
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }

    /// Initial states in registration order
    pub fn initial(&self) -> &[StateId] {
        &self.initial
    }

    pub fn initial_states(&self) -> StateSet {
        self.set_of(self.initial.iter().copied())
    }

    /// States whose label set contains `prop`
    pub fn states_with_label(&self, prop: &str) -> StateSet {
        self.set_of(self.states().filter(|&id| self.has_label(id, prop)))
    }

    pub fn empty_set(&self) -> StateSet {
        StateSet::empty(self.len())
    }

    pub fn full_set(&self) -> StateSet {
        StateSet::full(self.len())
    }

    /// Collect handles into a set over this graph
    pub fn set_of<I: IntoIterator<Item = StateId>>(&self, ids: I) -> StateSet {
        let mut set = self.empty_set();
        set.extend(ids);
        set
    }

    /// Names of the states in `set`, in id order
    pub fn names_of<'a>(&'a self, set: &'a StateSet) -> impl Iterator<Item = &'a str> + 'a {
        set.iter().map(move |id| self.name(id))
    }

    fn lookup(&self, name: &str) -> Result<StateId, GraphError> {
        self.state_id(name)
            .ok_or_else(|| GraphError::UnknownState(name.to_string()))
    }

    fn check(&self, id: StateId) {
        assert!(
            id.index() < self.names.len(),
            "state {} does not belong to this graph of {} states",
            id,
            self.names.len()
        );
    }
}

/// Name-based serialized form of a [`Graph`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDescription {
    pub states: Vec<StateDescription>,
    #[serde(default)]
    pub edges: Vec<(String, String)>,
    #[serde(default)]
    pub initial: Vec<String>,
}

/// One state entry of a [`GraphDescription`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDescription {
    pub name: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl From<Graph> for GraphDescription {
    fn from(graph: Graph) -> Self {
        let states = graph
            .states()
            .map(|id| StateDescription {
                name: graph.name(id).to_string(),
                labels: graph.labels(id).map(str::to_string).collect(),
            })
            .collect();
        let edges = graph
            .states()
            .flat_map(|from| {
                graph
                    .succ(from)
                    .iter()
                    .map(move |&to| (from, to))
            })
            .map(|(from, to)| (graph.name(from).to_string(), graph.name(to).to_string()))
            .collect();
        let initial = graph
            .initial()
            .iter()
            .map(|&id| graph.name(id).to_string())
            .collect();

        Self {
            states,
            edges,
            initial,
        }
    }
}

impl TryFrom<GraphDescription> for Graph {
    type Error = GraphError;

    fn try_from(desc: GraphDescription) -> Result<Self, Self::Error> {
        let mut graph = Graph::new();
        for state in desc.states {
            if graph.state_id(&state.name).is_some() {
                return Err(GraphError::DuplicateState(state.name));
            }
            graph.add_state(state.name, state.labels);
        }
        for (from, to) in &desc.edges {
            graph.add_edge_by_name(from, to)?;
        }
        for name in &desc.initial {
            graph.set_initial(name)?;
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Graph {
        let mut graph = Graph::new();
        let a = graph.add_state("a", ["p"]);
        let b = graph.add_state("b", ["q"]);
        let c = graph.add_state("c", Vec::<String>::new());
        graph.add_edge(a, b);
        graph.add_edge(b, c);
        graph.add_edge(c, a);
        graph.mark_initial(a);
        graph
    }

    #[test]
    fn test_add_state_is_idempotent() {
        let mut graph = Graph::new();
        let first = graph.add_state("idle", ["ready"]);
        let again = graph.add_state("idle", ["other"]);

        assert_eq!(first, again);
        assert_eq!(graph.len(), 1);
        assert!(graph.has_label(first, "ready"));
        assert!(!graph.has_label(first, "other"));
    }

    #[test]
    fn test_edges_are_deduplicated() {
        let mut graph = triangle();
        let a = graph.state_id("a").unwrap();
        let b = graph.state_id("b").unwrap();

        graph.add_edge(a, b);
        graph.add_edge_by_name("a", "b").unwrap();

        assert_eq!(graph.succ(a), &[b]);
        assert_eq!(graph.pred(b), &[a]);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_initial_states() {
        let mut graph = triangle();
        graph.set_initial("b").unwrap();
        graph.set_initial("b").unwrap();

        let initial = graph.initial_states();
        let names: Vec<_> = graph.names_of(&initial).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(
            graph.set_initial("missing"),
            Err(GraphError::UnknownState("missing".to_string()))
        );
    }

    #[test]
    fn test_states_with_label() {
        let graph = triangle();
        let p = graph.states_with_label("p");
        assert_eq!(graph.names_of(&p).collect::<Vec<_>>(), vec!["a"]);
        assert!(graph.states_with_label("nope").is_empty());
    }

    #[test]
    fn test_description_round_trip() {
        let graph = triangle();
        let json = serde_json::to_string(&graph).unwrap();
        let restored: Graph = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.len(), 3);
        assert_eq!(restored.edge_count(), 3);
        assert_eq!(restored.initial().len(), 1);
        let a = restored.state_id("a").unwrap();
        assert_eq!(restored.name(restored.succ(a)[0]), "b");
    }

    #[test]
    fn test_description_rejects_unknown_edge_target() {
        let json = r#"{"states":[{"name":"a"}],"edges":[["a","z"]]}"#;
        let err = serde_json::from_str::<Graph>(json).unwrap_err();
        assert!(err.to_string().contains("Unknown state: z"));
    }

    #[test]
    #[should_panic(expected = "does not belong")]
    fn test_foreign_state_id_panics() {
        let mut small = Graph::new();
        let a = small.add_state("a", ["p"]);
        let big = triangle();
        let c = big.state_id("c").unwrap();
        small.add_edge(a, c);
    }
}
