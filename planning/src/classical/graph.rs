//! The layered relaxed-planning-graph structure: an append-only bipartite
//! graph of fact and action nodes, grouped into layers, with a reverse
//! label index for looking up every node that ever carried a given fact or
//! action.
//!
//! Grounded on two sources at once: the node-arena shape comes from
//! `strips_collections::ref_store::RefStore` (the teacher's
//! `aries_collections` arena pattern — nodes are index handles, not
//! pointers), while the actual layering operations (`add_nodes`,
//! `add_layer` with a cross-layer and an intra-layer connection predicate)
//! are a direct port of the original `graph.py`'s `GraphManager.add_layer`,
//! which builds edges by testing `connection_func`/`inter_connection_func`
//! over the cartesian product of node pairs rather than pre-computing
//! adjacency from domain knowledge.

use crate::classical::operator::GroundAction;
use crate::classical::state::Fact;
use std::collections::HashMap;
use std::rc::Rc;
use strips_collections::create_ref_type;
use strips_collections::ref_store::RefStore;

create_ref_type!(NodeId);

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Fact(Fact),
    Action(Rc<GroundAction>),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LayerKind {
    Facts,
    Actions,
}

pub struct Layer {
    pub ordinal: usize,
    pub kind: LayerKind,
    pub nodes: Vec<NodeId>,
}

/// A predicate deciding whether an edge should be added between two nodes,
/// given their labels.
pub type EdgeFn<'a> = dyn Fn(&Label, &Label) -> bool + 'a;

#[derive(Default)]
pub struct LayeredGraph {
    labels: RefStore<NodeId, Label>,
    adjacency: RefStore<NodeId, Vec<NodeId>>,
    reverse: HashMap<Label, Vec<NodeId>>,
    layers: Vec<Layer>,
}

impl LayeredGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_nodes(&mut self, labels: Vec<Label>) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(labels.len());
        for label in labels {
            let id = self.labels.push(label.clone());
            self.adjacency.push(Vec::new());
            self.reverse.entry(label).or_default().push(id);
            ids.push(id);
        }
        ids
    }

    fn add_edge(&mut self, a: NodeId, b: NodeId) {
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);
    }

    /// Appends a new layer of `labels`. If a previous layer exists and
    /// `inter_layer_edge` is given, adds an edge between every node of the
    /// previous layer and every node of this one for which the predicate
    /// holds (called as `f(previous_label, new_label)`). If `intra_edge` is
    /// given, does the same within this layer's own node pairs.
    pub fn add_layer(
        &mut self,
        labels: Vec<Label>,
        kind: LayerKind,
        intra_edge: Option<&EdgeFn>,
        inter_layer_edge: Option<&EdgeFn>,
    ) -> usize {
        let prev_nodes = self.layers.last().map(|l| l.nodes.clone());
        let nodes = self.add_nodes(labels);

        if let (Some(prev), Some(f)) = (prev_nodes.as_ref(), inter_layer_edge) {
            for &u in prev {
                for &v in &nodes {
                    if f(self.labels.get(u), self.labels.get(v)) {
                        self.add_edge(u, v);
                    }
                }
            }
        }

        if let Some(f) = intra_edge {
            for i in 0..nodes.len() {
                for j in (i + 1)..nodes.len() {
                    let (u, v) = (nodes[i], nodes[j]);
                    if f(self.labels.get(u), self.labels.get(v)) {
                        self.add_edge(u, v);
                    }
                }
            }
        }

        let ordinal = self.layers.len();
        self.layers.push(Layer { ordinal, kind, nodes });
        ordinal
    }

    pub fn layer(&self, i: usize) -> &Layer {
        &self.layers[i]
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn layers_iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn label(&self, id: NodeId) -> &Label {
        self.labels.get(id)
    }

    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        &self.adjacency[id]
    }

    pub fn indices_of(&self, label: &Label) -> &[NodeId] {
        self.reverse.get(label).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolTable;

    fn fact(table: &mut SymbolTable, pred: &str, args: &[&str]) -> Fact {
        let p = table.intern(pred);
        let args: Vec<_> = args.iter().map(|a| table.intern(a)).collect();
        Fact::new(p, args)
    }

    #[test]
    fn layers_are_appended_and_indexed_by_ordinal() {
        let mut table = SymbolTable::new();
        let mut graph = LayeredGraph::new();

        let f0 = fact(&mut table, "at", &["a"]);
        let f1 = fact(&mut table, "visited", &["a"]);

        graph.add_layer(vec![Label::Fact(f0.clone())], LayerKind::Facts, None, None);
        graph.add_layer(vec![Label::Fact(f1.clone())], LayerKind::Facts, None, None);

        assert_eq!(graph.num_layers(), 2);
        assert_eq!(graph.layer(0).ordinal, 0);
        assert_eq!(graph.layer(1).ordinal, 1);
        assert_eq!(graph.layer(0).kind, LayerKind::Facts);
    }

    #[test]
    fn inter_layer_edge_fn_is_applied_selectively_and_symmetrically() {
        let mut table = SymbolTable::new();
        let mut graph = LayeredGraph::new();

        let f0 = fact(&mut table, "at", &["a"]);
        let f1 = fact(&mut table, "visited", &["a"]);
        let f2 = fact(&mut table, "elsewhere", &["a"]);

        graph.add_layer(vec![Label::Fact(f0.clone())], LayerKind::Facts, None, None);
        // Only f1 (same arguments as f0) should connect back to f0.
        graph.add_layer(
            vec![Label::Fact(f1.clone()), Label::Fact(f2.clone())],
            LayerKind::Facts,
            None,
            Some(&|prev, next| match (prev, next) {
                (Label::Fact(p), Label::Fact(n)) => p.args == n.args && p.predicate == table.lookup("at").unwrap(),
                _ => false,
            }),
        );

        let f0_id = graph.indices_of(&Label::Fact(f0))[0];
        let f1_id = graph.indices_of(&Label::Fact(f1))[0];
        let f2_id = graph.indices_of(&Label::Fact(f2))[0];

        assert_eq!(graph.neighbors(f0_id), &[f1_id]);
        assert_eq!(graph.neighbors(f1_id), &[f0_id]);
        assert!(graph.neighbors(f2_id).is_empty());
    }

    #[test]
    fn reverse_index_tracks_every_occurrence_of_a_repeated_fact() {
        let mut table = SymbolTable::new();
        let mut graph = LayeredGraph::new();

        let f = fact(&mut table, "at", &["a"]);

        graph.add_layer(vec![Label::Fact(f.clone())], LayerKind::Facts, None, None);
        graph.add_layer(vec![Label::Fact(f.clone())], LayerKind::Facts, None, None);

        assert_eq!(graph.indices_of(&Label::Fact(f)).len(), 2);
    }
}
