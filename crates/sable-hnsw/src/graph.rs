//! Per-layer graph storage.
//!
//! Layers never hold vector data. They reference the index's vertex arena by
//! id, so growing the arena cannot invalidate anything stored here.

use std::collections::HashMap;

/// Index into the vertex arena owned by the enclosing index.
pub(crate) type VertexId = usize;

/// One small-world layer: the vertices present at this level and their
/// undirected adjacency.
#[derive(Debug, Default)]
pub(crate) struct Layer {
    /// Insertion order; the head doubles as the layer's entry point.
    nodes: Vec<VertexId>,
    adjacency: HashMap<VertexId, Vec<VertexId>>,
}

impl Layer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh layer containing a single vertex.
    pub fn with_vertex(vertex: VertexId) -> Self {
        let mut layer = Self::new();
        layer.add_vertex(vertex);
        layer
    }

    /// The first vertex ever inserted into this layer.
    pub fn entry_point(&self) -> Option<VertexId> {
        self.nodes.first().copied()
    }

    pub fn add_vertex(&mut self, vertex: VertexId) {
        debug_assert!(!self.adjacency.contains_key(&vertex));
        self.nodes.push(vertex);
        self.adjacency.entry(vertex).or_default();
    }

    /// Insert an undirected edge. Duplicate edges are ignored.
    pub fn connect(&mut self, a: VertexId, b: VertexId) {
        let forward = self.adjacency.entry(a).or_default();
        if !forward.contains(&b) {
            forward.push(b);
        }
        let backward = self.adjacency.entry(b).or_default();
        if !backward.contains(&a) {
            backward.push(a);
        }
    }

    pub fn neighbors(&self, vertex: VertexId) -> &[VertexId] {
        self.adjacency.get(&vertex).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace `vertex`'s adjacency with `keep`, removing the back-edges of
    /// everything dropped so the graph stays symmetric.
    pub fn shrink(&mut self, vertex: VertexId, keep: Vec<VertexId>) {
        let old = self.adjacency.insert(vertex, keep.clone()).unwrap_or_default();
        for dropped in old {
            if !keep.contains(&dropped) {
                if let Some(back) = self.adjacency.get_mut(&dropped) {
                    back.retain(|&v| v != vertex);
                }
            }
        }
    }

    #[cfg(test)]
    pub fn contains(&self, vertex: VertexId) -> bool {
        self.adjacency.contains_key(&vertex)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[cfg(test)]
    pub fn vertex_ids(&self) -> &[VertexId] {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_is_undirected_and_deduplicated() {
        let mut layer = Layer::new();
        layer.add_vertex(0);
        layer.add_vertex(1);

        layer.connect(0, 1);
        layer.connect(0, 1);

        assert_eq!(layer.neighbors(0), &[1]);
        assert_eq!(layer.neighbors(1), &[0]);
    }

    #[test]
    fn shrink_removes_back_edges() {
        let mut layer = Layer::new();
        for v in 0..4 {
            layer.add_vertex(v);
        }
        layer.connect(0, 1);
        layer.connect(0, 2);
        layer.connect(0, 3);

        layer.shrink(0, vec![1, 2]);

        assert_eq!(layer.neighbors(0), &[1, 2]);
        assert!(layer.neighbors(3).is_empty());
        assert!(layer.neighbors(1).contains(&0));
    }

    #[test]
    fn entry_point_is_first_inserted() {
        let mut layer = Layer::new();
        assert_eq!(layer.entry_point(), None);
        layer.add_vertex(7);
        layer.add_vertex(3);
        assert_eq!(layer.entry_point(), Some(7));
    }
}
