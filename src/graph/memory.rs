//! In-memory reference implementation of the indexable graph contract
//!
//! Uses hash maps for O(1) element lookup plus adjacency lists per vertex.
//! Automatic indexes are maintained inline on every property write. Manual
//! transactions are snapshot-based: `begin` clones the graph state, `commit`
//! discards the snapshot, `rollback` restores it. Index and adjacency
//! lookups copy the matching ids out under the lock, so no lock is held
//! while a result sequence is consumed.

use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, VertexId};
use super::{ElementKind, GraphError, GraphResult, IndexInfo, IndexableGraph, TransactionMode};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

#[derive(Debug, Clone, Default)]
struct VertexData {
    properties: PropertyMap,
}

#[derive(Debug, Clone)]
struct EdgeData {
    label: String,
    source: VertexId,
    target: VertexId,
    properties: PropertyMap,
}

#[derive(Debug, Clone)]
struct IndexData {
    kind: ElementKind,
    /// Covered property keys; `None` covers every key
    keys: Option<HashSet<String>>,
    entries: HashMap<(String, PropertyValue), HashSet<u64>>,
}

impl IndexData {
    fn covers(&self, kind: ElementKind, key: &str) -> bool {
        self.kind == kind
            && match &self.keys {
                Some(keys) => keys.contains(key),
                None => true,
            }
    }

    fn insert(&mut self, key: &str, value: &PropertyValue, id: u64) {
        self.entries
            .entry((key.to_string(), value.clone()))
            .or_default()
            .insert(id);
    }

    fn remove(&mut self, key: &str, value: &PropertyValue, id: u64) {
        let entry_key = (key.to_string(), value.clone());
        if let Some(ids) = self.entries.get_mut(&entry_key) {
            ids.remove(&id);
            if ids.is_empty() {
                self.entries.remove(&entry_key);
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct GraphData {
    vertices: HashMap<VertexId, VertexData>,
    edges: HashMap<EdgeId, EdgeData>,
    outgoing: HashMap<VertexId, Vec<EdgeId>>,
    incoming: HashMap<VertexId, Vec<EdgeId>>,
    indices: HashMap<String, IndexData>,
    next_vertex_id: u64,
    next_edge_id: u64,
}

impl GraphData {
    fn reindex(&mut self, kind: ElementKind, id: u64, key: &str, old: Option<&PropertyValue>, new: Option<&PropertyValue>) {
        for index in self.indices.values_mut() {
            if !index.covers(kind, key) {
                continue;
            }
            if let Some(old) = old {
                index.remove(key, old, id);
            }
            if let Some(new) = new {
                index.insert(key, new, id);
            }
        }
    }

    fn deindex_all(&mut self, kind: ElementKind, id: u64, properties: &PropertyMap) {
        for (key, value) in properties {
            for index in self.indices.values_mut() {
                if index.covers(kind, key) {
                    index.remove(key, value, id);
                }
            }
        }
    }

    fn remove_edge_inner(&mut self, edge: EdgeId) -> GraphResult<()> {
        let data = self
            .edges
            .remove(&edge)
            .ok_or(GraphError::EdgeNotFound(edge))?;
        if let Some(out) = self.outgoing.get_mut(&data.source) {
            out.retain(|e| *e != edge);
        }
        if let Some(inc) = self.incoming.get_mut(&data.target) {
            inc.retain(|e| *e != edge);
        }
        self.deindex_all(ElementKind::Edge, edge.as_u64(), &data.properties);
        Ok(())
    }
}

/// In-memory indexable graph
///
/// `MemoryGraph::new` builds a non-transactional graph; mutations are
/// immediately visible and a mutation stamp supports best-effort detection
/// of concurrent modification. `MemoryGraph::transactional` builds a graph
/// in manual transaction mode.
#[derive(Debug)]
pub struct MemoryGraph {
    data: RwLock<GraphData>,
    snapshot: Mutex<Option<GraphData>>,
    mode: TransactionMode,
    stamp: AtomicU64,
}

impl MemoryGraph {
    /// Create a non-transactional in-memory graph
    pub fn new() -> Self {
        Self::with_mode(TransactionMode::None)
    }

    /// Create an in-memory graph in manual transaction mode
    pub fn transactional() -> Self {
        Self::with_mode(TransactionMode::Manual)
    }

    fn with_mode(mode: TransactionMode) -> Self {
        MemoryGraph {
            data: RwLock::new(GraphData::default()),
            snapshot: Mutex::new(None),
            mode,
            stamp: AtomicU64::new(0),
        }
    }

    /// Number of vertices currently stored
    pub fn vertex_count(&self) -> usize {
        self.read().vertices.len()
    }

    /// Number of edges currently stored
    pub fn edge_count(&self) -> usize {
        self.read().edges.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, GraphData> {
        self.data.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, GraphData> {
        self.stamp.fetch_add(1, Ordering::Relaxed);
        self.data.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexableGraph for MemoryGraph {
    fn add_vertex(&self) -> VertexId {
        let mut data = self.write();
        data.next_vertex_id += 1;
        let id = VertexId::new(data.next_vertex_id);
        data.vertices.insert(id, VertexData::default());
        data.outgoing.insert(id, Vec::new());
        data.incoming.insert(id, Vec::new());
        id
    }

    fn add_edge(&self, source: VertexId, label: &str, target: VertexId) -> GraphResult<EdgeId> {
        let mut data = self.write();
        if !data.vertices.contains_key(&source) {
            return Err(GraphError::VertexNotFound(source));
        }
        if !data.vertices.contains_key(&target) {
            return Err(GraphError::VertexNotFound(target));
        }
        data.next_edge_id += 1;
        let id = EdgeId::new(data.next_edge_id);
        data.edges.insert(
            id,
            EdgeData {
                label: label.to_string(),
                source,
                target,
                properties: PropertyMap::new(),
            },
        );
        data.outgoing.entry(source).or_default().push(id);
        data.incoming.entry(target).or_default().push(id);
        Ok(id)
    }

    fn remove_vertex(&self, vertex: VertexId) -> GraphResult<()> {
        let mut data = self.write();
        let vertex_data = data
            .vertices
            .remove(&vertex)
            .ok_or(GraphError::VertexNotFound(vertex))?;

        let mut incident: Vec<EdgeId> = Vec::new();
        incident.extend(data.outgoing.remove(&vertex).unwrap_or_default());
        incident.extend(data.incoming.remove(&vertex).unwrap_or_default());
        for edge in incident {
            // A self-loop appears in both lists; the second removal is a miss.
            let _ = data.remove_edge_inner(edge);
        }

        data.deindex_all(ElementKind::Vertex, vertex.as_u64(), &vertex_data.properties);
        Ok(())
    }

    fn remove_edge(&self, edge: EdgeId) -> GraphResult<()> {
        self.write().remove_edge_inner(edge)
    }

    fn vertices(&self) -> Box<dyn Iterator<Item = VertexId> + '_> {
        let ids: Vec<VertexId> = self.read().vertices.keys().copied().collect();
        Box::new(ids.into_iter())
    }

    fn edges(&self) -> Box<dyn Iterator<Item = EdgeId> + '_> {
        let ids: Vec<EdgeId> = self.read().edges.keys().copied().collect();
        Box::new(ids.into_iter())
    }

    fn edge_ends(&self, edge: EdgeId) -> GraphResult<(VertexId, VertexId)> {
        self.read()
            .edges
            .get(&edge)
            .map(|e| (e.source, e.target))
            .ok_or(GraphError::EdgeNotFound(edge))
    }

    fn edge_label(&self, edge: EdgeId) -> GraphResult<String> {
        self.read()
            .edges
            .get(&edge)
            .map(|e| e.label.clone())
            .ok_or(GraphError::EdgeNotFound(edge))
    }

    fn out_edges(&self, vertex: VertexId) -> Box<dyn Iterator<Item = EdgeId> + '_> {
        let ids = self.read().outgoing.get(&vertex).cloned().unwrap_or_default();
        Box::new(ids.into_iter())
    }

    fn in_edges(&self, vertex: VertexId) -> Box<dyn Iterator<Item = EdgeId> + '_> {
        let ids = self.read().incoming.get(&vertex).cloned().unwrap_or_default();
        Box::new(ids.into_iter())
    }

    fn vertex_property(&self, vertex: VertexId, key: &str) -> Option<PropertyValue> {
        self.read()
            .vertices
            .get(&vertex)
            .and_then(|v| v.properties.get(key).cloned())
    }

    fn set_vertex_property(
        &self,
        vertex: VertexId,
        key: &str,
        value: PropertyValue,
    ) -> GraphResult<()> {
        let mut data = self.write();
        let old = {
            let vertex_data = data
                .vertices
                .get_mut(&vertex)
                .ok_or(GraphError::VertexNotFound(vertex))?;
            vertex_data.properties.insert(key.to_string(), value.clone())
        };
        data.reindex(
            ElementKind::Vertex,
            vertex.as_u64(),
            key,
            old.as_ref(),
            Some(&value),
        );
        Ok(())
    }

    fn remove_vertex_property(
        &self,
        vertex: VertexId,
        key: &str,
    ) -> GraphResult<Option<PropertyValue>> {
        let mut data = self.write();
        let old = {
            let vertex_data = data
                .vertices
                .get_mut(&vertex)
                .ok_or(GraphError::VertexNotFound(vertex))?;
            vertex_data.properties.remove(key)
        };
        data.reindex(ElementKind::Vertex, vertex.as_u64(), key, old.as_ref(), None);
        Ok(old)
    }

    fn vertex_property_keys(&self, vertex: VertexId) -> GraphResult<Vec<String>> {
        self.read()
            .vertices
            .get(&vertex)
            .map(|v| v.properties.keys().cloned().collect())
            .ok_or(GraphError::VertexNotFound(vertex))
    }

    fn edge_property(&self, edge: EdgeId, key: &str) -> Option<PropertyValue> {
        self.read()
            .edges
            .get(&edge)
            .and_then(|e| e.properties.get(key).cloned())
    }

    fn set_edge_property(&self, edge: EdgeId, key: &str, value: PropertyValue) -> GraphResult<()> {
        let mut data = self.write();
        let old = {
            let edge_data = data
                .edges
                .get_mut(&edge)
                .ok_or(GraphError::EdgeNotFound(edge))?;
            edge_data.properties.insert(key.to_string(), value.clone())
        };
        data.reindex(ElementKind::Edge, edge.as_u64(), key, old.as_ref(), Some(&value));
        Ok(())
    }

    fn remove_edge_property(
        &self,
        edge: EdgeId,
        key: &str,
    ) -> GraphResult<Option<PropertyValue>> {
        let mut data = self.write();
        let old = {
            let edge_data = data
                .edges
                .get_mut(&edge)
                .ok_or(GraphError::EdgeNotFound(edge))?;
            edge_data.properties.remove(key)
        };
        data.reindex(ElementKind::Edge, edge.as_u64(), key, old.as_ref(), None);
        Ok(old)
    }

    fn edge_property_keys(&self, edge: EdgeId) -> GraphResult<Vec<String>> {
        self.read()
            .edges
            .get(&edge)
            .map(|e| e.properties.keys().cloned().collect())
            .ok_or(GraphError::EdgeNotFound(edge))
    }

    fn get_index(&self, name: &str) -> Option<IndexInfo> {
        self.read().indices.get(name).map(|index| IndexInfo {
            name: name.to_string(),
            kind: index.kind,
            keys: index.keys.clone(),
        })
    }

    fn create_automatic_index(
        &self,
        name: &str,
        kind: ElementKind,
        keys: Option<HashSet<String>>,
    ) -> GraphResult<()> {
        let mut data = self.write();
        if data.indices.contains_key(name) {
            return Err(GraphError::IndexExists(name.to_string()));
        }
        let mut index = IndexData {
            kind,
            keys,
            entries: HashMap::new(),
        };
        // Backfill from existing elements so late index creation still sees
        // everything.
        match kind {
            ElementKind::Vertex => {
                for (id, vertex) in &data.vertices {
                    for (key, value) in &vertex.properties {
                        if index.covers(kind, key) {
                            index.insert(key, value, id.as_u64());
                        }
                    }
                }
            }
            ElementKind::Edge => {
                for (id, edge) in &data.edges {
                    for (key, value) in &edge.properties {
                        if index.covers(kind, key) {
                            index.insert(key, value, id.as_u64());
                        }
                    }
                }
            }
        }
        data.indices.insert(name.to_string(), index);
        Ok(())
    }

    fn indices(&self) -> Vec<IndexInfo> {
        self.read()
            .indices
            .iter()
            .map(|(name, index)| IndexInfo {
                name: name.clone(),
                kind: index.kind,
                keys: index.keys.clone(),
            })
            .collect()
    }

    fn vertex_index_lookup(
        &self,
        index: &str,
        key: &str,
        value: &PropertyValue,
    ) -> GraphResult<Box<dyn Iterator<Item = VertexId> + '_>> {
        let data = self.read();
        let index_data = data
            .indices
            .get(index)
            .ok_or_else(|| GraphError::IndexNotFound(index.to_string()))?;
        if index_data.kind != ElementKind::Vertex {
            return Err(GraphError::IndexKindMismatch(
                index.to_string(),
                ElementKind::Vertex,
            ));
        }
        let mut ids: Vec<VertexId> = index_data
            .entries
            .get(&(key.to_string(), value.clone()))
            .map(|ids| ids.iter().map(|id| VertexId::new(*id)).collect())
            .unwrap_or_default();
        ids.sort();
        Ok(Box::new(ids.into_iter()))
    }

    fn edge_index_lookup(
        &self,
        index: &str,
        key: &str,
        value: &PropertyValue,
    ) -> GraphResult<Box<dyn Iterator<Item = EdgeId> + '_>> {
        let data = self.read();
        let index_data = data
            .indices
            .get(index)
            .ok_or_else(|| GraphError::IndexNotFound(index.to_string()))?;
        if index_data.kind != ElementKind::Edge {
            return Err(GraphError::IndexKindMismatch(
                index.to_string(),
                ElementKind::Edge,
            ));
        }
        let mut ids: Vec<EdgeId> = index_data
            .entries
            .get(&(key.to_string(), value.clone()))
            .map(|ids| ids.iter().map(|id| EdgeId::new(*id)).collect())
            .unwrap_or_default();
        ids.sort();
        Ok(Box::new(ids.into_iter()))
    }

    fn transaction_mode(&self) -> TransactionMode {
        self.mode
    }

    fn begin_transaction(&self) {
        if self.mode != TransactionMode::Manual {
            return;
        }
        let mut snapshot = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        if snapshot.is_none() {
            *snapshot = Some(self.read().clone());
        }
    }

    fn commit_transaction(&self) -> GraphResult<()> {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        *snapshot = None;
        Ok(())
    }

    fn rollback_transaction(&self) -> GraphResult<()> {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(restored) = snapshot.take() {
            *self.data.write().unwrap_or_else(|e| e.into_inner()) = restored;
        }
        Ok(())
    }

    fn mutation_stamp(&self) -> u64 {
        self.stamp.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_and_edge_crud() {
        let graph = MemoryGraph::new();
        let a = graph.add_vertex();
        let b = graph.add_vertex();
        let e = graph.add_edge(a, "knows", b).unwrap();

        assert_eq!(graph.vertex_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge_ends(e).unwrap(), (a, b));
        assert_eq!(graph.edge_label(e).unwrap(), "knows");

        graph.remove_edge(e).unwrap();
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.out_edges(a).next().is_none());
    }

    #[test]
    fn test_add_edge_requires_endpoints() {
        let graph = MemoryGraph::new();
        let a = graph.add_vertex();
        let missing = VertexId::new(999);
        assert_eq!(
            graph.add_edge(a, "x", missing),
            Err(GraphError::VertexNotFound(missing))
        );
    }

    #[test]
    fn test_remove_vertex_removes_incident_edges() {
        let graph = MemoryGraph::new();
        let a = graph.add_vertex();
        let b = graph.add_vertex();
        let c = graph.add_vertex();
        graph.add_edge(a, "x", b).unwrap();
        graph.add_edge(c, "y", a).unwrap();

        graph.remove_vertex(a).unwrap();
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.vertex_count(), 2);
        assert!(graph.in_edges(b).next().is_none());
    }

    #[test]
    fn test_automatic_index_reindexes_on_set() {
        let graph = MemoryGraph::new();
        let mut keys = HashSet::new();
        keys.insert("value".to_string());
        graph
            .create_automatic_index("values", ElementKind::Vertex, Some(keys))
            .unwrap();

        let v = graph.add_vertex();
        graph
            .set_vertex_property(v, "value", "one".into())
            .unwrap();

        let hits: Vec<_> = graph
            .vertex_index_lookup("values", "value", &"one".into())
            .unwrap()
            .collect();
        assert_eq!(hits, vec![v]);

        // Overwrite moves the entry
        graph
            .set_vertex_property(v, "value", "two".into())
            .unwrap();
        assert_eq!(
            graph
                .vertex_index_lookup("values", "value", &"one".into())
                .unwrap()
                .count(),
            0
        );
        assert_eq!(
            graph
                .vertex_index_lookup("values", "value", &"two".into())
                .unwrap()
                .count(),
            1
        );

        // Uncovered keys are not indexed
        graph.set_vertex_property(v, "other", "x".into()).unwrap();
        assert_eq!(
            graph
                .vertex_index_lookup("values", "other", &"x".into())
                .unwrap()
                .count(),
            0
        );
    }

    #[test]
    fn test_index_backfills_existing_elements() {
        let graph = MemoryGraph::new();
        let v = graph.add_vertex();
        graph.set_vertex_property(v, "value", "pre".into()).unwrap();

        graph
            .create_automatic_index("values", ElementKind::Vertex, None)
            .unwrap();
        assert_eq!(
            graph
                .vertex_index_lookup("values", "value", &"pre".into())
                .unwrap()
                .count(),
            1
        );
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let graph = MemoryGraph::new();
        graph
            .create_automatic_index("edges", ElementKind::Edge, None)
            .unwrap();
        assert!(matches!(
            graph.create_automatic_index("edges", ElementKind::Edge, None),
            Err(GraphError::IndexExists(_))
        ));
    }

    #[test]
    fn test_manual_transaction_rollback() {
        let graph = MemoryGraph::transactional();
        assert_eq!(graph.transaction_mode(), TransactionMode::Manual);

        let a = graph.add_vertex();
        graph.begin_transaction();
        let b = graph.add_vertex();
        graph.add_edge(a, "x", b).unwrap();
        assert_eq!(graph.vertex_count(), 2);

        graph.rollback_transaction().unwrap();
        assert_eq!(graph.vertex_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_manual_transaction_commit() {
        let graph = MemoryGraph::transactional();
        graph.begin_transaction();
        graph.add_vertex();
        graph.commit_transaction().unwrap();
        // Rollback after commit has nothing to restore
        graph.rollback_transaction().unwrap();
        assert_eq!(graph.vertex_count(), 1);
    }

    #[test]
    fn test_mutation_stamp_advances() {
        let graph = MemoryGraph::new();
        let before = graph.mutation_stamp();
        graph.add_vertex();
        assert!(graph.mutation_stamp() > before);
    }
}
