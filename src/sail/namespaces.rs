//! Namespace prefix table
//!
//! Prefixes live as properties on a single reference vertex, one property
//! per prefix mapping to the namespace IRI string. The vertex is identified
//! by its reserved `value` property and is created at store open.

use crate::error::SailResult;
use crate::graph::{IndexableGraph, PropertyValue};
use crate::sail::store::{StoreContext, VALUE};
use tracing::warn;

impl<G: IndexableGraph> StoreContext<G> {
    pub(crate) fn set_namespace(&self, prefix: &str, name: &str) -> SailResult<()> {
        self.graph
            .set_vertex_property(self.namespaces, prefix, name.into())?;
        Ok(())
    }

    pub(crate) fn get_namespace(&self, prefix: &str) -> Option<String> {
        self.graph
            .vertex_property(self.namespaces, prefix)
            .and_then(|v| v.as_string().map(str::to_string))
    }

    pub(crate) fn remove_namespace(&self, prefix: &str) -> SailResult<()> {
        if let Err(error) = self.graph.remove_vertex_property(self.namespaces, prefix) {
            warn!(prefix, %error, "failed to remove namespace");
        }
        Ok(())
    }

    /// Enumerate all prefix/namespace pairs, skipping the reserved id
    /// property
    pub(crate) fn get_namespaces(&self) -> SailResult<Vec<(String, String)>> {
        let keys = self.graph.vertex_property_keys(self.namespaces)?;
        let mut namespaces = Vec::with_capacity(keys.len());
        for key in keys {
            if key == VALUE {
                continue;
            }
            if let Some(PropertyValue::String(name)) =
                self.graph.vertex_property(self.namespaces, &key)
            {
                namespaces.push((key, name));
            }
        }
        namespaces.sort();
        Ok(namespaces)
    }

    pub(crate) fn clear_namespaces(&self) -> SailResult<()> {
        let keys = self.graph.vertex_property_keys(self.namespaces)?;
        for key in keys {
            if key == VALUE {
                continue;
            }
            if let Err(error) = self.graph.remove_vertex_property(self.namespaces, &key) {
                warn!(prefix = %key, %error, "failed to remove namespace");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::MemoryGraph;
    use crate::sail::SailStore;

    #[test]
    fn test_namespace_round_trip() {
        let store = SailStore::open(MemoryGraph::new()).unwrap();
        let mut conn = store.connection();

        conn.set_namespace("ex", "http://example.org/").unwrap();
        conn.set_namespace("foaf", "http://xmlns.com/foaf/0.1/")
            .unwrap();

        assert_eq!(
            conn.get_namespace("ex").as_deref(),
            Some("http://example.org/")
        );
        assert_eq!(conn.get_namespace("missing"), None);

        let all = conn.get_namespaces().unwrap();
        assert_eq!(
            all,
            vec![
                ("ex".to_string(), "http://example.org/".to_string()),
                ("foaf".to_string(), "http://xmlns.com/foaf/0.1/".to_string()),
            ]
        );
    }

    #[test]
    fn test_namespace_overwrite_and_remove() {
        let store = SailStore::open(MemoryGraph::new()).unwrap();
        let mut conn = store.connection();

        conn.set_namespace("ex", "http://example.org/a#").unwrap();
        conn.set_namespace("ex", "http://example.org/b#").unwrap();
        assert_eq!(
            conn.get_namespace("ex").as_deref(),
            Some("http://example.org/b#")
        );

        conn.remove_namespace("ex").unwrap();
        assert_eq!(conn.get_namespace("ex"), None);
        // Removing a prefix that is not set is not an error.
        conn.remove_namespace("ex").unwrap();
    }

    #[test]
    fn test_clear_namespaces() {
        let store = SailStore::open(MemoryGraph::new()).unwrap();
        let mut conn = store.connection();

        conn.set_namespace("a", "urn:a").unwrap();
        conn.set_namespace("b", "urn:b").unwrap();
        conn.clear_namespaces().unwrap();
        assert!(conn.get_namespaces().unwrap().is_empty());

        // The reference vertex survives a clear.
        let another = store.connection();
        drop(another);
        conn.set_namespace("c", "urn:c").unwrap();
        assert_eq!(conn.get_namespaces().unwrap().len(), 1);
    }
}
