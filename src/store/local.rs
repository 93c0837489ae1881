//! JSON file backend used when no server is configured.
//!
//! The whole file is rewritten on every insert; the record list is small and
//! the write happens on the IO task pool. Pathlines are read from the same
//! file and are never written by the app.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

use super::{GeometryStore, PathlineRecord, RefugeId, RefugeQuery, RefugeRecord, StoreError};
use crate::geo::PolygonGeometry;

/// On-disk layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct LocalRefugeFile {
    #[serde(default)]
    next_id: i64,
    #[serde(default)]
    refuges: Vec<RefugeRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pathlines: Vec<PathlineRecord>,
}

pub struct LocalGeometryStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles across IO tasks
    lock: Mutex<()>,
}

impl LocalGeometryStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    fn read_file(&self) -> Result<LocalRefugeFile, StoreError> {
        if !self.path.exists() {
            return Ok(LocalRefugeFile::default());
        }
        let json = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&json).map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn write_file(&self, file: &LocalRefugeFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(file).map_err(|e| StoreError::Decode(e.to_string()))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl GeometryStore for LocalGeometryStore {
    fn insert(
        &self,
        geometry: &PolygonGeometry,
        name: Option<&str>,
    ) -> Result<RefugeId, StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Transport("local store lock poisoned".to_string()))?;

        let mut file = self.read_file()?;
        file.next_id += 1;
        let id = RefugeId::Serial(file.next_id);

        let geom_json =
            serde_json::to_value(geometry).map_err(|e| StoreError::Decode(e.to_string()))?;
        file.refuges.push(RefugeRecord {
            id: id.clone(),
            name: name.map(str::to_string),
            geom_geojson: None,
            geom_json: Some(geom_json),
        });

        self.write_file(&file)?;
        Ok(id)
    }

    fn query(&self, query: &RefugeQuery) -> Result<Vec<RefugeRecord>, StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Transport("local store lock poisoned".to_string()))?;

        let file = self.read_file()?;
        Ok(file.refuges.into_iter().take(query.limit).collect())
    }

    fn query_pathlines(&self, query: &RefugeQuery) -> Result<Vec<PathlineRecord>, StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Transport("local store lock poisoned".to_string()))?;

        let file = self.read_file()?;
        Ok(file.pathlines.into_iter().take(query.limit).collect())
    }

    fn describe(&self) -> String {
        format!("local file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{encode_closed_polygon, Vertex};

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("refugemap-test-{}", std::process::id()));
        dir.join(name)
    }

    fn triangle() -> PolygonGeometry {
        encode_closed_polygon(&[
            Vertex::new(10.0, 20.0),
            Vertex::new(10.0, 21.0),
            Vertex::new(11.0, 21.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_query_missing_file_is_empty() {
        let store = LocalGeometryStore::new(temp_path("missing.json"));
        assert!(store.query(&RefugeQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn test_insert_then_query() {
        let path = temp_path("insert.json");
        let _ = std::fs::remove_file(&path);
        let store = LocalGeometryStore::new(path.clone());

        let first = store.insert(&triangle(), Some("Camp")).unwrap();
        let second = store.insert(&triangle(), None).unwrap();
        assert_eq!(first, RefugeId::Serial(1));
        assert_eq!(second, RefugeId::Serial(2));

        let records = store.query(&RefugeQuery::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name.as_deref(), Some("Camp"));
        assert_eq!(records[0].geometry().unwrap(), triangle());

        let limited = store.query(&RefugeQuery { limit: 1 }).unwrap();
        assert_eq!(limited.len(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_pathlines_survive_inserts() {
        let path = temp_path("pathlines.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{
                "next_id": 0,
                "refuges": [],
                "pathlines": [{
                    "id": 1,
                    "name": "Ridge trail",
                    "geom_json": {"type": "LineString", "coordinates": [[20.0, 10.0], [21.0, 10.5]]}
                }]
            }"#,
        )
        .unwrap();

        let store = LocalGeometryStore::new(path.clone());
        store.insert(&triangle(), None).unwrap();

        let pathlines = store.query_pathlines(&RefugeQuery::default()).unwrap();
        assert_eq!(pathlines.len(), 1);
        assert_eq!(pathlines[0].name.as_deref(), Some("Ridge trail"));
        assert!(pathlines[0].geometry().is_ok());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_pathlines_are_empty() {
        let store = LocalGeometryStore::new(temp_path("no-pathlines.json"));
        assert!(store.query_pathlines(&RefugeQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_decode_error() {
        let path = temp_path("corrupt.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ nope").unwrap();

        let store = LocalGeometryStore::new(path.clone());
        assert!(matches!(
            store.query(&RefugeQuery::default()),
            Err(StoreError::Decode(_))
        ));

        let _ = std::fs::remove_file(&path);
    }
}
