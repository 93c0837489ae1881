//! In-memory store for tests, with failure injection.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{GeometryStore, PathlineRecord, RefugeId, RefugeQuery, RefugeRecord, StoreError};
use crate::geo::PolygonGeometry;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<RefugeRecord>>,
    pathlines: Mutex<Vec<PathlineRecord>>,
    pub fail_inserts: AtomicBool,
    pub fail_queries: AtomicBool,
    pub query_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn with_records(records: Vec<RefugeRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn with_pathlines(self, pathlines: Vec<PathlineRecord>) -> Self {
        Self {
            pathlines: Mutex::new(pathlines),
            ..self
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn records(&self) -> Vec<RefugeRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl GeometryStore for MemoryStore {
    fn insert(
        &self,
        geometry: &PolygonGeometry,
        name: Option<&str>,
    ) -> Result<RefugeId, StoreError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("connection refused".to_string()));
        }

        let mut records = self.records.lock().unwrap();
        let id = RefugeId::Serial(records.len() as i64 + 1);
        records.push(RefugeRecord {
            id: id.clone(),
            name: name.map(str::to_string),
            geom_geojson: None,
            geom_json: Some(serde_json::to_value(geometry).unwrap()),
        });
        Ok(id)
    }

    fn query(&self, query: &RefugeQuery) -> Result<Vec<RefugeRecord>, StoreError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                code: 503,
                body: "unavailable".to_string(),
            });
        }

        let records = self.records.lock().unwrap();
        Ok(records.iter().take(query.limit).cloned().collect())
    }

    fn query_pathlines(&self, query: &RefugeQuery) -> Result<Vec<PathlineRecord>, StoreError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                code: 503,
                body: "unavailable".to_string(),
            });
        }

        let pathlines = self.pathlines.lock().unwrap();
        Ok(pathlines.iter().take(query.limit).cloned().collect())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
