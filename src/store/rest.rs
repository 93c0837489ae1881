//! PostgREST/Supabase-compatible HTTP backend.
//!
//! Inserts go through an RPC function so the server can convert the GeoJSON
//! into its geometry column; listing asks the server to render that column
//! back to GeoJSON text alongside the raw JSON column. Listings are decoded
//! row by row so one malformed row does not hide the rest.

use bevy::log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::{GeometryStore, PathlineRecord, RefugeId, RefugeQuery, RefugeRecord, StoreError};
use crate::config::StoreSettings;
use crate::geo::PolygonGeometry;

/// Columns requested when listing refuges
const SELECT_COLUMNS: &str = "id,name,geom_geojson:ST_AsGeoJSON(geom),geom_json";

/// Columns requested when listing pathlines
const PATHLINE_COLUMNS: &str = "id,name,geom_geojson:ST_AsGeoJSON(geom)";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// RPC payload for the insert function
#[derive(Serialize)]
struct InsertArgs<'a> {
    name_in: Option<&'a str>,
    geojson_in: &'a PolygonGeometry,
}

pub struct RestGeometryStore {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
    table: String,
    pathlines_table: String,
    insert_function: String,
}

impl RestGeometryStore {
    /// Returns `None` if the url or key is missing.
    pub fn from_settings(settings: &StoreSettings) -> Option<Self> {
        let url = settings.url.as_deref().filter(|u| !u.is_empty())?;
        let key = settings.api_key.as_deref().filter(|k| !k.is_empty())?;
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Some(Self {
            agent,
            base_url: url.trim_end_matches('/').to_string(),
            api_key: key.to_string(),
            table: settings.table.clone(),
            pathlines_table: settings.pathlines_table.clone(),
            insert_function: settings.insert_function.clone(),
        })
    }

    fn rpc_url(&self) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, self.insert_function)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// GET a listing as loose JSON rows
    fn select(
        &self,
        table: &str,
        columns: &str,
        query: &RefugeQuery,
    ) -> Result<Vec<serde_json::Value>, StoreError> {
        let response = self
            .authorize(self.agent.get(&self.table_url(table)))
            .query("select", columns)
            .query("limit", &query.limit.to_string())
            .call()
            .map_err(map_ureq_error)?;

        response
            .into_json::<Vec<serde_json::Value>>()
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        request
            .set("apikey", &self.api_key)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("User-Agent", "refugemap")
    }
}

/// Typed rows from a listing; rows that do not match are logged and dropped
fn rows_into<T: DeserializeOwned>(rows: Vec<serde_json::Value>, table: &str) -> Vec<T> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(i, row)| match serde_json::from_value(row) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping row {} of {}: {}", i, table, e);
                None
            }
        })
        .collect()
}

fn map_ureq_error(err: ureq::Error) -> StoreError {
    match err {
        ureq::Error::Status(code, response) => StoreError::Status {
            code,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => StoreError::Transport(transport.to_string()),
    }
}

impl GeometryStore for RestGeometryStore {
    fn insert(
        &self,
        geometry: &PolygonGeometry,
        name: Option<&str>,
    ) -> Result<RefugeId, StoreError> {
        let args = InsertArgs {
            name_in: name,
            geojson_in: geometry,
        };
        let body = serde_json::to_value(&args).map_err(|e| StoreError::Decode(e.to_string()))?;

        let response = self
            .authorize(self.agent.post(&self.rpc_url()))
            .send_json(body)
            .map_err(map_ureq_error)?;

        response
            .into_json::<RefugeId>()
            .map_err(|e| StoreError::Decode(format!("insert returned no id: {}", e)))
    }

    fn query(&self, query: &RefugeQuery) -> Result<Vec<RefugeRecord>, StoreError> {
        let rows = self.select(&self.table, SELECT_COLUMNS, query)?;
        Ok(rows_into(rows, &self.table))
    }

    fn query_pathlines(&self, query: &RefugeQuery) -> Result<Vec<PathlineRecord>, StoreError> {
        let rows = self.select(&self.pathlines_table, PATHLINE_COLUMNS, query)?;
        Ok(rows_into(rows, &self.pathlines_table))
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.base_url, self.table)
    }
}
