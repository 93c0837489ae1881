use bevy::prelude::*;
use std::sync::Arc;

use super::{GeometryStore, PathlineRecord, RefugeId, RefugeQuery, RefugeRecord, StoreError};
use crate::geo::{decode_for_render, PolygonGeometry, MIN_RING_VERTICES};
use crate::map::view::{MapView, OverlayLayer, OverlayStyle};
use crate::theme;

fn saved_refuge_style() -> OverlayStyle {
    OverlayStyle::stroke(theme::SAVED_REFUGE_OUTLINE)
        .with_fill(theme::SAVED_REFUGE_FILL)
}

fn pathline_style() -> OverlayStyle {
    OverlayStyle::stroke(theme::PATHLINE)
}

/// Everything one reload fetches. Pathlines are optional and fail separately.
#[derive(Debug)]
pub struct LoadedLayers {
    pub refuges: Result<Vec<RefugeRecord>, StoreError>,
    pub pathlines: Result<Vec<PathlineRecord>, StoreError>,
}

/// Saves closed refuges and renders everything the store holds.
#[derive(Resource, Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn GeometryStore>,
    query: RefugeQuery,
}

impl PersistenceGateway {
    pub fn new(store: Arc<dyn GeometryStore>, limit: usize) -> Self {
        Self {
            store,
            query: RefugeQuery { limit },
        }
    }

    pub fn describe(&self) -> String {
        self.store.describe()
    }

    /// Persist one polygon. Blocks; run it on the IO task pool.
    pub fn save(
        &self,
        geometry: &PolygonGeometry,
        name: Option<&str>,
    ) -> Result<RefugeId, StoreError> {
        self.store.insert(geometry, name)
    }

    /// Fetch up to the configured limit of saved refuges.
    pub fn fetch_all(&self) -> Result<Vec<RefugeRecord>, StoreError> {
        self.store.query(&self.query)
    }

    pub fn fetch_pathlines(&self) -> Result<Vec<PathlineRecord>, StoreError> {
        self.store.query_pathlines(&self.query)
    }

    /// Refuges and pathlines for one reload. Blocks.
    pub fn fetch_layers(&self) -> LoadedLayers {
        LoadedLayers {
            refuges: self.fetch_all(),
            pathlines: self.fetch_pathlines(),
        }
    }

    /// Replace the saved-refuge layer with `records`.
    ///
    /// Records whose geometry cannot be decoded are logged and skipped.
    /// Returns the number of polygons drawn.
    pub fn render_all(records: &[RefugeRecord], map: &mut dyn MapView) -> usize {
        map.clear_layer(OverlayLayer::SavedRefuges);

        let mut rendered = 0;
        for record in records {
            let geometry = match record.geometry() {
                Ok(geometry) => geometry,
                Err(e) => {
                    warn!("Skipping refuge {}: {}", record.id, e);
                    continue;
                }
            };

            let points = decode_for_render(&geometry);
            if points.len() < MIN_RING_VERTICES {
                warn!(
                    "Skipping refuge {}: ring has only {} distinct vertices",
                    record.id,
                    points.len()
                );
                continue;
            }

            map.add_polygon(
                OverlayLayer::SavedRefuges,
                &points,
                saved_refuge_style(),
                Some(record.display_name().to_string()),
            );
            rendered += 1;
        }

        debug!("Rendered {} of {} saved refuges", rendered, records.len());
        rendered
    }

    /// Replace the pathline layer with `records`. Lines with fewer than two
    /// points or a non-LineString geometry are skipped.
    pub fn render_pathlines(records: &[PathlineRecord], map: &mut dyn MapView) -> usize {
        map.clear_layer(OverlayLayer::Pathlines);

        let mut rendered = 0;
        for record in records {
            let points = match record.geometry() {
                Ok(line) => line.vertices(),
                Err(e) => {
                    debug!("Skipping pathline {}: {}", record.id, e);
                    continue;
                }
            };
            if points.len() < 2 {
                debug!("Skipping pathline {}: fewer than two points", record.id);
                continue;
            }

            map.add_polyline(OverlayLayer::Pathlines, &points, pathline_style());
            rendered += 1;
        }
        rendered
    }

    /// Fetch and render in one blocking call.
    ///
    /// On a failed query the layer is left untouched.
    pub fn load_all(&self, map: &mut dyn MapView) -> Result<usize, StoreError> {
        let records = self.fetch_all()?;
        Ok(Self::render_all(&records, map))
    }
}

/// Outcome of the last reload, shown in the status bar
#[derive(Resource, Debug, Default)]
pub struct SavedRefugesRendered {
    pub count: usize,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::view::OverlayShape;
    use crate::map::MapCanvas;
    use crate::store::memory::MemoryStore;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn polygon_record(id: i64, name: Option<&str>) -> RefugeRecord {
        RefugeRecord {
            id: RefugeId::Serial(id),
            name: name.map(str::to_string),
            geom_geojson: None,
            geom_json: Some(json!({
                "type": "Polygon",
                "coordinates": [[[20.0, 10.0], [21.0, 10.0], [21.0, 11.0], [20.0, 10.0]]]
            })),
        }
    }

    fn line_record(id: i64) -> RefugeRecord {
        RefugeRecord {
            id: RefugeId::Serial(id),
            name: None,
            geom_geojson: Some(
                r#"{"type":"LineString","coordinates":[[20.0,10.0],[21.0,10.0]]}"#.to_string(),
            ),
            geom_json: None,
        }
    }

    fn pathline(id: i64, geojson: &str) -> PathlineRecord {
        PathlineRecord {
            id: RefugeId::Serial(id),
            name: None,
            geom_geojson: Some(geojson.to_string()),
            geom_json: None,
        }
    }

    fn gateway(store: Arc<MemoryStore>) -> PersistenceGateway {
        PersistenceGateway::new(store, 500)
    }

    #[test]
    fn test_save_inserts_geometry_and_name() {
        let store = Arc::new(MemoryStore::default());
        let geometry = polygon_record(1, None).geometry().unwrap();

        let id = gateway(store.clone()).save(&geometry, Some("Camp")).unwrap();
        assert_eq!(id, RefugeId::Serial(1));
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].name.as_deref(), Some("Camp"));
    }

    #[test]
    fn test_save_failure_is_reported() {
        let store = Arc::new(MemoryStore::default());
        store.fail_inserts.store(true, Ordering::SeqCst);
        let geometry = polygon_record(1, None).geometry().unwrap();

        assert!(gateway(store.clone()).save(&geometry, None).is_err());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_load_all_renders_each_polygon_with_label() {
        let store = Arc::new(MemoryStore::with_records(vec![
            polygon_record(1, Some("North ridge")),
            polygon_record(2, None),
        ]));
        let mut canvas = MapCanvas::default();

        assert_eq!(gateway(store).load_all(&mut canvas).unwrap(), 2);

        let labels: Vec<_> = canvas
            .overlays()
            .filter_map(|(_, o)| match &o.shape {
                OverlayShape::Polygon { label, points } => {
                    assert_eq!(points.len(), 3);
                    label.clone()
                }
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["North ridge", "Unnamed refuge"]);
    }

    #[test]
    fn test_load_all_is_idempotent() {
        let store = Arc::new(MemoryStore::with_records(vec![
            polygon_record(1, None),
            polygon_record(2, None),
        ]));
        let gateway = gateway(store);
        let mut canvas = MapCanvas::default();

        gateway.load_all(&mut canvas).unwrap();
        gateway.load_all(&mut canvas).unwrap();
        assert_eq!(canvas.layer_len(OverlayLayer::SavedRefuges), 2);
    }

    #[test]
    fn test_invalid_records_are_skipped() {
        let store = Arc::new(MemoryStore::with_records(vec![
            polygon_record(1, None),
            line_record(2),
            polygon_record(3, None),
        ]));
        let mut canvas = MapCanvas::default();

        assert_eq!(gateway(store).load_all(&mut canvas).unwrap(), 2);
        assert_eq!(canvas.layer_len(OverlayLayer::SavedRefuges), 2);
    }

    #[test]
    fn test_failed_query_leaves_layer_untouched() {
        let store = Arc::new(MemoryStore::with_records(vec![polygon_record(1, None)]));
        let gateway = gateway(store.clone());
        let mut canvas = MapCanvas::default();
        gateway.load_all(&mut canvas).unwrap();

        store.fail_queries.store(true, Ordering::SeqCst);
        assert!(gateway.load_all(&mut canvas).is_err());
        assert_eq!(canvas.layer_len(OverlayLayer::SavedRefuges), 1);
        assert_eq!(store.query_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_render_all_leaves_drawing_layer_alone() {
        let mut canvas = MapCanvas::default();
        let center = canvas.center();
        let line = canvas.add_polyline(
            OverlayLayer::Drawing,
            &[center],
            saved_refuge_style(),
        );

        PersistenceGateway::render_all(&[polygon_record(1, None)], &mut canvas);
        assert!(canvas.overlay(line).is_some());
    }

    #[test]
    fn test_query_limit_is_passed_through() {
        let store = Arc::new(MemoryStore::with_records(vec![
            polygon_record(1, None),
            polygon_record(2, None),
            polygon_record(3, None),
        ]));
        let gateway = PersistenceGateway::new(store, 2);
        assert_eq!(gateway.fetch_all().unwrap().len(), 2);
    }

    #[test]
    fn test_render_pathlines_draws_blue_polylines() {
        let store = Arc::new(MemoryStore::default().with_pathlines(vec![
            pathline(1, r#"{"type":"LineString","coordinates":[[20.0,10.0],[21.0,10.5],[22.0,11.0]]}"#),
            pathline(2, r#"{"type":"LineString","coordinates":[[20.0,10.0]]}"#),
            pathline(3, r#"{"type":"Polygon","coordinates":[[[20.0,10.0],[21.0,10.0],[21.0,11.0],[20.0,10.0]]]}"#),
        ]));
        let records = gateway(store).fetch_pathlines().unwrap();
        let mut canvas = MapCanvas::default();

        assert_eq!(PersistenceGateway::render_pathlines(&records, &mut canvas), 1);
        assert_eq!(canvas.layer_len(OverlayLayer::Pathlines), 1);

        let (_, line) = canvas
            .overlays()
            .find(|(_, o)| o.layer == OverlayLayer::Pathlines)
            .unwrap();
        assert_eq!(line.style.stroke, theme::PATHLINE);
        match &line.shape {
            OverlayShape::Polyline(points) => assert_eq!(points.len(), 3),
            other => panic!("expected a polyline, got {:?}", other),
        }
    }

    #[test]
    fn test_pathlines_and_refuges_clear_separately() {
        let mut canvas = MapCanvas::default();
        let line = pathline(1, r#"{"type":"LineString","coordinates":[[20.0,10.0],[21.0,10.5]]}"#);

        PersistenceGateway::render_pathlines(&[line.clone()], &mut canvas);
        PersistenceGateway::render_all(&[polygon_record(1, None)], &mut canvas);
        PersistenceGateway::render_pathlines(&[line], &mut canvas);

        assert_eq!(canvas.layer_len(OverlayLayer::Pathlines), 1);
        assert_eq!(canvas.layer_len(OverlayLayer::SavedRefuges), 1);
    }

    #[test]
    fn test_fetch_layers_reports_each_layer() {
        let store = Arc::new(MemoryStore::with_records(vec![polygon_record(1, None)]));
        let layers = gateway(store.clone()).fetch_layers();
        assert_eq!(layers.refuges.unwrap().len(), 1);
        assert!(layers.pathlines.unwrap().is_empty());

        store.fail_queries.store(true, Ordering::SeqCst);
        let layers = gateway(store).fetch_layers();
        assert!(layers.refuges.is_err());
        assert!(layers.pathlines.is_err());
    }
}
