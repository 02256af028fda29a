//! Trace domain types decoded from API payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

/// A trace as returned by `GET /traces/{id}`: a GeoJSON feature.
///
/// Both members may be absent; the page shows placeholders for them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TraceFeature {
    #[serde(default)]
    pub properties: TraceProperties,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceProperties {
    #[serde(default, deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Length in meters
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default, deserialize_with = "optional_id_string")]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub owner_display_name: Option<String>,
    #[serde(default)]
    pub recorded_at: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Partial update body for `PATCH /traces/{id}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TracePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TracePatch {
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
        }
    }
}

/// `[lon, lat]` or `[lon, lat, ele]`
pub type Position = Vec<f64>;

/// The GeoJSON geometries a trace can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
}

/// `[west, south, east, north]` extent of a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    fn around(lon: f64, lat: f64) -> Self {
        Self {
            min_lon: lon,
            min_lat: lat,
            max_lon: lon,
            max_lat: lat,
        }
    }

    fn extend(mut self, lon: f64, lat: f64) -> Self {
        self.min_lon = self.min_lon.min(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lon = self.max_lon.max(lon);
        self.max_lat = self.max_lat.max(lat);
        self
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }
}

impl Geometry {
    pub fn positions(&self) -> Vec<&Position> {
        match self {
            Geometry::Point(p) => vec![p],
            Geometry::LineString(line) => line.iter().collect(),
            Geometry::MultiLineString(lines) => lines.iter().flatten().collect(),
        }
    }

    /// Extent over every position. `None` when there is no usable position.
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.positions()
            .into_iter()
            .filter_map(|p| lon_lat(p))
            .fold(None, |acc, (lon, lat)| match acc {
                None => Some(BoundingBox::around(lon, lat)),
                Some(bbox) => Some(bbox.extend(lon, lat)),
            })
    }

    /// First position as `"lat, lon"`.
    pub fn start_coordinate(&self) -> Option<String> {
        self.positions()
            .into_iter()
            .find_map(|p| lon_lat(p))
            .map(|(lon, lat)| format!("{lat:.5}, {lon:.5}"))
    }

    /// The geometry wrapped as a property-less GeoJSON feature.
    pub fn to_feature(&self) -> Value {
        json!({
            "type": "Feature",
            "properties": {},
            "geometry": self,
        })
    }
}

fn lon_lat(position: &Position) -> Option<(f64, f64)> {
    match position.as_slice() {
        [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Some((*lon, *lat)),
        _ => None,
    }
}

/// The logged-in user as returned by the session endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    #[serde(default, deserialize_with = "optional_id_string")]
    pub osm_id: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl AuthenticatedUser {
    /// Owners and administrators may edit or delete.
    pub fn can_modify(&self, owner_id: Option<&str>) -> bool {
        if self.is_admin {
            return true;
        }
        match (self.osm_id.as_deref(), owner_id) {
            (Some(user), Some(owner)) => user == owner,
            _ => false,
        }
    }
}

/// Long form of an RFC 3339 timestamp, e.g.
/// `"Tuesday, March 5, 2019 at 14:02 UTC"`.
///
/// Input that does not parse is returned as-is.
pub fn format_date_time_extended(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(parsed) => parsed
            .with_timezone(&Utc)
            .format("%A, %B %-d, %Y at %H:%M UTC")
            .to_string(),
        Err(_) => timestamp.to_string(),
    }
}

/// OSM ids arrive as numbers or strings depending on the endpoint.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn optional_id_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature() -> Value {
        json!({
            "type": "Feature",
            "properties": {
                "id": 12,
                "description": "Morning ride",
                "length": 5230.5,
                "ownerId": 100,
                "ownerDisplayName": "mapper",
                "recordedAt": "2019-03-05T14:02:00.000Z",
                "uploadedAt": "2019-03-06T09:00:00Z",
                "updatedAt": "2019-03-06T09:00:00Z"
            },
            "geometry": {
                "type": "LineString",
                "coordinates": [[-77.02, 38.91], [-77.05, 38.89], [-77.01, 38.95]]
            }
        })
    }

    #[test]
    fn decodes_feature_with_numeric_ids() {
        let trace: TraceFeature = serde_json::from_value(feature()).unwrap();
        assert_eq!(trace.properties.id, "12");
        assert_eq!(trace.properties.owner_id.as_deref(), Some("100"));
        assert_eq!(trace.properties.description.as_deref(), Some("Morning ride"));
        assert!(matches!(trace.geometry, Some(Geometry::LineString(ref l)) if l.len() == 3));
    }

    #[test]
    fn bare_record_decodes_with_placeholders() {
        let trace: TraceFeature = serde_json::from_value(json!({
            "id": 1,
            "geometry": { "type": "Point", "coordinates": [1, 2] }
        }))
        .unwrap();
        assert_eq!(trace.properties, TraceProperties::default());
        assert_eq!(trace.geometry, Some(Geometry::Point(vec![1.0, 2.0])));

        let empty: TraceFeature = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty, TraceFeature::default());
    }

    #[test]
    fn bbox_spans_all_positions() {
        let trace: TraceFeature = serde_json::from_value(feature()).unwrap();
        let bbox = trace.geometry.unwrap().bbox().unwrap();
        assert_eq!(bbox.as_array(), [-77.05, 38.89, -77.01, 38.95]);
    }

    #[test]
    fn point_bbox_is_degenerate() {
        let point = Geometry::Point(vec![1.0, 2.0]);
        assert_eq!(point.bbox().unwrap().as_array(), [1.0, 2.0, 1.0, 2.0]);
    }

    #[test]
    fn empty_geometry_has_no_bbox() {
        assert!(Geometry::LineString(vec![]).bbox().is_none());
        assert!(Geometry::Point(vec![1.0]).bbox().is_none());
        assert!(Geometry::MultiLineString(vec![vec![]]).start_coordinate().is_none());
    }

    #[test]
    fn start_coordinate_is_lat_lon() {
        let line = Geometry::MultiLineString(vec![vec![vec![-77.0234, 38.9123, 12.0]]]);
        assert_eq!(line.start_coordinate().as_deref(), Some("38.91230, -77.02340"));
    }

    #[test]
    fn geometry_round_trips_as_geojson() {
        let point = Geometry::Point(vec![1.0, 2.0]);
        assert_eq!(
            point.to_feature(),
            json!({
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [1.0, 2.0] }
            })
        );
    }

    #[test]
    fn ownership_check() {
        let owner = AuthenticatedUser {
            osm_id: Some("100".into()),
            is_admin: false,
        };
        assert!(owner.can_modify(Some("100")));
        assert!(!owner.can_modify(Some("101")));
        assert!(!owner.can_modify(None));

        let admin = AuthenticatedUser {
            osm_id: None,
            is_admin: true,
        };
        assert!(admin.can_modify(Some("101")));

        let anonymous = AuthenticatedUser::default();
        assert!(!anonymous.can_modify(None));
    }

    #[test]
    fn anonymous_user_decodes_from_empty_object() {
        let user: AuthenticatedUser = serde_json::from_value(json!({})).unwrap();
        assert_eq!(user, AuthenticatedUser::default());
    }

    #[test]
    fn formats_timestamps() {
        assert_eq!(
            format_date_time_extended("2019-03-05T14:02:00.000Z"),
            "Tuesday, March 5, 2019 at 14:02 UTC"
        );
        assert_eq!(format_date_time_extended("yesterday"), "yesterday");
    }
}
