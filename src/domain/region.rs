// Region of interest domain model
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("no geometry drawn; draw a polygon or place a marker")]
    Missing,

    #[error("unsupported geometry type '{0}'; draw a polygon or place a marker")]
    Unsupported(String),

    #[error("malformed geometry: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    fn from_position(position: &[f64]) -> Result<Self, GeometryError> {
        let (lon, lat) = match position {
            [lon, lat, ..] => (*lon, *lat),
            _ => {
                return Err(GeometryError::Malformed(format!(
                    "position needs two ordinates, got {}",
                    position.len()
                )))
            }
        };

        if !lon.is_finite() || !lat.is_finite() {
            return Err(GeometryError::Malformed("non-finite ordinate".to_string()));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(GeometryError::Malformed(format!("longitude {} out of range", lon)));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(GeometryError::Malformed(format!("latitude {} out of range", lat)));
        }

        Ok(Self { lon, lat })
    }

    fn to_json(self) -> Value {
        json!([self.lon, self.lat])
    }
}

/// Point or polygon bounding a query. Polygon rings are closed; the first
/// ring is the exterior.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    Point(Coordinate),
    Polygon(Vec<Vec<Coordinate>>),
}

impl Region {
    #[cfg(test)]
    pub fn point(lon: f64, lat: f64) -> Result<Self, GeometryError> {
        Ok(Region::Point(Coordinate::from_position(&[lon, lat])?))
    }

    /// Parse the `geometry` of a raw drawn-shape event `{ "geometry": { ... } }`.
    /// `None` or null means nothing was drawn.
    pub fn from_drawn_shape(shape: Option<&Value>) -> Result<Self, GeometryError> {
        let shape = match shape {
            None | Some(Value::Null) => return Err(GeometryError::Missing),
            Some(Value::Object(shape)) => shape,
            Some(_) => {
                return Err(GeometryError::Malformed(
                    "drawn shape must be an object".to_string(),
                ))
            }
        };

        let geometry = match shape.get("geometry") {
            None | Some(Value::Null) => return Err(GeometryError::Missing),
            Some(geometry @ Value::Object(_)) => geometry,
            Some(_) => {
                return Err(GeometryError::Malformed(
                    "geometry must be an object".to_string(),
                ))
            }
        };

        let kind = geometry
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| GeometryError::Malformed("geometry has no type".to_string()))?;

        if kind != "Point" && kind != "Polygon" {
            return Err(GeometryError::Unsupported(kind.to_string()));
        }

        let parsed = geojson::Geometry::from_json_value(geometry.clone())
            .map_err(|e| GeometryError::Malformed(e.to_string()))?;

        match parsed.value {
            geojson::Value::Point(position) => {
                Ok(Region::Point(Coordinate::from_position(&position)?))
            }
            geojson::Value::Polygon(rings) => Self::polygon_from_rings(&rings),
            _ => Err(GeometryError::Unsupported(kind.to_string())),
        }
    }

    fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Result<Self, GeometryError> {
        if rings.is_empty() {
            return Err(GeometryError::Malformed("polygon has no rings".to_string()));
        }

        let mut parsed = Vec::with_capacity(rings.len());
        for (i, ring) in rings.iter().enumerate() {
            if ring.len() < 4 {
                return Err(GeometryError::Malformed(format!(
                    "ring {} has {} positions, need at least 4",
                    i,
                    ring.len()
                )));
            }

            let coords = ring
                .iter()
                .map(|p| Coordinate::from_position(p))
                .collect::<Result<Vec<_>, _>>()?;

            if coords.first() != coords.last() {
                return Err(GeometryError::Malformed(format!("ring {} is not closed", i)));
            }
            parsed.push(coords);
        }

        Ok(Region::Polygon(parsed))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Region::Point(_) => "Point",
            Region::Polygon(_) => "Polygon",
        }
    }

    /// GeoJSON `coordinates` member for this region
    pub fn coordinates_json(&self) -> Value {
        match self {
            Region::Point(c) => c.to_json(),
            Region::Polygon(rings) => Value::Array(
                rings
                    .iter()
                    .map(|ring| Value::Array(ring.iter().map(|c| c.to_json()).collect()))
                    .collect(),
            ),
        }
    }
}
