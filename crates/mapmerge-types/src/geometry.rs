//! GeoJSON geometries attached to element variants.
//!
//! Geometries compare structurally: two values with the same type and the
//! same coordinates in the same order are equal regardless of where they came
//! from. [`Geometry::canonical_form`] is the compact JSON serialization used
//! for that comparison.

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// A single `[lon, lat]` or `[lon, lat, alt]` position.
pub type Position = Vec<f64>;

/// A GeoJSON geometry object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl Geometry {
    /// The GeoJSON `type` name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::MultiPoint(_) => "MultiPoint",
            Self::LineString(_) => "LineString",
            Self::MultiLineString(_) => "MultiLineString",
            Self::Polygon(_) => "Polygon",
            Self::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Compact JSON serialization used for structural comparison.
    pub fn canonical_form(&self) -> TypeResult<String> {
        serde_json::to_string(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Check that the geometry can be interpreted.
    ///
    /// Returns a human-readable reason on failure.
    pub fn check(&self) -> Result<(), String> {
        match self {
            Self::Point(p) => check_position(p),
            Self::MultiPoint(ps) => ps.iter().try_for_each(|p| check_position(p)),
            Self::LineString(line) => check_line(line),
            Self::MultiLineString(lines) => lines.iter().try_for_each(|l| check_line(l)),
            Self::Polygon(rings) => check_polygon(rings),
            Self::MultiPolygon(polys) => polys.iter().try_for_each(|p| check_polygon(p)),
        }
    }
}

fn check_position(p: &[f64]) -> Result<(), String> {
    if !(2..=3).contains(&p.len()) {
        return Err(format!("position has {} dimensions, expected 2 or 3", p.len()));
    }
    if p.iter().any(|c| !c.is_finite()) {
        return Err("position has a non-finite coordinate".into());
    }
    Ok(())
}

fn check_line(line: &[Position]) -> Result<(), String> {
    if line.len() < 2 {
        return Err(format!("line string has {} positions, need at least 2", line.len()));
    }
    line.iter().try_for_each(|p| check_position(p))
}

fn check_polygon(rings: &[Vec<Position>]) -> Result<(), String> {
    if rings.is_empty() {
        return Err("polygon has no rings".into());
    }
    for ring in rings {
        if ring.len() < 4 {
            return Err(format!("polygon ring has {} positions, need at least 4", ring.len()));
        }
        ring.iter().try_for_each(|p| check_position(p))?;
        if ring.first() != ring.last() {
            return Err("polygon ring is not closed".into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Geometry {
        Geometry::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 1.0],
            vec![0.0, 0.0],
        ]])
    }

    #[test]
    fn parses_geojson() {
        let g: Geometry =
            serde_json::from_str(r#"{"type":"LineString","coordinates":[[1.5,2.0],[3.0,4.0]]}"#)
                .unwrap();
        assert_eq!(g, Geometry::LineString(vec![vec![1.5, 2.0], vec![3.0, 4.0]]));
        assert_eq!(g.type_name(), "LineString");
    }

    #[test]
    fn canonical_form_is_structural() {
        let a = Geometry::Point(vec![13.4, 52.5]);
        let b = Geometry::Point(vec![13.4, 52.5]);
        assert_eq!(a.canonical_form().unwrap(), b.canonical_form().unwrap());
        assert_eq!(
            a.canonical_form().unwrap(),
            r#"{"type":"Point","coordinates":[13.4,52.5]}"#
        );
    }

    #[test]
    fn type_participates_in_canonical_form() {
        let line = Geometry::LineString(vec![vec![0.0, 0.0], vec![1.0, 1.0]]);
        let multi = Geometry::MultiPoint(vec![vec![0.0, 0.0], vec![1.0, 1.0]]);
        assert_ne!(line.canonical_form().unwrap(), multi.canonical_form().unwrap());
    }

    #[test]
    fn valid_polygon_passes() {
        assert!(square().check().is_ok());
    }

    #[test]
    fn open_ring_rejected() {
        let g = Geometry::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 1.0],
        ]]);
        assert!(g.check().unwrap_err().contains("not closed"));
    }

    #[test]
    fn short_line_rejected() {
        let g = Geometry::LineString(vec![vec![0.0, 0.0]]);
        assert!(g.check().is_err());
    }

    #[test]
    fn bad_dimensions_rejected() {
        assert!(Geometry::Point(vec![1.0]).check().is_err());
        assert!(Geometry::Point(vec![1.0, 2.0, 3.0]).check().is_ok());
        assert!(Geometry::Point(vec![f64::NAN, 0.0]).check().is_err());
    }
}
