use serde::{Deserialize, Serialize};

/// A closed ring of `(lon, lat)` degrees. The last point may or may not repeat the first.
pub type Ring = Vec<(f64, f64)>;

/// One polygon: an outer ring followed by optional holes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

impl Polygon {
    pub fn new(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    pub fn outer(&self) -> Option<&Ring> {
        self.rings.first()
    }

    /// Even-odd test across all rings, so holes punch out of the outer ring.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let mut inside = false;
        for ring in &self.rings {
            if ring_contains(ring, lon, lat) {
                inside = !inside;
            }
        }
        inside
    }
}

fn ring_contains(ring: &Ring, lon: f64, lat: f64) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn from_polygons(polygons: &[Polygon]) -> Option<Self> {
        let mut points = polygons
            .iter()
            .filter_map(Polygon::outer)
            .flat_map(|ring| ring.iter().copied());
        let (lon, lat) = points.next()?;
        let mut bbox = Self {
            min_lon: lon,
            min_lat: lat,
            max_lon: lon,
            max_lat: lat,
        };
        for (lon, lat) in points {
            bbox.min_lon = bbox.min_lon.min(lon);
            bbox.min_lat = bbox.min_lat.min(lat);
            bbox.max_lon = bbox.max_lon.max(lon);
            bbox.max_lat = bbox.max_lat.max(lat);
        }
        Some(bbox)
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    pub fn area(&self) -> f64 {
        (self.max_lon - self.min_lon) * (self.max_lat - self.min_lat)
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }
}

/// Facts joined onto a country from the enrichment file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryFacts {
    #[serde(default)]
    pub population: Option<u64>,
    /// Square kilometres.
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default, alias = "currency")]
    pub currency_name: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default, alias = "region")]
    pub continent: Option<String>,
    #[serde(default, alias = "cca2")]
    pub iso2: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Country {
    pub name: String,
    pub polygons: Vec<Polygon>,
    pub bbox: Option<BoundingBox>,
    pub facts: CountryFacts,
}

impl Country {
    pub fn new(name: impl Into<String>, polygons: Vec<Polygon>) -> Self {
        let bbox = BoundingBox::from_polygons(&polygons);
        Self {
            name: name.into(),
            polygons,
            bbox,
            facts: CountryFacts::default(),
        }
    }

    pub fn with_facts(mut self, facts: CountryFacts) -> Self {
        self.facts = facts;
        self
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        match self.bbox {
            Some(bbox) if bbox.contains(lon, lat) => {
                self.polygons.iter().any(|p| p.contains(lon, lat))
            }
            _ => false,
        }
    }

    /// Names are compared the way the player reads them: case and surrounding
    /// whitespace do not matter.
    pub fn is_named(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }

    /// Middle of the bounding box, good enough to point the globe at.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        self.bbox.map(|b| b.center())
    }

    pub fn population(&self) -> Option<u64> {
        self.facts.population
    }
}

pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Ring {
        vec![
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
            (x0, y0),
        ]
    }

    #[test]
    fn test_point_inside_simple_ring() {
        let poly = Polygon::new(vec![square(0.0, 0.0, 10.0)]);
        assert!(poly.contains(5.0, 5.0));
        assert!(!poly.contains(15.0, 5.0));
        assert!(!poly.contains(-0.1, 5.0));
    }

    #[test]
    fn test_hole_is_excluded() {
        let poly = Polygon::new(vec![square(0.0, 0.0, 10.0), square(4.0, 4.0, 2.0)]);
        assert!(poly.contains(1.0, 1.0));
        assert!(!poly.contains(5.0, 5.0));
    }

    #[test]
    fn test_multipolygon_country_contains_either_part() {
        let country = Country::new(
            "Twin Isles",
            vec![
                Polygon::new(vec![square(0.0, 0.0, 2.0)]),
                Polygon::new(vec![square(10.0, 10.0, 2.0)]),
            ],
        );
        assert!(country.contains(1.0, 1.0));
        assert!(country.contains(11.0, 11.0));
        assert!(!country.contains(5.0, 5.0));
        let bbox = country.bbox.unwrap();
        assert_eq!(bbox.min_lon, 0.0);
        assert_eq!(bbox.max_lat, 12.0);
    }

    #[test]
    fn test_name_equality_ignores_case_and_padding() {
        let country = Country::new("France", Vec::new());
        assert!(country.is_named("france"));
        assert!(country.is_named("  FRANCE "));
        assert!(!country.is_named("Frankreich"));
    }

    #[test]
    fn test_empty_geometry_has_no_bbox() {
        let country = Country::new("Nowhere", Vec::new());
        assert!(country.bbox.is_none());
        assert!(!country.contains(0.0, 0.0));
    }
}
