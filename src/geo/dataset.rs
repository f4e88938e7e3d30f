use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use rust_embed::Embed;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::geo::country::{Country, CountryFacts, Polygon, Ring, names_match};
use crate::geo::http::{self, FetchError};

#[derive(Embed)]
#[folder = "assets/data/"]
struct DataAssets;

const BUNDLED_GEOMETRY: &str = "world.geojson";
const BUNDLED_ENRICHMENT: &str = "countries.json";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Network(#[from] FetchError),
    #[error("bundled asset {0} is missing")]
    MissingAsset(&'static str),
    #[error("dataset contains no usable countries")]
    Empty,
    #[error("dataset loader stopped before finishing")]
    LoaderStopped,
}

/// Where a dataset comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatasetSource {
    Bundled,
    File(PathBuf),
    Url(String),
}

impl DatasetSource {
    pub fn parse(source: &str) -> Self {
        let source = source.trim();
        if source.is_empty() || source == "bundled" {
            DatasetSource::Bundled
        } else if source.starts_with("http://") || source.starts_with("https://") {
            DatasetSource::Url(source.to_string())
        } else {
            DatasetSource::File(PathBuf::from(source))
        }
    }

    fn read(&self, bundled_name: &'static str) -> Result<String, DatasetError> {
        match self {
            DatasetSource::Bundled => {
                let file = DataAssets::get(bundled_name)
                    .ok_or(DatasetError::MissingAsset(bundled_name))?;
                Ok(String::from_utf8_lossy(file.data.as_ref()).into_owned())
            }
            DatasetSource::File(path) => {
                fs::read_to_string(path).map_err(|source| DatasetError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
            DatasetSource::Url(url) => Ok(http::fetch_url(url)?),
        }
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::Bundled => write!(f, "bundled"),
            DatasetSource::File(path) => write!(f, "{}", path.display()),
            DatasetSource::Url(url) => write!(f, "{url}"),
        }
    }
}

// --- GeoJSON (only the subset the map needs) ---

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: FeatureProperties,
    geometry: Option<Geometry>,
}

#[derive(Default, Deserialize)]
struct FeatureProperties {
    #[serde(default, alias = "NAME", alias = "ADMIN", alias = "admin")]
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Unsupported,
}

fn to_ring(points: Vec<Vec<f64>>) -> Ring {
    points
        .into_iter()
        .filter(|p| p.len() >= 2)
        .map(|p| (p[0], p[1]))
        .collect()
}

fn to_polygon(rings: Vec<Vec<Vec<f64>>>) -> Polygon {
    Polygon::new(rings.into_iter().map(to_ring).collect())
}

pub fn parse_geojson(text: &str) -> Result<Vec<Country>, DatasetError> {
    let collection: FeatureCollection =
        serde_json::from_str(text).map_err(|source| DatasetError::Parse {
            what: "geometry".to_string(),
            source,
        })?;

    let countries = collection
        .features
        .into_iter()
        .filter_map(|feature| {
            let name = feature.properties.name?;
            let polygons = match feature.geometry? {
                Geometry::Polygon { coordinates } => vec![to_polygon(coordinates)],
                Geometry::MultiPolygon { coordinates } => {
                    coordinates.into_iter().map(to_polygon).collect()
                }
                Geometry::Unsupported => return None,
            };
            Some(Country::new(name, polygons))
        })
        .collect();
    Ok(countries)
}

// --- Enrichment ---

#[derive(Debug, Deserialize)]
pub struct EnrichmentRecord {
    pub name: String,
    #[serde(default, deserialize_with = "loose_u64")]
    pub population: Option<u64>,
    #[serde(default, deserialize_with = "loose_f64")]
    pub area: Option<f64>,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default, alias = "currency")]
    pub currency_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub languages: Vec<String>,
    #[serde(default, alias = "region")]
    pub continent: Option<String>,
    #[serde(default, alias = "cca2")]
    pub iso2: Option<String>,
}

impl From<EnrichmentRecord> for CountryFacts {
    fn from(record: EnrichmentRecord) -> Self {
        CountryFacts {
            population: record.population,
            area: record.area,
            capital: record.capital.filter(|c| !c.trim().is_empty()),
            currency_name: record.currency_name,
            languages: record.languages,
            continent: record.continent,
            iso2: record.iso2,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(u64),
    Float(f64),
    Text(String),
}

fn loose_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Ok(match Option::<Loose>::deserialize(d)? {
        Some(Loose::Int(n)) => Some(n),
        Some(Loose::Float(f)) if f >= 0.0 => Some(f as u64),
        Some(Loose::Text(s)) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    })
}

fn loose_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Loose>::deserialize(d)? {
        Some(Loose::Int(n)) => Some(n as f64),
        Some(Loose::Float(f)) => Some(f),
        Some(Loose::Text(s)) => s.trim().replace(',', "").parse().ok(),
        None => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

fn string_or_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<StringOrList>::deserialize(d)? {
        Some(StringOrList::One(s)) => s
            .split(',')
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect(),
        Some(StringOrList::Many(list)) => list,
        None => Vec::new(),
    })
}

pub fn parse_enrichment(text: &str) -> Result<Vec<EnrichmentRecord>, DatasetError> {
    serde_json::from_str(text).map_err(|source| DatasetError::Parse {
        what: "enrichment".to_string(),
        source,
    })
}

// --- Atlas ---

/// The loaded country collection, shared read-only between screens.
#[derive(Debug, Default)]
pub struct Atlas {
    countries: Vec<Country>,
    by_name: HashMap<String, usize>,
}

impl Atlas {
    pub fn new(countries: Vec<Country>) -> Self {
        let by_name = countries
            .iter()
            .enumerate()
            .map(|(i, c)| (name_key(&c.name), i))
            .collect();
        Self { countries, by_name }
    }

    pub fn load(
        geometry: &DatasetSource,
        enrichment: &DatasetSource,
    ) -> Result<Self, DatasetError> {
        let countries = parse_geojson(&geometry.read(BUNDLED_GEOMETRY)?)?;
        if countries.is_empty() {
            return Err(DatasetError::Empty);
        }
        let mut atlas = Self::new(countries);

        // Geometry alone is playable, so a broken enrichment file only costs the facts.
        match enrichment
            .read(BUNDLED_ENRICHMENT)
            .and_then(|text| parse_enrichment(&text))
        {
            Ok(records) => {
                let joined = atlas.enrich(records);
                log::info!(
                    "loaded {} countries from {geometry}, {joined} enriched from {enrichment}",
                    atlas.len()
                );
            }
            Err(e) => log::warn!("enrichment unavailable ({enrichment}): {e}"),
        }
        Ok(atlas)
    }

    /// Join facts by name. Returns how many countries received facts.
    pub fn enrich(&mut self, records: Vec<EnrichmentRecord>) -> usize {
        let mut joined = 0;
        for record in records {
            if let Some(&idx) = self.by_name.get(&name_key(&record.name)) {
                self.countries[idx].facts = record.into();
                joined += 1;
            }
        }
        joined
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn get(&self, idx: usize) -> Option<&Country> {
        self.countries.get(idx)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(&name_key(name)).copied().or_else(|| {
            self.countries.iter().position(|c| names_match(&c.name, name))
        })
    }

    /// The country under a geographic point. Nested shapes (enclaves) resolve
    /// to the smallest containing country.
    pub fn hit_test(&self, lon: f64, lat: f64) -> Option<usize> {
        self.countries
            .iter()
            .enumerate()
            .filter(|(_, c)| c.contains(lon, lat))
            .min_by(|(_, a), (_, b)| {
                let area = |c: &Country| c.bbox.map(|b| b.area()).unwrap_or(f64::MAX);
                area(a).total_cmp(&area(b))
            })
            .map(|(i, _)| i)
    }

    pub fn max_population(&self) -> u64 {
        self.countries
            .iter()
            .filter_map(Country::population)
            .max()
            .unwrap_or(0)
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Loads an atlas off the UI thread. Poll with [`AtlasLoader::poll`].
pub struct AtlasLoader {
    rx: Receiver<Result<Atlas, DatasetError>>,
}

impl AtlasLoader {
    pub fn spawn(geometry: DatasetSource, enrichment: DatasetSource) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = Atlas::load(&geometry, &enrichment);
            // Receiver gone means the screen was left; nothing to report to.
            let _ = tx.send(result);
        });
        Self { rx }
    }

    /// `None` while still loading.
    pub fn poll(&self) -> Option<Result<Arc<Atlas>, DatasetError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result.map(Arc::new)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(DatasetError::LoaderStopped)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"name": "Squareland"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[10,0],[10,10],[0,10],[0,0]]]}},
            {"type": "Feature", "properties": {"name": "Enclavia"},
             "geometry": {"type": "Polygon", "coordinates": [[[4,4],[6,4],[6,6],[4,6],[4,4]]]}},
            {"type": "Feature", "properties": {"name": "Islands"},
             "geometry": {"type": "MultiPolygon", "coordinates": [
                 [[[20,0],[22,0],[22,2],[20,2],[20,0]]],
                 [[[30,0,5],[32,0,5],[32,2,5],[30,2,5],[30,0,5]]]
             ]}},
            {"type": "Feature", "properties": {"name": "Pointy"},
             "geometry": {"type": "Point", "coordinates": [1, 1]}},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
        ]
    }"#;

    #[test]
    fn test_parses_polygons_and_multipolygons_only() {
        let countries = parse_geojson(SAMPLE).unwrap();
        let names: Vec<&str> = countries.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Squareland", "Enclavia", "Islands"]);
        assert_eq!(countries[2].polygons.len(), 2);
    }

    #[test]
    fn test_hit_test_prefers_smallest_country() {
        let atlas = Atlas::new(parse_geojson(SAMPLE).unwrap());
        assert_eq!(atlas.hit_test(5.0, 5.0), atlas.index_of("Enclavia"));
        assert_eq!(atlas.hit_test(1.0, 1.0), atlas.index_of("Squareland"));
        assert_eq!(atlas.hit_test(31.0, 1.0), atlas.index_of("islands"));
        assert_eq!(atlas.hit_test(50.0, 50.0), None);
    }

    #[test]
    fn test_enrichment_accepts_loose_numbers_and_language_strings() {
        let records = parse_enrichment(
            r#"[
                {"name": "squareland", "population": "1,200", "area": "42.5",
                 "capital": "Corner", "currency_name": "Square", "languages": "Flat, Round"},
                {"name": "Enclavia", "population": 7, "languages": ["Inner"], "region": "Middle"},
                {"name": "Atlantis", "population": 1}
            ]"#,
        )
        .unwrap();
        let mut atlas = Atlas::new(parse_geojson(SAMPLE).unwrap());
        assert_eq!(atlas.enrich(records), 2);

        let square = atlas.get(atlas.index_of("Squareland").unwrap()).unwrap();
        assert_eq!(square.facts.population, Some(1200));
        assert_eq!(square.facts.area, Some(42.5));
        assert_eq!(square.facts.languages, vec!["Flat", "Round"]);

        let enclave = atlas.get(atlas.index_of("Enclavia").unwrap()).unwrap();
        assert_eq!(enclave.facts.continent.as_deref(), Some("Middle"));
        assert_eq!(atlas.max_population(), 1200);
    }

    #[test]
    fn test_source_parse_distinguishes_kinds() {
        assert_eq!(DatasetSource::parse(""), DatasetSource::Bundled);
        assert_eq!(DatasetSource::parse("bundled"), DatasetSource::Bundled);
        assert_eq!(
            DatasetSource::parse("https://example.com/world.geojson"),
            DatasetSource::Url("https://example.com/world.geojson".to_string())
        );
        assert_eq!(
            DatasetSource::parse("/tmp/world.geojson"),
            DatasetSource::File(PathBuf::from("/tmp/world.geojson"))
        );
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let source = DatasetSource::File(PathBuf::from("/definitely/not/here.geojson"));
        let err = Atlas::load(&source, &DatasetSource::Bundled).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }

    #[test]
    fn test_bundled_atlas_loads_and_is_enriched() {
        let atlas = Atlas::load(&DatasetSource::Bundled, &DatasetSource::Bundled).unwrap();
        assert!(atlas.len() >= 30);
        let france = atlas.get(atlas.index_of("France").unwrap()).unwrap();
        assert_eq!(france.facts.capital.as_deref(), Some("Paris"));
        // Paris sits inside the France outline.
        assert_eq!(atlas.hit_test(2.35, 48.85), atlas.index_of("France"));
    }
}
