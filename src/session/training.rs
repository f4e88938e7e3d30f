use crate::geo::country::{Country, names_match};
use crate::geo::dataset::Atlas;
use crate::geo::lookup::{CountryMetadata, LookupReply};

/// Free exploration: select a country and read about it.
#[derive(Debug, Default)]
pub struct TrainingSession {
    selected: Option<usize>,
    metadata: Option<CountryMetadata>,
    lookup_pending: bool,
}

impl TrainingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a country. Returns the name to look up when the selection changed.
    pub fn select(&mut self, country: Option<usize>, atlas: &Atlas) -> Option<String> {
        if country == self.selected {
            return None;
        }
        self.selected = country;
        self.metadata = None;
        self.lookup_pending = false;
        let name = atlas.get(country?)?.name.clone();
        self.lookup_pending = true;
        Some(name)
    }

    /// No lookup will answer for the current selection.
    pub fn cancel_lookup(&mut self) {
        self.lookup_pending = false;
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.metadata = None;
        self.lookup_pending = false;
    }

    /// Applies a lookup reply if it still belongs to the selection.
    /// Returns false for stale replies and for failures.
    pub fn apply_lookup(&mut self, reply: LookupReply, atlas: &Atlas) -> bool {
        let current = self.selected_country(atlas).map(|c| c.name.as_str());
        if !current.is_some_and(|name| names_match(name, &reply.country)) {
            log::debug!("dropping stale lookup reply for {}", reply.country);
            return false;
        }
        self.lookup_pending = false;
        match reply.result {
            Ok(metadata) => {
                self.metadata = Some(metadata);
                true
            }
            Err(e) => {
                log::warn!("metadata lookup for {} failed: {e}", reply.country);
                false
            }
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_country<'a>(&self, atlas: &'a Atlas) -> Option<&'a Country> {
        atlas.get(self.selected?)
    }

    pub fn metadata(&self) -> Option<&CountryMetadata> {
        self.metadata.as_ref()
    }

    pub fn lookup_pending(&self) -> bool {
        self.lookup_pending
    }

    /// Capital from the remote lookup when present, else from the local record.
    pub fn capital<'a>(&'a self, atlas: &'a Atlas) -> Option<&'a str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.capital.as_deref())
            .or_else(|| self.selected_country(atlas)?.facts.capital.as_deref())
    }
}

/// Position of a population on a log scale between 1 and `max`, in `[0, 1]`.
pub fn population_intensity(population: Option<u64>, max: u64) -> Option<f64> {
    let population = population?;
    if max <= 1 {
        return Some(0.0);
    }
    let value = (population.max(1) as f64).ln() / (max as f64).ln();
    Some(value.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::country::{CountryFacts, Polygon};
    use crate::geo::http::FetchError;
    use crate::geo::lookup::LookupError;

    fn atlas() -> Atlas {
        let poly = |x: f64| {
            vec![Polygon::new(vec![vec![
                (x, 0.0),
                (x + 1.0, 0.0),
                (x + 1.0, 1.0),
                (x, 0.0),
            ]])]
        };
        Atlas::new(vec![
            Country::new("France", poly(0.0)).with_facts(CountryFacts {
                capital: Some("Paris".to_string()),
                ..CountryFacts::default()
            }),
            Country::new("Japan", poly(5.0)),
        ])
    }

    fn reply(country: &str, code: &str, capital: &str) -> LookupReply {
        LookupReply {
            country: country.to_string(),
            result: Ok(CountryMetadata {
                code: code.to_string(),
                capital: Some(capital.to_string()),
            }),
        }
    }

    #[test]
    fn test_selecting_requests_lookup_once() {
        let atlas = atlas();
        let mut training = TrainingSession::new();
        assert_eq!(training.select(Some(0), &atlas).as_deref(), Some("France"));
        assert!(training.lookup_pending());
        assert_eq!(training.select(Some(0), &atlas), None);
        assert_eq!(training.capital(&atlas), Some("Paris"));
    }

    #[test]
    fn test_stale_reply_is_dropped() {
        let atlas = atlas();
        let mut training = TrainingSession::new();
        training.select(Some(0), &atlas);
        training.select(Some(1), &atlas);

        assert!(!training.apply_lookup(reply("France", "FR", "Paris"), &atlas));
        assert!(training.metadata().is_none());
        assert!(training.apply_lookup(reply("japan", "JP", "Tokyo"), &atlas));
        assert_eq!(training.metadata().unwrap().code, "JP");
        assert_eq!(training.capital(&atlas), Some("Tokyo"));
    }

    #[test]
    fn test_failed_lookup_keeps_local_facts() {
        let atlas = atlas();
        let mut training = TrainingSession::new();
        training.select(Some(0), &atlas);
        let failed = LookupReply {
            country: "France".to_string(),
            result: Err(LookupError::Network(FetchError::Disabled)),
        };
        assert!(!training.apply_lookup(failed, &atlas));
        assert!(!training.lookup_pending());
        assert_eq!(training.capital(&atlas), Some("Paris"));
    }

    #[test]
    fn test_population_intensity_is_log_scaled() {
        assert_eq!(population_intensity(None, 1000), None);
        assert_eq!(population_intensity(Some(1000), 1000), Some(1.0));
        let mid = population_intensity(Some(1_000), 1_000_000).unwrap();
        assert!((mid - 0.5).abs() < 1e-9);
        assert_eq!(population_intensity(Some(5), 0), Some(0.0));
    }
}
