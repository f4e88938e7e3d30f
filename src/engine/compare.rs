use std::collections::HashMap;

use crate::geo::dataset::Atlas;

/// How many countries the comparison charts show, in atlas order.
pub const COMPARE_LIMIT: usize = 50;
/// Entries kept in each frequency chart.
pub const FREQUENCY_LIMIT: usize = 10;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Comparison {
    pub population: Vec<(String, f64)>,
    pub area: Vec<(String, f64)>,
    pub currencies: Vec<(String, usize)>,
    pub languages: Vec<(String, usize)>,
}

impl Comparison {
    pub fn build(atlas: &Atlas) -> Self {
        let countries = &atlas.countries()[..atlas.len().min(COMPARE_LIMIT)];

        let population = countries
            .iter()
            .map(|c| (c.name.clone(), c.population().unwrap_or(0) as f64))
            .collect();
        let area = countries
            .iter()
            .map(|c| (c.name.clone(), c.facts.area.unwrap_or(0.0)))
            .collect();
        let currencies = frequencies(
            countries
                .iter()
                .filter_map(|c| c.facts.currency_name.as_deref()),
        );
        let languages = frequencies(
            countries
                .iter()
                .flat_map(|c| c.facts.languages.iter().map(String::as_str)),
        );

        Self {
            population,
            area,
            currencies,
            languages,
        }
    }
}

/// Most common values first, ties alphabetical, at most [`FREQUENCY_LIMIT`].
pub fn frequencies<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.map(str::trim).filter(|v| !v.is_empty()) {
        *counts.entry(value).or_default() += 1;
    }
    let mut sorted: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(FREQUENCY_LIMIT);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::country::{Country, CountryFacts};

    #[test]
    fn test_frequencies_sort_by_count_then_name() {
        let got = frequencies(["Euro", "Yen", "Euro", "Baht", " ", "Yen", "Euro"].into_iter());
        assert_eq!(
            got,
            vec![
                ("Euro".to_string(), 3),
                ("Yen".to_string(), 2),
                ("Baht".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_comparison_is_limited_to_first_countries() {
        let countries = (0..60)
            .map(|i| {
                Country::new(format!("C{i:02}"), Vec::new()).with_facts(CountryFacts {
                    population: Some(i),
                    area: (i % 2 == 0).then_some(i as f64 * 10.0),
                    currency_name: Some(if i < 30 { "Euro" } else { "Dollar" }.to_string()),
                    languages: vec!["English".to_string(), format!("L{}", i % 3)],
                    ..CountryFacts::default()
                })
            })
            .collect();
        let comparison = Comparison::build(&Atlas::new(countries));

        assert_eq!(comparison.population.len(), COMPARE_LIMIT);
        assert_eq!(comparison.population[49], ("C49".to_string(), 49.0));
        assert_eq!(comparison.area[1].1, 0.0);
        assert_eq!(comparison.currencies[0], ("Euro".to_string(), 30));
        assert_eq!(comparison.currencies[1], ("Dollar".to_string(), 20));
        assert_eq!(comparison.languages[0], ("English".to_string(), 50));
    }
}
