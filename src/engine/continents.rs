use std::collections::BTreeMap;

use crate::geo::dataset::Atlas;

pub const UNKNOWN_CONTINENT: &str = "Unknown";

#[derive(Clone, Debug, PartialEq)]
pub struct ContinentGroup {
    pub name: String,
    /// Atlas indices, sorted by country name.
    pub countries: Vec<usize>,
    pub population: u64,
    pub expanded: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeRow {
    Continent { group: usize },
    Country { group: usize, country: usize },
}

/// Collapsible continent -> country listing with a row cursor.
#[derive(Clone, Debug, Default)]
pub struct ContinentTree {
    pub groups: Vec<ContinentGroup>,
    pub cursor: usize,
}

impl ContinentTree {
    pub fn build(atlas: &Atlas) -> Self {
        let mut by_continent: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, country) in atlas.countries().iter().enumerate() {
            let continent = country
                .facts
                .continent
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(UNKNOWN_CONTINENT);
            by_continent
                .entry(continent.to_string())
                .or_default()
                .push(idx);
        }

        let mut groups: Vec<ContinentGroup> = by_continent
            .into_iter()
            .map(|(name, mut countries)| {
                countries.sort_by(|&a, &b| {
                    let name = |i: usize| atlas.get(i).map(|c| c.name.as_str()).unwrap_or("");
                    name(a).cmp(name(b))
                });
                let population = countries
                    .iter()
                    .filter_map(|&i| atlas.get(i)?.population())
                    .sum();
                ContinentGroup {
                    name,
                    countries,
                    population,
                    expanded: false,
                }
            })
            .collect();
        // Unknown sorts last regardless of spelling.
        groups.sort_by_key(|g| g.name == UNKNOWN_CONTINENT);

        Self { groups, cursor: 0 }
    }

    pub fn rows(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        for (group, g) in self.groups.iter().enumerate() {
            rows.push(TreeRow::Continent { group });
            if g.expanded {
                rows.extend(
                    g.countries
                        .iter()
                        .map(|&country| TreeRow::Country { group, country }),
                );
            }
        }
        rows
    }

    pub fn current(&self) -> Option<TreeRow> {
        self.rows().get(self.cursor).copied()
    }

    pub fn next(&mut self) {
        let len = self.rows().len();
        if self.cursor + 1 < len {
            self.cursor += 1;
        }
    }

    pub fn prev(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Expands or collapses the continent under the cursor. On a country row the
    /// parent collapses and the cursor moves onto it.
    pub fn toggle(&mut self) {
        let Some(row) = self.current() else {
            return;
        };
        let group = match row {
            TreeRow::Continent { group } | TreeRow::Country { group, .. } => group,
        };
        let g = &mut self.groups[group];
        g.expanded = match row {
            TreeRow::Continent { .. } => !g.expanded,
            TreeRow::Country { .. } => false,
        };
        if let Some(pos) = self
            .rows()
            .iter()
            .position(|r| *r == TreeRow::Continent { group })
        {
            if matches!(row, TreeRow::Country { .. }) {
                self.cursor = pos;
            }
        }
    }

    pub fn set_all(&mut self, expanded: bool) {
        for g in &mut self.groups {
            g.expanded = expanded;
        }
        self.cursor = self.cursor.min(self.rows().len().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::country::{Country, CountryFacts};

    fn atlas() -> Atlas {
        let c = |name: &str, continent: Option<&str>, population: u64| {
            Country::new(name, Vec::new()).with_facts(CountryFacts {
                continent: continent.map(str::to_string),
                population: Some(population),
                ..CountryFacts::default()
            })
        };
        Atlas::new(vec![
            c("Spain", Some("Europe"), 48),
            c("Kenya", Some("Africa"), 55),
            c("France", Some("Europe"), 68),
            c("Atlantis", None, 1),
            c("Egypt", Some("Africa"), 112),
        ])
    }

    #[test]
    fn test_groups_by_continent_with_totals() {
        let tree = ContinentTree::build(&atlas());
        let names: Vec<&str> = tree.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Africa", "Europe", "Unknown"]);
        assert_eq!(tree.groups[0].population, 167);
        // France (2) before Spain (0).
        assert_eq!(tree.groups[1].countries, vec![2, 0]);
    }

    #[test]
    fn test_collapsed_tree_shows_only_continents() {
        let tree = ContinentTree::build(&atlas());
        assert_eq!(tree.rows().len(), 3);
    }

    #[test]
    fn test_toggle_expands_and_collapses_from_child() {
        let mut tree = ContinentTree::build(&atlas());
        tree.next();
        tree.toggle();
        assert_eq!(
            tree.rows(),
            vec![
                TreeRow::Continent { group: 0 },
                TreeRow::Continent { group: 1 },
                TreeRow::Country { group: 1, country: 2 },
                TreeRow::Country { group: 1, country: 0 },
                TreeRow::Continent { group: 2 },
            ]
        );

        tree.next();
        tree.next();
        assert_eq!(tree.current(), Some(TreeRow::Country { group: 1, country: 0 }));
        tree.toggle();
        assert_eq!(tree.rows().len(), 3);
        assert_eq!(tree.current(), Some(TreeRow::Continent { group: 1 }));
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut tree = ContinentTree::build(&atlas());
        for _ in 0..10 {
            tree.next();
        }
        assert_eq!(tree.cursor, 2);
        tree.set_all(true);
        assert_eq!(tree.rows().len(), 8);
        tree.set_all(false);
        assert_eq!(tree.cursor, 2);
        tree.prev();
        tree.prev();
        tree.prev();
        assert_eq!(tree.cursor, 0);
    }
}
