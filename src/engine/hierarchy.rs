use crate::geo::dataset::Atlas;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PopulationBucket {
    Under1M,
    From1MTo10M,
    From10MTo50M,
    From50MTo100M,
    From100MTo500M,
    Over500M,
    Unknown,
}

impl PopulationBucket {
    pub const ALL: [PopulationBucket; 7] = [
        PopulationBucket::Under1M,
        PopulationBucket::From1MTo10M,
        PopulationBucket::From10MTo50M,
        PopulationBucket::From50MTo100M,
        PopulationBucket::From100MTo500M,
        PopulationBucket::Over500M,
        PopulationBucket::Unknown,
    ];

    pub fn for_population(population: Option<u64>) -> Self {
        match population {
            None => PopulationBucket::Unknown,
            Some(p) if p < 1_000_000 => PopulationBucket::Under1M,
            Some(p) if p < 10_000_000 => PopulationBucket::From1MTo10M,
            Some(p) if p < 50_000_000 => PopulationBucket::From10MTo50M,
            Some(p) if p < 100_000_000 => PopulationBucket::From50MTo100M,
            Some(p) if p < 500_000_000 => PopulationBucket::From100MTo500M,
            Some(_) => PopulationBucket::Over500M,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PopulationBucket::Under1M => "< 1M",
            PopulationBucket::From1MTo10M => "1M-10M",
            PopulationBucket::From10MTo50M => "10M-50M",
            PopulationBucket::From50MTo100M => "50M-100M",
            PopulationBucket::From100MTo500M => "100M-500M",
            PopulationBucket::Over500M => ">= 500M",
            PopulationBucket::Unknown => "Unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BubbleNode {
    pub label: String,
    /// Population for countries, summed population for buckets.
    pub value: f64,
    pub country: Option<usize>,
    pub children: Vec<BubbleNode>,
}

impl BubbleNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Countries without a population still need a visible bubble.
const UNKNOWN_POPULATION_WEIGHT: f64 = 1.0;

/// Root -> population bucket -> country.
pub fn build_hierarchy(atlas: &Atlas) -> BubbleNode {
    let mut buckets: Vec<BubbleNode> = PopulationBucket::ALL
        .iter()
        .map(|b| BubbleNode {
            label: b.label().to_string(),
            value: 0.0,
            country: None,
            children: Vec::new(),
        })
        .collect();

    for (idx, country) in atlas.countries().iter().enumerate() {
        let population = country.population();
        let slot = PopulationBucket::ALL
            .iter()
            .position(|&b| b == PopulationBucket::for_population(population))
            .unwrap_or(PopulationBucket::ALL.len() - 1);
        let value = population
            .map(|p| p as f64)
            .unwrap_or(UNKNOWN_POPULATION_WEIGHT);
        buckets[slot].value += value;
        buckets[slot].children.push(BubbleNode {
            label: country.name.clone(),
            value,
            country: Some(idx),
            children: Vec::new(),
        });
    }

    buckets.retain(|b| !b.children.is_empty());
    for bucket in &mut buckets {
        bucket
            .children
            .sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
    }
    BubbleNode {
        label: "World".to_string(),
        value: buckets.iter().map(|b| b.value).sum(),
        country: None,
        children: buckets,
    }
}

/// A circle in canvas coordinates, pointing at a child of the focused node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bubble {
    pub child: usize,
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

impl Bubble {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (dx, dy) = (x - self.x, y - self.y);
        dx * dx + dy * dy <= self.r * self.r
    }
}

const SPIRAL_STEP: f64 = 0.05;
const GAP: f64 = 0.02;

/// Packs circles with area proportional to value, largest first, along a
/// spiral, then fits the packing inside `[-half_width, half_width] x [-1, 1]`.
pub fn pack_bubbles(values: &[f64], half_width: f64) -> Vec<Bubble> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return Vec::new();
    }

    let mut placed: Vec<Bubble> = Vec::with_capacity(values.len());
    for child in order {
        let r = (values[child].max(0.0) / max).sqrt().max(0.04);
        let mut t = 0.0_f64;
        loop {
            let (x, y) = (t * SPIRAL_STEP * t.cos(), t * SPIRAL_STEP * t.sin());
            let clear = placed.iter().all(|b| {
                let (dx, dy) = (x - b.x, y - b.y);
                (dx * dx + dy * dy).sqrt() >= b.r + r + GAP
            });
            if clear {
                placed.push(Bubble { child, x, y, r });
                break;
            }
            t += 0.1;
        }
    }

    let extent_x = placed
        .iter()
        .map(|b| b.x.abs() + b.r)
        .fold(0.0_f64, f64::max);
    let extent_y = placed
        .iter()
        .map(|b| b.y.abs() + b.r)
        .fold(0.0_f64, f64::max);
    let fit = (half_width / extent_x).min(1.0 / extent_y) * 0.95;
    for bubble in &mut placed {
        bubble.x *= fit;
        bubble.y *= fit;
        bubble.r *= fit;
    }
    placed
}

/// The smallest bubble under a point.
pub fn hit_bubble(bubbles: &[Bubble], x: f64, y: f64) -> Option<usize> {
    bubbles
        .iter()
        .filter(|b| b.contains(x, y))
        .min_by(|a, b| a.r.total_cmp(&b.r))
        .map(|b| b.child)
}

/// Browsing state over the hierarchy: a focus path and a keyboard selection.
#[derive(Clone, Debug)]
pub struct BubbleView {
    root: BubbleNode,
    path: Vec<usize>,
    pub selected: usize,
}

impl BubbleView {
    pub fn new(root: BubbleNode) -> Self {
        Self {
            root,
            path: Vec::new(),
            selected: 0,
        }
    }

    pub fn root(&self) -> &BubbleNode {
        &self.root
    }

    pub fn focused(&self) -> &BubbleNode {
        let mut node = &self.root;
        for &i in &self.path {
            node = &node.children[i];
        }
        node
    }

    pub fn breadcrumb(&self) -> Vec<&str> {
        let mut node = &self.root;
        let mut crumbs = vec![node.label.as_str()];
        for &i in &self.path {
            node = &node.children[i];
            crumbs.push(node.label.as_str());
        }
        crumbs
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Zooms into a child that has children of its own. Leaves are only selected.
    pub fn focus_child(&mut self, child: usize) -> bool {
        let Some(node) = self.focused().children.get(child) else {
            return false;
        };
        if node.is_leaf() {
            self.selected = child;
            return false;
        }
        self.path.push(child);
        self.selected = 0;
        true
    }

    pub fn zoom_out(&mut self) {
        if let Some(child) = self.path.pop() {
            self.selected = child;
        }
    }

    pub fn reset(&mut self) {
        self.path.clear();
        self.selected = 0;
    }

    pub fn select_next(&mut self) {
        let n = self.focused().children.len();
        if n > 0 {
            self.selected = (self.selected + 1) % n;
        }
    }

    pub fn select_prev(&mut self) {
        let n = self.focused().children.len();
        if n > 0 {
            self.selected = (self.selected + n - 1) % n;
        }
    }

    pub fn enter_selected(&mut self) -> bool {
        self.focus_child(self.selected)
    }

    pub fn selected_node(&self) -> Option<&BubbleNode> {
        self.focused().children.get(self.selected)
    }

    /// A click on the packed layout: zoom into the bubble, or reset when it
    /// lands on empty space.
    pub fn click(&mut self, bubbles: &[Bubble], x: f64, y: f64) {
        match hit_bubble(bubbles, x, y) {
            Some(child) => {
                self.focus_child(child);
            }
            None => self.reset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::country::{Country, CountryFacts};

    fn atlas(populations: &[Option<u64>]) -> Atlas {
        Atlas::new(
            populations
                .iter()
                .enumerate()
                .map(|(i, &population)| {
                    Country::new(format!("C{i}"), Vec::new()).with_facts(CountryFacts {
                        population,
                        ..CountryFacts::default()
                    })
                })
                .collect(),
        )
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(PopulationBucket::for_population(Some(999_999)), PopulationBucket::Under1M);
        assert_eq!(
            PopulationBucket::for_population(Some(1_000_000)),
            PopulationBucket::From1MTo10M
        );
        assert_eq!(
            PopulationBucket::for_population(Some(50_000_000)),
            PopulationBucket::From50MTo100M
        );
        assert_eq!(PopulationBucket::for_population(Some(500_000_000)), PopulationBucket::Over500M);
        assert_eq!(PopulationBucket::for_population(None), PopulationBucket::Unknown);
    }

    #[test]
    fn test_every_country_lands_in_exactly_one_bucket() {
        let atlas = atlas(&[
            Some(500),
            Some(2_000_000),
            Some(3_000_000),
            None,
            Some(1_400_000_000),
        ]);
        let root = build_hierarchy(&atlas);

        let mut seen: Vec<usize> = root
            .children
            .iter()
            .flat_map(|b| b.children.iter().filter_map(|c| c.country))
            .collect();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);

        let labels: Vec<&str> = root.children.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["< 1M", "1M-10M", ">= 500M", "Unknown"]);

        let mid = &root.children[1];
        assert_eq!(mid.value, 5_000_000.0);
        assert_eq!(mid.children[0].label, "C2");
        assert_eq!(root.value, root.children.iter().map(|b| b.value).sum::<f64>());
    }

    #[test]
    fn test_packed_bubbles_do_not_overlap_and_fit() {
        let values = [100.0, 50.0, 25.0, 25.0, 10.0, 1.0];
        let bubbles = pack_bubbles(&values, 1.5);
        assert_eq!(bubbles.len(), values.len());
        for (i, a) in bubbles.iter().enumerate() {
            assert!(a.x.abs() + a.r <= 1.5 + 1e-9);
            assert!(a.y.abs() + a.r <= 1.0 + 1e-9);
            for b in &bubbles[i + 1..] {
                let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
                assert!(d >= a.r + b.r - 1e-9);
            }
        }
        let big = bubbles.iter().find(|b| b.child == 0).unwrap();
        let small = bubbles.iter().find(|b| b.child == 1).unwrap();
        assert!((big.r / small.r - 2.0_f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_focus_moves_in_and_out() {
        let atlas = atlas(&[Some(500), Some(2_000_000), None]);
        let mut view = BubbleView::new(build_hierarchy(&atlas));
        assert_eq!(view.focused().label, "World");

        assert!(view.focus_child(1));
        assert_eq!(view.focused().label, "1M-10M");
        assert_eq!(view.breadcrumb(), vec!["World", "1M-10M"]);

        assert!(!view.focus_child(0));
        assert_eq!(view.depth(), 1);

        view.zoom_out();
        assert_eq!(view.depth(), 0);
        assert_eq!(view.selected, 1);

        view.select_prev();
        view.select_prev();
        assert_eq!(view.selected, 2);
        assert!(view.enter_selected());
        assert_eq!(view.focused().label, "Unknown");
        view.reset();
        assert_eq!(view.focused().label, "World");
    }

    #[test]
    fn test_clicking_empty_space_resets_focus() {
        let atlas = atlas(&[Some(500), Some(2_000_000)]);
        let mut view = BubbleView::new(build_hierarchy(&atlas));
        let bubbles = pack_bubbles(
            &view.focused().children.iter().map(|c| c.value).collect::<Vec<_>>(),
            1.0,
        );
        let target = bubbles[0];
        view.click(&bubbles, target.x, target.y);
        assert_eq!(view.depth(), 1);
        view.click(&bubbles, 5.0, 5.0);
        assert_eq!(view.depth(), 0);
    }
}
