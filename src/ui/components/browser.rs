use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Points};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::engine::compare::{COMPARE_LIMIT, Comparison};
use crate::engine::continents::{ContinentTree, TreeRow};
use crate::engine::hierarchy::{Bubble, BubbleView, build_hierarchy, hit_bubble, pack_bubbles};
use crate::geo::dataset::Atlas;
use crate::geo::projection::Viewport;
use crate::ui::components::bars::{BarList, BarRow};
use crate::ui::components::globe::dot_samples;
use crate::ui::components::info_panel::group_thousands;
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BrowserTab {
    #[default]
    Bubbles,
    Continents,
    Compare,
}

impl BrowserTab {
    pub const ALL: [BrowserTab; 3] = [
        BrowserTab::Bubbles,
        BrowserTab::Continents,
        BrowserTab::Compare,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BrowserTab::Bubbles => "[1] Bubbles",
            BrowserTab::Continents => "[2] Continents",
            BrowserTab::Compare => "[3] Compare",
        }
    }

    pub fn next(self) -> Self {
        match self {
            BrowserTab::Bubbles => BrowserTab::Continents,
            BrowserTab::Continents => BrowserTab::Compare,
            BrowserTab::Compare => BrowserTab::Bubbles,
        }
    }

    pub fn prev(self) -> Self {
        self.next().next()
    }
}

/// Everything the country browser shows, derived from the atlas on entry.
pub struct Browser {
    pub tab: BrowserTab,
    pub bubbles: BubbleView,
    pub tree: ContinentTree,
    pub comparison: Comparison,
    pub compare_scroll: usize,
}

impl Browser {
    pub fn new(atlas: &Atlas) -> Self {
        Self {
            tab: BrowserTab::default(),
            bubbles: BubbleView::new(build_hierarchy(atlas)),
            tree: ContinentTree::build(atlas),
            comparison: Comparison::build(atlas),
            compare_scroll: 0,
        }
    }

    /// Circles for the children of the focused node, laid out on `canvas`.
    pub fn bubble_layout(&self, canvas: Rect) -> Vec<Bubble> {
        let values: Vec<f64> = self
            .bubbles
            .focused()
            .children
            .iter()
            .map(|c| c.value)
            .collect();
        pack_bubbles(&values, Viewport::new(canvas).x_bounds[1])
    }

    /// A click on the bubble canvas at a terminal cell.
    pub fn click_bubbles(&mut self, canvas: Rect, col: u16, row: u16) {
        let Some((x, y)) = Viewport::new(canvas).cell_to_canvas(col, row) else {
            return;
        };
        let layout = self.bubble_layout(canvas);
        self.bubbles.click(&layout, x, y);
    }

    pub fn scroll_compare(&mut self, down: bool) {
        let max = self.comparison.population.len().min(COMPARE_LIMIT).saturating_sub(1);
        self.compare_scroll = if down {
            (self.compare_scroll + 1).min(max)
        } else {
            self.compare_scroll.saturating_sub(1)
        };
    }
}

pub struct BrowserLayout {
    pub tabs: Rect,
    pub body: Rect,
    pub footer: Rect,
}

impl BrowserLayout {
    pub fn new(area: Rect) -> Self {
        let inner = Block::bordered().inner(area);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(inner);
        Self {
            tabs: rows[0],
            body: rows[1],
            footer: rows[2],
        }
    }

    /// The bordered bubble chart and the detail panel beside it.
    pub fn bubble_regions(&self) -> (Rect, Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(self.body);
        (cols[0], cols[1])
    }

    pub fn bubble_canvas(&self) -> Rect {
        Block::bordered().inner(self.bubble_regions().0)
    }
}

pub struct BrowserView<'a> {
    pub browser: &'a Browser,
    pub atlas: &'a Atlas,
    pub theme: &'a Theme,
}

impl<'a> BrowserView<'a> {
    pub fn new(browser: &'a Browser, atlas: &'a Atlas, theme: &'a Theme) -> Self {
        Self {
            browser,
            atlas,
            theme,
        }
    }
}

impl Widget for BrowserView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Country Browser ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        block.render(area, buf);
        let layout = BrowserLayout::new(area);

        let tab_spans: Vec<Span> = BrowserTab::ALL
            .iter()
            .flat_map(|&tab| {
                let style = if tab == self.browser.tab {
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
                } else {
                    Style::default().fg(colors.text_muted())
                };
                vec![Span::styled(format!(" {} ", tab.label()), style), Span::raw("  ")]
            })
            .collect();
        Paragraph::new(Line::from(tab_spans)).render(layout.tabs, buf);

        let footer = match self.browser.tab {
            BrowserTab::Bubbles => {
                "  [Esc] Back  [Tab] Next tab  [arrows] Select  [Enter] Zoom in  [Backspace] Zoom out  [0] Reset"
            }
            BrowserTab::Continents => {
                "  [Esc] Back  [Tab] Next tab  [j/k] Move  [Enter] Expand  [e/c] Expand/collapse all"
            }
            BrowserTab::Compare => "  [Esc] Back  [Tab] Next tab  [j/k] Scroll",
        };
        Paragraph::new(Line::from(Span::styled(
            footer,
            Style::default().fg(colors.text_muted()),
        )))
        .render(layout.footer, buf);

        match self.browser.tab {
            BrowserTab::Bubbles => self.render_bubbles(&layout, buf),
            BrowserTab::Continents => self.render_continents(layout.body, buf),
            BrowserTab::Compare => self.render_compare(layout.body, buf),
        }
    }
}

impl BrowserView<'_> {
    fn render_bubbles(&self, layout: &BrowserLayout, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let view = &self.browser.bubbles;
        let (chart, detail) = layout.bubble_regions();
        let canvas = layout.bubble_canvas();

        let breadcrumb = view.breadcrumb().join(" > ");
        Block::bordered()
            .title(format!(" {breadcrumb} "))
            .border_style(Style::default().fg(colors.border()))
            .render(chart, buf);
        if canvas.width == 0 || canvas.height == 0 {
            return;
        }

        let focused = view.focused();
        let bubbles = self.browser.bubble_layout(canvas);
        let max_value = focused
            .children
            .iter()
            .map(|c| c.value)
            .fold(0.0f64, f64::max);

        let viewport = Viewport::new(canvas);
        let mut fills: Vec<Vec<(f64, f64)>> = vec![Vec::new(); focused.children.len()];
        for (x, y) in dot_samples(&viewport) {
            if let Some(child) = hit_bubble(&bubbles, x, y) {
                fills[child].push((x, y));
            }
        }
        let fill_color = |child: usize| {
            if child == view.selected {
                colors.land_selected()
            } else if max_value > 0.0 {
                colors.population_color((focused.children[child].value / max_value).sqrt())
            } else {
                colors.land()
            }
        };
        let cells_per_unit = canvas.width as f64 / (viewport.x_bounds[1] - viewport.x_bounds[0]);

        Canvas::default()
            .marker(Marker::Braille)
            .x_bounds(viewport.x_bounds)
            .y_bounds(viewport.y_bounds)
            .paint(|ctx| {
                for (child, coords) in fills.iter().enumerate() {
                    ctx.draw(&Points {
                        coords,
                        color: fill_color(child),
                    });
                }
                ctx.layer();
                for bubble in &bubbles {
                    ctx.draw(&Circle {
                        x: bubble.x,
                        y: bubble.y,
                        radius: bubble.r,
                        color: if bubble.child == view.selected {
                            colors.accent()
                        } else {
                            colors.border()
                        },
                    });
                    let max_chars = (bubble.r * 2.0 * cells_per_unit) as usize;
                    if max_chars >= 3 {
                        let label: String = focused.children[bubble.child]
                            .label
                            .chars()
                            .take(max_chars)
                            .collect();
                        let offset = label.chars().count() as f64 / 2.0 / cells_per_unit;
                        ctx.print(
                            bubble.x - offset,
                            bubble.y,
                            Span::styled(label, Style::default().fg(colors.fg()).bg(colors.bg())),
                        );
                    }
                }
            })
            .render(canvas, buf);

        let mut lines = vec![Line::from(Span::styled(
            focused.label.clone(),
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        ))];
        lines.push(Line::from(Span::styled(
            format!("{} entries", focused.children.len()),
            Style::default().fg(colors.text_muted()),
        )));
        lines.push(Line::from(""));
        if let Some(node) = view.selected_node() {
            lines.push(Line::from(Span::styled(
                format!("> {}", node.label),
                Style::default().fg(colors.land_selected()),
            )));
            lines.push(Line::from(format!(
                "  Population: {}",
                group_thousands(node.value as u64)
            )));
            if let Some(country) = node.country.and_then(|i| self.atlas.get(i)) {
                if let Some(capital) = &country.facts.capital {
                    lines.push(Line::from(format!("  Capital: {capital}")));
                }
                if let Some(continent) = &country.facts.continent {
                    lines.push(Line::from(format!("  Continent: {continent}")));
                }
            } else {
                lines.push(Line::from(format!("  Countries: {}", node.children.len())));
            }
        }
        Paragraph::new(lines)
            .style(Style::default().fg(colors.fg()))
            .block(
                Block::bordered()
                    .title(" Selection ")
                    .border_style(Style::default().fg(colors.border())),
            )
            .render(detail, buf);
    }

    fn render_continents(&self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let tree = &self.browser.tree;

        let block = Block::bordered()
            .title(" Continents ")
            .border_style(Style::default().fg(colors.border()));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 {
            return;
        }

        let rows = tree.rows();
        let visible = inner.height as usize;
        let start = tree.cursor.saturating_sub(visible.saturating_sub(1));

        for (offset, row) in rows.iter().skip(start).take(visible).enumerate() {
            let y = inner.y + offset as u16;
            let is_cursor = start + offset == tree.cursor;
            let text = match *row {
                TreeRow::Continent { group } => {
                    let g = &tree.groups[group];
                    let arrow = if g.expanded { "\u{25be}" } else { "\u{25b8}" };
                    format!(
                        " {arrow} {} ({} countries, pop. {})",
                        g.name,
                        g.countries.len(),
                        group_thousands(g.population)
                    )
                }
                TreeRow::Country { country, .. } => match self.atlas.get(country) {
                    Some(c) => format!(
                        "     {}  {}",
                        c.name,
                        c.population().map(group_thousands).unwrap_or_else(|| "?".to_string())
                    ),
                    None => continue,
                },
            };
            let mut style = Style::default().fg(match row {
                TreeRow::Continent { .. } => colors.accent(),
                TreeRow::Country { .. } => colors.fg(),
            });
            if is_cursor {
                style = style.bg(colors.accent_dim()).add_modifier(Modifier::BOLD);
            }
            let text: String = text.chars().take(inner.width as usize).collect();
            buf.set_string(inner.x, y, &text, style);
        }
    }

    fn render_compare(&self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let comparison = &self.browser.comparison;
        let scroll = self.browser.compare_scroll;

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);
        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);
        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        let population = comparison
            .population
            .iter()
            .skip(scroll)
            .map(|(name, p)| BarRow::new(name.clone(), p / 1_000_000.0, colors.bar_filled()))
            .collect();
        BarList::new("Population (millions)", population, self.theme).render(top[0], buf);

        let area_rows = comparison
            .area
            .iter()
            .skip(scroll)
            .map(|(name, a)| BarRow::new(name.clone(), a / 1_000.0, colors.warning()))
            .collect();
        BarList::new("Area (thousand km\u{b2})", area_rows, self.theme).render(top[1], buf);

        let currencies = comparison
            .currencies
            .iter()
            .map(|(name, n)| BarRow::new(name.clone(), *n as f64, colors.success()))
            .collect();
        BarList::new("Currencies", currencies, self.theme)
            .format(|v| format!("{v:.0}"))
            .render(bottom[0], buf);

        let languages = comparison
            .languages
            .iter()
            .map(|(name, n)| BarRow::new(name.clone(), *n as f64, colors.accent()))
            .collect();
        BarList::new("Languages", languages, self.theme)
            .format(|v| format!("{v:.0}"))
            .render(bottom[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::country::{Country, CountryFacts};

    fn atlas() -> Atlas {
        let c = |name: &str, population: u64, continent: &str| {
            Country::new(name, Vec::new()).with_facts(CountryFacts {
                population: Some(population),
                continent: Some(continent.to_string()),
                currency_name: Some("Euro".to_string()),
                ..CountryFacts::default()
            })
        };
        Atlas::new(vec![
            c("A", 500_000, "Europe"),
            c("B", 5_000_000, "Europe"),
            c("C", 70_000_000, "Asia"),
        ])
    }

    #[test]
    fn test_tab_cycle() {
        assert_eq!(BrowserTab::Bubbles.next(), BrowserTab::Continents);
        assert_eq!(BrowserTab::Compare.next(), BrowserTab::Bubbles);
        assert_eq!(BrowserTab::Bubbles.prev(), BrowserTab::Compare);
    }

    #[test]
    fn test_clicking_bubble_center_zooms_in() {
        let atlas = atlas();
        let mut browser = Browser::new(&atlas);
        let canvas = Rect::new(1, 1, 60, 20);
        let layout = browser.bubble_layout(canvas);
        assert_eq!(layout.len(), browser.bubbles.focused().children.len());

        // Click the cell at the centre of the largest bubble.
        let largest = layout
            .iter()
            .max_by(|a, b| a.r.total_cmp(&b.r))
            .copied()
            .unwrap();
        let viewport = Viewport::new(canvas);
        let [xmin, xmax] = viewport.x_bounds;
        let col = canvas.x + ((largest.x - xmin) / (xmax - xmin) * canvas.width as f64) as u16;
        let row = canvas.y + ((1.0 - largest.y) / 2.0 * canvas.height as f64) as u16;
        browser.click_bubbles(canvas, col, row);
        assert_eq!(browser.bubbles.depth(), 1);

        // Outside the canvas nothing changes.
        browser.click_bubbles(canvas, 0, 0);
        assert_eq!(browser.bubbles.depth(), 1);
    }

    #[test]
    fn test_compare_scroll_is_clamped() {
        let atlas = atlas();
        let mut browser = Browser::new(&atlas);
        browser.scroll_compare(false);
        assert_eq!(browser.compare_scroll, 0);
        for _ in 0..10 {
            browser.scroll_compare(true);
        }
        assert_eq!(browser.compare_scroll, 2);
    }

    #[test]
    fn test_renders_every_tab() {
        let atlas = atlas();
        let theme = Theme::default();
        let mut browser = Browser::new(&atlas);
        for tab in BrowserTab::ALL {
            browser.tab = tab;
            let area = Rect::new(0, 0, 100, 30);
            let mut buf = Buffer::empty(area);
            BrowserView::new(&browser, &atlas, &theme).render(area, &mut buf);
            let header: String = (0..area.width)
                .map(|x| buf[(x, 1)].symbol().to_string())
                .collect();
            assert!(header.contains(tab.label()));
        }
    }
}
