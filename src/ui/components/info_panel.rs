use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::geo::country::Country;
use crate::geo::lookup::CountryMetadata;
use crate::ui::components::bars::{BarList, BarRow};
use crate::ui::theme::Theme;

pub struct InfoPanel<'a> {
    pub country: Option<&'a Country>,
    pub capital: Option<&'a str>,
    pub metadata: Option<&'a CountryMetadata>,
    pub lookup_pending: bool,
    pub theme: &'a Theme,
}

impl<'a> InfoPanel<'a> {
    pub fn new(country: Option<&'a Country>, theme: &'a Theme) -> Self {
        Self {
            country,
            capital: None,
            metadata: None,
            lookup_pending: false,
            theme,
        }
    }

    pub fn capital(mut self, capital: Option<&'a str>) -> Self {
        self.capital = capital;
        self
    }

    pub fn metadata(mut self, metadata: Option<&'a CountryMetadata>, pending: bool) -> Self {
        self.metadata = metadata;
        self.lookup_pending = pending;
        self
    }
}

/// `67,750,000`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn or_unknown(value: Option<String>) -> String {
    value.unwrap_or_else(|| "Unknown".to_string())
}

impl Widget for InfoPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let Some(country) = self.country else {
            let block = Block::bordered()
                .title(" Country ")
                .border_style(Style::default().fg(colors.border()))
                .style(Style::default().bg(colors.bg()));
            Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    " Click a country to see its facts.",
                    Style::default().fg(colors.text_muted()),
                )),
            ])
            .block(block)
            .render(area, buf);
            return;
        };

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(4)])
            .split(area);

        let facts = &country.facts;
        let label =
            |text: &'static str| Span::styled(text, Style::default().fg(colors.text_muted()));
        let value = |text: String| Span::styled(text, Style::default().fg(colors.fg()));

        let mut title = vec![Span::styled(
            country.name.clone(),
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )];
        if let Some(flag) = self.metadata.and_then(|m| m.flag_emoji()) {
            title.push(Span::raw(format!(" {flag}")));
        }

        let languages = if facts.languages.is_empty() {
            None
        } else {
            Some(facts.languages.join(", "))
        };

        let mut lines = vec![
            Line::from(title),
            Line::from(""),
            Line::from(vec![
                label("Population: "),
                value(or_unknown(facts.population.map(group_thousands))),
            ]),
            Line::from(vec![
                label("Area:       "),
                value(or_unknown(
                    facts.area.map(|a| format!("{} km\u{b2}", group_thousands(a.round() as u64))),
                )),
            ]),
            Line::from(vec![
                label("Capital:    "),
                value(or_unknown(self.capital.map(str::to_string))),
            ]),
            Line::from(vec![
                label("Currency:   "),
                value(or_unknown(facts.currency_name.clone())),
            ]),
            Line::from(vec![label("Languages:  "), value(or_unknown(languages))]),
            Line::from(vec![
                label("Continent:  "),
                value(or_unknown(facts.continent.clone())),
            ]),
        ];

        match self.metadata {
            Some(meta) => {
                lines.push(Line::from(vec![label("Code:       "), value(meta.code.clone())]));
                lines.push(Line::from(vec![label("Flag:       "), value(meta.flag_url())]));
            }
            None if self.lookup_pending => {
                lines.push(Line::from(Span::styled(
                    "Looking up flag...",
                    Style::default().fg(colors.text_muted()),
                )));
            }
            None => {}
        }

        let block = Block::bordered()
            .title(" Country ")
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(block)
            .render(sections[0], buf);

        let rows = vec![
            BarRow::new(
                "Population (M)",
                facts.population.unwrap_or(0) as f64 / 1_000_000.0,
                colors.bar_filled(),
            ),
            BarRow::new(
                "Area (k km\u{b2})",
                facts.area.unwrap_or(0.0) / 1_000.0,
                colors.warning(),
            ),
        ];
        BarList::new("Population vs Area", rows, self.theme).render(sections[1], buf);
    }
}
