use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::quiz::GameMode;
use crate::ui::theme::Theme;

const TITLE_HEIGHT: u16 = 5;
const ITEM_HEIGHT: u16 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    Play,
    Training,
    Browser,
    QuestionCount,
    GameMode,
    Quit,
}

impl MenuAction {
    pub fn is_selector(self) -> bool {
        matches!(self, MenuAction::QuestionCount | MenuAction::GameMode)
    }
}

pub struct MenuItem {
    pub key: String,
    pub label: String,
    pub description: String,
    pub action: MenuAction,
}

pub struct Menu<'a> {
    pub items: Vec<MenuItem>,
    pub selected: usize,
    pub theme: &'a Theme,
    pub question_count: u32,
    pub mode: GameMode,
}

impl<'a> Menu<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        let item = |key: &str, label: &str, description: &str, action| MenuItem {
            key: key.to_string(),
            label: label.to_string(),
            description: description.to_string(),
            action,
        };
        Self {
            items: vec![
                item("1", "Play", "Find the highlighted country on the globe", MenuAction::Play),
                item("t", "Training", "Explore countries and their facts", MenuAction::Training),
                item(
                    "b",
                    "Country Browser",
                    "Population bubbles, continents and comparisons",
                    MenuAction::Browser,
                ),
                item("<>", "Questions", "Rounds per game", MenuAction::QuestionCount),
                item("<>", "Game Mode", "What the prompt shows", MenuAction::GameMode),
                item("q", "Quit", "Leave globequiz", MenuAction::Quit),
            ],
            selected: 0,
            theme,
            question_count: crate::session::quiz::DEFAULT_QUESTION_COUNT,
            mode: GameMode::default(),
        }
    }

    pub fn next(&mut self) {
        self.selected = (self.selected + 1) % self.items.len();
    }

    pub fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = self.items.len() - 1;
        }
    }

    pub fn selected_action(&self) -> MenuAction {
        self.items[self.selected].action
    }

    /// Index of the item drawn at a terminal cell, for a menu rendered into `area`.
    pub fn item_at(&self, area: Rect, col: u16, row: u16) -> Option<usize> {
        self.item_rects(area)
            .into_iter()
            .position(|r| col >= r.x && col < r.x + r.width && row >= r.y && row < r.y + r.height)
    }

    fn item_rects(&self, area: Rect) -> Vec<Rect> {
        let inner = Block::bordered().inner(area);
        let top = inner.y + TITLE_HEIGHT + 1;
        let bottom = inner.y + inner.height;
        (0..self.items.len() as u16)
            .map(|i| top + i * ITEM_HEIGHT)
            .take_while(|&y| y + ITEM_HEIGHT <= bottom)
            .map(|y| Rect::new(inner.x, y, inner.width, ITEM_HEIGHT))
            .collect()
    }

    fn selector_value(&self, action: MenuAction) -> Option<String> {
        match action {
            MenuAction::QuestionCount => Some(self.question_count.to_string()),
            MenuAction::GameMode => Some(self.mode.label().to_string()),
            _ => None,
        }
    }
}

impl Widget for &Menu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let title_lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "globequiz",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Find the country on the globe",
                Style::default().fg(colors.fg()),
            )),
            Line::from(""),
        ];
        let title_area = Rect::new(inner.x, inner.y, inner.width, TITLE_HEIGHT.min(inner.height));
        Paragraph::new(title_lines)
            .alignment(Alignment::Center)
            .render(title_area, buf);

        for (i, rect) in self.item_rects(area).into_iter().enumerate() {
            let item = &self.items[i];
            let is_selected = i == self.selected;
            let indicator = if is_selected { ">" } else { " " };

            let label_style = Style::default()
                .fg(if is_selected {
                    colors.accent()
                } else {
                    colors.fg()
                })
                .add_modifier(if is_selected {
                    Modifier::BOLD
                } else {
                    Modifier::empty()
                });

            let mut label_spans = vec![Span::styled(
                format!(" {indicator} [{key}] {label}", key = item.key, label = item.label),
                label_style,
            )];
            if let Some(value) = self.selector_value(item.action) {
                label_spans.push(Span::styled(
                    format!("  < {value} >"),
                    Style::default().fg(if is_selected {
                        colors.warning()
                    } else {
                        colors.text_muted()
                    }),
                ));
            }

            let lines = vec![
                Line::from(label_spans),
                Line::from(Span::styled(
                    format!("     {}", item.description),
                    Style::default().fg(colors.text_muted()),
                )),
            ];
            Paragraph::new(lines).render(rect, buf);
        }
    }
}
