use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Widget};

use crate::ui::theme::Theme;

pub struct BarRow {
    pub label: String,
    pub value: f64,
    pub color: Color,
}

impl BarRow {
    pub fn new(label: impl Into<String>, value: f64, color: Color) -> Self {
        Self {
            label: label.into(),
            value,
            color,
        }
    }
}

/// Horizontal bars, one row each, scaled against the largest value.
pub struct BarList<'a> {
    pub title: String,
    pub rows: Vec<BarRow>,
    pub theme: &'a Theme,
    /// Formats the value printed after the label.
    pub format: fn(f64) -> String,
}

impl<'a> BarList<'a> {
    pub fn new(title: &str, rows: Vec<BarRow>, theme: &'a Theme) -> Self {
        Self {
            title: title.to_string(),
            rows,
            theme,
            format: |v| format!("{v:.2}"),
        }
    }

    pub fn format(mut self, format: fn(f64) -> String) -> Self {
        self.format = format;
        self
    }
}

impl Widget for BarList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(Line::from(Span::styled(
                format!(" {} ", self.title),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )))
            .border_style(Style::default().fg(colors.border()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }
        if self.rows.is_empty() {
            buf.set_string(
                inner.x + 1,
                inner.y,
                "No data",
                Style::default().fg(colors.text_muted()),
            );
            return;
        }

        let label_width = self
            .rows
            .iter()
            .map(|r| r.label.chars().count())
            .max()
            .unwrap_or(0)
            .min(inner.width as usize / 3);
        let max_value = self
            .rows
            .iter()
            .map(|r| r.value)
            .fold(0.0f64, f64::max);

        for (i, row) in self.rows.iter().take(inner.height as usize).enumerate() {
            let y = inner.y + i as u16;
            let label: String = row.label.chars().take(label_width).collect();
            let text = format!(" {label:<label_width$} {:>9} ", (self.format)(row.value));
            let text_len = text.chars().count() as u16;
            buf.set_string(inner.x, y, &text, Style::default().fg(colors.fg()));

            let bar_space = inner.width.saturating_sub(text_len) as usize;
            if bar_space == 0 || max_value <= 0.0 {
                continue;
            }
            let filled = ((row.value / max_value) * bar_space as f64).round() as usize;
            let bar = "\u{2588}".repeat(filled.min(bar_space));
            buf.set_string(inner.x + text_len, y, &bar, Style::default().fg(row.color));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_list_scales_to_largest_value() {
        let theme = Theme::default();
        let rows = vec![
            BarRow::new("a", 10.0, Color::Red),
            BarRow::new("b", 5.0, Color::Red),
        ];
        let area = Rect::new(0, 0, 40, 4);
        let mut buf = Buffer::empty(area);
        BarList::new("Test", rows, &theme)
            .format(|v| format!("{v:.0}"))
            .render(area, &mut buf);

        let count = |y: u16| {
            (0..area.width)
                .filter(|&x| buf[(x, y)].symbol() == "\u{2588}")
                .count()
        };
        let (first, second) = (count(1), count(2));
        assert!(first > 0);
        assert_eq!(second, (first as f64 / 2.0).round() as usize);
    }

    #[test]
    fn test_bar_list_empty_rows() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 30, 3);
        let mut buf = Buffer::empty(area);
        BarList::new("Empty", Vec::new(), &theme).render(area, &mut buf);
        let line: String = (2..9).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert_eq!(line, "No data");
    }
}
