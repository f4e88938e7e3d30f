use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Widget};

use crate::ui::theme::Theme;

/// A bordered gauge of `done` out of `total` rounds.
pub struct ProgressBar<'a> {
    pub label: String,
    pub done: u32,
    pub total: u32,
    pub theme: &'a Theme,
}

impl<'a> ProgressBar<'a> {
    pub fn new(label: &str, done: u32, total: u32, theme: &'a Theme) -> Self {
        Self {
            label: label.to_string(),
            done: done.min(total),
            total,
            theme,
        }
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.done as f64 / self.total as f64
        }
    }
}

impl Widget for ProgressBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" {} ", self.label))
            .border_style(Style::default().fg(colors.border()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let ratio = self.ratio();
        let filled_width = (ratio * inner.width as f64) as u16;
        let text = format!("{}/{} ({:.0}%)", self.done, self.total, ratio * 100.0);

        for x in inner.x..inner.x + inner.width {
            let style = if x < inner.x + filled_width {
                Style::default().fg(colors.bg()).bg(colors.bar_filled())
            } else {
                Style::default().fg(colors.fg()).bg(colors.bar_empty())
            };
            buf[(x, inner.y)].set_style(style);
        }

        let text_x = inner.x + (inner.width.saturating_sub(text.len() as u16)) / 2;
        buf.set_string(text_x, inner.y, &text, Style::default().fg(colors.fg()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_guards_zero_total() {
        let theme = Theme::default();
        assert_eq!(ProgressBar::new("x", 0, 0, &theme).ratio(), 0.0);
        assert_eq!(ProgressBar::new("x", 12, 10, &theme).ratio(), 1.0);
    }

    #[test]
    fn test_fill_covers_found_share() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 22, 3);
        let mut buf = Buffer::empty(area);
        ProgressBar::new("Found", 1, 4, &theme).render(area, &mut buf);
        let filled = (1..21)
            .filter(|&x| buf[(x, 1)].bg == theme.colors.bar_filled())
            .count();
        assert_eq!(filled, 5);
    }
}
