use std::f64::consts::TAU;

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::geo::projection::Viewport;
use crate::session::result::{QuizResult, RoundOutcome, Summary};
use crate::ui::components::bars::{BarList, BarRow};
use crate::ui::components::globe::dot_samples;
use crate::ui::theme::Theme;

const PIE_RADIUS: f64 = 0.9;

pub struct ResultsDashboard<'a> {
    pub result: Option<&'a QuizResult>,
    pub theme: &'a Theme,
}

impl<'a> ResultsDashboard<'a> {
    pub fn new(result: Option<&'a QuizResult>, theme: &'a Theme) -> Self {
        Self { result, theme }
    }
}

/// Which slice a canvas point falls in: `Some(true)` for the correct share,
/// `Some(false)` for the rest, `None` outside the disc. Slices start at twelve
/// o'clock and run clockwise.
pub fn pie_slice(x: f64, y: f64, correct_share: f64) -> Option<bool> {
    if x * x + y * y > PIE_RADIUS * PIE_RADIUS {
        return None;
    }
    let angle = x.atan2(y).rem_euclid(TAU);
    Some(angle < correct_share.clamp(0.0, 1.0) * TAU)
}

impl Widget for ResultsDashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let summary = Summary::from_result(self.result);
        let rounds: &[RoundOutcome] = self
            .result
            .map(|r| r.detailed_stats.as_slice())
            .unwrap_or(&[]);

        let block = Block::bordered()
            .title(" Game Complete ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(6),
                Constraint::Min(6),
                Constraint::Length(1),
            ])
            .split(inner);

        let mut title_spans = vec![Span::styled(
            "Results",
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )];
        if let Some(result) = self.result {
            title_spans.push(Span::styled(
                format!("  ({})", result.mode.label()),
                Style::default().fg(colors.text_muted()),
            ));
        }
        Paragraph::new(Line::from(title_spans))
            .alignment(Alignment::Center)
            .render(layout[0], buf);

        let rate_color = if summary.success_rate >= 80.0 {
            colors.success()
        } else if summary.success_rate >= 50.0 {
            colors.warning()
        } else {
            colors.error()
        };
        let row = |label: &'static str, value: String, color| {
            Line::from(vec![
                Span::styled(label, Style::default().fg(colors.fg())),
                Span::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            ])
        };
        let summary_lines = vec![
            row(
                "  Countries found:   ",
                format!("{}/{}", summary.countries_found, summary.question_count),
                colors.accent(),
            ),
            row("  Total attempts:    ", summary.total_attempts.to_string(), colors.fg()),
            row(
                "  Incorrect:         ",
                summary.incorrect.to_string(),
                if summary.incorrect == 0 {
                    colors.success()
                } else {
                    colors.error()
                },
            ),
            row("  Success rate:      ", format!("{:.2}%", summary.success_rate), rate_color),
            row("  Time taken:        ", format!("{:.2}s", summary.time_taken), colors.fg()),
            row(
                "  Avg per country:   ",
                format!("{:.2}s", summary.average_time_per_country),
                colors.fg(),
            ),
        ];
        Paragraph::new(summary_lines).render(layout[1], buf);

        let charts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(28),
                Constraint::Percentage(36),
                Constraint::Percentage(36),
            ])
            .split(layout[2]);

        self.render_pie(&summary, charts[0], buf);

        let attempts = rounds
            .iter()
            .map(|r| BarRow::new(r.country.clone(), r.attempts as f64, colors.accent()))
            .collect();
        BarList::new("Attempts per Country", attempts, self.theme)
            .format(|v| format!("{v:.0}"))
            .render(charts[1], buf);

        let mean = Summary::mean_round_time(rounds);
        let times = rounds
            .iter()
            .map(|r| {
                let color = if r.time_taken > mean {
                    colors.error()
                } else {
                    colors.success()
                };
                BarRow::new(r.country.clone(), r.time_taken, color)
            })
            .collect();
        BarList::new("Time per Country (s)", times, self.theme)
            .format(|v| format!("{v:.2}"))
            .render(charts[2], buf);

        Paragraph::new(Line::from(vec![
            Span::styled("  [r] Play again  ", Style::default().fg(colors.accent())),
            Span::styled("[m/Esc] Menu  ", Style::default().fg(colors.accent())),
            Span::styled("[q] Quit", Style::default().fg(colors.accent())),
        ]))
        .render(layout[3], buf);
    }
}

impl ResultsDashboard<'_> {
    fn render_pie(&self, summary: &Summary, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Correct vs Incorrect ")
            .border_style(Style::default().fg(colors.border()));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height < 3 {
            return;
        }

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(2)])
            .split(inner);

        let correct = summary.countries_found;
        let total = correct + summary.incorrect;
        let mut hit = Vec::new();
        let mut miss = Vec::new();
        if total > 0 {
            let share = correct as f64 / total as f64;
            let viewport = Viewport::new(sections[0]);
            for (x, y) in dot_samples(&viewport) {
                match pie_slice(x, y, share) {
                    Some(true) => hit.push((x, y)),
                    Some(false) => miss.push((x, y)),
                    None => {}
                }
            }
        }

        let viewport = Viewport::new(sections[0]);
        Canvas::default()
            .marker(Marker::Braille)
            .x_bounds(viewport.x_bounds)
            .y_bounds(viewport.y_bounds)
            .paint(|ctx| {
                ctx.draw(&Points {
                    coords: &hit,
                    color: colors.success(),
                });
                ctx.draw(&Points {
                    coords: &miss,
                    color: colors.error(),
                });
            })
            .render(sections[0], buf);

        Paragraph::new(vec![
            Line::from(Span::styled(
                format!(" \u{25cf} Correct {correct}"),
                Style::default().fg(colors.success()),
            )),
            Line::from(Span::styled(
                format!(" \u{25cf} Incorrect {}", summary.incorrect),
                Style::default().fg(colors.error()),
            )),
        ])
        .render(sections[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::quiz::GameMode;

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        (area.y..area.y + area.height)
            .map(|y| {
                (area.x..area.x + area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_pie_slice_quadrants() {
        // Half correct: the right half of the disc.
        assert_eq!(pie_slice(0.5, 0.0, 0.5), Some(true));
        assert_eq!(pie_slice(-0.5, 0.0, 0.5), Some(false));
        assert_eq!(pie_slice(0.0, 0.5, 0.0), Some(false));
        assert_eq!(pie_slice(-0.1, 0.5, 1.0), Some(true));
        assert_eq!(pie_slice(1.0, 1.0, 0.5), None);
    }

    #[test]
    fn test_missing_result_renders_zeros() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 100, 30);
        let mut buf = Buffer::empty(area);
        ResultsDashboard::new(None, &theme).render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("Countries found:   0/0"));
        assert!(text.contains("Success rate:      0.00%"));
        assert!(text.contains("Avg per country:   0.00s"));
    }

    #[test]
    fn test_result_numbers_use_two_decimals() {
        let theme = Theme::default();
        let result = QuizResult {
            total_attempts: 3,
            incorrect_attempts: 1,
            time_taken: 10.0,
            countries_found: 2,
            question_count: 2,
            mode: GameMode::Names,
            detailed_stats: vec![
                RoundOutcome {
                    country: "France".to_string(),
                    attempts: 2,
                    time_taken: 7.5,
                },
                RoundOutcome {
                    country: "Japan".to_string(),
                    attempts: 1,
                    time_taken: 2.5,
                },
            ],
            finished_at: chrono::Utc::now(),
        };
        let area = Rect::new(0, 0, 120, 30);
        let mut buf = Buffer::empty(area);
        ResultsDashboard::new(Some(&result), &theme).render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("Success rate:      66.67%"));
        assert!(text.contains("Avg per country:   5.00s"));
        assert!(text.contains("France"));
        assert!(text.contains("7.50"));
    }
}
