use std::time::Instant;

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::quiz::QuizSession;
use crate::session::result::{QuizResult, Summary};
use crate::ui::theme::Theme;

pub struct QuizSidebar<'a> {
    quiz: &'a QuizSession,
    last_result: Option<&'a QuizResult>,
    now: Instant,
    theme: &'a Theme,
}

impl<'a> QuizSidebar<'a> {
    pub fn new(
        quiz: &'a QuizSession,
        last_result: Option<&'a QuizResult>,
        now: Instant,
        theme: &'a Theme,
    ) -> Self {
        Self {
            quiz,
            last_result,
            now,
            theme,
        }
    }
}

/// Hits as a share of attempts so far.
pub fn running_accuracy(quiz: &QuizSession) -> f64 {
    if quiz.total_attempts() == 0 {
        return 0.0;
    }
    quiz.countries_found() as f64 / quiz.total_attempts() as f64 * 100.0
}

impl Widget for QuizSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints(if self.last_result.is_some() {
                [Constraint::Min(12), Constraint::Length(8)]
            } else {
                [Constraint::Min(12), Constraint::Length(0)]
            })
            .split(area);

        let accuracy = running_accuracy(self.quiz);
        let elapsed = self.quiz.elapsed(self.now).as_secs_f64();

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Found: ", Style::default().fg(colors.fg())),
                Span::styled(
                    format!("{}/{}", self.quiz.countries_found(), self.quiz.question_count()),
                    Style::default().fg(colors.accent()),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Attempts: ", Style::default().fg(colors.fg())),
                Span::styled(
                    self.quiz.total_attempts().to_string(),
                    Style::default().fg(colors.fg()),
                ),
            ]),
            Line::from(vec![
                Span::styled("Misses:   ", Style::default().fg(colors.fg())),
                Span::styled(
                    self.quiz.incorrect_attempts().to_string(),
                    Style::default().fg(colors.error()),
                ),
            ]),
            Line::from(vec![
                Span::styled("This round: ", Style::default().fg(colors.fg())),
                Span::styled(
                    self.quiz.round_attempts().to_string(),
                    Style::default().fg(colors.text_muted()),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Accuracy: ", Style::default().fg(colors.fg())),
                Span::styled(
                    format!("{accuracy:.1}%"),
                    Style::default().fg(if accuracy >= 80.0 {
                        colors.success()
                    } else if accuracy >= 50.0 {
                        colors.warning()
                    } else {
                        colors.error()
                    }),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Time: ", Style::default().fg(colors.fg())),
                Span::styled(format!("{elapsed:.1}s"), Style::default().fg(colors.fg())),
            ]),
        ];
        if let Some(wait) = self.quiz.next_round_in(self.now) {
            lines.push(Line::from(Span::styled(
                format!("Correct! Next in {:.1}s", wait.as_secs_f64()),
                Style::default().fg(colors.success()),
            )));
        }

        let block = Block::bordered()
            .title(" Current Game ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        Paragraph::new(lines).block(block).render(sections[0], buf);

        if let Some(last) = self.last_result {
            let summary = Summary::from_result(Some(last));
            let lines = vec![
                Line::from(vec![
                    Span::styled("Found: ", Style::default().fg(colors.fg())),
                    Span::styled(
                        format!("{}/{}", summary.countries_found, summary.question_count),
                        Style::default().fg(colors.accent()),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Success: ", Style::default().fg(colors.fg())),
                    Span::styled(
                        format!("{:.2}%", summary.success_rate),
                        Style::default().fg(colors.fg()),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Time: ", Style::default().fg(colors.fg())),
                    Span::styled(
                        format!("{:.2}s", summary.time_taken),
                        Style::default().fg(colors.fg()),
                    ),
                ]),
                Line::from(Span::styled(
                    format!(
                        "{} at {}",
                        last.mode.label(),
                        last.finished_at.with_timezone(&chrono::Local).format("%H:%M")
                    ),
                    Style::default().fg(colors.text_muted()),
                )),
            ];
            let block = Block::bordered()
                .title(" Last Game ")
                .border_style(Style::default().fg(colors.border()))
                .style(Style::default().bg(colors.bg()));
            Paragraph::new(lines).block(block).render(sections[1], buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::quiz::QuizParams;

    #[test]
    fn test_running_accuracy_guards_zero_attempts() {
        let quiz = QuizSession::new(QuizParams::default());
        assert_eq!(running_accuracy(&quiz), 0.0);
    }

    #[test]
    fn test_sidebar_renders_without_last_result() {
        let theme = Theme::default();
        let quiz = QuizSession::new(QuizParams::default());
        let area = Rect::new(0, 0, 30, 20);
        let mut buf = Buffer::empty(area);
        QuizSidebar::new(&quiz, None, Instant::now(), &theme).render(area, &mut buf);
        let row: String = (1..12).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert_eq!(row, "Found: 0/10");
    }

    #[test]
    fn test_sidebar_counts_down_after_hit() {
        use std::sync::Arc;
        use std::time::Duration;

        use crate::geo::country::{Country, Polygon};
        use crate::geo::dataset::Atlas;

        let ring = vec![(0.0, 0.0), (5.0, 0.0), (5.0, 5.0), (0.0, 5.0), (0.0, 0.0)];
        let atlas = Atlas::new(vec![Country::new("Solo", vec![Polygon::new(vec![ring])])]);
        let mut quiz = QuizSession::new(QuizParams::default());
        let t0 = Instant::now();
        quiz.atlas_loaded(Arc::new(atlas), t0);
        quiz.click(Some(0), t0);

        let theme = Theme::default();
        let area = Rect::new(0, 0, 40, 20);
        let mut buf = Buffer::empty(area);
        QuizSidebar::new(&quiz, None, t0 + Duration::from_millis(500), &theme)
            .render(area, &mut buf);
        let text: String = (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|(x, y)| buf[(x, y)].symbol().to_string())
            .collect();
        assert!(text.contains("Correct! Next in 0.5s"));
    }
}
