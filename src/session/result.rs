use chrono::{DateTime, Utc};

use crate::session::quiz::GameMode;

/// One target found: how many clicks and how long it took.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundOutcome {
    pub country: String,
    pub attempts: u32,
    pub time_taken: f64,
}

/// Handed from the quiz to the results screen. Never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct QuizResult {
    pub total_attempts: u32,
    pub incorrect_attempts: u32,
    /// Seconds from the first target to the end of the session.
    pub time_taken: f64,
    pub countries_found: u32,
    pub question_count: u32,
    pub mode: GameMode,
    pub detailed_stats: Vec<RoundOutcome>,
    pub finished_at: DateTime<Utc>,
}

/// Numbers shown on the results screen. Every ratio is guarded so a missing or
/// empty result renders as zeros.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    pub total_attempts: u32,
    pub countries_found: u32,
    pub question_count: u32,
    pub incorrect: u32,
    pub time_taken: f64,
    pub success_rate: f64,
    pub average_time_per_country: f64,
}

impl Summary {
    pub fn from_result(result: Option<&QuizResult>) -> Self {
        let Some(result) = result else {
            return Self::default();
        };
        let success_rate = if result.total_attempts == 0 {
            0.0
        } else {
            result.countries_found as f64 / result.total_attempts as f64 * 100.0
        };
        let average_time_per_country = if result.countries_found == 0 {
            0.0
        } else {
            result.time_taken / result.countries_found as f64
        };
        Self {
            total_attempts: result.total_attempts,
            countries_found: result.countries_found,
            question_count: result.question_count,
            incorrect: result.total_attempts.saturating_sub(result.countries_found),
            time_taken: result.time_taken,
            success_rate,
            average_time_per_country,
        }
    }

    /// Mean seconds per round from the per-round breakdown, used to color the time chart.
    pub fn mean_round_time(rounds: &[RoundOutcome]) -> f64 {
        if rounds.is_empty() {
            0.0
        } else {
            rounds.iter().map(|r| r.time_taken).sum::<f64>() / rounds.len() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(total: u32, found: u32, secs: f64) -> QuizResult {
        QuizResult {
            total_attempts: total,
            incorrect_attempts: total - found,
            time_taken: secs,
            countries_found: found,
            question_count: 5,
            mode: GameMode::Names,
            detailed_stats: Vec::new(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_result_is_all_zero() {
        let summary = Summary::from_result(None);
        assert_eq!(summary, Summary::default());
        assert_eq!(format!("{:.2}", summary.success_rate), "0.00");
        assert_eq!(format!("{:.2}", summary.average_time_per_country), "0.00");
    }

    #[test]
    fn test_zero_attempts_do_not_divide() {
        let summary = Summary::from_result(Some(&result(0, 0, 12.0)));
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.average_time_per_country, 0.0);
        assert!(summary.success_rate.is_finite());
    }

    #[test]
    fn test_derived_values() {
        let summary = Summary::from_result(Some(&result(8, 5, 25.0)));
        assert_eq!(summary.incorrect, 3);
        assert_eq!(format!("{:.2}", summary.success_rate), "62.50");
        assert_eq!(format!("{:.2}", summary.average_time_per_country), "5.00");
    }

    #[test]
    fn test_mean_round_time_of_empty_is_zero() {
        assert_eq!(Summary::mean_round_time(&[]), 0.0);
        let rounds = vec![
            RoundOutcome {
                country: "A".into(),
                attempts: 1,
                time_taken: 2.0,
            },
            RoundOutcome {
                country: "B".into(),
                attempts: 3,
                time_taken: 4.0,
            },
        ];
        assert_eq!(Summary::mean_round_time(&rounds), 3.0);
    }
}
