//! Community activity events and the points they pay.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::PointSchedule;
use crate::ledger::PointSource;
use crate::quality::QualityTier;

/// Something a member did that the platform reports to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ActivityEvent {
    UpvoteReceived,
    /// An answer was posted and scored.
    AnswerPosted { quality: QualityTier },
    BestAnswerSelected,
    QuestionAsked,
    /// A streak day completed. Repeats for the same day still pay; the
    /// platform reports each day once.
    StreakDayCompleted { day: NaiveDate },
    ReferralCompleted,
    EventAttended,
}

/// A ledger award derived from an event.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityReward {
    pub amount: u64,
    pub source: PointSource,
    pub description: String,
}

impl ActivityEvent {
    /// The award this event earns, or `None` when the schedule pays nothing.
    pub fn reward(&self, schedule: &PointSchedule) -> Option<ActivityReward> {
        let (amount, source, description) = match self {
            Self::UpvoteReceived => (schedule.upvote_received, PointSource::Vote, "Upvote received".to_string()),
            Self::AnswerPosted { quality } => (
                schedule.answer_points(*quality),
                PointSource::Answer,
                format!("Answer posted ({quality})"),
            ),
            Self::BestAnswerSelected => (
                schedule.best_answer,
                PointSource::BestAnswer,
                "Answer chosen as best".to_string(),
            ),
            Self::QuestionAsked => (schedule.question_asked, PointSource::Question, "Question asked".to_string()),
            Self::StreakDayCompleted { day } => (
                schedule.streak_day,
                PointSource::StreakDay { day: *day },
                format!("Streak day {day}"),
            ),
            Self::ReferralCompleted => (schedule.referral, PointSource::Referral, "Referral completed".to_string()),
            Self::EventAttended => (
                schedule.event_attendance,
                PointSource::EventAttendance,
                "Event attended".to_string(),
            ),
        };
        (amount > 0).then_some(ActivityReward {
            amount,
            source,
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1. Answer rewards follow quality
    #[test]
    fn test_answer_reward_by_quality() {
        let schedule = PointSchedule::default();
        let poor = ActivityEvent::AnswerPosted { quality: QualityTier::Poor }.reward(&schedule).unwrap();
        let top = ActivityEvent::AnswerPosted { quality: QualityTier::Outstanding }.reward(&schedule).unwrap();
        assert_eq!(poor.amount, 5);
        assert_eq!(top.amount, 25);
        assert_eq!(top.source, PointSource::Answer);
    }

    // 2. A zero schedule entry pays nothing
    #[test]
    fn test_zero_schedule_entry() {
        let schedule = PointSchedule {
            upvote_received: 0,
            ..PointSchedule::default()
        };
        assert!(ActivityEvent::UpvoteReceived.reward(&schedule).is_none());
    }

    // 3. Events read from tagged JSON
    #[test]
    fn test_event_json() {
        let event: ActivityEvent =
            serde_json::from_str(r#"{"event":"streak_day_completed","day":"2026-05-04"}"#).unwrap();
        let reward = event.reward(&PointSchedule::default()).unwrap();
        assert_eq!(reward.amount, 5);
        assert!(matches!(reward.source, PointSource::StreakDay { .. }));
    }
}
