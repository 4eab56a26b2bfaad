// Input validation at the mutation boundary.
//
// The original UI let unvalidated form fields flow straight into request
// bodies. Here every mutation is checked before any network call, so a bad
// payload surfaces as a typed error instead of a server-side rejection.

use thiserror::Error;

use crate::types::Frequency;

use super::Mutation;

/// Maximum day offset accepted for a new task (one week ahead).
pub const MAX_TASK_OFFSET: u8 = 6;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("text must not be empty")]
    EmptyText,
    #[error("target must be at least 1")]
    ZeroTarget,
    #[error("specific-day habits need at least one weekday")]
    NoDaysSelected,
    #[error("weekday index {0} out of range (0..=6)")]
    DayOutOfRange(u8),
    #[error("task day offset {0} out of range (0..={MAX_TASK_OFFSET})")]
    OffsetOutOfRange(u8),
}

impl Mutation {
    /// Check the payload before it is sent.
    ///
    /// Id-only mutations are always well-formed; stale ids are the server's
    /// call to reject.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::AddHabit { text, target, frequency, days, .. } => {
                if text.trim().is_empty() {
                    return Err(ValidationError::EmptyText);
                }
                if *target == 0 {
                    return Err(ValidationError::ZeroTarget);
                }
                if *frequency == Frequency::Specific && days.is_empty() {
                    return Err(ValidationError::NoDaysSelected);
                }
                if let Some(&day) = days.iter().find(|&&d| d > 6) {
                    return Err(ValidationError::DayOutOfRange(day));
                }
                Ok(())
            }
            Self::AddTask { text, offset } => {
                if text.trim().is_empty() {
                    return Err(ValidationError::EmptyText);
                }
                if *offset > MAX_TASK_OFFSET {
                    return Err(ValidationError::OffsetOutOfRange(*offset));
                }
                Ok(())
            }
            Self::ToggleHabit { .. }
            | Self::ToggleTask { .. }
            | Self::DeleteHabit { .. }
            | Self::DeleteTask { .. }
            | Self::InviteToHabit { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_habit(text: &str, target: u32, frequency: Frequency, days: Vec<u8>) -> Mutation {
        Mutation::AddHabit { text: text.into(), target, frequency, days, friends: vec![] }
    }

    #[test]
    fn valid_daily_habit_passes() {
        assert_eq!(add_habit("Lesen", 1, Frequency::Daily, vec![]).validate(), Ok(()));
    }

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(
            add_habit("   ", 1, Frequency::Daily, vec![]).validate(),
            Err(ValidationError::EmptyText)
        );
        assert_eq!(
            Mutation::add_task("", None).validate(),
            Err(ValidationError::EmptyText)
        );
    }

    #[test]
    fn zero_target_is_rejected() {
        assert_eq!(
            add_habit("Lesen", 0, Frequency::Daily, vec![]).validate(),
            Err(ValidationError::ZeroTarget)
        );
    }

    #[test]
    fn specific_frequency_requires_days() {
        assert_eq!(
            add_habit("Sport", 1, Frequency::Specific, vec![]).validate(),
            Err(ValidationError::NoDaysSelected)
        );
        assert_eq!(add_habit("Sport", 1, Frequency::Specific, vec![1, 4]).validate(), Ok(()));
    }

    #[test]
    fn out_of_range_day_and_offset_are_rejected() {
        assert_eq!(
            add_habit("Sport", 1, Frequency::Specific, vec![2, 7]).validate(),
            Err(ValidationError::DayOutOfRange(7))
        );
        assert_eq!(
            Mutation::add_task("Einkaufen", Some(9)).validate(),
            Err(ValidationError::OffsetOutOfRange(9))
        );
    }

    #[test]
    fn id_only_mutations_are_always_valid() {
        assert_eq!(Mutation::ToggleHabit { id: -1 }.validate(), Ok(()));
        assert_eq!(Mutation::DeleteTask { id: 0 }.validate(), Ok(()));
    }
}
