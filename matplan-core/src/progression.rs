//! Progression targets and their validation.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::{
    MAX_ASCENSION_RANK, MAX_SKILL_LEVEL, MIN_LEVEL, MIN_SKILL_LEVEL, SKILL_TRACK_COUNT,
};

/// Current and desired level of one skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillTrack {
    pub current: u8,
    pub target: u8,
}

impl SkillTrack {
    #[must_use]
    pub const fn new(current: u8, target: u8) -> Self {
        Self { current, target }
    }

    /// Levels left on this track, zero when the target is not above current.
    #[must_use]
    pub const fn remaining(&self) -> u8 {
        self.target.saturating_sub(self.current)
    }
}

impl Default for SkillTrack {
    fn default() -> Self {
        Self::new(MIN_SKILL_LEVEL, MIN_SKILL_LEVEL)
    }
}

/// Current and desired upgrade state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionTarget {
    pub current_level: u32,
    pub target_level: u32,
    pub current_ascension: u8,
    pub target_ascension: u8,
    #[serde(default)]
    pub skills: [SkillTrack; SKILL_TRACK_COUNT],
}

impl Default for ProgressionTarget {
    fn default() -> Self {
        Self {
            current_level: MIN_LEVEL,
            target_level: MIN_LEVEL,
            current_ascension: 0,
            target_ascension: 0,
            skills: [SkillTrack::default(); SKILL_TRACK_COUNT],
        }
    }
}

impl ProgressionTarget {
    /// Whether every axis is already at or past its target.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.target_level <= self.current_level
            && self.target_ascension <= self.current_ascension
            && self.skills.iter().all(|track| track.remaining() == 0)
    }

    /// Check ordering and range constraints, collecting one error per field.
    ///
    /// # Errors
    ///
    /// Returns every field that is out of range or whose target is below its current value.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        if self.current_level < MIN_LEVEL {
            errors.push(FieldError::new(
                Field::CurrentLevel,
                ValidationError::BelowMinimum {
                    min: MIN_LEVEL,
                    value: self.current_level,
                },
            ));
        }
        if self.target_level < self.current_level {
            errors.push(FieldError::new(
                Field::TargetLevel,
                ValidationError::TargetBelowCurrent {
                    current: self.current_level,
                    target: self.target_level,
                },
            ));
        }

        for (field, value) in [
            (Field::CurrentAscension, self.current_ascension),
            (Field::TargetAscension, self.target_ascension),
        ] {
            if value > MAX_ASCENSION_RANK {
                errors.push(FieldError::new(
                    field,
                    ValidationError::OutOfRange {
                        min: 0,
                        max: u32::from(MAX_ASCENSION_RANK),
                        value: u32::from(value),
                    },
                ));
            }
        }
        if self.target_ascension < self.current_ascension {
            errors.push(FieldError::new(
                Field::TargetAscension,
                ValidationError::TargetBelowCurrent {
                    current: u32::from(self.current_ascension),
                    target: u32::from(self.target_ascension),
                },
            ));
        }

        for (idx, track) in self.skills.iter().enumerate() {
            for (field, value) in [
                (Field::SkillCurrent(idx), track.current),
                (Field::SkillTarget(idx), track.target),
            ] {
                if !(MIN_SKILL_LEVEL..=MAX_SKILL_LEVEL).contains(&value) {
                    errors.push(FieldError::new(
                        field,
                        ValidationError::OutOfRange {
                            min: u32::from(MIN_SKILL_LEVEL),
                            max: u32::from(MAX_SKILL_LEVEL),
                            value: u32::from(value),
                        },
                    ));
                }
            }
            if track.target < track.current {
                errors.push(FieldError::new(
                    Field::SkillTarget(idx),
                    ValidationError::TargetBelowCurrent {
                        current: u32::from(track.current),
                        target: u32::from(track.target),
                    },
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }
}

/// Input field a validation error is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    CurrentLevel,
    TargetLevel,
    CurrentAscension,
    TargetAscension,
    SkillCurrent(usize),
    SkillTarget(usize),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CurrentLevel => f.write_str("current level"),
            Self::TargetLevel => f.write_str("target level"),
            Self::CurrentAscension => f.write_str("current ascension"),
            Self::TargetAscension => f.write_str("target ascension"),
            Self::SkillCurrent(idx) => write!(f, "skill {} current", idx + 1),
            Self::SkillTarget(idx) => write!(f, "skill {} target", idx + 1),
        }
    }
}

/// Errors raised when a progression target violates its constraints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("target {target} is below current {current}")]
    TargetBelowCurrent { current: u32, target: u32 },
    #[error("must be between {min} and {max} (got {value})")]
    OutOfRange { min: u32, max: u32, value: u32 },
    #[error("must be at least {min} (got {value})")]
    BelowMinimum { min: u32, value: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {error}")]
pub struct FieldError {
    pub field: Field,
    pub error: ValidationError,
}

impl FieldError {
    #[must_use]
    pub const fn new(field: Field, error: ValidationError) -> Self {
        Self { field, error }
    }
}

/// Every field-level problem found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} invalid field(s): {}", .0.len(), join_errors(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    /// Errors attached to a single field, for inline display.
    pub fn for_field(&self, field: Field) -> impl Iterator<Item = &FieldError> {
        self.0.iter().filter(move |err| err.field == field)
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
