//! # Field Limits
//!
//! Size and range limits enforced at the domain boundary, plus the small
//! helpers that check them. Lengths are counted in characters.

use crate::{ConformaError, Result};

/// Project code: 2..=50 characters.
pub const PROJECT_CODE_LEN: (usize, usize) = (2, 50);

/// Project and program names: 3..=150 characters.
pub const NAME_LEN: (usize, usize) = (3, 150);

/// Titles of tasks, documents, notifications, analyses: 3..=255 characters.
pub const TITLE_LEN: (usize, usize) = (3, 255);

/// User e-mail: 3..=255 characters.
pub const EMAIL_LEN: (usize, usize) = (3, 255);

/// Criterion code: 1..=50 characters.
pub const CRITERION_CODE_LEN: (usize, usize) = (1, 50);

/// Inclusive range for a project's progress percentage.
pub const PROGRESS_RANGE: (i64, i64) = (0, 100);

/// Inclusive range accepted for an audit year.
pub const AUDIT_YEAR_RANGE: (i64, i64) = (2000, 2100);

/// Number of "why" answers in a 5-whys analysis.
pub const WHY_COUNT: usize = 5;

/// Check that `value` has between `min` and `max` characters.
pub fn check_len(field: &str, value: &str, (min, max): (usize, usize)) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ConformaError::Validation(format!(
            "O campo {} deve ter entre {} e {} caracteres.",
            field, min, max
        )));
    }
    Ok(())
}

/// Check that `value` lies inside the inclusive `range`.
pub fn check_range(field: &str, value: i64, (min, max): (i64, i64)) -> Result<()> {
    if value < min || value > max {
        return Err(ConformaError::Validation(format!(
            "O campo {} deve estar entre {} e {}.",
            field, min, max
        )));
    }
    Ok(())
}

/// Check that an optional counter is not negative.
pub fn check_non_negative(field: &str, value: Option<i64>) -> Result<()> {
    match value {
        Some(v) if v < 0 => Err(ConformaError::Validation(format!(
            "O campo {} nao pode ser negativo.",
            field
        ))),
        _ => Ok(()),
    }
}

/// A text counts as filled when it has non-whitespace content.
#[must_use]
pub fn is_filled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

// =============================================================================
// TESTS
// =============================================================================
