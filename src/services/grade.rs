// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! French climbing grade normalization.
//!
//! Grades like "6a+" map to a float: the base digit, plus 0.0/0.3/0.6 for
//! the letter a/b/c, plus 0.09 for a trailing "+". Values are rounded to
//! two decimals so that "6a+" compares equal to 6.09.

/// Offset added for the grade letter.
fn letter_offset(letter: char) -> Option<f64> {
    match letter {
        'a' => Some(0.0),
        'b' => Some(0.3),
        'c' => Some(0.6),
        _ => None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Normalize a grade string ("6a+", "7", "6.3") to a comparable float.
///
/// Returns `None` for empty or unrecognized input.
pub fn normalize_grade(raw: &str) -> Option<f64> {
    let s = raw.trim().to_lowercase();
    if s.is_empty() {
        return None;
    }
    if let Ok(value) = s.parse::<f64>() {
        return value.is_finite().then_some(value);
    }

    let mut chars = s.chars().peekable();
    let base = chars.next()?.to_digit(10)?;
    if !(3..=9).contains(&base) {
        return None;
    }

    while chars.next_if(|c| c.is_whitespace()).is_some() {}

    let letter = chars.next_if(|c| matches!(c, 'a' | 'b' | 'c'));
    let plus = chars.next_if_eq(&'+').is_some();
    if chars.next().is_some() {
        return None;
    }

    let mut value = base as f64 + letter.and_then(letter_offset).unwrap_or(0.0);
    if plus {
        value += 0.09;
    }
    Some(round2(value))
}

/// Where a spot's grade sits relative to a climber's minimum grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeBand {
    /// Within [min, min + 0.5]
    Match,
    /// Within (min + 0.5, min + 0.9]
    Challenge,
    /// Anything else, or no comparison possible
    Any,
}

/// Compare a spot grade against the requested minimum.
pub fn grade_band(spot_grade: Option<f64>, min_grade: Option<f64>) -> GradeBand {
    match (spot_grade, min_grade) {
        (Some(grade), Some(min)) if grade >= min && grade <= min + 0.5 => GradeBand::Match,
        (Some(grade), Some(min)) if grade > min + 0.5 && grade <= min + 0.9 => {
            GradeBand::Challenge
        }
        _ => GradeBand::Any,
    }
}
