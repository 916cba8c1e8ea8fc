//! Confidence scoring for a finished investigation.
//!
//! Deterministic over (category, checks): same evidence, same number. Errors
//! during investigation cap the score below 70 so an operator can filter on
//! "confident" diagnoses without seeing degraded runs.

use crate::domain::{Category, CheckStatus, InvestigationCheck};

const BASE_MATCHED: i32 = 40;
const BASE_OTHER: i32 = 20;
const PER_DEFINITIVE: i32 = 12;
const PER_WARN: i32 = -6;
const ERROR_CAP: i32 = 69;

pub fn score(category: Category, checks: &[InvestigationCheck]) -> u8 {
    let mut score = if category == Category::Other {
        BASE_OTHER
    } else {
        BASE_MATCHED
    };

    let mut degraded = false;
    for check in checks {
        match check.status {
            s if s.is_definitive() => score += PER_DEFINITIVE,
            CheckStatus::Warn => score += PER_WARN,
            CheckStatus::Error => degraded = true,
            _ => {}
        }
    }

    if degraded {
        score = score.min(ERROR_CAP);
    }
    score.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn checks(statuses: &[CheckStatus]) -> Vec<InvestigationCheck> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, s)| InvestigationCheck::new(format!("check-{i}"), *s, ""))
            .collect()
    }

    #[rstest]
    #[case::no_checks(Category::InvalidMenuItem, &[], 40)]
    #[case::other_starts_lower(Category::Other, &[], 20)]
    #[case::definitive_adds(Category::InvalidMenuItem, &[CheckStatus::Pass, CheckStatus::Fail], 64)]
    #[case::warn_subtracts(Category::InvalidMenuItem, &[CheckStatus::Pass, CheckStatus::Warn], 46)]
    #[case::skip_is_neutral(Category::InvalidMenuItem, &[CheckStatus::Pass, CheckStatus::Skip], 52)]
    #[case::clamped_at_100(
        Category::InvalidMenuItem,
        &[CheckStatus::Pass; 6],
        100
    )]
    fn scoring_table(
        #[case] category: Category,
        #[case] statuses: &[CheckStatus],
        #[case] expected: u8,
    ) {
        assert_eq!(score(category, &checks(statuses)), expected);
    }

    #[test]
    fn error_check_caps_below_seventy() {
        let many_passes = checks(&[
            CheckStatus::Pass,
            CheckStatus::Pass,
            CheckStatus::Pass,
            CheckStatus::Pass,
            CheckStatus::Error,
        ]);
        assert_eq!(score(Category::InvalidMenuItem, &many_passes), 69);
    }

    #[test]
    fn error_cap_does_not_raise_low_scores() {
        let degraded = checks(&[CheckStatus::Error]);
        assert_eq!(score(Category::Other, &degraded), 20);
    }

    #[test]
    fn never_negative() {
        let warns = checks(&[CheckStatus::Warn; 5]);
        assert_eq!(score(Category::Other, &warns), 0);
    }
}
