use super::common::*;
use crate::assessment::catalog::{Catalog, PIG_CATALOG, POULTRY_CATALOG};
use crate::assessment::domain::{AnswerSet, RiskTier};
use crate::assessment::scoring::{score, ScoringError};
use crate::auth::FarmType;

#[test]
fn all_positive_answers_give_best_score_and_low_tier() {
    for catalog in [&PIG_CATALOG, &POULTRY_CATALOG] {
        let report = score(&answers_with_yes(catalog, catalog.len()), catalog)
            .expect("complete answer set scores");
        assert_eq!(report.compliance_score, 100);
        assert_eq!(report.risk_score, 0);
        assert_eq!(report.risk_tier, RiskTier::Low);
    }
}

#[test]
fn all_negative_answers_give_worst_score_and_high_tier() {
    let report =
        score(&answers_with_yes(&PIG_CATALOG, 0), &PIG_CATALOG).expect("complete set scores");
    assert_eq!(report.compliance_score, 0);
    assert_eq!(report.risk_score, 100);
    assert_eq!(report.risk_tier, RiskTier::High);
}

#[test]
fn scores_stay_within_bounds_for_every_yes_count() {
    for yes in 0..=POULTRY_CATALOG.len() {
        let report = score(&answers_with_yes(&POULTRY_CATALOG, yes), &POULTRY_CATALOG)
            .expect("complete set scores");
        assert!(report.compliance_score <= 100);
        assert!(report.risk_score <= 100);
        assert_eq!(report.compliance_score + report.risk_score, 100);
    }
}

#[test]
fn seven_of_ten_lands_on_the_medium_side_of_the_boundary() {
    // risk 30 is Medium, not Low; the < 30 threshold is exclusive.
    let report = score(&answers_with_yes(&POULTRY_CATALOG, 7), &POULTRY_CATALOG)
        .expect("complete set scores");
    assert_eq!(report.compliance_score, 70);
    assert_eq!(report.risk_score, 30);
    assert_eq!(report.risk_tier, RiskTier::Medium);
}

#[test]
fn tier_boundaries_are_exact() {
    assert_eq!(RiskTier::from_risk_score(0), RiskTier::Low);
    assert_eq!(RiskTier::from_risk_score(29), RiskTier::Low);
    assert_eq!(RiskTier::from_risk_score(30), RiskTier::Medium);
    assert_eq!(RiskTier::from_risk_score(59), RiskTier::Medium);
    assert_eq!(RiskTier::from_risk_score(60), RiskTier::High);
    assert_eq!(RiskTier::from_risk_score(100), RiskTier::High);
}

#[test]
fn compliance_is_monotone_in_the_yes_count() {
    let mut previous = 0;
    for yes in 0..=PIG_CATALOG.len() {
        let report = score(&answers_with_yes(&PIG_CATALOG, yes), &PIG_CATALOG)
            .expect("complete set scores");
        assert!(
            report.compliance_score >= previous,
            "flipping an answer to yes lowered the compliance score"
        );
        previous = report.compliance_score;
    }
}

#[test]
fn flipping_any_single_answer_never_decreases_compliance() {
    for flip in 0..POULTRY_CATALOG.len() {
        let mut answers = answers_with_yes(&POULTRY_CATALOG, 0);
        let before = score(&answers, &POULTRY_CATALOG).expect("scores");
        let id = POULTRY_CATALOG.questions[flip].id.to_string();
        answers.insert(id, true);
        let after = score(&answers, &POULTRY_CATALOG).expect("scores");
        assert!(after.compliance_score >= before.compliance_score);
    }
}

#[test]
fn empty_catalog_is_rejected_not_divided_by_zero() {
    let empty = Catalog {
        farm_type: FarmType::Pig,
        questions: &[],
    };
    match score(&AnswerSet::new(), &empty) {
        Err(ScoringError::InvalidCatalog) => {}
        other => panic!("expected InvalidCatalog, got {other:?}"),
    }
}

#[test]
fn partial_answer_set_is_rejected() {
    let partial = answers_with_yes(&POULTRY_CATALOG, 4)
        .into_iter()
        .take(6)
        .collect();
    match score(&partial, &POULTRY_CATALOG) {
        Err(ScoringError::IncompleteAnswerSet {
            expected: 10,
            actual: 6,
        }) => {}
        other => panic!("expected IncompleteAnswerSet, got {other:?}"),
    }
}

#[test]
fn answer_for_a_foreign_question_is_rejected() {
    let mut answers = answers_with_yes(&POULTRY_CATALOG, 10);
    answers.remove("staff_training");
    answers.insert("footbath".to_string(), true);
    match score(&answers, &POULTRY_CATALOG) {
        Err(ScoringError::UnknownQuestion { id }) => assert_eq!(id, "footbath"),
        other => panic!("expected UnknownQuestion, got {other:?}"),
    }
}

#[test]
fn both_farm_type_has_no_catalog() {
    assert!(Catalog::for_farm_type(FarmType::Both).is_none());
    assert!(Catalog::for_farm_type(FarmType::Pig).is_some());
    assert!(Catalog::for_farm_type(FarmType::Poultry).is_some());
}
