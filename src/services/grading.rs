// src/services/grading.rs

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::attempt::SubmittedAnswer;
use crate::models::quiz::QuestionWithOptions;

/// The graded result for one submitted answer.
#[derive(Debug, Clone, Serialize)]
pub struct GradedAnswer {
    pub question_id: i64,
    pub selected_option_ids: Vec<i64>,
    pub is_correct: bool,
    pub points_earned: i64,
}

/// The outcome of grading a full submission.
#[derive(Debug, Clone, Serialize)]
pub struct GradingOutcome {
    /// Sum of points earned.
    pub score: i64,
    /// Sum of points over answered questions only.
    pub total_points: i64,
    /// 0-100, two decimals.
    pub percentage: f64,
    pub passed: bool,
    pub answers: Vec<GradedAnswer>,
}

/// Rounds to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Grades a submitted answer set against a quiz definition.
///
/// A question is correct only if the selected option set exactly equals the
/// set of options marked correct; there is no partial credit. Answers
/// referencing questions that do not belong to the quiz are skipped.
/// Questions left unanswered contribute nothing to either side of the
/// ratio: `total_points` counts points attempted, not points possible.
pub fn grade_submission(
    questions: &[QuestionWithOptions],
    answers: &[SubmittedAnswer],
    passing_score: i32,
) -> GradingOutcome {
    let mut score = 0i64;
    let mut total_points = 0i64;
    let mut graded = Vec::new();

    for answer in answers {
        let Some(entry) = questions
            .iter()
            .find(|q| q.question.id == answer.question_id)
        else {
            continue;
        };

        total_points += entry.question.points;

        let correct_set: BTreeSet<i64> = entry
            .options
            .iter()
            .filter(|o| o.is_correct)
            .map(|o| o.id)
            .collect();
        let selected_set: BTreeSet<i64> = answer.selected_option_ids.iter().copied().collect();

        let is_correct = correct_set == selected_set;
        let points_earned = if is_correct { entry.question.points } else { 0 };
        score += points_earned;

        graded.push(GradedAnswer {
            question_id: entry.question.id,
            selected_option_ids: answer.selected_option_ids.clone(),
            is_correct,
            points_earned,
        });
    }

    let percentage = if total_points > 0 {
        round2(score as f64 / total_points as f64 * 100.0)
    } else {
        0.0
    };
    let passed = percentage >= passing_score as f64;

    GradingOutcome {
        score,
        total_points,
        percentage,
        passed,
        answers: graded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::{QuizOption, QuizQuestion};

    fn question(id: i64, points: i64, options: Vec<(i64, bool)>) -> QuestionWithOptions {
        QuestionWithOptions {
            question: QuizQuestion {
                id,
                quiz_id: 1,
                question: format!("Question {}", id),
                question_type: "multi-select".to_string(),
                sort_order: id as i32,
                points,
                explanation: None,
            },
            options: options
                .into_iter()
                .map(|(oid, is_correct)| QuizOption {
                    id: oid,
                    question_id: id,
                    text: format!("Option {}", oid),
                    is_correct,
                    sort_order: oid as i32,
                })
                .collect(),
        }
    }

    fn answer(question_id: i64, selected: &[i64]) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id,
            selected_option_ids: selected.to_vec(),
        }
    }

    #[test]
    fn exact_match_scores_full_points() {
        let questions = vec![question(1, 5, vec![(10, true), (11, false), (12, true)])];
        let outcome = grade_submission(&questions, &[answer(1, &[12, 10])], 70);

        assert_eq!(outcome.score, 5);
        assert_eq!(outcome.total_points, 5);
        assert_eq!(outcome.percentage, 100.0);
        assert!(outcome.passed);
        assert!(outcome.answers[0].is_correct);
    }

    #[test]
    fn subset_superset_and_disjoint_score_zero() {
        let questions = vec![question(1, 5, vec![(10, true), (11, false), (12, true)])];

        for selected in [&[10][..], &[10, 11, 12][..], &[11][..]] {
            let outcome = grade_submission(&questions, &[answer(1, selected)], 70);
            assert_eq!(outcome.score, 0, "selected {:?}", selected);
            assert!(!outcome.answers[0].is_correct);
            assert_eq!(outcome.answers[0].points_earned, 0);
        }
    }

    #[test]
    fn selection_order_is_irrelevant() {
        let questions = vec![question(1, 2, vec![(10, true), (11, true)])];
        let a = grade_submission(&questions, &[answer(1, &[10, 11])], 70);
        let b = grade_submission(&questions, &[answer(1, &[11, 10])], 70);
        assert!(a.answers[0].is_correct);
        assert!(b.answers[0].is_correct);
    }

    #[test]
    fn unknown_question_ids_are_skipped() {
        let questions = vec![question(1, 5, vec![(10, true)])];
        let answers = vec![answer(1, &[10]), answer(999, &[1, 2])];
        let outcome = grade_submission(&questions, &answers, 70);

        assert_eq!(outcome.answers.len(), 1);
        assert_eq!(outcome.total_points, 5);
        assert_eq!(outcome.percentage, 100.0);
    }

    #[test]
    fn unanswered_questions_do_not_count_toward_denominator() {
        let questions = vec![
            question(1, 10, vec![(10, true), (11, false)]),
            question(2, 10, vec![(20, true), (21, false)]),
            question(3, 10, vec![(30, true), (31, false)]),
        ];
        // Only question 1 answered.
        let outcome = grade_submission(&questions, &[answer(1, &[10])], 70);

        assert_eq!(outcome.score, 10);
        assert_eq!(outcome.total_points, 10);
        assert_eq!(outcome.percentage, 100.0);
    }

    #[test]
    fn one_of_two_correct_is_fifty_percent_and_fails_at_seventy() {
        let questions = vec![
            question(1, 10, vec![(10, true), (11, false)]),
            question(2, 10, vec![(20, true), (21, false)]),
        ];
        let answers = vec![answer(1, &[10]), answer(2, &[21])];
        let outcome = grade_submission(&questions, &answers, 70);

        assert_eq!(outcome.score, 10);
        assert_eq!(outcome.total_points, 20);
        assert_eq!(outcome.percentage, 50.0);
        assert!(!outcome.passed);
    }

    #[test]
    fn empty_submission_yields_zero_percent_without_panic() {
        let questions = vec![question(1, 5, vec![(10, true)])];
        let outcome = grade_submission(&questions, &[], 70);

        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.total_points, 0);
        assert_eq!(outcome.percentage, 0.0);
        assert!(!outcome.passed);
    }

    #[test]
    fn passing_is_inclusive_of_the_threshold() {
        let questions = vec![
            question(1, 7, vec![(10, true)]),
            question(2, 3, vec![(20, true)]),
        ];
        let answers = vec![answer(1, &[10]), answer(2, &[21])];
        let outcome = grade_submission(&questions, &answers, 70);

        assert_eq!(outcome.percentage, 70.0);
        assert!(outcome.passed);
    }

    #[test]
    fn percentage_rounds_half_up_to_two_decimals() {
        // 1/3 -> 33.333... -> 33.33; 2/3 -> 66.666... -> 66.67
        let questions = vec![
            question(1, 1, vec![(10, true)]),
            question(2, 1, vec![(20, true)]),
            question(3, 1, vec![(30, true)]),
        ];
        let one_third = grade_submission(
            &questions,
            &[answer(1, &[10]), answer(2, &[21]), answer(3, &[31])],
            70,
        );
        assert_eq!(one_third.percentage, 33.33);

        let two_thirds = grade_submission(
            &questions,
            &[answer(1, &[10]), answer(2, &[20]), answer(3, &[31])],
            70,
        );
        assert_eq!(two_thirds.percentage, 66.67);
    }

    #[test]
    fn round2_rounds_to_two_decimals() {
        assert_eq!(round2(1.0 / 3.0 * 100.0), 33.33);
        assert_eq!(round2(2.0 / 3.0 * 100.0), 66.67);
        assert_eq!(round2(2.0 / 4.0 * 100.0), 50.0);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(100.0), 100.0);
    }
}
