use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::question::Question;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub id: String,
    pub date: DateTime<Utc>,
    pub test_title: String,
    pub score: usize,
    pub total: usize,
}

impl ExamResult {
    pub fn from_exam(
        questions: &[Question],
        answers: &HashMap<String, usize>,
        test_title: &str,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            test_title: test_title.to_string(),
            score: score(questions, answers),
            total: questions.len(),
        }
    }

    pub fn percentage(&self) -> f64 {
        percentage(self.score, self.total)
    }
}

/// Number of questions whose recorded answer equals the correct index.
pub fn score(questions: &[Question], answers: &HashMap<String, usize>) -> usize {
    questions
        .iter()
        .filter(|q| q.is_correct(answers.get(&q.id).copied()))
        .count()
}

pub fn percentage(score: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    score as f64 / total as f64 * 100.0
}

/// Results screen verdict, Dutch first as on the real exam.
pub fn feedback_message(percentage: f64) -> &'static str {
    if percentage >= 80.0 {
        "Uitstekend! (Excellent)"
    } else if percentage >= 60.0 {
        "Goed gedaan! (Well done)"
    } else if percentage >= 50.0 {
        "Voldoende (Pass)"
    } else {
        "Oefening nodig (Needs practice)"
    }
}
