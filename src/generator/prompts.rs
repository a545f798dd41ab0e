use crate::session::mistakes::{self, MistakeLog};
use crate::session::question::Question;

/// Mistakes summarized in a study plan request.
const STUDY_PLAN_MISTAKES: usize = 5;

pub fn questions_prompt(topic_context: &str, count: usize) -> String {
    format!(
        r#"You are an expert tutor for the Dutch Civic Integration Exam (Inburgeringsexamen), specifically the KNM (Kennis van de Nederlandse Maatschappij) module.

Your task is to generate exactly {count} multiple-choice questions in DUTCH.

Topic Focus: {topic_context}

Style Guide:
- Similar to real CBR exams and practice materials.
- Use simple B1 level Dutch suitable for exam candidates.
- Questions should be a mix of situational ("Wat doe je?") and factual knowledge.

Output Requirements:
- Return a JSON Array of {count} objects.
- Each object must have these exact keys:
  - "id" (string)
  - "questionText" (string, in Dutch)
  - "questionTextEn" (string, English translation)
  - "options" (array of 3-4 strings, in Dutch)
  - "optionsEn" (array of 3-4 strings, English translation, same order as "options")
  - "correctOptionIndex" (number, 0-based index into "options")
  - "explanation" (string, in Dutch)
  - "explanationEn" (string, English translation)
  - "topic" (string, short category name)"#
    )
}

pub fn study_plan_prompt(log: &MistakeLog) -> String {
    let summary = mistakes::ranked(log)
        .into_iter()
        .take(STUDY_PLAN_MISTAKES)
        .map(|m| {
            format!(
                "- {}: {} (Failed {} times)",
                m.question.topic_label(),
                m.question.question_text,
                m.error_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let summary = if summary.is_empty() {
        "The student has no recorded mistakes yet.".to_string()
    } else {
        summary
    };

    format!(
        r#"Act as a friendly Dutch KNM exam coach.
Analyze these top mistakes made by the student:
{summary}

Create a short, personalized, bulleted study plan (max 150 words) in English.
Focus on the specific cultural themes they are missing (e.g., if they miss health questions, explain why that's important).
Be encouraging."#
    )
}

pub fn deep_dive_prompt(question: &Question) -> String {
    format!(
        r#"For the Dutch KNM exam question: "{}" (Topic: {})

Provide a "Deep Dive" cultural context snippet (max 3 sentences) in English.
Explain the *why* behind this Dutch rule or norm.
Start with "In the Netherlands...""#,
        question.question_text,
        question.topic_label()
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::session::mistakes::record_incorrect;
    use crate::session::question::sample;

    #[test]
    fn question_prompt_names_count_and_topic() {
        let prompt = questions_prompt("Housing, renting", 15);
        assert!(prompt.contains("exactly 15 multiple-choice"));
        assert!(prompt.contains("Topic Focus: Housing, renting"));
        assert!(prompt.contains("\"correctOptionIndex\""));
    }

    #[test]
    fn study_plan_lists_top_five_by_count() {
        let mut log = MistakeLog::new();
        let now = Utc::now();
        for i in 0..7 {
            let q = sample(&format!("q{i}"), 0);
            for _ in 0..=i {
                record_incorrect(&mut log, &q, now);
            }
        }
        let prompt = study_plan_prompt(&log);
        assert!(prompt.contains("Vraag q6? (Failed 7 times)"));
        assert!(prompt.contains("Vraag q2? (Failed 3 times)"));
        assert!(!prompt.contains("Vraag q1?"));
        assert!(prompt.contains("- Werk: "));
    }

    #[test]
    fn study_plan_without_mistakes() {
        let prompt = study_plan_prompt(&MistakeLog::new());
        assert!(prompt.contains("no recorded mistakes yet"));
    }

    #[test]
    fn deep_dive_quotes_the_question() {
        let prompt = deep_dive_prompt(&sample("q9", 0));
        assert!(prompt.contains("\"Vraag q9?\" (Topic: Werk)"));
        assert!(prompt.contains("max 3 sentences"));
    }
}
