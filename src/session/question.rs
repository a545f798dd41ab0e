use serde::{Deserialize, Serialize};

/// One multiple-choice exam item with its English translation.
///
/// Field names serialize in camelCase: that is the shape the generation
/// service is asked to produce and the shape stored in the mistake log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub id: String,
    pub question_text: String,
    pub question_text_en: String,
    pub options: Vec<String>,
    pub options_en: Vec<String>,
    pub correct_option_index: usize,
    pub explanation: String,
    pub explanation_en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl Question {
    /// An answer counts only when it is present and equals the correct index.
    pub fn is_correct(&self, answer: Option<usize>) -> bool {
        answer == Some(self.correct_option_index)
    }

    pub fn topic_label(&self) -> &str {
        self.topic.as_deref().unwrap_or("General")
    }

    pub fn text(&self, english: bool) -> &str {
        if english {
            &self.question_text_en
        } else {
            &self.question_text
        }
    }

    pub fn option(&self, idx: usize, english: bool) -> Option<&str> {
        let list = if english { &self.options_en } else { &self.options };
        list.get(idx).map(String::as_str)
    }

    pub fn explanation(&self, english: bool) -> &str {
        if english {
            &self.explanation_en
        } else {
            &self.explanation
        }
    }
}

#[cfg(test)]
pub(crate) fn sample(id: &str, correct: usize) -> Question {
    Question {
        id: id.to_string(),
        question_text: format!("Vraag {id}?"),
        question_text_en: format!("Question {id}?"),
        options: vec!["A".into(), "B".into(), "C".into()],
        options_en: vec!["A".into(), "B".into(), "C".into()],
        correct_option_index: correct,
        explanation: "Uitleg".into(),
        explanation_en: "Explanation".into(),
        topic: Some("Werk".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unanswered_and_out_of_range_are_incorrect() {
        let q = sample("q1", 1);
        assert!(!q.is_correct(None));
        assert!(!q.is_correct(Some(7)));
        assert!(q.is_correct(Some(1)));
    }

    #[test]
    fn deserializes_service_shape_without_id() {
        let json = r#"{
            "questionText": "Wat doe je?",
            "questionTextEn": "What do you do?",
            "options": ["a", "b", "c"],
            "optionsEn": ["a", "b", "c"],
            "correctOptionIndex": 2,
            "explanation": "x",
            "explanationEn": "x"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert!(q.id.is_empty());
        assert_eq!(q.correct_option_index, 2);
        assert_eq!(q.topic_label(), "General");
    }
}
