use serde_json::Value;

use crate::generator::GenerationError;
use crate::session::question::Question;

pub const MIN_OPTIONS: usize = 3;
pub const MAX_OPTIONS: usize = 4;

/// Pull the answer text out of a `generateContent` response body
/// (`candidates[0].content.parts[0].text`).
pub fn extract_text(body: &Value) -> Result<String, GenerationError> {
    body.pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or(GenerationError::NoText)
}

/// Parse the model's text into questions. The top level must be an array, or
/// an object carrying a `questions` or `items` array. Every item is checked;
/// one bad item fails the whole batch.
pub fn decode_questions(text: &str) -> Result<Vec<Question>, GenerationError> {
    let data: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| GenerationError::Format(format!("not valid JSON: {e}")))?;

    let items = match data {
        Value::Array(items) => items,
        Value::Object(mut map) => match (map.remove("questions"), map.remove("items")) {
            (Some(Value::Array(items)), _) | (_, Some(Value::Array(items))) => items,
            _ => return Err(GenerationError::Format("not an array".to_string())),
        },
        _ => return Err(GenerationError::Format("not an array".to_string())),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let question: Question = serde_json::from_value(item)
                .map_err(|e| GenerationError::Format(format!("item {idx}: {e}")))?;
            validate(&question).map_err(|msg| GenerationError::Format(format!("item {idx}: {msg}")))?;
            Ok(question)
        })
        .collect()
}

fn validate(question: &Question) -> Result<(), String> {
    let n = question.options.len();
    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&n) {
        return Err(format!("expected {MIN_OPTIONS}-{MAX_OPTIONS} options, got {n}"));
    }
    if question.options_en.len() != n {
        return Err(format!(
            "{} English options for {n} options",
            question.options_en.len()
        ));
    }
    if question.correct_option_index >= n {
        return Err(format!(
            "correct option {} out of range",
            question.correct_option_index
        ));
    }
    if question.question_text.trim().is_empty() {
        return Err("empty question text".to_string());
    }
    Ok(())
}

/// Models sometimes wrap JSON in a markdown fence even in JSON mode.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn item(options: usize, options_en: usize, correct: i64) -> Value {
        json!({
            "questionText": "Wat doe je?",
            "questionTextEn": "What do you do?",
            "options": vec!["x"; options],
            "optionsEn": vec!["x"; options_en],
            "correctOptionIndex": correct,
            "explanation": "Omdat.",
            "explanationEn": "Because.",
            "topic": "Werk"
        })
    }

    #[test]
    fn extracts_nested_text() {
        let body = json!({"candidates": [{"content": {"parts": [{"text": "[]"}]}}]});
        assert_eq!(extract_text(&body).unwrap(), "[]");

        let body = json!({"candidates": []});
        assert!(matches!(extract_text(&body), Err(GenerationError::NoText)));
    }

    #[test]
    fn accepts_bare_and_wrapped_arrays() {
        let bare = json!([item(3, 3, 0)]).to_string();
        assert_eq!(decode_questions(&bare).unwrap().len(), 1);

        let wrapped = json!({"questions": [item(4, 4, 3), item(3, 3, 1)]}).to_string();
        assert_eq!(decode_questions(&wrapped).unwrap().len(), 2);

        let items = json!({"items": [item(3, 3, 2)]}).to_string();
        assert_eq!(decode_questions(&items).unwrap().len(), 1);

        let fallback = json!({"questions": null, "items": [item(3, 3, 0)]}).to_string();
        assert_eq!(decode_questions(&fallback).unwrap().len(), 1);

        let fenced = format!("```json\n{bare}\n```");
        assert_eq!(decode_questions(&fenced).unwrap().len(), 1);
    }

    #[test]
    fn rejects_other_shapes() {
        for text in [r#"{"data": []}"#, r#"{"questions": "none"}"#, "42", "not json"] {
            assert!(
                matches!(decode_questions(text), Err(GenerationError::Format(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn rejects_malformed_items() {
        let cases = [
            item(2, 2, 0),
            item(5, 5, 0),
            item(3, 4, 0),
            item(3, 3, 3),
            item(3, 3, -1),
            json!({"questionText": "only this"}),
        ];
        for case in cases {
            let text = json!([item(3, 3, 0), case]).to_string();
            let err = decode_questions(&text).unwrap_err();
            assert!(err.to_string().contains("item 1"), "{err}");
        }
    }
}
