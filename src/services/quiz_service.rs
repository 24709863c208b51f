use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::dto::quiz_dto::QuizConfig;
use crate::error::{Error, Result};
use crate::models::quiz::{QuizContent, QuizQuestion, ScoreFormula};
use crate::services::gemini_service::TextGenerator;
use crate::services::template_service;

pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse AI response. Please try again.";

#[derive(Debug, Clone)]
pub struct GeneratedQuiz {
    pub html: String,
    pub question_count: usize,
}

#[derive(Clone)]
pub struct QuizService {
    generator: Arc<dyn TextGenerator>,
    max_questions: u32,
}

impl QuizService {
    pub fn new(generator: Arc<dyn TextGenerator>, max_questions: u32) -> Self {
        Self {
            generator,
            max_questions: max_questions.max(1),
        }
    }

    pub fn validate_config(&self, config: &QuizConfig) -> Result<()> {
        if !config.has_required_fields() {
            return Err(Error::BadRequest("Please fill required fields".to_string()));
        }
        if config.questions == 0 || config.questions > self.max_questions {
            return Err(Error::BadRequest(format!(
                "Question count must be between 1 and {}",
                self.max_questions
            )));
        }
        Ok(())
    }

    pub async fn generate(&self, config: &QuizConfig) -> Result<GeneratedQuiz> {
        self.validate_config(config)?;

        let prompt = build_prompt(config);
        let raw = self.generator.generate(&prompt).await?;
        let parsed = parse_quiz_content(&raw)?;
        let content = sanitize_content(parsed, config.questions as usize);

        tracing::info!(
            topic = %config.topic,
            requested = config.questions,
            received = content.questions.len(),
            graphs = content.graphs.len(),
            "quiz content generated"
        );

        let html = template_service::render_document(
            &content,
            ScoreFormula::from_negative_marking(config.negative_marking),
        )?;

        Ok(GeneratedQuiz {
            html,
            question_count: content.questions.len(),
        })
    }
}

pub fn build_prompt(config: &QuizConfig) -> String {
    format!(
        r#"### ROLE:
You are an API that outputs strictly valid JSON.
Task: Generate a quiz content JSON object based on the user request.

### REQUEST DETAILS:
- **Topic:** {topic}
- **Subject:** {subject}
- **Standard:** {standard}
- **Count:** {count}
- **Extra:** {extra}

### OUTPUT SCHEMA (JSON ONLY):
{{
  "questions": [
    {{
      "q": "Question text with $latex$ equations",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "answer": 0, // Index of correct option (0-3)
      "expl": "Explanation in Bengali",
      "shortcut": "Memory tip in Bengali",
      "graphSVG": "key_name_if_graph_needed" // Optional, matches keys in 'graphs' object
    }}
  ],
  "graphs": {{
    "key_name": "<svg ...> ... </svg>" // Inline SVG string for any graphs used
  }}
}}

### RULES:
1. Language: Bengali (Bangla).
2. Math: Use standard LaTeX with single backslashes (e.g. $\theta$). Do NOT use double backslashes in the JSON string values unless escaping a quote.
3. Generate {count} questions.
4. Provide clear explanations and shortcuts.
5. Include 2-3 graph questions if relevant to the topic.
"#,
        topic = config.topic.trim(),
        subject = config.subject.trim(),
        standard = config.standard.trim(),
        count = config.questions,
        extra = config.extra_instructions().unwrap_or("None"),
    )
}

/// Removes a surrounding markdown fence (```` ```json ```` or bare
/// ```` ``` ````) that models like to wrap JSON in.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let inner = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        return trimmed;
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Parses model output into loosely-typed quiz content. Missing `questions`
/// or `graphs` become empty; a bare array is read as the question list.
/// Individual questions are coerced later by [`sanitize_content`].
pub fn parse_quiz_content(text: &str) -> Result<RawQuizContent> {
    let value: JsonValue = serde_json::from_str(strip_code_fences(text)).map_err(|e| {
        tracing::warn!(error = %e, "AI response was not valid JSON");
        Error::Upstream(PARSE_FAILURE_MESSAGE.to_string())
    })?;

    let (questions, graphs) = match value {
        JsonValue::Object(mut obj) => (
            match obj.remove("questions") {
                Some(JsonValue::Array(items)) => items,
                _ => Vec::new(),
            },
            match obj.remove("graphs") {
                Some(JsonValue::Object(map)) => map,
                _ => Map::new(),
            },
        ),
        JsonValue::Array(items) => (items, Map::new()),
        _ => return Err(Error::Upstream(PARSE_FAILURE_MESSAGE.to_string())),
    };

    Ok(RawQuizContent { questions, graphs })
}

#[derive(Debug, Clone, Default)]
pub struct RawQuizContent {
    pub questions: Vec<JsonValue>,
    pub graphs: Map<String, JsonValue>,
}

/// Keeps only questions the document can render and score: at least two
/// options and an answer index pointing at one of them. Graph references to
/// unknown keys are cleared and the list is cut to `max_questions`.
pub fn sanitize_content(raw: RawQuizContent, max_questions: usize) -> QuizContent {
    let graphs: BTreeMap<String, String> = raw
        .graphs
        .into_iter()
        .filter_map(|(k, v)| v.as_str().map(|svg| (k, svg.to_string())))
        .collect();

    let mut questions = Vec::new();
    for (idx, value) in raw.questions.iter().enumerate() {
        match coerce_question(value) {
            Some(mut q) => {
                if q
                    .graph_svg
                    .as_ref()
                    .is_some_and(|key| !graphs.contains_key(key))
                {
                    q.graph_svg = None;
                }
                questions.push(q);
            }
            None => tracing::debug!(index = idx, "dropping malformed question"),
        }
    }
    questions.truncate(max_questions);

    QuizContent { questions, graphs }
}

fn coerce_question(v: &JsonValue) -> Option<QuizQuestion> {
    let obj = v.as_object()?;
    let q = obj.get("q").and_then(|s| s.as_str())?.trim().to_string();
    if q.is_empty() {
        return None;
    }

    // Skipping one option would shift the answer index; drop the question.
    let options: Vec<String> = obj
        .get("options")
        .and_then(|o| o.as_array())?
        .iter()
        .map(|o| match o {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    if options.len() < 2 {
        return None;
    }

    let answer = match obj.get("answer")? {
        JsonValue::Number(n) => n.as_u64()? as usize,
        JsonValue::String(s) => s.trim().parse::<usize>().ok()?,
        _ => return None,
    };
    if answer >= options.len() {
        return None;
    }

    let text_field = |key: &str| {
        obj.get(key)
            .and_then(|s| s.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let extra: Map<String, JsonValue> = obj
        .iter()
        .filter(|(k, _)| {
            !matches!(
                k.as_str(),
                "q" | "options" | "answer" | "expl" | "shortcut" | "graphSVG"
            )
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Some(QuizQuestion {
        q,
        options,
        answer,
        expl: text_field("expl").unwrap_or_default(),
        shortcut: text_field("shortcut"),
        graph_svg: text_field("graphSVG"),
        extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::gemini_service::MockTextGenerator;
    use serde_json::json;

    fn config(negative: bool) -> QuizConfig {
        QuizConfig {
            subject: "Physics".into(),
            topic: "Vector".into(),
            standard: "HSC".into(),
            questions: 2,
            others: None,
            negative_marking: negative,
        }
    }

    #[test]
    fn prompt_carries_request_details() {
        let mut cfg = config(false);
        let prompt = build_prompt(&cfg);
        assert!(prompt.contains("- **Topic:** Vector"));
        assert!(prompt.contains("- **Subject:** Physics"));
        assert!(prompt.contains("- **Standard:** HSC"));
        assert!(prompt.contains("- **Count:** 2"));
        assert!(prompt.contains("- **Extra:** None"));
        assert!(prompt.contains("3. Generate 2 questions."));
        assert!(prompt.contains(r"$\theta$"));

        cfg.others = Some("  focus on dot product ".into());
        assert!(build_prompt(&cfg).contains("- **Extra:** focus on dot product"));
    }

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn unparsable_text_is_an_upstream_error() {
        let err = parse_quiz_content("Sure! Here is your quiz").unwrap_err();
        assert!(matches!(err, Error::Upstream(msg) if msg == PARSE_FAILURE_MESSAGE));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let raw = parse_quiz_content("{}").unwrap();
        assert!(raw.questions.is_empty());
        assert!(raw.graphs.is_empty());
    }

    #[test]
    fn sanitize_drops_unrenderable_questions_and_dangling_graphs() {
        let raw = parse_quiz_content(
            &json!({
                "questions": [
                    { "q": "ok", "options": ["a", "b", "c", "d"], "answer": 2, "expl": "e", "graphSVG": "g1", "difficulty": "easy" },
                    { "q": "one option", "options": ["a"], "answer": 0 },
                    { "q": "bad index", "options": ["a", "b"], "answer": 5 },
                    { "q": "string index", "options": ["a", "b"], "answer": "1", "graphSVG": "nope" },
                    { "q": "over limit", "options": ["a", "b"], "answer": 0 }
                ],
                "graphs": { "g1": "<svg></svg>", "broken": 3 }
            })
            .to_string(),
        )
        .unwrap();

        let content = sanitize_content(raw, 2);
        assert_eq!(content.questions.len(), 2);
        assert_eq!(content.questions[0].graph_svg.as_deref(), Some("g1"));
        assert_eq!(content.questions[0].extra["difficulty"], "easy");
        assert_eq!(content.questions[1].answer, 1);
        assert_eq!(content.questions[1].graph_svg, None);
        assert_eq!(content.graphs.len(), 1);
    }

    #[test]
    fn config_validation_enforces_required_fields_and_bounds() {
        let service = QuizService::new(Arc::new(MockTextGenerator::new()), 50);
        let mut cfg = config(false);
        assert!(service.validate_config(&cfg).is_ok());

        cfg.topic = "   ".into();
        assert!(matches!(
            service.validate_config(&cfg),
            Err(Error::BadRequest(msg)) if msg == "Please fill required fields"
        ));

        cfg.topic = "Vector".into();
        cfg.questions = 51;
        assert!(service.validate_config(&cfg).is_err());
        cfg.questions = 0;
        assert!(service.validate_config(&cfg).is_err());
    }

    #[tokio::test]
    async fn generate_renders_document_with_negative_marking() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .withf(|prompt| prompt.contains("**Topic:** Vector"))
            .times(1)
            .returning(|_| {
                Ok("```json\n{\"questions\":[{\"q\":\"$\\\\vec a$?\",\"options\":[\"x\",\"y\"],\"answer\":1,\"expl\":\"because\"}],\"graphs\":{}}\n```".to_string())
            });

        let service = QuizService::new(Arc::new(generator), 50);
        let quiz = service.generate(&config(true)).await.unwrap();

        assert_eq!(quiz.question_count, 1);
        assert!(quiz.html.contains("let score = c - (w * 0.25); if(score < 0) score = 0;"));
        assert!(quiz.html.contains(r#"const QUIZ_DATA = [{"q":"$\\vec a$?""#));
        assert!(quiz.html.contains("const SVG_GRAPHS = {};"));
        assert!(!quiz.html.contains("__DATA_PLACEHOLDER__"));
    }

    #[tokio::test]
    async fn generator_errors_propagate() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(Error::Upstream("Gemini API Error 500".into())));

        let service = QuizService::new(Arc::new(generator), 50);
        let err = service.generate(&config(false)).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn invalid_config_never_reaches_the_model() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().never();

        let service = QuizService::new(Arc::new(generator), 50);
        let mut cfg = config(false);
        cfg.subject.clear();
        assert!(service.generate(&cfg).await.is_err());
    }
}
