use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_question_count() -> u32 {
    20
}

/// What the user fills in before asking the model for a quiz.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuizConfig {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub standard: String,
    #[serde(default = "default_question_count")]
    #[validate(range(min = 1, message = "Question count must be at least 1"))]
    pub questions: u32,
    #[serde(default)]
    pub others: Option<String>,
    #[serde(default)]
    pub negative_marking: bool,
}

impl QuizConfig {
    pub fn has_required_fields(&self) -> bool {
        [&self.subject, &self.topic, &self.standard]
            .iter()
            .all(|f| !f.trim().is_empty())
    }

    /// Extra instructions, or `None` when the field is absent or blank.
    pub fn extra_instructions(&self) -> Option<&str> {
        self.others
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn project_name(&self) -> String {
        format!("{} Quiz", self.topic.trim())
    }
}
