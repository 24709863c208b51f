use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// One question as the generated document's script reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub q: String,
    pub options: Vec<String>,
    pub answer: usize,
    #[serde(default)]
    pub expl: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
    #[serde(rename = "graphSVG", default, skip_serializing_if = "Option::is_none")]
    pub graph_svg: Option<String>,
    /// Fields the model added beyond the schema; carried into the document untouched.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizContent {
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
    #[serde(default)]
    pub graphs: BTreeMap<String, String>,
}

/// Statement injected where the document computes `score` from the
/// correct (`c`) and wrong (`w`) counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreFormula {
    Standard,
    NegativeMarking,
}

impl ScoreFormula {
    pub fn from_negative_marking(enabled: bool) -> Self {
        if enabled {
            ScoreFormula::NegativeMarking
        } else {
            ScoreFormula::Standard
        }
    }

    pub fn script(&self) -> &'static str {
        match self {
            ScoreFormula::Standard => "let score = c;",
            ScoreFormula::NegativeMarking => {
                "let score = c - (w * 0.25); if(score < 0) score = 0;"
            }
        }
    }
}
