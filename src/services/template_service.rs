use crate::error::{Error, Result};
use crate::models::quiz::{QuizContent, ScoreFormula};

pub const QUIZ_TEMPLATE: &str = include_str!("../../templates/quiz_document.html");

pub const GRAPHS_PLACEHOLDER: &str = "__GRAPHS_PLACEHOLDER__";
pub const DATA_PLACEHOLDER: &str = "__DATA_PLACEHOLDER__";
pub const SCORE_PLACEHOLDER: &str = "__SCORE_LOGIC__";

/// Serializes a value for inlining inside a `<script>` element: `</` is
/// written as `<\/` so embedded markup cannot close the element, and the two
/// line terminators JSON allows but older JS engines reject are escaped.
pub fn script_safe_json<T: serde::Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(json
        .replace("</", "<\\/")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029"))
}

/// Fills the three placeholders of `template`. Slots are located in the
/// template before anything is inserted, so placeholder names appearing in
/// the AI's own text are never substituted. Missing placeholders are an
/// error so a broken template never ships a document without data.
pub fn render_with_template(
    template: &str,
    content: &QuizContent,
    formula: ScoreFormula,
) -> Result<String> {
    let graphs_json = script_safe_json(&content.graphs)?;
    let data_json = script_safe_json(&content.questions)?;

    let mut slots = Vec::with_capacity(3);
    for (placeholder, value) in [
        (GRAPHS_PLACEHOLDER, graphs_json.as_str()),
        (DATA_PLACEHOLDER, data_json.as_str()),
        (SCORE_PLACEHOLDER, formula.script()),
    ] {
        let offset = template.find(placeholder).ok_or_else(|| {
            Error::Internal(format!("Quiz template is missing {}", placeholder))
        })?;
        slots.push((offset, placeholder.len(), value));
    }
    slots.sort_by_key(|(offset, _, _)| *offset);

    let mut out = String::with_capacity(
        template.len() + slots.iter().map(|(_, _, v)| v.len()).sum::<usize>(),
    );
    let mut cursor = 0;
    for (offset, len, value) in slots {
        out.push_str(&template[cursor..offset]);
        out.push_str(value);
        cursor = offset + len;
    }
    out.push_str(&template[cursor..]);
    Ok(out)
}

pub fn render_document(content: &QuizContent, formula: ScoreFormula) -> Result<String> {
    render_with_template(QUIZ_TEMPLATE, content, formula)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::QuizQuestion;
    use serde_json::Map;

    fn question(text: &str) -> QuizQuestion {
        QuizQuestion {
            q: text.to_string(),
            options: vec!["a".into(), "b".into()],
            answer: 1,
            expl: "because".into(),
            shortcut: None,
            graph_svg: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn bundled_template_has_every_placeholder_once() {
        for p in [GRAPHS_PLACEHOLDER, DATA_PLACEHOLDER, SCORE_PLACEHOLDER] {
            assert_eq!(QUIZ_TEMPLATE.matches(p).count(), 1, "{}", p);
        }
    }

    #[test]
    fn dollar_signs_survive_substitution() {
        let content = QuizContent {
            questions: vec![question("Solve $x^2$ and $$y$$ with $& kept")],
            graphs: Default::default(),
        };
        let html = render_with_template(
            "D=__DATA_PLACEHOLDER__;G=__GRAPHS_PLACEHOLDER__;__SCORE_LOGIC__",
            &content,
            ScoreFormula::Standard,
        )
        .unwrap();
        assert!(html.contains("Solve $x^2$ and $$y$$ with $& kept"));
        assert!(html.ends_with("let score = c;"));
        assert!(html.contains("G={}"));
    }

    #[test]
    fn closing_tags_in_svg_are_split() {
        let mut content = QuizContent::default();
        content
            .graphs
            .insert("g1".into(), "<svg><text>x</text></svg></script>".into());
        let json = script_safe_json(&content.graphs).unwrap();
        assert!(!json.contains("</"));
        let back: std::collections::BTreeMap<String, String> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(back["g1"], "<svg><text>x</text></svg></script>");
    }

    #[test]
    fn placeholder_names_inside_ai_text_are_left_alone() {
        let mut content = QuizContent {
            questions: vec![question("What does __SCORE_LOGIC__ mean?")],
            graphs: Default::default(),
        };
        content
            .graphs
            .insert("g1".into(), "<svg>__DATA_PLACEHOLDER__</svg>".into());

        let html = render_with_template(
            "G=__GRAPHS_PLACEHOLDER__;\nD=__DATA_PLACEHOLDER__;\nS{__SCORE_LOGIC__}",
            &content,
            ScoreFormula::NegativeMarking,
        )
        .unwrap();

        let lines: Vec<&str> = html.lines().collect();
        assert_eq!(lines[0], r#"G={"g1":"<svg>__DATA_PLACEHOLDER__<\/svg>"};"#);
        assert!(lines[1].starts_with(r#"D=[{"q":"What does __SCORE_LOGIC__ mean?""#));
        assert_eq!(
            lines[2],
            "S{let score = c - (w * 0.25); if(score < 0) score = 0;}"
        );
    }

    #[test]
    fn bundled_template_slots_are_all_filled() {
        let content = QuizContent {
            questions: vec![question("__GRAPHS_PLACEHOLDER__ __DATA_PLACEHOLDER__")],
            graphs: Default::default(),
        };
        let html = render_document(&content, ScoreFormula::Standard).unwrap();
        assert!(html.contains("const SVG_GRAPHS = {};"));
        assert!(html.contains("const QUIZ_DATA = [{"));
        assert!(html.contains("let score = c;"));
        assert!(!html.contains("__SCORE_LOGIC__"));
    }

    #[test]
    fn missing_placeholder_is_rejected() {
        let err = render_with_template("no slots", &QuizContent::default(), ScoreFormula::Standard)
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }
}
