//! Onboarding quiz: typed answers, checkbox rules and wizard navigation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QuizError;
use crate::models::QuizQuestion;

pub const OTHER: &str = "Other";
pub const DEFAULT_SCALE: u8 = 5;
const SCALE_RANGE: std::ops::RangeInclusive<i64> = 1..=10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Choice {
    Listed(String),
    /// The "Other" option with its free text, empty until the athlete types.
    Other(String),
}

impl Choice {
    fn from_legacy(value: &str) -> Self {
        if value == OTHER {
            Choice::Other(String::new())
        } else if let Some(text) = value.strip_prefix("Other:") {
            Choice::Other(text.trim().to_string())
        } else {
            Choice::Listed(value.to_string())
        }
    }

    fn is_other(&self) -> bool {
        matches!(self, Choice::Other(_))
    }

    fn other_text(&self) -> Option<&str> {
        match self {
            Choice::Other(text) if !text.is_empty() => Some(text.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum QuizAnswer {
    Scale(u8),
    Single(Choice),
    Multiple(Vec<Choice>),
}

impl QuizAnswer {
    pub fn scale(value: i64) -> Result<Self, QuizError> {
        if SCALE_RANGE.contains(&value) {
            Ok(QuizAnswer::Scale(value as u8))
        } else {
            Err(QuizError::ScaleOutOfRange(value))
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Reads a stored answer. Rows written by the older client hold a bare JSON
    /// number, string or string array where "Other" free text was folded into
    /// an `"Other: text"` entry; those are converted to typed choices.
    pub fn decode(raw: &str) -> Result<Self, QuizError> {
        match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => match serde_json::from_value(value) {
                Ok(QuizAnswer::Scale(n)) => QuizAnswer::scale(i64::from(n)),
                Ok(answer) => Ok(answer),
                Err(_) => Err(QuizError::MalformedAnswer(raw.to_string())),
            },
            Ok(Value::Number(n)) => n
                .as_i64()
                .ok_or_else(|| QuizError::MalformedAnswer(raw.to_string()))
                .and_then(QuizAnswer::scale),
            Ok(Value::String(s)) => Ok(QuizAnswer::Single(Choice::from_legacy(&s))),
            Ok(Value::Array(items)) => {
                let mut choices: Vec<Choice> = Vec::new();
                for item in items {
                    let Value::String(s) = item else {
                        return Err(QuizError::MalformedAnswer(raw.to_string()));
                    };
                    match Choice::from_legacy(&s) {
                        Choice::Other(text) => merge_other(&mut choices, text),
                        listed => choices.push(listed),
                    }
                }
                Ok(QuizAnswer::Multiple(choices))
            }
            Ok(_) => Err(QuizError::MalformedAnswer(raw.to_string())),
            Err(_) => Ok(QuizAnswer::Single(Choice::from_legacy(raw))),
        }
    }

    pub fn is_selected(&self, option: &str) -> bool {
        let selects = |choice: &Choice| match choice {
            Choice::Listed(value) => value == option,
            Choice::Other(_) => option == OTHER,
        };
        match self {
            QuizAnswer::Scale(_) => false,
            QuizAnswer::Single(choice) => selects(choice),
            QuizAnswer::Multiple(choices) => choices.iter().any(selects),
        }
    }

    pub fn other_text(&self) -> Option<&str> {
        match self {
            QuizAnswer::Scale(_) => None,
            QuizAnswer::Single(choice) => choice.other_text(),
            QuizAnswer::Multiple(choices) => choices.iter().find_map(Choice::other_text),
        }
    }
}

fn merge_other(choices: &mut Vec<Choice>, text: String) {
    match choices.iter_mut().find(|choice| choice.is_other()) {
        Some(Choice::Other(existing)) => {
            if !text.is_empty() {
                *existing = text;
            }
        }
        _ => choices.push(Choice::Other(text)),
    }
}

/// Toggles one checkbox option. Deselecting "Other" drops its free text.
/// `max_select` bounds the listed options only; "Other" is not counted.
pub fn toggle_choice(
    answer: Option<&QuizAnswer>,
    option: &str,
    max_select: Option<usize>,
) -> Result<QuizAnswer, QuizError> {
    let mut choices = match answer {
        Some(QuizAnswer::Multiple(choices)) => choices.clone(),
        _ => Vec::new(),
    };

    if option == OTHER {
        if choices.iter().any(Choice::is_other) {
            choices.retain(|choice| !choice.is_other());
        } else {
            choices.push(Choice::Other(String::new()));
        }
    } else {
        let before = choices.len();
        choices.retain(|choice| !matches!(choice, Choice::Listed(value) if value == option));
        if choices.len() == before {
            choices.push(Choice::Listed(option.to_string()));
        }
    }

    if let Some(max) = max_select.filter(|max| *max > 0) {
        let listed = choices.iter().filter(|choice| !choice.is_other()).count();
        if listed > max {
            return Err(QuizError::TooManySelections { max });
        }
    }

    Ok(QuizAnswer::Multiple(choices))
}

/// Fails unless `option` is one of the question's listed options.
pub fn check_option(options: &[String], option: &str) -> Result<(), QuizError> {
    if options.iter().any(|listed| listed == option) {
        Ok(())
    } else {
        Err(QuizError::UnknownOption(option.to_string()))
    }
}

/// Picks one radio option, keeping any "Other" text already stored.
pub fn select_radio(
    options: &[String],
    answer: Option<&QuizAnswer>,
    option: &str,
) -> Result<QuizAnswer, QuizError> {
    check_option(options, option)?;
    if option != OTHER {
        return Ok(QuizAnswer::Single(Choice::Listed(option.to_string())));
    }
    let text = match answer {
        Some(QuizAnswer::Single(Choice::Other(text))) => text.clone(),
        _ => String::new(),
    };
    Ok(QuizAnswer::Single(Choice::Other(text)))
}

/// Sets the free text of the "Other" choice. On a checkbox answer this also
/// selects "Other"; a radio answer must already have it picked.
pub fn with_other_text(answer: Option<&QuizAnswer>, text: &str) -> Result<QuizAnswer, QuizError> {
    let text = text.trim().to_string();
    match answer {
        Some(QuizAnswer::Multiple(choices)) => {
            let mut choices: Vec<Choice> = choices
                .iter()
                .filter(|choice| !choice.is_other())
                .cloned()
                .collect();
            choices.push(Choice::Other(text));
            Ok(QuizAnswer::Multiple(choices))
        }
        Some(QuizAnswer::Single(Choice::Other(_))) => Ok(QuizAnswer::Single(Choice::Other(text))),
        Some(QuizAnswer::Single(Choice::Listed(value))) if value == OTHER => {
            Ok(QuizAnswer::Single(Choice::Other(text)))
        }
        _ => Err(QuizError::OtherNotSelected),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    Likert {
        label_min: String,
        label_max: String,
    },
    Radio {
        options: Vec<String>,
    },
    Checkbox {
        options: Vec<String>,
        max_select: Option<usize>,
    },
}

#[derive(Deserialize)]
struct LikertOptions {
    #[serde(default)]
    label_min: String,
    #[serde(default)]
    label_max: String,
}

#[derive(Deserialize)]
struct ChoiceOptions {
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    max_select: Option<usize>,
}

impl QuestionKind {
    pub fn of(question: &QuizQuestion) -> Result<Self, QuizError> {
        let malformed = |e: serde_json::Error| QuizError::MalformedOptions {
            id: question.id,
            reason: e.to_string(),
        };

        match question.question_type.as_str() {
            "likert" => {
                let opts: LikertOptions =
                    serde_json::from_value(question.options.clone()).map_err(malformed)?;
                Ok(QuestionKind::Likert {
                    label_min: opts.label_min,
                    label_max: opts.label_max,
                })
            }
            "radio" => {
                let opts: ChoiceOptions =
                    serde_json::from_value(question.options.clone()).map_err(malformed)?;
                Ok(QuestionKind::Radio {
                    options: opts.options,
                })
            }
            "checkbox" => {
                let opts: ChoiceOptions =
                    serde_json::from_value(question.options.clone()).map_err(malformed)?;
                Ok(QuestionKind::Checkbox {
                    options: opts.options,
                    max_select: opts.max_select,
                })
            }
            other => Err(QuizError::UnknownQuestionType {
                id: question.id,
                kind: other.to_string(),
            }),
        }
    }
}

/// Linear walk through the quiz questions.
#[derive(Debug, Clone)]
pub struct QuizWizard {
    questions: Vec<QuizQuestion>,
    answers: BTreeMap<i32, QuizAnswer>,
    index: usize,
    slider_touched: bool,
}

impl QuizWizard {
    pub fn new(questions: Vec<QuizQuestion>, answers: BTreeMap<i32, QuizAnswer>) -> Self {
        Self {
            questions,
            answers,
            index: 0,
            slider_touched: false,
        }
    }

    pub fn current(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.index)
    }

    pub fn answer_for(&self, question_id: i32) -> Option<&QuizAnswer> {
        self.answers.get(&question_id)
    }

    pub fn answers(&self) -> &BTreeMap<i32, QuizAnswer> {
        &self.answers
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.questions.len()
    }

    /// Percentage of the quiz reached, counting the current question.
    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            0.0
        } else {
            (self.index + 1) as f64 / self.questions.len() as f64 * 100.0
        }
    }

    pub fn record(&mut self, question_id: i32, answer: QuizAnswer) {
        if matches!(answer, QuizAnswer::Scale(_))
            && self.current().map(|q| q.id) == Some(question_id)
        {
            self.slider_touched = true;
        }
        self.answers.insert(question_id, answer);
    }

    pub fn next(&mut self) -> bool {
        if self.index + 1 < self.questions.len() {
            self.index += 1;
            self.slider_touched = false;
            true
        } else {
            false
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            self.slider_touched = false;
            true
        } else {
            false
        }
    }

    /// A likert question blocks advancing until it has been answered.
    pub fn is_next_disabled(&self) -> bool {
        match self.current() {
            Some(question) => {
                question.question_type == "likert"
                    && !self.slider_touched
                    && !self.answers.contains_key(&question.id)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(id: i32, question_type: &str, options: Value) -> QuizQuestion {
        QuizQuestion {
            id,
            question_text: format!("Question {id}"),
            question_type: question_type.to_string(),
            options,
        }
    }

    fn listed(value: &str) -> Choice {
        Choice::Listed(value.to_string())
    }

    #[test]
    fn typed_answers_survive_storage() {
        let answer = QuizAnswer::Multiple(vec![listed("Coffee"), Choice::Other("Other: tea".to_string())]);
        let raw = answer.encode().unwrap();
        assert_eq!(QuizAnswer::decode(&raw).unwrap(), answer);
        assert_eq!(answer.other_text(), Some("Other: tea"));
    }

    #[test]
    fn legacy_array_merges_other_marker_and_text() {
        let decoded = QuizAnswer::decode(r#"["Coffee","Other","Other: Bakeries"]"#).unwrap();
        assert_eq!(
            decoded,
            QuizAnswer::Multiple(vec![listed("Coffee"), Choice::Other("Bakeries".to_string())])
        );
        assert!(decoded.is_selected("Other"));
        assert!(decoded.is_selected("Coffee"));
        assert!(!decoded.is_selected("Gyms"));
    }

    #[test]
    fn legacy_scalars_decode() {
        assert_eq!(QuizAnswer::decode("7").unwrap(), QuizAnswer::Scale(7));
        assert_eq!(
            QuizAnswer::decode(r#""Instagram""#).unwrap(),
            QuizAnswer::Single(listed("Instagram"))
        );
        assert_eq!(
            QuizAnswer::decode(r#""Other: Podcasts""#).unwrap(),
            QuizAnswer::Single(Choice::Other("Podcasts".to_string()))
        );
        assert_eq!(
            QuizAnswer::decode("not json").unwrap(),
            QuizAnswer::Single(listed("not json"))
        );
    }

    #[test]
    fn only_json_objects_take_the_typed_form() {
        // a legacy checkbox array that happens to look like `[tag, content]`
        assert_eq!(
            QuizAnswer::decode(r#"["scale","single"]"#).unwrap(),
            QuizAnswer::Multiple(vec![listed("scale"), listed("single")])
        );
        assert!(matches!(
            QuizAnswer::decode(r#"["scale", 3]"#),
            Err(QuizError::MalformedAnswer(_))
        ));
        assert_eq!(
            QuizAnswer::decode(r#"{"kind":"scale","value":3}"#).unwrap(),
            QuizAnswer::Scale(3)
        );
        assert_eq!(
            QuizAnswer::decode(r#"{"kind":"scale","value":11}"#),
            Err(QuizError::ScaleOutOfRange(11))
        );
        assert!(matches!(
            QuizAnswer::decode(r#"{"kind":"essay"}"#),
            Err(QuizError::MalformedAnswer(_))
        ));
    }

    #[test]
    fn legacy_out_of_range_scale_is_rejected() {
        assert_eq!(QuizAnswer::decode("42"), Err(QuizError::ScaleOutOfRange(42)));
        assert!(matches!(
            QuizAnswer::decode(r#"[1, 2]"#),
            Err(QuizError::MalformedAnswer(_))
        ));
    }

    #[test]
    fn toggle_adds_and_removes_listed_options() {
        let first = toggle_choice(None, "Coffee", None).unwrap();
        let second = toggle_choice(Some(&first), "Gyms", None).unwrap();
        assert_eq!(second, QuizAnswer::Multiple(vec![listed("Coffee"), listed("Gyms")]));
        let third = toggle_choice(Some(&second), "Coffee", None).unwrap();
        assert_eq!(third, QuizAnswer::Multiple(vec![listed("Gyms")]));
    }

    #[test]
    fn deselecting_other_drops_its_text() {
        let answer =
            with_other_text(Some(&QuizAnswer::Multiple(vec![listed("Coffee")])), "  Bakeries ").unwrap();
        assert_eq!(answer.other_text(), Some("Bakeries"));
        let toggled = toggle_choice(Some(&answer), OTHER, None).unwrap();
        assert_eq!(toggled, QuizAnswer::Multiple(vec![listed("Coffee")]));
    }

    #[test]
    fn max_select_ignores_other() {
        let answer = toggle_choice(None, "A", Some(2)).unwrap();
        let answer = toggle_choice(Some(&answer), "B", Some(2)).unwrap();
        let answer = toggle_choice(Some(&answer), OTHER, Some(2)).unwrap();
        assert_eq!(
            toggle_choice(Some(&answer), "C", Some(2)),
            Err(QuizError::TooManySelections { max: 2 })
        );
        // zero means no limit
        assert!(toggle_choice(Some(&answer), "C", Some(0)).is_ok());
    }

    #[test]
    fn other_text_on_single_choice() {
        let answer = with_other_text(Some(&QuizAnswer::Single(listed("Other"))), "Radio shows").unwrap();
        assert_eq!(answer, QuizAnswer::Single(Choice::Other("Radio shows".to_string())));
        let revised = with_other_text(Some(&answer), "Podcasts").unwrap();
        assert_eq!(revised.other_text(), Some("Podcasts"));
    }

    #[test]
    fn other_text_never_replaces_a_listed_radio_pick() {
        let picked = QuizAnswer::Single(listed("Instagram"));
        assert_eq!(
            with_other_text(Some(&picked), "pods"),
            Err(QuizError::OtherNotSelected)
        );
        assert_eq!(
            with_other_text(Some(&QuizAnswer::Scale(4)), "pods"),
            Err(QuizError::OtherNotSelected)
        );
        assert_eq!(with_other_text(None, "pods"), Err(QuizError::OtherNotSelected));
    }

    #[test]
    fn radio_pick_must_be_a_listed_option() {
        let options = vec!["Instagram".to_string(), "TikTok".to_string(), OTHER.to_string()];
        assert_eq!(
            select_radio(&options, None, "TikTok").unwrap(),
            QuizAnswer::Single(listed("TikTok"))
        );
        assert_eq!(
            select_radio(&options, None, "MySpace"),
            Err(QuizError::UnknownOption("MySpace".to_string()))
        );

        let stored = QuizAnswer::Single(Choice::Other("Podcasts".to_string()));
        assert_eq!(select_radio(&options, Some(&stored), OTHER).unwrap(), stored);
        assert!(check_option(&options, "instagram").is_err());
    }

    #[test]
    fn question_kinds_parse_from_options() {
        let likert = question(1, "likert", json!({"label_min": "Never", "label_max": "Always"}));
        assert_eq!(
            QuestionKind::of(&likert).unwrap(),
            QuestionKind::Likert {
                label_min: "Never".to_string(),
                label_max: "Always".to_string(),
            }
        );

        let checkbox = question(2, "checkbox", json!({"options": ["A", "B"], "max_select": 1}));
        assert_eq!(
            QuestionKind::of(&checkbox).unwrap(),
            QuestionKind::Checkbox {
                options: vec!["A".to_string(), "B".to_string()],
                max_select: Some(1),
            }
        );

        let unknown = question(3, "essay", json!({}));
        assert!(matches!(
            QuestionKind::of(&unknown),
            Err(QuizError::UnknownQuestionType { id: 3, .. })
        ));

        let broken = question(4, "radio", json!({"options": "A"}));
        assert!(matches!(
            QuestionKind::of(&broken),
            Err(QuizError::MalformedOptions { id: 4, .. })
        ));
    }

    #[test]
    fn wizard_blocks_unanswered_likert_and_clamps_navigation() {
        let questions = vec![
            question(1, "likert", json!({})),
            question(2, "radio", json!({"options": ["Yes", "No"]})),
        ];
        let mut wizard = QuizWizard::new(questions, BTreeMap::new());

        assert!(!wizard.prev());
        assert!(wizard.is_next_disabled());
        wizard.record(1, QuizAnswer::scale(8).unwrap());
        assert!(!wizard.is_next_disabled());

        assert!(wizard.next());
        assert!(wizard.is_last());
        assert_eq!(wizard.progress(), 100.0);
        assert!(!wizard.next());

        assert!(wizard.prev());
        assert_eq!(wizard.index(), 0);
        // the stored answer keeps the question unlocked after navigating back
        assert!(!wizard.is_next_disabled());
    }
}
