use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown sort key `{0}`")]
    SortKey(String),

    #[error("unknown filter category `{0}`")]
    FilterCategory(String),

    #[error("unknown demo school `{0}`")]
    DemoSchool(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("you can only select up to {max} options")]
    TooManySelections { max: usize },

    #[error("likert answers must be between 1 and 10, got {0}")]
    ScaleOutOfRange(i64),

    #[error("`{0}` is not an option for this question")]
    UnknownOption(String),

    #[error("free text needs the \"Other\" option to be selected")]
    OtherNotSelected,

    #[error("malformed answer payload: {0}")]
    MalformedAnswer(String),

    #[error("question {id} has unsupported type `{kind}`")]
    UnknownQuestionType { id: i32, kind: String },

    #[error("question {id} has malformed options: {reason}")]
    MalformedOptions { id: i32, reason: String },
}
