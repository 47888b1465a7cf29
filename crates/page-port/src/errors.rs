use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum PageError {
    #[error("unknown node: {0}")]
    UnknownNode(u64),
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("node is not a select element")]
    NotASelect,
    #[error("option index {0} out of range")]
    OptionOutOfRange(usize),
    #[error("page backend failure: {0}")]
    Backend(String),
}
