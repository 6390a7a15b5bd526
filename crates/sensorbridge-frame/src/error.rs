/// Errors for lines that look like records but cannot be decoded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The line is not a syntactically valid JSON object.
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A required field is absent (strict mode only).
    #[error("record is missing field `{0}`")]
    MissingField(&'static str),

    /// A field is present but not a number (strict mode only).
    #[error("record field `{field}` is not a number: {value}")]
    InvalidField { field: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, DecodeError>;
