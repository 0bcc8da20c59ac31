//! Error and result types for the query crate.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed query text. Reported with the 1-based source position.
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// A WHERE or RETURN expression names a variable no MATCH binds.
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    /// Operator applied to a value of the wrong type (string operator on a
    /// non-string, arithmetic on a non-number). Null never raises this.
    #[error("type error: {0}")]
    Type(String),

    /// A hint references a variable name not present in any MATCH.
    #[error("invalid hint: `{0}` is not a pattern variable")]
    InvalidHint(String),
}

impl Error {
    pub(crate) fn parse(line: usize, column: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            column,
            message: message.into(),
        }
    }
}
