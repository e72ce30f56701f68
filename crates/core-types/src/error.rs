use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A textual option did not name any known variant.
    #[error("Invalid {field} '{value}': expected one of {expected}")]
    InvalidInput {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}
