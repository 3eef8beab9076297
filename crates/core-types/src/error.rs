use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown market-cap category: '{0}'")]
    UnknownCategory(String),
}
