use thiserror::Error;

/// Structural failures raised while reshaping an upstream body.
///
/// The display strings are returned verbatim to API clients.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Expected a json object from the server response")]
    ExpectedObject,

    #[error("Expected an array (of size > 0) in server response")]
    ExpectedNonEmptyArray,

    #[error("Expected an object in server response")]
    ExpectedResponseObject,
}
