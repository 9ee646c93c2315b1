use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("document {0} does not exist")]
    DocumentNotFound(i64),
    #[error("user has no access to this document")]
    AccessDenied,
    #[error("user may not edit this document")]
    EditDenied,
    #[error("replace range start {start} is after end {end}")]
    InvalidRange { start: usize, end: usize },
    #[error("could not persist document: {0}")]
    Storage(#[from] sqlx::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

/// Edit of a document body. Positions count characters, not bytes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TextOperation {
    Insert { position: usize, value: String },
    /// Removes as many characters as `value` holds, starting at `position`
    Delete { position: usize, value: String },
    Replace { position: TextRange, value: String },
}

impl TextOperation {
    /// Returns the new content. Offsets past the end are clamped to it.
    pub fn apply(&self, content: &str) -> Result<String, OperationError> {
        match self {
            TextOperation::Insert { position, value } => {
                let at = byte_offset(content, *position);
                let mut out = String::with_capacity(content.len() + value.len());
                out.push_str(&content[..at]);
                out.push_str(value);
                out.push_str(&content[at..]);
                Ok(out)
            }
            TextOperation::Delete { position, value } => {
                let start = byte_offset(content, *position);
                let end = byte_offset(content, position.saturating_add(value.chars().count()));
                Ok(splice(content, start, end, ""))
            }
            TextOperation::Replace { position, value } => {
                if position.start > position.end {
                    return Err(OperationError::InvalidRange {
                        start: position.start,
                        end: position.end,
                    });
                }
                let start = byte_offset(content, position.start);
                let end = byte_offset(content, position.end);
                Ok(splice(content, start, end, value))
            }
        }
    }
}

/// Byte index of the `chars`-th character, or the end of the string
fn byte_offset(content: &str, chars: usize) -> usize {
    content
        .char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(content.len())
}

fn splice(content: &str, start: usize, end: usize, value: &str) -> String {
    let mut out = String::with_capacity(content.len() - (end - start) + value.len());
    out.push_str(&content[..start]);
    out.push_str(value);
    out.push_str(&content[end..]);
    out
}
