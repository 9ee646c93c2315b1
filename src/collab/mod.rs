//! Collaborative editing - text operations and the set of documents being edited
//!
//! There is no operational transform: operations are applied in the order
//! they reach a document's lock.

pub mod operation;
pub mod session;

pub use operation::{OperationError, TextOperation, TextRange};
pub use session::{AppliedOperation, DocumentSessions, FLUSH_THRESHOLD, OperationOutcome};
