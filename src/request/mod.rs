//! Asynchronous Request Layer
//!
//! Wraps every outbound call to the Billow service in a single-use
//! [`RequestTask`] that resolves to exactly one of two outcomes: the parsed
//! response envelope on success, or a [`TaskError`] classifying the failure.
//!
//! - [`envelope`]: the `{success, message, data}` contract shared by every endpoint
//! - [`signing`]: HMAC request signing headers
//! - [`task`]: the single-fire request wrapper

pub mod envelope;
pub mod signing;
pub mod task;

pub use envelope::Envelope;
pub use signing::{RequestSigner, Signature, HMAC_HEADER, TIMESTAMP_HEADER, TOKEN_HEADER};
pub use task::{RequestTask, TaskError};
