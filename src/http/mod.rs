//! HTTP/1.1 message layer shared by the server and the client.
//!
//! # Architecture
//!
//! - **`parser`**: Incremental parsing of requests and responses from byte buffers
//! - **`request`**: HTTP request representation and builder
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes messages and writes them to a stream
//! - **`mime`**: MIME type detection based on file extensions
//!
//! Framing is Content-Length only. The connection state machines that drive
//! these types live in [`crate::server::session`] and
//! [`crate::client::session`].

pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
