//! Wire Protocol Module
//!
//! Message types and framing shared by every node.
//!
//! ## Core Concepts
//! - **Messages**: Typed `Request`/`Response` enums encoded with bincode.
//! - **Framing**: Each message is prefixed by its length as a big-endian `u32`.
//! - **Exchanges**: One request and one response per connection.
//! - **Failure split**: A failed connect is reported as `ConnectionFailure`; anything that
//!   goes wrong after the connection is open surfaces as an I/O or codec error.

pub mod client;
pub mod codec;
pub mod message;

pub use client::{CONNECT_TIMEOUT, RESPONSE_TIMEOUT, connect_to, exchange, send_request};
pub use codec::{MAX_FRAME_LEN, read_frame, write_frame};
pub use message::{Request, Response, info_header};

#[cfg(test)]
mod tests;
