//! Wire protocol shared by the Pyrope client and server.
//!
//! Every message travels as a length-prefixed JSON frame over a plain TCP
//! stream. The vocabulary is small on purpose: a handshake, a liveness
//! probe, region management, and the three key/value operations.
//!
//! # Frame layout
//!
//! A frame is a 4-byte big-endian length followed by that many bytes of
//! JSON. Frames larger than [`MAX_FRAME_LEN`] are rejected on both ends.
//!
//! # Conversation shape
//!
//! A client opens a connection, sends [`Request::Hello`], and waits for
//! [`Response::Welcome`]. After that the connection is a strict
//! request/response alternation; the server never pushes unsolicited
//! frames.

mod codec;
mod error;
mod message;

pub use codec::{MAX_FRAME_LEN, read_frame, write_frame};
pub use error::{ProtoError, Result};
pub use message::{ErrorCode, PROTOCOL_VERSION, Request, Response};
