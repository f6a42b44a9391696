//! skiff-proto - wire protocol support for skiffd.
//!
//! Provides the line framing codec, the parsed message representation,
//! message prefixes, and the numeric reply codes the server emits.

mod error;
mod line;
mod message;
mod prefix;
mod response;

pub use error::ProtocolError;
pub use line::LineCodec;
pub use message::Message;
pub use prefix::Prefix;
pub use response::Response;

/// The server's source identity in numeric replies and notices.
pub const SERVER_NAME: &str = "irc.localhost";

/// Host component of client prefixes (`nick!user@localhost`).
pub const CLIENT_HOST: &str = "localhost";
