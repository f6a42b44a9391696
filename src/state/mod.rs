//! Server state: the client and channel registries and the hub that owns them.

mod channel;
mod client;
mod hub;

pub use channel::{Channel, Channels, Member};
pub use client::{Client, Clients};
pub use hub::Hub;
