// socket module — real-time transport adapter

mod client;
mod events;

pub use client::{SocketClient, SocketError};
pub use events::{SocketEvent, SocketIntent};
