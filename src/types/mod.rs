//! Core types for chatroute.

pub mod generation;
pub mod message;
pub mod stream;
pub mod turn;

pub use generation::*;
pub use message::*;
pub use stream::*;
pub use turn::*;
