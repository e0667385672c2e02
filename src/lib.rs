//! chatroute: routing and composition of chat turns for hosted model backends.
//!
//! A turn (messages, attachments, selected model, feature toggles) is
//! classified onto one backend path, shaped into that path's request, sent,
//! and its streamed or buffered reply normalized into text deltas. A separate
//! usage tracker keeps the model picker ordered by sustained use.
//!
//! # Quick Start
//!
//! ```no_run
//! use chatroute::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> chatroute::error::Result<()> {
//! let client = ChatClient::from_config(ChatConfig::from_env()?)?;
//! let turn = ConversationTurn::builder()
//!     .messages(vec![ChatMessage::user("Hello!")])
//!     .model(client.registry().lookup("gpt-4.1"))
//!     .build();
//! let reply = client.complete(&turn, CancellationToken::new()).await?;
//! println!("[{}] {}", reply.decision, reply.text);
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod config;
pub mod error;
pub mod models;
pub mod prelude;
pub mod reconcile;
pub mod request;
pub mod routing;
pub mod transport;
pub mod types;
pub mod usage;

#[cfg(feature = "cli")]
pub mod cli;
