//! # slirc-p10
//!
//! Line model and framing for the P10 family of server-to-server IRC
//! protocols, as spoken by a services server linked to a hub.
//!
//! ```rust
//! use slirc_p10::Message;
//!
//! let msg: Message = "ABAAB P AzAAA :hello there".parse().unwrap();
//! assert_eq!(msg.source.as_deref(), Some("ABAAB"));
//! assert_eq!(msg.command, "P");
//! assert_eq!(msg.params, ["AzAAA", "hello there"]);
//! assert_eq!(msg.to_string(), "ABAAB P AzAAA :hello there");
//! ```

#![deny(clippy::all)]

pub mod builder;
pub mod casemap;
pub mod codec;
pub mod error;
pub mod format;
pub mod message;
pub mod numeric;

pub use self::casemap::{irc_eq, irc_to_lower};
pub use self::codec::P10Codec;
pub use self::error::{ProtocolError, Result};
pub use self::format::strip_formatting;
pub use self::message::Message;
pub use self::numeric::{ClientNumeric, NumericError};
