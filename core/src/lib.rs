//! Synchronous client for the Bento for Business card-management API.
//!
//! # Overview
//! Open a [`Session`] with an access key and secret key, then use it to read
//! the business, list and create cards, and page through transactions.
//! Cards come back as [`BoundCard`]s that carry a borrow of their session,
//! so card-level operations (turn on/off, activate, reissue, billing
//! address) need no extra arguments.
//!
//! ```no_run
//! use bento_core::{CardType, Session};
//!
//! let session = Session::sandbox("my-access-key", "my-secret-key")?;
//! let card = session.new_card(CardType::EmployeeCard, "Travel")?;
//! let card = card.turn_on()?;
//! println!("card {:?} is {:?}", card.card_id, card.status);
//! # Ok::<(), bento_core::Error>(())
//! ```
//!
//! # Design
//! - All I/O goes through the [`Transport`] trait. [`UreqTransport`] is the
//!   production implementation; tests substitute closures returning canned
//!   [`HttpResponse`]s.
//! - Error envelopes are detected by [`classify`] regardless of the HTTP
//!   status, so a successful `dispatch` never hands back a disguised error.
//! - Diagnostic lines go to a swappable [`DiagnosticSink`]; library events
//!   are emitted through `tracing`.

pub mod card;
pub mod classify;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod sink;
pub mod types;

#[cfg(test)]
mod testing;

pub use card::BoundCard;
pub use classify::classify;
pub use config::{Credentials, Environment, SessionConfig, PRODUCTION_URL, SANDBOX_URL};
pub use error::{BusinessError, Error, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use session::Session;
pub use sink::{DiagnosticSink, Discard, TracingSink};
pub use types::{
    Address, AddressType, ApiApplication, Business, Card, CardStatus, CardType, Category,
    PanAndCvv, Payee, Period, SpendingLimit, Transaction, Transactions, User,
};
