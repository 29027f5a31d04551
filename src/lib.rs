//! Bid handshake negotiation subsystem
//!
//! A three-party state machine governing whether a bidder holds an exclusive
//! negotiating hold on an open position within a bidding cycle. A bureau
//! actor offers and revokes handshakes, a CDO may accept or decline on the
//! bidder's behalf, and the bidder may decide for themselves. Only one
//! bidder may actively hold a given position at a time.

pub mod actor;
pub mod engine;
pub mod error;
pub mod ids;
pub mod notify;
pub mod record;
pub mod store;
pub mod view;
