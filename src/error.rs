use std::convert::Infallible;

/// Error taxonomy of the transition engine.
///
/// `PermissionDenied`, `NotFound` and `Conflict` are business errors and are
/// terminal for the call; callers must re-fetch state and resubmit rather
/// than retry. The storage and codec variants are infrastructure failures
/// and safe to retry at the caller's discretion.
#[derive(thiserror::Error, Debug)]
pub enum HandshakeError {
    /// Actor lacks the required role or capability. Maps to 403.
    #[error("actor {actor} lacks the capability to manage handshakes for position {position}")]
    PermissionDenied { actor: String, position: String },

    /// No qualifying record for the requested transition. Deliberately
    /// coarse: covers both "record absent" and "record in a disqualifying
    /// state", matching legacy behavior. Maps to 404.
    #[error("no qualifying handshake record for position {position}, bidder {bidder}")]
    NotFound { position: String, bidder: String },

    /// An offer was attempted while another live record holds the position.
    /// The holder must be explicitly revoked first.
    #[error("position {position} already has an active handshake with bidder {holder}")]
    Conflict { position: String, holder: String },

    #[error("handshake store unavailable")]
    Storage(#[from] sled::Error),

    #[error("failed to encode handshake record")]
    Encode(#[from] minicbor::encode::Error<Infallible>),

    #[error("failed to decode handshake record")]
    Decode(#[from] minicbor::decode::Error),
}

impl HandshakeError {
    /// Business errors are terminal; infrastructure errors may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Encode(_) | Self::Decode(_))
    }
}
