//! Read models derived from handshake records
use super::record::{BidderStatus, HandshakeRecord, HandshakeStatus};

pub const HS_OFFERED_CODE: &str = "handshake_offered";
pub const HS_REVOKED_CODE: &str = "handshake_revoked";
pub const HS_ACCEPTED_CODE: &str = "handshake_accepted";
pub const HS_DECLINED_CODE: &str = "handshake_declined";

/// Position-level aggregate over every record the position has accumulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionHandshake {
    /// True iff no record holds a live status, i.e. the position is open
    /// for a new offer.
    pub active: bool,
    /// The bidder currently holding the position: status Offered or
    /// Accepted. A bidder who declined no longer holds the position even
    /// though their record has not been revoked.
    pub active_handshake_bidder: Option<String>,
}

/// Bidder-facing presentation of a single record.
///
/// Offered, Accepted and Declined all collapse to the "offered" label:
/// from the bidder's perspective reaching A or D implies an offer was seen.
/// Only Revoked gets a distinct label. The bidder's own decision is carried
/// separately in `bidder_hs_code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidderHandshake {
    pub hs_status_code: &'static str,
    pub bidder_hs_code: Option<&'static str>,
    pub hs_cdo_indicator: bool,
    pub date_offered: Option<String>,
    pub date_accepted: Option<String>,
    pub date_declined: Option<String>,
    pub date_revoked: Option<String>,
}

pub fn position_handshake(records: &[HandshakeRecord]) -> PositionHandshake {
    let active = !records.iter().any(|record| record.status.is_live());

    // At most one record should qualify under the single-live-record
    // invariant; if several do, pick the most recently updated, with the
    // bidder id as a deterministic tie-break.
    let active_handshake_bidder = records
        .iter()
        .filter(|record| {
            record.status == HandshakeStatus::Offered
                || record.status == HandshakeStatus::Accepted
        })
        .max_by(|a, b| {
            a.update_date
                .cmp(&b.update_date)
                .then_with(|| a.bidder_id.cmp(&b.bidder_id))
        })
        .map(|record| record.bidder_id.clone());

    PositionHandshake {
        active,
        active_handshake_bidder,
    }
}

pub fn bidder_handshake(record: &HandshakeRecord) -> BidderHandshake {
    let hs_status_code = match record.status {
        HandshakeStatus::Offered | HandshakeStatus::Accepted | HandshakeStatus::Declined => {
            HS_OFFERED_CODE
        }
        HandshakeStatus::Revoked => HS_REVOKED_CODE,
    };

    let bidder_hs_code = match record.bidder_status {
        BidderStatus::Accepted => Some(HS_ACCEPTED_CODE),
        BidderStatus::Declined => Some(HS_DECLINED_CODE),
        BidderStatus::None => None,
    };

    // timestamps surfaced verbatim, never inferred or defaulted
    BidderHandshake {
        hs_status_code,
        bidder_hs_code,
        hs_cdo_indicator: record.is_cdo_update,
        date_offered: record.date_offered.as_ref().map(|ts| ts.to_rfc3339()),
        date_accepted: record.date_accepted.as_ref().map(|ts| ts.to_rfc3339()),
        date_declined: record.date_declined.as_ref().map(|ts| ts.to_rfc3339()),
        date_revoked: record.date_revoked.as_ref().map(|ts| ts.to_rfc3339()),
    }
}
