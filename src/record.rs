//! Core handshake record and status types
use chrono::{DateTime, TimeZone, Utc};

/// Authoritative negotiation state of a handshake record.
///
/// Offered, Accepted and Declined are "live" states: a record in any of them
/// blocks other bidders from being offered the same position. Revoked is the
/// only retired state and the only one a later offer can restart from.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub enum HandshakeStatus {
    #[n(0)]
    Offered,
    #[n(1)]
    Accepted,
    #[n(2)]
    Declined,
    #[n(3)]
    Revoked,
}

impl HandshakeStatus {
    pub fn is_live(&self) -> bool {
        // value equality on purpose, never identity
        matches!(self, Self::Offered | Self::Accepted | Self::Declined)
    }
}

/// The bidder's own latest decision, independent of who last wrote `status`.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub enum BidderStatus {
    #[n(0)]
    None,
    #[n(1)]
    Accepted,
    #[n(2)]
    Declined,
}

#[derive(Debug, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl<T: TimeZone> PartialEq for TimeStamp<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: TimeZone> Eq for TimeStamp<T> {}

impl<T: TimeZone> PartialOrd for TimeStamp<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: TimeZone> Ord for TimeStamp<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
    /// Canonical date representation surfaced by the read models.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// The sole persistent entity. Exactly one record may exist per
/// `(position_id, bidder_id)` pair; it is mutated in place across its
/// lifecycle, never replaced or duplicated.
///
/// The four `date_*` fields are an audit trail: each is set when the
/// corresponding transition fires and is never cleared by later transitions,
/// including a re-offer after revocation.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct HandshakeRecord {
    #[n(0)]
    pub position_id: String,
    #[n(1)]
    pub bidder_id: String,
    #[n(2)]
    pub status: HandshakeStatus,
    #[n(3)]
    pub bidder_status: BidderStatus,
    #[n(4)]
    pub is_cdo_update: bool,
    /// Actor who first created the record (the offering bureau actor).
    #[n(5)]
    pub owner_id: String,
    /// Last actor who acted in the bureau administrative capacity.
    #[n(6)]
    pub last_editing_user_id: String,
    /// Last actor who acted on the bidder's leg (bidder or CDO-on-behalf-of).
    #[n(7)]
    pub last_editing_bidder_id: Option<String>,
    #[n(8)]
    pub date_offered: Option<TimeStamp<Utc>>,
    #[n(9)]
    pub date_accepted: Option<TimeStamp<Utc>>,
    #[n(10)]
    pub date_declined: Option<TimeStamp<Utc>>,
    #[n(11)]
    pub date_revoked: Option<TimeStamp<Utc>>,
    #[n(12)]
    pub update_date: TimeStamp<Utc>,
}

impl HandshakeRecord {
    /// Fresh record created by a bureau offer.
    pub fn offered(position_id: &str, bidder_id: &str, actor: &str) -> Self {
        let now = TimeStamp::new();
        Self {
            position_id: position_id.to_owned(),
            bidder_id: bidder_id.to_owned(),
            status: HandshakeStatus::Offered,
            bidder_status: BidderStatus::None,
            is_cdo_update: false,
            owner_id: actor.to_owned(),
            last_editing_user_id: actor.to_owned(),
            last_editing_bidder_id: None,
            date_offered: Some(now.clone()),
            date_accepted: None,
            date_declined: None,
            date_revoked: None,
            update_date: now,
        }
    }

    /// Restart the lifecycle after a revocation. Current-state fields go back
    /// to their initial values while historical timestamps and `owner_id`
    /// survive as the audit trail.
    pub fn reoffer(&mut self, actor: &str) {
        self.status = HandshakeStatus::Offered;
        self.bidder_status = BidderStatus::None;
        self.is_cdo_update = false;
        self.last_editing_user_id = actor.to_owned();
        self.last_editing_bidder_id = None;
        self.date_offered = Some(TimeStamp::new());
    }
}
