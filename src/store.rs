//! Persistence for handshake records, keyed by (position, bidder)
use super::error::HandshakeError;
use super::record::{HandshakeRecord, HandshakeStatus, TimeStamp};
use sled::CompareAndSwapError;
use std::sync::Arc;

/// Store for `HandshakeRecord`s on top of sled.
///
/// Records live under the composite key `hs/{position}/{bidder}`, so at most
/// one record can ever exist per pair. Identifiers must not contain `/`.
///
/// All writes go through compare-and-swap loops: the transition precondition
/// is re-validated against the value observed at commit time, so concurrent
/// actors racing on the same pair serialize without a lost update. Writes on
/// different keys never block each other.
pub struct RecordStore {
    db: Arc<sled::Db>,
}

fn record_key(position: &str, bidder: &str) -> Vec<u8> {
    format!("hs/{position}/{bidder}").into_bytes()
}

fn position_prefix(position: &str) -> Vec<u8> {
    format!("hs/{position}/").into_bytes()
}

impl RecordStore {
    pub fn new(db: Arc<sled::Db>) -> Self {
        Self { db }
    }

    pub fn get(
        &self,
        position: &str,
        bidder: &str,
    ) -> Result<Option<HandshakeRecord>, HandshakeError> {
        match self.db.get(record_key(position, bidder))? {
            Some(bytes) => Ok(Some(minicbor::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every record ever created for a position, one per bidder.
    pub fn list_by_position(
        &self,
        position: &str,
    ) -> Result<Vec<HandshakeRecord>, HandshakeError> {
        let mut records = Vec::new();
        for entry in self.db.scan_prefix(position_prefix(position)) {
            let (_, bytes) = entry?;
            records.push(minicbor::decode(&bytes)?);
        }
        Ok(records)
    }

    /// Create a fresh Offered record, or revive a Revoked one by restarting
    /// its lifecycle. Fails with `Conflict` if a live record already exists
    /// for the pair.
    pub fn create(
        &self,
        position: &str,
        bidder: &str,
        actor: &str,
    ) -> Result<HandshakeRecord, HandshakeError> {
        let key = record_key(position, bidder);
        loop {
            match self.db.get(&key)? {
                None => {
                    let record = HandshakeRecord::offered(position, bidder, actor);
                    let encoded = minicbor::to_vec(&record)?;
                    match self
                        .db
                        .compare_and_swap(&key, None::<&[u8]>, Some(encoded))?
                    {
                        Ok(()) => return Ok(record),
                        // lost the race to another writer, re-check
                        Err(CompareAndSwapError { .. }) => continue,
                    }
                }
                Some(bytes) => {
                    let mut record: HandshakeRecord = minicbor::decode(&bytes)?;
                    if record.status.is_live() {
                        return Err(HandshakeError::Conflict {
                            position: position.to_owned(),
                            holder: record.bidder_id,
                        });
                    }
                    record.reoffer(actor);
                    record.update_date = TimeStamp::new();
                    let encoded = minicbor::to_vec(&record)?;
                    match self
                        .db
                        .compare_and_swap(&key, Some(&bytes), Some(encoded))?
                    {
                        Ok(()) => return Ok(record),
                        Err(CompareAndSwapError { .. }) => continue,
                    }
                }
            }
        }
    }

    /// Apply `transform` to the record at (position, bidder) only if its
    /// current status is one of `expected`. `NotFound` covers both a missing
    /// record and a record in a disqualifying state.
    pub fn mutate<F>(
        &self,
        position: &str,
        bidder: &str,
        expected: &[HandshakeStatus],
        transform: F,
    ) -> Result<HandshakeRecord, HandshakeError>
    where
        F: Fn(&mut HandshakeRecord),
    {
        let key = record_key(position, bidder);
        loop {
            let Some(bytes) = self.db.get(&key)? else {
                return Err(HandshakeError::NotFound {
                    position: position.to_owned(),
                    bidder: bidder.to_owned(),
                });
            };
            let mut record: HandshakeRecord = minicbor::decode(&bytes)?;
            if !expected.contains(&record.status) {
                return Err(HandshakeError::NotFound {
                    position: position.to_owned(),
                    bidder: bidder.to_owned(),
                });
            }
            transform(&mut record);
            record.update_date = TimeStamp::new();
            let encoded = minicbor::to_vec(&record)?;
            match self
                .db
                .compare_and_swap(&key, Some(&bytes), Some(encoded))?
            {
                Ok(()) => return Ok(record),
                // another actor committed first, re-validate the precondition
                Err(CompareAndSwapError { .. }) => continue,
            }
        }
    }
}
