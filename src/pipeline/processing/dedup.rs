//! Snapshot merging and candidate deduplication.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;

use crate::domain::{
    CandidateRecord, DeduplicationKey, ElectionTypes, NormalizedAddress, RawCandidateRecord,
    SourceSnapshot,
};
use crate::error::{PipelineError, Result};
use crate::pipeline::Phase;

/// Hex characters kept from the SHA-256 digest.
pub const STABLE_ID_LEN: usize = 16;

/// Concatenate every snapshot's rows for one jurisdiction. Nothing is
/// filtered or reordered within a snapshot.
pub fn merge_snapshots(snapshots: Vec<SourceSnapshot>) -> Vec<RawCandidateRecord> {
    let total: usize = snapshots.iter().map(|s| s.records.len()).sum();
    let mut merged = Vec::with_capacity(total);
    for snapshot in snapshots {
        merged.extend(snapshot.records);
    }
    debug_assert_eq!(merged.len(), total);
    merged
}

/// Deterministic identity for a deduplication key.
pub fn stable_id(key: &DeduplicationKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.signature().as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..STABLE_ID_LEN].to_string()
}

/// Tracks id → key so two different keys can never share an id.
#[derive(Default)]
struct IdLedger {
    owners: HashMap<String, DeduplicationKey>,
}

impl IdLedger {
    fn claim(&mut self, key: &DeduplicationKey, record: &CandidateRecord) -> Result<String> {
        let id = stable_id(key);
        if let Some(existing) = record.stable_id.as_deref() {
            if existing != id {
                return Err(PipelineError::integrity(
                    Phase::Deduplication,
                    format!(
                        "record carries stable_id {} but its key {} hashes to {}",
                        existing,
                        key.signature(),
                        id
                    ),
                ));
            }
        }
        match self.owners.get(&id) {
            Some(owner) if owner != key => Err(PipelineError::integrity(
                Phase::Deduplication,
                format!(
                    "stable_id {} collides for keys {} and {}",
                    id,
                    owner.signature(),
                    key.signature()
                ),
            )),
            Some(_) => Ok(id),
            None => {
                self.owners.insert(id.clone(), key.clone());
                Ok(id)
            }
        }
    }
}

/// Group records by [`DeduplicationKey`] and fold each group into one record.
///
/// Groups keep first-seen order. Within a group every non-key field takes the
/// most recently observed non-null value, with ties going to the record seen
/// first. Running this on its own output returns the same records.
pub fn deduplicate(records: Vec<CandidateRecord>) -> Result<Vec<CandidateRecord>> {
    let input_len = records.len();
    let mut order: Vec<DeduplicationKey> = Vec::new();
    let mut groups: HashMap<DeduplicationKey, Vec<CandidateRecord>> = HashMap::new();

    for record in records {
        let key = record.dedup_key();
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(record);
    }

    let mut ledger = IdLedger::default();
    let mut merged = Vec::with_capacity(order.len());
    for key in order {
        let group = groups.remove(&key).unwrap_or_default();
        let mut id = None;
        for record in &group {
            id = Some(ledger.claim(&key, record)?);
        }
        if let Some(mut record) = merge_group(group) {
            record.stable_id = id;
            merged.push(record);
        }
    }

    debug!(input = input_len, output = merged.len(), "Deduplication complete");
    Ok(merged)
}

/// Give every record its stable id without collapsing duplicates.
pub fn assign_stable_ids(records: Vec<CandidateRecord>) -> Result<Vec<CandidateRecord>> {
    let mut ledger = IdLedger::default();
    records
        .into_iter()
        .map(|mut record| {
            let key = record.dedup_key();
            record.stable_id = Some(ledger.claim(&key, &record)?);
            Ok(record)
        })
        .collect()
}

/// Most recent non-null value; earlier records win ties.
fn freshest<T, F>(group: &[CandidateRecord], get: F) -> Option<T>
where
    T: Clone,
    F: Fn(&CandidateRecord) -> Option<&T>,
{
    let mut best: Option<(DateTime<Utc>, &T)> = None;
    for record in group {
        if let Some(value) = get(record) {
            match best {
                Some((seen, _)) if record.last_updated_date <= seen => {}
                _ => best = Some((record.last_updated_date, value)),
            }
        }
    }
    best.map(|(_, v)| v.clone())
}

fn merge_group(group: Vec<CandidateRecord>) -> Option<CandidateRecord> {
    if group.len() <= 1 {
        return group.into_iter().next();
    }

    let region_source = group
        .iter()
        .filter(|r| r.address.region.is_some())
        .fold(None::<&CandidateRecord>, |best, r| match best {
            Some(b) if r.last_updated_date <= b.last_updated_date => Some(b),
            _ => Some(r),
        });
    let address = NormalizedAddress {
        street: freshest(&group, |r| r.address.street.as_ref()),
        city: freshest(&group, |r| r.address.city.as_ref()),
        region: region_source.and_then(|r| r.address.region.clone()),
        postal_code: freshest(&group, |r| r.address.postal_code.as_ref()),
        region_ambiguous: region_source.map(|r| r.address.region_ambiguous).unwrap_or(false),
    };

    let name = freshest(&group, |r| Some(&r.name).filter(|n| !n.display_name.is_empty()));
    let office = freshest(&group, |r| Some(&r.office));
    let raw_data = freshest(&group, |r| Some(&r.raw_data).filter(|v| !v.is_null()));

    let first_added_date = group.iter().map(|r| r.first_added_date).min()?;
    let last_updated_date = group.iter().map(|r| r.last_updated_date).max()?;
    let contributing_sources = group
        .iter()
        .flat_map(|r| r.contributing_sources.iter().cloned())
        .collect();
    let election_types = group
        .iter()
        .fold(ElectionTypes::default(), |acc, r| acc.merge(r.election_types));

    Some(CandidateRecord {
        stable_id: None,
        jurisdiction: group[0].jurisdiction.clone(),
        election_year: group[0].election_year,
        name: name.unwrap_or_else(|| group[0].name.clone()),
        office: office.unwrap_or_else(|| group[0].office.clone()),
        source_office: freshest(&group, |r| r.source_office.as_ref()),
        district: freshest(&group, |r| r.district.as_ref()),
        party: freshest(&group, |r| r.party.as_ref()),
        source_party: freshest(&group, |r| r.source_party.as_ref()),
        address,
        phone: freshest(&group, |r| r.phone.as_ref()),
        email: freshest(&group, |r| r.email.as_ref()),
        facebook: freshest(&group, |r| r.facebook.as_ref()),
        twitter: freshest(&group, |r| r.twitter.as_ref()),
        filing_date: freshest(&group, |r| r.filing_date.as_ref()),
        election_date: freshest(&group, |r| r.election_date.as_ref()),
        election_types,
        first_added_date,
        last_updated_date,
        contributing_sources,
        raw_data: raw_data.unwrap_or(serde_json::Value::Null),
    })
}
