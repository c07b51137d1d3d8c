//! National standardization: office taxonomy, party vocabulary, districts,
//! election types and casing applied uniformly to every jurisdiction's
//! cleaned rows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::{
    CandidateRecord, CleanedRecord, ElectionTypes, OfficeCategory, StandardizedOffice,
};
use crate::pipeline::processing::casing::{proper_case, proper_case_name};
use crate::pipeline::processing::election_type;
use crate::pipeline::processing::office::{extract_district, OfficeStandardizer};
use crate::pipeline::processing::party::PartyStandardizer;

/// A row dropped before it could become a candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RejectedRecord {
    pub jurisdiction: String,
    pub source: String,
    pub reason: String,
}

pub struct NationalStandardizer {
    offices: Arc<OfficeStandardizer>,
    parties: PartyStandardizer,
}

impl Default for NationalStandardizer {
    fn default() -> Self {
        Self::new(OfficeStandardizer::shared())
    }
}

impl NationalStandardizer {
    pub fn new(offices: Arc<OfficeStandardizer>) -> Self {
        Self {
            offices,
            parties: PartyStandardizer::new(),
        }
    }

    /// Standardize one cleaned row into a canonical candidate.
    pub fn standardize(&self, mut record: CleanedRecord) -> CandidateRecord {
        let office = self.offices.standardize(record.office.as_deref().unwrap_or(""));
        let district = record
            .district
            .clone()
            .or_else(|| record.office.as_deref().and_then(extract_district))
            .map(|d| proper_case(&d));
        let party = self.parties.standardize(record.party.as_deref());
        let election_types = election_type::classify(record.election_type.as_deref());

        record.name = proper_case_name(&record.name);
        record.address.city = record.address.city.as_deref().map(proper_case);
        into_candidate(record, office, district, party, election_types)
    }

    /// Standardize a batch, dropping rows with no usable name.
    pub fn standardize_batch(
        &self,
        records: Vec<CleanedRecord>,
    ) -> (Vec<CandidateRecord>, Vec<RejectedRecord>) {
        let (named, rejected) = split_nameless(records);
        (named.into_iter().map(|r| self.standardize(r)).collect(), rejected)
    }
}

/// Separate rows whose parsed name is blank; they cannot form a key.
pub fn split_nameless(records: Vec<CleanedRecord>) -> (Vec<CleanedRecord>, Vec<RejectedRecord>) {
    let mut named = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();
    for record in records {
        if record.name.display_name.trim().is_empty() {
            rejected.push(RejectedRecord {
                jurisdiction: record.jurisdiction.clone(),
                source: record.source.clone(),
                reason: "candidate name is blank".to_string(),
            });
        } else {
            named.push(record);
        }
    }
    (named, rejected)
}

/// Used when national standardization is switched off: the office stays
/// Unknown but keeps its source label, party and district pass through, and
/// no election type is derived.
pub fn passthrough(record: CleanedRecord) -> CandidateRecord {
    let label = record
        .office
        .clone()
        .unwrap_or_else(|| OfficeCategory::Unknown.label().to_string());
    let district = record.district.clone();
    let party = record.party.clone();
    into_candidate(
        record,
        StandardizedOffice::unknown(label, 0.0),
        district,
        party,
        ElectionTypes::default(),
    )
}

fn into_candidate(
    record: CleanedRecord,
    office: StandardizedOffice,
    district: Option<String>,
    party: Option<String>,
    election_types: ElectionTypes,
) -> CandidateRecord {
    CandidateRecord {
        stable_id: None,
        jurisdiction: record.jurisdiction,
        election_year: record.election_year,
        name: record.name,
        office,
        source_office: record.office,
        district,
        party,
        source_party: record.party,
        address: record.address,
        phone: record.phone,
        email: record.email,
        facebook: record.facebook,
        twitter: record.twitter,
        filing_date: record.filing_date,
        election_date: record.election_date,
        election_types,
        first_added_date: record.observed_at,
        last_updated_date: record.observed_at,
        contributing_sources: BTreeSet::from([record.source]),
        raw_data: record.raw_data,
    }
}
