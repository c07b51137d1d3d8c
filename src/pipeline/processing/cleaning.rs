//! State cleaning: mapping jurisdiction-specific raw rows onto standard fields.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::app::ports::StateCleaner;
use crate::domain::{CleanedRecord, NormalizedAddress, RawCandidateRecord};
use crate::error::Result;
use crate::pipeline::processing::address::{
    expand_region, normalize_address, normalize_phone, normalize_postal_code,
};
use crate::pipeline::processing::name_parser;
use crate::pipeline::processing::office::clean_district_value;
use crate::pipeline::PhaseContext;

const NAME_FIELDS: &[&str] = &["candidate_name", "name", "full_name", "candidate", "ballot_name"];
const FIRST_NAME_FIELDS: &[&str] = &["first_name", "first"];
const MIDDLE_NAME_FIELDS: &[&str] = &["middle_name", "middle"];
const LAST_NAME_FIELDS: &[&str] = &["last_name", "last"];
const OFFICE_FIELDS: &[&str] = &["office", "office_name", "contest", "position", "race"];
const DISTRICT_FIELDS: &[&str] = &["district", "district_name", "district_number"];
const PARTY_FIELDS: &[&str] = &["party", "party_affiliation", "party_name"];
const FULL_ADDRESS_FIELDS: &[&str] = &["address", "mailing_address", "full_address"];
const STREET_FIELDS: &[&str] = &["street_address", "address_line1", "street"];
const CITY_FIELDS: &[&str] = &["city", "address_city", "mailing_city"];
const REGION_FIELDS: &[&str] = &["address_state", "state", "mailing_state"];
const POSTAL_FIELDS: &[&str] = &["zip", "zip_code", "postal_code", "zipcode"];
const PHONE_FIELDS: &[&str] = &["phone", "phone_number", "telephone"];
const EMAIL_FIELDS: &[&str] = &["email", "email_address"];
const FACEBOOK_FIELDS: &[&str] = &["facebook", "facebook_url"];
const TWITTER_FIELDS: &[&str] = &["twitter", "twitter_handle", "x"];
const FILING_DATE_FIELDS: &[&str] = &["filing_date", "date_filed", "filed"];
const ELECTION_DATE_FIELDS: &[&str] = &["election_date"];
const ELECTION_TYPE_FIELDS: &[&str] = &["election_type", "election", "election_name", "race_type"];
const ELECTION_YEAR_FIELDS: &[&str] = &["election_year", "year"];

/// Generic cleaner applied when a jurisdiction has no dedicated one, and the
/// base every dedicated cleaner builds on.
#[derive(Debug, Default, Clone)]
pub struct BaseCleaner;

impl BaseCleaner {
    pub fn new() -> Self {
        Self
    }

    pub fn clean_record(&self, record: &RawCandidateRecord) -> CleanedRecord {
        let name = match record.field(NAME_FIELDS) {
            Some(full) => name_parser::parse(&full),
            None => {
                let composed = [FIRST_NAME_FIELDS, MIDDLE_NAME_FIELDS, LAST_NAME_FIELDS]
                    .iter()
                    .filter_map(|keys| record.field(keys))
                    .collect::<Vec<_>>()
                    .join(" ");
                name_parser::parse(&composed)
            }
        };

        let election_year = record.election_year.or_else(|| {
            record
                .field(ELECTION_YEAR_FIELDS)
                .and_then(|y| y.trim_end_matches(".0").parse::<i32>().ok())
        });

        CleanedRecord {
            jurisdiction: record.jurisdiction.clone(),
            source: record.source.clone(),
            observed_at: record.observed_at,
            election_year,
            name,
            office: record.field(OFFICE_FIELDS),
            district: record
                .field(DISTRICT_FIELDS)
                .and_then(|d| clean_district_value(&d)),
            party: record.field(PARTY_FIELDS),
            address: self.clean_address(record),
            phone: record.field(PHONE_FIELDS).and_then(|p| normalize_phone(&p)),
            email: record.field(EMAIL_FIELDS).map(|e| e.to_lowercase()),
            facebook: record.field(FACEBOOK_FIELDS),
            twitter: record.field(TWITTER_FIELDS),
            filing_date: record.field(FILING_DATE_FIELDS),
            election_date: record.field(ELECTION_DATE_FIELDS),
            election_type: record.field(ELECTION_TYPE_FIELDS),
            raw_data: record.raw_data.clone(),
        }
    }

    /// One-line address first, then any split columns override its parts.
    fn clean_address(&self, record: &RawCandidateRecord) -> NormalizedAddress {
        let mut address = record
            .field(FULL_ADDRESS_FIELDS)
            .map(|a| normalize_address(&a))
            .unwrap_or_default();

        if let Some(street) = record.field(STREET_FIELDS) {
            address.street = Some(street);
        }
        if let Some(city) = record.field(CITY_FIELDS) {
            address.city = Some(city);
        }
        if let Some(region) = record.field(REGION_FIELDS) {
            match expand_region(&region) {
                Some(name) => {
                    address.region = Some(name.to_string());
                    address.region_ambiguous = false;
                }
                None => {
                    address.region = Some(region);
                    address.region_ambiguous = true;
                }
            }
        }
        if let Some(postal) = record.field(POSTAL_FIELDS).and_then(|p| normalize_postal_code(&p)) {
            address.postal_code = Some(postal);
        }
        address
    }
}

impl StateCleaner for BaseCleaner {
    fn clean(&self, _ctx: &PhaseContext, records: Vec<RawCandidateRecord>) -> Result<Vec<CleanedRecord>> {
        Ok(records.iter().map(|r| self.clean_record(r)).collect())
    }
}

/// Renames a jurisdiction's own column names onto the standard ones, then
/// delegates to [`BaseCleaner`].
///
/// Aliases apply in source-column order. When several columns map onto the
/// same standard field, the first one present in the record wins and a
/// standard field already in the record is never overwritten.
#[derive(Debug, Clone, Default)]
pub struct FieldAliasCleaner {
    aliases: BTreeMap<String, String>,
    base: BaseCleaner,
}

impl FieldAliasCleaner {
    pub fn new(aliases: BTreeMap<String, String>) -> Self {
        Self {
            aliases,
            base: BaseCleaner::new(),
        }
    }

    fn rename(&self, mut record: RawCandidateRecord) -> RawCandidateRecord {
        for (source_field, standard_field) in &self.aliases {
            if let Some(value) = record.fields.remove(source_field) {
                record.fields.entry(standard_field.clone()).or_insert(value);
            }
        }
        record
    }
}

impl StateCleaner for FieldAliasCleaner {
    fn clean(&self, ctx: &PhaseContext, records: Vec<RawCandidateRecord>) -> Result<Vec<CleanedRecord>> {
        let renamed = records.into_iter().map(|r| self.rename(r)).collect();
        self.base.clean(ctx, renamed)
    }
}

/// Jurisdiction → cleaner lookup. Jurisdictions without an entry use the
/// generic cleaner.
pub struct CleanerRegistry {
    cleaners: HashMap<String, Arc<dyn StateCleaner>>,
    fallback: Arc<dyn StateCleaner>,
}

impl Default for CleanerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanerRegistry {
    pub fn new() -> Self {
        Self {
            cleaners: HashMap::new(),
            fallback: Arc::new(BaseCleaner::new()),
        }
    }

    pub fn register(&mut self, jurisdiction: impl Into<String>, cleaner: Arc<dyn StateCleaner>) {
        self.cleaners.insert(jurisdiction.into().to_lowercase(), cleaner);
    }

    /// Dedicated cleaner for the jurisdiction, if one was registered.
    pub fn get(&self, jurisdiction: &str) -> Option<Arc<dyn StateCleaner>> {
        self.cleaners.get(&jurisdiction.to_lowercase()).cloned()
    }

    pub fn get_or_generic(&self, jurisdiction: &str) -> Arc<dyn StateCleaner> {
        self.get(jurisdiction).unwrap_or_else(|| self.generic())
    }

    pub fn generic(&self) -> Arc<dyn StateCleaner> {
        Arc::clone(&self.fallback)
    }

    pub fn list_jurisdictions(&self) -> Vec<&str> {
        self.cleaners.keys().map(|k| k.as_str()).collect()
    }
}
