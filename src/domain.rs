use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One scraped row as produced by a jurisdiction's extractor.
///
/// `raw_data` is the verbatim source payload and is carried through to the
/// canonical record for audit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawCandidateRecord {
    pub jurisdiction: String,
    /// Label of the snapshot this row came from (usually a file name)
    pub source: String,
    /// When the snapshot was observed
    pub observed_at: DateTime<Utc>,
    pub election_year: Option<i32>,
    pub raw_data: serde_json::Value,
    /// Jurisdiction-specific fields, keyed by the source's own column names
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl RawCandidateRecord {
    /// Build a record whose fields are taken from a JSON object payload.
    pub fn from_payload(
        jurisdiction: &str,
        source: &str,
        observed_at: DateTime<Utc>,
        election_year: Option<i32>,
        payload: serde_json::Value,
    ) -> Self {
        let fields = payload.as_object().cloned().unwrap_or_default();
        Self {
            jurisdiction: jurisdiction.to_string(),
            source: source.to_string(),
            observed_at,
            election_year,
            raw_data: payload,
            fields,
        }
    }

    /// Non-blank string value for the first of `keys` present on the record.
    pub fn field(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| {
            self.fields
                .get(*key)
                .and_then(|v| match v {
                    serde_json::Value::String(s) => Some(s.trim().to_string()),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
        })
    }
}

/// All rows of one source snapshot for one jurisdiction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSnapshot {
    pub source: String,
    pub observed_at: DateTime<Utc>,
    pub records: Vec<RawCandidateRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedName {
    pub prefix: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub suffix: Option<String>,
    pub nickname: Option<String>,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    /// Digits only
    pub postal_code: Option<String>,
    /// A region code was found but has no known expansion
    pub region_ambiguous: bool,
}

/// Government level of an office category, in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OfficeTier {
    Federal,
    State,
    Local,
}

/// Fixed office taxonomy. Declaration order is the tie-break priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfficeCategory {
    UsPresident,
    UsSenate,
    UsHouse,
    Governor,
    LieutenantGovernor,
    AttorneyGeneral,
    SecretaryOfState,
    StateTreasurer,
    StateAuditor,
    StateSenate,
    StateHouse,
    StateSupremeCourt,
    Mayor,
    CityCouncil,
    CityCommission,
    CountyCommission,
    SchoolBoard,
    Sheriff,
    Constable,
    Coroner,
    Surveyor,
    CountyClerk,
    CountyAttorney,
    JusticeOfThePeace,
    CircuitJudge,
    DistrictJudge,
    CountyJudge,
    Judge,
    Unknown,
}

impl OfficeCategory {
    pub const ALL: [OfficeCategory; 28] = [
        OfficeCategory::UsPresident,
        OfficeCategory::UsSenate,
        OfficeCategory::UsHouse,
        OfficeCategory::Governor,
        OfficeCategory::LieutenantGovernor,
        OfficeCategory::AttorneyGeneral,
        OfficeCategory::SecretaryOfState,
        OfficeCategory::StateTreasurer,
        OfficeCategory::StateAuditor,
        OfficeCategory::StateSenate,
        OfficeCategory::StateHouse,
        OfficeCategory::StateSupremeCourt,
        OfficeCategory::Mayor,
        OfficeCategory::CityCouncil,
        OfficeCategory::CityCommission,
        OfficeCategory::CountyCommission,
        OfficeCategory::SchoolBoard,
        OfficeCategory::Sheriff,
        OfficeCategory::Constable,
        OfficeCategory::Coroner,
        OfficeCategory::Surveyor,
        OfficeCategory::CountyClerk,
        OfficeCategory::CountyAttorney,
        OfficeCategory::JusticeOfThePeace,
        OfficeCategory::CircuitJudge,
        OfficeCategory::DistrictJudge,
        OfficeCategory::CountyJudge,
        OfficeCategory::Judge,
    ];

    pub fn tier(&self) -> Option<OfficeTier> {
        use OfficeCategory::*;
        match self {
            UsPresident | UsSenate | UsHouse => Some(OfficeTier::Federal),
            Governor | LieutenantGovernor | AttorneyGeneral | SecretaryOfState
            | StateTreasurer | StateAuditor | StateSenate | StateHouse | StateSupremeCourt => {
                Some(OfficeTier::State)
            }
            Unknown => None,
            _ => Some(OfficeTier::Local),
        }
    }

    /// Human-readable label written to the `office` column.
    pub fn label(&self) -> &'static str {
        use OfficeCategory::*;
        match self {
            UsPresident => "US President",
            UsSenate => "US Senate",
            UsHouse => "US House",
            Governor => "Governor",
            LieutenantGovernor => "Lieutenant Governor",
            AttorneyGeneral => "State Attorney General",
            SecretaryOfState => "Secretary of State",
            StateTreasurer => "State Treasurer",
            StateAuditor => "State Auditor",
            StateSenate => "State Senate",
            StateHouse => "State House",
            StateSupremeCourt => "State Supreme Court",
            Mayor => "Mayor",
            CityCouncil => "City Council",
            CityCommission => "City Commission",
            CountyCommission => "County Commission",
            SchoolBoard => "School Board",
            Sheriff => "Sheriff",
            Constable => "Constable",
            Coroner => "Coroner",
            Surveyor => "Surveyor",
            CountyClerk => "County Clerk",
            CountyAttorney => "County Attorney",
            JusticeOfThePeace => "Justice of the Peace",
            CircuitJudge => "Circuit Judge",
            DistrictJudge => "District Judge",
            CountyJudge => "County Judge",
            Judge => "Judge",
            Unknown => "Unknown",
        }
    }

    pub fn is_executive(&self) -> bool {
        use OfficeCategory::*;
        matches!(self, UsPresident | Governor | LieutenantGovernor | Mayor)
    }
}

impl fmt::Display for OfficeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{:?}", self));
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandardizedOffice {
    pub category: OfficeCategory,
    /// Self-reported belief in the categorization (0.0 to 1.0)
    pub confidence: f64,
    pub label: String,
}

impl StandardizedOffice {
    pub fn unknown(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            category: OfficeCategory::Unknown,
            confidence,
            label: label.into(),
        }
    }
}

/// Which contests of an election cycle a candidacy appeared in.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElectionTypes {
    pub ran_in_primary: bool,
    pub ran_in_general: bool,
    pub ran_in_special: bool,
}

impl ElectionTypes {
    /// Union of both flag sets.
    pub fn merge(self, other: ElectionTypes) -> ElectionTypes {
        ElectionTypes {
            ran_in_primary: self.ran_in_primary || other.ran_in_primary,
            ran_in_general: self.ran_in_general || other.ran_in_general,
            ran_in_special: self.ran_in_special || other.ran_in_special,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.ran_in_primary || self.ran_in_general || self.ran_in_special)
    }
}

/// A record after jurisdiction cleaning, using the standard field names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanedRecord {
    pub jurisdiction: String,
    pub source: String,
    pub observed_at: DateTime<Utc>,
    pub election_year: Option<i32>,
    pub name: ParsedName,
    pub office: Option<String>,
    pub district: Option<String>,
    pub party: Option<String>,
    pub address: NormalizedAddress,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub filing_date: Option<String>,
    pub election_date: Option<String>,
    /// Free-text contest label, e.g. "Primary, General"
    pub election_type: Option<String>,
    pub raw_data: serde_json::Value,
}

/// The canonical candidate record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateRecord {
    pub stable_id: Option<String>,
    pub jurisdiction: String,
    pub election_year: Option<i32>,
    pub name: ParsedName,
    pub office: StandardizedOffice,
    /// Office text as it arrived from the cleaner
    pub source_office: Option<String>,
    pub district: Option<String>,
    pub party: Option<String>,
    pub source_party: Option<String>,
    pub address: NormalizedAddress,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub filing_date: Option<String>,
    pub election_date: Option<String>,
    #[serde(default)]
    pub election_types: ElectionTypes,
    pub first_added_date: DateTime<Utc>,
    pub last_updated_date: DateTime<Utc>,
    pub contributing_sources: BTreeSet<String>,
    pub raw_data: serde_json::Value,
}

impl CandidateRecord {
    pub fn dedup_key(&self) -> DeduplicationKey {
        DeduplicationKey::new(
            &self.name.display_name,
            &self.jurisdiction,
            self.office.category,
            self.election_year,
        )
    }
}

/// Records sharing this key denote one candidacy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeduplicationKey {
    pub full_name_display: String,
    pub jurisdiction: String,
    pub office_category: OfficeCategory,
    pub election_year: Option<i32>,
}

impl DeduplicationKey {
    /// Name and jurisdiction are case-folded and whitespace-collapsed.
    pub fn new(
        full_name_display: &str,
        jurisdiction: &str,
        office_category: OfficeCategory,
        election_year: Option<i32>,
    ) -> Self {
        Self {
            full_name_display: fold(full_name_display),
            jurisdiction: fold(jurisdiction),
            office_category,
            election_year,
        }
    }

    /// Canonical text fed to the stable id hash.
    pub fn signature(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.full_name_display,
            self.jurisdiction,
            self.office_category,
            self.election_year.map(|y| y.to_string()).unwrap_or_default()
        )
    }
}

fn fold(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
