//! Final assembly: canonical column order, schema conformance and the data
//! quality report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::domain::{CandidateRecord, OfficeCategory};
use crate::error::{PipelineError, Result};
use crate::pipeline::processing::office::unmatched_offices;
use crate::pipeline::Phase;

/// Output columns, in order.
pub const CANONICAL_COLUMNS: [&str; 24] = [
    "stable_id",
    "jurisdiction",
    "full_name_display",
    "prefix",
    "first_name",
    "middle_name",
    "last_name",
    "suffix",
    "nickname",
    "office",
    "district",
    "party",
    "street_address",
    "city",
    "address_region",
    "postal_code",
    "phone",
    "email",
    "facebook",
    "twitter",
    "filing_date",
    "election_date",
    "first_added_date",
    "last_updated_date",
];

const REQUIRED_COLUMNS: [&str; 4] = ["stable_id", "jurisdiction", "full_name_display", "office"];

/// One row of the final table. Field order is the canonical column order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalRow {
    pub stable_id: String,
    pub jurisdiction: String,
    pub full_name_display: String,
    pub prefix: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub suffix: Option<String>,
    pub nickname: Option<String>,
    pub office: String,
    pub district: Option<String>,
    pub party: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub address_region: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub filing_date: Option<String>,
    pub election_date: Option<String>,
    pub first_added_date: DateTime<Utc>,
    pub last_updated_date: DateTime<Utc>,
}

impl CanonicalRow {
    pub fn from_record(record: &CandidateRecord) -> Self {
        Self {
            stable_id: record.stable_id.clone().unwrap_or_default(),
            jurisdiction: record.jurisdiction.clone(),
            full_name_display: record.name.display_name.clone(),
            prefix: record.name.prefix.clone(),
            first_name: record.name.first_name.clone(),
            middle_name: record.name.middle_name.clone(),
            last_name: record.name.last_name.clone(),
            suffix: record.name.suffix.clone(),
            nickname: record.name.nickname.clone(),
            office: record.office.label.clone(),
            district: record.district.clone(),
            party: record.party.clone(),
            street_address: record.address.street.clone(),
            city: record.address.city.clone(),
            address_region: record.address.region.clone(),
            postal_code: record.address.postal_code.clone(),
            phone: record.phone.clone(),
            email: record.email.clone(),
            facebook: record.facebook.clone(),
            twitter: record.twitter.clone(),
            filing_date: record.filing_date.clone(),
            election_date: record.election_date.clone(),
            first_added_date: record.first_added_date,
            last_updated_date: record.last_updated_date,
        }
    }

    /// Column values in canonical order; `None` for nulls.
    pub fn values(&self) -> [Option<String>; 24] {
        [
            Some(self.stable_id.clone()),
            Some(self.jurisdiction.clone()),
            Some(self.full_name_display.clone()),
            self.prefix.clone(),
            self.first_name.clone(),
            self.middle_name.clone(),
            self.last_name.clone(),
            self.suffix.clone(),
            self.nickname.clone(),
            Some(self.office.clone()),
            self.district.clone(),
            self.party.clone(),
            self.street_address.clone(),
            self.city.clone(),
            self.address_region.clone(),
            self.postal_code.clone(),
            self.phone.clone(),
            self.email.clone(),
            self.facebook.clone(),
            self.twitter.clone(),
            self.filing_date.clone(),
            self.election_date.clone(),
            Some(self.first_added_date.to_rfc3339()),
            Some(self.last_updated_date.to_rfc3339()),
        ]
    }
}

/// Types of quality issues raised by the audit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum QualityIssueType {
    /// Missing required data
    MissingData,
    /// Invalid format or structure
    InvalidFormat,
    /// Suspicious or anomalous values
    SuspiciousValue,
    /// Confidence below threshold
    LowConfidence,
    /// Duplicate detection concerns
    DuplicationConcern,
}

/// Severity levels for quality issues
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, PartialOrd)]
pub enum QualitySeverity {
    Info,
    Warning,
    Error,
}

/// Individual quality issue found during the audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    pub issue_type: QualityIssueType,
    pub severity: QualitySeverity,
    pub description: String,
    /// Column that triggered this issue
    pub field: Option<String>,
    /// Number of rows affected
    pub count: usize,
}

/// Per-jurisdiction completeness figures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JurisdictionAudit {
    pub jurisdiction: String,
    pub total_records: usize,
    pub duplicates: usize,
    pub null_values: usize,
    pub empty_strings: usize,
    pub whitespace_only: usize,
    /// 0 to 100
    pub quality_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuditReport {
    pub total_rows: usize,
    pub jurisdictions: Vec<JurisdictionAudit>,
    pub unknown_offices: usize,
    pub low_confidence_offices: usize,
    pub ambiguous_regions: usize,
    /// Unknown office labels and how often each occurred
    pub unmatched_offices: BTreeMap<String, usize>,
    pub issues: Vec<QualityIssue>,
    /// Row-weighted mean of the per-jurisdiction scores
    pub quality_score: f64,
}

/// Output of FINAL_ASSEMBLY.
#[derive(Debug, Clone)]
pub struct FinalAssembly {
    pub rows: Vec<CanonicalRow>,
    pub report: AuditReport,
}

/// 100 minus penalties for duplicate, null, empty and whitespace-only cells.
pub fn quality_score(
    total_records: usize,
    duplicates: usize,
    null_values: usize,
    empty_strings: usize,
    whitespace_only: usize,
) -> f64 {
    if total_records == 0 {
        return 0.0;
    }
    let total = total_records as f64;
    let cells = total * CANONICAL_COLUMNS.len() as f64;
    let duplicate_penalty = duplicates as f64 / total * 30.0;
    let null_penalty = null_values as f64 / cells * 20.0;
    let empty_penalty = empty_strings as f64 / total * 25.0;
    let whitespace_penalty = whitespace_only as f64 / total * 25.0;
    (100.0 - duplicate_penalty - null_penalty - empty_penalty - whitespace_penalty).clamp(0.0, 100.0)
}

/// Reject rows that would break the output table.
pub fn check_schema(rows: &[CanonicalRow]) -> Result<()> {
    for (index, row) in rows.iter().enumerate() {
        let values = row.values();
        for column in REQUIRED_COLUMNS {
            let position = CANONICAL_COLUMNS
                .iter()
                .position(|c| *c == column)
                .unwrap_or_default();
            let blank = values[position].as_deref().map_or(true, |v| v.trim().is_empty());
            if blank {
                return Err(PipelineError::integrity(
                    Phase::FinalAssembly,
                    format!("row {} has no value for required column {}", index, column),
                ));
            }
        }
        if row.first_added_date > row.last_updated_date {
            return Err(PipelineError::integrity(
                Phase::FinalAssembly,
                format!(
                    "row {} ({}) was first added after its last update",
                    index, row.stable_id
                ),
            ));
        }
    }
    Ok(())
}

/// Order, audit and schema-check the deduplicated records.
pub fn assemble(records: &[CandidateRecord], low_confidence_threshold: f64) -> Result<FinalAssembly> {
    let rows: Vec<CanonicalRow> = records.iter().map(CanonicalRow::from_record).collect();
    check_schema(&rows)?;
    let report = audit(records, &rows, low_confidence_threshold);
    Ok(FinalAssembly { rows, report })
}

/// Build the quality report for assembled rows.
pub fn audit(records: &[CandidateRecord], rows: &[CanonicalRow], low_confidence_threshold: f64) -> AuditReport {
    let mut by_jurisdiction: BTreeMap<&str, Vec<&CanonicalRow>> = BTreeMap::new();
    for row in rows {
        by_jurisdiction.entry(row.jurisdiction.as_str()).or_default().push(row);
    }

    let jurisdictions: Vec<JurisdictionAudit> = by_jurisdiction
        .into_iter()
        .map(|(jurisdiction, rows)| audit_jurisdiction(jurisdiction, &rows))
        .collect();

    let total_rows = rows.len();
    let quality_score = if total_rows == 0 {
        0.0
    } else {
        jurisdictions
            .iter()
            .map(|j| j.quality_score * j.total_records as f64)
            .sum::<f64>()
            / total_rows as f64
    };

    let unknown_offices = records
        .iter()
        .filter(|r| r.office.category == OfficeCategory::Unknown)
        .count();
    let low_confidence_offices = records
        .iter()
        .filter(|r| r.office.category != OfficeCategory::Unknown)
        .filter(|r| r.office.confidence < low_confidence_threshold)
        .count();
    let ambiguous_regions = records.iter().filter(|r| r.address.region_ambiguous).count();

    let mut issues = Vec::new();
    if unknown_offices > 0 {
        issues.push(QualityIssue {
            issue_type: QualityIssueType::LowConfidence,
            severity: QualitySeverity::Warning,
            description: format!("{} rows have an office outside the taxonomy", unknown_offices),
            field: Some("office".to_string()),
            count: unknown_offices,
        });
    }
    if low_confidence_offices > 0 {
        issues.push(QualityIssue {
            issue_type: QualityIssueType::LowConfidence,
            severity: QualitySeverity::Info,
            description: format!(
                "{} office matches scored below {:.2}",
                low_confidence_offices, low_confidence_threshold
            ),
            field: Some("office".to_string()),
            count: low_confidence_offices,
        });
    }
    if ambiguous_regions > 0 {
        issues.push(QualityIssue {
            issue_type: QualityIssueType::SuspiciousValue,
            severity: QualitySeverity::Warning,
            description: format!("{} addresses carry an unrecognised region code", ambiguous_regions),
            field: Some("address_region".to_string()),
            count: ambiguous_regions,
        });
    }
    let bad_postal = rows
        .iter()
        .filter_map(|r| r.postal_code.as_deref())
        .filter(|p| p.len() != 5 || !p.chars().all(|c| c.is_ascii_digit()))
        .count();
    if bad_postal > 0 {
        issues.push(QualityIssue {
            issue_type: QualityIssueType::InvalidFormat,
            severity: QualitySeverity::Warning,
            description: format!("{} postal codes are not five digits", bad_postal),
            field: Some("postal_code".to_string()),
            count: bad_postal,
        });
    }
    let bad_email = rows
        .iter()
        .filter_map(|r| r.email.as_deref())
        .filter(|e| !e.contains('@'))
        .count();
    if bad_email > 0 {
        issues.push(QualityIssue {
            issue_type: QualityIssueType::InvalidFormat,
            severity: QualitySeverity::Info,
            description: format!("{} email values have no @", bad_email),
            field: Some("email".to_string()),
            count: bad_email,
        });
    }
    let duplicates: usize = jurisdictions.iter().map(|j| j.duplicates).sum();
    if duplicates > 0 {
        issues.push(QualityIssue {
            issue_type: QualityIssueType::DuplicationConcern,
            severity: QualitySeverity::Error,
            description: format!("{} rows repeat an earlier stable_id", duplicates),
            field: Some("stable_id".to_string()),
            count: duplicates,
        });
    }
    let missing_party = rows.iter().filter(|r| r.party.is_none()).count();
    if missing_party > 0 {
        issues.push(QualityIssue {
            issue_type: QualityIssueType::MissingData,
            severity: QualitySeverity::Info,
            description: format!("{} rows have no party", missing_party),
            field: Some("party".to_string()),
            count: missing_party,
        });
    }

    AuditReport {
        total_rows,
        jurisdictions,
        unknown_offices,
        low_confidence_offices,
        ambiguous_regions,
        unmatched_offices: unmatched_offices(records.iter().map(|r| &r.office)),
        issues,
        quality_score,
    }
}

fn audit_jurisdiction(jurisdiction: &str, rows: &[&CanonicalRow]) -> JurisdictionAudit {
    let mut seen = HashSet::new();
    let mut duplicates = 0;
    let mut null_values = 0;
    let mut empty_strings = 0;
    let mut whitespace_only = 0;

    for row in rows {
        if !seen.insert(row.stable_id.as_str()) {
            duplicates += 1;
        }
        for value in row.values() {
            match value {
                None => null_values += 1,
                Some(v) if v.is_empty() => empty_strings += 1,
                Some(v) if v.trim().is_empty() => whitespace_only += 1,
                Some(_) => {}
            }
        }
    }

    JurisdictionAudit {
        jurisdiction: jurisdiction.to_string(),
        total_records: rows.len(),
        duplicates,
        null_values,
        empty_strings,
        whitespace_only,
        quality_score: quality_score(rows.len(), duplicates, null_values, empty_strings, whitespace_only),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ElectionTypes, NormalizedAddress, StandardizedOffice};
    use crate::pipeline::processing::name_parser;
    use std::collections::BTreeSet;

    fn record(name: &str, id: &str) -> CandidateRecord {
        let now = Utc::now();
        CandidateRecord {
            stable_id: Some(id.to_string()),
            jurisdiction: "alaska".to_string(),
            election_year: Some(2024),
            name: name_parser::parse(name),
            office: StandardizedOffice {
                category: OfficeCategory::Governor,
                confidence: 1.0,
                label: "Governor".to_string(),
            },
            source_office: Some("Governor".to_string()),
            district: None,
            party: Some("Republican".to_string()),
            source_party: None,
            address: NormalizedAddress::default(),
            phone: None,
            email: None,
            facebook: None,
            twitter: None,
            filing_date: None,
            election_date: None,
            election_types: ElectionTypes::default(),
            first_added_date: now,
            last_updated_date: now,
            contributing_sources: BTreeSet::new(),
            raw_data: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_row_serializes_in_canonical_column_order() {
        let row = CanonicalRow::from_record(&record("Sam Reed", "abc"));
        let value = serde_json::to_value(&row).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        // serde_json's default map is sorted, so compare as sets and check the
        // serialized text for order
        assert_eq!(keys.len(), CANONICAL_COLUMNS.len());
        let text = serde_json::to_string(&row).unwrap();
        let positions: Vec<usize> = CANONICAL_COLUMNS
            .iter()
            .map(|c| text.find(&format!("\"{}\":", c)).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_schema_check_rejects_missing_required_values() {
        let ok = CanonicalRow::from_record(&record("Sam Reed", "abc"));
        assert!(check_schema(&[ok.clone()]).is_ok());

        let mut no_id = ok.clone();
        no_id.stable_id = String::new();
        let err = check_schema(&[no_id]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::AggregateIntegrity { phase: Phase::FinalAssembly, .. }
        ));

        let mut no_office = ok;
        no_office.office = "  ".to_string();
        assert!(check_schema(&[no_office]).is_err());
    }

    #[test]
    fn test_quality_score_formula() {
        assert_eq!(quality_score(0, 0, 0, 0, 0), 0.0);
        assert_eq!(quality_score(10, 0, 0, 0, 0), 100.0);
        // one duplicate in ten rows costs 3 points
        assert!((quality_score(10, 1, 0, 0, 0) - 97.0).abs() < 1e-9);
        assert_eq!(quality_score(1, 5, 0, 0, 0), 0.0);
    }

    #[test]
    fn test_assemble_reports_unknown_and_duplicates() {
        let mut unknown = record("Ann Lee", "def");
        unknown.office = StandardizedOffice::unknown("Dog Catcher", 0.2);
        let records = vec![record("Sam Reed", "abc"), unknown, record("Sam Reed", "abc")];

        let assembly = assemble(&records, 0.85).unwrap();
        assert_eq!(assembly.rows.len(), 3);
        assert_eq!(assembly.report.unknown_offices, 1);
        assert_eq!(assembly.report.unmatched_offices.get("Dog Catcher"), Some(&1));
        assert_eq!(assembly.report.jurisdictions.len(), 1);
        assert_eq!(assembly.report.jurisdictions[0].duplicates, 1);
        assert!(assembly.report.quality_score < 100.0);
        assert!(assembly
            .report
            .issues
            .iter()
            .any(|i| i.issue_type == QualityIssueType::DuplicationConcern));
    }
}
