// Record processing: parsing, cleaning, standardization, deduplication and audit

pub mod address;
pub mod audit;
pub mod casing;
pub mod cleaning;
pub mod dedup;
pub mod election_type;
pub mod name_parser;
pub mod national;
pub mod office;
pub mod party;
