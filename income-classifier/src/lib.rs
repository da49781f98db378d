//! income-classifier: posting rules, monthly aggregation and income assembly

pub mod aggregate;
pub mod assembly;
pub mod posting_rules;

pub use aggregate::{aggregate, classify_postings, ClassifiedPosting};
pub use assembly::{assemble, classify_raw_income};
pub use posting_rules::{catalog, classify, ClassificationError};
