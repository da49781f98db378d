//! income-core: domain types shared by the classifier, the registry client and the enricher

pub mod income;
pub mod kontekst;
pub mod month;
pub mod posting;
pub mod problem;

pub use income::{ClassifiedAmount, ClassifiedIncome, IncomeClass, MonthlyIncome};
pub use kontekst::RegelKontekst;
pub use month::{ParseYearMonthError, YearMonth};
pub use posting::{Actor, Deviation, IncomeId, Posting, PostingType, RawIncome};
pub use problem::Problem;
