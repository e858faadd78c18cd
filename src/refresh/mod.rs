//! Refresh scheduling
//!
//! Decides which stored applications are re-extracted in a run. Applications
//! fall into four buckets by age; each bucket has its own minimum interval
//! between extractions:
//!
//! | bucket | received | re-extract after |
//! |--------|----------|------------------|
//! | unextracted | any | immediately |
//! | young | 0-90 days ago | 0.8 days |
//! | medium | 91-365 days ago | 6.5 days |
//! | old | over 365 days ago | 29.5 days |

mod bucket;
mod scheduler;

pub use bucket::{days_between, Bucket};
pub use scheduler::{count_by_bucket, seed_for_day, BucketCount, RefreshCandidate, RefreshPlan};
