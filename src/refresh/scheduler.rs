//! Refresh queue construction
//!
//! Builds the ordered list of applications to (re-)extract in this run:
//! - Due applications are grouped by bucket
//! - Each bucket is sorted by identifier, then shuffled with a seeded PRNG
//! - Buckets are concatenated unextracted, young, medium, old

use crate::refresh::bucket::Bucket;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// What the scheduler needs to know about a stored application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshCandidate {
    pub northgate_id: i64,
    pub url: String,
    pub received_date: Option<NaiveDate>,
    pub extract_datetime: Option<DateTime<Utc>>,
}

impl RefreshCandidate {
    pub fn bucket(&self, now: DateTime<Utc>) -> Bucket {
        Bucket::classify(self.received_date, self.extract_datetime, now)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.bucket(now).is_due(self.extract_datetime, now)
    }
}

/// Due applications grouped by bucket, each group already in queue order
#[derive(Debug, Clone, Default)]
pub struct RefreshPlan {
    buckets: BTreeMap<Bucket, Vec<RefreshCandidate>>,
}

impl RefreshPlan {
    /// Selects the due candidates and orders them
    ///
    /// # Arguments
    ///
    /// * `candidates` - Every application in the store
    /// * `now` - The current time; classification and due checks use it
    /// * `seed` - Seed for the per-bucket shuffle, see [`seed_for_day`]
    pub fn build(candidates: Vec<RefreshCandidate>, now: DateTime<Utc>, seed: u64) -> Self {
        let mut buckets: BTreeMap<Bucket, Vec<RefreshCandidate>> = BTreeMap::new();

        for candidate in candidates {
            let bucket = candidate.bucket(now);
            if bucket.is_due(candidate.extract_datetime, now) {
                buckets.entry(bucket).or_default().push(candidate);
            }
        }

        let mut rng = StdRng::seed_from_u64(seed);
        for group in buckets.values_mut() {
            group.sort_by_key(|candidate| candidate.northgate_id);
            group.shuffle(&mut rng);
        }

        Self { buckets }
    }

    /// The due candidates of one bucket, in queue order
    pub fn bucket(&self, bucket: Bucket) -> &[RefreshCandidate] {
        self.buckets.get(&bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens the plan into the order extraction should run in
    pub fn into_queue(self) -> Vec<RefreshCandidate> {
        // BTreeMap iterates in Bucket order: unextracted, young, medium, old
        self.buckets.into_values().flatten().collect()
    }
}

/// Seed that gives every run on the same calendar day the same order
pub fn seed_for_day(day: NaiveDate) -> u64 {
    day.num_days_from_ce() as u64
}

/// Per-bucket totals for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketCount {
    pub bucket: Bucket,
    pub total: usize,
    pub due: usize,
}

/// Counts applications and due applications in every bucket
pub fn count_by_bucket(candidates: &[RefreshCandidate], now: DateTime<Utc>) -> Vec<BucketCount> {
    Bucket::ALL
        .iter()
        .map(|&bucket| {
            let members = candidates.iter().filter(|c| c.bucket(now) == bucket);
            let (total, due) = members.fold((0, 0), |(total, due), candidate| {
                (total + 1, due + usize::from(candidate.is_due(now)))
            });
            BucketCount { bucket, total, due }
        })
        .collect()
}
