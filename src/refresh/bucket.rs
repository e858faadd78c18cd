//! Age buckets and their re-extraction thresholds

use chrono::{DateTime, NaiveDate, Utc};

/// Received at most this many days ago: Young
pub const YOUNG_MAX_AGE_DAYS: i64 = 90;

/// Received at most this many days ago (and more than `YOUNG_MAX_AGE_DAYS`): Medium
pub const MEDIUM_MAX_AGE_DAYS: i64 = 365;

// Slightly below 1, 7 and 30 days
const YOUNG_THRESHOLD_DAYS: f64 = 0.8;
const MEDIUM_THRESHOLD_DAYS: f64 = 6.5;
const OLD_THRESHOLD_DAYS: f64 = 29.5;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Refresh bucket of an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    /// Never extracted, always due
    Unextracted,
    Young,
    Medium,
    Old,
}

impl Bucket {
    /// All buckets in queue order
    pub const ALL: [Bucket; 4] = [Self::Unextracted, Self::Young, Self::Medium, Self::Old];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Unextracted => "unextracted",
            Self::Young => "young",
            Self::Medium => "medium",
            Self::Old => "old",
        }
    }

    /// Days that must pass after an extraction before the next one
    ///
    /// `None` for `Unextracted`, which has no previous extraction.
    pub fn threshold_days(&self) -> Option<f64> {
        match self {
            Self::Unextracted => None,
            Self::Young => Some(YOUNG_THRESHOLD_DAYS),
            Self::Medium => Some(MEDIUM_THRESHOLD_DAYS),
            Self::Old => Some(OLD_THRESHOLD_DAYS),
        }
    }

    /// Classifies an application by extraction state and age
    ///
    /// Age is counted in whole calendar days from `received_date` to the UTC
    /// date of `now`. An application with no received date is treated as Old.
    pub fn classify(
        received_date: Option<NaiveDate>,
        extract_datetime: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Bucket {
        if extract_datetime.is_none() {
            return Self::Unextracted;
        }

        match received_date.map(|received| (now.date_naive() - received).num_days()) {
            Some(age) if age <= YOUNG_MAX_AGE_DAYS => Self::Young,
            Some(age) if age <= MEDIUM_MAX_AGE_DAYS => Self::Medium,
            _ => Self::Old,
        }
    }

    /// Whether an application in this bucket is due for re-extraction
    pub fn is_due(&self, extract_datetime: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match (self.threshold_days(), extract_datetime) {
            (Some(threshold), Some(extracted)) => days_between(extracted, now) > threshold,
            _ => true,
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fractional days from `earlier` to `later`
pub fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / MILLIS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 10, 6, 6, 0, 0).unwrap()
    }

    fn received(days_ago: i64) -> Option<NaiveDate> {
        Some(now().date_naive() - Duration::days(days_ago))
    }

    #[test]
    fn test_unextracted_is_always_due() {
        let bucket = Bucket::classify(received(3), None, now());
        assert_eq!(bucket, Bucket::Unextracted);
        assert!(bucket.is_due(None, now()));
    }

    #[test]
    fn test_young_record_extracted_two_days_ago_is_due() {
        let extracted = Some(now() - Duration::days(2));
        let bucket = Bucket::classify(received(45), extracted, now());
        assert_eq!(bucket, Bucket::Young);
        assert!(bucket.is_due(extracted, now()));
    }

    #[test]
    fn test_old_record_extracted_ten_days_ago_is_not_due() {
        let extracted = Some(now() - Duration::days(10));
        let bucket = Bucket::classify(received(500), extracted, now());
        assert_eq!(bucket, Bucket::Old);
        assert!(!bucket.is_due(extracted, now()));
    }

    #[test]
    fn test_bucket_boundaries() {
        let extracted = Some(now());
        assert_eq!(Bucket::classify(received(0), extracted, now()), Bucket::Young);
        assert_eq!(Bucket::classify(received(90), extracted, now()), Bucket::Young);
        assert_eq!(Bucket::classify(received(91), extracted, now()), Bucket::Medium);
        assert_eq!(Bucket::classify(received(365), extracted, now()), Bucket::Medium);
        assert_eq!(Bucket::classify(received(366), extracted, now()), Bucket::Old);
    }

    #[test]
    fn test_missing_received_date_is_old() {
        assert_eq!(Bucket::classify(None, Some(now()), now()), Bucket::Old);
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        let young = Bucket::Young;
        // 0.8 days is 19h12m
        let at_threshold = Some(now() - Duration::minutes(19 * 60 + 12));
        assert!(!young.is_due(at_threshold, now()));

        let past_threshold = Some(now() - Duration::minutes(19 * 60 + 13));
        assert!(young.is_due(past_threshold, now()));
    }

    #[test]
    fn test_medium_and_old_thresholds() {
        let six_days = Some(now() - Duration::days(6));
        let seven_days = Some(now() - Duration::days(7));
        assert!(!Bucket::Medium.is_due(six_days, now()));
        assert!(Bucket::Medium.is_due(seven_days, now()));

        let twenty_nine_days = Some(now() - Duration::days(29));
        let thirty_days = Some(now() - Duration::days(30));
        assert!(!Bucket::Old.is_due(twenty_nine_days, now()));
        assert!(Bucket::Old.is_due(thirty_days, now()));
    }

    #[test]
    fn test_days_between() {
        let start = now();
        assert_eq!(days_between(start, start + Duration::hours(12)), 0.5);
        assert_eq!(days_between(start, start + Duration::days(3)), 3.0);
    }
}
