use crate::storage::BucketMarkerStore;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

pub const BUCKET_SECS: i64 = 300;

/// Start of the 5-minute bucket containing `now`, in epoch seconds.
pub fn bucket_key(now: DateTime<Utc>) -> i64 {
    let ts = now.timestamp();
    ts - ts.rem_euclid(BUCKET_SECS)
}

/// True iff no marker exists for the bucket of `now`. An unreadable
/// marker store counts as "refresh needed".
pub async fn should_refresh(markers: &dyn BucketMarkerStore, now: DateTime<Utc>) -> bool {
    let key = bucket_key(now);
    match markers.has(key).await {
        Ok(true) => {
            debug!("Bucket {} already refreshed", key);
            false
        }
        Ok(false) => true,
        Err(e) => {
            warn!("Failed to read cache markers, refreshing anyway: {}", e);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryMarkerStore;
    use chrono::TimeZone;

    #[test]
    fn test_bucket_floors_to_five_minutes() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 7, 42).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 5, 0).unwrap();
        assert_eq!(bucket_key(t), expected.timestamp());
    }

    #[test]
    fn test_same_bucket_within_window() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 5, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 1, 12, 9, 59).unwrap();
        let next = Utc.with_ymd_and_hms(2024, 3, 1, 12, 10, 0).unwrap();
        assert_eq!(bucket_key(start), bucket_key(end));
        assert_eq!(bucket_key(next) - bucket_key(start), BUCKET_SECS);
    }

    #[test]
    fn test_sub_second_ignored() {
        let t = Utc.timestamp_millis_opt(1_700_000_100_999).unwrap();
        assert_eq!(bucket_key(t) % BUCKET_SECS, 0);
        assert_eq!(bucket_key(t), 1_700_000_100 - 1_700_000_100 % 300);
    }

    #[tokio::test]
    async fn test_should_refresh_until_marked() {
        let store = MemoryMarkerStore::new();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 7, 42).unwrap();
        assert!(should_refresh(&store, now).await);
        store.mark(bucket_key(now)).await.unwrap();
        assert!(!should_refresh(&store, now).await);
        assert!(should_refresh(&store, now + chrono::Duration::minutes(5)).await);
    }
}
