//! Duplicate affiliate item records.

use crate::models::AffiliateItemRecord;

/// Picks the record to use when an affiliate item has several rows.
///
/// The row with the greatest `created_at` wins; rows created at the same
/// instant are ordered by row id, highest first.
pub fn select_latest_record(records: &[AffiliateItemRecord]) -> Option<&AffiliateItemRecord> {
    records.iter().max_by_key(|r| (r.created_at, r.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn record(id: u64, created_secs: i64) -> AffiliateItemRecord {
        AffiliateItemRecord {
            id,
            affiliate_item_id: 77,
            primary_item_id: 7,
            item_margin: Decimal::new(id as i64, 2),
            real_weight: None,
            created_at: Utc.timestamp_opt(created_secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_latest_creation_time_wins() {
        let records = vec![record(5, 100), record(3, 200), record(4, 150)];

        assert_eq!(select_latest_record(&records).unwrap().id, 3);
    }

    #[test]
    fn test_tie_broken_by_highest_row_id() {
        let records = vec![record(8, 200), record(9, 200), record(2, 200)];

        assert_eq!(select_latest_record(&records).unwrap().id, 9);
    }

    #[test]
    fn test_order_of_input_does_not_matter() {
        let mut records = vec![record(1, 100), record(2, 300), record(3, 300)];
        let first = select_latest_record(&records).unwrap().id;
        records.reverse();

        assert_eq!(select_latest_record(&records).unwrap().id, first);
    }

    #[test]
    fn test_empty_input() {
        assert!(select_latest_record(&[]).is_none());
    }
}
