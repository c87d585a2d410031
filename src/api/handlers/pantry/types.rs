//! Request/response types and date helpers for the pantry endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::storage::ItemRecord;

pub(crate) const DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct NewItemRequest {
    pub item: String,
    pub used_by_date: String,
    pub count: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UpdateItemRequest {
    pub count: Option<i64>,
    pub used_by_date: Option<String>,
}

/// Exposed fields of one pantry item; internal row ids stay internal.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ItemResponse {
    pub item: String,
    pub count: i64,
    pub used_by_date: String,
    pub run_out_time: Option<String>,
}

impl From<ItemRecord> for ItemResponse {
    fn from(record: ItemRecord) -> Self {
        Self {
            item: record.item,
            count: record.count,
            used_by_date: record.used_by_date,
            run_out_time: record.run_out_time.map(|time| time.to_rfc3339()),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ItemListResponse {
    pub message: String,
    pub items: Vec<ItemResponse>,
}

/// Query parameters for the expiry-window filter.
#[derive(Deserialize, Debug)]
pub struct ExpiringQuery {
    pub days: Option<i64>,
}

pub(crate) fn parse_used_by_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
}

/// True when `date` falls inside `[today, today + days]`.
pub(crate) fn within_window(date: NaiveDate, today: NaiveDate, days: i64) -> bool {
    date >= today && date <= today + chrono::Duration::days(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(value: &str) -> NaiveDate {
        parse_used_by_date(value).expect("test date should parse")
    }

    #[test]
    fn parses_day_month_year_only() {
        assert!(parse_used_by_date("25-12-2026").is_some());
        assert!(parse_used_by_date("2026-12-25").is_none());
        assert!(parse_used_by_date("soon").is_none());
    }

    #[test]
    fn window_includes_both_edges() {
        let today = date("10-06-2026");
        assert!(within_window(today, today, 7));
        assert!(within_window(date("17-06-2026"), today, 7));
        assert!(!within_window(date("18-06-2026"), today, 7));
        assert!(!within_window(date("09-06-2026"), today, 7));
    }

    #[test]
    fn response_hides_row_ids_and_formats_timestamps() {
        let record = ItemRecord {
            item: "beans".to_string(),
            used_by_date: "01-01-2027".to_string(),
            count: 0,
            run_out_time: Some(Utc::now()),
        };
        let response = ItemResponse::from(record);
        assert_eq!(response.item, "beans");
        assert!(response.run_out_time.is_some());

        let value = serde_json::to_value(&response).expect("should serialize");
        assert!(value.get("item_id").is_none());
        assert!(value.get("pantry_id").is_none());
    }
}
