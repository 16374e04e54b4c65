//! Generated calendar dimension

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use super::error::TransformError;
use crate::extract::OrderRecord;

/// One calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimDate {
    /// `YYYYMMDD`
    pub date_key: i32,
    pub date: NaiveDate,
    pub year: i32,
    /// e.g. `2023Q1`
    pub quarter: String,
    /// e.g. `2023-01`
    pub month: String,
    pub month_of_year: u32,
    pub day_of_month: u32,
    /// ISO weekday, Monday = 1
    pub day_of_week: u32,
    pub day_name: String,
    pub is_weekend: bool,
    pub is_month_start: bool,
    pub is_month_end: bool,
    pub is_quarter_end: bool,
    pub is_year_end: bool,
}

impl DimDate {
    /// Derive every attribute of `date`
    pub fn from_date(date: NaiveDate) -> Self {
        let month = date.month();
        let is_month_end = date.succ_opt().is_none_or(|next| next.month() != month);

        Self {
            date_key: date_key(date),
            date,
            year: date.year(),
            quarter: format!("{}Q{}", date.year(), quarter_of(month)),
            month: date.format("%Y-%m").to_string(),
            month_of_year: month,
            day_of_month: date.day(),
            day_of_week: date.weekday().number_from_monday(),
            day_name: day_name(date.weekday()).to_string(),
            is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
            is_month_start: date.day() == 1,
            is_month_end,
            is_quarter_end: is_month_end && month % 3 == 0,
            is_year_end: month == 12 && date.day() == 31,
        }
    }
}

/// Surrogate key of a calendar day
pub fn date_key(date: NaiveDate) -> i32 {
    date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32
}

fn quarter_of(month: u32) -> u32 {
    (month - 1) / 3 + 1
}

fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parse an order's date with the configured source format
pub fn parse_order_date(order: &OrderRecord, format: &str) -> Result<NaiveDate, TransformError> {
    NaiveDate::parse_from_str(order.order_date.trim(), format).map_err(|_| {
        TransformError::InvalidDate {
            table: "orders",
            column: "order_date",
            value: order.order_date.clone(),
            format: format.to_string(),
        }
    })
}

/// Earliest and latest order date, `None` when there are no orders
pub fn order_date_range(
    orders: &[OrderRecord],
    format: &str,
) -> Result<Option<(NaiveDate, NaiveDate)>, TransformError> {
    let mut range: Option<(NaiveDate, NaiveDate)> = None;
    for order in orders {
        let date = parse_order_date(order, format)?;
        range = Some(match range {
            Some((min, max)) => (min.min(date), max.max(date)),
            None => (date, date),
        });
    }
    Ok(range)
}

/// One row per day from `start` to `end` inclusive, ascending
pub fn build_date_dimension(start: NaiveDate, end: NaiveDate) -> Vec<DimDate> {
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .map(DimDate::from_date)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn order(id: i64, date: &str) -> OrderRecord {
        OrderRecord {
            order_id: id,
            customer_id: 1,
            order_status: Some(4),
            order_date: date.to_string(),
            required_date: None,
            shipped_date: None,
            store_id: 1,
            staff_id: 1,
        }
    }

    #[test]
    fn test_date_attributes() {
        let row = DimDate::from_date(ymd(2023, 3, 31));
        assert_eq!(row.date_key, 20230331);
        assert_eq!(row.year, 2023);
        assert_eq!(row.quarter, "2023Q1");
        assert_eq!(row.month, "2023-03");
        assert_eq!(row.day_of_week, 5);
        assert_eq!(row.day_name, "Friday");
        assert!(!row.is_weekend);
        assert!(row.is_month_end);
        assert!(row.is_quarter_end);
        assert!(!row.is_year_end);
        assert!(!row.is_month_start);
    }

    #[test]
    fn test_leap_day_and_year_end() {
        let feb = DimDate::from_date(ymd(2024, 2, 28));
        assert!(!feb.is_month_end);
        assert!(DimDate::from_date(ymd(2024, 2, 29)).is_month_end);

        let dec = DimDate::from_date(ymd(2023, 12, 31));
        assert!(dec.is_year_end);
        assert!(dec.is_quarter_end);
        assert!(dec.is_weekend);
        assert_eq!(dec.quarter, "2023Q4");
    }

    #[test]
    fn test_dimension_has_no_gaps() {
        let start = ymd(2023, 12, 30);
        let end = ymd(2024, 3, 2);
        let rows = build_date_dimension(start, end);

        assert_eq!(rows.len() as i64, (end - start).num_days() + 1);
        assert_eq!(rows.first().unwrap().date, start);
        assert_eq!(rows.last().unwrap().date, end);
        for pair in rows.windows(2) {
            assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
        }
    }

    #[test]
    fn test_single_day_range() {
        let day = ymd(2023, 1, 1);
        assert_eq!(build_date_dimension(day, day).len(), 1);
    }

    #[test]
    fn test_order_date_range_is_order_independent() {
        let a = [order(1, "2023-01-03"), order(2, "2023-01-01"), order(3, "2023-01-02")];
        let b = [order(3, "2023-01-02"), order(1, "2023-01-03"), order(2, "2023-01-01")];

        let range = order_date_range(&a, "%Y-%m-%d").unwrap();
        assert_eq!(range, Some((ymd(2023, 1, 1), ymd(2023, 1, 3))));
        assert_eq!(range, order_date_range(&b, "%Y-%m-%d").unwrap());
        assert_eq!(order_date_range(&[], "%Y-%m-%d").unwrap(), None);
    }

    #[test]
    fn test_invalid_order_date() {
        let err = order_date_range(&[order(1, "01/03/2023")], "%Y-%m-%d").unwrap_err();
        assert!(matches!(err, TransformError::InvalidDate { .. }));

        let range = order_date_range(&[order(1, "01/03/2023")], "%m/%d/%Y").unwrap();
        assert_eq!(range, Some((ymd(2023, 1, 3), ymd(2023, 1, 3))));
    }
}
