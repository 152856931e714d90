//! Dynamic filter construction and filtered retrieval for ledger records.

use rusqlite::{Connection, params_from_iter, types::Value};
use time::Date;

use crate::{
    Error,
    record::core::{Record, map_record_row},
};

/// The category value clients send to mean "no category filter".
///
/// Recognized and stripped rather than forwarded as a literal equality
/// filter.
pub const ALL_CATEGORIES: &str = "所有項目";

/// Defines which records [query_records] returns.
///
/// Absent fields contribute no predicate. An empty filter matches every
/// record.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordFilter {
    /// Include records dated on or after this day.
    pub start_date: Option<Date>,
    /// Include records dated on or before this day.
    pub end_date: Option<Date>,
    /// Include records with exactly this category.
    pub category: Option<String>,
}

/// Render `filter` into a SQL statement and its bound parameter values.
///
/// Every present field contributes one AND-ed comparison; values are always
/// bound as parameters, never spliced into the SQL text. The ordering is
/// fixed: date descending, then creation time descending, with the row ID as
/// a final tie-breaker so the order is total.
fn build_query(filter: &RecordFilter) -> (String, Vec<Value>) {
    let mut query_string_parts = vec![
        "SELECT id, date, type, category, amount, notes, attachment_url, created_at FROM records"
            .to_string(),
    ];
    let mut where_clause_parts = vec![];
    let mut query_parameters = vec![];

    if let Some(start_date) = filter.start_date {
        where_clause_parts.push(format!("date >= ?{}", query_parameters.len() + 1));
        query_parameters.push(Value::Text(start_date.to_string()));
    }

    if let Some(end_date) = filter.end_date {
        where_clause_parts.push(format!("date <= ?{}", query_parameters.len() + 1));
        query_parameters.push(Value::Text(end_date.to_string()));
    }

    if let Some(category) = &filter.category
        && category != ALL_CATEGORIES
    {
        where_clause_parts.push(format!("category = ?{}", query_parameters.len() + 1));
        query_parameters.push(Value::Text(category.clone()));
    }

    if !where_clause_parts.is_empty() {
        query_string_parts.push(String::from("WHERE ") + &where_clause_parts.join(" AND "));
    }

    query_string_parts.push("ORDER BY date DESC, created_at DESC, id DESC".to_string());

    (query_string_parts.join(" "), query_parameters)
}

/// Retrieve all records matching `filter`, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is a SQL error.
pub fn query_records(filter: &RecordFilter, connection: &Connection) -> Result<Vec<Record>, Error> {
    let (query_string, query_parameters) = build_query(filter);

    connection
        .prepare(&query_string)?
        .query_map(params_from_iter(query_parameters.iter()), map_record_row)?
        .map(|maybe_record| maybe_record.map_err(Error::SqlError))
        .collect()
}

#[cfg(test)]
mod build_query_tests {
    use time::macros::date;

    use super::{ALL_CATEGORIES, RecordFilter, build_query};

    #[test]
    fn empty_filter_has_no_where_clause() {
        let (query, parameters) = build_query(&RecordFilter::default());

        assert!(!query.contains("WHERE"), "got query {query}, want no WHERE");
        assert!(query.ends_with("ORDER BY date DESC, created_at DESC, id DESC"));
        assert!(parameters.is_empty());
    }

    #[test]
    fn each_present_field_contributes_one_clause() {
        let filter = RecordFilter {
            start_date: Some(date!(2024 - 01 - 01)),
            end_date: Some(date!(2024 - 12 - 31)),
            category: Some("維護管理費".to_owned()),
        };

        let (query, parameters) = build_query(&filter);

        assert!(query.contains("WHERE date >= ?1 AND date <= ?2 AND category = ?3"));
        assert_eq!(parameters.len(), 3);
    }

    #[test]
    fn absent_fields_contribute_no_clause() {
        let filter = RecordFilter {
            start_date: Some(date!(2024 - 01 - 01)),
            ..Default::default()
        };

        let (query, parameters) = build_query(&filter);

        assert!(query.contains("WHERE date >= ?1"));
        assert!(!query.contains("date <="));
        assert!(!query.contains("category"));
        assert_eq!(parameters.len(), 1);
    }

    #[test]
    fn all_categories_sentinel_is_stripped() {
        let filter = RecordFilter {
            category: Some(ALL_CATEGORIES.to_owned()),
            ..Default::default()
        };

        let (query, parameters) = build_query(&filter);

        assert!(!query.contains("WHERE"), "got query {query}, want no WHERE");
        assert!(parameters.is_empty());
    }
}

#[cfg(test)]
mod query_records_tests {
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        db::initialize,
        record::core::{Record, RecordType, create_record},
    };

    use super::{ALL_CATEGORIES, RecordFilter, query_records};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_record(day: Date, category: &str, conn: &Connection) {
        create_record(
            Record::build(day, RecordType::Expense, category, 100.0),
            conn,
        )
        .expect("Could not create record");
    }

    #[test]
    fn date_range_returns_inclusive_subset_newest_first() {
        let conn = get_test_connection();
        let days = [
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 02),
            date!(2024 - 01 - 03),
            date!(2024 - 01 - 04),
            date!(2024 - 01 - 05),
        ];
        for day in days {
            create_test_record(day, "其他費用", &conn);
        }

        let got = query_records(
            &RecordFilter {
                start_date: Some(date!(2024 - 01 - 02)),
                end_date: Some(date!(2024 - 01 - 04)),
                ..Default::default()
            },
            &conn,
        )
        .expect("Could not query records");

        let got_dates: Vec<Date> = got.iter().map(|record| record.date).collect();
        assert_eq!(
            got_dates,
            vec![
                date!(2024 - 01 - 04),
                date!(2024 - 01 - 03),
                date!(2024 - 01 - 02)
            ]
        );
    }

    #[test]
    fn equal_dates_order_most_recently_created_first() {
        let conn = get_test_connection();
        let day = date!(2024 - 03 - 15);
        for _ in 0..3 {
            create_test_record(day, "其他費用", &conn);
        }

        let got = query_records(&RecordFilter::default(), &conn).expect("Could not query records");

        let got_ids: Vec<i64> = got.iter().map(|record| record.id).collect();
        assert_eq!(got_ids, vec![3, 2, 1]);
    }

    #[test]
    fn category_filter_matches_exactly() {
        let conn = get_test_connection();
        create_test_record(date!(2024 - 01 - 01), "維護管理費", &conn);
        create_test_record(date!(2024 - 01 - 02), "電梯保養費", &conn);
        create_test_record(date!(2024 - 01 - 03), "維護管理費", &conn);

        let got = query_records(
            &RecordFilter {
                category: Some("維護管理費".to_owned()),
                ..Default::default()
            },
            &conn,
        )
        .expect("Could not query records");

        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|record| record.category == "維護管理費"));
    }

    #[test]
    fn all_categories_sentinel_matches_everything() {
        let conn = get_test_connection();
        create_test_record(date!(2024 - 01 - 01), "維護管理費", &conn);
        create_test_record(date!(2024 - 01 - 02), "電梯保養費", &conn);

        let unfiltered =
            query_records(&RecordFilter::default(), &conn).expect("Could not query records");
        let sentinel = query_records(
            &RecordFilter {
                category: Some(ALL_CATEGORIES.to_owned()),
                ..Default::default()
            },
            &conn,
        )
        .expect("Could not query records");

        assert_eq!(sentinel, unfiltered);
    }

    #[test]
    fn repeated_queries_return_identical_sequences() {
        let conn = get_test_connection();
        create_test_record(date!(2024 - 01 - 01), "維護管理費", &conn);
        create_test_record(date!(2024 - 01 - 01), "電梯保養費", &conn);
        create_test_record(date!(2024 - 01 - 02), "其他費用", &conn);

        let first = query_records(&RecordFilter::default(), &conn).expect("Could not query records");
        let second =
            query_records(&RecordFilter::default(), &conn).expect("Could not query records");

        assert_eq!(first, second);
    }

    #[test]
    fn category_value_is_bound_not_interpolated() {
        let conn = get_test_connection();
        create_test_record(date!(2024 - 01 - 01), "維護管理費", &conn);

        let got = query_records(
            &RecordFilter {
                category: Some("' OR '1'='1".to_owned()),
                ..Default::default()
            },
            &conn,
        )
        .expect("Could not query records");

        assert_eq!(got, vec![]);
    }
}
