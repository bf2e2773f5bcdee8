//! Aggregations over the stock ledger.
//!
//! All dates are the calendar dates of the stored local timestamps.

use rusqlite::{Connection, params_from_iter};
use serde::Serialize;
use time::Date;

use crate::{
    Error, database_id::ProductID, date_range::DateRange, ledger::MovementType,
    query_filter::Predicates,
};

/// Income from OUT movements and expenses from IN movements over a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetTotals {
    pub total_income: i64,
    pub total_expenses: i64,
    /// `total_income - total_expenses`.
    pub total_nett: i64,
}

/// The quantity moved on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyQuantity {
    pub transaction_date: Date,
    pub total_quantity: i64,
}

/// A day with at least one ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityDate {
    pub date: Date,
}

/// The total quantity of product `product_id` sold (moved OUT) within `range`.
///
/// Returns zero when nothing was sold.
pub fn sum_out_quantity(
    product_id: ProductID,
    range: DateRange,
    connection: &Connection,
) -> Result<i64, Error> {
    let mut predicates = Predicates::new();
    predicates
        .equals("product_id", product_id)
        .equals("movement_type", MovementType::Out.as_str().to_owned())
        .date_between("created_at", range);

    connection
        .query_row(
            &format!(
                "SELECT COALESCE(SUM(quantity), 0) FROM ledger_entry {}",
                predicates.where_clause()
            ),
            params_from_iter(predicates.params()),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Income and expenses over every product within `range`.
pub fn net_totals(range: DateRange, connection: &Connection) -> Result<NetTotals, Error> {
    let mut predicates = Predicates::new();
    predicates.date_between("created_at", range);

    let (total_income, total_expenses): (i64, i64) = connection.query_row(
        &format!(
            "SELECT
                COALESCE(SUM(CASE WHEN movement_type = 'OUT' THEN total_price END), 0),
                COALESCE(SUM(CASE WHEN movement_type = 'IN' THEN total_price END), 0)
            FROM ledger_entry {}",
            predicates.where_clause()
        ),
        params_from_iter(predicates.params()),
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(NetTotals {
        total_income,
        total_expenses,
        total_nett: total_income.saturating_sub(total_expenses),
    })
}

/// The quantity of product `product_id` moved per day within `range`, oldest
/// day first, optionally only for one movement type.
///
/// Days without movements are left out.
pub fn daily_quantities(
    product_id: ProductID,
    movement_type: Option<MovementType>,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<DailyQuantity>, Error> {
    let mut predicates = Predicates::new();
    predicates
        .equals("product_id", product_id)
        .date_between("created_at", range);

    if let Some(movement_type) = movement_type {
        predicates.equals("movement_type", movement_type.as_str().to_owned());
    }

    connection
        .prepare(&format!(
            "SELECT DATE(created_at) AS day, SUM(quantity)
            FROM ledger_entry {}
            GROUP BY day
            ORDER BY day ASC",
            predicates.where_clause()
        ))?
        .query_map(params_from_iter(predicates.params()), |row| {
            Ok(DailyQuantity {
                transaction_date: row.get(0)?,
                total_quantity: row.get(1)?,
            })
        })?
        .map(|maybe_daily| maybe_daily.map_err(Error::from))
        .collect()
}

/// Every day with a ledger entry, newest first.
pub fn distinct_activity_dates(connection: &Connection) -> Result<Vec<ActivityDate>, Error> {
    connection
        .prepare(
            "SELECT DISTINCT DATE(created_at) AS day FROM ledger_entry ORDER BY day DESC",
        )?
        .query_map([], |row| Ok(ActivityDate { date: row.get(0)? }))?
        .map(|maybe_date| maybe_date.map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Date, macros::date, macros::datetime};

    use crate::{
        database_id::ProductID,
        date_range::DateRange,
        initialize_db,
        ledger::{CustomerPolicy, Movement, MovementType, record_movement},
        product::{NewProduct, create_product},
        timestamp::Timestamp,
    };

    use super::{
        ActivityDate, DailyQuantity, NetTotals, daily_quantities, distinct_activity_dates,
        net_totals, sum_out_quantity,
    };

    fn get_test_connection() -> (Connection, ProductID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize_db(&conn).unwrap();
        let product = create_product(
            NewProduct::new("Gula", 1000, 100, None).unwrap(),
            Timestamp::new(datetime!(2024-01-01 00:00:00)),
            &conn,
        )
        .unwrap();

        (conn, product.id)
    }

    #[track_caller]
    fn record(
        conn: &Connection,
        product_id: ProductID,
        movement_type: MovementType,
        quantity: i64,
        price: i64,
        at: Timestamp,
    ) {
        let movement =
            Movement::new(product_id, movement_type, quantity, price, "C-1", "retail").unwrap();
        record_movement(movement, CustomerPolicy::Unchecked, at, conn).unwrap();
    }

    fn at(date: Date) -> Timestamp {
        Timestamp::new(date.with_hms(10, 30, 0).unwrap())
    }

    #[test]
    fn sum_out_quantity_is_zero_without_sales() {
        let (conn, product_id) = get_test_connection();
        record(&conn, product_id, MovementType::In, 5, 100, at(date!(2024 - 05 - 01)));

        let total = sum_out_quantity(product_id, DateRange::month_of(date!(2024 - 05 - 01)), &conn);

        assert_eq!(total, Ok(0));
    }

    #[test]
    fn sum_out_quantity_respects_week_bounds() {
        let (conn, product_id) = get_test_connection();
        // 2024-05-06 is a Monday and 2024-05-12 a Sunday.
        record(&conn, product_id, MovementType::Out, 1, 100, at(date!(2024 - 05 - 05)));
        record(&conn, product_id, MovementType::Out, 2, 100, at(date!(2024 - 05 - 06)));
        record(&conn, product_id, MovementType::Out, 3, 100, at(date!(2024 - 05 - 12)));
        record(&conn, product_id, MovementType::Out, 4, 100, at(date!(2024 - 05 - 13)));

        let total = sum_out_quantity(product_id, DateRange::week_of(date!(2024 - 05 - 08)), &conn);

        assert_eq!(total, Ok(5));
    }

    #[test]
    fn net_totals_split_income_and_expenses() {
        let (conn, product_id) = get_test_connection();
        record(&conn, product_id, MovementType::In, 10, 500, at(date!(2024 - 05 - 01)));
        record(&conn, product_id, MovementType::Out, 3, 1000, at(date!(2024 - 05 - 02)));
        record(&conn, product_id, MovementType::Out, 1, 1000, at(date!(2024 - 04 - 30)));

        let totals = net_totals(DateRange::month_of(date!(2024 - 05 - 15)), &conn);

        assert_eq!(
            totals,
            Ok(NetTotals {
                total_income: 3000,
                total_expenses: 5000,
                total_nett: -2000,
            })
        );
    }

    #[test]
    fn net_totals_are_zero_for_empty_ledger() {
        let (conn, _) = get_test_connection();

        let totals = net_totals(DateRange::month_of(date!(2024 - 05 - 15)), &conn);

        assert_eq!(
            totals,
            Ok(NetTotals {
                total_income: 0,
                total_expenses: 0,
                total_nett: 0,
            })
        );
    }

    #[test]
    fn daily_quantities_group_by_day_in_ascending_order() {
        let (conn, product_id) = get_test_connection();
        record(&conn, product_id, MovementType::Out, 2, 100, at(date!(2024 - 05 - 03)));
        record(&conn, product_id, MovementType::Out, 1, 100, at(date!(2024 - 05 - 01)));
        record(&conn, product_id, MovementType::In, 7, 100, at(date!(2024 - 05 - 01)));
        record(&conn, product_id, MovementType::Out, 4, 100, at(date!(2024 - 05 - 03)));

        let range = DateRange::trailing_days(date!(2024 - 05 - 10), 30);
        let all = daily_quantities(product_id, None, range, &conn).unwrap();
        let outs = daily_quantities(product_id, Some(MovementType::Out), range, &conn).unwrap();

        assert_eq!(
            all,
            vec![
                DailyQuantity {
                    transaction_date: date!(2024 - 05 - 01),
                    total_quantity: 8
                },
                DailyQuantity {
                    transaction_date: date!(2024 - 05 - 03),
                    total_quantity: 6
                },
            ]
        );
        assert_eq!(outs[0].total_quantity, 1);
        assert_eq!(outs[1].total_quantity, 6);
    }

    #[test]
    fn daily_quantities_ignore_older_days() {
        let (conn, product_id) = get_test_connection();
        record(&conn, product_id, MovementType::Out, 2, 100, at(date!(2024 - 03 - 01)));

        let range = DateRange::trailing_days(date!(2024 - 05 - 10), 30);
        let result = daily_quantities(product_id, None, range, &conn);

        assert_eq!(result, Ok(vec![]));
    }

    #[test]
    fn distinct_dates_are_unique_and_newest_first() {
        let (conn, product_id) = get_test_connection();
        record(&conn, product_id, MovementType::In, 1, 100, at(date!(2024 - 05 - 01)));
        record(&conn, product_id, MovementType::In, 1, 100, at(date!(2024 - 05 - 03)));
        record(&conn, product_id, MovementType::Out, 1, 100, at(date!(2024 - 05 - 01)));

        let dates = distinct_activity_dates(&conn);

        assert_eq!(
            dates,
            Ok(vec![
                ActivityDate {
                    date: date!(2024 - 05 - 03)
                },
                ActivityDate {
                    date: date!(2024 - 05 - 01)
                },
            ])
        );
    }
}
