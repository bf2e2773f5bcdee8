//! Defines the endpoint for the paginated movement history.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Response,
};
use serde::Deserialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    db::lock_connection,
    ledger::{
        core::{LedgerState, MovementType},
        history::{HistoryFilter, query_history},
    },
    pagination::Page,
    response,
};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The query parameters of the history.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub movement_type: Option<String>,
    /// A local date, e.g. "2024-05-01".
    pub created_at: Option<String>,
}

impl HistoryQuery {
    fn into_filter(self) -> Result<HistoryFilter, Error> {
        let non_empty = |text: Option<String>| {
            text.map(|text| text.trim().to_owned())
                .filter(|text| !text.is_empty())
        };

        let movement_type = non_empty(self.movement_type)
            .map(|text| text.parse::<MovementType>())
            .transpose()?;
        let date = non_empty(self.created_at)
            .map(|text| Date::parse(&text, DATE_FORMAT))
            .transpose()
            .map_err(|_| Error::Validation("createdAt must be a date like 2024-05-01".to_owned()))?;

        Ok(HistoryFilter {
            search: non_empty(self.search),
            movement_type,
            date,
        })
    }
}

/// A route handler for one page of movement history, newest first.
pub async fn history_endpoint(
    State(state): State<LedgerState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Response, Error> {
    let Query(query) = query?;
    let page = Page::from_query(query.page, query.limit, &state.pagination_config);
    let filter = query.into_filter()?;

    let connection = lock_connection(&state.db_connection)?;
    let (records, total_records) = query_history(&filter, page, &connection)?;

    Ok(response::paged(
        "Successfully fetched histories",
        records,
        page.meta(total_records),
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use time::{Duration, PrimitiveDateTime, macros::datetime};

    use crate::{
        AppState, endpoints,
        ledger::{CustomerPolicy, Movement, MovementType, record_movement},
        product::Product,
        test_utils::{
            bearer_token, get_test_server, get_test_state, insert_customer, insert_product,
        },
        timestamp::Timestamp,
    };

    fn record_sales(state: &AppState, product: &Product, start: PrimitiveDateTime, count: i64) {
        let connection = state.db_connection.lock().unwrap();
        for index in 0..count {
            let movement =
                Movement::new(product.id, MovementType::Out, 1, 1000, "3201", "retail").unwrap();
            let at = Timestamp::new(start + Duration::minutes(index));
            record_movement(movement, CustomerPolicy::Unchecked, at, &connection).unwrap();
        }
    }

    #[tokio::test]
    async fn second_page_holds_the_next_newest_records() {
        let state = get_test_state();
        let product = insert_product(&state, "Gula", 100, 1000);
        insert_customer(&state, "3201", "agent");
        record_sales(&state, &product, datetime!(2024-05-01 08:00:00), 25);
        let server = get_test_server(state.clone());

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("page", 2)
            .add_query_param("limit", 10)
            .authorization_bearer(bearer_token(&state))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["message"], "Successfully fetched histories");
        assert_eq!(
            body["meta"],
            json!({ "totalRecords": 25, "currentPage": 2, "totalPages": 3, "pageSize": 10 })
        );
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 10);
        // Records 11 to 20 counting back from the newest at 08:24.
        assert_eq!(data[0]["transactionDate"], "2024-05-01 08:14:00");
        assert_eq!(data[9]["transactionDate"], "2024-05-01 08:05:00");
        assert_eq!(data[0]["productName"], "Gula");
        assert_eq!(data[0]["customerName"], "Siti");
        assert_eq!(data[0]["NIK"], "3201");
        assert_eq!(data[0]["type"], "OUT");
    }

    #[tokio::test]
    async fn filters_by_type_and_date() {
        let state = get_test_state();
        let product = insert_product(&state, "Gula", 100, 1000);
        insert_customer(&state, "3201", "agent");
        record_sales(&state, &product, datetime!(2024-05-01 08:00:00), 2);
        record_sales(&state, &product, datetime!(2024-05-02 08:00:00), 3);
        let server = get_test_server(state.clone());

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("type", "OUT")
            .add_query_param("createdAt", "2024-05-02")
            .authorization_bearer(bearer_token(&state))
            .await;

        let body: Value = response.json();
        assert_eq!(body["meta"]["totalRecords"], 3);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("type", "IN")
            .authorization_bearer(bearer_token(&state))
            .await;

        let body: Value = response.json();
        assert_eq!(body["meta"]["totalRecords"], 0);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn invalid_type_is_bad_request() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("type", "SIDEWAYS")
            .authorization_bearer(bearer_token(&state))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({ "message": "Invalid transaction type" }));
    }

    #[tokio::test]
    async fn invalid_date_is_bad_request() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("createdAt", "01/05/2024")
            .authorization_bearer(bearer_token(&state))
            .await
            .assert_status_bad_request();
    }
}
