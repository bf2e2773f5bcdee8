//! Defines the endpoint for the paginated customer list.

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    response::Response,
};
use serde::Deserialize;

use crate::{
    Error,
    customer::core::{CustomerFilter, CustomerState, list_customers},
    db::lock_connection,
    pagination::Page,
    response,
};

/// The query parameters of the customer list.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    #[serde(rename = "type")]
    pub customer_type: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
}

/// A route handler for one page of customers.
pub async fn list_customers_endpoint(
    State(state): State<CustomerState>,
    query: Result<Query<CustomerQuery>, QueryRejection>,
) -> Result<Response, Error> {
    let Query(query) = query?;
    let non_empty = |text: Option<String>| text.filter(|text| !text.trim().is_empty());
    let filter = CustomerFilter {
        customer_type: non_empty(query.customer_type),
        search: non_empty(query.search),
    };
    let page = Page::from_query(query.page, query.limit, &state.pagination_config);

    let connection = lock_connection(&state.db_connection)?;
    let (customers, total_records) = list_customers(&filter, page, &connection)?;

    Ok(response::paged(
        "Customers fetched successfully",
        customers,
        page.meta(total_records),
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use crate::{
        endpoints,
        test_utils::{bearer_token, get_test_server, get_test_state, insert_customer},
    };

    #[tokio::test]
    async fn returns_page_with_meta() {
        let state = get_test_state();
        for index in 0..12 {
            insert_customer(&state, &format!("{index:02}"), "agent");
        }
        insert_customer(&state, "99", "retail");
        let server = get_test_server(state.clone());

        let response = server
            .get(endpoints::CUSTOMERS)
            .add_query_param("type", "agent")
            .add_query_param("page", 2)
            .add_query_param("limit", 5)
            .authorization_bearer(bearer_token(&state))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["message"], "Customers fetched successfully");
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
        assert_eq!(body["data"][0]["userId"], "05");
        assert_eq!(body["meta"]["totalRecords"], 12);
        assert_eq!(body["meta"]["currentPage"], 2);
        assert_eq!(body["meta"]["totalPages"], 3);
        assert_eq!(body["meta"]["pageSize"], 5);
    }

    #[tokio::test]
    async fn search_matches_user_id() {
        let state = get_test_state();
        insert_customer(&state, "3201-aa", "agent");
        insert_customer(&state, "5500-bb", "agent");
        let server = get_test_server(state.clone());

        let response = server
            .get(endpoints::CUSTOMERS)
            .add_query_param("search", "3201")
            .authorization_bearer(bearer_token(&state))
            .await;

        let body: Value = response.json();
        assert_eq!(body["meta"]["totalRecords"], 1);
        assert_eq!(body["data"][0]["userId"], "3201-aa");
    }
}
