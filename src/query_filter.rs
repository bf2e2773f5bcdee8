//! A small builder for `WHERE` clauses with bound parameters.
//!
//! Column names are always static strings chosen by the caller, and every
//! user supplied value goes through a numbered `?N` parameter, so request
//! text never ends up inside the SQL string.

use rusqlite::types::Value;
use time::Date;

use crate::date_range::DateRange;

/// A list of SQL predicates joined with `AND`, plus their parameters.
#[derive(Debug, Default)]
pub struct Predicates {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Predicates {
    /// An empty set of predicates that matches every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to the parameter list and return its placeholder, e.g. "?3".
    pub fn bind(&mut self, value: impl Into<Value>) -> String {
        self.params.push(value.into());
        format!("?{}", self.params.len())
    }

    /// Require `column` to equal `value`.
    pub fn equals(&mut self, column: &'static str, value: impl Into<Value>) -> &mut Self {
        let placeholder = self.bind(value);
        self.clauses.push(format!("{column} = {placeholder}"));
        self
    }

    /// Require the local calendar date of `column` to equal `date`.
    pub fn date_equals(&mut self, column: &'static str, date: Date) -> &mut Self {
        let placeholder = self.bind(date.to_string());
        self.clauses.push(format!("DATE({column}) = {placeholder}"));
        self
    }

    /// Require the local calendar date of `column` to be within `range`, inclusive.
    pub fn date_between(&mut self, column: &'static str, range: DateRange) -> &mut Self {
        let start = self.bind(range.start.to_string());
        let end = self.bind(range.end.to_string());
        self.clauses.push(format!("DATE({column}) BETWEEN {start} AND {end}"));
        self
    }

    /// Require at least one of `columns` to contain `needle` as a substring.
    ///
    /// `%` and `_` in `needle` match literally.
    pub fn contains_any(&mut self, columns: &[&'static str], needle: &str) -> &mut Self {
        if columns.is_empty() {
            return self;
        }

        let placeholder = self.bind(format!("%{}%", escape_like(needle)));
        let alternatives: Vec<String> = columns
            .iter()
            .map(|column| format!("{column} LIKE {placeholder} ESCAPE '\\'"))
            .collect();
        self.clauses.push(format!("({})", alternatives.join(" OR ")));
        self
    }

    /// The `WHERE ...` clause, or an empty string when there are no predicates.
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }

    /// The bound parameters in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for character in text.chars() {
        if matches!(character, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(character);
    }

    escaped
}

#[cfg(test)]
mod tests {
    use rusqlite::{Connection, params_from_iter, types::Value};
    use time::macros::date;

    use crate::date_range::DateRange;

    use super::Predicates;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE item (id INTEGER PRIMARY KEY, name TEXT NOT NULL, created_at TEXT NOT NULL);
            INSERT INTO item (name, created_at) VALUES
                ('apple', '2024-05-01 10:00:00'),
                ('100% juice', '2024-05-02 10:00:00'),
                ('pear_drop', '2024-05-03 10:00:00');",
        )
        .unwrap();
        conn
    }

    #[track_caller]
    fn select_ids(conn: &Connection, predicates: &Predicates) -> Vec<i64> {
        let query = format!(
            "SELECT id FROM item {} ORDER BY id",
            predicates.where_clause()
        );
        conn.prepare(&query)
            .unwrap()
            .query_map(params_from_iter(predicates.params().iter()), |row| {
                row.get(0)
            })
            .unwrap()
            .map(|id| id.unwrap())
            .collect()
    }

    #[test]
    fn empty_predicates_match_everything() {
        let conn = get_test_connection();

        assert_eq!(Predicates::new().where_clause(), "");
        assert_eq!(select_ids(&conn, &Predicates::new()), vec![1, 2, 3]);
    }

    #[test]
    fn placeholders_are_numbered_in_order() {
        let mut predicates = Predicates::new();
        predicates
            .equals("name", "apple".to_owned())
            .date_between(
                "created_at",
                DateRange {
                    start: date!(2024 - 05 - 01),
                    end: date!(2024 - 05 - 02),
                },
            );

        assert_eq!(
            predicates.where_clause(),
            "WHERE name = ?1 AND DATE(created_at) BETWEEN ?2 AND ?3"
        );
        assert_eq!(predicates.params()[0], Value::Text("apple".to_owned()));
    }

    #[test]
    fn wildcards_in_search_text_match_literally() {
        let conn = get_test_connection();

        let mut percent = Predicates::new();
        percent.contains_any(&["name"], "%");
        let mut underscore = Predicates::new();
        underscore.contains_any(&["name"], "_");

        assert_eq!(select_ids(&conn, &percent), vec![2]);
        assert_eq!(select_ids(&conn, &underscore), vec![3]);
    }

    #[test]
    fn search_covers_every_column() {
        let conn = get_test_connection();
        let mut predicates = Predicates::new();
        predicates.contains_any(&["name", "created_at"], "05-03");

        assert_eq!(select_ids(&conn, &predicates), vec![3]);
    }

    #[test]
    fn date_equals_uses_the_calendar_date() {
        let conn = get_test_connection();
        let mut predicates = Predicates::new();
        predicates.date_equals("created_at", date!(2024 - 05 - 02));

        assert_eq!(select_ids(&conn, &predicates), vec![2]);
    }
}
