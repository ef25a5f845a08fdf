//! Dynamic bind values shared by repositories
//!
//! Both backends use `?` placeholders, so SQL built at runtime is identical
//! for SQLite and MySQL. Only binding differs by backend, and `bind_args!`
//! expands against whichever query type it is handed.

use chrono::{DateTime, DurationRound, Utc};

/// A value bound to a `?` placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlArg {
    Text(String),
    Int(i64),
    Bool(bool),
    Time(DateTime<Utc>),
}

/// Bind every [`SqlArg`] in order onto a `sqlx::query` or `sqlx::query_as`.
///
/// The query's database type must already be fixed (`query_as::<Sqlite, _>`).
macro_rules! bind_args {
    ($query:expr, $args:expr) => {
        $args
            .iter()
            .fold($query, |query, arg| match arg {
                $crate::db::repositories::args::SqlArg::Text(value) => query.bind(value.as_str()),
                $crate::db::repositories::args::SqlArg::Int(value) => query.bind(*value),
                $crate::db::repositories::args::SqlArg::Bool(value) => query.bind(*value),
                $crate::db::repositories::args::SqlArg::Time(value) => query.bind(*value),
            })
    };
}

pub(crate) use bind_args;

/// `?, ?, ?` with `n` placeholders
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Escape `%`, `_` and the escape character itself for `LIKE ... ESCAPE '!'`
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '!' | '%' | '_') {
            escaped.push('!');
        }
        escaped.push(c);
    }
    escaped
}

/// Current time at microsecond precision, the finest MySQL TIMESTAMP(6) keeps
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_trunc(chrono::Duration::microseconds(1))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(0), "");
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("rust"), "rust");
        assert_eq!(escape_like("100%"), "100!%");
        assert_eq!(escape_like("snake_case!"), "snake!_case!!");
    }

    #[test]
    fn test_now_has_no_sub_microsecond_part() {
        use chrono::Timelike;
        assert_eq!(now().nanosecond() % 1_000, 0);
    }

    #[tokio::test]
    async fn test_bind_args_on_sqlite() {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to open database");
        let args = vec![
            SqlArg::Int(2),
            SqlArg::Text("x".to_string()),
            SqlArg::Bool(true),
        ];
        let (n, s, b) = bind_args!(
            sqlx::query_as::<sqlx::Sqlite, (i64, String, bool)>("SELECT ? + 1, ?, ?"),
            &args
        )
        .fetch_one(&pool)
        .await
        .expect("Query failed");
        assert_eq!((n, s.as_str(), b), (3, "x", true));
    }
}
