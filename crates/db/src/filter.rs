//! Rendering of [`Predicate`] trees into SQL plus the shared list, count and
//! aggregate helpers every repository builds on.
//!
//! Column names come from `&'static str` allow-lists in `portal_core::query`
//! and are interpolated directly; every value goes through a `?` bind.

use portal_core::query::{Page, PageRequest, Predicate, SortKey, Value};
use portal_core::stats::GroupCount;
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{FromRow, Sqlite, SqlitePool};

/// A rendered WHERE clause and its bind values, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFilter {
    pub clause: String,
    pub binds: Vec<Value>,
}

impl SqlFilter {
    pub fn render(predicate: &Predicate) -> Self {
        let mut clause = String::new();
        let mut binds = Vec::new();
        render_into(predicate, &mut clause, &mut binds);
        Self { clause, binds }
    }

    pub fn where_clause(&self) -> String {
        format!("WHERE {}", self.clause)
    }
}

fn render_into(predicate: &Predicate, sql: &mut String, binds: &mut Vec<Value>) {
    match predicate {
        Predicate::True => sql.push_str("1 = 1"),
        Predicate::False => sql.push_str("1 = 0"),
        Predicate::Eq(column, value) => compare(sql, binds, column, "=", value),
        Predicate::Lt(column, value) => compare(sql, binds, column, "<", value),
        Predicate::Gte(column, value) => compare(sql, binds, column, ">=", value),
        Predicate::IsNull(column) => {
            sql.push_str(column);
            sql.push_str(" IS NULL");
        }
        Predicate::And(parts) => join(parts, " AND ", "1 = 1", sql, binds),
        Predicate::Or(parts) => join(parts, " OR ", "1 = 0", sql, binds),
    }
}

fn compare(sql: &mut String, binds: &mut Vec<Value>, column: &str, op: &str, value: &Value) {
    sql.push_str(column);
    sql.push(' ');
    sql.push_str(op);
    sql.push_str(" ?");
    binds.push(value.clone());
}

fn join(
    parts: &[Predicate],
    separator: &str,
    empty: &str,
    sql: &mut String,
    binds: &mut Vec<Value>,
) {
    if parts.is_empty() {
        sql.push_str(empty);
        return;
    }
    sql.push('(');
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            sql.push_str(separator);
        }
        render_into(part, sql, binds);
    }
    sql.push(')');
}

/// `ORDER BY` clause for the given keys (empty string for no keys).
pub fn order_by(keys: &[SortKey]) -> String {
    if keys.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = keys
        .iter()
        .map(|k| {
            let dir = if k.descending { "DESC" } else { "ASC" };
            format!("{} {dir}", k.column)
        })
        .collect();
    format!("ORDER BY {}", parts.join(", "))
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// Bind filter values onto a `QueryAs`.
pub fn bind_values<'q, O>(
    mut q: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    values: &'q [Value],
) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    for value in values {
        q = match value {
            Value::Int(v) => q.bind(*v),
            Value::Text(v) => q.bind(v.as_str()),
            Value::Bool(v) => q.bind(*v),
            Value::Time(v) => q.bind(*v),
        };
    }
    q
}

/// Bind filter values onto a `QueryScalar`.
pub fn bind_values_scalar<'q, T>(
    mut q: QueryScalar<'q, Sqlite, T, SqliteArguments<'q>>,
    values: &'q [Value],
) -> QueryScalar<'q, Sqlite, T, SqliteArguments<'q>> {
    for value in values {
        q = match value {
            Value::Int(v) => q.bind(*v),
            Value::Text(v) => q.bind(v.as_str()),
            Value::Bool(v) => q.bind(*v),
            Value::Time(v) => q.bind(*v),
        };
    }
    q
}

// ---------------------------------------------------------------------------
// Shared queries
// ---------------------------------------------------------------------------

/// Count the rows of `table` matching `filter`.
pub async fn count(
    pool: &SqlitePool,
    table: &str,
    filter: &Predicate,
) -> Result<i64, sqlx::Error> {
    let rendered = SqlFilter::render(filter);
    let query = format!("SELECT COUNT(*) FROM {table} {}", rendered.where_clause());
    bind_values_scalar(sqlx::query_scalar::<_, i64>(&query), &rendered.binds)
        .fetch_one(pool)
        .await
}

/// Fetch one page of `table` plus the total size of the filtered set.
pub async fn fetch_page<T>(
    pool: &SqlitePool,
    table: &str,
    columns: &str,
    filter: &Predicate,
    order: &[SortKey],
    page: &PageRequest,
) -> Result<Page<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let total = count(pool, table, filter).await?;

    let rendered = SqlFilter::render(filter);
    let query = format!(
        "SELECT {columns} FROM {table} {} {} LIMIT ? OFFSET ?",
        rendered.where_clause(),
        order_by(order)
    );
    let items = bind_values(sqlx::query_as::<_, T>(&query), &rendered.binds)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await?;

    Ok(Page::new(items, total, page))
}

/// Sparse group-by count over a text column; NULL keys are skipped.
pub async fn group_counts(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    filter: &Predicate,
) -> Result<Vec<GroupCount>, sqlx::Error> {
    let rendered = SqlFilter::render(filter);
    let query = format!(
        "SELECT {column}, COUNT(*) FROM {table} {} AND {column} IS NOT NULL \
         GROUP BY {column} ORDER BY COUNT(*) DESC, {column} ASC",
        rendered.where_clause()
    );
    let rows = bind_values(sqlx::query_as::<_, (String, i64)>(&query), &rendered.binds)
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(key, count)| GroupCount::new(key, count))
        .collect())
}

/// Sum of an integer column over the filtered set (0 when empty).
pub async fn sum(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    filter: &Predicate,
) -> Result<i64, sqlx::Error> {
    let rendered = SqlFilter::render(filter);
    let query = format!(
        "SELECT COALESCE(SUM({column}), 0) FROM {table} {}",
        rendered.where_clause()
    );
    bind_values_scalar(sqlx::query_scalar::<_, i64>(&query), &rendered.binds)
        .fetch_one(pool)
        .await
}

/// Average of a numeric column over the filtered set (`None` when empty).
pub async fn average(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    filter: &Predicate,
) -> Result<Option<f64>, sqlx::Error> {
    let rendered = SqlFilter::render(filter);
    let query = format!(
        "SELECT AVG({column}) FROM {table} {}",
        rendered.where_clause()
    );
    bind_values_scalar(sqlx::query_scalar::<_, Option<f64>>(&query), &rendered.binds)
        .fetch_one(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_identity_and_empty() {
        assert_eq!(SqlFilter::render(&Predicate::True).clause, "1 = 1");
        assert_eq!(SqlFilter::render(&Predicate::False).clause, "1 = 0");
        assert_eq!(SqlFilter::render(&Predicate::And(vec![])).clause, "1 = 1");
        assert_eq!(SqlFilter::render(&Predicate::Or(vec![])).clause, "1 = 0");
    }

    #[test]
    fn test_render_nested_predicate_in_bind_order() {
        let predicate = Predicate::and([
            Predicate::eq("assigned_to", 7),
            Predicate::or([
                Predicate::IsNull("expiry_date"),
                Predicate::eq("status", "published"),
            ]),
        ]);
        let rendered = SqlFilter::render(&predicate);
        assert_eq!(
            rendered.clause,
            "(assigned_to = ? AND (expiry_date IS NULL OR status = ?))"
        );
        assert_eq!(
            rendered.binds,
            vec![Value::Int(7), Value::Text("published".to_string())]
        );
    }

    #[test]
    fn test_order_by() {
        assert_eq!(
            order_by(&[SortKey::desc("is_featured"), SortKey::asc("display_order")]),
            "ORDER BY is_featured DESC, display_order ASC"
        );
        assert_eq!(order_by(&[]), "");
    }
}
