//! Value conversion at the rusqlite boundary

use rowmap_core::{ParamSource, StatementTemplate, Value};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};

pub(crate) fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(r) => SqlValue::Real(*r),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Blob(b) => SqlValue::Blob(b.clone()),
    }
}

pub(crate) fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

/// Keyset position and batch size for paged selects
pub(crate) struct Page<'a> {
    pub after: &'a Value,
    pub limit: usize,
}

/// Parameters in slot order for one execution of `template`
pub(crate) fn bind_params(
    template: &StatementTemplate,
    column: impl Fn(usize) -> Value,
    page: Option<Page<'_>>,
) -> Vec<SqlValue> {
    template
        .params()
        .iter()
        .map(|param| match param.source {
            ParamSource::Column(index) => to_sql(&column(index)),
            ParamSource::PageAfter => page.as_ref().map_or(SqlValue::Null, |p| to_sql(p.after)),
            ParamSource::PageLimit => page
                .as_ref()
                .map_or(SqlValue::Integer(-1), |p| {
                    SqlValue::Integer(i64::try_from(p.limit).unwrap_or(i64::MAX))
                }),
        })
        .collect()
}

/// Column source backed by a full entity row
pub(crate) fn from_row(row: &[Value]) -> impl Fn(usize) -> Value + '_ {
    move |index| row.get(index).cloned().unwrap_or(Value::Null)
}

pub(crate) fn execute(conn: &Connection, sql: &str, params: Vec<SqlValue>) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare_cached(sql)?;
    stmt.execute(params_from_iter(params))
}

pub(crate) fn query_rows(
    conn: &Connection,
    sql: &str,
    params: Vec<SqlValue>,
) -> rusqlite::Result<Vec<Vec<Value>>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let width = stmt.column_count();
    let mut rows = stmt.query(params_from_iter(params))?;

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for index in 0..width {
            values.push(from_sql(row.get_ref(index)?));
        }
        out.push(values);
    }
    Ok(out)
}
