use serde::Serialize;
use std::fmt;

/// Kind of statement generated for a metamodel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    CreateTable,
    /// All columns, key supplied by the caller
    Insert,
    /// All columns except the store-generated key
    InsertGenerated,
    Update,
    Upsert,
    Delete,
    SelectByKey,
    /// Keyset-paged scan of the whole table
    SelectAll,
    /// Keyset-paged scan filtered on one foreign-key column
    SelectByForeignKey(String),
    Count,
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::CreateTable => "create_table",
            OperationKind::Insert => "insert",
            OperationKind::InsertGenerated => "insert_generated",
            OperationKind::Update => "update",
            OperationKind::Upsert => "upsert",
            OperationKind::Delete => "delete",
            OperationKind::SelectByKey => "select_by_key",
            OperationKind::SelectAll => "select_all",
            OperationKind::SelectByForeignKey(_) => "select_by_foreign_key",
            OperationKind::Count => "count",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::SelectByForeignKey(column) => write!(f, "{}({})", self.name(), column),
            other => f.write_str(other.name()),
        }
    }
}

/// Where the value for one `?N` slot comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSource {
    /// Value at this index of the entity row
    Column(usize),
    /// Last key of the previous page, NULL for the first page
    PageAfter,
    PageLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamBinding {
    pub slot: usize,
    pub source: ParamSource,
}

/// Parameterized SQL with a fixed binding order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementTemplate {
    kind: OperationKind,
    sql: String,
    params: Vec<ParamBinding>,
}

impl StatementTemplate {
    pub(crate) fn new(kind: OperationKind, sql: String, params: Vec<ParamBinding>) -> Self {
        Self { kind, sql, params }
    }

    pub fn kind(&self) -> &OperationKind {
        &self.kind
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bindings ordered by slot
    pub fn params(&self) -> &[ParamBinding] {
        &self.params
    }

    /// Number of slots bound from entity columns
    pub fn column_binding_count(&self) -> usize {
        self.params
            .iter()
            .filter(|p| matches!(p.source, ParamSource::Column(_)))
            .count()
    }
}

impl fmt::Display for StatementTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
