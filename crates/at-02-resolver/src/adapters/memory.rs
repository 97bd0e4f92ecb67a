use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use shared_types::{
    render_value, AppliedFilter, FilterOption, Pagination, ResolvedListData, ResourceContext, Row,
    Sort, SortDirection,
};
use tracing::debug;

use crate::domain::error::ResolverError;
use crate::domain::matching::{compare_values, CompiledFilter};
use crate::domain::schema::{ColumnSchema, ValueKind};
use crate::ports::Resolver;

/// In-memory resolver for one resource.
///
/// Rows live in a `Vec` behind a `RwLock`; every query is a full scan.
/// Suited to demos, tests and small lookup tables.
///
/// Every stored row carries every schema key; keys a caller leaves out are
/// stored as null, the way a table column reads back as NULL.
pub struct InMemoryResolver {
    schema: Vec<ColumnSchema>,
    id_column: String,
    rows: RwLock<Vec<Row>>,
}

impl InMemoryResolver {
    /// Create an empty resolver. `id_column` must be part of `schema`.
    pub fn new(
        schema: Vec<ColumnSchema>,
        id_column: impl Into<String>,
    ) -> Result<Self, ResolverError> {
        let id_column = id_column.into();
        if !schema.iter().any(|c| c.key == id_column) {
            return Err(ResolverError::Backend(format!(
                "id column '{id_column}' is not part of the schema"
            )));
        }
        Ok(Self {
            schema,
            id_column,
            rows: RwLock::new(Vec::new()),
        })
    }

    pub fn with_rows(self, rows: impl IntoIterator<Item = Row>) -> Self {
        let filled: Vec<Row> = rows
            .into_iter()
            .map(|mut row| {
                self.fill_schema(&mut row);
                row
            })
            .collect();
        self.rows.write().extend(filled);
        self
    }

    pub fn schema(&self) -> &[ColumnSchema] {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Insert a row and return its id.
    ///
    /// A row without an id gets `max(id) + 1` when the id column is an
    /// integer; otherwise a missing id is rejected.
    pub fn insert(&self, row: Row) -> Result<Value, ResolverError> {
        self.insert_with(row, |_, _| {})
    }

    /// Like [`insert`](Self::insert), but `complete` sees the assigned id
    /// and may add fields derived from it before the row becomes visible.
    pub fn insert_with(
        &self,
        mut row: Row,
        complete: impl FnOnce(&Value, &mut Row),
    ) -> Result<Value, ResolverError> {
        let mut rows = self.rows.write();
        let id = match row.get(&self.id_column) {
            Some(id) if !id.is_null() => id.clone(),
            _ if self.id_kind() == Some(ValueKind::Integer) => {
                let next = rows
                    .iter()
                    .filter_map(|r| r.get(&self.id_column).and_then(Value::as_i64))
                    .max()
                    .unwrap_or(0)
                    + 1;
                Value::from(next)
            }
            _ => {
                return Err(ResolverError::InvalidValue {
                    column: self.id_column.clone(),
                    value: String::new(),
                    reason: "missing id".to_string(),
                })
            }
        };
        let wire = render_value(&id);
        if rows.iter().any(|r| self.has_id(r, &wire)) {
            return Err(ResolverError::InvalidValue {
                column: self.id_column.clone(),
                value: wire,
                reason: "duplicate id".to_string(),
            });
        }
        complete(&id, &mut row);
        row.insert(self.id_column.clone(), id.clone());
        self.fill_schema(&mut row);
        rows.push(row);
        Ok(id)
    }

    /// Merge `patch` into the row with `id`. Returns false when absent.
    pub fn update(&self, id: &str, patch: Row) -> bool {
        let mut rows = self.rows.write();
        match rows.iter_mut().find(|r| self.has_id(r, id)) {
            Some(row) => {
                for (k, v) in patch {
                    if k != self.id_column {
                        row.insert(k, v);
                    }
                }
                true
            }
            None => false,
        }
    }

    /// Edit the row with `id` in place under the write lock, so
    /// read-modify-write updates never interleave. The id is kept.
    /// Returns false when absent.
    pub fn modify(&self, id: &str, edit: impl FnOnce(&mut Row)) -> bool {
        let mut rows = self.rows.write();
        let Some(row) = rows.iter_mut().find(|r| self.has_id(r, id)) else {
            return false;
        };
        let original = row.get(&self.id_column).cloned();
        edit(row);
        if let Some(original) = original {
            row.insert(self.id_column.clone(), original);
        }
        self.fill_schema(row);
        true
    }

    /// Remove the row with `id`. Returns false when absent.
    pub fn remove(&self, id: &str) -> bool {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|r| !self.has_id(r, id));
        rows.len() != before
    }

    pub fn get(&self, id: &str) -> Option<Row> {
        self.rows.read().iter().find(|r| self.has_id(r, id)).cloned()
    }

    fn fill_schema(&self, row: &mut Row) {
        for column in &self.schema {
            row.entry(column.key.clone()).or_insert(Value::Null);
        }
    }

    fn id_kind(&self) -> Option<ValueKind> {
        self.column(&self.id_column).map(|c| c.kind)
    }

    fn has_id(&self, row: &Row, id: &str) -> bool {
        row.get(&self.id_column)
            .is_some_and(|v| render_value(v) == id)
    }

    fn column(&self, key: &str) -> Option<&ColumnSchema> {
        self.schema.iter().find(|c| c.key == key)
    }

    fn require_column(&self, ctx: &ResourceContext, key: &str) -> Result<&ColumnSchema, ResolverError> {
        self.column(key).ok_or_else(|| ResolverError::UnknownColumn {
            resource: ctx.name.clone(),
            column: key.to_string(),
        })
    }
}

#[async_trait]
impl Resolver for InMemoryResolver {
    async fn resolve_list(
        &self,
        ctx: &ResourceContext,
        page: u64,
        per_page: u64,
        filters: &[AppliedFilter],
        sort: &Sort,
    ) -> Result<ResolvedListData, ResolverError> {
        if page < 1 || per_page < 1 {
            return Err(ResolverError::InvalidPagination { page, per_page });
        }

        let compiled = filters
            .iter()
            .map(|f| CompiledFilter::compile(self.require_column(ctx, &f.reference)?, f))
            .collect::<Result<Vec<_>, _>>()?;
        self.require_column(ctx, &sort.reference)?;

        let mut matching: Vec<Row> = self
            .rows
            .read()
            .iter()
            .filter(|row| compiled.iter().all(|f| f.matches(row)))
            .cloned()
            .collect();

        // stable, so ties keep insertion order
        matching.sort_by(|a, b| {
            let ord = compare_values(
                a.get(&sort.reference).unwrap_or(&Value::Null),
                b.get(&sort.reference).unwrap_or(&Value::Null),
            );
            match sort.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });

        let pagination = Pagination {
            page,
            per_page,
            total: matching.len() as u64,
        };
        let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(per_page).unwrap_or(usize::MAX);
        let rows: Vec<Row> = matching.into_iter().skip(offset).take(limit).collect();

        debug!(
            resource = %ctx.name,
            filters = filters.len(),
            total = pagination.total,
            returned = rows.len(),
            "Resolved list"
        );

        Ok(ResolvedListData { rows, pagination })
    }

    async fn resolve_detail(
        &self,
        _ctx: &ResourceContext,
        id: &str,
    ) -> Result<Option<Row>, ResolverError> {
        Ok(self.get(id))
    }

    async fn filter_options(
        &self,
        _ctx: &ResourceContext,
    ) -> Result<BTreeMap<String, FilterOption>, ResolverError> {
        Ok(self
            .schema
            .iter()
            .map(|c| (c.key.clone(), FilterOption::new(c.key.clone(), c.display.clone())))
            .collect())
    }
}
