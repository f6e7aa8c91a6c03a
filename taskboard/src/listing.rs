//! Generic filtering, sorting and cursor paging for list queries.
//!
//! Works on any SeaORM entity: field names are resolved against the entity's
//! columns at request time, so every column can be filtered and sorted
//! without per-field code. Field names may be given in camelCase (as on the
//! wire) or snake_case (as in the table).

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ColumnType, Condition, EntityTrait, Iterable, Order, PrimaryKeyToColumn,
    QueryFilter, QueryOrder, Select,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::TaskBoardError;

/// Page size defaults, mirroring the usual GraphQL server defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: u64,
    pub max_size: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: 10,
            max_size: 50,
        }
    }
}

impl PageLimits {
    pub fn new(default_size: u64, max_size: u64) -> Self {
        let max_size = max_size.max(1);
        Self {
            default_size: default_size.clamp(1, max_size),
            max_size,
        }
    }

    /// Resolve `first`/`after` into an offset window.
    pub(crate) fn window(
        &self,
        args: &ListArgs,
        operation: &'static str,
    ) -> Result<PageWindow, TaskBoardError> {
        let limit = args
            .first
            .unwrap_or(self.default_size)
            .clamp(1, self.max_size);
        let offset = match args.after.as_deref() {
            None => 0,
            Some(cursor) => {
                let invalid =
                    || TaskBoardError::validation(operation, format!("invalid cursor '{cursor}'"));
                let position: u64 = cursor.parse().map_err(|_| invalid())?;
                position.checked_add(1).ok_or_else(invalid)?
            }
        };
        Ok(PageWindow { offset, limit })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageWindow {
    pub offset: u64,
    pub limit: u64,
}

/// Arguments shared by every list query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListArgs {
    /// Conditions combined with AND.
    #[serde(default, rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<FieldFilter>,
    /// Replaces the query's default order when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<SortField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

impl ListArgs {
    pub fn first(mut self, first: u64) -> Self {
        self.first = Some(first);
        self
    }

    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    pub fn filter(mut self, field: &str, op: FilterOp, value: impl Into<JsonValue>) -> Self {
        self.filter.push(FieldFilter {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.order.push(SortField {
            field: field.to_string(),
            direction,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    #[serde(default)]
    pub value: JsonValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Contains,
    StartsWith,
    EndsWith,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

/// A page of results in the `nodes` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub nodes: Vec<T>,
    pub page_info: PageInfo,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

/// Build the envelope from rows fetched with `limit + 1` so the extra row
/// tells whether another page exists.
pub(crate) fn connection<T>(mut nodes: Vec<T>, window: PageWindow, total_count: u64) -> Connection<T> {
    let has_next_page = nodes.len() as u64 > window.limit;
    nodes.truncate(window.limit as usize);

    let (start_cursor, end_cursor) = if nodes.is_empty() {
        (None, None)
    } else {
        let last = window.offset + nodes.len() as u64 - 1;
        (Some(window.offset.to_string()), Some(last.to_string()))
    };

    Connection {
        nodes,
        page_info: PageInfo {
            has_next_page,
            has_previous_page: window.offset > 0,
            start_cursor,
            end_cursor,
        },
        total_count,
    }
}

/// A boolean API field computed from a column: it is true exactly when
/// `column` holds `when_true`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DerivedFlag<C> {
    pub name: &'static str,
    pub column: C,
    pub when_true: &'static str,
}

impl<C: ColumnTrait> DerivedFlag<C> {
    fn matches(&self, field: &str) -> bool {
        to_snake_case(field) == self.name
    }

    fn condition(&self, filter: &FieldFilter, operation: &'static str) -> Result<Condition, TaskBoardError> {
        let wanted = match (filter.op, &filter.value) {
            (FilterOp::Eq, JsonValue::Bool(b)) => *b,
            (FilterOp::Neq, JsonValue::Bool(b)) => !*b,
            _ => return Err(unsupported(filter, operation)),
        };
        let cond = Condition::all();
        Ok(if wanted {
            cond.add(self.column.eq(self.when_true))
        } else {
            cond.add(self.column.ne(self.when_true))
        })
    }
}

pub(crate) fn apply_filters<E>(
    mut select: Select<E>,
    filters: &[FieldFilter],
    derived: &[DerivedFlag<E::Column>],
    operation: &'static str,
) -> Result<Select<E>, TaskBoardError>
where
    E: EntityTrait,
{
    for filter in filters {
        let cond = match derived.iter().find(|flag| flag.matches(&filter.field)) {
            Some(flag) => flag.condition(filter, operation)?,
            None => {
                let column = resolve_column::<E>(&filter.field, operation)?;
                condition(column, filter, operation)?
            }
        };
        select = select.filter(cond);
    }
    Ok(select)
}

/// Order by the requested fields, or by `default` when none were requested.
/// The primary key is always appended so pages are stable.
pub(crate) fn apply_order<E>(
    mut select: Select<E>,
    order: &[SortField],
    default: &[(E::Column, Order)],
    derived: &[DerivedFlag<E::Column>],
    operation: &'static str,
) -> Result<Select<E>, TaskBoardError>
where
    E: EntityTrait,
{
    if order.is_empty() {
        for (column, direction) in default {
            select = select.order_by(*column, direction.clone());
        }
    } else {
        for sort in order {
            select = match derived.iter().find(|flag| flag.matches(&sort.field)) {
                // false sorts before true
                Some(flag) => select.order_by(flag.column.eq(flag.when_true), sort.direction.into()),
                None => {
                    let column = resolve_column::<E>(&sort.field, operation)?;
                    select.order_by(column, sort.direction.into())
                }
            };
        }
    }
    if let Some(pk) = E::PrimaryKey::iter().next() {
        select = select.order_by(pk.into_column(), Order::Asc);
    }
    Ok(select)
}

fn resolve_column<E>(field: &str, operation: &'static str) -> Result<E::Column, TaskBoardError>
where
    E: EntityTrait,
{
    E::Column::from_str(&to_snake_case(field))
        .map_err(|_| TaskBoardError::validation(operation, format!("unknown field '{field}'")))
}

fn condition<C>(column: C, filter: &FieldFilter, operation: &'static str) -> Result<Condition, TaskBoardError>
where
    C: ColumnTrait,
{
    let value = &filter.value;
    let def = column.def();
    let kind = def.get_column_type();
    let cond = Condition::all();
    let cond = match filter.op {
        FilterOp::Eq if value.is_null() => cond.add(column.is_null()),
        FilterOp::Neq if value.is_null() => cond.add(column.is_not_null()),
        FilterOp::Eq => cond.add(column.eq(scalar(value, kind, filter, operation)?)),
        FilterOp::Neq => cond.add(column.ne(scalar(value, kind, filter, operation)?)),
        FilterOp::Gt => cond.add(column.gt(scalar(value, kind, filter, operation)?)),
        FilterOp::Gte => cond.add(column.gte(scalar(value, kind, filter, operation)?)),
        FilterOp::Lt => cond.add(column.lt(scalar(value, kind, filter, operation)?)),
        FilterOp::Lte => cond.add(column.lte(scalar(value, kind, filter, operation)?)),
        FilterOp::In => cond.add(column.is_in(list(value, kind, filter, operation)?)),
        FilterOp::Nin => cond.add(column.is_not_in(list(value, kind, filter, operation)?)),
        FilterOp::Contains => cond.add(column.contains(text(value, filter, operation)?)),
        FilterOp::StartsWith => cond.add(column.starts_with(text(value, filter, operation)?)),
        FilterOp::EndsWith => cond.add(column.ends_with(text(value, filter, operation)?)),
    };
    Ok(cond)
}

fn is_timestamp(kind: &ColumnType) -> bool {
    matches!(
        kind,
        ColumnType::TimestampWithTimeZone | ColumnType::Timestamp | ColumnType::DateTime
    )
}

/// Convert a JSON value into a bind value for a column of type `kind`.
///
/// Timestamps are parsed as RFC 3339 and bound as `DateTime<Utc>` so they are
/// encoded exactly like the stored values.
fn scalar(
    value: &JsonValue,
    kind: &ColumnType,
    filter: &FieldFilter,
    operation: &'static str,
) -> Result<sea_orm::Value, TaskBoardError> {
    match value {
        JsonValue::String(s) if is_timestamp(kind) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc).into())
            .map_err(|e| {
                TaskBoardError::validation(
                    operation,
                    format!("invalid timestamp '{s}' for field '{}': {e}", filter.field),
                )
            }),
        _ if is_timestamp(kind) => Err(unsupported(filter, operation)),
        JsonValue::Bool(b) => Ok((*b).into()),
        JsonValue::String(s) => Ok(s.clone().into()),
        JsonValue::Number(n) => n
            .as_i64()
            .map(sea_orm::Value::from)
            .or_else(|| n.as_f64().map(sea_orm::Value::from))
            .ok_or_else(|| unsupported(filter, operation)),
        _ => Err(unsupported(filter, operation)),
    }
}

fn list(
    value: &JsonValue,
    kind: &ColumnType,
    filter: &FieldFilter,
    operation: &'static str,
) -> Result<Vec<sea_orm::Value>, TaskBoardError> {
    match value {
        JsonValue::Array(items) => items
            .iter()
            .map(|item| scalar(item, kind, filter, operation))
            .collect(),
        _ => Err(unsupported(filter, operation)),
    }
}

fn text<'v>(
    value: &'v JsonValue,
    filter: &FieldFilter,
    operation: &'static str,
) -> Result<&'v str, TaskBoardError> {
    value.as_str().ok_or_else(|| unsupported(filter, operation))
}

fn unsupported(filter: &FieldFilter, operation: &'static str) -> TaskBoardError {
    TaskBoardError::validation(
        operation,
        format!(
            "unsupported value {} for {:?} on field '{}'",
            filter.value, filter.op, filter.field
        ),
    )
}

fn to_snake_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + 4);
    for (i, ch) in field.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
