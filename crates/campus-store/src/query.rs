//! Ordered, limited queries over one collection or a collection group.

use crate::value::FieldValue;

/// Maximum number of values an `IN` filter may carry.
pub const MAX_IN_VALUES: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equals(String, FieldValue),
    In(String, Vec<FieldValue>),
    GreaterOrEqual(String, FieldValue),
    LessThan(String, FieldValue),
}

impl Filter {
    pub fn field(&self) -> &str {
        match self {
            Self::Equals(field, _)
            | Self::In(field, _)
            | Self::GreaterOrEqual(field, _)
            | Self::LessThan(field, _) => field,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A query against a collection path, or against every collection sharing
/// a name when `group` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub group: bool,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
    /// Cursor on the `order_by` field: results start strictly after it.
    pub start_after: Option<FieldValue>,
}

impl Query {
    pub fn collection(path: impl Into<String>) -> Self {
        Self {
            collection: path.into(),
            group: false,
            filters: Vec::new(),
            order_by: None,
            limit: None,
            start_after: None,
        }
    }

    /// Query every collection named `name`, wherever it is nested.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            group: true,
            ..Self::collection(name)
        }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.filters
            .push(Filter::Equals(field.to_string(), value.into()));
        self
    }

    pub fn where_in(mut self, field: &str, values: Vec<FieldValue>) -> Self {
        self.filters.push(Filter::In(field.to_string(), values));
        self
    }

    pub fn where_gte(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.filters
            .push(Filter::GreaterOrEqual(field.to_string(), value.into()));
        self
    }

    pub fn where_lt(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.filters
            .push(Filter::LessThan(field.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_after(mut self, cursor: impl Into<FieldValue>) -> Self {
        self.start_after = Some(cursor.into());
        self
    }
}
