use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`; a JSON null matches missing/null columns.
    Eq { column: String, value: Value },
    /// `column IN (values)`; an empty list matches nothing.
    In { column: String, values: Vec<Value> },
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Self::Eq { column, .. } | Self::In { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
    pub nulls_last: bool,
}

/// A structured read against one origin table.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginQuery {
    pub table: String,
    pub columns: Option<Vec<String>>,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<u64>,
}

impl OriginQuery {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: None,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn is_in<I, V>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filters.push(Filter::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn order_by(
        mut self, column: impl Into<String>, ascending: bool, nulls_last: bool,
    ) -> Self {
        self.order.push(Order {
            column: column.into(),
            ascending,
            nulls_last,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when an `In` filter with no values makes the result empty.
    pub fn is_trivially_empty(&self) -> bool {
        self.filters
            .iter()
            .any(|f| matches!(f, Filter::In { values, .. } if values.is_empty()))
    }
}
