//! Positional SQL statement assembly.
//!
//! # Responsibility
//! - Collect static SQL text and `(fragment, values)` pairs in append order.
//! - Render `?N` placeholders from list position when the statement is built.
//!
//! # Invariants
//! - SQL text is only ever assembled from `&'static str` pieces; bound values
//!   never reach the statement text.
//! - Inside a fragment template, `?` is reserved for placeholders. Each `?`
//!   consumes exactly one value, in order.
//! - Placeholder indices are shared by every fragment of one statement and
//!   increase monotonically from `?1`.

use rusqlite::types::Value;

/// Value bound to one positional placeholder.
pub type SqlValue = Value;

/// Static SQL template plus the values for its `?` holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    template: &'static str,
    values: Vec<SqlValue>,
}

impl Fragment {
    pub fn new(template: &'static str, values: impl IntoIterator<Item = SqlValue>) -> Self {
        let values: Vec<SqlValue> = values.into_iter().collect();
        debug_assert_eq!(
            placeholder_count(template),
            values.len(),
            "fragment `{template}` placeholder/value mismatch"
        );
        Self { template, values }
    }

    pub fn template(&self) -> &'static str {
        self.template
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

#[derive(Debug, Clone)]
enum Part {
    Text(&'static str),
    Bound(Fragment),
}

/// Ordered statement pieces, rendered once at [`StatementBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct StatementBuilder {
    parts: Vec<Part>,
}

impl StatementBuilder {
    pub fn new(head: &'static str) -> Self {
        Self {
            parts: vec![Part::Text(head)],
        }
    }

    /// Appends static SQL text.
    pub fn text(mut self, text: &'static str) -> Self {
        self.parts.push(Part::Text(text));
        self
    }

    /// Appends one fragment with its values.
    pub fn bind(
        mut self,
        template: &'static str,
        values: impl IntoIterator<Item = SqlValue>,
    ) -> Self {
        self.parts.push(Part::Bound(Fragment::new(template, values)));
        self
    }

    /// Appends `prefix`, then `fragments` joined by `separator`.
    ///
    /// Emits nothing when `fragments` is empty.
    pub fn join(
        mut self,
        prefix: &'static str,
        separator: &'static str,
        fragments: impl IntoIterator<Item = Fragment>,
    ) -> Self {
        for (position, fragment) in fragments.into_iter().enumerate() {
            self.parts
                .push(Part::Text(if position == 0 { prefix } else { separator }));
            self.parts.push(Part::Bound(fragment));
        }
        self
    }

    pub fn build(self) -> Statement {
        let mut sql = String::new();
        let mut params = Vec::new();

        for part in self.parts {
            match part {
                Part::Text(text) => sql.push_str(text),
                Part::Bound(fragment) => {
                    let mut values = fragment.values.into_iter();
                    for ch in fragment.template.chars() {
                        if ch == '?' {
                            params.push(values.next().unwrap_or(SqlValue::Null));
                            sql.push('?');
                            sql.push_str(&params.len().to_string());
                        } else {
                            sql.push(ch);
                        }
                    }
                }
            }
        }

        Statement { sql, params }
    }
}

/// Rendered statement ready for the store gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<SqlValue>,
}

impl Statement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Whether the statement writes to the store.
    pub fn is_mutation(&self) -> bool {
        let head = self.sql.trim_start();
        ["INSERT", "UPDATE", "DELETE"]
            .iter()
            .any(|keyword| head.starts_with(keyword))
    }
}

fn placeholder_count(template: &str) -> usize {
    template.chars().filter(|ch| *ch == '?').count()
}
