//! Query parameters and result records

use super::value::SqlValue;
use indexmap::IndexMap;

/// One result row: column name to value, in projection order
pub type Record = IndexMap<String, SqlValue>;

/// Named query parameters
///
/// Values are handed to the driver in insertion order, so the names only
/// label the placeholders; the placeholder syntax itself is backend
/// specific (`?`, `$1`, `@P1`). The adapters never splice values into
/// the SQL text.
///
/// `None` binds as [`SqlValue::Null`]. PostgreSQL receives it with an
/// unspecified type and infers one from the statement; where it cannot
/// (`SELECT $1`), cast the placeholder explicitly (`$1::int4`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: IndexMap<String, SqlValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, builder style
    ///
    /// Re-binding an existing name replaces its value but keeps its
    /// original position.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add or replace a parameter
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(name, value)` pairs in binding order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Values in binding order
    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.values.values()
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<SqlValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_order_is_insertion_order() {
        let params = Params::new()
            .bind("name", "Ada")
            .bind("age", 36)
            .bind("active", true);

        let names: Vec<&str> = params.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["name", "age", "active"]);
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_rebind_keeps_position() {
        let params = Params::new().bind("a", 1).bind("b", 2).bind("a", 3);
        let values: Vec<&SqlValue> = params.values().collect();
        assert_eq!(values, vec![&SqlValue::Int(3), &SqlValue::Int(2)]);
    }

    #[test]
    fn test_from_iterator() {
        let params: Params = vec![("id", 7i64)].into_iter().collect();
        assert_eq!(params.get("id"), Some(&SqlValue::BigInt(7)));
        assert!(!params.is_empty());
    }
}
