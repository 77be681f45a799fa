//! Record -> insert row transformation.

use chrono::{DateTime, Utc};
use rusqlite::types::{ToSql, Value as SqlValue};
use serde_yaml::Value;

use crate::schema::{Record, SchemaDescriptor};

/// Initial value of the `value` column for return and definition rows. The
/// source document's `value` is never stored.
pub const INITIAL_COUNTER_VALUE: i64 = 0;

/// Ordered column values for one insert: `id`, content columns, `created`,
/// `modified`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertRow {
    /// Always `None`; the store assigns the identifier.
    pub id: Option<i64>,
    pub content: Vec<SqlValue>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl InsertRow {
    /// Parameters in statement order.
    pub fn params(&self) -> Vec<&dyn ToSql> {
        let mut params: Vec<&dyn ToSql> = Vec::with_capacity(self.content.len() + 3);
        params.push(&self.id);
        params.extend(self.content.iter().map(|value| value as &dyn ToSql));
        params.push(&self.created);
        params.push(&self.modified);
        params
    }
}

/// Build the insert row for `record`, stamping both timestamp columns with
/// the same instant.
pub fn transform(
    record: &Record,
    descriptor: &SchemaDescriptor,
    timestamp: DateTime<Utc>,
) -> InsertRow {
    InsertRow {
        id: None,
        content: (descriptor.map_columns)(record),
        created: timestamp,
        modified: timestamp,
    }
}

/// `repr, type, data, size`, verbatim.
pub fn token_columns(record: &Record) -> Vec<SqlValue> {
    ["repr", "type", "data", "size"]
        .iter()
        .map(|field| field_value(record, field))
        .collect()
}

/// `name`, then the initial counter value.
pub fn named_counter_columns(record: &Record) -> Vec<SqlValue> {
    vec![
        field_value(record, "name"),
        SqlValue::Integer(INITIAL_COUNTER_VALUE),
    ]
}

fn field_value(record: &Record, field: &str) -> SqlValue {
    record.get(field).map(to_sql_value).unwrap_or(SqlValue::Null)
}

/// Convert a YAML scalar into the matching SQLite value. Nested sequences and
/// mappings are stored as JSON text. Integers outside the `i64` range keep
/// their decimal text, since SQLite has no wider integer type.
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Integer(i)
            } else if n.is_u64() {
                SqlValue::Text(n.to_string())
            } else {
                SqlValue::Real(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Sequence(_) | Value::Mapping(_) => SqlValue::Text(
            serde_json::to_string(value)
                .or_else(|_| serde_yaml::to_string(value).map(|s| s.trim_end().to_string()))
                .unwrap_or_default(),
        ),
        Value::Tagged(tagged) => to_sql_value(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RecordKind;
    use chrono::TimeZone;
    use serde_yaml::Mapping;

    fn record(yaml: &str) -> Record {
        let map: Mapping = serde_yaml::from_str(yaml).unwrap();
        Record::from(map)
    }

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 12, 30, 0).unwrap()
    }

    #[test]
    fn token_passes_through_verbatim() {
        let descriptor = SchemaDescriptor::new(RecordKind::Token, "tokens.yaml", "token");
        let row = transform(
            &record("{ repr: '+', type: OP, data: '+', size: 1 }"),
            &descriptor,
            instant(),
        );
        assert_eq!(row.id, None);
        assert_eq!(
            row.content,
            vec![
                SqlValue::Text("+".into()),
                SqlValue::Text("OP".into()),
                SqlValue::Text("+".into()),
                SqlValue::Integer(1),
            ]
        );
        assert_eq!(row.created, instant());
        assert_eq!(row.created, row.modified);
        assert_eq!(row.params().len(), 7);
    }

    #[test]
    fn counter_value_ignores_source() {
        for kind in [RecordKind::Return, RecordKind::Definition] {
            let descriptor = SchemaDescriptor::new(kind, "x.yaml", kind.as_str());
            let row = transform(
                &record("{ name: EXIT_OK, value: 99 }"),
                &descriptor,
                instant(),
            );
            assert_eq!(
                row.content,
                vec![SqlValue::Text("EXIT_OK".into()), SqlValue::Integer(0)]
            );
            assert_eq!(row.params().len(), 5);
        }
    }

    #[test]
    fn scalar_conversion() {
        assert_eq!(to_sql_value(&Value::Null), SqlValue::Null);
        assert_eq!(to_sql_value(&Value::Bool(true)), SqlValue::Integer(1));
        assert_eq!(to_sql_value(&Value::from(2.5)), SqlValue::Real(2.5));
        assert_eq!(to_sql_value(&Value::from(-7)), SqlValue::Integer(-7));
        let nested: Value = serde_yaml::from_str("[1, 2]").unwrap();
        assert_eq!(to_sql_value(&nested), SqlValue::Text("[1,2]".into()));
    }

    #[test]
    fn integers_past_i64_keep_every_digit() {
        let max = Value::from(i64::MAX);
        assert_eq!(to_sql_value(&max), SqlValue::Integer(i64::MAX));

        let wide: Value = serde_yaml::from_str("18446744073709551615").unwrap();
        assert_eq!(
            to_sql_value(&wide),
            SqlValue::Text("18446744073709551615".into())
        );

        let descriptor = SchemaDescriptor::new(RecordKind::Token, "tokens.yaml", "token");
        let row = transform(
            &record("{ repr: big, type: INT, data: big, size: 9223372036854775808 }"),
            &descriptor,
            instant(),
        );
        assert_eq!(row.content[3], SqlValue::Text("9223372036854775808".into()));
    }
}
