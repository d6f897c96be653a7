use std::sync::Arc;

use bytes::BufMut;

use crate::common::RecordId;

use super::{Schema, Value};

/// A single row of a table: one value per schema column, plus the record id
/// assigned once the tuple is stored on a page.
///
/// Serialized form is the concatenation of each value's fixed-width encoding
/// in column order, `schema.tuple_size()` bytes in total.
#[derive(Debug, Clone)]
pub struct Tuple {
    schema: Arc<Schema>,
    values: Vec<Value>,
    rid: Option<RecordId>,
}

impl Tuple {
    /// Creates a new tuple with the given schema and values.
    ///
    /// # Panics
    /// Panics if the value count or any value's type does not match the
    /// schema.
    pub fn new(schema: Arc<Schema>, values: Vec<Value>) -> Self {
        assert_eq!(
            values.len(),
            schema.column_count(),
            "value count must match schema column count"
        );
        for (i, value) in values.iter().enumerate() {
            let column = schema.column(i).unwrap();
            assert!(
                value.matches(column.data_type()),
                "value {} does not fit column {}",
                value,
                column.name()
            );
        }
        Self {
            schema,
            values,
            rid: None,
        }
    }

    /// Decodes a tuple from exactly `schema.tuple_size()` bytes.
    pub fn from_bytes(schema: Arc<Schema>, data: &[u8]) -> Option<Self> {
        if data.len() < schema.tuple_size() {
            return None;
        }
        let mut buf = data;
        let mut values = Vec::with_capacity(schema.column_count());
        for column in schema.columns() {
            values.push(Value::decode(column.data_type(), &mut buf)?);
        }
        Some(Self {
            schema,
            values,
            rid: None,
        })
    }

    /// Encodes this tuple into `buf`, writing `schema.tuple_size()` bytes.
    pub fn encode(&self, buf: &mut impl BufMut) {
        for (value, column) in self.values.iter().zip(self.schema.columns()) {
            value.encode(column.data_type(), buf);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.schema.tuple_size());
        self.encode(&mut buf);
        buf
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Record id locating this tuple on a page, if it is stored.
    pub fn rid(&self) -> Option<RecordId> {
        self.rid
    }

    pub fn set_rid(&mut self, rid: Option<RecordId>) {
        self.rid = rid;
    }
}

/// Tuples compare by schema and values; where a tuple happens to be stored
/// does not affect equality.
impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.values == other.values
    }
}

impl Eq for Tuple {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::{Column, DataType};

    fn test_schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Column::new("id", DataType::Int),
            Column::new("name", DataType::Text(8)),
        ]))
    }

    #[test]
    fn test_round_trip() {
        let schema = test_schema();
        let tuple = Tuple::new(
            Arc::clone(&schema),
            vec![Value::Int(42), Value::Text("hi".into())],
        );

        let bytes = tuple.to_bytes();
        assert_eq!(bytes.len(), schema.tuple_size());

        let decoded = Tuple::from_bytes(schema, &bytes).unwrap();
        assert_eq!(decoded, tuple);
    }

    #[test]
    fn test_equality_ignores_rid() {
        use crate::common::{PageId, RecordId, SlotId, TableId};

        let schema = test_schema();
        let a = Tuple::new(
            Arc::clone(&schema),
            vec![Value::Int(1), Value::Text("x".into())],
        );
        let mut b = a.clone();
        b.set_rid(Some(RecordId::new(
            PageId::new(TableId::new(9), 0),
            SlotId::new(3),
        )));
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic]
    fn test_value_count_mismatch_panics() {
        let schema = test_schema();
        let _ = Tuple::new(schema, vec![Value::Int(1)]);
    }
}
