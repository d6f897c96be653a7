use super::DataType;

/// A single named column in a table schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    data_type: DataType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

/// Ordered set of columns describing the tuples of one table.
///
/// All columns are fixed-width, so a schema fully determines the byte width
/// of every tuple slot on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
    tuple_size: usize,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        assert!(!columns.is_empty(), "schema must have at least one column");
        let tuple_size = columns.iter().map(|c| c.data_type().width()).sum();
        Self {
            columns,
            tuple_size,
        }
    }

    /// Byte width of one serialized tuple under this schema.
    pub fn tuple_size(&self) -> usize {
        self.tuple_size
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_size() {
        let schema = Schema::new(vec![
            Column::new("id", DataType::Int),
            Column::new("name", DataType::Text(12)),
        ]);
        assert_eq!(schema.tuple_size(), 4 + 16);
        assert_eq!(schema.column_count(), 2);
    }

    #[test]
    fn test_column_lookup() {
        let schema = Schema::new(vec![
            Column::new("a", DataType::Int),
            Column::new("b", DataType::Int),
        ]);
        assert_eq!(schema.column_index("b"), Some(1));
        assert_eq!(schema.column_index("c"), None);
        assert_eq!(schema.column(0).unwrap().name(), "a");
    }

    #[test]
    fn test_structural_equality() {
        let a = Schema::new(vec![Column::new("x", DataType::Int)]);
        let b = Schema::new(vec![Column::new("x", DataType::Int)]);
        assert_eq!(a, b);
    }
}
