//! Table schemas.

use std::collections::HashMap;
use std::fmt;

/// Type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// 32-bit signed integer.
    Int,
    /// String of at most `length` bytes.
    Varchar,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Int => "int",
            FieldType::Varchar => "varchar",
        }
    }
}

/// Type and declared length of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub ty: FieldType,
    /// Maximum string length in bytes; zero for integers.
    pub length: usize,
}

/// The fields of a table or of an operator's output.
///
/// Field names are unique. Fields keep their insertion order so output
/// columns come out in the order they were declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<String>,
    info: HashMap<String, FieldInfo>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field. A field that is already present keeps its first definition.
    pub fn add_field(&mut self, name: impl Into<String>, ty: FieldType, length: usize) {
        let name = name.into();
        if self.info.contains_key(&name) {
            return;
        }
        self.info.insert(name.clone(), FieldInfo { ty, length });
        self.fields.push(name);
    }

    pub fn add_int_field(&mut self, name: impl Into<String>) {
        self.add_field(name, FieldType::Int, 0);
    }

    pub fn add_string_field(&mut self, name: impl Into<String>, length: usize) {
        self.add_field(name, FieldType::Varchar, length);
    }

    /// Copies the definition of `name` from `other`.
    ///
    /// Returns `false` (and adds nothing) if `other` lacks the field.
    pub fn add(&mut self, name: &str, other: &Schema) -> bool {
        match other.info(name) {
            Some(info) => {
                self.add_field(name, info.ty, info.length);
                true
            }
            None => false,
        }
    }

    /// Adds every field of `other` that is not already present.
    pub fn add_all(&mut self, other: &Schema) {
        for name in &other.fields {
            self.add(name, other);
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.info.contains_key(name)
    }

    pub fn info(&self, name: &str) -> Option<FieldInfo> {
        self.info.get(name).copied()
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.info(name).map(|i| i.ty)
    }

    pub fn length(&self, name: &str) -> Option<usize> {
        self.info(name).map(|i| i.length)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Formats the schema as a column definition list, e.g. `(a int, b varchar(8))`.
impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, name) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let info = self.info[name];
            match info.ty {
                FieldType::Int => write!(f, "{name} int")?,
                FieldType::Varchar => write!(f, "{name} varchar({})", info.length)?,
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_fields_in_order() {
        let mut schema = Schema::new();
        schema.add_int_field("id");
        schema.add_string_field("name", 10);
        assert_eq!(schema.fields(), &["id".to_string(), "name".to_string()]);
        assert_eq!(schema.field_type("name"), Some(FieldType::Varchar));
        assert_eq!(schema.length("name"), Some(10));
        assert!(!schema.has_field("missing"));
    }

    #[test]
    fn test_duplicate_field_keeps_first_definition() {
        let mut schema = Schema::new();
        schema.add_int_field("x");
        schema.add_string_field("x", 5);
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.field_type("x"), Some(FieldType::Int));
    }

    #[test]
    fn test_add_all_merges_without_duplicates() {
        let mut a = Schema::new();
        a.add_int_field("x");
        a.add_int_field("y");
        let mut b = Schema::new();
        b.add_int_field("y");
        b.add_string_field("z", 3);

        a.add_all(&b);
        assert_eq!(
            a.fields(),
            &["x".to_string(), "y".to_string(), "z".to_string()]
        );
    }

    #[test]
    fn test_display() {
        let mut schema = Schema::new();
        schema.add_int_field("a");
        schema.add_string_field("b", 8);
        assert_eq!(schema.to_string(), "(a int, b varchar(8))");
    }
}
