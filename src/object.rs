//! Typed PDF objects.
//!
//! These are the operand values that appear in content streams: numbers,
//! strings, names, arrays, dictionaries, references. Two details matter for
//! round-trip fidelity and are encoded in the types:
//!
//! - Literal and hexadecimal strings are distinct variants. Both hold decoded
//!   bytes, but the writer keeps hex strings hex, so the source form must
//!   survive parsing.
//! - Dictionaries preserve insertion order ([`IndexMap`]), so serializing a
//!   parsed dictionary reproduces the source key order.

use indexmap::IndexMap;

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value. Always finite; the lexer cannot produce
    /// NaN or infinity from digit runs.
    Real(f64),
    /// Literal string, decoded bytes (source form `(...)`)
    LiteralString(Vec<u8>),
    /// Hexadecimal string, decoded bytes (source form `<...>`)
    HexString(Vec<u8>),
    /// Name without the leading slash, `#xx` escapes decoded. Never empty.
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary; insertion order preserved for reproducible output
    Dictionary(IndexMap<String, Object>),
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

impl Object {
    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::LiteralString(_) => "LiteralString",
            Object::HexString(_) => "HexString",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Reference(_) => "Reference",
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to cast to real number.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Numeric value of an integer or real operand.
    ///
    /// Content-stream generators are sloppy about integer vs real — `Td`
    /// operands may be either. Every handler that expects a number goes
    /// through this single accessor.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// String payload bytes, for either string form.
    pub fn as_string_bytes(&self) -> Option<&[u8]> {
        match self {
            Object::LiteralString(s) | Object::HexString(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to dictionary.
    pub fn as_dict(&self) -> Option<&IndexMap<String, Object>> {
        match self {
            Object::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Check if object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Whether this is a string of either form.
    pub fn is_string(&self) -> bool {
        matches!(self, Object::LiteralString(_) | Object::HexString(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_integer() {
        let obj = Object::Integer(42);
        assert_eq!(obj.as_integer(), Some(42));
        assert_eq!(obj.as_number(), Some(42.0));
        assert!(obj.as_name().is_none());
        assert!(!obj.is_null());
    }

    #[test]
    fn test_object_real() {
        let obj = Object::Real(2.5);
        assert_eq!(obj.as_real(), Some(2.5));
        assert_eq!(obj.as_number(), Some(2.5));
        assert!(obj.as_integer().is_none());
    }

    #[test]
    fn test_as_number_rejects_non_numeric() {
        assert!(Object::Name("Td".to_string()).as_number().is_none());
        assert!(Object::LiteralString(b"12".to_vec()).as_number().is_none());
        assert!(Object::Null.as_number().is_none());
    }

    #[test]
    fn test_object_name() {
        let obj = Object::Name("F1".to_string());
        assert_eq!(obj.as_name(), Some("F1"));
        assert_eq!(obj.type_name(), "Name");
    }

    #[test]
    fn test_string_forms_share_bytes_accessor() {
        let lit = Object::LiteralString(b"Hello".to_vec());
        let hex = Object::HexString(b"Hello".to_vec());
        assert_eq!(lit.as_string_bytes(), Some(&b"Hello"[..]));
        assert_eq!(hex.as_string_bytes(), Some(&b"Hello"[..]));
        assert!(lit.is_string());
        assert!(hex.is_string());
        // But they are distinct values: the writer must not conflate them.
        assert_ne!(lit, hex);
    }

    #[test]
    fn test_object_array() {
        let obj = Object::Array(vec![Object::Integer(1), Object::Real(0.5)]);
        let arr = obj.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[1].as_number(), Some(0.5));
    }

    #[test]
    fn test_dictionary_preserves_insertion_order() {
        let mut dict = IndexMap::new();
        dict.insert("Zeta".to_string(), Object::Integer(1));
        dict.insert("Alpha".to_string(), Object::Integer(2));
        let obj = Object::Dictionary(dict);

        let keys: Vec<_> = obj.as_dict().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_object_reference_display() {
        let obj_ref = ObjectRef::new(10, 0);
        assert_eq!(format!("{}", obj_ref), "10 0 R");
        let obj = Object::Reference(obj_ref);
        assert_eq!(obj.as_reference(), Some(obj_ref));
    }

    #[test]
    fn test_object_clone_eq() {
        let obj = Object::Array(vec![Object::LiteralString(b"AB".to_vec())]);
        assert_eq!(obj, obj.clone());
    }
}
