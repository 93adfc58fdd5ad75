// Per-type default and identity tables, as total functions over the closed
// `Type` enum. Types without an entry are excluded by the predicates that
// feed the catalog, so a `None` reaching an edit step signals a defect
// there, not here.

use crate::tree::{LiteralValue, Type};

/// Value types the dead-variable inserter may draw from
pub const SUPPORTED_DECL_TYPES: &[Type] = &[
    Type::Int,
    Type::Long,
    Type::Float,
    Type::Double,
    Type::Bool,
    Type::Char,
    Type::Str,
];

/// The type's default value: what a synthesized `return` or initializer
/// produces. `void` has none.
pub fn default_value(ty: &Type) -> Option<LiteralValue> {
    match ty {
        Type::Int => Some(LiteralValue::Int(0)),
        Type::Long => Some(LiteralValue::Long(0)),
        Type::Float => Some(LiteralValue::Float(0.0)),
        Type::Double => Some(LiteralValue::Double(0.0)),
        Type::Bool => Some(LiteralValue::Bool(false)),
        Type::Char => Some(LiteralValue::Char(' ')),
        Type::Str => Some(LiteralValue::Str(String::new())),
        Type::Ref(_) => Some(LiteralValue::Null),
        Type::Void => None,
    }
}

/// The identity element of `+` for the type: `x + identity == x`. Only
/// numeric and string types have one.
pub fn identity_element(ty: &Type) -> Option<LiteralValue> {
    match ty {
        Type::Int => Some(LiteralValue::Int(0)),
        Type::Long => Some(LiteralValue::Long(0)),
        Type::Float => Some(LiteralValue::Float(0.0)),
        Type::Double => Some(LiteralValue::Double(0.0)),
        Type::Str => Some(LiteralValue::Str(String::new())),
        Type::Bool | Type::Char | Type::Void | Type::Ref(_) => None,
    }
}

/// Predicate-level check for neutral-element eligibility
pub fn has_identity_element(ty: &Type) -> bool {
    identity_element(ty).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_default_is_typed_zero_not_null() {
        assert_eq!(default_value(&Type::Float), Some(LiteralValue::Float(0.0)));
        assert_eq!(
            default_value(&Type::Double),
            Some(LiteralValue::Double(0.0))
        );
    }

    #[test]
    fn void_has_no_default() {
        assert_eq!(default_value(&Type::Void), None);
    }

    #[test]
    fn identity_covers_exactly_numeric_and_string() {
        for ty in SUPPORTED_DECL_TYPES {
            assert_eq!(
                has_identity_element(ty),
                ty.is_numeric() || ty.is_string(),
                "{ty}"
            );
        }
        assert!(!has_identity_element(&Type::Ref("Widget".into())));
    }
}
