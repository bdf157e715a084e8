//! Type/representation mapper
//!
//! Maps each static type to its runtime representation: the signature string
//! used in field/parameter/return declarations, and the instruction sequence
//! pushing the type's canonical default value. Pure functions of the type
//! plus the name of the class currently being emitted (the one piece of
//! emission state the mapper needs, because class-reference signatures name
//! the enclosing class to support self-referential fields).
//!
//! Dispatch is an exhaustive match over the closed `Type` set, so a type the
//! generator cannot represent fails at this boundary instead of slipping
//! through silently.

use crate::ast::Type;
use crate::error::CodegenError;

/// Signature class name (no `L...;` wrapping) for declarations and casts
pub fn signature_class(ty: &Type, current_class: &str) -> Result<String, CodegenError> {
    match ty {
        Type::Int => Ok("java/lang/Integer".to_string()),
        Type::Bool => Ok("java/lang/Boolean".to_string()),
        Type::Str => Ok("java/lang/String".to_string()),
        Type::List(_) => Ok("List".to_string()),
        Type::Fptr => Ok("Fptr".to_string()),
        Type::Class(_) => Ok(current_class.to_string()),
        Type::Null => Err(CodegenError::UnrepresentableType(ty.clone())),
    }
}

/// Fully-qualified type signature for field/parameter/return declarations
pub fn signature(ty: &Type, current_class: &str) -> Result<String, CodegenError> {
    Ok(format!("L{};", signature_class(ty, current_class)?))
}

/// Instruction sequence pushing the canonical default value of `ty`.
///
/// Defaults: `0` for Int and Bool, the empty string for Str, a null
/// reference for Class and Fptr, and for List a freshly constructed list
/// object pre-populated with one boxed default per declared element slot,
/// in declared order.
pub fn default_value(ty: &Type, current_class: &str) -> Result<String, CodegenError> {
    match ty {
        Type::Int | Type::Bool => Ok("ldc 0".to_string()),
        Type::Str => Ok("ldc \"\"".to_string()),
        Type::Class(_) | Type::Fptr => Ok("aconst_null".to_string()),
        Type::List(elements) => {
            let mut commands = String::new();
            commands += "new List\n";
            commands += "dup\n";
            commands += "new java/util/ArrayList\n";
            commands += "dup\n";
            commands += "invokespecial java/util/ArrayList/<init>()V\n";
            for element in elements {
                commands += "dup\n";
                commands += &default_value(&element.ty, current_class)?;
                commands += "\n";
                match element.ty {
                    Type::Int => {
                        commands +=
                            "invokestatic java/lang/Integer/valueOf(I)Ljava/lang/Integer;\n";
                    }
                    Type::Bool => {
                        commands +=
                            "invokestatic java/lang/Boolean/valueOf(Z)Ljava/lang/Boolean;\n";
                    }
                    _ => {}
                }
                commands += "checkcast java/lang/Object\n";
                commands += "invokevirtual java/util/ArrayList/add(Ljava/lang/Object;)Z\n";
                commands += "pop\n";
            }
            commands += "invokespecial List/<init>(Ljava/util/ArrayList;)V";
            Ok(commands)
        }
        Type::Null => Err(CodegenError::UnrepresentableType(ty.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ListElement;

    #[test]
    fn signatures_are_boxed_reference_types() {
        assert_eq!(signature(&Type::Int, "A").unwrap(), "Ljava/lang/Integer;");
        assert_eq!(signature(&Type::Bool, "A").unwrap(), "Ljava/lang/Boolean;");
        assert_eq!(signature(&Type::Str, "A").unwrap(), "Ljava/lang/String;");
        assert_eq!(signature(&Type::List(vec![]), "A").unwrap(), "LList;");
        assert_eq!(signature(&Type::Fptr, "A").unwrap(), "LFptr;");
    }

    #[test]
    fn class_signature_names_the_emitting_class() {
        let ty = Type::Class("Other".to_string());
        assert_eq!(signature(&ty, "Current").unwrap(), "LCurrent;");
    }

    #[test]
    fn null_has_no_representation() {
        assert!(matches!(
            signature(&Type::Null, "A"),
            Err(CodegenError::UnrepresentableType(_))
        ));
        assert!(matches!(
            default_value(&Type::Null, "A"),
            Err(CodegenError::UnrepresentableType(_))
        ));
    }

    #[test]
    fn scalar_defaults() {
        assert_eq!(default_value(&Type::Int, "A").unwrap(), "ldc 0");
        assert_eq!(default_value(&Type::Bool, "A").unwrap(), "ldc 0");
        assert_eq!(default_value(&Type::Str, "A").unwrap(), "ldc \"\"");
        assert_eq!(default_value(&Type::Fptr, "A").unwrap(), "aconst_null");
        assert_eq!(
            default_value(&Type::Class("B".to_string()), "A").unwrap(),
            "aconst_null"
        );
    }

    #[test]
    fn list_default_populates_one_boxed_entry_per_slot() {
        let ty = Type::List(vec![
            ListElement {
                name: None,
                ty: Type::Int,
            },
            ListElement {
                name: None,
                ty: Type::Str,
            },
        ]);
        let commands = default_value(&ty, "A").unwrap();
        // Two adds, one per declared element slot
        assert_eq!(
            commands
                .matches("invokevirtual java/util/ArrayList/add")
                .count(),
            2
        );
        // The integer entry is boxed, the string entry is not
        assert_eq!(
            commands.matches("java/lang/Integer/valueOf").count(),
            1
        );
        assert!(commands.starts_with("new List"));
        assert!(commands.ends_with("invokespecial List/<init>(Ljava/util/ArrayList;)V"));
    }
}
