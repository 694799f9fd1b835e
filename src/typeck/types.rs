use crate::ast::TypeExpr;
use crate::interning::StringId;

/// The checker's own type representation — a plain sum type matched
/// with `match` everywhere, never dispatched through a trait object.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
    Char,
    Void,
    Optional(Box<Type>),
    Array(Box<Type>),
    Function {
        params: Vec<Type>,
        returns: Box<Type>,
    },
    Named(StringId, Vec<Type>),
    /// The checker could not determine a type (e.g. an unresolved
    /// reference); propagating this instead of aborting lets checking
    /// continue and avoids a cascade of spurious follow-on errors.
    Unknown,
}

impl Type {
    pub fn from_ast(ty: &TypeExpr) -> Type {
        match ty {
            TypeExpr::Int => Type::Int,
            TypeExpr::Float => Type::Float,
            TypeExpr::Bool => Type::Bool,
            TypeExpr::String => Type::String,
            TypeExpr::Void => Type::Void,
            TypeExpr::Optional(inner) => Type::Optional(Box::new(Type::from_ast(inner))),
            TypeExpr::Array(inner) => Type::Array(Box::new(Type::from_ast(inner))),
            TypeExpr::Function { params, returns } => Type::Function {
                params: params.iter().map(Type::from_ast).collect(),
                returns: Box::new(Type::from_ast(returns)),
            },
            TypeExpr::Named(id, args) => {
                Type::Named(*id, args.iter().map(Type::from_ast).collect())
            }
        }
    }

    pub fn display(&self, table: &crate::interning::StringTable) -> String {
        match self {
            Type::Int => "Int".into(),
            Type::Float => "Float".into(),
            Type::Bool => "Bool".into(),
            Type::String => "String".into(),
            Type::Char => "Char".into(),
            Type::Void => "Void".into(),
            Type::Optional(inner) => format!("{}?", inner.display(table)),
            Type::Array(inner) => format!("[{}]", inner.display(table)),
            Type::Function { params, returns } => format!(
                "({}) -> {}",
                params.iter().map(|p| p.display(table)).collect::<Vec<_>>().join(", "),
                returns.display(table)
            ),
            Type::Named(id, args) => {
                if args.is_empty() {
                    id.resolve(table).to_string()
                } else {
                    format!(
                        "{}<{}>",
                        id.resolve(table),
                        args.iter().map(|a| a.display(table)).collect::<Vec<_>>().join(", ")
                    )
                }
            }
            Type::Unknown => "?".into(),
        }
    }
}

/// Structural type equality.
pub fn types_equal(a: &Type, b: &Type) -> bool {
    a == b
}

/// A deliberately relaxed assignability relation: `Unknown` is
/// assignable to/from anything, at any nesting depth (so a bare `none`
/// literal — typed `Optional(Unknown)` until matched against a concrete
/// binding — doesn't cascade into unrelated errors), and `T` is
/// assignable to `T?`.
pub fn is_assignable(from: &Type, to: &Type) -> bool {
    match (from, to) {
        (Type::Unknown, _) | (_, Type::Unknown) => true,
        (Type::Optional(from_inner), Type::Optional(to_inner)) => is_assignable(from_inner, to_inner),
        (from, Type::Optional(to_inner)) => is_assignable(from, to_inner),
        _ => types_equal(from, to),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_none_is_assignable_to_any_optional() {
        let none_ty = Type::Optional(Box::new(Type::Unknown));
        assert!(is_assignable(&none_ty, &Type::Optional(Box::new(Type::Int))));
        assert!(is_assignable(&none_ty, &Type::Optional(Box::new(Type::String))));
    }

    #[test]
    fn bare_value_is_assignable_to_its_optional() {
        assert!(is_assignable(&Type::Int, &Type::Optional(Box::new(Type::Int))));
        assert!(!is_assignable(&Type::Int, &Type::Optional(Box::new(Type::String))));
    }

    #[test]
    fn optional_is_not_assignable_to_its_bare_inner_type() {
        assert!(!is_assignable(&Type::Optional(Box::new(Type::Int)), &Type::Int));
    }
}
