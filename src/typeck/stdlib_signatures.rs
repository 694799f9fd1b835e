//! Fixed table of built-in stdlib call signatures, consulted by the
//! module-qualified call escape hatch in `typeck::Checker::check_call`.
//!
//! Built once behind a `OnceLock` since it never changes across a build
//! and every module consults it read-only.

use super::Type;
use std::sync::OnceLock;

pub struct Signature {
    pub params: Vec<Type>,
    pub returns: Type,
}

fn sig(params: Vec<Type>, returns: Type) -> Signature {
    Signature { params, returns }
}

fn table() -> &'static rustc_hash::FxHashMap<&'static str, Signature> {
    static TABLE: OnceLock<rustc_hash::FxHashMap<&'static str, Signature>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut map = rustc_hash::FxHashMap::default();
        map.insert("Std.IO.print", sig(vec![Type::String], Type::Void));
        map.insert("Std.IO.readLine", sig(vec![], Type::String));
        map.insert("Std.Math.sqrt", sig(vec![Type::Float], Type::Float));
        map.insert("Std.Math.abs", sig(vec![Type::Float], Type::Float));
        map.insert(
            "Std.Math.pow",
            sig(vec![Type::Float, Type::Float], Type::Float),
        );
        map.insert("Std.Parse.int", sig(vec![Type::String], Type::Optional(Box::new(Type::Int))));
        map.insert(
            "Std.Parse.float",
            sig(vec![Type::String], Type::Optional(Box::new(Type::Float))),
        );
        map.insert("Std.String.length", sig(vec![Type::String], Type::Int));
        map.insert(
            "Std.Array.length",
            sig(vec![Type::Array(Box::new(Type::Unknown))], Type::Int),
        );
        map
    })
}

pub fn lookup(name: &str) -> Option<&'static Signature> {
    table().get(name)
}
