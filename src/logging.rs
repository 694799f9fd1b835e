//! Feature-gated tracing macros for each pipeline phase.
//!
//! Each macro compiles to a `saying::say!` call when its feature is
//! enabled and to nothing otherwise, so a normal build pays no runtime
//! cost for this instrumentation.

#[macro_export]
macro_rules! token_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "show_tokens")]
        saying::say!(Cyan "[lexer] " $($arg)*);
    };
}

#[macro_export]
macro_rules! ast_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "show_ast")]
        saying::say!(Magenta "[parser] " $($arg)*);
    };
}

#[macro_export]
macro_rules! module_graph_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "show_module_graph")]
        saying::say!(Blue "[module-graph] " $($arg)*);
    };
}

#[macro_export]
macro_rules! resolve_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "show_resolve")]
        saying::say!(Yellow "[resolve] " $($arg)*);
    };
}

#[macro_export]
macro_rules! type_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "show_types")]
        saying::say!(Green "[typeck] " $($arg)*);
    };
}

#[macro_export]
macro_rules! codegen_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "show_codegen")]
        saying::say!(Red "[codegen] " $($arg)*);
    };
}

#[macro_export]
macro_rules! timer_log {
    ($label:expr, $elapsed:expr) => {
        #[cfg(feature = "detailed_timers")]
        saying::say!(Grey "[timer] {} took {:?}", $label, $elapsed);
    };
}
