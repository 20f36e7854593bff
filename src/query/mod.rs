//! Query pipeline: expression compilation and evaluation over a candidate set

mod compiler;
mod engine;
mod expr;
mod lexer;
mod path;
mod value;

pub use compiler::{compile_filter, compile_order};
pub use engine::{execute, CompiledQuery, ExpressionCache};
pub use expr::{CompareOp, FilterExpr, OrderExpr, OrderTerm};
pub use path::AttributePath;
pub use value::{compare_values, like_to_regex, Literal};
