//! Arithmetic expressions over the coordinates `x`, `y`, `z`.
//!
//! An [`Expression`] is compiled once at species initialization and then
//! evaluated per particle. Compilation reports malformed text as a
//! [`ParseError`](corona_core::ParseError) carrying the byte offset of the
//! offending token, so the timestep loop never sees a parse failure.
//!
//! # Language
//!
//! - numbers: `3`, `0.5`, `.5`, `1e-3`, `2.5E+8`
//! - variables: `x`, `y`, `z`; user constants; `pi`
//! - operators: `+ - * /`, `^` or `**` (right-associative, binds tighter
//!   than unary minus), comparisons `< > <= >= == !=` yielding `1` or `0`
//! - functions: `sqrt exp log log10 sin cos tan asin acos atan sinh cosh
//!   tanh abs heaviside` and `pow min max atan2`
//!
//! Sub-expressions that do not read a coordinate are folded to constants
//! at compile time.
//!
//! # Evaluation paths
//!
//! The compiled tree is immutable. The coordinate binding lives outside
//! it: in a thread-local slot for [`Expression::evaluate`], or in a
//! caller-owned [`LaneSlot`] for [`Expression::evaluate_in`]. Both paths
//! give bit-identical results.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod ast;
mod expr;
mod lexer;
mod parse;

pub use expr::{Constants, Expression, LaneSlot};
