//! Compiled expressions and their two evaluation paths.

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use corona_core::{Backend, ParseError, Real, Vec3};
use indexmap::IndexMap;
use rayon::prelude::*;

use crate::ast::Ast;
use crate::parse::parse;

/// Named constants substituted into an expression at compile time.
pub type Constants = IndexMap<String, Real>;

thread_local! {
    /// One coordinate binding per worker thread.
    static HOST_BINDING: Cell<[Real; 3]> = const { Cell::new([0.0; 3]) };
}

/// Lane-local coordinate binding for the data-parallel path.
///
/// Each execution lane owns one slot for as long as it evaluates; slots
/// are never shared between lanes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LaneSlot {
    binding: [Real; 3],
}

impl LaneSlot {
    /// An unbound slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current binding.
    pub fn binding(&self) -> [Real; 3] {
        self.binding
    }
}

/// An arithmetic expression over `x`, `y`, `z`, compiled once.
///
/// Holds two structurally identical trees built independently from the
/// same text: one read by host evaluation ([`Expression::evaluate`]) and
/// one read by lane evaluation ([`Expression::evaluate_in`] and the
/// parallel batch path). Neither tree is mutated after compilation, so a
/// single `Expression` may be shared across any number of threads.
///
/// # Examples
///
/// ```
/// use corona_parser::Expression;
///
/// let e = Expression::compile("x + y*z").unwrap();
/// assert_eq!(e.evaluate(1.0, 2.0, 3.0), 7.0);
/// ```
#[derive(Clone)]
pub struct Expression {
    text: Arc<str>,
    host: Arc<Ast>,
    device: Arc<Ast>,
}

impl Expression {
    /// Compile `text` with no user constants.
    pub fn compile(text: &str) -> Result<Self, ParseError> {
        Self::compile_with_constants(text, &Constants::new())
    }

    /// Compile `text`, substituting every identifier found in `constants`.
    ///
    /// `x`, `y` and `z` always denote the coordinates and cannot be
    /// overridden. `pi` is predefined unless `constants` supplies it.
    pub fn compile_with_constants(text: &str, constants: &Constants) -> Result<Self, ParseError> {
        let host = parse(text, constants)?.fold();
        let device = parse(text, constants)?.fold();
        Ok(Self {
            text: Arc::from(text),
            host: Arc::new(host),
            device: Arc::new(device),
        })
    }

    /// Source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The value of the expression if it does not read any coordinate.
    pub fn as_constant(&self) -> Option<Real> {
        self.host.as_constant()
    }

    /// Which of `x`, `y`, `z` the expression reads.
    pub fn uses(&self) -> [bool; 3] {
        self.host.uses()
    }

    /// Evaluate on the host path, binding the coordinates in this
    /// thread's slot.
    #[inline]
    pub fn evaluate(&self, x: Real, y: Real, z: Real) -> Real {
        HOST_BINDING.with(|slot| {
            slot.set([x, y, z]);
            self.host.eval(&slot.get())
        })
    }

    /// Evaluate on the lane path, binding the coordinates in `slot`.
    #[inline]
    pub fn evaluate_in(&self, slot: &mut LaneSlot, x: Real, y: Real, z: Real) -> Real {
        slot.binding = [x, y, z];
        self.device.eval(&slot.binding)
    }

    /// Evaluate at every position, writing into `out`.
    ///
    /// `Sequential` uses the host path on the calling thread; `Parallel`
    /// gives every rayon worker its own [`LaneSlot`] and uses the lane path.
    /// Results are identical under both.
    ///
    /// # Panics
    ///
    /// If `positions` and `out` differ in length.
    pub fn evaluate_batch(&self, backend: Backend, positions: &[Vec3], out: &mut [Real]) {
        assert_eq!(
            positions.len(),
            out.len(),
            "evaluate_batch: {} positions but {} outputs",
            positions.len(),
            out.len()
        );
        match backend {
            Backend::Sequential => {
                for (o, p) in out.iter_mut().zip(positions) {
                    *o = self.evaluate(p[0], p[1], p[2]);
                }
            }
            Backend::Parallel => {
                out.par_iter_mut().zip(positions.par_iter()).for_each_init(
                    LaneSlot::new,
                    |slot, (o, p)| *o = self.evaluate_in(slot, p[0], p[1], p[2]),
                );
            }
        }
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("text", &self.text)
            .field("nodes", &self.host.len())
            .finish()
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.host == other.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_values() {
        let e = Expression::compile("x+y*z").unwrap();
        assert_eq!(e.evaluate(1.0, 2.0, 3.0), 7.0);
        let e = Expression::compile("x*x").unwrap();
        assert_eq!(e.evaluate(-2.0, 0.0, 0.0), 4.0);
    }

    #[test]
    fn host_and_device_trees_are_independent_copies() {
        let e = Expression::compile("sin(x) * exp(-z^2)").unwrap();
        assert!(!Arc::ptr_eq(&e.host, &e.device));
        assert_eq!(*e.host, *e.device);
    }

    #[test]
    fn lane_path_matches_host_path() {
        let e = Expression::compile("sqrt(x*x + y*y) / (1 + z)").unwrap();
        let mut slot = LaneSlot::new();
        for p in [[1.0, 2.0, 3.0], [-0.3, 7.5, 0.25], [1e-12, 4e6, -0.5]] {
            let host = e.evaluate(p[0], p[1], p[2]);
            let lane = e.evaluate_in(&mut slot, p[0], p[1], p[2]);
            assert_eq!(host.to_bits(), lane.to_bits());
            assert_eq!(slot.binding(), p);
        }
    }

    #[test]
    fn constant_expressions_fold() {
        let mut c = Constants::new();
        c.insert("n0".into(), 1e24);
        let e = Expression::compile_with_constants("2 * n0 * (1 + 1)", &c).unwrap();
        assert_eq!(e.as_constant(), Some(4e24));
        assert_eq!(e.uses(), [false; 3]);
        assert_eq!(Expression::compile("z").unwrap().uses(), [false, false, true]);
    }

    #[test]
    fn batch_backends_agree() {
        let e = Expression::compile("x*y - z/3").unwrap();
        let pos: Vec<Vec3> = (0..257)
            .map(|i| {
                let t = i as Real * 0.1;
                [t, t.sin(), t.cos()]
            })
            .collect();
        let mut seq = vec![0.0; pos.len()];
        let mut par = vec![0.0; pos.len()];
        e.evaluate_batch(Backend::Sequential, &pos, &mut seq);
        e.evaluate_batch(Backend::Parallel, &pos, &mut par);
        assert_eq!(seq, par);
    }

    #[test]
    fn expression_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Expression>();
    }
}
