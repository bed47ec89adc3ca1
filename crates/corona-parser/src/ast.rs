//! Flat, immutable expression trees.
//!
//! Nodes live in a single arena and refer to their children by index, so
//! an [`Ast`] is one contiguous allocation with no interior pointers. An
//! `Ast` never holds the coordinate binding; evaluation borrows it from
//! caller-owned scratch.

use corona_core::Real;

/// Index of a node inside its [`Ast`] arena.
pub(crate) type NodeId = u32;

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl BinOp {
    #[inline]
    pub(crate) fn apply(self, a: Real, b: Real) -> Real {
        let truth = |c: bool| if c { 1.0 } else { 0.0 };
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
            Self::Pow => a.powf(b),
            Self::Lt => truth(a < b),
            Self::Gt => truth(a > b),
            Self::Le => truth(a <= b),
            Self::Ge => truth(a >= b),
            Self::Eq => truth(a == b),
            Self::Ne => truth(a != b),
        }
    }
}

/// One-argument functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Func1 {
    Sqrt,
    Exp,
    Log,
    Log10,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Abs,
    Heaviside,
}

impl Func1 {
    pub(crate) fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "sqrt" => Self::Sqrt,
            "exp" => Self::Exp,
            "log" => Self::Log,
            "log10" => Self::Log10,
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "abs" | "fabs" => Self::Abs,
            "heaviside" => Self::Heaviside,
            _ => return None,
        })
    }

    #[inline]
    pub(crate) fn apply(self, a: Real) -> Real {
        match self {
            Self::Sqrt => a.sqrt(),
            Self::Exp => a.exp(),
            Self::Log => a.ln(),
            Self::Log10 => a.log10(),
            Self::Sin => a.sin(),
            Self::Cos => a.cos(),
            Self::Tan => a.tan(),
            Self::Asin => a.asin(),
            Self::Acos => a.acos(),
            Self::Atan => a.atan(),
            Self::Sinh => a.sinh(),
            Self::Cosh => a.cosh(),
            Self::Tanh => a.tanh(),
            Self::Abs => a.abs(),
            Self::Heaviside => {
                if a < 0.0 {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }
}

/// Two-argument functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Func2 {
    Pow,
    Min,
    Max,
    Atan2,
}

impl Func2 {
    pub(crate) fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "pow" => Self::Pow,
            "min" => Self::Min,
            "max" => Self::Max,
            "atan2" => Self::Atan2,
            _ => return None,
        })
    }

    #[inline]
    pub(crate) fn apply(self, a: Real, b: Real) -> Real {
        match self {
            Self::Pow => a.powf(b),
            Self::Min => a.min(b),
            Self::Max => a.max(b),
            Self::Atan2 => a.atan2(b),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Node {
    Const(Real),
    /// Coordinate 0 = x, 1 = y, 2 = z.
    Var(u8),
    Neg(NodeId),
    Binary(BinOp, NodeId, NodeId),
    Call1(Func1, NodeId),
    Call2(Func2, NodeId, NodeId),
}

impl Node {
    /// Child node ids, left to right.
    pub(crate) fn children(&self) -> [Option<NodeId>; 2] {
        match *self {
            Self::Const(_) | Self::Var(_) => [None, None],
            Self::Neg(a) | Self::Call1(_, a) => [Some(a), None],
            Self::Binary(_, a, b) | Self::Call2(_, a, b) => [Some(a), Some(b)],
        }
    }
}

/// A compiled expression tree. Read-only after construction.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Ast {
    nodes: Box<[Node]>,
    root: NodeId,
}

/// Append-only arena used while parsing and folding.
#[derive(Default)]
pub(crate) struct AstBuilder {
    nodes: Vec<Node>,
}

impl AstBuilder {
    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        (self.nodes.len() - 1) as NodeId
    }

    pub(crate) fn finish(self, root: NodeId) -> Ast {
        Ast {
            nodes: self.nodes.into_boxed_slice(),
            root,
        }
    }
}

impl Ast {
    /// Evaluate with the coordinate binding `xyz`.
    #[inline]
    pub(crate) fn eval(&self, xyz: &[Real; 3]) -> Real {
        self.eval_node(self.root, xyz)
    }

    fn eval_node(&self, id: NodeId, xyz: &[Real; 3]) -> Real {
        match self.nodes[id as usize] {
            Node::Const(c) => c,
            Node::Var(a) => xyz[a as usize],
            Node::Neg(a) => -self.eval_node(a, xyz),
            Node::Binary(op, a, b) => op.apply(self.eval_node(a, xyz), self.eval_node(b, xyz)),
            Node::Call1(f, a) => f.apply(self.eval_node(a, xyz)),
            Node::Call2(f, a, b) => f.apply(self.eval_node(a, xyz), self.eval_node(b, xyz)),
        }
    }

    /// Rebuild the tree with every variable-free sub-tree collapsed into a
    /// constant. Folding uses the same `apply` functions as evaluation, so
    /// a folded tree evaluates bit-identically to the unfolded one.
    pub(crate) fn fold(&self) -> Ast {
        let mut out = AstBuilder::default();
        let root = self.fold_node(self.root, &mut out);
        out.finish(root)
    }

    fn fold_node(&self, id: NodeId, out: &mut AstBuilder) -> NodeId {
        let node = match self.nodes[id as usize] {
            n @ (Node::Const(_) | Node::Var(_)) => n,
            Node::Neg(a) => {
                let a = self.fold_node(a, out);
                match out.constant(a) {
                    Some(c) => out.replace_const(a, -c),
                    None => Node::Neg(a),
                }
            }
            Node::Binary(op, a, b) => {
                let (a, b) = (self.fold_node(a, out), self.fold_node(b, out));
                match (out.constant(a), out.constant(b)) {
                    (Some(ca), Some(cb)) => out.replace_const2(a, b, op.apply(ca, cb)),
                    _ => Node::Binary(op, a, b),
                }
            }
            Node::Call1(f, a) => {
                let a = self.fold_node(a, out);
                match out.constant(a) {
                    Some(c) => out.replace_const(a, f.apply(c)),
                    None => Node::Call1(f, a),
                }
            }
            Node::Call2(f, a, b) => {
                let (a, b) = (self.fold_node(a, out), self.fold_node(b, out));
                match (out.constant(a), out.constant(b)) {
                    (Some(ca), Some(cb)) => out.replace_const2(a, b, f.apply(ca, cb)),
                    _ => Node::Call2(f, a, b),
                }
            }
        };
        out.push(node)
    }

    /// Value of the tree if it does not depend on any coordinate.
    pub(crate) fn as_constant(&self) -> Option<Real> {
        match self.nodes[self.root as usize] {
            Node::Const(c) => Some(c),
            _ => None,
        }
    }

    /// Which of x, y, z the tree reads.
    pub(crate) fn uses(&self) -> [bool; 3] {
        let mut used = [false; 3];
        for n in self.nodes.iter() {
            if let Node::Var(a) = n {
                used[*a as usize] = true;
            }
        }
        used
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}

impl AstBuilder {
    fn constant(&self, id: NodeId) -> Option<Real> {
        match self.nodes.get(id as usize) {
            Some(Node::Const(c)) => Some(*c),
            _ => None,
        }
    }

    /// Drop the just-pushed constant child `a` (always the arena tail)
    /// and return the folded node.
    fn replace_const(&mut self, a: NodeId, value: Real) -> Node {
        debug_assert_eq!(a as usize + 1, self.nodes.len());
        self.nodes.truncate(a as usize);
        Node::Const(value)
    }

    /// Drop constant children `a` and `b` (the two arena tail slots).
    fn replace_const2(&mut self, a: NodeId, b: NodeId, value: Real) -> Node {
        debug_assert_eq!(b as usize + 1, self.nodes.len());
        debug_assert_eq!(a + 1, b);
        self.nodes.truncate(a as usize);
        Node::Const(value)
    }
}
