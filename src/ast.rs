//! The parsed command tree.

/// One redirection target. `None` means the slot was never set; repeated
/// redirections of the same kind collapse to the last one seen.
pub type RedirectionSlot = Option<String>;

/// The three redirection slots a command or group may carry.
///
/// `out` and `append` may both be set (`cmd > a >> b`): both files are
/// opened, but only `append`'s descriptor ends up installed as the final
/// stdout, since it is applied after `out` at execution time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectionSet {
    pub out: RedirectionSlot,
    pub append: RedirectionSlot,
    pub input: RedirectionSlot,
}

impl RedirectionSet {
    pub fn is_empty(&self) -> bool {
        self.out.is_none() && self.append.is_none() && self.input.is_none()
    }
}

/// Binary operators that connect two sub-expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `&&`
    Conjunction,
    /// `||`
    Disjunction,
    /// `;` or a newline - indistinguishable once parsed.
    Sequence,
    /// `|`
    Pipe,
    /// `&`
    Parallel,
}

impl BinaryOp {
    fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Conjunction => "&&",
            BinaryOp::Disjunction => "||",
            BinaryOp::Sequence => ";",
            BinaryOp::Pipe => "|",
            BinaryOp::Parallel => "&",
        }
    }
}

/// A node in the parsed command tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A single program invocation: `argv[0]` plus its arguments.
    Command {
        argv: Vec<String>,
        redirections: RedirectionSet,
    },
    /// A parenthesized sub-expression with its own redirections, which
    /// apply to the sub-expression as a whole rather than to any one
    /// command inside it.
    Group {
        inner: Box<Node>,
        redirections: RedirectionSet,
    },
    /// Two sub-expressions joined by a binary operator.
    ///
    /// `right` is `None` only for a trailing [`BinaryOp::Sequence`] - a
    /// dangling `;` or newline at the end of input - meaning "run left,
    /// there is nothing after it".
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Option<Box<Node>>,
    },
}

impl Node {
    /// Render the tree back to source text.
    ///
    /// Used by property tests to check that parsing is faithful: re-parsing
    /// `node.to_source()` should produce a tree equal to `node`. A `Binary`
    /// node is printed *without* its own enclosing parens - wrapping it
    /// would make every reparse produce a [`Node::Group`] around it, which
    /// is a different variant than the bare `Binary` this crate is trying
    /// to reproduce. This is safe because the parser only ever nests a
    /// lower-precedence operator inside a higher-precedence one via an
    /// explicit `Group` (which prints its own literal parens below) -
    /// every other nesting already matches the grammar's precedence
    /// climbing, so no disambiguating parens are needed on the way back in.
    pub fn to_source(&self) -> String {
        match self {
            Node::Command { argv, redirections } => {
                let mut s = argv.join(" ");
                push_redirections(&mut s, redirections);
                s
            }
            Node::Group { inner, redirections } => {
                let mut s = format!("({})", inner.to_source());
                push_redirections(&mut s, redirections);
                s
            }
            Node::Binary { op, left, right } => match right {
                Some(right) => format!("{} {} {}", left.to_source(), op.as_str(), right.to_source()),
                None => format!("{} {}", left.to_source(), op.as_str()),
            },
        }
    }
}

fn push_redirections(s: &mut String, r: &RedirectionSet) {
    if let Some(f) = &r.out {
        s.push_str(" > ");
        s.push_str(f);
    }
    if let Some(f) = &r.append {
        s.push_str(" >> ");
        s.push_str(f);
    }
    if let Some(f) = &r.input {
        s.push_str(" < ");
        s.push_str(f);
    }
}
