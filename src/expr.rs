/*!
expr - The aggregate expression tree consumed by the eligibility analyzer
and cost model (§3, §4.B, §4.C).

A tree is rooted at one or more `Expr::Aggregate` nodes (one per aggregate
the surrounding grouping policy needs to compute for a batch). Internal
nodes are function applications or aggregate applications; leaves are
constants or column references. `FunctionId` is an opaque identity handed
to us by the host query engine — we never interpret it ourselves, only
forward it to the opcode registry (`registry::OpcodeRegistry`).
*/

/// Opaque function/operator identity, stable for the lifetime of a query
/// plan. Meaningless outside a registry lookup.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub i64);

/// Opaque aggregate identity. Never checked by the bridge (§4.B) — carried
/// only so callers can correlate `Expr::Aggregate` nodes with the
/// aggregation engine's own per-aggregate state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregateId(pub i64);

/// Source attribute index of a column reference, into the batch's column
/// descriptor array (`arrow::ColumnDescriptor`).
pub type ColumnIndex = u32;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A literal value. Always eligible.
    Constant,
    /// A reference to a batch column. Always eligible.
    Column(ColumnIndex),
    /// A scalar function or operator application.
    Function { id: FunctionId, args: Vec<Expr> },
    /// An aggregate application. `id` is never consulted for eligibility;
    /// only `args` and `filter` are descended into.
    Aggregate {
        id: AggregateId,
        args: Vec<Expr>,
        filter: Option<Box<Expr>>,
    },
}

impl Expr {
    pub fn function(id: i64, args: Vec<Expr>) -> Self {
        Expr::Function {
            id: FunctionId(id),
            args,
        }
    }

    pub fn aggregate(id: i64, args: Vec<Expr>, filter: Option<Expr>) -> Self {
        Expr::Aggregate {
            id: AggregateId(id),
            args,
            filter: filter.map(Box::new),
        }
    }
}
