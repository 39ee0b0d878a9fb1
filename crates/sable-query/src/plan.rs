//! The logical/physical plan tree.
//!
//! Nodes are immutable and shared via `Arc`; optimizer rules build new nodes
//! rather than mutating in place.

use std::fmt;
use std::sync::Arc;

use crate::expression::Expression;
use crate::value::Schema;

pub type PlanRef = Arc<PlanNode>;

/// Sort direction of one `ORDER BY` entry. `Default` is the planner's
/// spelling of an unspecified direction and means ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderByDirection {
    Default,
    Asc,
    Desc,
}

/// A plan node.
///
/// Only the shapes this subsystem plans or rewrites are represented; the
/// rest of the executor zoo lives outside.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanNode {
    /// Full scan of a table's heap.
    SeqScan {
        table_oid: u32,
        table_name: String,
        schema: Schema,
    },
    /// Compute `exprs` over the child's output.
    Projection {
        exprs: Vec<Expression>,
        schema: Schema,
        child: PlanRef,
    },
    /// Total sort of the child's output.
    Sort {
        order_by: Vec<(OrderByDirection, Expression)>,
        schema: Schema,
        child: PlanRef,
    },
    /// First `limit` rows of the child's output.
    Limit {
        limit: usize,
        schema: Schema,
        child: PlanRef,
    },
    /// First `n` rows of the child's output under `order_by`.
    TopN {
        n: usize,
        order_by: Vec<(OrderByDirection, Expression)>,
        schema: Schema,
        child: PlanRef,
    },
    /// Ordered scan of a vector index with a constant query vector.
    VectorIndexScan {
        table_oid: u32,
        table_name: String,
        index_oid: u32,
        index_name: String,
        base_vector: Vec<Expression>,
        limit: usize,
        schema: Schema,
    },
}

impl PlanNode {
    pub fn schema(&self) -> &Schema {
        match self {
            PlanNode::SeqScan { schema, .. }
            | PlanNode::Projection { schema, .. }
            | PlanNode::Sort { schema, .. }
            | PlanNode::Limit { schema, .. }
            | PlanNode::TopN { schema, .. }
            | PlanNode::VectorIndexScan { schema, .. } => schema,
        }
    }

    pub fn child(&self) -> Option<&PlanRef> {
        match self {
            PlanNode::Projection { child, .. }
            | PlanNode::Sort { child, .. }
            | PlanNode::Limit { child, .. }
            | PlanNode::TopN { child, .. } => Some(child),
            PlanNode::SeqScan { .. } | PlanNode::VectorIndexScan { .. } => None,
        }
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        for _ in 0..indent {
            write!(f, "  ")?;
        }
        match self {
            PlanNode::SeqScan { table_name, .. } => writeln!(f, "SeqScan {{ table={table_name} }}"),
            PlanNode::Projection { exprs, .. } => {
                let list: Vec<String> = exprs.iter().map(ToString::to_string).collect();
                writeln!(f, "Projection {{ exprs=[{}] }}", list.join(", "))
            }
            PlanNode::Sort { order_by, .. } => {
                writeln!(f, "Sort {{ order_by={} }}", format_order_by(order_by))
            }
            PlanNode::Limit { limit, .. } => writeln!(f, "Limit {{ limit={limit} }}"),
            PlanNode::TopN { n, order_by, .. } => {
                writeln!(f, "TopN {{ n={n}, order_by={} }}", format_order_by(order_by))
            }
            PlanNode::VectorIndexScan { table_name, index_name, base_vector, limit, .. } => {
                let components: Vec<String> =
                    base_vector.iter().map(ToString::to_string).collect();
                writeln!(
                    f,
                    "VectorIndexScan {{ table={table_name}, index={index_name}, base=[{}], limit={limit} }}",
                    components.join(", ")
                )
            }
        }?;
        if let Some(child) = self.child() {
            child.fmt_node(f, indent + 1)?;
        }
        Ok(())
    }
}

fn format_order_by(order_by: &[(OrderByDirection, Expression)]) -> String {
    let entries: Vec<String> = order_by
        .iter()
        .map(|(direction, expr)| format!("{direction:?} {expr}"))
        .collect();
    format!("[{}]", entries.join(", "))
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Column, TypeId};
    use sable_vector::Metric;

    #[test]
    fn display_renders_the_tree() {
        let schema = Schema::new(vec![Column::new("v", TypeId::Vector)]);
        let scan = Arc::new(PlanNode::SeqScan {
            table_oid: 1,
            table_name: "t".to_string(),
            schema: schema.clone(),
        });
        let topn = PlanNode::TopN {
            n: 3,
            order_by: vec![(
                OrderByDirection::Asc,
                Expression::distance(
                    Metric::L2,
                    Expression::column(0),
                    Expression::array_literal(&[1.0, 2.0]),
                ),
            )],
            schema,
            child: scan,
        };

        let rendered = topn.to_string();
        assert!(rendered.contains("TopN { n=3"));
        assert!(rendered.contains("  SeqScan { table=t }"));
    }
}
