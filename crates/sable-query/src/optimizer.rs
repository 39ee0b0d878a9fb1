//! Optimizer rules.
//!
//! Two bottom-up rewrites run in sequence:
//!
//! 1. `Limit(Sort(..))` collapses to `TopN`, the shape the planner emits for
//!    `ORDER BY .. LIMIT k`.
//! 2. `TopN` ordered by a single ascending distance call over
//!    `[Projection ->] SeqScan` becomes a `VectorIndexScan` when the catalog
//!    holds a compatible index on the referenced column.
//!
//! Rules never fail: anything that does not match passes through unchanged,
//! and both rules are idempotent.

use std::sync::Arc;

use tracing::debug;

use sable_vector::Metric;

use crate::catalog::{Catalog, IndexInfo, IndexKind};
use crate::expression::Expression;
use crate::plan::{OrderByDirection, PlanNode, PlanRef};
use crate::value::TypeId;

/// How the rewrite chooses among multiple matching vector indexes, set by
/// the `vector_index_match_method` session variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMethod {
    /// First matching index in catalog order.
    #[default]
    Default,
    /// First matching HNSW index; no rewrite if none.
    Hnsw,
    /// First matching IVFFlat index; no rewrite if none.
    IvfFlat,
    /// Never rewrite; keep the sequential scan.
    None,
}

impl MatchMethod {
    /// Parse the session string. The empty string and unrecognized values
    /// fall back to `Default`.
    pub fn from_session(value: &str) -> Self {
        match value {
            "hnsw" => MatchMethod::Hnsw,
            "ivfflat" => MatchMethod::IvfFlat,
            "none" => MatchMethod::None,
            _ => MatchMethod::Default,
        }
    }
}

pub struct Optimizer<'a> {
    catalog: &'a Catalog,
    match_method: MatchMethod,
}

impl<'a> Optimizer<'a> {
    pub fn new(catalog: &'a Catalog, match_method: MatchMethod) -> Self {
        Self { catalog, match_method }
    }

    /// The full rewrite pipeline.
    pub fn optimize(&self, plan: PlanRef) -> PlanRef {
        let plan = self.optimize_sort_limit_as_topn(plan);
        self.optimize_as_vector_index_scan(plan)
    }

    /// Collapse `Limit(Sort(..))` into a single `TopN`.
    pub fn optimize_sort_limit_as_topn(&self, plan: PlanRef) -> PlanRef {
        let plan = map_children(&plan, &|child| self.optimize_sort_limit_as_topn(child));

        if let PlanNode::Limit { limit, schema, child } = &*plan {
            if let PlanNode::Sort { order_by, child: sort_child, .. } = &**child {
                return Arc::new(PlanNode::TopN {
                    n: *limit,
                    order_by: order_by.clone(),
                    schema: schema.clone(),
                    child: sort_child.clone(),
                });
            }
        }
        plan
    }

    /// Rewrite a top-K-by-distance `TopN` into a `VectorIndexScan`.
    pub fn optimize_as_vector_index_scan(&self, plan: PlanRef) -> PlanRef {
        let plan = map_children(&plan, &|child| self.optimize_as_vector_index_scan(child));

        let PlanNode::TopN { n, order_by, child, .. } = &*plan else {
            return plan;
        };
        if order_by.len() != 1 {
            return plan;
        }
        let (direction, order_expr) = &order_by[0];
        if !matches!(direction, OrderByDirection::Asc | OrderByDirection::Default) {
            return plan;
        }
        let Expression::VectorDistance { metric, left, right } = order_expr else {
            return plan;
        };

        // One operand must be a bare column reference, the other a constant
        // array literal (the query vector).
        let (ref_idx, base_vector) = match (&**left, &**right) {
            (Expression::ColumnRef { col_idx }, Expression::Array(elements))
                if crate::expression::constant_vector(elements).is_some() =>
            {
                (*col_idx, elements)
            }
            (Expression::Array(elements), Expression::ColumnRef { col_idx })
                if crate::expression::constant_vector(elements).is_some() =>
            {
                (*col_idx, elements)
            }
            _ => return plan,
        };

        // Below the TopN: a sequential scan, optionally behind a projection.
        let (projection, scan) = match &**child {
            PlanNode::Projection { child: inner, .. } => match &**inner {
                PlanNode::SeqScan { .. } => (Some(child.clone()), inner.clone()),
                _ => return plan,
            },
            PlanNode::SeqScan { .. } => (None, child.clone()),
            _ => return plan,
        };
        let PlanNode::SeqScan { table_oid, table_name, schema: scan_schema } = &*scan else {
            unreachable!("scan was just matched as a seq scan");
        };

        // A column reference above a projection points into the projection's
        // output; chase it down to the base table column.
        let col_idx = match &projection {
            Some(projection) => {
                let PlanNode::Projection { exprs, .. } = &**projection else {
                    unreachable!("projection was just matched");
                };
                match exprs.get(ref_idx) {
                    Some(Expression::ColumnRef { col_idx }) => *col_idx,
                    _ => return plan,
                }
            }
            None => ref_idx,
        };

        let Some(table) = self.catalog.table(*table_oid) else {
            return plan;
        };
        match table.schema.columns().get(col_idx) {
            Some(column) if column.type_id() == TypeId::Vector => {}
            _ => return plan,
        }

        let Some(index_info) = self.match_vector_index(*table_oid, col_idx, *metric) else {
            return plan;
        };
        debug!(
            index = %index_info.name,
            table = %table_name,
            limit = n,
            "rewrote top-n distance ordering to vector index scan"
        );

        let index_scan = Arc::new(PlanNode::VectorIndexScan {
            table_oid: *table_oid,
            table_name: table_name.clone(),
            index_oid: index_info.oid,
            index_name: index_info.name.clone(),
            base_vector: base_vector.clone(),
            limit: *n,
            schema: scan_schema.clone(),
        });

        match projection {
            Some(projection) => {
                let PlanNode::Projection { exprs, schema, .. } = &*projection else {
                    unreachable!("projection was just matched");
                };
                Arc::new(PlanNode::Projection {
                    exprs: exprs.clone(),
                    schema: schema.clone(),
                    child: index_scan,
                })
            }
            None => index_scan,
        }
    }

    /// First compatible index under the session's match method, in catalog
    /// order. Compatible means keyed on `col_idx` with the same metric as
    /// the ordering expression.
    fn match_vector_index(
        &self,
        table_oid: u32,
        col_idx: usize,
        metric: Metric,
    ) -> Option<&IndexInfo> {
        if self.match_method == MatchMethod::None {
            return None;
        }
        self.catalog.table_indexes(table_oid).find(|info| {
            if info.col_idx != col_idx || info.metric != metric {
                return false;
            }
            match self.match_method {
                MatchMethod::Default => true,
                MatchMethod::Hnsw => info.kind == IndexKind::Hnsw,
                MatchMethod::IvfFlat => info.kind == IndexKind::IvfFlat,
                MatchMethod::None => false,
            }
        })
    }
}

/// Rebuild a node with `f` applied to its child. Leaves pass through.
fn map_children(plan: &PlanRef, f: &dyn Fn(PlanRef) -> PlanRef) -> PlanRef {
    match &**plan {
        PlanNode::SeqScan { .. } | PlanNode::VectorIndexScan { .. } => plan.clone(),
        PlanNode::Projection { exprs, schema, child } => Arc::new(PlanNode::Projection {
            exprs: exprs.clone(),
            schema: schema.clone(),
            child: f(child.clone()),
        }),
        PlanNode::Sort { order_by, schema, child } => Arc::new(PlanNode::Sort {
            order_by: order_by.clone(),
            schema: schema.clone(),
            child: f(child.clone()),
        }),
        PlanNode::Limit { limit, schema, child } => Arc::new(PlanNode::Limit {
            limit: *limit,
            schema: schema.clone(),
            child: f(child.clone()),
        }),
        PlanNode::TopN { n, order_by, schema, child } => Arc::new(PlanNode::TopN {
            n: *n,
            order_by: order_by.clone(),
            schema: schema.clone(),
            child: f(child.clone()),
        }),
    }
}
