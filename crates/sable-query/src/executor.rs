//! Executors and the execution engine driver.
//!
//! The engine contract is pull-based: `init` once, then `next` until it
//! yields `None`. Executors for the shapes this subsystem plans are here;
//! the wider executor zoo (joins, aggregation, DML) lives outside.

use std::collections::VecDeque;

use tracing::debug;

use sable_vector::{Result, Rid, VectorError};

use crate::catalog::Catalog;
use crate::expression::{constant_vector, Expression};
use crate::plan::{OrderByDirection, PlanNode, PlanRef};
use crate::value::{Schema, Tuple};

/// Pull-based executor.
pub trait Executor {
    fn init(&mut self) -> Result<()>;

    /// The next output row, or `None` when exhausted.
    fn next(&mut self) -> Result<Option<(Tuple, Rid)>>;

    /// Schema of the rows this executor emits.
    fn schema(&self) -> &Schema;
}

/// Build the executor tree for a plan.
pub fn create_executor<'a>(catalog: &'a Catalog, plan: &PlanRef) -> Box<dyn Executor + 'a> {
    match &**plan {
        PlanNode::SeqScan { table_oid, schema, .. } => Box::new(SeqScanExecutor {
            catalog,
            table_oid: *table_oid,
            schema: schema.clone(),
            rids: Vec::new(),
            cursor: 0,
        }),
        PlanNode::Projection { exprs, schema, child } => Box::new(ProjectionExecutor {
            child: create_executor(catalog, child),
            exprs: exprs.clone(),
            schema: schema.clone(),
        }),
        PlanNode::TopN { n, order_by, schema, child } => Box::new(TopNExecutor {
            child: create_executor(catalog, child),
            n: *n,
            order_by: order_by.clone(),
            schema: schema.clone(),
            sorted: VecDeque::new(),
        }),
        PlanNode::VectorIndexScan {
            table_oid,
            index_oid,
            index_name,
            base_vector,
            limit,
            schema,
            ..
        } => Box::new(VectorIndexScanExecutor {
            catalog,
            table_oid: *table_oid,
            index_oid: *index_oid,
            index_name: index_name.clone(),
            base_vector: base_vector.clone(),
            limit: *limit,
            schema: schema.clone(),
            rids: VecDeque::new(),
        }),
        PlanNode::Sort { .. } | PlanNode::Limit { .. } => {
            unreachable!("sort and limit collapse to top-n before execution")
        }
    }
}

/// Drives a plan to completion: init, then poll until exhaustion.
pub struct ExecutionEngine<'a> {
    catalog: &'a Catalog,
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn execute(&self, plan: &PlanRef) -> Result<Vec<Tuple>> {
        let mut executor = create_executor(self.catalog, plan);
        executor.init()?;

        let mut results = Vec::new();
        while let Some((tuple, _rid)) = executor.next()? {
            results.push(tuple);
        }
        Ok(results)
    }
}

struct SeqScanExecutor<'a> {
    catalog: &'a Catalog,
    table_oid: u32,
    schema: Schema,
    rids: Vec<Rid>,
    cursor: usize,
}

impl Executor for SeqScanExecutor<'_> {
    fn init(&mut self) -> Result<()> {
        let table = self
            .catalog
            .table(self.table_oid)
            .expect("bound plans reference existing tables");
        self.rids = table.heap.iter().map(|(rid, _)| rid).collect();
        self.cursor = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<(Tuple, Rid)>> {
        if self.cursor >= self.rids.len() {
            return Ok(None);
        }
        let rid = self.rids[self.cursor];
        self.cursor += 1;

        let table = self
            .catalog
            .table(self.table_oid)
            .expect("bound plans reference existing tables");
        let tuple = table.heap.get_tuple(rid).expect("heap tuples are never removed");
        Ok(Some((tuple.clone(), rid)))
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}

struct ProjectionExecutor<'a> {
    child: Box<dyn Executor + 'a>,
    exprs: Vec<Expression>,
    schema: Schema,
}

impl Executor for ProjectionExecutor<'_> {
    fn init(&mut self) -> Result<()> {
        self.child.init()
    }

    fn next(&mut self) -> Result<Option<(Tuple, Rid)>> {
        match self.child.next()? {
            Some((tuple, rid)) => {
                let values = self
                    .exprs
                    .iter()
                    .map(|expr| expr.evaluate(&tuple, self.child.schema()))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Some((Tuple::new(values), rid)))
            }
            None => Ok(None),
        }
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}

struct TopNExecutor<'a> {
    child: Box<dyn Executor + 'a>,
    n: usize,
    order_by: Vec<(OrderByDirection, Expression)>,
    schema: Schema,
    sorted: VecDeque<(Tuple, Rid)>,
}

impl Executor for TopNExecutor<'_> {
    fn init(&mut self) -> Result<()> {
        self.child.init()?;

        let mut rows: Vec<(Vec<f64>, Tuple, Rid)> = Vec::new();
        while let Some((tuple, rid)) = self.child.next()? {
            let keys = self
                .order_by
                .iter()
                .map(|(_, expr)| {
                    expr.evaluate(&tuple, self.child.schema()).map(|value| {
                        value.as_double().expect("order keys evaluate to scalars")
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            rows.push((keys, tuple, rid));
        }

        let directions: Vec<OrderByDirection> =
            self.order_by.iter().map(|(direction, _)| *direction).collect();
        rows.sort_by(|a, b| {
            for (i, direction) in directions.iter().enumerate() {
                let ordering = a.0[i].total_cmp(&b.0[i]);
                let ordering = match direction {
                    OrderByDirection::Desc => ordering.reverse(),
                    _ => ordering,
                };
                if !ordering.is_eq() {
                    return ordering;
                }
            }
            std::cmp::Ordering::Equal
        });
        rows.truncate(self.n);

        self.sorted = rows.into_iter().map(|(_, tuple, rid)| (tuple, rid)).collect();
        Ok(())
    }

    fn next(&mut self) -> Result<Option<(Tuple, Rid)>> {
        Ok(self.sorted.pop_front())
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Runs the chosen vector index with the plan's constant query vector and
/// materializes tuples from the table heap in the index's distance order.
struct VectorIndexScanExecutor<'a> {
    catalog: &'a Catalog,
    table_oid: u32,
    index_oid: u32,
    index_name: String,
    base_vector: Vec<Expression>,
    limit: usize,
    schema: Schema,
    rids: VecDeque<Rid>,
}

impl Executor for VectorIndexScanExecutor<'_> {
    fn init(&mut self) -> Result<()> {
        let index_info = self
            .catalog
            .index(self.index_oid)
            .ok_or_else(|| VectorError::IndexNotFound(self.index_name.clone()))?;

        // The rewrite only fires on constant array literals, so the query
        // vector evaluates without an input tuple.
        let query = constant_vector(&self.base_vector)
            .expect("vector index scan carries a constant query vector");

        let rids = index_info.index.read().scan(&query, self.limit)?;
        debug!(
            index = %self.index_name,
            limit = self.limit,
            returned = rids.len(),
            "vector index scan"
        );
        self.rids = rids.into();
        Ok(())
    }

    fn next(&mut self) -> Result<Option<(Tuple, Rid)>> {
        let Some(rid) = self.rids.pop_front() else {
            return Ok(None);
        };
        let table = self
            .catalog
            .table(self.table_oid)
            .expect("bound plans reference existing tables");
        let tuple = table
            .heap
            .get_tuple(rid)
            .expect("index rids point at live heap tuples");
        Ok(Some((tuple.clone(), rid)))
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}
