//! Query layer of SableDB's vector subsystem.
//!
//! Everything between a bound `SELECT .. ORDER BY l2_dist(col, ARRAY[..])
//! LIMIT k` and the rids an ANN index hands back:
//!
//! - **Plan tree**: `SeqScan`, `Projection`, `Sort`, `Limit`, `TopN`,
//!   `VectorIndexScan`
//! - **Optimizer**: `Limit(Sort(..)) -> TopN`, then the vector-index rewrite
//!   gated by the `vector_index_match_method` session knob
//! - **Catalog**: tables with in-memory heaps, vector index DDL and DML glue
//! - **Executors**: the pull-based `init`/`next` contract and the
//!   `VectorIndexScan` executor
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sable_query::catalog::{Catalog, IndexKind};
//! use sable_query::executor::ExecutionEngine;
//! use sable_query::expression::Expression;
//! use sable_query::optimizer::{MatchMethod, Optimizer};
//! use sable_query::plan::{OrderByDirection, PlanNode};
//! use sable_query::value::{Column, Schema, Tuple, TypeId, Value};
//! use sable_vector::Metric;
//!
//! let mut catalog = Catalog::new();
//! let schema = Schema::new(vec![Column::new("v", TypeId::Vector)]);
//! let table_oid = catalog.create_table("t", schema.clone());
//! for v in [[0.0, 0.0], [1.0, 1.0], [5.0, 5.0]] {
//!     catalog
//!         .insert_tuple(table_oid, Tuple::new(vec![Value::Vector(v.to_vec())]))
//!         .unwrap();
//! }
//! let options = vec![
//!     ("m".to_string(), 4),
//!     ("ef_construction".to_string(), 20),
//!     ("ef_search".to_string(), 16),
//! ];
//! catalog
//!     .create_vector_index("t_v_idx", table_oid, 0, IndexKind::Hnsw, Metric::L2, &options, Some(1))
//!     .unwrap();
//!
//! let plan = Arc::new(PlanNode::TopN {
//!     n: 1,
//!     order_by: vec![(
//!         OrderByDirection::Asc,
//!         Expression::distance(
//!             Metric::L2,
//!             Expression::column(0),
//!             Expression::array_literal(&[0.9, 1.1]),
//!         ),
//!     )],
//!     schema: schema.clone(),
//!     child: Arc::new(PlanNode::SeqScan {
//!         table_oid,
//!         table_name: "t".to_string(),
//!         schema,
//!     }),
//! });
//!
//! let optimizer = Optimizer::new(&catalog, MatchMethod::Default);
//! let optimized = optimizer.optimize(plan);
//! assert!(matches!(&*optimized, PlanNode::VectorIndexScan { .. }));
//!
//! let rows = ExecutionEngine::new(&catalog).execute(&optimized).unwrap();
//! assert_eq!(rows, vec![Tuple::new(vec![Value::Vector(vec![1.0, 1.0])])]);
//! ```

pub mod catalog;
pub mod executor;
pub mod expression;
pub mod heap;
pub mod optimizer;
pub mod plan;
pub mod value;
