//! Catalog: tables, their heaps, and their vector indexes.
//!
//! The catalog is the seam between single-writer index internals and the
//! rest of the engine: each registered index sits behind an
//! `Arc<RwLock<..>>`, write-locked by DDL/DML and read-locked by scans.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use sable_hnsw::{HnswIndex, HnswOptions};
use sable_ivfflat::{IvfFlatIndex, IvfFlatOptions};
use sable_vector::{Metric, Result, Rid, VectorIndex};

use crate::heap::TableHeap;
use crate::value::{Schema, Tuple, TypeId};

/// Which ANN structure backs an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    IvfFlat,
    Hnsw,
}

pub struct TableInfo {
    pub oid: u32,
    pub name: String,
    pub schema: Schema,
    pub heap: TableHeap,
}

pub struct IndexInfo {
    pub oid: u32,
    pub name: String,
    pub table_oid: u32,
    /// The table column the index is keyed on.
    pub col_idx: usize,
    pub kind: IndexKind,
    pub metric: Metric,
    pub index: Arc<RwLock<Box<dyn VectorIndex>>>,
}

/// System catalog for the vector subsystem.
#[derive(Default)]
pub struct Catalog {
    tables: Vec<TableInfo>,
    /// Creation order; the optimizer's "first matching index" is first here.
    indexes: Vec<IndexInfo>,
    next_oid: u32,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&mut self, name: &str, schema: Schema) -> u32 {
        let oid = self.allocate_oid();
        self.tables.push(TableInfo {
            oid,
            name: name.to_string(),
            schema,
            heap: TableHeap::new(),
        });
        oid
    }

    pub fn table(&self, oid: u32) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.oid == oid)
    }

    pub fn table_by_name(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Append a tuple to a table's heap and keep every vector index on that
    /// table current.
    pub fn insert_tuple(&mut self, table_oid: u32, tuple: Tuple) -> Result<Rid> {
        let table = self
            .tables
            .iter_mut()
            .find(|t| t.oid == table_oid)
            .expect("bound plans reference existing tables");
        let rid = table.heap.insert_tuple(tuple.clone());

        for index_info in self.indexes.iter().filter(|i| i.table_oid == table_oid) {
            let vector = tuple
                .value(index_info.col_idx)
                .as_vector()
                .expect("vector-indexed column holds vector values");
            index_info.index.write().insert(vector.to_vec(), rid)?;
        }
        Ok(rid)
    }

    /// DDL entry point: construct an index, bulk-build it from the rows
    /// already in the heap, and register it.
    ///
    /// `seed` pins the index's PRNG for reproducible tests; production
    /// callers pass `None` and get system entropy.
    pub fn create_vector_index(
        &mut self,
        name: &str,
        table_oid: u32,
        col_idx: usize,
        kind: IndexKind,
        metric: Metric,
        options: &[(String, i64)],
        seed: Option<u64>,
    ) -> Result<u32> {
        let table = self
            .table(table_oid)
            .expect("bound DDL references an existing table");
        assert_eq!(
            table.schema.column(col_idx).type_id(),
            TypeId::Vector,
            "vector index keyed on a non-vector column"
        );

        let data: Vec<(Vec<f64>, Rid)> = table
            .heap
            .iter()
            .map(|(rid, tuple)| {
                let vector = tuple
                    .value(col_idx)
                    .as_vector()
                    .expect("vector-indexed column holds vector values");
                (vector.to_vec(), rid)
            })
            .collect();
        let table_name = table.name.clone();

        let mut index: Box<dyn VectorIndex> = match kind {
            IndexKind::IvfFlat => {
                let parsed = IvfFlatOptions::from_pairs(options)?;
                Box::new(match seed {
                    Some(seed) => IvfFlatIndex::with_seed(metric, &parsed, seed),
                    None => IvfFlatIndex::new(metric, &parsed),
                })
            }
            IndexKind::Hnsw => {
                let parsed = HnswOptions::from_pairs(options)?;
                Box::new(match seed {
                    Some(seed) => HnswIndex::with_seed(metric, &parsed, seed),
                    None => HnswIndex::new(metric, &parsed),
                })
            }
        };
        index.build(data)?;

        let oid = self.allocate_oid();
        info!(index = name, table = %table_name, ?kind, %metric, "created vector index");
        self.indexes.push(IndexInfo {
            oid,
            name: name.to_string(),
            table_oid,
            col_idx,
            kind,
            metric,
            index: Arc::new(RwLock::new(index)),
        });
        Ok(oid)
    }

    pub fn index(&self, oid: u32) -> Option<&IndexInfo> {
        self.indexes.iter().find(|i| i.oid == oid)
    }

    /// All vector indexes on a table, in catalog (creation) order.
    pub fn table_indexes(&self, table_oid: u32) -> impl Iterator<Item = &IndexInfo> {
        self.indexes.iter().filter(move |i| i.table_oid == table_oid)
    }

    /// Drop an index from the catalog. Plans already holding its oid fail
    /// at execution with `IndexNotFound`.
    pub fn drop_index(&mut self, oid: u32) -> bool {
        let before = self.indexes.len();
        self.indexes.retain(|i| i.oid != oid);
        self.indexes.len() < before
    }

    fn allocate_oid(&mut self) -> u32 {
        let oid = self.next_oid;
        self.next_oid += 1;
        oid
    }
}
