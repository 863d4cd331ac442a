//! Codec for attributed table instances.
//!
//! Storage stays behind `TableStore`; this module only walks its
//! introspection and mutation calls. Wire layout, one property per kind:
//!
//! ```json
//! { "V": [{"_id": 0}, {"_id": 1}],
//!   "E": [{"_id": 0, "src": 0, "tgt": 1, "weight": 2.5}],
//!   "Weight": [{"_id": 0}] }
//! ```
//!
//! `_id`s are dense 0-based positions among live rows (ascending store
//! index), so a store with deleted rows still round-trips. They are not the
//! store's own row indices. Foreign keys carry positions in the target kind.
//! An attribute cell holding a pool placeholder is written as `{"_var": n}`,
//! and each attribute-type pool is written as `[{"_id": 0}, {"_id": 1}, ..]`,
//! again 0-based. Readers expecting 1-based part ids or `{"_id", "index"}`
//! pool entries need a translation step.
//!
//! A plain attribute value whose JSON is exactly `{"_var": <anything>}`
//! would read back as a placeholder, so writing one is an error.
pub mod mem;

use std::collections::HashMap;

use serde_json::{Map as JsonMap, Value as Json};
use tracing::debug;

use crate::codec::{Codec, native::expect_record};
use crate::error::CodecError;
use crate::ir::Ty;
use crate::lower::ROW_ID;
use crate::value::Value;

pub use mem::MemTables;

/// Placeholder key for attribute cells that point into a pool.
pub const VAR: &str = "_var";

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub name: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub attr_type: String,
    pub ty: Ty,
}

/// Contents of one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// A foreign key: store index of a row in the target kind.
    Row(usize),
    Value(Value),
    /// An attribute placeholder: store index of a slot in the attribute-type pool.
    Var(usize),
}

/// What the table codec needs from a storage engine.
pub trait TableStore {
    fn object_kinds(&self) -> Vec<String>;
    fn attr_type_kinds(&self) -> Vec<String>;
    fn foreign_keys(&self, kind: &str) -> Vec<ForeignKey>;
    fn attributes(&self, kind: &str) -> Vec<Attribute>;
    /// Live row indices of an object kind or attribute-type pool, ascending.
    fn live_rows(&self, kind: &str) -> Vec<usize>;
    fn allocate_rows(&mut self, kind: &str, n: usize) -> Result<Vec<usize>, CodecError>;
    fn get_cell(&self, kind: &str, row: usize, field: &str) -> Option<Cell>;
    fn set_cell(&mut self, kind: &str, row: usize, field: &str, cell: Cell) -> Result<(), CodecError>;
}

/// Store index -> wire position, per kind.
type Positions = HashMap<String, HashMap<usize, usize>>;

fn bad_cell(kind: &str, row: usize, field: &str, reason: impl Into<String>) -> CodecError {
    CodecError::BadCell {
        kind: kind.to_owned(),
        row,
        field: field.to_owned(),
        reason: reason.into(),
    }
}

fn var_placeholder(json: &Json) -> Option<&Json> {
    match json {
        Json::Object(obj) if obj.len() == 1 => obj.get(VAR),
        _ => None,
    }
}

fn position(json: &Json) -> Option<usize> {
    json.as_u64().and_then(|n| usize::try_from(n).ok())
}

impl Codec<'_> {
    // ---- write ----

    /// Attribute types are resolved in the codec's module, so build the codec
    /// over the module that declares the table.
    pub fn write_tables(&self, store: &impl TableStore) -> Result<Json, CodecError> {
        let obs = store.object_kinds();
        let pools = store.attr_type_kinds();

        let mut positions = Positions::new();
        for kind in obs.iter().chain(&pools) {
            let rows = store.live_rows(kind);
            positions.insert(kind.clone(), rows.into_iter().enumerate().map(|(pos, row)| (row, pos)).collect());
        }

        let mut out = JsonMap::with_capacity(obs.len() + pools.len());
        for kind in &obs {
            let fks = store.foreign_keys(kind);
            let attrs = store.attributes(kind);
            let rows = store.live_rows(kind);
            let mut encoded = Vec::with_capacity(rows.len());
            for (pos, &row) in rows.iter().enumerate() {
                let mut obj = JsonMap::with_capacity(1 + fks.len() + attrs.len());
                obj.insert(ROW_ID.to_owned(), Json::from(pos));
                for fk in &fks {
                    let target = match store.get_cell(kind, row, &fk.name) {
                        Some(Cell::Row(target)) => target,
                        Some(_) => return Err(bad_cell(kind, row, &fk.name, "foreign key holds a non-row cell")),
                        None => return Err(bad_cell(kind, row, &fk.name, "unset")),
                    };
                    let target_pos = positions.get(&fk.target)
                        .and_then(|p| p.get(&target))
                        .ok_or_else(|| bad_cell(kind, row, &fk.name, format!("row {target} of `{}` is not live", fk.target)))?;
                    obj.insert(fk.name.clone(), Json::from(*target_pos));
                }
                for attr in &attrs {
                    let value = match store.get_cell(kind, row, &attr.name) {
                        Some(Cell::Value(v)) => {
                            let json = self.encode_as(&attr.ty, &v)?;
                            if var_placeholder(&json).is_some() {
                                return Err(bad_cell(kind, row, &attr.name, format!(
                                    "value {json} cannot be told apart from a `{VAR}` placeholder"
                                )));
                            }
                            json
                        }
                        Some(Cell::Var(slot)) => {
                            let pos = positions.get(&attr.attr_type)
                                .and_then(|p| p.get(&slot))
                                .ok_or_else(|| bad_cell(kind, row, &attr.name, format!("pool slot {slot} is not live")))?;
                            let mut var = JsonMap::with_capacity(1);
                            var.insert(VAR.to_owned(), Json::from(*pos));
                            Json::Object(var)
                        }
                        Some(Cell::Row(_)) => return Err(bad_cell(kind, row, &attr.name, "attribute holds a row reference")),
                        None => return Err(bad_cell(kind, row, &attr.name, "unset")),
                    };
                    obj.insert(attr.name.clone(), value);
                }
                encoded.push(Json::Object(obj));
            }
            debug!(kind = %kind, rows = encoded.len(), "wrote object kind");
            out.insert(kind.clone(), Json::Array(encoded));
        }
        for pool in &pools {
            let slots = store.live_rows(pool).len();
            let encoded = (0..slots)
                .map(|pos| {
                    let mut obj = JsonMap::with_capacity(1);
                    obj.insert(ROW_ID.to_owned(), Json::from(pos));
                    Json::Object(obj)
                })
                .collect();
            debug!(pool = %pool, slots, "wrote attribute pool");
            out.insert(pool.clone(), Json::Array(encoded));
        }
        Ok(Json::Object(out))
    }

    pub fn write_tables_to_string(&self, store: &impl TableStore) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&self.write_tables(store)?)?)
    }

    // ---- read ----

    /// Append the rows described by `json` to `store`. On error the store may
    /// hold some of the new rows. As with `write_tables`, the codec must be
    /// built over the module that declares the table.
    pub fn read_tables(&self, store: &mut impl TableStore, json: &Json) -> Result<(), CodecError> {
        let Json::Object(doc) = json else {
            return Err(CodecError::conversion("table instance", json));
        };
        let obs = store.object_kinds();
        let pools = store.attr_type_kinds();
        if let Some(unknown) = doc.keys().find(|k| !obs.contains(*k) && !pools.contains(*k)) {
            return Err(CodecError::mismatch("table instance", format!("unexpected kind {unknown:?}")));
        }

        // Allocate first so foreign keys can point forward.
        let mut allocated: HashMap<String, Vec<usize>> = HashMap::new();
        for kind in &obs {
            let rows = match doc.get(kind) {
                Some(Json::Array(rows)) => rows,
                Some(other) => return Err(CodecError::conversion(format!("rows of `{kind}`"), other)),
                None => return Err(CodecError::mismatch("table instance", format!("missing kind {kind:?}"))),
            };
            let mut seen = vec![false; rows.len()];
            for (i, row) in rows.iter().enumerate() {
                let id = row.get(ROW_ID).and_then(position)
                    .ok_or_else(|| CodecError::mismatch(kind.as_str(), format!("row {i} has no valid `_id`")))?;
                match seen.get_mut(id) {
                    Some(flag) if !*flag => *flag = true,
                    Some(_) => return Err(CodecError::mismatch(kind.as_str(), format!("duplicate `_id` {id}"))),
                    None => return Err(CodecError::mismatch(kind.as_str(), format!("`_id` {id} outside 0..{}", rows.len()))),
                }
            }
            // Position `_id` lands on the `_id`-th fresh row.
            let fresh = store.allocate_rows(kind, rows.len())?;
            if fresh.len() != rows.len() {
                return Err(CodecError::Unsupported(format!(
                    "store allocated {} of {} rows for `{kind}`", fresh.len(), rows.len()
                )));
            }
            allocated.insert(kind.clone(), fresh);
        }
        for pool in &pools {
            let Some(slots) = doc.get(pool) else { continue };
            let Json::Array(slots) = slots else {
                return Err(CodecError::conversion(format!("slots of `{pool}`"), slots));
            };
            let mut seen = vec![false; slots.len()];
            for slot in slots {
                let obj = expect_record(slot, pool, false, &[ROW_ID])?;
                match position(&obj[ROW_ID]).and_then(|id| seen.get_mut(id)) {
                    Some(flag) if !*flag => *flag = true,
                    _ => return Err(CodecError::mismatch(pool.as_str(), format!("bad pool `_id` {}", obj[ROW_ID]))),
                }
            }
            allocated.insert(pool.clone(), store.allocate_rows(pool, slots.len())?);
        }

        for kind in &obs {
            let fks = store.foreign_keys(kind);
            let attrs = store.attributes(kind);
            let mut names = vec![ROW_ID];
            names.extend(fks.iter().map(|f| f.name.as_str()));
            names.extend(attrs.iter().map(|a| a.name.as_str()));
            let Some(Json::Array(rows)) = doc.get(kind) else { continue };
            let mut cells = Vec::with_capacity(rows.len() * (fks.len() + attrs.len()));
            for json in rows {
                let obj = expect_record(json, kind, false, &names)?;
                let pos = position(&obj[ROW_ID]).unwrap_or_default();
                let row = allocated[kind][pos];
                for fk in &fks {
                    let targets = allocated.get(&fk.target).map(Vec::as_slice).unwrap_or_default();
                    let target = position(&obj[&fk.name])
                        .and_then(|p| targets.get(p))
                        .ok_or_else(|| bad_cell(kind, pos, &fk.name, format!("no row {} in `{}`", obj[&fk.name], fk.target)))?;
                    cells.push((row, fk.name.clone(), Cell::Row(*target)));
                }
                for attr in &attrs {
                    let json = &obj[&attr.name];
                    let cell = match var_placeholder(json) {
                        Some(var) => {
                            let slots = allocated.get(&attr.attr_type).map(Vec::as_slice).unwrap_or_default();
                            let slot = position(var)
                                .and_then(|p| slots.get(p))
                                .ok_or_else(|| bad_cell(kind, pos, &attr.name, format!("no slot {var} in `{}`", attr.attr_type)))?;
                            Cell::Var(*slot)
                        }
                        None => Cell::Value(self.decode(&attr.ty, json)?),
                    };
                    cells.push((row, attr.name.clone(), cell));
                }
            }
            for (row, field, cell) in cells {
                store.set_cell(kind, row, &field, cell)?;
            }
            debug!(kind = %kind, rows = rows.len(), "read object kind");
        }
        Ok(())
    }

    pub fn read_tables_str(&self, store: &mut impl TableStore, text: &str) -> Result<(), CodecError> {
        let json: Json = serde_json::from_str(text)?;
        self.read_tables(store, &json)
    }
}
