//! An in-memory `TableStore`, shaped by a `TableSpec`.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;

use super::{Attribute, Cell, ForeignKey, TableStore};
use crate::error::CodecError;
use crate::ir::TableSpec;

#[derive(Debug, Default, Clone)]
struct Table {
    next: usize,
    live: BTreeSet<usize>,
    cells: HashMap<(usize, String), Cell>,
}

#[derive(Debug, Clone)]
pub struct MemTables {
    obs: Vec<String>,
    attr_types: Vec<String>,
    fks: IndexMap<String, Vec<ForeignKey>>,
    attrs: IndexMap<String, Vec<Attribute>>,
    tables: HashMap<String, Table>,
}

impl MemTables {
    pub fn new(spec: &TableSpec) -> Self {
        let mut fks: IndexMap<String, Vec<ForeignKey>> = IndexMap::new();
        let mut attrs: IndexMap<String, Vec<Attribute>> = IndexMap::new();
        for ob in &spec.objects {
            fks.insert(ob.clone(), spec.homs_from(ob)
                .map(|h| ForeignKey { name: h.name.clone(), target: h.codom.clone() })
                .collect());
            attrs.insert(ob.clone(), spec.attrs_from(ob)
                .filter_map(|a| {
                    let at = spec.attr_type(&a.codom)?;
                    Some(Attribute { name: a.name.clone(), attr_type: at.name.clone(), ty: at.ty.clone() })
                })
                .collect());
        }
        let attr_types: Vec<String> = spec.attr_types.iter().map(|a| a.name.clone()).collect();
        let tables = spec.objects.iter()
            .chain(&attr_types)
            .map(|k| (k.clone(), Table::default()))
            .collect();
        Self { obs: spec.objects.clone(), attr_types, fks, attrs, tables }
    }

    fn table(&self, kind: &str) -> Result<&Table, CodecError> {
        self.tables.get(kind).ok_or_else(|| CodecError::UnknownType(kind.to_owned()))
    }

    fn table_mut(&mut self, kind: &str) -> Result<&mut Table, CodecError> {
        self.tables.get_mut(kind).ok_or_else(|| CodecError::UnknownType(kind.to_owned()))
    }

    pub fn add_row(&mut self, kind: &str) -> Result<usize, CodecError> {
        let rows = self.allocate_rows(kind, 1)?;
        Ok(rows[0])
    }

    /// Remove a row and its cells. References to it elsewhere are left dangling.
    pub fn remove_row(&mut self, kind: &str, row: usize) -> Result<bool, CodecError> {
        let table = self.table_mut(kind)?;
        table.cells.retain(|(r, _), _| *r != row);
        Ok(table.live.remove(&row))
    }

    pub fn len(&self, kind: &str) -> usize {
        self.table(kind).map(|t| t.live.len()).unwrap_or(0)
    }
}

impl TableStore for MemTables {
    fn object_kinds(&self) -> Vec<String> {
        self.obs.clone()
    }

    fn attr_type_kinds(&self) -> Vec<String> {
        self.attr_types.clone()
    }

    fn foreign_keys(&self, kind: &str) -> Vec<ForeignKey> {
        self.fks.get(kind).cloned().unwrap_or_default()
    }

    fn attributes(&self, kind: &str) -> Vec<Attribute> {
        self.attrs.get(kind).cloned().unwrap_or_default()
    }

    fn live_rows(&self, kind: &str) -> Vec<usize> {
        self.table(kind).map(|t| t.live.iter().copied().collect()).unwrap_or_default()
    }

    fn allocate_rows(&mut self, kind: &str, n: usize) -> Result<Vec<usize>, CodecError> {
        let table = self.table_mut(kind)?;
        let rows: Vec<usize> = (table.next..table.next + n).collect();
        table.next += n;
        table.live.extend(rows.iter().copied());
        Ok(rows)
    }

    fn get_cell(&self, kind: &str, row: usize, field: &str) -> Option<Cell> {
        self.tables.get(kind)?.cells.get(&(row, field.to_owned())).cloned()
    }

    fn set_cell(&mut self, kind: &str, row: usize, field: &str, cell: Cell) -> Result<(), CodecError> {
        let table = self.table_mut(kind)?;
        if !table.live.contains(&row) {
            return Err(CodecError::BadCell {
                kind: kind.to_owned(),
                row,
                field: field.to_owned(),
                reason: "row is not live".to_owned(),
            });
        }
        table.cells.insert((row, field.to_owned()), cell);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Codec;
    use crate::ir::Decl;
    use crate::module::{Module, ModuleBuilder};
    use crate::value::Value;
    use serde_json::json;

    fn module() -> Module {
        let mut b = ModuleBuilder::new("graphs");
        b.declare("table Ring { ob O  hom next :: O -> O  attrtype Label = Str  attr label :: O -> Label }").unwrap();
        b.declare("table Graph { ob V, E  hom src :: E -> V  hom tgt :: E -> V  attrtype Weight = F64  attr weight :: E -> Weight }").unwrap();
        b.finish().unwrap()
    }

    fn spec<'m>(m: &'m Module, name: &str) -> &'m TableSpec {
        match m.get(name) {
            Some(Decl::TableSchema(spec)) => spec,
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn three_row_cycle_round_trip() {
        let m = module();
        let codec = Codec::new(&m);
        let mut store = MemTables::new(spec(&m, "Ring"));
        let rows = store.allocate_rows("O", 3).unwrap();
        for (i, &row) in rows.iter().enumerate() {
            store.set_cell("O", row, "next", Cell::Row(rows[(i + 1) % 3])).unwrap();
            store.set_cell("O", row, "label", Cell::Value(Value::str(format!("n{i}")))).unwrap();
        }

        let json = codec.write_tables(&store).unwrap();
        assert_eq!(json, json!({
            "O": [
                {"_id": 0, "next": 1, "label": "n0"},
                {"_id": 1, "next": 2, "label": "n1"},
                {"_id": 2, "next": 0, "label": "n2"},
            ],
            "Label": [],
        }));

        let mut back = MemTables::new(spec(&m, "Ring"));
        codec.read_tables(&mut back, &json).unwrap();
        assert_eq!(back.len("O"), 3);
        for (i, row) in back.live_rows("O").into_iter().enumerate() {
            assert_eq!(back.get_cell("O", row, "next"), Some(Cell::Row((i + 1) % 3)));
            assert_eq!(back.get_cell("O", row, "label"), Some(Cell::Value(Value::str(format!("n{i}")))));
        }
        assert_eq!(codec.write_tables(&back).unwrap(), json);
    }

    #[test]
    fn deleted_rows_are_renumbered_densely() {
        let m = module();
        let codec = Codec::new(&m);
        let mut store = MemTables::new(spec(&m, "Graph"));
        let v = store.allocate_rows("V", 3).unwrap();
        store.remove_row("V", v[0]).unwrap();
        let e = store.add_row("E").unwrap();
        store.set_cell("E", e, "src", Cell::Row(v[1])).unwrap();
        store.set_cell("E", e, "tgt", Cell::Row(v[2])).unwrap();
        store.set_cell("E", e, "weight", Cell::Value(Value::F64(0.5))).unwrap();

        let json = codec.write_tables(&store).unwrap();
        assert_eq!(json["V"], json!([{"_id": 0}, {"_id": 1}]));
        assert_eq!(json["E"], json!([{"_id": 0, "src": 0, "tgt": 1, "weight": 0.5}]));
    }

    #[test]
    fn rows_are_placed_by_id_not_array_order() {
        let m = module();
        let codec = Codec::new(&m);
        let mut store = MemTables::new(spec(&m, "Ring"));
        let json = json!({
            "O": [
                {"_id": 1, "next": 0, "label": "b"},
                {"_id": 0, "next": 0, "label": "a"},
            ],
        });
        codec.read_tables(&mut store, &json).unwrap();
        assert_eq!(store.get_cell("O", 0, "label"), Some(Cell::Value(Value::str("a"))));
        assert_eq!(store.get_cell("O", 1, "next"), Some(Cell::Row(0)));
    }

    #[test]
    fn attribute_variables_point_into_the_pool() {
        let m = module();
        let codec = Codec::new(&m);
        let mut store = MemTables::new(spec(&m, "Graph"));
        let v = store.allocate_rows("V", 1).unwrap()[0];
        let e = store.allocate_rows("E", 2).unwrap();
        let w = store.allocate_rows("Weight", 1).unwrap()[0];
        for &edge in &e {
            store.set_cell("E", edge, "src", Cell::Row(v)).unwrap();
            store.set_cell("E", edge, "tgt", Cell::Row(v)).unwrap();
        }
        store.set_cell("E", e[0], "weight", Cell::Var(w)).unwrap();
        store.set_cell("E", e[1], "weight", Cell::Value(Value::F64(1.5))).unwrap();

        let json = codec.write_tables(&store).unwrap();
        assert_eq!(json["E"][0]["weight"], json!({"_var": 0}));
        assert_eq!(json["Weight"], json!([{"_id": 0}]));

        let mut back = MemTables::new(spec(&m, "Graph"));
        codec.read_tables(&mut back, &json).unwrap();
        assert_eq!(back.len("Weight"), 1);
        assert_eq!(codec.write_tables(&back).unwrap(), json);
    }

    #[test]
    fn malformed_instances_are_rejected() {
        let m = module();
        let codec = Codec::new(&m);
        let cases = [
            json!({"O": [{"_id": 0, "next": 0}]}),
            json!({"O": [{"_id": 3, "next": 0, "label": "x"}]}),
            json!({"O": [{"_id": 0, "next": 0, "label": "x"}, {"_id": 0, "next": 0, "label": "y"}]}),
            json!({"O": [], "Q": []}),
            json!({}),
        ];
        for json in cases {
            let mut store = MemTables::new(spec(&m, "Ring"));
            assert!(matches!(
                codec.read_tables(&mut store, &json),
                Err(CodecError::SchemaMismatch { .. })
            ), "{json} must be rejected");
        }

        let mut store = MemTables::new(spec(&m, "Ring"));
        let dangling = json!({"O": [{"_id": 0, "next": 5, "label": "x"}]});
        assert!(matches!(codec.read_tables(&mut store, &dangling), Err(CodecError::BadCell { .. })));
    }

    #[test]
    fn values_shaped_like_a_placeholder_are_refused() {
        let mut b = ModuleBuilder::new("meta");
        b.declare("table Tagged { ob O  attrtype Meta = Object(U32)  attr meta :: O -> Meta }").unwrap();
        let m = b.finish().unwrap();
        let codec = Codec::new(&m);
        let mut store = MemTables::new(spec(&m, "Tagged"));
        let row = store.add_row("O").unwrap();

        let mut props = indexmap::IndexMap::new();
        props.insert("_var".to_owned(), Value::U32(0));
        store.set_cell("O", row, "meta", Cell::Value(Value::Object(props.clone()))).unwrap();
        assert!(matches!(
            codec.write_tables(&store),
            Err(CodecError::BadCell { ref field, .. }) if field == "meta"
        ));

        // one more key and the value is unambiguous again
        props.insert("n".to_owned(), Value::U32(1));
        store.set_cell("O", row, "meta", Cell::Value(Value::Object(props))).unwrap();
        let json = codec.write_tables(&store).unwrap();
        assert_eq!(json["O"][0]["meta"], json!({"_var": 0, "n": 1}));
        let mut back = MemTables::new(spec(&m, "Tagged"));
        codec.read_tables(&mut back, &json).unwrap();
        assert_eq!(codec.write_tables(&back).unwrap(), json);
    }

    #[test]
    fn attribute_types_resolve_in_the_declaring_module() {
        let mut b = ModuleBuilder::new("places");
        b.declare("struct Pt { x :: I32, y :: I32 }").unwrap();
        b.declare("table Atlas { ob City  attrtype Loc = Pt  attr at :: City -> Loc }").unwrap();
        let m = b.finish().unwrap();
        let codec = Codec::new(&m);
        let mut store = MemTables::new(spec(&m, "Atlas"));
        let city = store.add_row("City").unwrap();
        let pt = Value::record([("x", Value::I32(3)), ("y", Value::I32(-4))]);
        store.set_cell("City", city, "at", Cell::Value(pt.clone())).unwrap();

        let json = codec.write_tables(&store).unwrap();
        assert_eq!(json["City"], json!([{"_id": 0, "at": {"x": 3, "y": -4}}]));
        let mut back = MemTables::new(spec(&m, "Atlas"));
        codec.read_tables(&mut back, &json).unwrap();
        assert_eq!(back.get_cell("City", 0, "at"), Some(Cell::Value(pt)));
    }

    #[test]
    fn unset_cells_fail_the_write() {
        let m = module();
        let codec = Codec::new(&m);
        let mut store = MemTables::new(spec(&m, "Ring"));
        store.add_row("O").unwrap();
        assert!(matches!(codec.write_tables(&store), Err(CodecError::BadCell { .. })));
    }
}
