//! IR → JSON Schema (draft-07).
//!
//! Schemas describe what the codec writes. Readers are a little more lenient
//! than the schema (64-bit integers also read from bare numbers).

use std::collections::HashSet;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::ir::{Decl, DeclRef, Field, Prim, TableSpec, Ty, Variant};
use crate::lower::{DISCRIMINATOR, ROW_ID};
use crate::module::Module;
use crate::table::VAR;

pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// `<module>_schema.json`
pub fn schema_file_name(module: &Module) -> String {
    format!("{}_schema.json", module.name)
}

/// Schema fragment for a type. References point at `#/$defs/<name>`
/// (`<module>.<name>` for imports).
pub fn type_schema(ty: &Ty) -> Value {
    Exporter { prefix: None }.ty(ty)
}

/// A self-contained draft-07 document with one `$defs` entry per declaration
/// of `module` and of every module it imports, directly or not.
pub fn module_schema(module: &Module) -> Value {
    let mut defs = Map::new();
    Exporter { prefix: None }.defs(module, &mut defs);

    let mut seen = HashSet::new();
    let mut queue: Vec<&Module> = module.imports.values().map(|m| m.as_ref()).collect();
    while let Some(imported) = queue.pop() {
        if !seen.insert(imported.name.as_str()) {
            continue;
        }
        Exporter { prefix: Some(&imported.name) }.defs(imported, &mut defs);
        queue.extend(imported.imports.values().map(|m| m.as_ref()));
    }

    debug!(module = %module.name, defs = defs.len(), "exported schema");
    json!({
        "$schema": DRAFT_07,
        "title": module.name,
        "$defs": Value::Object(defs),
    })
}

// ————————————————————————————————————————————————————————————————————————————
// EXPORTER
// ————————————————————————————————————————————————————————————————————————————

struct Exporter<'a> {
    /// Set while exporting an imported module: its local names become `prefix.Name`.
    prefix: Option<&'a str>,
}

fn def_ref(key: &str) -> Value {
    json!({ "$ref": format!("#/$defs/{key}") })
}

fn obj_of(props: Vec<(String, Value)>) -> Value {
    let required: Vec<Value> = props.iter().map(|(k, _)| Value::from(k.as_str())).collect();
    json!({
        "type": "object",
        "properties": Value::Object(props.into_iter().collect()),
        "required": required,
        "additionalProperties": false,
    })
}

fn prim(p: Prim) -> Value {
    let mut o = match p {
        Prim::I32 => json!({ "type": "integer", "minimum": i32::MIN, "maximum": i32::MAX }),
        Prim::U32 => json!({ "type": "integer", "minimum": 0, "maximum": u32::MAX }),
        Prim::I64 => json!({ "type": "string", "pattern": "^-?[0-9]+$" }),
        Prim::U64 => json!({ "type": "string", "pattern": "^[0-9]+$" }),
        Prim::F64 => json!({ "type": "number" }),
        Prim::Boolean => json!({ "type": "boolean" }),
        Prim::Str | Prim::Ident => json!({ "type": "string" }),
        Prim::Binary => json!({ "type": "string", "contentEncoding": "base64" }),
    };
    o["$comment"] = Value::from(p.name());
    o
}

fn nullable(mut inner: Value) -> Value {
    let widened = match inner.get("type") {
        Some(Value::String(t)) => Some(json!([t, "null"])),
        Some(Value::Array(types)) if types.iter().any(|t| t == "null") => Some(Value::Array(types.clone())),
        Some(Value::Array(types)) => {
            let mut types = types.clone();
            types.push(Value::from("null"));
            Some(Value::Array(types))
        }
        _ => None,
    };
    match widened {
        Some(types) => {
            inner["type"] = types;
            inner
        }
        None => json!({ "anyOf": [inner, { "type": "null" }] }),
    }
}

fn row_id() -> Value {
    prim(Prim::U32)
}

impl Exporter<'_> {
    fn key(&self, r: &DeclRef) -> String {
        match &r.module {
            Some(m) => format!("{m}.{}", r.name),
            None => self.local_key(&r.name),
        }
    }

    fn local_key(&self, name: &str) -> String {
        match self.prefix {
            Some(p) => format!("{p}.{name}"),
            None => name.to_owned(),
        }
    }

    fn ty(&self, ty: &Ty) -> Value {
        match ty {
            Ty::Prim(p) => prim(*p),
            Ty::Optional(inner) => nullable(self.ty(inner)),
            Ty::List(item) => json!({ "type": "array", "items": self.ty(item) }),
            Ty::Object(item) => json!({ "type": "object", "additionalProperties": self.ty(item) }),
            Ty::Map(k, v) => json!({
                "type": "array",
                "items": obj_of(vec![("key".into(), self.ty(k)), ("value".into(), self.ty(v))]),
            }),
            Ty::Record(fields) => self.record(fields),
            Ty::Sum(variants) => json!({
                "oneOf": variants.iter().map(|v| self.variant(v)).collect::<Vec<_>>()
            }),
            Ty::Annot(doc, inner) => {
                let mut o = self.ty(inner);
                // draft-07 ignores siblings of `$ref`
                if o.get("$ref").is_some() {
                    o = json!({ "allOf": [o] });
                }
                if let Value::Object(map) = &mut o {
                    map.insert("description".into(), Value::from(doc.as_str()));
                }
                o
            }
            Ty::Ref(r) => def_ref(&self.key(r)),
        }
    }

    fn record(&self, fields: &[Field]) -> Value {
        obj_of(fields.iter().map(|f| (f.name.clone(), self.ty(&f.ty))).collect())
    }

    fn variant(&self, v: &Variant) -> Value {
        let mut props = vec![(DISCRIMINATOR.to_owned(), json!({ "const": v.tag }))];
        props.extend(v.fields.iter().map(|f| (f.name.clone(), self.ty(&f.ty))));
        obj_of(props)
    }

    fn table(&self, spec: &TableSpec) -> Value {
        let mut props = Vec::with_capacity(spec.objects.len() + spec.attr_types.len());
        for ob in &spec.objects {
            let mut row = vec![(ROW_ID.to_owned(), row_id())];
            row.extend(spec.homs_from(ob).map(|h| (h.name.clone(), row_id())));
            for a in spec.attrs_from(ob) {
                let Some(at) = spec.attr_type(&a.codom) else { continue };
                let placeholder = obj_of(vec![(VAR.to_owned(), row_id())]);
                row.push((a.name.clone(), json!({ "anyOf": [self.ty(&at.ty), placeholder] })));
            }
            props.push((ob.clone(), json!({ "type": "array", "items": obj_of(row) })));
        }
        let required: Vec<Value> = spec.objects.iter().map(|o| Value::from(o.as_str())).collect();
        for at in &spec.attr_types {
            let slot = obj_of(vec![(ROW_ID.to_owned(), row_id())]);
            props.push((at.name.clone(), json!({ "type": "array", "items": slot })));
        }
        json!({
            "type": "object",
            "properties": Value::Object(props.into_iter().collect()),
            "required": required,
            "additionalProperties": false,
        })
    }

    fn decl(&self, module: &Module, decl: &Decl) -> Value {
        match decl {
            Decl::Alias(ty) => self.ty(ty),
            Decl::Struct(fields) => self.record(fields),
            Decl::SumType(variants) => json!({
                "oneOf": variants.iter()
                    .map(|v| def_ref(&self.local_key(&v.tag)))
                    .collect::<Vec<_>>()
            }),
            Decl::VariantOf { parent, index } => match module.variant(parent, *index) {
                Some(v) => self.variant(v),
                None => json!({}),
            },
            Decl::TableSchema(spec) => self.table(spec),
        }
    }

    fn defs(&self, module: &Module, out: &mut Map<String, Value>) {
        for (name, decl) in module.decls() {
            out.insert(self.local_key(name), self.decl(module, decl));
        }
    }
}
