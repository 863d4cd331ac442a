//! Rust source generator.
//!
//! One pass over a finished module. Every declaration becomes a type plus
//! `PartialEq`, `ToJson` and `FromJson` impls, all rendered from the same
//! field/variant list, so reader, writer and equality cannot drift apart.
//! Generated files depend only on `json_shapes::native`; imported modules are
//! expected as sibling Rust modules (`super::<module>`).

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::ir::{Decl, Field, Prim, TableSpec, Ty, Variant, is_tuple};
use crate::module::Module;

const RT: &str = "__rt";
const RESULT: &str = "::std::result::Result";
const STRING: &str = "::std::string::String";

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while", "abstract", "become", "box", "do", "final", "gen", "macro", "override",
    "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Largest tuple rendered as a Rust tuple; wider ones get a struct.
const MAX_TUPLE: usize = 6;

/// `<module>.rs`
pub fn rust_file_name(module: &Module) -> String {
    format!("{}.rs", module.name)
}

pub fn generate_rust(module: &Module) -> String {
    let mut cg = Codegen::new(module);
    cg.emit_module();
    cg.into_string()
}

/// A Rust identifier for a declared name.
pub fn ident(name: &str) -> String {
    match name {
        "self" | "Self" | "super" | "crate" => format!("{name}_"),
        _ if KEYWORDS.contains(&name) => format!("r#{name}"),
        _ => name.to_owned(),
    }
}

fn camel(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn prim_ty(p: Prim) -> String {
    match p {
        Prim::I32 => "i32".into(),
        Prim::U32 => "u32".into(),
        Prim::I64 => "i64".into(),
        Prim::U64 => "u64".into(),
        Prim::F64 => "f64".into(),
        Prim::Boolean => "bool".into(),
        Prim::Str => STRING.into(),
        Prim::Ident => format!("{RT}::Symbol"),
        Prim::Binary => format!("{RT}::Bytes"),
    }
}

fn docs_of(ty: &Ty) -> Vec<&str> {
    let mut docs = Vec::new();
    let mut t = ty;
    while let Ty::Annot(doc, inner) = t {
        docs.push(doc.as_str());
        t = inner;
    }
    docs
}

/// Local declarations a type holds by value (not behind a container).
fn by_value_refs(ty: &Ty, out: &mut Vec<String>) {
    match ty {
        Ty::Ref(r) if r.module.is_none() => out.push(r.name.clone()),
        Ty::Optional(t) | Ty::Annot(_, t) => by_value_refs(t, out),
        Ty::Record(fields) => fields.iter().for_each(|f| by_value_refs(&f.ty, out)),
        Ty::Sum(variants) => variants.iter()
            .flat_map(|v| &v.fields)
            .for_each(|f| by_value_refs(&f.ty, out)),
        _ => {}
    }
}

/// Every local declaration a type mentions.
fn all_refs(ty: &Ty, out: &mut Vec<String>) {
    match ty {
        Ty::Ref(r) if r.module.is_none() => out.push(r.name.clone()),
        Ty::Ref(_) | Ty::Prim(_) => {}
        Ty::Optional(t) | Ty::Annot(_, t) | Ty::List(t) | Ty::Object(t) => all_refs(t, out),
        Ty::Map(k, v) => {
            all_refs(k, out);
            all_refs(v, out);
        }
        Ty::Record(fields) => fields.iter().for_each(|f| all_refs(&f.ty, out)),
        Ty::Sum(variants) => variants.iter()
            .flat_map(|v| &v.fields)
            .for_each(|f| all_refs(&f.ty, out)),
    }
}

enum Aux {
    Record { name: String, fields: Vec<Field>, owner: String },
    Sum { name: String, variants: Vec<Variant>, owner: String },
}

/// A rendered field: Rust name, wire key, Rust type, docs.
struct FieldOut {
    id: String,
    key: String,
    ty: String,
    docs: Vec<String>,
}

pub struct Codegen<'m> {
    module: &'m Module,
    out: String,
    /// decl -> decls it contains by value
    by_value: HashMap<String, Vec<String>>,
    names: HashSet<String>,
    pending: Vec<Aux>,
}

impl<'m> Codegen<'m> {
    pub fn new(module: &'m Module) -> Self {
        let mut by_value = HashMap::new();
        for (name, decl) in module.decls() {
            let mut refs = Vec::new();
            match decl {
                Decl::Alias(ty) => by_value_refs(ty, &mut refs),
                Decl::Struct(fields) => fields.iter().for_each(|f| by_value_refs(&f.ty, &mut refs)),
                Decl::SumType(variants) => refs.extend(variants.iter().map(|v| v.tag.clone())),
                Decl::VariantOf { parent, index } => {
                    if let Some(v) = module.variant(parent, *index) {
                        v.fields.iter().for_each(|f| by_value_refs(&f.ty, &mut refs));
                    }
                }
                Decl::TableSchema(_) => {}
            }
            by_value.insert(name.to_owned(), refs);
        }
        Self {
            module,
            out: String::new(),
            by_value,
            names: module.decls().map(|(name, _)| name.to_owned()).collect(),
            pending: Vec::new(),
        }
    }

    pub fn into_string(self) -> String {
        self.out
    }

    pub fn emit_module(&mut self) {
        let module = self.module;
        self.out.push_str(&format!(
            "// Generated by json-shapes from module `{}`. Do not edit.\n\n",
            module.name
        ));
        self.out.push_str("#![allow(dead_code, non_camel_case_types, clippy::all)]\n\n");
        self.out.push_str(&format!("use ::json_shapes::native as {RT};\n"));

        for (name, decl) in module.decls() {
            match decl {
                Decl::Alias(ty) => self.emit_alias(name, ty),
                Decl::Struct(fields) => self.emit_record(name, fields, name, None, &[]),
                Decl::SumType(variants) => {
                    let structs: Vec<String> = variants.iter().map(|v| v.tag.clone()).collect();
                    self.emit_sum(name, variants, &structs, None, &[]);
                }
                // emitted together with the parent sum
                Decl::VariantOf { .. } => {}
                Decl::TableSchema(spec) => self.emit_table(name, spec),
            }
            self.flush_aux();
        }
        debug!(module = %module.name, decls = module.len(), bytes = self.out.len(), "generated rust");
    }

    // ---- graph queries ----

    /// Does `from` hold `to` by value, directly or transitively?
    fn reaches(&self, from: &str, to: &str) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(cur) = stack.pop() {
            if cur == to {
                return true;
            }
            if !seen.insert(cur) {
                continue;
            }
            if let Some(next) = self.by_value.get(cur) {
                stack.extend(next.iter().map(String::as_str));
            }
        }
        false
    }

    /// An alias whose expansion mentions itself through other aliases only.
    fn is_recursive_alias(&self, name: &str) -> bool {
        let Some(Decl::Alias(ty)) = self.module.get(name) else { return false };
        let mut stack = Vec::new();
        all_refs(ty, &mut stack);
        let mut seen = HashSet::new();
        while let Some(cur) = stack.pop() {
            if cur == name {
                return true;
            }
            if !seen.insert(cur.clone()) {
                continue;
            }
            if let Some(Decl::Alias(next)) = self.module.get(&cur) {
                all_refs(next, &mut stack);
            }
        }
        false
    }

    fn fresh_name(&mut self, hint: &str) -> String {
        let mut name = hint.to_owned();
        let mut n = 2;
        while self.names.contains(&name) {
            name = format!("{hint}{n}");
            n += 1;
        }
        self.names.insert(name.clone());
        name
    }

    // ---- types ----

    /// Render `ty`. `owner` is the declaration whose by-value cycle needs
    /// breaking; `boxed` is false once the position sits behind a container.
    fn rust_ty(&mut self, ty: &Ty, owner: &str, hint: &str, boxed: bool) -> String {
        match ty {
            Ty::Prim(p) => prim_ty(*p),
            Ty::Annot(_, t) => self.rust_ty(t, owner, hint, boxed),
            Ty::Optional(t) => format!("::std::option::Option<{}>", self.rust_ty(t, owner, hint, boxed)),
            Ty::List(t) => format!("::std::vec::Vec<{}>", self.rust_ty(t, owner, hint, false)),
            Ty::Object(t) => format!("{RT}::IndexMap<{STRING}, {}>", self.rust_ty(t, owner, hint, false)),
            Ty::Map(k, v) => {
                let k = self.rust_ty(k, owner, &format!("{hint}Key"), false);
                let v = self.rust_ty(v, owner, &format!("{hint}Value"), false);
                format!("{RT}::OrderedMap<{k}, {v}>")
            }
            Ty::Record(fields) if is_tuple(fields) && fields.len() <= MAX_TUPLE => {
                let elems: Vec<String> = fields.iter()
                    .map(|f| self.rust_ty(&f.ty, owner, hint, boxed))
                    .collect();
                if elems.len() == 1 {
                    format!("({},)", elems[0])
                } else {
                    format!("({})", elems.join(", "))
                }
            }
            Ty::Record(fields) => {
                let name = self.fresh_name(hint);
                self.pending.push(Aux::Record { name: name.clone(), fields: fields.clone(), owner: owner.to_owned() });
                name
            }
            Ty::Sum(variants) => {
                let name = self.fresh_name(hint);
                self.pending.push(Aux::Sum { name: name.clone(), variants: variants.clone(), owner: owner.to_owned() });
                name
            }
            Ty::Ref(r) => {
                let path = match &r.module {
                    Some(m) => format!("super::{}::{}", ident(m), ident(&r.name)),
                    None => ident(&r.name),
                };
                if boxed && r.module.is_none() && self.reaches(&r.name, owner) {
                    format!("::std::boxed::Box<{path}>")
                } else {
                    path
                }
            }
        }
    }

    fn fields_out(&mut self, owner_type: &str, fields: &[Field], owner: &str) -> Vec<FieldOut> {
        fields.iter()
            .map(|f| FieldOut {
                id: ident(&f.name),
                key: f.name.clone(),
                ty: self.rust_ty(&f.ty, owner, &format!("{owner_type}{}", camel(&f.name)), true),
                docs: docs_of(&f.ty).into_iter().map(str::to_owned).collect(),
            })
            .collect()
    }

    fn flush_aux(&mut self) {
        while !self.pending.is_empty() {
            for aux in std::mem::take(&mut self.pending) {
                match aux {
                    Aux::Record { name, fields, owner } => self.emit_record(&name, &fields, &owner, None, &[]),
                    Aux::Sum { name, variants, owner } => {
                        let structs: Vec<String> = variants.iter()
                            .map(|v| self.fresh_name(&format!("{name}{}", v.tag)))
                            .collect();
                        self.emit_sum(&name, &variants, &structs, Some(&owner), &[]);
                    }
                }
            }
        }
    }

    // ---- items ----

    fn push_docs(&mut self, indent: &str, docs: &[String]) {
        for doc in docs {
            for line in doc.lines() {
                self.out.push_str(&format!("{indent}/// {line}\n"));
            }
        }
    }

    /// A struct for a record or a variant (`tag` = `(sum, tag)`).
    fn emit_record(&mut self, name: &str, fields: &[Field], owner: &str, tag: Option<(&str, &str)>, docs: &[String]) {
        let ty_name = ident(name);
        let fields = self.fields_out(name, fields, owner);

        self.out.push('\n');
        self.push_docs("", docs);
        self.out.push_str("#[derive(Debug, Clone)]\n");
        self.out.push_str(&format!("pub struct {ty_name} {{\n"));
        for f in &fields {
            self.push_docs("    ", &f.docs);
            self.out.push_str(&format!("    pub {}: {},\n", f.id, f.ty));
        }
        self.out.push_str("}\n\n");

        // equality
        let other = if fields.is_empty() { "_other" } else { "other" };
        let eq = if fields.is_empty() {
            "true".to_owned()
        } else {
            fields.iter()
                .map(|f| format!("self.{0} == other.{0}", f.id))
                .collect::<Vec<_>>()
                .join("\n            && ")
        };
        self.out.push_str(&format!(
            "impl ::std::cmp::PartialEq for {ty_name} {{\n    fn eq(&self, {other}: &Self) -> bool {{\n        {eq}\n    }}\n}}\n\n"
        ));

        // writer
        let build = match tag {
            Some((_, tag)) => format!("{RT}::tagged({tag:?}, ["),
            None => format!("{RT}::object(["),
        };
        self.out.push_str(&format!("impl {RT}::ToJson for {ty_name} {{\n"));
        self.out.push_str(&format!("    fn to_json(&self) -> {RESULT}<{RT}::Json, {RT}::CodecError> {{\n"));
        self.out.push_str(&format!("        {RESULT}::Ok({build}\n"));
        for f in &fields {
            self.out.push_str(&format!("            ({:?}, {RT}::ToJson::to_json(&self.{})?),\n", f.key, f.id));
        }
        self.out.push_str("        ]))\n    }\n}\n\n");

        // reader
        let keys = fields.iter().map(|f| format!("{:?}", f.key)).collect::<Vec<_>>().join(", ");
        self.out.push_str(&format!("impl {RT}::FromJson for {ty_name} {{\n"));
        self.out.push_str(&format!("    fn expected() -> {STRING} {{\n        {STRING}::from({name:?})\n    }}\n\n"));
        self.out.push_str(&format!(
            "    fn read_json(json: &{RT}::Json, cx: &mut {RT}::ReadCx) -> {RESULT}<Self, {RT}::CodecError> {{\n"
        ));
        if let Some((sum, tag)) = tag {
            self.out.push_str(&format!("        {RT}::expect_tag(json, {sum:?}, {tag:?})?;\n"));
        }
        let binding = if fields.is_empty() { "" } else { "let obj = " };
        self.out.push_str(&format!(
            "        {binding}{RT}::expect_record(json, {name:?}, {}, &[{keys}])?;\n",
            tag.is_some()
        ));
        if fields.is_empty() {
            self.out.push_str(&format!("        cx.nested(|_| {RESULT}::Ok(Self {{}}))\n"));
        } else {
            self.out.push_str(&format!("        cx.nested(|cx| {RESULT}::Ok(Self {{\n"));
            for f in &fields {
                self.out.push_str(&format!("            {}: {RT}::field(obj, {:?}, cx)?,\n", f.id, f.key));
            }
            self.out.push_str("        }))\n");
        }
        self.out.push_str("    }\n}\n");
    }

    /// One struct per variant, then the parent enum dispatching on `_type`.
    /// Declared variants are their own by-value owners; inline ones share
    /// `owner`.
    fn emit_sum(&mut self, name: &str, variants: &[Variant], structs: &[String], owner: Option<&str>, docs: &[String]) {
        for (v, s) in variants.iter().zip(structs) {
            self.emit_record(s, &v.fields, owner.unwrap_or(s), Some((name, &v.tag)), &[]);
        }
        let ty_name = ident(name);
        let arms: Vec<(String, String, &str)> = variants.iter()
            .zip(structs)
            .map(|(v, s)| (ident(&v.tag), ident(s), v.tag.as_str()))
            .collect();

        self.out.push('\n');
        self.push_docs("", docs);
        self.out.push_str(&format!("#[derive(Debug, Clone)]\npub enum {ty_name} {{\n"));
        for (arm, s, _) in &arms {
            self.out.push_str(&format!("    {arm}({s}),\n"));
        }
        self.out.push_str("}\n\n");

        self.out.push_str(&format!("impl ::std::cmp::PartialEq for {ty_name} {{\n"));
        self.out.push_str("    #[allow(unreachable_patterns)]\n");
        self.out.push_str("    fn eq(&self, other: &Self) -> bool {\n        match (self, other) {\n");
        for (arm, _, _) in &arms {
            self.out.push_str(&format!("            (Self::{arm}(a), Self::{arm}(b)) => a == b,\n"));
        }
        self.out.push_str("            _ => false,\n        }\n    }\n}\n\n");

        self.out.push_str(&format!("impl {RT}::ToJson for {ty_name} {{\n"));
        self.out.push_str(&format!("    fn to_json(&self) -> {RESULT}<{RT}::Json, {RT}::CodecError> {{\n        match self {{\n"));
        for (arm, _, _) in &arms {
            self.out.push_str(&format!("            Self::{arm}(v) => {RT}::ToJson::to_json(v),\n"));
        }
        self.out.push_str("        }\n    }\n}\n\n");

        self.out.push_str(&format!("impl {RT}::FromJson for {ty_name} {{\n"));
        self.out.push_str(&format!("    fn expected() -> {STRING} {{\n        {STRING}::from({name:?})\n    }}\n\n"));
        self.out.push_str(&format!(
            "    fn read_json(json: &{RT}::Json, cx: &mut {RT}::ReadCx) -> {RESULT}<Self, {RT}::CodecError> {{\n"
        ));
        self.out.push_str(&format!("        let tag = {RT}::discriminator(json, {name:?})?;\n"));
        for (arm, s, tag) in &arms {
            self.out.push_str(&format!(
                "        if tag == {tag:?} {{\n            return <{s} as {RT}::FromJson>::read_json(json, cx).map(Self::{arm});\n        }}\n"
            ));
        }
        self.out.push_str(&format!(
            "        {RESULT}::Err({RT}::CodecError::UnknownTag {{\n            sum: {STRING}::from({name:?}),\n            tag: {STRING}::from(tag),\n        }})\n"
        ));
        self.out.push_str("    }\n}\n");
    }

    fn emit_alias(&mut self, name: &str, ty: &Ty) {
        let docs: Vec<String> = docs_of(ty).into_iter().map(str::to_owned).collect();
        match ty.strip_annot() {
            // an inline record or sum takes the alias name itself
            Ty::Record(fields) if !(is_tuple(fields) && fields.len() <= MAX_TUPLE) => {
                return self.emit_record(name, fields, name, None, &docs);
            }
            Ty::Sum(variants) => {
                let structs: Vec<String> = variants.iter()
                    .map(|v| self.fresh_name(&format!("{name}{}", v.tag)))
                    .collect();
                return self.emit_sum(name, variants, &structs, Some(name), &docs);
            }
            _ => {}
        }

        let ty_name = ident(name);
        self.out.push('\n');
        self.push_docs("", &docs);
        if !self.is_recursive_alias(name) {
            let rendered = self.rust_ty(ty, name, name, false);
            self.out.push_str(&format!("pub type {ty_name} = {rendered};\n"));
            return;
        }

        let inner = self.rust_ty(ty, name, name, true);
        self.out.push_str(&format!("#[derive(Debug, Clone, PartialEq)]\npub struct {ty_name}(pub {inner});\n\n"));
        self.out.push_str(&format!("impl {RT}::ToJson for {ty_name} {{\n"));
        self.out.push_str(&format!(
            "    fn to_json(&self) -> {RESULT}<{RT}::Json, {RT}::CodecError> {{\n        {RT}::ToJson::to_json(&self.0)\n    }}\n}}\n\n"
        ));
        self.out.push_str(&format!("impl {RT}::FromJson for {ty_name} {{\n"));
        self.out.push_str(&format!("    fn expected() -> {STRING} {{\n        {STRING}::from({name:?})\n    }}\n\n"));
        self.out.push_str(&format!(
            "    fn read_json(json: &{RT}::Json, cx: &mut {RT}::ReadCx) -> {RESULT}<Self, {RT}::CodecError> {{\n"
        ));
        self.out.push_str(&format!("        cx.nested(|cx| {RT}::FromJson::read_json(json, cx).map(Self))\n    }}\n}}\n"));
    }

    /// Tables are described, not stored: a marker type with name constants.
    fn emit_table(&mut self, name: &str, spec: &TableSpec) {
        let quoted = |xs: Vec<&str>| xs.iter().map(|x| format!("{x:?}")).collect::<Vec<_>>().join(", ");
        let triples = |xs: Vec<(&str, &str, &str)>| {
            xs.iter().map(|(a, b, c)| format!("({a:?}, {b:?}, {c:?})")).collect::<Vec<_>>().join(", ")
        };
        let obs = quoted(spec.objects.iter().map(String::as_str).collect());
        let homs = triples(spec.homs.iter().map(|h| (h.name.as_str(), h.dom.as_str(), h.codom.as_str())).collect());
        let attr_types = quoted(spec.attr_types.iter().map(|a| a.name.as_str()).collect());
        let attrs = triples(spec.attrs.iter().map(|a| (a.name.as_str(), a.dom.as_str(), a.codom.as_str())).collect());

        let ty_name = ident(name);
        self.out.push_str(&format!("\n#[derive(Debug, Clone, Copy, PartialEq, Eq)]\npub struct {ty_name};\n\n"));
        self.out.push_str(&format!("impl {ty_name} {{\n"));
        self.out.push_str(&format!("    pub const OBJECTS: &'static [&'static str] = &[{obs}];\n"));
        self.out.push_str("    /// (name, domain, codomain)\n");
        self.out.push_str(&format!("    pub const HOMS: &'static [(&'static str, &'static str, &'static str)] = &[{homs}];\n"));
        self.out.push_str(&format!("    pub const ATTR_TYPES: &'static [&'static str] = &[{attr_types}];\n"));
        self.out.push_str("    /// (name, domain, attribute type)\n");
        self.out.push_str(&format!("    pub const ATTRS: &'static [(&'static str, &'static str, &'static str)] = &[{attrs}];\n"));
        self.out.push_str("}\n");
    }
}
