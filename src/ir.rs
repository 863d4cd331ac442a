//! The type algebra. Closed, recursive, no runtime data here.
//!
//! Every backend (codec, schema exporter, code generator) matches on `Ty`
//! exhaustively, so adding a constructor is a compile error everywhere it
//! needs handling.

use std::fmt;

/// Scalar primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prim {
    I32,
    U32,
    I64,
    U64,
    F64,
    Boolean,
    Str,
    Ident,   // interned name
    Binary,  // raw bytes, base64 on the wire
}

impl Prim {
    pub const ALL: [Prim; 9] = [
        Prim::I32, Prim::U32, Prim::I64, Prim::U64, Prim::F64,
        Prim::Boolean, Prim::Str, Prim::Ident, Prim::Binary,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Prim::I32 => "I32",
            Prim::U32 => "U32",
            Prim::I64 => "I64",
            Prim::U64 => "U64",
            Prim::F64 => "F64",
            Prim::Boolean => "Boolean",
            Prim::Str => "Str",
            Prim::Ident => "Ident",
            Prim::Binary => "Binary",
        }
    }

    pub fn from_name(s: &str) -> Option<Prim> {
        Prim::ALL.into_iter().find(|p| p.name() == s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Prim(Prim),
    Optional(Box<Ty>),
    List(Box<Ty>),
    Object(Box<Ty>),         // arbitrary string keys
    Map(Box<Ty>, Box<Ty>),   // arbitrary keys, insertion ordered
    Record(Vec<Field>),      // tuples are records named _1.._n
    Sum(Vec<Variant>),
    Annot(String, Box<Ty>),  // wire-neutral documentation
    Ref(DeclRef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Ty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub tag: String,
    pub fields: Vec<Field>,
}

/// A resolved reference. `slot` indexes the declaration arena of the owning
/// module (the current one, or the import named by `module`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclRef {
    pub module: Option<String>,
    pub name: String,
    pub slot: usize,
}

impl DeclRef {
    /// `Name` or `module.Name`.
    pub fn path(&self) -> String {
        match &self.module {
            Some(m) => format!("{m}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Alias(Ty),
    Struct(Vec<Field>),
    SumType(Vec<Variant>),
    /// A sum tag exported as its own name; points back at the owning sum.
    VariantOf { parent: String, index: usize },
    TableSchema(TableSpec),
}

impl Decl {
    pub fn kind(&self) -> &'static str {
        match self {
            Decl::Alias(_) => "alias",
            Decl::Struct(_) => "struct",
            Decl::SumType(_) => "sum",
            Decl::VariantOf { .. } => "variant",
            Decl::TableSchema(_) => "table",
        }
    }
}

/// Object kinds, typed foreign keys between them, attribute-type pools and
/// typed per-row attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSpec {
    pub objects: Vec<String>,
    pub homs: Vec<Hom>,
    pub attr_types: Vec<AttrType>,
    pub attrs: Vec<Attr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hom {
    pub name: String,
    pub dom: String,
    pub codom: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttrType {
    pub name: String,
    pub ty: Ty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub name: String,
    pub dom: String,
    pub codom: String, // an attribute type
}

impl TableSpec {
    pub fn homs_from<'a>(&'a self, ob: &'a str) -> impl Iterator<Item = &'a Hom> + 'a {
        self.homs.iter().filter(move |h| h.dom == ob)
    }

    pub fn attrs_from<'a>(&'a self, ob: &'a str) -> impl Iterator<Item = &'a Attr> + 'a {
        self.attrs.iter().filter(move |a| a.dom == ob)
    }

    pub fn attr_type(&self, name: &str) -> Option<&AttrType> {
        self.attr_types.iter().find(|t| t.name == name)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// HELPERS
// ————————————————————————————————————————————————————————————————————————————

pub fn ordinal_name(i: usize) -> String {
    format!("_{}", i + 1)
}

/// Records whose names are exactly `_1.._n` are tuples.
pub fn is_tuple(fields: &[Field]) -> bool {
    !fields.is_empty() && fields.iter().enumerate().all(|(i, f)| f.name == ordinal_name(i))
}

impl Ty {
    pub fn prim(p: Prim) -> Ty { Ty::Prim(p) }
    pub fn optional(t: Ty) -> Ty { Ty::Optional(Box::new(t)) }
    pub fn list(t: Ty) -> Ty { Ty::List(Box::new(t)) }
    pub fn object(t: Ty) -> Ty { Ty::Object(Box::new(t)) }
    pub fn map(k: Ty, v: Ty) -> Ty { Ty::Map(Box::new(k), Box::new(v)) }
    pub fn annot(doc: impl Into<String>, t: Ty) -> Ty { Ty::Annot(doc.into(), Box::new(t)) }

    pub fn tuple(elems: Vec<Ty>) -> Ty {
        Ty::Record(
            elems.into_iter().enumerate()
                .map(|(i, ty)| Field { name: ordinal_name(i), ty })
                .collect()
        )
    }

    /// Peel documentation wrappers.
    pub fn strip_annot(&self) -> &Ty {
        let mut t = self;
        while let Ty::Annot(_, inner) = t { t = inner; }
        t
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DISPLAY (surface syntax)
// ————————————————————————————————————————————————————————————————————————————

impl fmt::Display for Prim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn write_fields(f: &mut fmt::Formatter<'_>, fields: &[Field]) -> fmt::Result {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 { f.write_str(", ")?; }
        write!(f, "{} :: {}", field.name, field.ty)?;
    }
    Ok(())
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Prim(p) => write!(f, "{p}"),
            Ty::Optional(t) => write!(f, "Optional({t})"),
            Ty::List(t) => write!(f, "List({t})"),
            Ty::Object(t) => write!(f, "Object({t})"),
            Ty::Map(k, v) => write!(f, "Map({k}, {v})"),
            Ty::Record(fields) if is_tuple(fields) => {
                f.write_str("(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{}", field.ty)?;
                }
                f.write_str(")")
            }
            Ty::Record(fields) => {
                f.write_str("{")?;
                write_fields(f, fields)?;
                f.write_str("}")
            }
            Ty::Sum(variants) => {
                for (i, v) in variants.iter().enumerate() {
                    if i > 0 { f.write_str(" | ")?; }
                    f.write_str(&v.tag)?;
                    if !v.fields.is_empty() {
                        f.write_str("(")?;
                        write_fields(f, &v.fields)?;
                        f.write_str(")")?;
                    }
                }
                Ok(())
            }
            Ty::Annot(doc, t) => write!(f, "Annot({doc:?}, {t})"),
            Ty::Ref(r) => f.write_str(&r.path()),
        }
    }
}
