//! The JSON codec engine.
//!
//! Wire contract, shared with the native runtime in `native`:
//! - I32/U32/F64 are bare numbers; I64/U64 are decimal strings (bare
//!   integers are accepted on read, never written).
//! - Binary is base64 text.
//! - Map(K, V) is an array of `{"key", "value"}` objects, in insertion order.
//! - Object(T) is a JSON object, in property order.
//! - Records are objects with exactly the declared keys; variants add `_type`
//!   first.
//!
//! A bare integer beyond 2^53 may already have lost precision in whatever
//! produced it; reading it back cannot detect that.
pub mod native;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as Json};
use tracing::trace;

use crate::error::CodecError;
use crate::ir::{Decl, Field, Prim, Ty, Variant};
use crate::lower::DISCRIMINATOR;
use crate::module::Module;
use crate::value::{Interner, OrderedMapBuilder, Symbol, Value};
use native::{discriminator, expect_record, expect_tag};

pub const DEFAULT_MAX_DEPTH: usize = 128;

static SIGNED_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[0-9]+$").unwrap());
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    /// Deepest nesting of containers and references a read will follow.
    pub max_depth: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// READ CONTEXT
// ————————————————————————————————————————————————————————————————————————————

/// Per-read state: the recursion guard and the identifier interner.
#[derive(Debug)]
pub struct ReadCx {
    depth: usize,
    max_depth: usize,
    interner: Interner,
}

impl Default for ReadCx {
    fn default() -> Self {
        Self::new(&CodecOptions::default())
    }
}

impl ReadCx {
    pub fn new(options: &CodecOptions) -> Self {
        Self { depth: 0, max_depth: options.max_depth, interner: Interner::default() }
    }

    /// Run `f` one level deeper, failing instead of recursing past the limit.
    pub fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, CodecError>,
    ) -> Result<T, CodecError> {
        if self.depth >= self.max_depth {
            return Err(CodecError::DepthLimit { limit: self.max_depth });
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        self.interner.intern(s)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SCALARS
// ————————————————————————————————————————————————————————————————————————————

pub(crate) fn read_i32(json: &Json) -> Option<i32> {
    json.as_i64().and_then(|v| i32::try_from(v).ok())
}

pub(crate) fn read_u32(json: &Json) -> Option<u32> {
    json.as_u64().and_then(|v| u32::try_from(v).ok())
}

pub(crate) fn read_i64(json: &Json) -> Option<i64> {
    match json {
        Json::String(s) if SIGNED_DIGITS.is_match(s) => s.parse().ok(),
        Json::Number(n) => n.as_i64(),
        _ => None,
    }
}

pub(crate) fn read_u64(json: &Json) -> Option<u64> {
    match json {
        Json::String(s) if DIGITS.is_match(s) => s.parse().ok(),
        Json::Number(n) => n.as_u64(),
        _ => None,
    }
}

pub(crate) fn read_f64(json: &Json) -> Option<f64> {
    match json {
        Json::Number(n) => n.as_f64(),
        _ => None,
    }
}

pub(crate) fn read_binary(json: &Json) -> Option<Vec<u8>> {
    STANDARD.decode(json.as_str()?).ok()
}

pub(crate) fn write_f64(v: f64) -> Result<Json, CodecError> {
    serde_json::Number::from_f64(v)
        .map(Json::Number)
        .ok_or(CodecError::NonFinite(v))
}

pub(crate) fn write_binary(bytes: &[u8]) -> Json {
    Json::String(STANDARD.encode(bytes))
}

fn read_prim(p: Prim, json: &Json, cx: &mut ReadCx) -> Result<Value, CodecError> {
    let bad = || CodecError::conversion(p, json);
    Ok(match p {
        Prim::I32 => Value::I32(read_i32(json).ok_or_else(bad)?),
        Prim::U32 => Value::U32(read_u32(json).ok_or_else(bad)?),
        Prim::I64 => Value::I64(read_i64(json).ok_or_else(bad)?),
        Prim::U64 => Value::U64(read_u64(json).ok_or_else(bad)?),
        Prim::F64 => Value::F64(read_f64(json).ok_or_else(bad)?),
        Prim::Boolean => Value::Bool(json.as_bool().ok_or_else(bad)?),
        Prim::Str => Value::Str(json.as_str().ok_or_else(bad)?.to_owned()),
        Prim::Ident => Value::Ident(cx.intern(json.as_str().ok_or_else(bad)?)),
        Prim::Binary => Value::Binary(read_binary(json).ok_or_else(bad)?.into()),
    })
}

fn prim_matches(p: Prim, value: &Value) -> bool {
    matches!(
        (p, value),
        (Prim::I32, Value::I32(_))
            | (Prim::U32, Value::U32(_))
            | (Prim::I64, Value::I64(_))
            | (Prim::U64, Value::U64(_))
            | (Prim::F64, Value::F64(_))
            | (Prim::Boolean, Value::Bool(_))
            | (Prim::Str, Value::Str(_))
            | (Prim::Ident, Value::Ident(_))
            | (Prim::Binary, Value::Binary(_))
    )
}

pub(crate) fn map_entry(key: Json, value: Json) -> Json {
    let mut entry = JsonMap::with_capacity(2);
    entry.insert("key".to_owned(), key);
    entry.insert("value".to_owned(), value);
    Json::Object(entry)
}

/// Canonical text of an encoded map key. Equal keys give equal text: object
/// properties are sorted and `-0.0` is written as `0`.
pub(crate) fn key_identity(json: &Json) -> String {
    fn canonical(json: &Json) -> Json {
        match json {
            Json::Number(n) if n.as_f64() == Some(0.0) => Json::from(0),
            Json::Array(xs) => Json::Array(xs.iter().map(canonical).collect()),
            Json::Object(props) => {
                let mut sorted: Vec<_> = props.iter().collect();
                sorted.sort_by(|a, b| a.0.cmp(b.0));
                Json::Object(sorted.into_iter().map(|(k, v)| (k.clone(), canonical(v))).collect())
            }
            other => other.clone(),
        }
    }
    canonical(json).to_string()
}

// ————————————————————————————————————————————————————————————————————————————
// VALUE-DIRECTED ENCODING
// ————————————————————————————————————————————————————————————————————————————

/// Encode a value using the shape it carries. Fields are written in the
/// value's own order; use `Codec::encode_as` to write in declared order.
pub fn encode(value: &Value) -> Result<Json, CodecError> {
    Ok(match value {
        Value::I32(v) => Json::from(*v),
        Value::U32(v) => Json::from(*v),
        Value::I64(v) => Json::String(v.to_string()),
        Value::U64(v) => Json::String(v.to_string()),
        Value::F64(v) => write_f64(*v)?,
        Value::Bool(b) => Json::Bool(*b),
        Value::Str(s) => Json::String(s.clone()),
        Value::Ident(s) => Json::String(s.as_str().to_owned()),
        Value::Binary(b) => write_binary(b),
        Value::Optional(None) => Json::Null,
        Value::Optional(Some(v)) => encode(v)?,
        Value::List(xs) => Json::Array(xs.iter().map(encode).collect::<Result<_, _>>()?),
        Value::Object(m) | Value::Record(m) => Json::Object(encode_fields(m, None)?),
        Value::Map(m) => Json::Array(
            m.iter()
                .map(|(k, v)| Ok(map_entry(encode(k)?, encode(v)?)))
                .collect::<Result<_, CodecError>>()?,
        ),
        Value::Variant { tag, fields } => Json::Object(encode_fields(fields, Some(tag))?),
    })
}

pub fn encode_to_string(value: &Value) -> Result<String, CodecError> {
    Ok(serde_json::to_string(&encode(value)?)?)
}

fn encode_fields(fields: &IndexMap<String, Value>, tag: Option<&str>) -> Result<JsonMap<String, Json>, CodecError> {
    let mut out = JsonMap::with_capacity(fields.len() + 1);
    if let Some(tag) = tag {
        out.insert(DISCRIMINATOR.to_owned(), Json::String(tag.to_owned()));
    }
    for (k, v) in fields {
        out.insert(k.clone(), encode(v)?);
    }
    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// CODEC
// ————————————————————————————————————————————————————————————————————————————

/// Type-directed reading, writing and equality over a finalized module.
/// Holds no mutable state; share it freely.
#[derive(Debug, Clone, Copy)]
pub struct Codec<'m> {
    module: &'m Module,
    options: CodecOptions,
}

impl<'m> Codec<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self::with_options(module, CodecOptions::default())
    }

    pub fn with_options(module: &'m Module, options: CodecOptions) -> Self {
        Self { module, options }
    }

    pub fn module(&self) -> &'m Module {
        self.module
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    pub fn decode(&self, ty: &Ty, json: &Json) -> Result<Value, CodecError> {
        let mut cx = ReadCx::new(&self.options);
        self.read(self.module, ty, json, &mut cx)
    }

    pub fn decode_str(&self, ty: &Ty, text: &str) -> Result<Value, CodecError> {
        let json: Json = serde_json::from_str(text)?;
        self.decode(ty, &json)
    }

    /// Decode against a declaration given as `Name` or `module.Name`.
    pub fn decode_named(&self, path: &str, json: &Json) -> Result<Value, CodecError> {
        self.decode(&self.named(path)?, json)
    }

    pub fn named(&self, path: &str) -> Result<Ty, CodecError> {
        self.module.lookup(path)
            .map(Ty::Ref)
            .ok_or_else(|| CodecError::UnknownType(path.to_owned()))
    }

    /// Write `value` as `ty`, in declared field order, checking it fits.
    pub fn encode_as(&self, ty: &Ty, value: &Value) -> Result<Json, CodecError> {
        self.write(self.module, ty, value)
    }

    pub fn encode_as_string(&self, ty: &Ty, value: &Value) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&self.encode_as(ty, value)?)?)
    }

    /// Structural equality under `ty`: records field-wise in declared order,
    /// sums tag first.
    pub fn equals(&self, ty: &Ty, a: &Value, b: &Value) -> bool {
        self.eq(self.module, ty, a, b)
    }

    pub(crate) fn resolve<'a>(&self, cur: &'a Module, r: &crate::ir::DeclRef) -> Result<(&'a Module, &'a Decl), CodecError> {
        cur.resolve(r).ok_or_else(|| CodecError::UnknownType(r.path()))
    }

    // ---- read ----

    pub(crate) fn read(&self, cur: &Module, ty: &Ty, json: &Json, cx: &mut ReadCx) -> Result<Value, CodecError> {
        match ty {
            Ty::Prim(p) => read_prim(*p, json, cx),
            Ty::Annot(_, inner) => self.read(cur, inner, json, cx),
            Ty::Optional(inner) => match json {
                Json::Null => Ok(Value::Optional(None)),
                _ => Ok(Value::some(self.read(cur, inner, json, cx)?)),
            },
            _ => cx.nested(|cx| self.read_nested(cur, ty, json, cx)),
        }
    }

    fn read_nested(&self, cur: &Module, ty: &Ty, json: &Json, cx: &mut ReadCx) -> Result<Value, CodecError> {
        match (ty, json) {
            (Ty::List(item), Json::Array(xs)) => xs.iter()
                .map(|x| self.read(cur, item, x, cx))
                .collect::<Result<_, _>>()
                .map(Value::List),
            (Ty::Object(item), Json::Object(props)) => props.iter()
                .map(|(k, x)| Ok((k.clone(), self.read(cur, item, x, cx)?)))
                .collect::<Result<_, CodecError>>()
                .map(Value::Object),
            (Ty::Map(k, v), Json::Array(entries)) => {
                let mut out = OrderedMapBuilder::with_capacity(entries.len());
                for entry in entries {
                    let entry = expect_record(entry, "map entry", false, &["key", "value"])?;
                    let key = self.read(cur, k, &entry["key"], cx)?;
                    let value = self.read(cur, v, &entry["value"], cx)?;
                    out.insert(key_identity(&encode(&key)?), key, value);
                }
                Ok(Value::Map(out.finish()))
            }
            (Ty::Record(fields), _) => {
                let context = ty.to_string();
                Ok(Value::Record(self.read_fields(cur, &context, fields, json, false, cx)?))
            }
            (Ty::Sum(variants), _) => self.read_sum(cur, &ty.to_string(), variants, json, cx),
            (Ty::Ref(r), _) => {
                let (owner, decl) = self.resolve(cur, r)?;
                trace!(decl = %r.path(), depth = cx.depth(), "read");
                self.read_decl(owner, &r.name, decl, json, cx)
            }
            _ => Err(CodecError::conversion(ty, json)),
        }
    }

    fn read_decl(&self, owner: &Module, name: &str, decl: &Decl, json: &Json, cx: &mut ReadCx) -> Result<Value, CodecError> {
        match decl {
            Decl::Alias(ty) => self.read(owner, ty, json, cx),
            Decl::Struct(fields) => Ok(Value::Record(self.read_fields(owner, name, fields, json, false, cx)?)),
            Decl::SumType(variants) => self.read_sum(owner, name, variants, json, cx),
            Decl::VariantOf { parent, index } => {
                let variant = owner.variant(parent, *index)
                    .ok_or_else(|| CodecError::UnknownType(name.to_owned()))?;
                expect_tag(json, parent, &variant.tag)?;
                let fields = self.read_fields(owner, &variant.tag, &variant.fields, json, true, cx)?;
                Ok(Value::Variant { tag: variant.tag.clone(), fields })
            }
            Decl::TableSchema(_) => Err(CodecError::Unsupported(format!(
                "`{name}` is a table schema; use the table codec"
            ))),
        }
    }

    /// Exactly the declared keys (plus `_type` when `tagged`), each decoded
    /// by its declared type, kept in declared order.
    fn read_fields(
        &self,
        owner: &Module,
        context: &str,
        fields: &[Field],
        json: &Json,
        tagged: bool,
        cx: &mut ReadCx,
    ) -> Result<IndexMap<String, Value>, CodecError> {
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        let obj = expect_record(json, context, tagged, &names)?;
        let mut out = IndexMap::with_capacity(fields.len());
        for f in fields {
            out.insert(f.name.clone(), self.read(owner, &f.ty, &obj[&f.name], cx)?);
        }
        Ok(out)
    }

    /// Compare the discriminator against each tag in declaration order.
    fn read_sum(
        &self,
        owner: &Module,
        sum: &str,
        variants: &[Variant],
        json: &Json,
        cx: &mut ReadCx,
    ) -> Result<Value, CodecError> {
        let tag = discriminator(json, sum)?;
        for v in variants {
            if v.tag == tag {
                let fields = self.read_fields(owner, &v.tag, &v.fields, json, true, cx)?;
                return Ok(Value::Variant { tag: v.tag.clone(), fields });
            }
        }
        Err(CodecError::UnknownTag { sum: sum.to_owned(), tag: tag.to_owned() })
    }

    // ---- write ----

    fn write(&self, cur: &Module, ty: &Ty, value: &Value) -> Result<Json, CodecError> {
        let mismatch = || CodecError::ValueMismatch { expected: ty.to_string(), found: value.kind() };
        match (ty, value) {
            (Ty::Prim(p), _) if prim_matches(*p, value) => encode(value),
            (Ty::Annot(_, inner), _) => self.write(cur, inner, value),
            (Ty::Optional(_), Value::Optional(None)) => Ok(Json::Null),
            (Ty::Optional(inner), Value::Optional(Some(v))) => self.write(cur, inner, v),
            (Ty::List(item), Value::List(xs)) => xs.iter()
                .map(|x| self.write(cur, item, x))
                .collect::<Result<_, _>>()
                .map(Json::Array),
            (Ty::Object(item), Value::Object(props)) => props.iter()
                .map(|(k, x)| Ok((k.clone(), self.write(cur, item, x)?)))
                .collect::<Result<_, CodecError>>()
                .map(Json::Object),
            (Ty::Map(k, v), Value::Map(m)) => m.iter()
                .map(|(key, val)| Ok(map_entry(self.write(cur, k, key)?, self.write(cur, v, val)?)))
                .collect::<Result<_, CodecError>>()
                .map(Json::Array),
            (Ty::Record(fields), Value::Record(m)) => {
                self.write_fields(cur, fields, m, None).map(Json::Object)
            }
            (Ty::Sum(variants), Value::Variant { tag, fields }) => {
                self.write_variant(cur, &ty.to_string(), variants, tag, fields)
            }
            (Ty::Ref(r), _) => {
                let (owner, decl) = self.resolve(cur, r)?;
                self.write_decl(owner, &r.name, decl, value)
            }
            _ => Err(mismatch()),
        }
    }

    fn write_decl(&self, owner: &Module, name: &str, decl: &Decl, value: &Value) -> Result<Json, CodecError> {
        let mismatch = || CodecError::ValueMismatch { expected: name.to_owned(), found: value.kind() };
        match (decl, value) {
            (Decl::Alias(ty), _) => self.write(owner, ty, value),
            (Decl::Struct(fields), Value::Record(m)) => self.write_fields(owner, fields, m, None).map(Json::Object),
            (Decl::SumType(variants), Value::Variant { tag, fields }) => {
                self.write_variant(owner, name, variants, tag, fields)
            }
            (Decl::VariantOf { parent, index }, Value::Variant { tag, fields }) => {
                let variant = owner.variant(parent, *index)
                    .ok_or_else(|| CodecError::UnknownType(name.to_owned()))?;
                if &variant.tag != tag {
                    return Err(CodecError::UnknownTag { sum: parent.clone(), tag: tag.clone() });
                }
                self.write_fields(owner, &variant.fields, fields, Some(tag)).map(Json::Object)
            }
            (Decl::TableSchema(_), _) => Err(CodecError::Unsupported(format!(
                "`{name}` is a table schema; use the table codec"
            ))),
            _ => Err(mismatch()),
        }
    }

    fn write_variant(
        &self,
        owner: &Module,
        sum: &str,
        variants: &[Variant],
        tag: &str,
        fields: &IndexMap<String, Value>,
    ) -> Result<Json, CodecError> {
        let variant = variants.iter()
            .find(|v| v.tag == tag)
            .ok_or_else(|| CodecError::UnknownTag { sum: sum.to_owned(), tag: tag.to_owned() })?;
        self.write_fields(owner, &variant.fields, fields, Some(tag)).map(Json::Object)
    }

    /// `_type` first when tagged, then every declared field in declared order.
    fn write_fields(
        &self,
        owner: &Module,
        fields: &[Field],
        values: &IndexMap<String, Value>,
        tag: Option<&str>,
    ) -> Result<JsonMap<String, Json>, CodecError> {
        if values.len() != fields.len() {
            return Err(CodecError::ValueMismatch {
                expected: format!("{} fields", fields.len()),
                found: format!("{} fields", values.len()),
            });
        }
        let mut out = JsonMap::with_capacity(fields.len() + 1);
        if let Some(tag) = tag {
            out.insert(DISCRIMINATOR.to_owned(), Json::String(tag.to_owned()));
        }
        for f in fields {
            let v = values.get(&f.name).ok_or_else(|| CodecError::ValueMismatch {
                expected: format!("field `{}`", f.name),
                found: "no such field".to_owned(),
            })?;
            out.insert(f.name.clone(), self.write(owner, &f.ty, v)?);
        }
        Ok(out)
    }

    // ---- equality ----

    fn eq(&self, cur: &Module, ty: &Ty, a: &Value, b: &Value) -> bool {
        match (ty, a, b) {
            (Ty::Prim(p), _, _) => prim_matches(*p, a) && a == b,
            (Ty::Annot(_, inner), _, _) => self.eq(cur, inner, a, b),
            (Ty::Optional(_), Value::Optional(None), Value::Optional(None)) => true,
            (Ty::Optional(inner), Value::Optional(Some(x)), Value::Optional(Some(y))) => self.eq(cur, inner, x, y),
            (Ty::List(item), Value::List(xs), Value::List(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.eq(cur, item, x, y))
            }
            (Ty::Object(item), Value::Object(xs), Value::Object(ys)) => {
                xs.len() == ys.len()
                    && xs.iter().all(|(k, x)| ys.get(k).is_some_and(|y| self.eq(cur, item, x, y)))
            }
            (Ty::Map(k, v), Value::Map(xs), Value::Map(ys)) => {
                xs.len() == ys.len()
                    && xs.iter().zip(ys.iter()).all(|((xk, xv), (yk, yv))| {
                        self.eq(cur, k, xk, yk) && self.eq(cur, v, xv, yv)
                    })
            }
            (Ty::Record(fields), Value::Record(xs), Value::Record(ys)) => self.eq_fields(cur, fields, xs, ys),
            (Ty::Sum(variants), _, _) => self.eq_sum(cur, variants, a, b),
            (Ty::Ref(r), _, _) => {
                let Ok((owner, decl)) = self.resolve(cur, r) else { return false };
                match (decl, a, b) {
                    (Decl::Alias(ty), _, _) => self.eq(owner, ty, a, b),
                    (Decl::Struct(fields), Value::Record(xs), Value::Record(ys)) => self.eq_fields(owner, fields, xs, ys),
                    (Decl::SumType(variants), _, _) => self.eq_sum(owner, variants, a, b),
                    (Decl::VariantOf { parent, index }, _, _) => owner.variant(parent, *index)
                        .is_some_and(|v| self.eq_sum(owner, std::slice::from_ref(v), a, b)),
                    _ => false,
                }
            }
            _ => false,
        }
    }

    fn eq_fields(&self, cur: &Module, fields: &[Field], xs: &IndexMap<String, Value>, ys: &IndexMap<String, Value>) -> bool {
        xs.len() == fields.len()
            && ys.len() == fields.len()
            && fields.iter().all(|f| match (xs.get(&f.name), ys.get(&f.name)) {
                (Some(x), Some(y)) => self.eq(cur, &f.ty, x, y),
                _ => false,
            })
    }

    fn eq_sum(&self, cur: &Module, variants: &[Variant], a: &Value, b: &Value) -> bool {
        let (Value::Variant { tag: ta, fields: xs }, Value::Variant { tag: tb, fields: ys }) = (a, b) else {
            return false;
        };
        ta == tb
            && variants.iter()
                .find(|v| &v.tag == ta)
                .is_some_and(|v| self.eq_fields(cur, &v.fields, xs, ys))
    }
}
