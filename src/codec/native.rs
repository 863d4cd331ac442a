//! Runtime support for generated native types.
//!
//! Generated structs and enums implement `ToJson`/`FromJson` by calling the
//! helpers here, so both sides of the codec agree on one wire format.

use serde_json::Map as JsonMap;

use super::{
    key_identity, map_entry, read_binary, read_f64, read_i32, read_i64, read_u32, read_u64, write_binary,
    write_f64,
};
use crate::lower::DISCRIMINATOR;
use crate::value::OrderedMapBuilder;

// Everything generated code names goes through this module.
pub use super::ReadCx;
pub use crate::error::CodecError;
pub use crate::value::{Bytes, OrderedMap, Symbol};
pub use indexmap::IndexMap;
pub use serde_json::Value as Json;

pub trait ToJson {
    fn to_json(&self) -> Result<Json, CodecError>;
}

pub trait FromJson: Sized {
    /// Surface name of the type, used in conversion errors.
    fn expected() -> String;

    fn read_json(json: &Json, cx: &mut ReadCx) -> Result<Self, CodecError>;

    fn from_json(json: &Json) -> Result<Self, CodecError> {
        Self::read_json(json, &mut ReadCx::default())
    }
}

pub fn to_string<T: ToJson + ?Sized>(value: &T) -> Result<String, CodecError> {
    Ok(serde_json::to_string(&value.to_json()?)?)
}

pub fn from_str<T: FromJson>(text: &str) -> Result<T, CodecError> {
    let json: Json = serde_json::from_str(text)?;
    T::from_json(&json)
}

// ————————————————————————————————————————————————————————————————————————————
// RECORD HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// The `_type` of a tagged object.
pub fn discriminator<'j>(json: &'j Json, context: &str) -> Result<&'j str, CodecError> {
    let Json::Object(obj) = json else {
        return Err(CodecError::conversion(context, json));
    };
    match obj.get(DISCRIMINATOR) {
        Some(Json::String(tag)) => Ok(tag),
        Some(other) => Err(CodecError::conversion("discriminator string", other)),
        None => Err(CodecError::mismatch(context, "missing discriminator `_type`")),
    }
}

/// Fail unless `json` carries exactly `tag`.
pub fn expect_tag(json: &Json, sum: &str, tag: &str) -> Result<(), CodecError> {
    let found = discriminator(json, tag)?;
    if found != tag {
        return Err(CodecError::UnknownTag { sum: sum.to_owned(), tag: found.to_owned() });
    }
    Ok(())
}

/// An object whose keys are exactly `names` (plus `_type` when `tagged`).
pub fn expect_record<'j>(
    json: &'j Json,
    context: &str,
    tagged: bool,
    names: &[&str],
) -> Result<&'j JsonMap<String, Json>, CodecError> {
    let Json::Object(obj) = json else {
        return Err(CodecError::conversion(context, json));
    };
    let expected = names.len() + usize::from(tagged);
    let tag_ok = !tagged || obj.contains_key(DISCRIMINATOR);
    if obj.len() != expected || !tag_ok || names.iter().any(|n| !obj.contains_key(*n)) {
        let keys = tagged.then_some(DISCRIMINATOR).into_iter().chain(names.iter().copied());
        return Err(CodecError::key_set(context, keys, obj));
    }
    Ok(obj)
}

/// Read one field of an object already checked by `expect_record`.
pub fn field<T: FromJson>(
    obj: &JsonMap<String, Json>,
    name: &str,
    cx: &mut ReadCx,
) -> Result<T, CodecError> {
    match obj.get(name) {
        Some(json) => T::read_json(json, cx),
        None => Err(CodecError::mismatch(name, "missing field")),
    }
}

/// Build an object from already encoded fields, keeping their order.
pub fn object<'a>(fields: impl IntoIterator<Item = (&'a str, Json)>) -> Json {
    Json::Object(fields.into_iter().map(|(k, v)| (k.to_owned(), v)).collect())
}

/// Like `object`, with `_type` written first.
pub fn tagged<'a>(tag: &str, fields: impl IntoIterator<Item = (&'a str, Json)>) -> Json {
    let mut obj = JsonMap::new();
    obj.insert(DISCRIMINATOR.to_owned(), Json::String(tag.to_owned()));
    obj.extend(fields.into_iter().map(|(k, v)| (k.to_owned(), v)));
    Json::Object(obj)
}

// ————————————————————————————————————————————————————————————————————————————
// SCALARS
// ————————————————————————————————————————————————————————————————————————————

macro_rules! scalar {
    ($t:ty, $name:literal, $read:expr, $write:expr) => {
        impl ToJson for $t {
            fn to_json(&self) -> Result<Json, CodecError> {
                Ok(($write)(self))
            }
        }

        impl FromJson for $t {
            fn expected() -> String {
                $name.to_owned()
            }

            fn read_json(json: &Json, _cx: &mut ReadCx) -> Result<Self, CodecError> {
                ($read)(json).ok_or_else(|| CodecError::conversion($name, json))
            }
        }
    };
}

scalar!(i32, "I32", read_i32, |v: &i32| Json::from(*v));
scalar!(u32, "U32", read_u32, |v: &u32| Json::from(*v));
scalar!(i64, "I64", read_i64, |v: &i64| Json::String(v.to_string()));
scalar!(u64, "U64", read_u64, |v: &u64| Json::String(v.to_string()));
scalar!(bool, "Boolean", |j: &Json| j.as_bool(), |v: &bool| Json::Bool(*v));
scalar!(String, "Str", |j: &Json| j.as_str().map(str::to_owned), |v: &String| Json::String(v.clone()));
scalar!(Bytes, "Binary", |j: &Json| read_binary(j).map(Bytes), |v: &Bytes| write_binary(v));

impl ToJson for f64 {
    fn to_json(&self) -> Result<Json, CodecError> {
        write_f64(*self)
    }
}

impl FromJson for f64 {
    fn expected() -> String {
        "F64".to_owned()
    }

    fn read_json(json: &Json, _cx: &mut ReadCx) -> Result<Self, CodecError> {
        read_f64(json).ok_or_else(|| CodecError::conversion("F64", json))
    }
}

impl ToJson for Symbol {
    fn to_json(&self) -> Result<Json, CodecError> {
        Ok(Json::String(self.as_str().to_owned()))
    }
}

impl FromJson for Symbol {
    fn expected() -> String {
        "Ident".to_owned()
    }

    fn read_json(json: &Json, cx: &mut ReadCx) -> Result<Self, CodecError> {
        let s = json.as_str().ok_or_else(|| CodecError::conversion("Ident", json))?;
        Ok(cx.intern(s))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONTAINERS
// ————————————————————————————————————————————————————————————————————————————

impl<T: ToJson> ToJson for Option<T> {
    fn to_json(&self) -> Result<Json, CodecError> {
        match self {
            Some(v) => v.to_json(),
            None => Ok(Json::Null),
        }
    }
}

impl<T: FromJson> FromJson for Option<T> {
    fn expected() -> String {
        format!("Optional({})", T::expected())
    }

    fn read_json(json: &Json, cx: &mut ReadCx) -> Result<Self, CodecError> {
        match json {
            Json::Null => Ok(None),
            _ => T::read_json(json, cx).map(Some),
        }
    }
}

impl<T: ToJson + ?Sized> ToJson for Box<T> {
    fn to_json(&self) -> Result<Json, CodecError> {
        (**self).to_json()
    }
}

impl<T: FromJson> FromJson for Box<T> {
    fn expected() -> String {
        T::expected()
    }

    fn read_json(json: &Json, cx: &mut ReadCx) -> Result<Self, CodecError> {
        T::read_json(json, cx).map(Box::new)
    }
}

impl<T: ToJson> ToJson for Vec<T> {
    fn to_json(&self) -> Result<Json, CodecError> {
        self.iter().map(ToJson::to_json).collect::<Result<_, _>>().map(Json::Array)
    }
}

impl<T: FromJson> FromJson for Vec<T> {
    fn expected() -> String {
        format!("List({})", T::expected())
    }

    fn read_json(json: &Json, cx: &mut ReadCx) -> Result<Self, CodecError> {
        let Json::Array(items) = json else {
            return Err(CodecError::conversion(Self::expected(), json));
        };
        cx.nested(|cx| items.iter().map(|x| T::read_json(x, cx)).collect())
    }
}

impl<T: ToJson> ToJson for IndexMap<String, T> {
    fn to_json(&self) -> Result<Json, CodecError> {
        self.iter()
            .map(|(k, v)| Ok((k.clone(), v.to_json()?)))
            .collect::<Result<_, CodecError>>()
            .map(Json::Object)
    }
}

impl<T: FromJson> FromJson for IndexMap<String, T> {
    fn expected() -> String {
        format!("Object({})", T::expected())
    }

    fn read_json(json: &Json, cx: &mut ReadCx) -> Result<Self, CodecError> {
        let Json::Object(props) = json else {
            return Err(CodecError::conversion(Self::expected(), json));
        };
        cx.nested(|cx| {
            props.iter()
                .map(|(k, x)| Ok::<_, CodecError>((k.clone(), T::read_json(x, cx)?)))
                .collect()
        })
    }
}

impl<K: ToJson, V: ToJson> ToJson for OrderedMap<K, V> {
    fn to_json(&self) -> Result<Json, CodecError> {
        self.iter()
            .map(|(k, v)| Ok(map_entry(k.to_json()?, v.to_json()?)))
            .collect::<Result<_, CodecError>>()
            .map(Json::Array)
    }
}

impl<K: FromJson + ToJson, V: FromJson> FromJson for OrderedMap<K, V> {
    fn expected() -> String {
        format!("Map({}, {})", K::expected(), V::expected())
    }

    fn read_json(json: &Json, cx: &mut ReadCx) -> Result<Self, CodecError> {
        let Json::Array(entries) = json else {
            return Err(CodecError::conversion(Self::expected(), json));
        };
        cx.nested(|cx| {
            let mut out = OrderedMapBuilder::with_capacity(entries.len());
            for entry in entries {
                let entry = expect_record(entry, "map entry", false, &["key", "value"])?;
                let key = field::<K>(entry, "key", cx)?;
                let identity = key_identity(&key.to_json()?);
                out.insert(identity, key, field::<V>(entry, "value", cx)?);
            }
            Ok(out.finish())
        })
    }
}

// ---- tuples: records keyed `_1.._n` ----

macro_rules! tuple {
    ($($name:ident : $idx:tt => $key:literal),+) => {
        impl<$($name: ToJson),+> ToJson for ($($name,)+) {
            fn to_json(&self) -> Result<Json, CodecError> {
                Ok(object([$(($key, self.$idx.to_json()?)),+]))
            }
        }

        impl<$($name: FromJson),+> FromJson for ($($name,)+) {
            fn expected() -> String {
                let parts: Vec<String> = vec![$($name::expected()),+];
                format!("({})", parts.join(", "))
            }

            fn read_json(json: &Json, cx: &mut ReadCx) -> Result<Self, CodecError> {
                let obj = expect_record(json, &Self::expected(), false, &[$($key),+])?;
                cx.nested(|cx| Ok(($(field::<$name>(obj, $key, cx)?,)+)))
            }
        }
    };
}

tuple!(A: 0 => "_1");
tuple!(A: 0 => "_1", B: 1 => "_2");
tuple!(A: 0 => "_1", B: 1 => "_2", C: 2 => "_3");
tuple!(A: 0 => "_1", B: 1 => "_2", C: 2 => "_3", D: 3 => "_4");
tuple!(A: 0 => "_1", B: 1 => "_2", C: 2 => "_3", D: 3 => "_4", E: 4 => "_5");
tuple!(A: 0 => "_1", B: 1 => "_2", C: 2 => "_3", D: 3 => "_4", E: 4 => "_5", F: 5 => "_6");
