// Generated by json-shapes from module `records`. Do not edit.

#![allow(dead_code, non_camel_case_types, clippy::all)]

use ::json_shapes::native as __rt;

#[derive(Debug, Clone)]
pub struct Node {
    pub value: i64,
    pub next: ::std::option::Option<::std::boxed::Box<Node>>,
}

impl ::std::cmp::PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
            && self.next == other.next
    }
}

impl __rt::ToJson for Node {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        ::std::result::Result::Ok(__rt::object([
            ("value", __rt::ToJson::to_json(&self.value)?),
            ("next", __rt::ToJson::to_json(&self.next)?),
        ]))
    }
}

impl __rt::FromJson for Node {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("Node")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        let obj = __rt::expect_record(json, "Node", false, &["value", "next"])?;
        cx.nested(|cx| ::std::result::Result::Ok(Self {
            value: __rt::field(obj, "value", cx)?,
            next: __rt::field(obj, "next", cx)?,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct Blob {
    pub id: u64,
    pub data: __rt::Bytes,
    pub kind: __rt::Symbol,
}

impl ::std::cmp::PartialEq for Blob {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.data == other.data
            && self.kind == other.kind
    }
}

impl __rt::ToJson for Blob {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        ::std::result::Result::Ok(__rt::object([
            ("id", __rt::ToJson::to_json(&self.id)?),
            ("data", __rt::ToJson::to_json(&self.data)?),
            ("kind", __rt::ToJson::to_json(&self.kind)?),
        ]))
    }
}

impl __rt::FromJson for Blob {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("Blob")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        let obj = __rt::expect_record(json, "Blob", false, &["id", "data", "kind"])?;
        cx.nested(|cx| ::std::result::Result::Ok(Self {
            id: __rt::field(obj, "id", cx)?,
            data: __rt::field(obj, "data", cx)?,
            kind: __rt::field(obj, "kind", cx)?,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct Drawing {
    pub name: ::std::string::String,
    pub shapes: ::std::vec::Vec<super::geometry::Shape>,
    pub origin: super::geometry::Point,
    pub pair: (i32, ::std::string::String),
}

impl ::std::cmp::PartialEq for Drawing {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.shapes == other.shapes
            && self.origin == other.origin
            && self.pair == other.pair
    }
}

impl __rt::ToJson for Drawing {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        ::std::result::Result::Ok(__rt::object([
            ("name", __rt::ToJson::to_json(&self.name)?),
            ("shapes", __rt::ToJson::to_json(&self.shapes)?),
            ("origin", __rt::ToJson::to_json(&self.origin)?),
            ("pair", __rt::ToJson::to_json(&self.pair)?),
        ]))
    }
}

impl __rt::FromJson for Drawing {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("Drawing")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        let obj = __rt::expect_record(json, "Drawing", false, &["name", "shapes", "origin", "pair"])?;
        cx.nested(|cx| ::std::result::Result::Ok(Self {
            name: __rt::field(obj, "name", cx)?,
            shapes: __rt::field(obj, "shapes", cx)?,
            origin: __rt::field(obj, "origin", cx)?,
            pair: __rt::field(obj, "pair", cx)?,
        }))
    }
}
