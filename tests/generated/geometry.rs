// Generated by json-shapes from module `geometry`. Do not edit.

#![allow(dead_code, non_camel_case_types, clippy::all)]

use ::json_shapes::native as __rt;

#[derive(Debug, Clone)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl ::std::cmp::PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x
            && self.y == other.y
    }
}

impl __rt::ToJson for Point {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        ::std::result::Result::Ok(__rt::object([
            ("x", __rt::ToJson::to_json(&self.x)?),
            ("y", __rt::ToJson::to_json(&self.y)?),
        ]))
    }
}

impl __rt::FromJson for Point {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("Point")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        let obj = __rt::expect_record(json, "Point", false, &["x", "y"])?;
        cx.nested(|cx| ::std::result::Result::Ok(Self {
            x: __rt::field(obj, "x", cx)?,
            y: __rt::field(obj, "y", cx)?,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct Circle {
    pub r: f64,
}

impl ::std::cmp::PartialEq for Circle {
    fn eq(&self, other: &Self) -> bool {
        self.r == other.r
    }
}

impl __rt::ToJson for Circle {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        ::std::result::Result::Ok(__rt::tagged("Circle", [
            ("r", __rt::ToJson::to_json(&self.r)?),
        ]))
    }
}

impl __rt::FromJson for Circle {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("Circle")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        __rt::expect_tag(json, "Shape", "Circle")?;
        let obj = __rt::expect_record(json, "Circle", true, &["r"])?;
        cx.nested(|cx| ::std::result::Result::Ok(Self {
            r: __rt::field(obj, "r", cx)?,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct Square {
    pub s: f64,
}

impl ::std::cmp::PartialEq for Square {
    fn eq(&self, other: &Self) -> bool {
        self.s == other.s
    }
}

impl __rt::ToJson for Square {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        ::std::result::Result::Ok(__rt::tagged("Square", [
            ("s", __rt::ToJson::to_json(&self.s)?),
        ]))
    }
}

impl __rt::FromJson for Square {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("Square")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        __rt::expect_tag(json, "Shape", "Square")?;
        let obj = __rt::expect_record(json, "Square", true, &["s"])?;
        cx.nested(|cx| ::std::result::Result::Ok(Self {
            s: __rt::field(obj, "s", cx)?,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct Empty {
}

impl ::std::cmp::PartialEq for Empty {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl __rt::ToJson for Empty {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        ::std::result::Result::Ok(__rt::tagged("Empty", [
        ]))
    }
}

impl __rt::FromJson for Empty {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("Empty")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        __rt::expect_tag(json, "Shape", "Empty")?;
        __rt::expect_record(json, "Empty", true, &[])?;
        cx.nested(|_| ::std::result::Result::Ok(Self {}))
    }
}

#[derive(Debug, Clone)]
pub enum Shape {
    Circle(Circle),
    Square(Square),
    Empty(Empty),
}

impl ::std::cmp::PartialEq for Shape {
    #[allow(unreachable_patterns)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Circle(a), Self::Circle(b)) => a == b,
            (Self::Square(a), Self::Square(b)) => a == b,
            (Self::Empty(a), Self::Empty(b)) => a == b,
            _ => false,
        }
    }
}

impl __rt::ToJson for Shape {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        match self {
            Self::Circle(v) => __rt::ToJson::to_json(v),
            Self::Square(v) => __rt::ToJson::to_json(v),
            Self::Empty(v) => __rt::ToJson::to_json(v),
        }
    }
}

impl __rt::FromJson for Shape {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("Shape")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        let tag = __rt::discriminator(json, "Shape")?;
        if tag == "Circle" {
            return <Circle as __rt::FromJson>::read_json(json, cx).map(Self::Circle);
        }
        if tag == "Square" {
            return <Square as __rt::FromJson>::read_json(json, cx).map(Self::Square);
        }
        if tag == "Empty" {
            return <Empty as __rt::FromJson>::read_json(json, cx).map(Self::Empty);
        }
        ::std::result::Result::Err(__rt::CodecError::UnknownTag {
            sum: ::std::string::String::from("Shape"),
            tag: ::std::string::String::from(tag),
        })
    }
}

pub type Polygon = ::std::vec::Vec<Point>;

#[derive(Debug, Clone)]
pub struct Labeled {
    /// display name
    pub label: ::std::string::String,
    pub at: Point,
    pub tags: __rt::OrderedMap<::std::string::String, u32>,
    pub meta: __rt::IndexMap<::std::string::String, bool>,
}

impl ::std::cmp::PartialEq for Labeled {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
            && self.at == other.at
            && self.tags == other.tags
            && self.meta == other.meta
    }
}

impl __rt::ToJson for Labeled {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        ::std::result::Result::Ok(__rt::object([
            ("label", __rt::ToJson::to_json(&self.label)?),
            ("at", __rt::ToJson::to_json(&self.at)?),
            ("tags", __rt::ToJson::to_json(&self.tags)?),
            ("meta", __rt::ToJson::to_json(&self.meta)?),
        ]))
    }
}

impl __rt::FromJson for Labeled {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("Labeled")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        let obj = __rt::expect_record(json, "Labeled", false, &["label", "at", "tags", "meta"])?;
        cx.nested(|cx| ::std::result::Result::Ok(Self {
            label: __rt::field(obj, "label", cx)?,
            at: __rt::field(obj, "at", cx)?,
            tags: __rt::field(obj, "tags", cx)?,
            meta: __rt::field(obj, "meta", cx)?,
        }))
    }
}
