// Generated by json-shapes from module `kitchen`. Do not edit.

#![allow(dead_code, non_camel_case_types, clippy::all)]

use ::json_shapes::native as __rt;

#[derive(Debug, Clone)]
pub struct Lit {
    pub _1: i32,
}

impl ::std::cmp::PartialEq for Lit {
    fn eq(&self, other: &Self) -> bool {
        self._1 == other._1
    }
}

impl __rt::ToJson for Lit {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        ::std::result::Result::Ok(__rt::tagged("Lit", [
            ("_1", __rt::ToJson::to_json(&self._1)?),
        ]))
    }
}

impl __rt::FromJson for Lit {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("Lit")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        __rt::expect_tag(json, "Expr", "Lit")?;
        let obj = __rt::expect_record(json, "Lit", true, &["_1"])?;
        cx.nested(|cx| ::std::result::Result::Ok(Self {
            _1: __rt::field(obj, "_1", cx)?,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct Neg {
    pub _1: ::std::boxed::Box<Expr>,
}

impl ::std::cmp::PartialEq for Neg {
    fn eq(&self, other: &Self) -> bool {
        self._1 == other._1
    }
}

impl __rt::ToJson for Neg {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        ::std::result::Result::Ok(__rt::tagged("Neg", [
            ("_1", __rt::ToJson::to_json(&self._1)?),
        ]))
    }
}

impl __rt::FromJson for Neg {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("Neg")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        __rt::expect_tag(json, "Expr", "Neg")?;
        let obj = __rt::expect_record(json, "Neg", true, &["_1"])?;
        cx.nested(|cx| ::std::result::Result::Ok(Self {
            _1: __rt::field(obj, "_1", cx)?,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct Add {
    pub lhs: ::std::boxed::Box<Expr>,
    pub rhs: ::std::boxed::Box<Expr>,
}

impl ::std::cmp::PartialEq for Add {
    fn eq(&self, other: &Self) -> bool {
        self.lhs == other.lhs
            && self.rhs == other.rhs
    }
}

impl __rt::ToJson for Add {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        ::std::result::Result::Ok(__rt::tagged("Add", [
            ("lhs", __rt::ToJson::to_json(&self.lhs)?),
            ("rhs", __rt::ToJson::to_json(&self.rhs)?),
        ]))
    }
}

impl __rt::FromJson for Add {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("Add")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        __rt::expect_tag(json, "Expr", "Add")?;
        let obj = __rt::expect_record(json, "Add", true, &["lhs", "rhs"])?;
        cx.nested(|cx| ::std::result::Result::Ok(Self {
            lhs: __rt::field(obj, "lhs", cx)?,
            rhs: __rt::field(obj, "rhs", cx)?,
        }))
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Lit(Lit),
    Neg(Neg),
    Add(Add),
}

impl ::std::cmp::PartialEq for Expr {
    #[allow(unreachable_patterns)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Lit(a), Self::Lit(b)) => a == b,
            (Self::Neg(a), Self::Neg(b)) => a == b,
            (Self::Add(a), Self::Add(b)) => a == b,
            _ => false,
        }
    }
}

impl __rt::ToJson for Expr {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        match self {
            Self::Lit(v) => __rt::ToJson::to_json(v),
            Self::Neg(v) => __rt::ToJson::to_json(v),
            Self::Add(v) => __rt::ToJson::to_json(v),
        }
    }
}

impl __rt::FromJson for Expr {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("Expr")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        let tag = __rt::discriminator(json, "Expr")?;
        if tag == "Lit" {
            return <Lit as __rt::FromJson>::read_json(json, cx).map(Self::Lit);
        }
        if tag == "Neg" {
            return <Neg as __rt::FromJson>::read_json(json, cx).map(Self::Neg);
        }
        if tag == "Add" {
            return <Add as __rt::FromJson>::read_json(json, cx).map(Self::Add);
        }
        ::std::result::Result::Err(__rt::CodecError::UnknownTag {
            sum: ::std::string::String::from("Expr"),
            tag: ::std::string::String::from(tag),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub r#type: ::std::string::String,
    pub self_: bool,
    pub at: TokenAt,
}

impl ::std::cmp::PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.r#type == other.r#type
            && self.self_ == other.self_
            && self.at == other.at
    }
}

impl __rt::ToJson for Token {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        ::std::result::Result::Ok(__rt::object([
            ("type", __rt::ToJson::to_json(&self.r#type)?),
            ("self", __rt::ToJson::to_json(&self.self_)?),
            ("at", __rt::ToJson::to_json(&self.at)?),
        ]))
    }
}

impl __rt::FromJson for Token {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("Token")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        let obj = __rt::expect_record(json, "Token", false, &["type", "self", "at"])?;
        cx.nested(|cx| ::std::result::Result::Ok(Self {
            r#type: __rt::field(obj, "type", cx)?,
            self_: __rt::field(obj, "self", cx)?,
            at: __rt::field(obj, "at", cx)?,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct TokenAt {
    pub line: u32,
    pub col: u32,
}

impl ::std::cmp::PartialEq for TokenAt {
    fn eq(&self, other: &Self) -> bool {
        self.line == other.line
            && self.col == other.col
    }
}

impl __rt::ToJson for TokenAt {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        ::std::result::Result::Ok(__rt::object([
            ("line", __rt::ToJson::to_json(&self.line)?),
            ("col", __rt::ToJson::to_json(&self.col)?),
        ]))
    }
}

impl __rt::FromJson for TokenAt {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("TokenAt")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        let obj = __rt::expect_record(json, "TokenAt", false, &["line", "col"])?;
        cx.nested(|cx| ::std::result::Result::Ok(Self {
            line: __rt::field(obj, "line", cx)?,
            col: __rt::field(obj, "col", cx)?,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct Wide {
    pub cells: WideCells,
}

impl ::std::cmp::PartialEq for Wide {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
    }
}

impl __rt::ToJson for Wide {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        ::std::result::Result::Ok(__rt::object([
            ("cells", __rt::ToJson::to_json(&self.cells)?),
        ]))
    }
}

impl __rt::FromJson for Wide {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("Wide")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        let obj = __rt::expect_record(json, "Wide", false, &["cells"])?;
        cx.nested(|cx| ::std::result::Result::Ok(Self {
            cells: __rt::field(obj, "cells", cx)?,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct WideCells {
    pub _1: i32,
    pub _2: i32,
    pub _3: i32,
    pub _4: i32,
    pub _5: i32,
    pub _6: i32,
    pub _7: i32,
}

impl ::std::cmp::PartialEq for WideCells {
    fn eq(&self, other: &Self) -> bool {
        self._1 == other._1
            && self._2 == other._2
            && self._3 == other._3
            && self._4 == other._4
            && self._5 == other._5
            && self._6 == other._6
            && self._7 == other._7
    }
}

impl __rt::ToJson for WideCells {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        ::std::result::Result::Ok(__rt::object([
            ("_1", __rt::ToJson::to_json(&self._1)?),
            ("_2", __rt::ToJson::to_json(&self._2)?),
            ("_3", __rt::ToJson::to_json(&self._3)?),
            ("_4", __rt::ToJson::to_json(&self._4)?),
            ("_5", __rt::ToJson::to_json(&self._5)?),
            ("_6", __rt::ToJson::to_json(&self._6)?),
            ("_7", __rt::ToJson::to_json(&self._7)?),
        ]))
    }
}

impl __rt::FromJson for WideCells {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("WideCells")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        let obj = __rt::expect_record(json, "WideCells", false, &["_1", "_2", "_3", "_4", "_5", "_6", "_7"])?;
        cx.nested(|cx| ::std::result::Result::Ok(Self {
            _1: __rt::field(obj, "_1", cx)?,
            _2: __rt::field(obj, "_2", cx)?,
            _3: __rt::field(obj, "_3", cx)?,
            _4: __rt::field(obj, "_4", cx)?,
            _5: __rt::field(obj, "_5", cx)?,
            _6: __rt::field(obj, "_6", cx)?,
            _7: __rt::field(obj, "_7", cx)?,
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Doc(pub __rt::OrderedMap<::std::string::String, ::std::vec::Vec<Doc>>);

impl __rt::ToJson for Doc {
    fn to_json(&self) -> ::std::result::Result<__rt::Json, __rt::CodecError> {
        __rt::ToJson::to_json(&self.0)
    }
}

impl __rt::FromJson for Doc {
    fn expected() -> ::std::string::String {
        ::std::string::String::from("Doc")
    }

    fn read_json(json: &__rt::Json, cx: &mut __rt::ReadCx) -> ::std::result::Result<Self, __rt::CodecError> {
        cx.nested(|cx| __rt::FromJson::read_json(json, cx).map(Self))
    }
}
