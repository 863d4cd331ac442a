//! Syntax → IR, resolving names against the builder.
//!
//! Names are reserved first (`reserve_names`), then bodies are lowered
//! (`lower_decl`); by the time a body is lowered every name it may
//! legitimately mention already has a slot.

use std::collections::HashSet;

use crate::error::FrontendError;
use crate::frontend::{DeclExpr, FieldExpr, TableItem, TypeArg, TypeExpr};
use crate::ir::{ordinal_name, Attr, AttrType, Decl, Field, Hom, Prim, TableSpec, Ty, Variant};
use crate::module::ModuleBuilder;

/// Reserved inside variants: the sum discriminator.
pub const DISCRIMINATOR: &str = "_type";
/// Reserved inside table rows.
pub const ROW_ID: &str = "_id";

const CONSTRUCTORS: [&str; 5] = ["Optional", "List", "Object", "Map", "Annot"];

fn check_decl_name(name: &str) -> Result<(), FrontendError> {
    if Prim::from_name(name).is_some() || CONSTRUCTORS.contains(&name) {
        return Err(FrontendError::parse(0, name, "reserved type name cannot be declared"));
    }
    Ok(())
}

/// Allocate slots for every name a declaration introduces: its own and, for
/// sums, one per tag.
pub fn reserve_names(builder: &mut ModuleBuilder, decl: &DeclExpr) -> Result<(), FrontendError> {
    check_decl_name(decl.name())?;
    builder.reserve(decl.name())?;
    if let DeclExpr::Sum { variants, .. } = decl {
        for v in variants {
            check_decl_name(&v.tag)?;
            builder.reserve(&v.tag)?;
        }
    }
    Ok(())
}

pub fn lower_decl(builder: &mut ModuleBuilder, decl: &DeclExpr) -> Result<(), FrontendError> {
    match decl {
        DeclExpr::Alias { name, ty } => {
            let ty = lower_ty(builder, ty)?;
            builder.define(name, Decl::Alias(ty))
        }
        DeclExpr::Struct { name, fields } => {
            let fields = lower_fields(builder, fields, &[])?;
            builder.define(name, Decl::Struct(fields))
        }
        DeclExpr::Sum { name, variants } => {
            let mut lowered = Vec::with_capacity(variants.len());
            for v in variants {
                let fields = lower_fields(builder, &v.fields, &[DISCRIMINATOR])?;
                lowered.push(Variant { tag: v.tag.clone(), fields });
            }
            for (index, v) in variants.iter().enumerate() {
                builder.define(&v.tag, Decl::VariantOf { parent: name.clone(), index })?;
            }
            builder.define(name, Decl::SumType(lowered))
        }
        DeclExpr::Table { name, items } => {
            let spec = lower_table(builder, items)?;
            builder.define(name, Decl::TableSchema(spec))
        }
    }
}

pub fn lower_fields(
    builder: &ModuleBuilder,
    fields: &[FieldExpr],
    reserved: &[&str],
) -> Result<Vec<Field>, FrontendError> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(fields.len());
    for (i, f) in fields.iter().enumerate() {
        let name = f.name.clone().unwrap_or_else(|| ordinal_name(i));
        if reserved.contains(&name.as_str()) {
            return Err(FrontendError::parse(0, name, "reserved field name"));
        }
        if !seen.insert(name.clone()) {
            return Err(FrontendError::Duplicate { what: "field", name });
        }
        out.push(Field { name, ty: lower_ty(builder, &f.ty)? });
    }
    Ok(out)
}

pub fn lower_ty(builder: &ModuleBuilder, ty: &TypeExpr) -> Result<Ty, FrontendError> {
    match ty {
        TypeExpr::Path { segments, .. } => {
            if let [single] = segments.as_slice() {
                if let Some(p) = Prim::from_name(single) {
                    return Ok(Ty::Prim(p));
                }
            }
            Ok(Ty::Ref(builder.resolve_path(segments)?))
        }
        TypeExpr::Tuple(elems) => {
            let elems = elems.iter()
                .map(|e| lower_ty(builder, e))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Ty::tuple(elems))
        }
        TypeExpr::Record(fields) => Ok(Ty::Record(lower_fields(builder, fields, &[])?)),
        TypeExpr::Apply { ctor, args, offset, fragment } => {
            let bad = |message: String| FrontendError::parse(*offset, fragment.as_str(), message);
            let ty_arg = |arg: &TypeArg| match arg {
                TypeArg::Type(t) => lower_ty(builder, t),
                TypeArg::Doc(_) => Err(bad(format!("`{ctor}` takes types, not strings"))),
            };
            match (ctor.as_str(), args.as_slice()) {
                ("Optional", [t]) => Ok(Ty::optional(ty_arg(t)?)),
                ("List", [t]) => Ok(Ty::list(ty_arg(t)?)),
                ("Object", [t]) => Ok(Ty::object(ty_arg(t)?)),
                ("Map", [k, v]) => Ok(Ty::map(ty_arg(k)?, ty_arg(v)?)),
                ("Annot", [TypeArg::Doc(doc), t]) => Ok(Ty::annot(doc.clone(), ty_arg(t)?)),
                ("Optional" | "List" | "Object", _) => Err(bad(format!("`{ctor}` takes exactly one type"))),
                ("Map", _) => Err(bad("`Map` takes a key type and a value type".to_owned())),
                ("Annot", _) => Err(bad("`Annot` takes a description string and a type".to_owned())),
                _ => Err(bad(format!("unknown type constructor `{ctor}`"))),
            }
        }
    }
}

fn lower_table(builder: &ModuleBuilder, items: &[TableItem]) -> Result<TableSpec, FrontendError> {
    let mut spec = TableSpec::default();
    let mut names = HashSet::new();
    let mut claim = |name: &str| {
        if name == ROW_ID {
            return Err(FrontendError::parse(0, name, "reserved table name"));
        }
        if !names.insert(name.to_owned()) {
            return Err(FrontendError::Duplicate { what: "table member", name: name.to_owned() });
        }
        Ok(())
    };

    // members first, so `hom`/`attr` may mention kinds declared after them
    for item in items {
        match item {
            TableItem::Ob(obs) => {
                for ob in obs {
                    claim(ob.as_str())?;
                    spec.objects.push(ob.clone());
                }
            }
            TableItem::AttrType { name, ty } => {
                claim(name.as_str())?;
                spec.attr_types.push(AttrType { name: name.clone(), ty: lower_ty(builder, ty)? });
            }
            TableItem::Hom { name, .. } | TableItem::Attr { name, .. } => claim(name.as_str())?,
        }
    }

    let is_ob = |s: &str| spec.objects.iter().any(|o| o == s);
    let mut homs = Vec::new();
    let mut attrs = Vec::new();
    for item in items {
        match item {
            TableItem::Hom { name, dom, codom } => {
                for end in [dom, codom] {
                    if !is_ob(end.as_str()) {
                        return Err(FrontendError::unresolved(end.as_str()));
                    }
                }
                homs.push(Hom { name: name.clone(), dom: dom.clone(), codom: codom.clone() });
            }
            TableItem::Attr { name, dom, codom } => {
                if !is_ob(dom.as_str()) {
                    return Err(FrontendError::unresolved(dom.as_str()));
                }
                if spec.attr_type(codom).is_none() {
                    return Err(FrontendError::unresolved(codom.as_str()));
                }
                attrs.push(Attr { name: name.clone(), dom: dom.clone(), codom: codom.clone() });
            }
            TableItem::Ob(_) | TableItem::AttrType { .. } => {}
        }
    }
    spec.homs = homs;
    spec.attrs = attrs;
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use crate::error::FrontendError;
    use crate::ir::{Decl, Prim, Ty};
    use crate::module::ModuleBuilder;

    #[test]
    fn self_reference_resolves_to_own_slot() {
        let mut b = ModuleBuilder::new("list");
        b.declare("struct Node { value :: I64, next :: Optional(Node) }").unwrap();
        let m = b.finish().unwrap();
        let Some(Decl::Struct(fields)) = m.get("Node") else { panic!("expected struct") };
        let Ty::Optional(inner) = &fields[1].ty else { panic!("expected optional") };
        let Ty::Ref(r) = inner.as_ref() else { panic!("expected ref") };
        assert_eq!(r.slot, m.slot_of("Node").unwrap());
    }

    #[test]
    fn bare_fields_get_ordinal_names() {
        let mut b = ModuleBuilder::new("t");
        b.declare("struct Pair { I32, tag :: Str, Boolean }").unwrap();
        let m = b.finish().unwrap();
        let Some(Decl::Struct(fields)) = m.get("Pair") else { panic!() };
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["_1", "tag", "_3"]);
    }

    #[test]
    fn sum_tags_become_variant_declarations() {
        let mut b = ModuleBuilder::new("geo");
        b.declare("sum Shape { Circle(r :: F64) | Square(s :: F64) }").unwrap();
        let m = b.finish().unwrap();
        assert_eq!(m.get("Square"), Some(&Decl::VariantOf { parent: "Shape".into(), index: 1 }));
        assert_eq!(m.variant("Shape", 0).unwrap().tag, "Circle");
    }

    #[test]
    fn unknown_constructor_names_the_fragment() {
        let mut b = ModuleBuilder::new("t");
        let err = b.declare("alias X = Lst(I32)").unwrap_err();
        match err {
            FrontendError::Parse { fragment, .. } => assert_eq!(fragment, "Lst(I32)"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn arity_errors_are_parse_errors() {
        let mut b = ModuleBuilder::new("t");
        assert!(matches!(b.declare("alias X = Map(I32)"), Err(FrontendError::Parse { .. })));
        assert!(matches!(b.declare("alias X = Annot(I32, I32)"), Err(FrontendError::Parse { .. })));
    }

    #[test]
    fn unknown_names_fail_resolution() {
        let mut b = ModuleBuilder::new("t");
        assert!(matches!(b.declare("alias X = List(Nope)"), Err(FrontendError::NameResolution { .. })));
        assert!(matches!(b.declare("alias X = other.Thing"), Err(FrontendError::NameResolution { .. })));
    }

    #[test]
    fn discriminator_is_reserved_in_variants() {
        let mut b = ModuleBuilder::new("t");
        assert!(b.declare("sum S { A(_type :: Str) }").is_err());
        // the failed sum released its tag
        b.declare("struct A { _type :: Str }").unwrap();
    }

    #[test]
    fn duplicate_fields_rejected() {
        let mut b = ModuleBuilder::new("t");
        assert!(matches!(
            b.declare("struct P { x :: I32, x :: I32 }"),
            Err(FrontendError::Duplicate { what: "field", .. })
        ));
    }

    #[test]
    fn annot_and_tuple_lowering() {
        let mut b = ModuleBuilder::new("t");
        b.declare(r#"alias Id = Annot("row id", (I64, Str))"#).unwrap();
        let m = b.finish().unwrap();
        let Some(Decl::Alias(Ty::Annot(doc, inner))) = m.get("Id") else { panic!() };
        assert_eq!(doc, "row id");
        assert_eq!(**inner, Ty::tuple(vec![Ty::prim(Prim::I64), Ty::prim(Prim::Str)]));
    }

    #[test]
    fn table_members_are_checked() {
        let mut b = ModuleBuilder::new("g");
        b.declare("
            table Graph {
                ob V, E
                hom src :: E -> V
                hom tgt :: E -> V
                attrtype Weight = F64
                attr weight :: E -> Weight
            }
        ").unwrap();
        assert!(matches!(
            b.declare("table Bad { ob V  hom f :: V -> W }"),
            Err(FrontendError::NameResolution { .. })
        ));
        assert!(matches!(
            b.declare("table Bad { ob V  attr a :: V -> V }"),
            Err(FrontendError::NameResolution { .. })
        ));
        assert!(b.declare("table Bad { ob _id }").is_err());
        let m = b.finish().unwrap();
        let Some(Decl::TableSchema(spec)) = m.get("Graph") else { panic!() };
        assert_eq!(spec.objects, ["V", "E"]);
        assert_eq!(spec.homs_from("E").count(), 2);
        assert_eq!(spec.attr_type("Weight").unwrap().ty, Ty::prim(Prim::F64));
    }

    #[test]
    fn reserved_type_names_cannot_be_declared() {
        let mut b = ModuleBuilder::new("t");
        assert!(b.declare("struct List { x :: I32 }").is_err());
        assert!(b.declare("alias I32 = U32").is_err());
    }
}
