//! Surface declarations → syntax tree → IR.
//!
//! Parsing is purely syntactic; names are resolved by `crate::lower`
//! against the builder the declaration is being added to.
pub mod lexer;

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::FrontendError;
use crate::lower;
use crate::module::{Module, ModuleBuilder};
use lexer::{Token, TokenKind};

// ————————————————————————————————————————————————————————————————————————————
// SYNTAX
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `Name`, `module.Name`, or a primitive.
    Path { segments: Vec<String>, offset: usize },
    /// `Ctor(args)`; `fragment` is the source text, kept for diagnostics.
    Apply { ctor: String, args: Vec<TypeArg>, offset: usize, fragment: String },
    Tuple(Vec<TypeExpr>),
    Record(Vec<FieldExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeArg {
    Type(TypeExpr),
    Doc(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldExpr {
    pub name: Option<String>, // None → ordinal name
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantExpr {
    pub tag: String,
    pub fields: Vec<FieldExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableItem {
    Ob(Vec<String>),
    Hom { name: String, dom: String, codom: String },
    AttrType { name: String, ty: TypeExpr },
    Attr { name: String, dom: String, codom: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclExpr {
    Alias { name: String, ty: TypeExpr },
    Struct { name: String, fields: Vec<FieldExpr> },
    Sum { name: String, variants: Vec<VariantExpr> },
    Table { name: String, items: Vec<TableItem> },
}

impl DeclExpr {
    pub fn name(&self) -> &str {
        match self {
            DeclExpr::Alias { name, .. }
            | DeclExpr::Struct { name, .. }
            | DeclExpr::Sum { name, .. }
            | DeclExpr::Table { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub module: String,
    pub imports: Vec<String>,
    pub decls: Vec<DeclExpr>,
}

// ————————————————————————————————————————————————————————————————————————————
// PARSER
// ————————————————————————————————————————————————————————————————————————————

/// Deepest type expression the parser descends into.
pub const MAX_TYPE_NESTING: usize = 64;

pub struct Parser<'src> {
    src: &'src str,
    tokens: Vec<Token>,
    current: usize,
    nesting: usize,
}

impl<'src> Parser<'src> {
    pub fn new(src: &'src str) -> Result<Self, FrontendError> {
        Ok(Self { src, tokens: lexer::tokenize(src)?, current: 0, nesting: 0 })
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.current].kind
    }

    fn peek_next(&self) -> &TokenKind {
        let i = (self.current + 1).min(self.tokens.len() - 1);
        &self.tokens[i].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        if token.kind != TokenKind::Eof {
            self.current += 1;
        }
        token
    }

    fn is_at_end(&self) -> bool {
        *self.peek() == TokenKind::Eof
    }

    fn offset(&self) -> usize {
        self.tokens[self.current].start
    }

    /// Source text from `start` up to the end of the previous token.
    fn text_since(&self, start: usize) -> String {
        let end = self.tokens[self.current.saturating_sub(1)].end.max(start);
        self.src[start..end].to_owned()
    }

    fn error(&self, message: impl Into<String>) -> FrontendError {
        let token = &self.tokens[self.current];
        FrontendError::parse(token.start, token.kind.to_string(), message)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), FrontendError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{kind}`")))
        }
    }

    fn expect_ident(&mut self) -> Result<String, FrontendError> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error("expected an identifier")),
        }
    }

    fn is_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), TokenKind::Ident(s) if s == word)
    }

    fn expect_keyword(&mut self, word: &str) -> Result<(), FrontendError> {
        if self.is_keyword(word) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected `{word}`")))
        }
    }

    // ---- files & declarations ----

    pub fn parse_file(&mut self) -> Result<SourceFile, FrontendError> {
        self.expect_keyword("module")?;
        let module = self.expect_ident()?;
        let mut imports = Vec::new();
        while self.is_keyword("import") {
            self.advance();
            imports.push(self.expect_ident()?);
        }
        let mut decls = Vec::new();
        while !self.is_at_end() {
            decls.push(self.parse_decl()?);
        }
        Ok(SourceFile { module, imports, decls })
    }

    /// Exactly one declaration and nothing after it.
    pub fn parse_single(&mut self) -> Result<DeclExpr, FrontendError> {
        let decl = self.parse_decl()?;
        if !self.is_at_end() {
            return Err(self.error("expected a single declaration"));
        }
        Ok(decl)
    }

    pub fn parse_decl(&mut self) -> Result<DeclExpr, FrontendError> {
        let TokenKind::Ident(word) = self.peek().clone() else {
            return Err(self.error("expected a declaration"));
        };
        match word.as_str() {
            "struct" => {
                self.advance();
                let name = self.expect_ident()?;
                self.expect(&TokenKind::LBrace)?;
                let fields = self.parse_fields(&TokenKind::RBrace)?;
                Ok(DeclExpr::Struct { name, fields })
            }
            "sum" => {
                self.advance();
                let name = self.expect_ident()?;
                self.expect(&TokenKind::LBrace)?;
                self.eat(&TokenKind::Pipe);
                let mut variants = vec![self.parse_variant()?];
                while self.eat(&TokenKind::Pipe) {
                    variants.push(self.parse_variant()?);
                }
                self.expect(&TokenKind::RBrace)?;
                Ok(DeclExpr::Sum { name, variants })
            }
            "alias" => {
                self.advance();
                let name = self.expect_ident()?;
                self.expect(&TokenKind::Eq)?;
                let ty = self.parse_type()?;
                Ok(DeclExpr::Alias { name, ty })
            }
            "table" => {
                self.advance();
                let name = self.expect_ident()?;
                self.expect(&TokenKind::LBrace)?;
                let mut items = Vec::new();
                while !self.eat(&TokenKind::RBrace) {
                    items.push(self.parse_table_item()?);
                }
                Ok(DeclExpr::Table { name, items })
            }
            _ => Err(self.error("expected `struct`, `sum`, `alias` or `table`")),
        }
    }

    fn parse_variant(&mut self) -> Result<VariantExpr, FrontendError> {
        let tag = self.expect_ident()?;
        let fields = if self.eat(&TokenKind::LParen) {
            self.parse_fields(&TokenKind::RParen)?
        } else {
            Vec::new()
        };
        Ok(VariantExpr { tag, fields })
    }

    fn parse_table_item(&mut self) -> Result<TableItem, FrontendError> {
        let TokenKind::Ident(word) = self.peek().clone() else {
            return Err(self.error("expected `ob`, `hom`, `attrtype` or `attr`"));
        };
        self.advance();
        match word.as_str() {
            "ob" => {
                let mut names = vec![self.expect_ident()?];
                while self.eat(&TokenKind::Comma) {
                    names.push(self.expect_ident()?);
                }
                Ok(TableItem::Ob(names))
            }
            "hom" | "attr" => {
                let name = self.expect_ident()?;
                self.expect(&TokenKind::ColonColon)?;
                let dom = self.expect_ident()?;
                self.expect(&TokenKind::Arrow)?;
                let codom = self.expect_ident()?;
                Ok(if word == "hom" {
                    TableItem::Hom { name, dom, codom }
                } else {
                    TableItem::Attr { name, dom, codom }
                })
            }
            "attrtype" => {
                let name = self.expect_ident()?;
                self.expect(&TokenKind::Eq)?;
                let ty = self.parse_type()?;
                Ok(TableItem::AttrType { name, ty })
            }
            _ => Err(FrontendError::parse(
                self.tokens[self.current - 1].start,
                word,
                "expected `ob`, `hom`, `attrtype` or `attr`",
            )),
        }
    }

    // ---- fields & types ----

    /// Comma separated fields up to and including `close`; trailing comma allowed.
    fn parse_fields(&mut self, close: &TokenKind) -> Result<Vec<FieldExpr>, FrontendError> {
        let mut fields = Vec::new();
        while !self.eat(close) {
            fields.push(self.parse_field()?);
            if !self.eat(&TokenKind::Comma) {
                self.expect(close)?;
                break;
            }
        }
        Ok(fields)
    }

    fn parse_field(&mut self) -> Result<FieldExpr, FrontendError> {
        let named = match (self.peek(), self.peek_next()) {
            (TokenKind::Ident(name), TokenKind::ColonColon) => Some(name.clone()),
            _ => None,
        };
        if let Some(name) = named {
            self.advance();
            self.advance();
            let ty = self.parse_type()?;
            return Ok(FieldExpr { name: Some(name), ty });
        }
        Ok(FieldExpr { name: None, ty: self.parse_type()? })
    }

    pub fn parse_type(&mut self) -> Result<TypeExpr, FrontendError> {
        if self.nesting >= MAX_TYPE_NESTING {
            return Err(self.error(format!("type nested deeper than {MAX_TYPE_NESTING} levels")));
        }
        self.nesting += 1;
        let ty = self.parse_type_inner();
        self.nesting -= 1;
        ty
    }

    fn parse_type_inner(&mut self) -> Result<TypeExpr, FrontendError> {
        let start = self.offset();
        match self.peek().clone() {
            TokenKind::Ident(head) => {
                self.advance();
                if self.eat(&TokenKind::LParen) {
                    let mut args = Vec::new();
                    while !self.eat(&TokenKind::RParen) {
                        let arg = match self.peek().clone() {
                            TokenKind::Str(doc) => {
                                self.advance();
                                TypeArg::Doc(doc)
                            }
                            _ => TypeArg::Type(self.parse_type()?),
                        };
                        args.push(arg);
                        if !self.eat(&TokenKind::Comma) {
                            self.expect(&TokenKind::RParen)?;
                            break;
                        }
                    }
                    let fragment = self.text_since(start);
                    return Ok(TypeExpr::Apply { ctor: head, args, offset: start, fragment });
                }
                let mut segments = vec![head];
                while self.eat(&TokenKind::Dot) {
                    segments.push(self.expect_ident()?);
                }
                Ok(TypeExpr::Path { segments, offset: start })
            }
            TokenKind::LParen => {
                self.advance();
                let mut elems = Vec::new();
                let mut trailing_comma = false;
                while !self.eat(&TokenKind::RParen) {
                    elems.push(self.parse_type()?);
                    trailing_comma = self.eat(&TokenKind::Comma);
                    if !trailing_comma {
                        self.expect(&TokenKind::RParen)?;
                        break;
                    }
                }
                // `(T)` groups, it is not a 1-tuple
                if elems.len() == 1 && !trailing_comma {
                    return Ok(elems.remove(0));
                }
                Ok(TypeExpr::Tuple(elems))
            }
            TokenKind::LBrace => {
                self.advance();
                let fields = self.parse_fields(&TokenKind::RBrace)?;
                Ok(TypeExpr::Record(fields))
            }
            _ => Err(self.error("expected a type")),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINTS
// ————————————————————————————————————————————————————————————————————————————

impl ModuleBuilder {
    /// Compile one declaration into the module under construction and return
    /// its name. On failure the builder is left as it was.
    pub fn declare(&mut self, src: &str) -> Result<String, FrontendError> {
        let decl = Parser::new(src)?.parse_single()?;
        let mark = self.mark();
        let result = lower::reserve_names(self, &decl)
            .and_then(|()| lower::lower_decl(self, &decl));
        if let Err(error) = result {
            self.rollback(mark);
            return Err(error);
        }
        Ok(decl.name().to_owned())
    }
}

/// Parse the `module` / `import` header only.
pub fn module_header(src: &str) -> Result<(String, Vec<String>), FrontendError> {
    let mut parser = Parser::new(src)?;
    parser.expect_keyword("module")?;
    let name = parser.expect_ident()?;
    let mut imports = Vec::new();
    while parser.is_keyword("import") {
        parser.advance();
        imports.push(parser.expect_ident()?);
    }
    Ok((name, imports))
}

/// Compile a whole source file. Every declaration name is reserved before any
/// body is lowered, so declarations of one file may refer to each other in
/// any order.
pub fn parse_module(
    src: &str,
    available: &IndexMap<String, Arc<Module>>,
) -> Result<Module, FrontendError> {
    let file = Parser::new(src)?.parse_file()?;
    let mut builder = ModuleBuilder::new(file.module.clone());
    for import in &file.imports {
        let module = available.get(import)
            .ok_or_else(|| FrontendError::UnknownImport(import.clone()))?;
        builder.import(module.clone())?;
    }
    for decl in &file.decls {
        lower::reserve_names(&mut builder, decl)?;
    }
    for decl in &file.decls {
        lower::lower_decl(&mut builder, decl)?;
    }
    debug!(module = %file.module, decls = file.decls.len(), "parsed module");
    builder.finish()
}
