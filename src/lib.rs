//! Declarative JSON shapes.
//!
//! Declare records, sums, aliases and attributed tables in a small surface
//! language, then read and write JSON for them with the dynamic [`Codec`],
//! export draft-07 JSON Schema, or generate Rust types whose
//! [`ToJson`]/[`FromJson`] impls follow the same wire rules.
pub mod ir;
pub mod error;
pub mod module;
pub mod frontend;
pub mod lower;
pub mod value;
pub mod codec;
pub mod table;
pub mod schema;
pub mod codegen;
pub mod cli;

// generated code reaches these through `json_shapes::native`
pub use serde_json;
pub use indexmap;

pub use codec::{Codec, CodecOptions, DEFAULT_MAX_DEPTH, ReadCx, encode, encode_to_string, native};
pub use codec::native::{FromJson, ToJson};
pub use codegen::{Codegen, generate_rust, rust_file_name};
pub use error::{CodecError, FrontendError};
pub use frontend::{module_header, parse_module};
pub use ir::{Decl, DeclRef, Field, Prim, TableSpec, Ty, Variant};
pub use module::{Module, ModuleBuilder};
pub use schema::{module_schema, schema_file_name, type_schema};
pub use table::{Attribute, Cell, ForeignKey, MemTables, TableStore};
pub use value::{Bytes, OrderedMap, Symbol, Value};
