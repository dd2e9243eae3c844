//! SchemaSet → proto3 text.
//!
//! Purely textual: no identifier validation, no check that referenced message
//! names exist. Output is a pure function of the set's order and the options.
use std::fmt::Write as _;
use crate::ir::{FieldDecl, FieldType, MessageDef, ScalarType, SchemaSet};

pub const DEFAULT_PACKAGE: &str = "jsonbuf";

/// Spelling of floating-point scalar types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TypeNames {
    /// `float` / `double`
    #[default]
    Proto3,
    /// `float32` / `float64`
    Legacy,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    pub package: String,
    pub type_names: TypeNames,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { package: DEFAULT_PACKAGE.to_string(), type_names: TypeNames::default() }
    }
}

pub struct Codegen {
    options: RenderOptions,
    out: String,
}

impl Codegen {
    pub fn new(options: RenderOptions) -> Self {
        let mut out = String::new();
        let _ = write!(out, "syntax = \"proto3\";\n\npackage {};\n\n", options.package);
        Self { options, out }
    }

    pub fn emit(&mut self, schema: &SchemaSet) -> &mut Self {
        for message in schema.iter() {
            self.emit_message(message);
        }
        self
    }

    pub fn into_string(self) -> String { self.out }

    fn emit_message(&mut self, message: &MessageDef) {
        let _ = writeln!(self.out, "message {} {{", message.name);
        for field in &message.fields {
            self.emit_field(field);
        }
        self.out.push_str("}\n\n");
    }

    fn emit_field(&mut self, field: &FieldDecl) {
        let ty = type_name(&field.ty, self.options.type_names);
        let _ = writeln!(self.out, "\t{ty} {} = {};", field.name, field.number);
    }
}

pub fn scalar_name(ty: ScalarType, names: TypeNames) -> &'static str {
    match (ty, names) {
        (ScalarType::String, _) => "string",
        (ScalarType::Int32, _) => "int32",
        (ScalarType::Int64, _) => "int64",
        (ScalarType::Uint64, _) => "uint64",
        (ScalarType::Float, TypeNames::Proto3) => "float",
        (ScalarType::Float, TypeNames::Legacy) => "float32",
        (ScalarType::Double, TypeNames::Proto3) => "double",
        (ScalarType::Double, TypeNames::Legacy) => "float64",
    }
}

fn type_name(ty: &FieldType, names: TypeNames) -> &str {
    match ty {
        FieldType::Scalar(s) => scalar_name(*s, names),
        FieldType::Message(name) => name.as_str(),
        FieldType::Opaque(name) => *name,
    }
}

/// Render with default options.
pub fn render(schema: &SchemaSet) -> String {
    render_with(schema, &RenderOptions::default())
}

pub fn render_with(schema: &SchemaSet, options: &RenderOptions) -> String {
    let mut cg = Codegen::new(options.clone());
    cg.emit(schema);
    cg.into_string()
}
