//! Serde view of the GIR document.
//!
//! Only the parts discovery reads are modelled; everything else is ignored
//! during decoding. Namespaced attributes (`c:type`, `c:identifier`,
//! `glib:nick`) are expected in their normalized `c-type` form.

use serde::Deserialize;
use serde::de::IgnoredAny;

#[derive(Debug, Default, Deserialize)]
pub struct Repository {
    #[serde(rename = "namespace", default)]
    pub namespaces: Vec<Namespace>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Namespace {
    #[serde(rename = "@name", default)]
    pub name: Option<String>,
    #[serde(rename = "function", default)]
    pub functions: Vec<Function>,
    #[serde(rename = "class", default)]
    pub classes: Vec<Container>,
    #[serde(rename = "interface", default)]
    pub interfaces: Vec<Container>,
    #[serde(rename = "record", default)]
    pub records: Vec<Container>,
    #[serde(rename = "enumeration", default)]
    pub enumerations: Vec<Enumeration>,
    #[serde(rename = "bitfield", default)]
    pub bitfields: Vec<Enumeration>,
}

/// A class, interface or record. Constructors are not operations and are
/// left undecoded.
#[derive(Debug, Default, Deserialize)]
pub struct Container {
    #[serde(rename = "@name", default)]
    pub name: Option<String>,
    #[serde(rename = "method", default)]
    pub methods: Vec<Function>,
    #[serde(rename = "function", default)]
    pub functions: Vec<Function>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Function {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@c-identifier", default)]
    pub c_identifier: Option<String>,
    #[serde(rename = "@introspectable", default)]
    pub introspectable: Option<String>,
    #[serde(rename = "@deprecated", default)]
    pub deprecated: Option<String>,
    #[serde(default)]
    pub doc: Option<Doc>,
    #[serde(default)]
    pub parameters: Option<Parameters>,
}

impl Function {
    pub fn is_introspectable(&self) -> bool {
        self.introspectable.as_deref() != Some("0")
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated.as_deref() == Some("1")
    }

    pub fn doc_text(&self) -> &str {
        self.doc.as_ref().map_or("", |d| d.text.as_str())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Doc {
    #[serde(rename = "$text", default)]
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Parameters {
    #[serde(rename = "instance-parameter", default)]
    pub instance: Option<Parameter>,
    #[serde(rename = "parameter", default)]
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Parameter {
    #[serde(rename = "@name", default)]
    pub name: Option<String>,
    #[serde(rename = "@direction", default)]
    pub direction: Option<String>,
    #[serde(rename = "@optional", default)]
    pub optional: Option<String>,
    #[serde(default)]
    pub doc: Option<Doc>,
    #[serde(rename = "type", default)]
    pub type_ref: Option<TypeRef>,
    #[serde(default)]
    pub array: Option<ArrayRef>,
    #[serde(default)]
    pub varargs: Option<IgnoredAny>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TypeRef {
    #[serde(rename = "@name", default)]
    pub name: Option<String>,
    #[serde(rename = "@c-type", default)]
    pub c_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArrayRef {
    #[serde(rename = "@c-type", default)]
    pub c_type: Option<String>,
    #[serde(rename = "@length", default)]
    pub length: Option<String>,
    #[serde(rename = "@fixed-size", default)]
    pub fixed_size: Option<String>,
    #[serde(rename = "@zero-terminated", default)]
    pub zero_terminated: Option<String>,
    #[serde(rename = "type", default)]
    pub element: Option<TypeRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Enumeration {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@c-type", default)]
    pub c_type: Option<String>,
    #[serde(rename = "member", default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Member {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@value", default)]
    pub value: Option<String>,
    #[serde(rename = "@c-identifier", default)]
    pub c_identifier: Option<String>,
    #[serde(rename = "@glib-nick", default)]
    pub nick: Option<String>,
}
