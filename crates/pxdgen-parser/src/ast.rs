//! Cython declaration model
//!
//! Items extracted from a C header, in the shape they take in a `.pxd`.
//! [`PxdModule`] renders the whole `cdef extern from` block via `Display`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Indentation of items inside the extern block
const ITEM_INDENT: &str = "    ";
/// Indentation of struct fields and enum values
const MEMBER_INDENT: &str = "        ";

/// All declarations of one header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PxdModule {
    /// Path used in `cdef extern from "<origin>"`
    pub origin: String,
    pub items: Vec<PxdItem>,
}

impl PxdModule {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, item: PxdItem) {
        self.items.push(item);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Declaration item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PxdItem {
    Struct(StructNode),
    Enum(EnumNode),
    Typedef(TypedefNode),
    Function(FunctionNode),
    Variable(VariableNode),
}

/// Struct or union
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateKind {
    Struct,
    Union,
}

impl AggregateKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            AggregateKind::Struct => "struct",
            AggregateKind::Union => "union",
        }
    }
}

/// Struct or union declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructNode {
    pub kind: AggregateKind,
    pub name: String,
    /// `None` for a forward declaration
    pub fields: Option<Vec<FieldNode>>,
    /// Declared through `typedef struct { ... } name;`
    pub is_typedef: bool,
}

/// Struct field, e.g. `char *name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNode {
    pub name: String,
    pub declaration: String,
}

/// Enum declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumNode {
    /// `None` for an anonymous enum
    pub name: Option<String>,
    pub values: Vec<String>,
    /// Declared through `typedef enum { ... } name;`
    pub is_typedef: bool,
}

/// `ctypedef <declaration>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedefNode {
    pub alias: String,
    pub declaration: String,
}

/// Function prototype, e.g. `int slurm_init(char *conf)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionNode {
    pub name: String,
    pub declaration: String,
}

/// Global variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableNode {
    pub name: String,
    pub declaration: String,
}

impl fmt::Display for PxdItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PxdItem::Struct(st) => {
                let kw = st.kind.keyword();
                match &st.fields {
                    None => writeln!(f, "{}cdef {} {}", ITEM_INDENT, kw, st.name),
                    Some(fields) => {
                        let prefix = if st.is_typedef { "ctypedef" } else { "cdef" };
                        writeln!(f, "{}{} {} {}:", ITEM_INDENT, prefix, kw, st.name)?;
                        if fields.is_empty() {
                            writeln!(f, "{}pass", MEMBER_INDENT)?;
                        }
                        for field in fields {
                            writeln!(f, "{}{}", MEMBER_INDENT, field.declaration)?;
                        }
                        writeln!(f)
                    }
                }
            }
            PxdItem::Enum(en) => {
                let prefix = if en.is_typedef { "ctypedef enum" } else { "cpdef enum" };
                match &en.name {
                    Some(name) => writeln!(f, "{}{} {}:", ITEM_INDENT, prefix, name)?,
                    None => writeln!(f, "{}{}:", ITEM_INDENT, prefix)?,
                }
                if en.values.is_empty() {
                    writeln!(f, "{}pass", MEMBER_INDENT)?;
                }
                for value in &en.values {
                    writeln!(f, "{}{}", MEMBER_INDENT, value)?;
                }
                writeln!(f)
            }
            PxdItem::Typedef(td) => writeln!(f, "{}ctypedef {}", ITEM_INDENT, td.declaration),
            PxdItem::Function(func) => writeln!(f, "{}{}", ITEM_INDENT, func.declaration),
            PxdItem::Variable(var) => writeln!(f, "{}{}", ITEM_INDENT, var.declaration),
        }
    }
}

impl fmt::Display for PxdModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cdef extern from \"{}\":", self.origin)?;
        writeln!(f)?;
        if self.items.is_empty() {
            return writeln!(f, "{}pass", ITEM_INDENT);
        }
        for item in &self.items {
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_module() {
        let mut module = PxdModule::new("slurm/slurm.h");
        module.push(PxdItem::Struct(StructNode {
            kind: AggregateKind::Struct,
            name: "job_info".into(),
            fields: Some(vec![
                FieldNode {
                    name: "job_id".into(),
                    declaration: "uint32_t job_id".into(),
                },
                FieldNode {
                    name: "name".into(),
                    declaration: "char *name".into(),
                },
            ]),
            is_typedef: false,
        }));
        module.push(PxdItem::Typedef(TypedefNode {
            alias: "job_info_t".into(),
            declaration: "job_info job_info_t".into(),
        }));
        module.push(PxdItem::Enum(EnumNode {
            name: Some("job_states".into()),
            values: vec!["JOB_PENDING".into(), "JOB_RUNNING".into()],
            is_typedef: false,
        }));
        module.push(PxdItem::Function(FunctionNode {
            name: "slurm_init".into(),
            declaration: "void slurm_init(const char *conf)".into(),
        }));

        assert_eq!(
            module.to_string(),
            "\
cdef extern from \"slurm/slurm.h\":

    cdef struct job_info:
        uint32_t job_id
        char *name

    ctypedef job_info job_info_t
    cpdef enum job_states:
        JOB_PENDING
        JOB_RUNNING

    void slurm_init(const char *conf)
"
        );
    }

    #[test]
    fn test_render_empty_bodies() {
        let mut module = PxdModule::new("x.h");
        assert_eq!(module.to_string(), "cdef extern from \"x.h\":\n\n    pass\n");

        module.push(PxdItem::Struct(StructNode {
            kind: AggregateKind::Union,
            name: "u".into(),
            fields: Some(vec![]),
            is_typedef: true,
        }));
        module.push(PxdItem::Struct(StructNode {
            kind: AggregateKind::Struct,
            name: "opaque".into(),
            fields: None,
            is_typedef: false,
        }));
        assert_eq!(
            module.to_string(),
            "cdef extern from \"x.h\":\n\n    ctypedef union u:\n        pass\n\n    cdef struct opaque\n"
        );
    }
}
