//! Tree-sitter based declaration extraction
//!
//! Walks a C syntax tree and collects the declarations that belong in a
//! Cython extern block.

use pxdgen_core::Result;
use std::collections::HashSet;
use tree_sitter::{Node, Parser as TSParser, Tree};
use tracing::debug;

use crate::ast::{
    AggregateKind, EnumNode, FieldNode, FunctionNode, PxdItem, PxdModule, StructNode, TypedefNode,
    VariableNode,
};

/// Syntax error found while parsing a header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// 1-based line
    pub line: usize,
    /// 0-based column
    pub column: usize,
    /// Source text around the error
    pub snippet: String,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "syntax error at {}:{} near `{}`",
            self.line, self.column, self.snippet
        )
    }
}

/// Tree-sitter based extractor for C headers
pub struct DeclarationExtractor {
    parser: TSParser,
}

impl DeclarationExtractor {
    /// Create a new extractor for C
    pub fn new() -> Result<Self> {
        let mut parser = TSParser::new();
        parser
            .set_language(&tree_sitter_c::language())
            .map_err(|e| pxdgen_core::Error::Parse(format!("Failed to load C grammar: {}", e)))?;
        Ok(Self { parser })
    }

    /// Parse `source` into a syntax tree
    pub fn parse(&mut self, source: &str) -> Result<Tree> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| pxdgen_core::Error::Parse("Failed to parse source".into()))
    }

    /// Parse `source` and collect its declarations.
    ///
    /// The outer `Result` fails only if tree-sitter produced no tree; a tree
    /// containing syntax errors is reported through the inner `Err`.
    pub fn extract(
        &mut self,
        source: &str,
        origin: &str,
    ) -> Result<std::result::Result<PxdModule, SyntaxError>> {
        let tree = self.parse(source)?;
        let root = tree.root_node();

        if root.has_error() {
            let error = first_error(root, source).unwrap_or(SyntaxError {
                line: 0,
                column: 0,
                snippet: String::new(),
            });
            return Ok(Err(error));
        }

        let mut walker = Walker {
            source,
            module: PxdModule::new(origin),
            declared: HashSet::new(),
        };
        walker.visit(root);
        Ok(Ok(walker.module))
    }
}

fn first_error(node: Node, source: &str) -> Option<SyntaxError> {
    if node.is_error() || node.is_missing() {
        let pos = node.start_position();
        let snippet: String = node_text(node, source).chars().take(40).collect();
        return Some(SyntaxError {
            line: pos.row + 1,
            column: pos.column,
            snippet,
        });
    }

    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(|c| first_error(c, source))
}

fn node_text(node: Node, source: &str) -> String {
    node.utf8_text(source.as_bytes()).unwrap_or("").to_string()
}

/// Collapse runs of whitespace, e.g. in `unsigned   long`
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct Walker<'s> {
    source: &'s str,
    module: PxdModule,
    /// Struct and union names already declared, forward or full
    declared: HashSet<String>,
}

impl<'s> Walker<'s> {
    fn text(&self, node: Node) -> String {
        node_text(node, self.source)
    }

    fn visit(&mut self, node: Node) {
        match node.kind() {
            "declaration" => self.visit_declaration(node),
            "type_definition" => self.visit_type_definition(node),
            // `struct foo { ... };` without declarators
            "struct_specifier" | "union_specifier" | "enum_specifier" => {
                self.declare_type(node, None)
            }
            // function bodies and statements have nothing to declare
            "function_definition" | "expression_statement" | "comment" => {}
            _ => {
                let mut cursor = node.walk();
                let children: Vec<Node> = node.named_children(&mut cursor).collect();
                for child in children {
                    self.visit(child);
                }
            }
        }
    }

    fn visit_declaration(&mut self, node: Node) {
        let Some(type_node) = node.child_by_field_name("type") else {
            return;
        };
        self.declare_type(type_node, None);

        let base = self.base_type(node);
        for declarator in declarators(node) {
            let (name, decl) = self.declarator(declarator);
            let Some(name) = name else { continue };
            let declaration = format!("{} {}", base, decl);

            if is_function(declarator) {
                debug!("Found function: {}", name);
                self.module.push(PxdItem::Function(FunctionNode { name, declaration }));
            } else {
                debug!("Found variable: {}", name);
                self.module.push(PxdItem::Variable(VariableNode { name, declaration }));
            }
        }
    }

    fn visit_type_definition(&mut self, node: Node) {
        let Some(type_node) = node.child_by_field_name("type") else {
            return;
        };
        let declarators = declarators(node);

        // typedef struct { ... } name_t;
        let anonymous_body = type_node.child_by_field_name("name").is_none()
            && type_node.child_by_field_name("body").is_some();
        let mut rest = declarators.as_slice();
        let mut base = self.base_type(node);

        if anonymous_body {
            if let Some((first, tail)) = declarators.split_first() {
                if matches!(first.kind(), "type_identifier" | "identifier") {
                    let alias = self.text(*first);
                    self.declare_type(type_node, Some(alias.clone()));
                    base = alias;
                    rest = tail;
                }
            }
        } else {
            self.declare_type(type_node, None);
        }

        for declarator in rest {
            let (name, decl) = self.declarator(*declarator);
            let Some(alias) = name else { continue };
            debug!("Found typedef: {}", alias);
            self.module.push(PxdItem::Typedef(TypedefNode {
                alias,
                declaration: format!("{} {}", base, decl),
            }));
        }
    }

    /// Emit struct, union and enum declarations carried by a type specifier
    fn declare_type(&mut self, type_node: Node, typedef_alias: Option<String>) {
        let kind = match type_node.kind() {
            "struct_specifier" => AggregateKind::Struct,
            "union_specifier" => AggregateKind::Union,
            "enum_specifier" => {
                self.declare_enum(type_node, typedef_alias);
                return;
            }
            _ => return,
        };

        let is_typedef = typedef_alias.is_some();
        let name = match type_node.child_by_field_name("name") {
            Some(n) => self.text(n),
            None => match typedef_alias {
                Some(alias) => alias,
                None => return,
            },
        };

        match type_node.child_by_field_name("body") {
            Some(body) => {
                debug!("Found {}: {}", kind.keyword(), name);
                let fields = self.fields(body, &name);
                self.declared.insert(name.clone());
                self.module.push(PxdItem::Struct(StructNode {
                    kind,
                    name,
                    fields: Some(fields),
                    is_typedef,
                }));
            }
            None => {
                if self.declared.insert(name.clone()) {
                    self.module.push(PxdItem::Struct(StructNode {
                        kind,
                        name,
                        fields: None,
                        is_typedef: false,
                    }));
                }
            }
        }
    }

    fn declare_enum(&mut self, node: Node, typedef_alias: Option<String>) {
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };

        let is_typedef = typedef_alias.is_some() && node.child_by_field_name("name").is_none();
        let name = match node.child_by_field_name("name") {
            Some(n) => Some(self.text(n)),
            None => typedef_alias,
        };

        let mut values = Vec::new();
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            if child.kind() == "enumerator" {
                if let Some(n) = child.child_by_field_name("name") {
                    values.push(self.text(n));
                }
            }
        }

        debug!("Found enum: {:?} ({} values)", name, values.len());
        self.module.push(PxdItem::Enum(EnumNode {
            name,
            values,
            is_typedef,
        }));
    }

    /// Members of an aggregate body named `owner`.
    ///
    /// Aggregates defined inside the body are declared first, at module
    /// level. Anonymous ones are named `_<owner>_<field>_<s|u|e>`; members of
    /// an anonymous struct or union without a declarator are lifted into
    /// `owner`, the way C11 exposes them.
    fn fields(&mut self, body: Node, owner: &str) -> Vec<FieldNode> {
        let mut fields = Vec::new();

        let mut cursor = body.walk();
        let members: Vec<Node> = body
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "field_declaration")
            .collect();

        for member in members {
            let declarators = declarators(member);
            let nested = member
                .child_by_field_name("type")
                .filter(|t| is_aggregate(*t) && t.child_by_field_name("body").is_some());

            let base = match nested {
                Some(nested) if declarators.is_empty() => {
                    self.lift_anonymous_member(nested, owner, &mut fields);
                    continue;
                }
                Some(nested) => {
                    let field = declarators
                        .first()
                        .and_then(|d| self.declarator(*d).0)
                        .unwrap_or_default();
                    let name = self.declare_nested(nested, owner, &field);
                    self.qualified(member, name)
                }
                None => self.base_type(member),
            };

            for declarator in declarators {
                let (name, decl) = self.declarator(declarator);
                if let Some(name) = name {
                    fields.push(FieldNode {
                        name,
                        declaration: format!("{} {}", base, decl),
                    });
                }
            }
        }

        fields
    }

    /// Declare an aggregate defined inside another one, returning its name
    fn declare_nested(&mut self, node: Node, owner: &str, field: &str) -> String {
        if let Some(name) = node.child_by_field_name("name") {
            self.declare_type(node, None);
            return self.text(name);
        }

        let (kind, suffix) = match node.kind() {
            "union_specifier" => (AggregateKind::Union, "u"),
            "enum_specifier" => {
                let name = format!("_{}_{}_e", owner, field);
                self.declare_enum(node, Some(name.clone()));
                return name;
            }
            _ => (AggregateKind::Struct, "s"),
        };

        let name = format!("_{}_{}_{}", owner, field, suffix);
        debug!("Found nested {}: {}", kind.keyword(), name);
        let fields = match node.child_by_field_name("body") {
            Some(body) => self.fields(body, &name),
            None => Vec::new(),
        };
        self.declared.insert(name.clone());
        self.module.push(PxdItem::Struct(StructNode {
            kind,
            name: name.clone(),
            fields: Some(fields),
            is_typedef: false,
        }));
        name
    }

    fn lift_anonymous_member(&mut self, node: Node, owner: &str, fields: &mut Vec<FieldNode>) {
        if node.kind() == "enum_specifier" {
            // only the enumerators are visible
            self.declare_enum(node, None);
            return;
        }
        if let Some(name) = node.child_by_field_name("name") {
            // `struct tag { ... };` inside a body declares the tag only
            debug!("Nested {} has no member", self.text(name));
            self.declare_type(node, None);
            return;
        }
        if let Some(body) = node.child_by_field_name("body") {
            fields.extend(self.fields(body, owner));
        }
    }

    /// Qualified base type of a declaration, without `struct`/`union`/`enum`
    fn base_type(&self, node: Node) -> String {
        let mut parts = Vec::new();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "type_qualifier" && self.text(child) == "const" {
                parts.push("const".to_string());
            }
        }

        if let Some(type_node) = node.child_by_field_name("type") {
            parts.push(self.type_name(type_node));
        }

        parts.join(" ")
    }

    /// `type_name` with the `const` qualifier of `node`, if any
    fn qualified(&self, node: Node, type_name: String) -> String {
        let mut cursor = node.walk();
        let is_const = node
            .children(&mut cursor)
            .any(|c| c.kind() == "type_qualifier" && self.text(c) == "const");
        if is_const {
            format!("const {}", type_name)
        } else {
            type_name
        }
    }

    fn type_name(&self, node: Node) -> String {
        match node.kind() {
            "struct_specifier" | "union_specifier" | "enum_specifier" => node
                .child_by_field_name("name")
                .map(|n| self.text(n))
                .unwrap_or_default(),
            _ => normalize(&self.text(node)),
        }
    }

    /// Render a declarator, returning the declared name and the text
    fn declarator(&self, node: Node) -> (Option<String>, String) {
        match node.kind() {
            "identifier" | "field_identifier" | "type_identifier" | "primitive_type" => {
                let name = self.text(node);
                (Some(name.clone()), name)
            }
            "pointer_declarator" | "abstract_pointer_declarator" => {
                let mut qualifiers = String::new();
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() == "type_qualifier" && self.text(child) == "const" {
                        qualifiers.push_str(" const ");
                    }
                }
                let (name, inner) = self.inner_declarator(node);
                (name, format!("*{}{}", qualifiers, inner).trim_end().to_string())
            }
            "array_declarator" | "abstract_array_declarator" => {
                let (name, inner) = self.inner_declarator(node);
                let size = node
                    .child_by_field_name("size")
                    .map(|s| normalize(&self.text(s)))
                    .unwrap_or_default();
                (name, format!("{}[{}]", inner, size))
            }
            "function_declarator" | "abstract_function_declarator" => {
                let (name, inner) = self.inner_declarator(node);
                let params = node
                    .child_by_field_name("parameters")
                    .map(|p| self.parameters(p))
                    .unwrap_or_else(|| "()".to_string());
                (name, format!("{}{}", inner, params))
            }
            "parenthesized_declarator" | "abstract_parenthesized_declarator" => {
                let mut cursor = node.walk();
                let inner = node.named_children(&mut cursor).next();
                match inner {
                    Some(inner) => {
                        let (name, text) = self.declarator(inner);
                        (name, format!("({})", text))
                    }
                    None => (None, "()".to_string()),
                }
            }
            "attributed_declarator" => {
                let mut cursor = node.walk();
                let inner = node.named_children(&mut cursor).next();
                match inner {
                    Some(inner) => self.declarator(inner),
                    None => (None, String::new()),
                }
            }
            _ => (None, normalize(&self.text(node))),
        }
    }

    fn inner_declarator(&self, node: Node) -> (Option<String>, String) {
        match node.child_by_field_name("declarator") {
            Some(inner) => self.declarator(inner),
            None => (None, String::new()),
        }
    }

    fn parameters(&self, node: Node) -> String {
        let mut params = Vec::new();

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "parameter_declaration" => {
                    let base = self.base_type(child);
                    let param = match child.child_by_field_name("declarator") {
                        Some(d) => format!("{} {}", base, self.declarator(d).1),
                        None => base,
                    };
                    params.push(param.trim().to_string());
                }
                "variadic_parameter" => params.push("...".to_string()),
                _ => {}
            }
        }

        if params.len() == 1 && params[0] == "void" {
            params.clear();
        }
        format!("({})", params.join(", "))
    }
}

fn is_aggregate(node: Node) -> bool {
    matches!(
        node.kind(),
        "struct_specifier" | "union_specifier" | "enum_specifier"
    )
}

fn declarators(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    let nodes = node
        .children_by_field_name("declarator", &mut cursor)
        .collect();
    nodes
}

/// Whether a declarator declares a function rather than a function pointer
fn is_function(node: Node) -> bool {
    match node.kind() {
        "function_declarator" => node
            .child_by_field_name("declarator")
            .map(|d| d.kind() != "parenthesized_declarator")
            .unwrap_or(true),
        "pointer_declarator" | "attributed_declarator" => node
            .child_by_field_name("declarator")
            .map(is_function)
            .unwrap_or(false),
        _ => false,
    }
}
