//! Single-pass walk over a Python syntax tree collecting imports and references.

use regex::Regex;
use tree_sitter::Node;

use sweepy_core::analyzer::ParsedFile;
use sweepy_core::types::{Binding, DynamicImport, FileExtraction, ImportKind, ImportRecord};

const DYNAMIC_IMPORTERS: &[&str] = &["importlib.import_module", "import_module", "__import__"];
const REEXPORT_LIST: &str = "__all__";

pub(crate) struct Patterns {
    pub noqa: Regex,
    pub identifier: Regex,
}

/// Context inherited from enclosing nodes.
#[derive(Debug, Clone, Copy, Default)]
struct Scope {
    /// Inside `try` or an `if`/`elif TYPE_CHECKING` branch.
    conditional: bool,
    /// Inside a type annotation, where strings are forward references.
    annotation: bool,
}

impl Scope {
    fn enter(self, node: Node<'_>, source: &str) -> Self {
        match node.kind() {
            "try_statement" => Self {
                conditional: true,
                ..self
            },
            "if_statement" | "elif_clause"
                if node
                    .child_by_field_name("condition")
                    .is_some_and(|c| is_type_checking(text(c, source))) =>
            {
                Self {
                    conditional: true,
                    ..self
                }
            }
            "type" => Self {
                annotation: true,
                ..self
            },
            _ => self,
        }
    }
}

pub(crate) fn extract(parsed: &ParsedFile, patterns: &Patterns) -> FileExtraction {
    let mut walker = Walker {
        file: &parsed.file,
        source: &parsed.content,
        lines: parsed.content.lines().collect(),
        patterns,
        out: FileExtraction::default(),
    };
    walker.walk(parsed.tree.root_node());
    walker.out
}

struct Walker<'a> {
    file: &'a str,
    source: &'a str,
    lines: Vec<&'a str>,
    patterns: &'a Patterns,
    out: FileExtraction,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, root: Node<'_>) {
        let mut stack = vec![(root, Scope::default())];

        while let Some((node, scope)) = stack.pop() {
            match node.kind() {
                "import_statement" | "import_from_statement" => {
                    self.record_import(node, scope);
                    continue;
                }
                "future_import_statement" | "comment" => continue,
                "identifier" => {
                    if !is_non_reference(node) {
                        self.out.references.insert(text(node, self.source));
                    }
                    continue;
                }
                "string" if scope.annotation => {
                    self.scan_forward_reference(node);
                    continue;
                }
                "call" => self.inspect_call(node),
                "assignment" | "augmented_assignment" => self.inspect_reexport_assignment(node),
                _ => {}
            }

            let inner = scope.enter(node, self.source);
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev().map(|child| (child, inner)));
        }
    }

    fn record_import(&mut self, node: Node<'_>, scope: Scope) {
        let file = self.file;
        let line = node.start_position().row + 1;
        let suppressed = self.has_noqa(node);
        let mut cursor = node.walk();

        let (kind, module) = if node.kind() == "import_from_statement" {
            let module = node
                .child_by_field_name("module_name")
                .map(|m| dotted(m, self.source))
                .unwrap_or_default();
            (ImportKind::From, Some(module))
        } else {
            (ImportKind::Import, None)
        };

        let record = |module: String, bindings: Vec<Binding>, wildcard: bool| ImportRecord {
            file: file.to_string(),
            line,
            module,
            kind,
            bindings,
            wildcard,
            conditional: scope.conditional,
            suppressed,
        };

        let is_wildcard = node
            .named_children(&mut cursor)
            .any(|c| c.kind() == "wildcard_import");
        if is_wildcard {
            let module = module.clone().unwrap_or_default();
            self.out.imports.push(record(module, Vec::new(), true));
            return;
        }

        let mut records = Vec::new();
        for name in node.children_by_field_name("name", &mut cursor) {
            let (original, alias) = split_alias(name, self.source);
            let binding = match (&alias, kind) {
                (Some(alias), _) => Binding::new(alias, &original, true),
                // `import a.b` binds `a`
                (None, ImportKind::Import) => {
                    let head = original.split('.').next().unwrap_or(&original);
                    Binding::new(head, &original, false)
                }
                (None, ImportKind::From) => Binding::new(&original, &original, false),
            };
            let module = module.clone().unwrap_or_else(|| original.clone());
            records.push(record(module, vec![binding], false));
        }
        self.out.imports.extend(records);
    }

    fn has_noqa(&self, node: Node<'_>) -> bool {
        let first = node.start_position().row;
        let last = node.end_position().row;
        (first..=last)
            .filter_map(|row| self.lines.get(row))
            .filter_map(|line| self.patterns.noqa.captures(line))
            .any(|caps| match caps.name("codes") {
                None => true,
                Some(codes) => codes
                    .as_str()
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .any(|code| code.eq_ignore_ascii_case("F401")),
            })
    }

    /// `def f(x: "Dict[str, Model]")`: every identifier inside counts as used.
    fn scan_forward_reference(&mut self, node: Node<'_>) {
        let value = string_value(node, self.source);
        for m in self.patterns.identifier.find_iter(&value) {
            self.out.references.insert(m.as_str());
        }
    }

    fn inspect_call(&mut self, node: Node<'_>) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let arguments = node.child_by_field_name("arguments");
        let callee = text(function, self.source);

        if DYNAMIC_IMPORTERS.contains(&callee) {
            let target = arguments
                .and_then(|args| args.named_child(0))
                .filter(|arg| arg.kind() == "string")
                .map(|arg| string_value(arg, self.source));
            self.out.dynamic_imports.push(DynamicImport {
                line: node.start_position().row + 1,
                target,
            });
            return;
        }

        // __all__.extend([...]) / __all__.append("...")
        if function.kind() == "attribute" {
            let object = function.child_by_field_name("object").map(|o| text(o, self.source));
            let method = function
                .child_by_field_name("attribute")
                .map(|a| text(a, self.source));
            if object == Some(REEXPORT_LIST) && matches!(method, Some("extend" | "append")) {
                if let Some(args) = arguments {
                    self.add_reexports(args);
                }
            }
        }
    }

    /// `__all__ = [...]` and `__all__ += [...]`
    fn inspect_reexport_assignment(&mut self, node: Node<'_>) {
        let is_reexport = node
            .child_by_field_name("left")
            .is_some_and(|left| text(left, self.source) == REEXPORT_LIST);
        if !is_reexport {
            return;
        }
        if let Some(right) = node.child_by_field_name("right") {
            self.add_reexports(right);
        }
    }

    fn add_reexports(&mut self, node: Node<'_>) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current.kind() == "string" {
                let name = string_value(current, self.source);
                if !name.is_empty() {
                    self.out.references.insert(name);
                }
                continue;
            }
            let mut cursor = current.walk();
            stack.extend(current.named_children(&mut cursor));
        }
    }
}

fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}

/// Source text of a dotted or relative module path with whitespace removed.
fn dotted(node: Node<'_>, source: &str) -> String {
    text(node, source).split_whitespace().collect()
}

/// `a.b as c` -> ("a.b", Some("c")), `a.b` -> ("a.b", None)
fn split_alias(node: Node<'_>, source: &str) -> (String, Option<String>) {
    if node.kind() == "aliased_import" {
        let original = node
            .child_by_field_name("name")
            .map(|n| dotted(n, source))
            .unwrap_or_default();
        let alias = node
            .child_by_field_name("alias")
            .map(|a| text(a, source).to_string());
        (original, alias)
    } else {
        (dotted(node, source), None)
    }
}

/// Attribute members (`x.name`), keyword names (`f(name=...)`) and the names
/// of `def`/`class` statements are not references to a binding.
fn is_non_reference(node: Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    match parent.kind() {
        "attribute" => parent.child_by_field_name("attribute") == Some(node),
        "keyword_argument" | "function_definition" | "class_definition" => {
            parent.child_by_field_name("name") == Some(node)
        }
        _ => false,
    }
}

fn is_type_checking(condition: &str) -> bool {
    let condition = condition.trim();
    let condition = condition
        .strip_prefix("not ")
        .map(str::trim)
        .unwrap_or(condition);
    condition == "TYPE_CHECKING" || condition.ends_with(".TYPE_CHECKING")
}

/// Contents of a string literal without prefix and quotes.
fn string_value(node: Node<'_>, source: &str) -> String {
    let mut cursor = node.walk();
    let parts: Vec<&str> = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "string_content")
        .map(|c| text(c, source))
        .collect();
    if !parts.is_empty() {
        return parts.concat();
    }
    unquote(text(node, source)).to_string()
}

fn unquote(literal: &str) -> &str {
    let body = literal.trim_start_matches(|c: char| "rRbBuUfF".contains(c));
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = body
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    body
}
