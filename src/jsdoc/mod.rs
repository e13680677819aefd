//! Structural view of a JavaScript module source.
//!
//! [`Source`] parses a document once with oxc and keeps an owned outline of
//! its object literals: where each lives, how deeply it is nested, and for
//! each plain `key: value` member whether the value is a string or an array
//! literal. That answers the questions the site-config editors ask: where a
//! property's array literal lives, which object literal has a given set of
//! string properties, and where each element of an array begins and ends.
//! Edits are expressed as [`Splice`]s that replace a whole array literal
//! with a freshly rendered one, and the result goes through [`check`] before
//! it is written anywhere.

mod value;

pub use value::{quote, JsValue};

use oxc::allocator::Allocator;
use oxc::ast::ast::{
    ArrayExpression, ArrayExpressionElement, Expression, ObjectExpression, ObjectPropertyKind,
    Program, PropertyKind, Statement, StringLiteral, TemplateLiteral,
};
use oxc::ast_visit::{walk, Visit};
use oxc::diagnostics::OxcDiagnostic;
use oxc::parser::Parser;
use oxc::span::{GetSpan, SourceType, Span};

use crate::error::{MutatorError, MutatorResult};
use value::Lifter;

/// Indentation step used for rendered arrays and blocks.
pub const INDENT: &str = "  ";

/// A parsed document.
#[derive(Debug)]
pub struct Source<'a> {
    text: &'a str,
    objects: Vec<ObjectLiteral>,
    /// String and template literals that span more than one line.
    multiline: Vec<Range>,
}

type Range = (usize, usize);

/// An object literal and its plain members.
#[derive(Debug, Clone)]
pub struct ObjectLiteral {
    pub start: usize,
    pub end: usize,
    /// Number of object literals enclosing this one.
    pub depth: usize,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone)]
pub struct Property {
    pub key: String,
    pub value: PropertyValue,
}

#[derive(Debug, Clone)]
pub enum PropertyValue {
    Str(String),
    Array(ArrayLiteral),
    Other,
}

/// An array literal, from `[` through `]`.
#[derive(Debug, Clone)]
pub struct ArrayLiteral {
    pub start: usize,
    pub end: usize,
    pub elements: Vec<ArrayElement>,
}

/// One element of an array literal.
#[derive(Debug, Clone)]
pub struct ArrayElement {
    /// Byte range, including comments that lead the element.
    pub start: usize,
    pub end: usize,
    pub value: JsValue,
}

impl ObjectLiteral {
    /// The member bound to `key`. Later duplicates win.
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .rev()
            .find(|p| p.key == key)
            .map(|p| &p.value)
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        match self.property(key)? {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn array(&self, key: &str) -> Option<&ArrayLiteral> {
        match self.property(key)? {
            PropertyValue::Array(array) => Some(array),
            _ => None,
        }
    }
}

impl<'a> Source<'a> {
    pub fn parse(text: &'a str) -> MutatorResult<Self> {
        let (objects, multiline) = with_program(text, |program| {
            let mut outline = Outline::new(text, program);
            outline.visit_program(program);
            (outline.objects, outline.multiline)
        })?;
        Ok(Self {
            text,
            objects,
            multiline,
        })
    }

    /// The array literal bound to property `key`, preferring the shallowest
    /// occurrence and, among equals, the first.
    pub fn find_property_array(&self, key: &str) -> Option<&ArrayLiteral> {
        let mut best: Option<(usize, &ArrayLiteral)> = None;
        for object in &self.objects {
            let Some(array) = object.array(key) else {
                continue;
            };
            match best {
                Some((depth, _)) if depth <= object.depth => {}
                _ => best = Some((object.depth, array)),
            }
        }
        best.map(|(_, array)| array)
    }

    /// The first object literal whose direct string properties include every
    /// `(key, value)` pair in `wanted`, in any order.
    pub fn find_object_with(&self, wanted: &[(&str, &str)]) -> Option<&ObjectLiteral> {
        self.objects.iter().find(|object| {
            wanted
                .iter()
                .all(|(key, expected)| object.string(key) == Some(*expected))
        })
    }

    /// Whitespace prefix of the line containing byte `offset`.
    pub fn line_indent(&self, offset: usize) -> &'a str {
        let line_start = self.text[..offset].rfind('\n').map_or(0, |i| i + 1);
        let line = &self.text[line_start..];
        let width = line.len() - line.trim_start_matches([' ', '\t']).len();
        &line[..width.min(offset - line_start)]
    }

    /// Lift an element out as a [`Block`] whose continuation lines are
    /// relative to the indentation of the line it started on.
    pub fn element_block(&self, element: &ArrayElement) -> Block {
        let raw = &self.text[element.start..element.end];
        let multiline_literal = self
            .multiline
            .iter()
            .any(|&(start, end)| start >= element.start && end <= element.end);
        if multiline_literal {
            return Block {
                text: raw.to_string(),
                verbatim: true,
            };
        }

        let base = self.line_indent(element.start);
        let mut lines = raw.lines();
        let mut text = lines.next().unwrap_or_default().to_string();
        for line in lines {
            text.push('\n');
            match line.strip_prefix(base) {
                Some(rest) => text.push_str(rest),
                None => text.push_str(line.trim_start()),
            }
        }
        Block {
            text,
            verbatim: false,
        }
    }
}

/// Parse `text` and report whether it is a syntactically valid module.
pub fn check(text: &str) -> MutatorResult<()> {
    with_program(text, |_| ())
}

/// Parse a single expression, such as a rendered array element.
pub fn parse_value(text: &str) -> MutatorResult<JsValue> {
    let wrapped = format!("(\n{}\n);", text);
    with_program(&wrapped, |program| match program.body.first() {
        Some(Statement::ExpressionStatement(stmt)) => {
            Lifter::new(&wrapped).expression(&stmt.expression)
        }
        _ => JsValue::Opaque(text.to_string()),
    })
}

/// Run `f` over the parsed program. Sites are ES modules or CommonJS files,
/// so a document that does not parse as a module gets a second try as a
/// script before it is rejected.
fn with_program<T>(text: &str, f: impl FnOnce(&Program<'_>) -> T) -> MutatorResult<T> {
    let allocator = Allocator::default();
    let module = Parser::new(&allocator, text, SourceType::mjs()).parse();
    if module.errors.is_empty() && !module.panicked {
        return Ok(f(&module.program));
    }

    let script = Parser::new(&allocator, text, SourceType::cjs()).parse();
    if script.errors.is_empty() && !script.panicked {
        return Ok(f(&script.program));
    }

    Err(MutatorError::malformed(describe(&module.errors)))
}

fn describe(errors: &[OxcDiagnostic]) -> String {
    if errors.is_empty() {
        return "parser gave up".to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Collects the owned outline while walking the tree.
struct Outline<'t> {
    text: &'t str,
    lifter: Lifter<'t>,
    comments: Vec<Range>,
    depth: usize,
    objects: Vec<ObjectLiteral>,
    multiline: Vec<Range>,
}

impl<'t> Outline<'t> {
    fn new(text: &'t str, program: &Program<'_>) -> Self {
        let comments = program
            .comments
            .iter()
            .map(|c| (c.span.start as usize, c.span.end as usize))
            .collect();
        Self {
            text,
            lifter: Lifter::new(text),
            comments,
            depth: 0,
            objects: Vec::new(),
            multiline: Vec::new(),
        }
    }

    fn in_comment(&self, offset: usize) -> bool {
        self.comments
            .iter()
            .any(|&(start, end)| start <= offset && offset < end)
    }

    fn object_literal(&self, object: &ObjectExpression<'_>) -> ObjectLiteral {
        let properties = object
            .properties
            .iter()
            .filter_map(|member| match member {
                ObjectPropertyKind::ObjectProperty(prop)
                    if prop.kind == PropertyKind::Init
                        && !prop.computed
                        && !prop.shorthand
                        && !prop.method =>
                {
                    let key = prop.key.static_name()?.to_string();
                    let value = match unparenthesized(&prop.value) {
                        Expression::StringLiteral(lit) => PropertyValue::Str(lit.value.to_string()),
                        Expression::ArrayExpression(array) => {
                            PropertyValue::Array(self.array_literal(array))
                        }
                        _ => PropertyValue::Other,
                    };
                    Some(Property { key, value })
                }
                _ => None,
            })
            .collect();
        ObjectLiteral {
            start: object.span.start as usize,
            end: object.span.end as usize,
            depth: self.depth,
            properties,
        }
    }

    fn array_literal(&self, array: &ArrayExpression<'_>) -> ArrayLiteral {
        let mut elements = Vec::new();
        let mut gap_start = array.span.start as usize + 1;

        for element in &array.elements {
            if matches!(element, ArrayExpressionElement::Elision(_)) {
                continue;
            }
            let span = element.span();
            let start = self.leading_start(gap_start, span.start as usize);
            if let Some(value) = self.lifter.element(element) {
                elements.push(ArrayElement {
                    start,
                    end: span.end as usize,
                    value,
                });
            }
            gap_start = span.end as usize;
        }

        ArrayLiteral {
            start: array.span.start as usize,
            end: array.span.end as usize,
            elements,
        }
    }

    /// Where an element's text begins: after the last separating comma in
    /// the gap before it, with leading whitespace dropped and comments kept.
    fn leading_start(&self, gap_start: usize, element_start: usize) -> usize {
        let gap = &self.text[gap_start..element_start];
        let after_comma = gap
            .char_indices()
            .filter(|&(i, ch)| ch == ',' && !self.in_comment(gap_start + i))
            .last()
            .map_or(gap_start, |(i, _)| gap_start + i + 1);
        let rest = &self.text[after_comma..element_start];
        after_comma + (rest.len() - rest.trim_start().len())
    }

    fn note_literal(&mut self, span: Span) {
        let (start, end) = (span.start as usize, span.end as usize);
        if self.text[start..end].contains('\n') {
            self.multiline.push((start, end));
        }
    }
}

impl<'a> Visit<'a> for Outline<'_> {
    fn visit_object_expression(&mut self, it: &ObjectExpression<'a>) {
        let object = self.object_literal(it);
        self.objects.push(object);
        self.depth += 1;
        walk::walk_object_expression(self, it);
        self.depth -= 1;
    }

    fn visit_string_literal(&mut self, it: &StringLiteral<'a>) {
        self.note_literal(it.span);
    }

    fn visit_template_literal(&mut self, it: &TemplateLiteral<'a>) {
        self.note_literal(it.span);
        walk::walk_template_literal(self, it);
    }
}

fn unparenthesized<'e, 'a>(mut expr: &'e Expression<'a>) -> &'e Expression<'a> {
    while let Expression::ParenthesizedExpression(paren) = expr {
        expr = &paren.expression;
    }
    expr
}

/// Source text of one array element, normalized so that its first line
/// carries no indentation and continuation lines are relative to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    text: String,
    /// Contains a multi-line literal; re-indenting would change its value.
    verbatim: bool,
}

impl Block {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            verbatim: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn indented(&self, indent: &str) -> String {
        if self.verbatim {
            return format!("{}{}", indent, self.text);
        }
        self.text
            .lines()
            .map(|line| {
                if line.trim().is_empty() {
                    String::new()
                } else {
                    format!("{}{}", indent, line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Render an array literal whose `[` sits on a line indented by `base`.
pub fn render_array(base: &str, elements: &[Block]) -> String {
    if elements.is_empty() {
        return "[]".to_string();
    }
    let inner = format!("{}{}", base, INDENT);
    let body = elements
        .iter()
        .map(|block| block.indented(&inner))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("[\n{}\n{}]", body, base)
}

/// Replacement of one byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

/// Apply splices to `text`. Overlapping ranges are refused, since the later
/// one would be cut out of the earlier one's replacement.
pub fn apply_splices(text: &str, mut splices: Vec<Splice>) -> MutatorResult<String> {
    splices.sort_by_key(|s| s.start);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for splice in splices {
        if splice.start < cursor || splice.end < splice.start || splice.end > text.len() {
            return Err(MutatorError::malformed(format!(
                "edit of bytes {}..{} overlaps another edit",
                splice.start, splice.end
            )));
        }
        out.push_str(&text[cursor..splice.start]);
        out.push_str(&splice.replacement);
        cursor = splice.end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"const config = {
  presets: [['classic', ({ docs: { plugins: ['nested'] } })]],
  plugins: [[
    'a',
    { id: 'one' },
  ], [
    'b', // trailing ]
    { id: 'two' },
  ]],
  themeConfig: ({
    navbar: {
      items: [
        { to: '/blog', label: 'Blog' },
        {
          label: 'Projects',
          type: 'dropdown',
          items: [],
        },
      ],
    },
  }),
};
"#;

    #[test]
    fn test_find_shallowest_plugins() {
        let source = Source::parse(SAMPLE).unwrap();
        let plugins = source.find_property_array("plugins").unwrap();
        assert_eq!(plugins.elements.len(), 2);
        let value = &plugins.elements[1].value;
        assert_eq!(value.as_array().unwrap()[1].get_str("id"), Some("two"));
    }

    #[test]
    fn test_find_dropdown_any_order() {
        let source = Source::parse(SAMPLE).unwrap();
        let dropdown = source
            .find_object_with(&[("type", "dropdown"), ("label", "Projects")])
            .unwrap();
        assert!(dropdown.array("items").unwrap().elements.is_empty());
    }

    #[test]
    fn test_element_block_reindents() {
        let source = Source::parse(SAMPLE).unwrap();
        let plugins = source.find_property_array("plugins").unwrap();
        let block = source.element_block(&plugins.elements[0]);
        assert_eq!(block.text(), "[\n  'a',\n  { id: 'one' },\n]");
        assert_eq!(
            block.indented("    "),
            "    [\n      'a',\n      { id: 'one' },\n    ]"
        );
    }

    #[test]
    fn test_leading_comment_kept_with_element() {
        let src = "export default { x: [\n  1, // about, two\n  2\n] };";
        let source = Source::parse(src).unwrap();
        let x = source.find_property_array("x").unwrap();
        assert_eq!(x.elements.len(), 2);
        let second = &x.elements[1];
        assert_eq!(&src[second.start..second.end], "// about, two\n  2");
    }

    #[test]
    fn test_multiline_template_is_verbatim() {
        let src = "export default { x: [\n    `one\n  two`\n] };";
        let source = Source::parse(src).unwrap();
        let x = source.find_property_array("x").unwrap();
        let block = source.element_block(&x.elements[0]);
        assert_eq!(block.indented("  "), "  `one\n  two`");
    }

    #[test]
    fn test_regex_literal_after_if_parses() {
        let src = "function f(s) { if (s) /\\(/.test(s); }\nexport default { plugins: [] };\n";
        let source = Source::parse(src).unwrap();
        assert!(source.find_property_array("plugins").is_some());
    }

    #[test]
    fn test_commonjs_document_parses() {
        let src = "const x = require('x');\nmodule.exports = { plugins: [x] };\n";
        let source = Source::parse(src).unwrap();
        let plugins = source.find_property_array("plugins").unwrap();
        assert_eq!(plugins.elements[0].value, JsValue::Opaque("x".into()));
    }

    #[test]
    fn test_check_rejects_broken_document() {
        assert!(check("export default { plugins: [ };").is_err());
        assert!(check("export default { plugins: [] };").is_ok());
    }

    #[test]
    fn test_render_array() {
        assert_eq!(render_array("  ", &[]), "[]");
        let rendered = render_array("  ", &[Block::new("1"), Block::new("{\n  a: 2\n}")]);
        assert_eq!(rendered, "[\n    1,\n    {\n      a: 2\n    }\n  ]");
    }

    #[test]
    fn test_apply_splices_out_of_order() {
        let text = "aaa[1]bbb[2]ccc";
        let out = apply_splices(
            text,
            vec![
                Splice {
                    start: 9,
                    end: 12,
                    replacement: "[]".into(),
                },
                Splice {
                    start: 3,
                    end: 6,
                    replacement: "[1, 3]".into(),
                },
            ],
        )
        .unwrap();
        assert_eq!(out, "aaa[1, 3]bbb[]ccc");
    }

    #[test]
    fn test_apply_splices_refuses_overlap() {
        let text = "a[[1]]b";
        let result = apply_splices(
            text,
            vec![
                Splice {
                    start: 1,
                    end: 6,
                    replacement: "[]".into(),
                },
                Splice {
                    start: 2,
                    end: 5,
                    replacement: "[2]".into(),
                },
            ],
        );
        assert!(matches!(result, Err(MutatorError::Malformed { .. })));
    }
}
