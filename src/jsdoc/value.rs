//! Literal values lifted out of the syntax tree.
//!
//! Object, array, string, number, boolean and `null` literals become
//! [`JsValue`]. Anything else (calls, identifiers, arrow functions, templates
//! with holes) becomes [`JsValue::Opaque`] carrying its source text, so a
//! caller can still carry it through an edit untouched.

use oxc::ast::ast::{ArrayExpressionElement, Expression, ObjectExpression, ObjectPropertyKind, PropertyKind};
use oxc::span::{GetSpan, Span};
use oxc::syntax::operator::UnaryOperator;

#[derive(Debug, Clone, PartialEq)]
pub enum JsValue {
    Object(Vec<(String, JsValue)>),
    Array(Vec<JsValue>),
    Str(String),
    /// Numeric literal, kept as written.
    Number(String),
    Bool(bool),
    Null,
    Opaque(String),
}

impl JsValue {
    /// Property lookup on an object literal. Later duplicates win, as in JS.
    pub fn get(&self, key: &str) -> Option<&JsValue> {
        match self {
            JsValue::Object(props) => props.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[JsValue]> {
        match self {
            JsValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(JsValue::as_str)
    }
}

/// Converts expressions of one document into [`JsValue`]s.
#[derive(Clone, Copy)]
pub(crate) struct Lifter<'t> {
    text: &'t str,
}

impl<'t> Lifter<'t> {
    pub(crate) fn new(text: &'t str) -> Self {
        Self { text }
    }

    fn slice(&self, span: Span) -> &'t str {
        &self.text[span.start as usize..span.end as usize]
    }

    fn opaque(&self, span: Span) -> JsValue {
        JsValue::Opaque(self.slice(span).to_string())
    }

    pub(crate) fn expression(&self, expr: &Expression<'_>) -> JsValue {
        match expr {
            Expression::StringLiteral(lit) => JsValue::Str(lit.value.to_string()),
            Expression::NumericLiteral(lit) => JsValue::Number(self.slice(lit.span).to_string()),
            Expression::BooleanLiteral(lit) => JsValue::Bool(lit.value),
            Expression::NullLiteral(_) => JsValue::Null,
            Expression::TemplateLiteral(tpl) if tpl.expressions.is_empty() => tpl
                .quasis
                .first()
                .and_then(|quasi| quasi.value.cooked.as_ref())
                .map_or_else(|| self.opaque(tpl.span), |cooked| JsValue::Str(cooked.to_string())),
            Expression::UnaryExpression(unary)
                if unary.operator == UnaryOperator::UnaryNegation
                    && matches!(unary.argument, Expression::NumericLiteral(_)) =>
            {
                JsValue::Number(self.slice(unary.span).to_string())
            }
            Expression::ArrayExpression(array) => JsValue::Array(
                array
                    .elements
                    .iter()
                    .filter_map(|element| self.element(element))
                    .collect(),
            ),
            Expression::ObjectExpression(object) => self.object(object),
            Expression::ParenthesizedExpression(paren) => self.expression(&paren.expression),
            other => self.opaque(other.span()),
        }
    }

    /// Value of one array element. Holes yield `None`.
    pub(crate) fn element(&self, element: &ArrayExpressionElement<'_>) -> Option<JsValue> {
        match element {
            ArrayExpressionElement::Elision(_) => None,
            ArrayExpressionElement::SpreadElement(spread) => Some(self.opaque(spread.span)),
            other => Some(
                other
                    .as_expression()
                    .map_or_else(|| self.opaque(other.span()), |expr| self.expression(expr)),
            ),
        }
    }

    /// Plain `key: value` members. Spreads, shorthands, methods, accessors and
    /// computed keys are skipped.
    pub(crate) fn object(&self, object: &ObjectExpression<'_>) -> JsValue {
        let props = object
            .properties
            .iter()
            .filter_map(|member| match member {
                ObjectPropertyKind::ObjectProperty(prop)
                    if prop.kind == PropertyKind::Init
                        && !prop.computed
                        && !prop.shorthand
                        && !prop.method =>
                {
                    let key = prop.key.static_name()?;
                    Some((key.to_string(), self.expression(&prop.value)))
                }
                _ => None,
            })
            .collect();
        JsValue::Object(props)
    }
}

/// Render `s` as a single-quoted JS string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsdoc::parse_value;

    #[test]
    fn test_plugin_tuple() {
        let value = parse_value(
            "[\n  '@docusaurus/plugin-content-docs',\n  {\n    id: 'tesla-rhbme',\n    'path': \"tesla-rhbme\",\n  },\n]",
        )
        .unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_str(), Some("@docusaurus/plugin-content-docs"));
        assert_eq!(items[1].get_str("id"), Some("tesla-rhbme"));
        assert_eq!(items[1].get_str("path"), Some("tesla-rhbme"));
    }

    #[test]
    fn test_scalars() {
        let value = parse_value("{ a: true, b: null, c: -3, d: 1.5e3, e: `plain` }").unwrap();
        assert_eq!(value.get("a"), Some(&JsValue::Bool(true)));
        assert_eq!(value.get("b"), Some(&JsValue::Null));
        assert_eq!(value.get("c"), Some(&JsValue::Number("-3".into())));
        assert_eq!(value.get("d"), Some(&JsValue::Number("1.5e3".into())));
        assert_eq!(value.get_str("e"), Some("plain"));
    }

    #[test]
    fn test_expressions_become_opaque() {
        let value =
            parse_value("{ a: require.resolve('x'), b: () => ({}), ...rest, c: 'kept' }").unwrap();
        assert_eq!(
            value.get("a"),
            Some(&JsValue::Opaque("require.resolve('x')".into()))
        );
        assert_eq!(value.get("b"), Some(&JsValue::Opaque("() => ({})".into())));
        assert_eq!(value.get_str("c"), Some("kept"));
    }

    #[test]
    fn test_parenthesized_object() {
        let value = parse_value("({ docs: { routeBasePath: 'tutorials' } })").unwrap();
        assert_eq!(
            value.get("docs").and_then(|d| d.get_str("routeBasePath")),
            Some("tutorials")
        );
    }

    #[test]
    fn test_string_escapes_decoded() {
        let value = parse_value(r#"{ a: 'it\'s', b: "a\nb", c: '\x41B\u{43}' }"#).unwrap();
        assert_eq!(value.get_str("a"), Some("it's"));
        assert_eq!(value.get_str("b"), Some("a\nb"));
        assert_eq!(value.get_str("c"), Some("ABC"));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("it's"), r"'it\'s'");
        assert_eq!(quote(r"back\slash"), r"'back\\slash'");
        let round = parse_value(&quote("O'Brien \\ Co\n")).unwrap();
        assert_eq!(round.as_str(), Some("O'Brien \\ Co\n"));
    }
}
