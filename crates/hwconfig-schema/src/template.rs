//! Template variable substitution
//!
//! Authored configuration refers to scoped variables with `{{name}}`
//! placeholders. A [`TemplateScope`] is built by flattening the scalar
//! fields visible at a scope, resolved against itself to a fixed point, and
//! then applied to a subtree by [`TemplateExpander::apply`].
//!
//! ```
//! use hwconfig_schema::template::{TemplateExpander, TemplateScope};
//! use serde_json::json;
//!
//! let mut scope = TemplateScope::new();
//! scope.insert("sku-id", json!(4));
//! scope.insert("name", json!("reef"));
//!
//! let mut input = json!({"id": "{{sku-id}}", "label": "{{name}}-{{sku-id}}"});
//! let map = input.as_object_mut().unwrap();
//! TemplateExpander::new().apply(map, &scope).unwrap();
//! assert_eq!(input, json!({"id": 4, "label": "reef-4"}));
//! ```

use crate::{Error, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Keys starting with this marker are scratch variables, stripped from output.
pub const TEMPLATE_ONLY_PREFIX: char = '$';

static TEMPLATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^}]*)\}\}").unwrap());

/// Names of every placeholder in `text`, in order of appearance.
pub fn placeholders(text: &str) -> Vec<&str> {
    TEMPLATE_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Whether `text` still contains a `{{...}}` placeholder.
pub fn has_placeholder(text: &str) -> bool {
    TEMPLATE_PATTERN.is_match(text)
}

/// Mapping from variable name to scalar value.
///
/// Keys are kept sorted so diagnostics and resolution order are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateScope {
    vars: BTreeMap<String, Value>,
}

impl TemplateScope {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Flatten the scalar fields of `subtree` into this scope.
    ///
    /// Nested maps are walked for discovery first; scalars sitting directly
    /// in `subtree` are written last so they win over same-named scalars
    /// found deeper. Lists and nulls never become variables.
    pub fn collect(&mut self, subtree: &Map<String, Value>) {
        let mut own = Vec::new();
        for (key, value) in subtree {
            match value {
                Value::Object(child) => self.collect(child),
                Value::Array(_) | Value::Null => {}
                scalar => own.push((key, scalar)),
            }
        }
        for (key, value) in own {
            self.vars.insert(key.clone(), value.clone());
        }
    }

    /// Flatten only the scalars sitting directly in `subtree`.
    pub fn collect_own(&mut self, subtree: &Map<String, Value>) {
        for (key, value) in subtree {
            if !matches!(value, Value::Object(_) | Value::Array(_) | Value::Null) {
                self.vars.insert(key.clone(), value.clone());
            }
        }
    }

    /// Names of variables whose values still hold a placeholder.
    pub fn unresolved(&self) -> Vec<String> {
        self.vars
            .iter()
            .filter(|(_, v)| v.as_str().is_some_and(has_placeholder))
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn has_unresolved(&self) -> bool {
        self.vars
            .values()
            .any(|v| v.as_str().is_some_and(has_placeholder))
    }

    fn to_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.vars).unwrap_or_default()
    }
}

/// Applies a [`TemplateScope`] to document subtrees.
#[derive(Debug, Clone, Default)]
pub struct TemplateExpander {
    max_passes: Option<usize>,
}

impl TemplateExpander {
    /// Create an expander whose fixed-point cap scales with the scope size
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an expander with a fixed cap on fixed-point passes
    pub fn with_max_passes(max_passes: usize) -> Self {
        Self {
            max_passes: Some(max_passes),
        }
    }

    /// Resolve variables that reference other variables.
    ///
    /// Each pass substitutes every variable against the previous pass's
    /// values. An acyclic chain of `n` variables settles within `n` passes,
    /// so the default cap is `len + 1`. A pass that changes nothing while
    /// placeholders remain, or running out of passes, is a cycle.
    pub fn resolve_scope(&self, scope: &mut TemplateScope) -> Result<()> {
        let cap = self.max_passes.unwrap_or(scope.len() + 1);
        let mut passes = 0;

        while scope.has_unresolved() {
            if passes >= cap {
                return Err(Error::CyclicTemplateVariable {
                    passes,
                    unresolved: scope.unresolved(),
                });
            }

            let mut next = BTreeMap::new();
            for (name, value) in &scope.vars {
                let resolved = match value {
                    Value::String(text) => {
                        substitute(text, scope).map_err(|variable| Error::UndefinedTemplateVariable {
                            variable,
                            value: text.clone(),
                            input: scope.to_pretty(),
                            scope: scope.to_pretty(),
                        })?
                    }
                    other => other.clone(),
                };
                next.insert(name.clone(), resolved);
            }
            passes += 1;

            if next == scope.vars {
                return Err(Error::CyclicTemplateVariable {
                    passes,
                    unresolved: scope.unresolved(),
                });
            }
            scope.vars = next;
        }

        tracing::trace!(passes, variables = scope.len(), "Template scope resolved");
        Ok(())
    }

    /// Substitute placeholders throughout `input` using `scope`.
    ///
    /// Strings and scalar list items at this level are substituted first,
    /// then nested maps with the same scope. Maps inside lists each get a
    /// private scope: `scope` overlaid with the item's own scalars,
    /// resolved to a fixed point.
    pub fn apply(&self, input: &mut Map<String, Value>, scope: &TemplateScope) -> Result<()> {
        let mut writes: Vec<(String, Option<usize>, Value)> = Vec::new();
        for (key, value) in input.iter() {
            match value {
                Value::String(text) => {
                    writes.push((key.clone(), None, self.substitute_in(text, input, scope)?));
                }
                Value::Array(items) => {
                    for (idx, item) in items.iter().enumerate() {
                        if let Value::String(text) = item {
                            writes.push((
                                key.clone(),
                                Some(idx),
                                self.substitute_in(text, input, scope)?,
                            ));
                        }
                    }
                }
                _ => {}
            }
        }

        for (key, idx, new_value) in writes {
            match (idx, input.get_mut(&key)) {
                (None, Some(slot)) => *slot = new_value,
                (Some(idx), Some(Value::Array(items))) => items[idx] = new_value,
                _ => {}
            }
        }

        for value in input.values_mut() {
            if let Value::Object(child) = value {
                self.apply(child, scope)?;
            }
        }

        for value in input.values_mut() {
            if let Value::Array(items) = value {
                for item in items.iter_mut() {
                    if let Value::Object(item_map) = item {
                        let mut item_scope = scope.clone();
                        item_scope.collect(item_map);
                        self.resolve_scope(&mut item_scope)?;
                        self.apply(item_map, &item_scope)?;
                    }
                }
            }
        }

        Ok(())
    }

    fn substitute_in(
        &self,
        text: &str,
        input: &Map<String, Value>,
        scope: &TemplateScope,
    ) -> Result<Value> {
        substitute(text, scope).map_err(|variable| Error::UndefinedTemplateVariable {
            variable,
            value: text.to_string(),
            input: serde_json::to_string_pretty(input).unwrap_or_default(),
            scope: scope.to_pretty(),
        })
    }
}

/// Substitute a single string. On failure returns the missing variable name.
///
/// A string that is exactly one placeholder for a numeric or boolean
/// variable becomes that typed value.
fn substitute(text: &str, scope: &TemplateScope) -> std::result::Result<Value, String> {
    let names = placeholders(text);
    if names.is_empty() {
        return Ok(Value::String(text.to_string()));
    }

    let mut result = text.to_string();
    for name in names {
        let placeholder = format!("{{{{{name}}}}}");
        let var = scope.get(name).ok_or_else(|| name.to_string())?;
        match var {
            Value::Number(_) | Value::Bool(_) if result == placeholder => return Ok(var.clone()),
            Value::String(s) => result = result.replace(&placeholder, s),
            other => result = result.replace(&placeholder, &other.to_string()),
        }
    }
    Ok(Value::String(result))
}

/// Remove every `$`-prefixed key, at every nesting level.
pub fn strip_template_only(input: &mut Map<String, Value>) {
    input.retain(|key, _| !key.starts_with(TEMPLATE_ONLY_PREFIX));
    for value in input.values_mut() {
        match value {
            Value::Object(child) => strip_template_only(child),
            Value::Array(items) => {
                for item in items.iter_mut() {
                    if let Value::Object(item_map) = item {
                        strip_template_only(item_map);
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn scope_of(value: Value) -> TemplateScope {
        let mut scope = TemplateScope::new();
        scope.collect(value.as_object().unwrap());
        scope
    }

    fn apply_to(mut input: Value, scope: &TemplateScope) -> Result<Value> {
        TemplateExpander::new().apply(input.as_object_mut().unwrap(), scope)?;
        Ok(input)
    }

    #[rstest]
    #[case(json!("{{sku-id}}"), json!(4))]
    #[case(json!("id-{{sku-id}}"), json!("id-4"))]
    #[case(json!("{{name}}"), json!("reef"))]
    #[case(json!("{{name}}/{{sku-id}}"), json!("reef/4"))]
    #[case(json!("plain"), json!("plain"))]
    #[case(json!("{{flag}}"), json!(true))]
    #[case(json!("flag={{flag}}"), json!("flag=true"))]
    fn substitution_preserves_exact_typed_values(#[case] template: Value, #[case] expected: Value) {
        let scope = scope_of(json!({"sku-id": 4, "name": "reef", "flag": true}));
        let out = apply_to(json!({ "field": template }), &scope).unwrap();
        assert_eq!(out["field"], expected);
    }

    #[test]
    fn undefined_variable_reports_string_and_scope() {
        let scope = scope_of(json!({"name": "reef"}));
        let err = apply_to(json!({"field": "{{missing}}-x"}), &scope).unwrap_err();
        match err {
            Error::UndefinedTemplateVariable {
                variable,
                value,
                input,
                scope,
            } => {
                assert_eq!(variable, "missing");
                assert_eq!(value, "{{missing}}-x");
                assert!(input.contains("\"field\""));
                assert!(scope.contains("\"name\""));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn collect_prefers_shallow_scalars_over_nested() {
        let scope = scope_of(json!({"name": "outer", "inner": {"name": "inner", "only": 1}}));
        assert_eq!(scope.get("name"), Some(&json!("outer")));
        assert_eq!(scope.get("only"), Some(&json!(1)));
    }

    #[test]
    fn collect_skips_lists_and_nulls() {
        let scope = scope_of(json!({"tools": ["a"], "nothing": null, "x": "y"}));
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn chained_variables_resolve_to_typed_value() {
        let mut scope = scope_of(json!({"a": "{{b}}", "b": "{{c}}", "c": 3}));
        TemplateExpander::new().resolve_scope(&mut scope).unwrap();
        assert_eq!(scope.get("a"), Some(&json!(3)));
        assert_eq!(scope.get("b"), Some(&json!(3)));
    }

    #[rstest]
    #[case(json!({"a": "{{b}}", "b": "{{a}}"}))]
    #[case(json!({"a": "{{a}}"}))]
    #[case(json!({"a": "x{{a}}"}))]
    fn cyclic_variables_fail_instead_of_looping(#[case] vars: Value) {
        let mut scope = scope_of(vars);
        let err = TemplateExpander::new().resolve_scope(&mut scope).unwrap_err();
        assert!(matches!(err, Error::CyclicTemplateVariable { .. }), "{err}");
    }

    #[test]
    fn explicit_cap_bounds_long_chains() {
        let mut scope = scope_of(json!({"a": "{{b}}", "b": "{{c}}", "c": "{{d}}", "d": "end"}));
        let err = TemplateExpander::with_max_passes(1)
            .resolve_scope(&mut scope)
            .unwrap_err();
        assert!(matches!(err, Error::CyclicTemplateVariable { passes: 1, .. }));
    }

    #[test]
    fn list_items_get_private_scope() {
        let scope = scope_of(json!({"card": "base"}));
        let input = json!({
            "files": [
                {"card": "left", "$dir": "{{card}}-dir", "path": "{{$dir}}/x"},
                {"path": "{{card}}/y"},
                "{{card}}.conf"
            ],
            "top": "{{card}}"
        });
        let out = apply_to(input, &scope).unwrap();
        assert_eq!(out["files"][0]["path"], json!("left-dir/x"));
        assert_eq!(out["files"][1]["path"], json!("base/y"));
        assert_eq!(out["files"][2], json!("base.conf"));
        assert_eq!(out["top"], json!("base"));
    }

    #[test]
    fn nested_maps_share_parent_scope() {
        let scope = scope_of(json!({"model": "reef"}));
        let out = apply_to(json!({"audio": {"main": {"ucm": "{{model}}"}}}), &scope).unwrap();
        assert_eq!(out["audio"]["main"]["ucm"], json!("reef"));
    }

    #[test]
    fn strip_removes_template_only_keys_everywhere() {
        let mut value = json!({
            "$top": 1,
            "keep": {"$nested": "x", "v": 1},
            "list": [{"$item": 2, "w": 3}]
        });
        strip_template_only(value.as_object_mut().unwrap());
        assert_eq!(value, json!({"keep": {"v": 1}, "list": [{"w": 3}]}));
    }
}
