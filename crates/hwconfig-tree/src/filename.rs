//! Filename templates
//!
//! File-valued properties may contain `{name}` placeholders filled from the
//! node's merged properties, e.g. `{vendor}/{pid}_{version}.bin`. `$` is
//! removed before formatting and `{{`/`}}` produce literal braces.

use crate::{Error, Result};
use std::collections::BTreeMap;

/// Format `template` from `props`.
///
/// `node` names the node the template came from, for error reporting.
///
/// ```
/// use hwconfig_tree::filename::format_filename;
/// use std::collections::BTreeMap;
///
/// let props = BTreeMap::from([("card".to_string(), "bxt".to_string())]);
/// assert_eq!(format_filename("/audio/main", &props, "{card}.conf").unwrap(), "bxt.conf");
/// assert_eq!(format_filename("/audio/main", &props, "${card}").unwrap(), "bxt");
/// ```
pub fn format_filename(node: &str, props: &BTreeMap<String, String>, template: &str) -> Result<String> {
    let template = template.replace('$', "");
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let key: String = chars.by_ref().take_while(|c| *c != '}').collect();
                let value = props.get(&key).ok_or_else(|| Error::MissingRequiredField {
                    node: node.to_string(),
                    template: template.clone(),
                    available: props.keys().cloned().collect(),
                    missing: key.clone(),
                })?;
                out.push_str(value);
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

/// Format the template held in property `name` of `props`.
pub fn prop_filename(node: &str, props: &BTreeMap<String, String>, name: &str) -> Result<String> {
    let template = props
        .get(name)
        .ok_or_else(|| Error::missing_property(node, name))?;
    format_filename(node, props, template)
}
