//! The `var()` template function and YAML to template value conversion.

use minijinja::value::Value;
use minijinja::{Error, ErrorKind};
use serde_yaml::Value as Yaml;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Build `var(name, default?)` over the environment's variables
///
/// ```jinja
/// {{ var('ods_schema') }}
/// {{ var('retention_days', 30) }}
/// ```
pub(crate) fn make_var_fn(
    vars: Arc<BTreeMap<String, Value>>,
) -> impl Fn(&str, Option<Value>) -> Result<Value, Error> + Send + Sync + Clone + 'static {
    move |name: &str, default: Option<Value>| match (vars.get(name), default) {
        (Some(value), _) => Ok(value.clone()),
        (None, Some(default)) => Ok(default),
        (None, None) => Err(Error::new(ErrorKind::UndefinedError, var_reference(name))),
    }
}

/// How a missing `var()` lookup is named in errors
pub(crate) fn var_reference(name: &str) -> String {
    format!("var('{}')", name)
}

/// Convert a YAML variable value into a template value.
///
/// Scalar mapping keys become strings (`1: x` is reachable as `m['1']`);
/// sequence or mapping keys are skipped. Tags are ignored.
pub(crate) fn yaml_to_value(yaml: &Yaml) -> Value {
    match yaml {
        Yaml::Null => Value::from(()),
        Yaml::Bool(b) => Value::from(*b),
        Yaml::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => Value::from(i),
            (None, Some(u), _) => Value::from(u),
            (None, None, Some(f)) => Value::from(f),
            _ => Value::from(n.to_string()),
        },
        Yaml::String(s) => Value::from(s.as_str()),
        Yaml::Sequence(items) => Value::from(items.iter().map(yaml_to_value).collect::<Vec<_>>()),
        Yaml::Mapping(map) => Value::from_iter(
            map.iter()
                .filter_map(|(k, v)| scalar_key(k).map(|key| (key, yaml_to_value(v)))),
        ),
        Yaml::Tagged(tagged) => yaml_to_value(&tagged.value),
    }
}

fn scalar_key(key: &Yaml) -> Option<String> {
    match key {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Bool(b) => Some(b.to_string()),
        Yaml::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
