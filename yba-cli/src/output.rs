//! Plan rendering

use std::collections::HashMap;

use colored::Colorize;

use yba_core::effect::Effect;
use yba_core::plan::Plan;
use yba_core::resource::Value;
use yba_core::schema::ResourceSchema;

const SENSITIVE: &str = "(sensitive)";

pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(n) => n.to_string(),
        Value::Float(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let strs: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", strs.join(", "))
        }
        Value::Map(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let strs: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}: {}", k, format_value(&map[k])))
                .collect();
            format!("{{{}}}", strs.join(", "))
        }
        Value::ResourceRef(address, attr) => format!("(known after {}.{})", address, attr),
    }
}

/// `name = value` lines sorted by name, with sensitive values masked
pub fn attribute_lines(
    attributes: &HashMap<String, Value>,
    schema: Option<&ResourceSchema>,
) -> Vec<String> {
    let mut keys: Vec<&String> = attributes
        .keys()
        .filter(|k| !k.starts_with('_') && k.as_str() != "timeouts")
        .collect();
    keys.sort();
    keys.into_iter()
        .map(|k| {
            let shown = if schema.is_some_and(|s| s.is_sensitive(k)) {
                SENSITIVE.to_string()
            } else {
                format_value(&attributes[k])
            };
            format!("{} = {}", k, shown)
        })
        .collect()
}

/// Names of attributes whose declared value differs from the recorded one
fn changed_lines(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
    schema: Option<&ResourceSchema>,
) -> Vec<String> {
    let mut keys: Vec<&String> = desired
        .iter()
        .filter(|(k, v)| {
            !k.starts_with('_')
                && k.as_str() != "timeouts"
                && !current.get(*k).is_some_and(|c| v.is_satisfied_by(c))
        })
        .map(|(k, _)| k)
        .collect();
    keys.sort();
    keys.into_iter()
        .map(|k| {
            if schema.is_some_and(|s| s.is_sensitive(k)) {
                return format!("{} = {} -> {}", k, SENSITIVE, SENSITIVE);
            }
            let before = current
                .get(k)
                .map(format_value)
                .unwrap_or_else(|| "(unset)".to_string());
            format!("{} = {} -> {}", k, before, format_value(&desired[k]))
        })
        .collect()
}

pub fn print_plan(plan: &Plan, schemas: &HashMap<String, ResourceSchema>) {
    if plan.effects().iter().all(|e| !e.is_mutating()) {
        println!("{}", "No changes. Infrastructure is up-to-date.".green());
        return;
    }

    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    for effect in plan.effects() {
        let schema = schemas.get(&effect.resource_id().resource_type);
        match effect {
            Effect::Read(resource) => {
                println!("  {} {}", "<=".cyan(), resource.id.to_string().cyan().bold());
            }
            Effect::Create(resource) => {
                println!("  {} {}", "+".green(), resource.id.to_string().green().bold());
                for line in attribute_lines(&resource.attributes, schema) {
                    println!("      {}", line.green());
                }
            }
            Effect::Update { id, from, to } => {
                println!("  {} {}", "~".yellow(), id.to_string().yellow().bold());
                for line in changed_lines(&to.attributes, &from.attributes, schema) {
                    println!("      {}", line.yellow());
                }
            }
            Effect::Replace { id, from, to } => {
                println!("  {} {}", "-/+".magenta(), id.to_string().magenta().bold());
                for line in changed_lines(&to.attributes, &from.attributes, schema) {
                    println!("      {}", line.magenta());
                }
            }
            Effect::Delete(state) => {
                println!("  {} {}", "-".red(), state.id.to_string().red().bold());
            }
        }
        println!();
    }

    println!("{}", plan.summary().to_string().bold());
}
