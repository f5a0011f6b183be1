//! Generator that converts a condition tree into the bracket-encoded query
//! string consumed by the list-view API.
//!
//! The intermediate form is a `serde_json::Value` tree shaped exactly like
//! the `{filters, populate}` object of the wire format; the final step walks
//! it and emits `filters[$and][0][field][$eq]=value` pairs with values-only
//! percent-encoding. `sort` bypasses the nested encoder because the API
//! expects a flat `sort=field:ORDER` string.

use crate::operator::{Logic, Operator, SortOrder};
use crate::structure::{Condition, ConditionGroup, GroupItem, PopulateField};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Whether a condition survives filtering: it must address a field, and
/// value-requiring operators must have a non-empty value (both endpoints
/// for `between`).
fn is_usable(condition: &Condition) -> bool {
    if condition.path().is_empty() {
        return false;
    }
    if !condition.operator.needs_value() {
        return true;
    }
    if condition.value.is_empty() {
        return false;
    }
    if condition.operator == Operator::Between {
        return condition.value_to.as_deref().is_some_and(|v| !v.is_empty());
    }
    true
}

/// Coerce the stored string value into its wire shape.
fn coerce_value(condition: &Condition) -> Value {
    match condition.operator {
        // Null checks ignore whatever is left in the value field
        Operator::Null | Operator::NotNull => Value::Bool(true),
        Operator::In | Operator::NotIn => Value::Array(
            condition
                .value
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(|entry| Value::String(entry.to_string()))
                .collect(),
        ),
        Operator::Between => Value::Array(vec![
            Value::String(condition.value.clone()),
            Value::String(condition.value_to.clone().unwrap_or_default()),
        ]),
        _ => Value::String(condition.value.clone()),
    }
}

/// Build the nested filter object for one condition,
/// e.g. path `user.role.name` with `eq "Admin"` becomes
/// `{user: {role: {name: {$eq: "Admin"}}}}`.
///
/// `negate` wraps the innermost operator object only:
/// `{field: {$not: {$eq: v}}}`. Wrapping at the innermost level keeps the
/// group-level key shape unambiguous for the parser even with deep paths.
fn condition_to_filter(condition: &Condition) -> Value {
    let mut clause = Map::new();
    clause.insert(condition.operator.key().to_string(), coerce_value(condition));
    let mut node = Value::Object(clause);

    if condition.negate {
        let mut wrapper = Map::new();
        wrapper.insert("$not".to_string(), node);
        node = Value::Object(wrapper);
    }

    for segment in condition.path().iter().rev() {
        let mut outer = Map::new();
        outer.insert((*segment).to_string(), node);
        node = Value::Object(outer);
    }
    node
}

fn is_logic_wrapper(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key("$and") || map.contains_key("$or"))
}

/// Convert a group into its filter object, recursing through nested groups.
///
/// A group with exactly one surviving child is emitted without the
/// `$and`/`$or` wrapper, unless that child is itself a logic wrapper.
pub fn group_to_filters(group: &ConditionGroup) -> Value {
    let mut children: Vec<Value> = Vec::new();
    for item in &group.items {
        match item {
            GroupItem::Group(sub) => {
                let filters = group_to_filters(sub);
                if filters.as_object().is_some_and(|map| !map.is_empty()) {
                    children.push(filters);
                }
            }
            GroupItem::Condition(condition) => {
                if is_usable(condition) {
                    children.push(condition_to_filter(condition));
                }
            }
        }
    }

    if children.is_empty() {
        return Value::Object(Map::new());
    }
    if children.len() == 1 && !is_logic_wrapper(&children[0]) {
        return children.remove(0);
    }

    let mut wrapper = Map::new();
    wrapper.insert(group.logic.key().to_string(), Value::Array(children));
    Value::Object(wrapper)
}

fn collect_relation_roots(group: &ConditionGroup, roots: &mut BTreeSet<String>) {
    for item in &group.items {
        match item {
            GroupItem::Group(sub) => collect_relation_roots(sub, roots),
            GroupItem::Condition(condition) => {
                let path = condition.path();
                if path.len() > 1 && is_usable(condition) {
                    roots.insert(path[0].to_string());
                }
            }
        }
    }
}

/// Derive the populate object: every relation traversed by a filter is
/// auto-populated shallowly, then the explicit entries are merged on top
/// (`true` for shallow entries, `{populate: "*"}` for deep ones).
pub fn derive_populate(group: &ConditionGroup, explicit: &[PopulateField]) -> Map<String, Value> {
    let mut roots = BTreeSet::new();
    collect_relation_roots(group, &mut roots);

    let mut populate = Map::new();
    for name in roots {
        populate.insert(name, Value::Bool(true));
    }
    for field in explicit {
        if !field.enabled {
            continue;
        }
        if field.deep {
            let mut deep = Map::new();
            deep.insert("populate".to_string(), Value::String("*".to_string()));
            populate.insert(field.name.clone(), Value::Object(deep));
        } else {
            populate.insert(field.name.clone(), Value::Bool(true));
        }
    }
    populate
}

fn encode_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => urlencoding::encode(s).into_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Walk the object tree, appending one `prefix[...]=value` pair per leaf.
/// Keys are emitted verbatim; only values are percent-encoded.
fn encode_pairs(prefix: &str, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                encode_pairs(&format!("{prefix}[{key}]"), child, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                encode_pairs(&format!("{prefix}[{index}]"), child, out);
            }
        }
        _ => out.push(format!("{prefix}={}", encode_scalar(value))),
    }
}

/// Generate the complete query string for a condition tree.
///
/// An empty tree (or one whose conditions are all filtered out) omits the
/// `filters` key entirely; an empty result is the empty string.
pub fn generate_query_string(
    group: &ConditionGroup,
    sort: Option<(&str, SortOrder)>,
    populate: &[PopulateField],
) -> String {
    let mut root = Map::new();

    let filters = group_to_filters(group);
    if filters.as_object().is_some_and(|map| !map.is_empty()) {
        root.insert("filters".to_string(), filters);
    }

    let populate_map = derive_populate(group, populate);
    if !populate_map.is_empty() {
        root.insert("populate".to_string(), Value::Object(populate_map));
    }

    let mut parts = Vec::new();
    for (key, value) in &root {
        encode_pairs(key, value, &mut parts);
    }

    // Appended outside the nested encoder: the list view expects a plain
    // `sort=field:ORDER` string, not an indexed array parameter.
    if let Some((field, order)) = sort {
        parts.push(format!("sort={}:{}", field, order.as_str()));
    }

    parts.join("&")
}

/// Build a tree from the flat-row editor format: rows plus one connector per
/// gap. Maximal AND-connected runs become `$and` blocks; blocks are joined
/// under a root `$or`. AND binds tighter than OR, left to right; this
/// precedence is fixed. Missing trailing connectors default to AND.
pub fn rows_to_group(rows: &[Condition], connectors: &[Logic]) -> ConditionGroup {
    let mut blocks: Vec<ConditionGroup> = Vec::new();
    let mut block = ConditionGroup::new("block_1", Logic::And);

    for (index, row) in rows.iter().enumerate() {
        if index > 0 {
            let connector = connectors.get(index - 1).copied().unwrap_or(Logic::And);
            if connector == Logic::Or {
                let next_id = format!("block_{}", blocks.len() + 2);
                blocks.push(std::mem::replace(
                    &mut block,
                    ConditionGroup::new(next_id, Logic::And),
                ));
            }
        }
        block.items.push(GroupItem::Condition(row.clone()));
    }
    blocks.push(block);

    if blocks.len() == 1 {
        return blocks.remove(0);
    }
    ConditionGroup::with_items(
        "root",
        Logic::Or,
        blocks.into_iter().map(GroupItem::Group).collect(),
    )
}

/// Flat-row entry point: same output contract as [`generate_query_string`].
pub fn generate_from_rows(
    rows: &[Condition],
    connectors: &[Logic],
    sort: Option<(&str, SortOrder)>,
    populate: &[PopulateField],
) -> String {
    generate_query_string(&rows_to_group(rows, connectors), sort, populate)
}
