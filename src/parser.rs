//! 查询字符串的语法分析器
//!
//! ## 解析流程图
//!
//! ```text
//! parse_query_string()
//!   ├─ 按 '&' / '=' 切分键值对
//!   ├─ 只保留 filters[ 前缀的键 → lex_key() 切分为段序列
//!   │
//!   ├─ 形状判定 (按首段)
//!   │   ├─ $and/$or + 数字下标 → 一层分组
//!   │   │    └─ 下一段又是 $and/$or + 下标 → 两层嵌套分组
//!   │   │         └─ 剩余段 → split_path_and_operator()
//!   │   └─ 无连接词 → 单条件折叠形态, 隐式 AND、下标 0
//!   │
//!   └─ 重组: 下标排序 → 叶子条件 / 子组 → ConditionGroup 树
//!        └─ 什么都没解析出来 → 单个空占位条件
//! ```
//!
//! 解析是对解码后键值对的一次纯函数遍历, 没有增量状态。畸形键
//! (缺运算符、非数字下标、空路径) 一律静默跳过, 从不报错 —— 输入
//! 是系统自己生成的查询串, 这里只做尽力而为的还原。
//!
//! ## 支持的键形态
//!
//! ```text
//! filters[field][$eq]=value                      单条件折叠
//! filters[user][email][$contains]=admin          深层路径
//! filters[$and][0][field][$eq]=value             一层分组
//! filters[$and][1][$or][0][field][$eq]=value     嵌套分组
//! filters[status][$not][$eq]=done                取反
//! filters[age][$between][0]=18 / [1]=30          区间 (两个键合并)
//! filters[tags][$in][0]=a / [1]=b                列表 (多个键合并)
//! ```

use crate::lexer::{lex_key, split_path_and_operator, KeySegment};
use crate::operator::{Logic, Operator, SortOrder};
use crate::structure::{Condition, ConditionGroup, GroupItem, PopulateField};
use std::collections::BTreeMap;

/// 还原过程中的叶子条件
struct Leaf {
    path: Vec<String>,
    operator: Operator,
    negate: bool,
    value: String,
    value_to: Option<String>,
}

impl Leaf {
    fn new(path: Vec<String>, operator: Operator, negate: bool, value: String) -> Self {
        Self {
            path,
            operator,
            negate,
            value,
            value_to: None,
        }
    }

    /// 同一条件的后续键值并入已有叶子:
    /// between 的第二个键是右端点, in/notIn 追加列表项, 其余覆盖
    fn absorb(&mut self, value: String) {
        match self.operator {
            Operator::Between => self.value_to = Some(value),
            Operator::In | Operator::NotIn => {
                if !self.value.is_empty() {
                    self.value.push(',');
                }
                self.value.push_str(&value);
            }
            _ => self.value = value,
        }
    }

    fn into_condition(self, next_id: &mut usize) -> Condition {
        let id = format!("condition_{next_id}");
        *next_id += 1;
        let field = self.path.last().cloned().unwrap_or_default();
        Condition {
            id,
            field,
            field_path: self.path,
            operator: self.operator,
            value: self.value,
            value_to: self.value_to,
            negate: self.negate,
        }
    }
}

/// 根分组的一个下标位: 叶子或嵌套子组
enum Entry {
    Leaf(Leaf),
    Nested {
        logic: Logic,
        items: BTreeMap<usize, Leaf>,
    },
}

fn split_pairs(query: &str) -> impl Iterator<Item = (&str, &str)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            if key.is_empty() {
                None
            } else {
                Some((key, value))
            }
        })
}

/// 值在赋值点逐个做百分号解码
fn decode_value(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

fn merge_leaf(
    items: &mut BTreeMap<usize, Leaf>,
    index: usize,
    path: Vec<String>,
    operator: Operator,
    negate: bool,
    value: String,
) {
    if let Some(existing) = items.get_mut(&index) {
        if existing.path == path && existing.operator == operator {
            existing.absorb(value);
            return;
        }
    }
    items.insert(index, Leaf::new(path, operator, negate, value));
}

fn merge_entry(
    entries: &mut BTreeMap<usize, Entry>,
    index: usize,
    path: Vec<String>,
    operator: Operator,
    negate: bool,
    value: String,
) {
    match entries.get_mut(&index) {
        Some(Entry::Leaf(existing)) if existing.path == path && existing.operator == operator => {
            existing.absorb(value);
        }
        // 同一下标既有叶子又有子组: 冲突键丢弃
        Some(_) => {}
        None => {
            entries.insert(index, Entry::Leaf(Leaf::new(path, operator, negate, value)));
        }
    }
}

/// 把查询字符串还原为条件树
///
/// 从不失败: 解析不出任何条件时返回带单个空占位条件的树,
/// 让编辑器保持可编辑的非空状态。
pub fn parse_query_string(query: &str) -> ConditionGroup {
    let mut root_logic: Option<Logic> = None;
    let mut entries: BTreeMap<usize, Entry> = BTreeMap::new();

    for (key, raw_value) in split_pairs(query) {
        let segments = lex_key(key);
        let rest = match segments.split_first() {
            Some((KeySegment::Name("filters"), rest)) if !rest.is_empty() => rest,
            _ => continue,
        };

        match rest.first() {
            Some(KeySegment::Logic(logic)) => {
                let logic = *logic;
                let Some(KeySegment::Index(index)) = rest.get(1) else {
                    continue; // 非数字下标, 跳过
                };
                let index = *index;

                if let Some(KeySegment::Logic(nested_logic)) = rest.get(2) {
                    // 嵌套分组: filters[$and][1][$or][0][...][$op]
                    let Some(KeySegment::Index(nested_index)) = rest.get(3) else {
                        continue;
                    };
                    let Some((path, operator, negate)) = split_path_and_operator(&rest[4..])
                    else {
                        continue;
                    };
                    // 根连接词以首个完整解析的键为准, 之后不一致的键丢弃
                    if *root_logic.get_or_insert(logic) != logic {
                        continue;
                    }
                    let entry = entries.entry(index).or_insert_with(|| Entry::Nested {
                        logic: *nested_logic,
                        items: BTreeMap::new(),
                    });
                    if let Entry::Nested { items, .. } = entry {
                        merge_leaf(
                            items,
                            *nested_index,
                            path,
                            operator,
                            negate,
                            decode_value(raw_value),
                        );
                    }
                } else {
                    // 一层分组: filters[$and][0][...][$op]
                    let Some((path, operator, negate)) = split_path_and_operator(&rest[2..])
                    else {
                        continue;
                    };
                    if *root_logic.get_or_insert(logic) != logic {
                        continue;
                    }
                    merge_entry(
                        &mut entries,
                        index,
                        path,
                        operator,
                        negate,
                        decode_value(raw_value),
                    );
                }
            }
            _ => {
                // 生成器的单条件折叠形态: 隐式 AND, 下标 0
                let Some((path, operator, negate)) = split_path_and_operator(rest) else {
                    continue;
                };
                if *root_logic.get_or_insert(Logic::And) != Logic::And {
                    continue;
                }
                merge_entry(
                    &mut entries,
                    0,
                    path,
                    operator,
                    negate,
                    decode_value(raw_value),
                );
            }
        }
    }

    let mut root = ConditionGroup::new("root", root_logic.unwrap_or(Logic::And));
    let mut next_id = 1usize;
    for (_, entry) in entries {
        match entry {
            Entry::Leaf(leaf) => {
                root.items
                    .push(GroupItem::Condition(leaf.into_condition(&mut next_id)));
            }
            Entry::Nested { logic, items } => {
                let mut sub = ConditionGroup::new(format!("group_{next_id}"), logic);
                next_id += 1;
                for (_, leaf) in items {
                    sub.items
                        .push(GroupItem::Condition(leaf.into_condition(&mut next_id)));
                }
                root.items.push(GroupItem::Group(sub));
            }
        }
    }

    if root.items.is_empty() {
        root.items
            .push(GroupItem::Condition(Condition::empty("condition_1")));
    }
    root
}

/// 把 (可能嵌套的) 条件树摊平为简化编辑器的行 + 行间连接符形态
///
/// 深度优先遍历; 子组第一行之前的连接符取父组的连接词, 子组内部
/// 行之间取子组自己的连接词, 与 rows_to_group 的分块规则互为逆操作。
/// 缺失的尾部连接符按 AND 补齐。
pub fn flatten_group(group: &ConditionGroup) -> (Vec<Condition>, Vec<Logic>) {
    let mut rows: Vec<Condition> = Vec::new();
    let mut connectors: Vec<Logic> = Vec::new();

    for item in &group.items {
        match item {
            GroupItem::Condition(condition) => {
                if !rows.is_empty() {
                    connectors.push(group.logic);
                }
                rows.push(condition.clone());
            }
            GroupItem::Group(sub) => {
                let (sub_rows, sub_connectors) = flatten_group(sub);
                for (offset, row) in sub_rows.into_iter().enumerate() {
                    if !rows.is_empty() {
                        let connector = if offset == 0 {
                            group.logic
                        } else {
                            sub_connectors.get(offset - 1).copied().unwrap_or(Logic::And)
                        };
                        connectors.push(connector);
                    }
                    rows.push(row);
                }
            }
        }
    }

    if rows.len() > 1 {
        while connectors.len() < rows.len() - 1 {
            connectors.push(Logic::And);
        }
    }
    (rows, connectors)
}

/// 查询字符串直接摊平为行形态
pub fn parse_to_rows(query: &str) -> (Vec<Condition>, Vec<Logic>) {
    flatten_group(&parse_query_string(query))
}

/// 从查询字符串恢复平铺的 sort 参数
pub fn parse_sort(query: &str) -> Option<(String, SortOrder)> {
    for (key, raw_value) in split_pairs(query) {
        if key != "sort" {
            continue;
        }
        let decoded = decode_value(raw_value);
        let (field, order) = match decoded.split_once(':') {
            Some((field, order)) => (field.to_string(), SortOrder::from_param(order)),
            None => (decoded, SortOrder::Asc),
        };
        if field.is_empty() {
            continue;
        }
        return Some((field, order));
    }
    None
}

/// 从查询字符串恢复 populate 配置
///
/// `populate[name]=true` 为浅层; 键里带 `[populate]` 段或值为 `*`
/// 的视为深层。
pub fn parse_populate(query: &str) -> Vec<PopulateField> {
    let mut fields: Vec<PopulateField> = Vec::new();
    for (key, raw_value) in split_pairs(query) {
        let segments = lex_key(key);
        let rest = match segments.split_first() {
            Some((KeySegment::Name("populate"), rest)) => rest,
            _ => continue,
        };
        let Some(KeySegment::Name(name)) = rest.first() else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let deep = rest[1..]
            .iter()
            .any(|segment| matches!(segment, KeySegment::Name("populate")))
            || decode_value(raw_value) == "*";

        match fields.iter_mut().find(|field| field.name == *name) {
            Some(existing) => existing.deep |= deep,
            None => fields.push(PopulateField {
                name: (*name).to_string(),
                enabled: true,
                deep,
            }),
        }
    }
    fields
}
