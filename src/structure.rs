//! 查询编辑器使用的条件树数据模型

use crate::operator::{Logic, Operator};
use serde::{Deserialize, Serialize};

/// 单个过滤谓词, 条件树的叶子节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// 不透明的稳定标识, 只用于编辑器内部定位
    pub id: String,
    /// 向后兼容的标量字段名 (等于路径的最后一段)
    #[serde(default)]
    pub field: String,
    /// 深层过滤的字段路径, 例如 ["user", "role", "name"]
    #[serde(default)]
    pub field_path: Vec<String>,
    pub operator: Operator,
    #[serde(default)]
    pub value: String,
    /// between 运算的右端点
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_to: Option<String>,
    /// 取反标记, 生成时包装一层 $not
    #[serde(default)]
    pub negate: bool,
}

impl Condition {
    pub fn new(
        id: impl Into<String>,
        path: &[&str],
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        let field_path: Vec<String> = path.iter().map(|s| (*s).to_string()).collect();
        Self {
            id: id.into(),
            field: field_path.last().cloned().unwrap_or_default(),
            field_path,
            operator,
            value: value.into(),
            value_to: None,
            negate: false,
        }
    }

    /// 编辑器的占位空条件
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field: String::new(),
            field_path: Vec::new(),
            operator: Operator::Eq,
            value: String::new(),
            value_to: None,
            negate: false,
        }
    }

    /// 有效字段路径; `field_path` 为空时退回单段的 `field`
    pub fn path(&self) -> Vec<&str> {
        if !self.field_path.is_empty() {
            self.field_path.iter().map(String::as_str).collect()
        } else if !self.field.is_empty() {
            vec![self.field.as_str()]
        } else {
            Vec::new()
        }
    }
}

/// 组内子节点: 叶子条件或嵌套子组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GroupItem {
    Condition(Condition),
    Group(ConditionGroup),
}

/// 逻辑容器, 连接词作用于全部直接子节点之间
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroup {
    pub id: String,
    pub logic: Logic,
    pub items: Vec<GroupItem>,
}

impl ConditionGroup {
    pub fn new(id: impl Into<String>, logic: Logic) -> Self {
        Self {
            id: id.into(),
            logic,
            items: Vec::new(),
        }
    }

    pub fn with_items(id: impl Into<String>, logic: Logic, items: Vec<GroupItem>) -> Self {
        Self {
            id: id.into(),
            logic,
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 显式的 populate 配置项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulateField {
    pub name: String,
    pub enabled: bool,
    /// 深度 populate, 生成 `populate[name][populate]=*`
    pub deep: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_prefers_field_path() {
        let cond = Condition::new("c1", &["user", "role", "name"], Operator::Eq, "Admin");
        assert_eq!(cond.path(), vec!["user", "role", "name"]);
        assert_eq!(cond.field, "name");
    }

    #[test]
    fn test_path_falls_back_to_field() {
        let mut cond = Condition::empty("c1");
        cond.field = "title".to_string();
        assert_eq!(cond.path(), vec!["title"]);
    }

    #[test]
    fn test_empty_condition_has_no_path() {
        let cond = Condition::empty("c1");
        assert!(cond.path().is_empty());
        assert_eq!(cond.operator, Operator::Eq);
    }
}
