//! 模式模块, 负责字段/关联描述符的加载与缓存
//!
//! 翻译器本身不查模式; 这里提供给上层编辑器的契约是: 给定内容类型
//! 标识, 返回一组 `{name, type, isRelation, target}` 描述符, 用来判断
//! 哪些字段路径可以继续展开。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

/// 模式加载错误
#[derive(Debug)]
pub struct SchemaError {
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "模式错误: {}", self.message)
    }
}

impl std::error::Error for SchemaError {}

impl SchemaError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

/// 单个字段的描述符
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    /// 字段类型, 例如 "string"、"integer"、"relation"
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub is_relation: bool,
    /// 关联字段的目标内容类型标识
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// 内容类型标识到字段描述符列表的映射
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(flatten)]
    pub content_types: HashMap<String, Vec<FieldDescriptor>>,
}

impl SchemaConfig {
    /// 从JSON文件加载模式配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(SchemaError::new(format!(
                "模式文件不存在: {}",
                path_ref.display()
            )));
        }

        let content = fs::read_to_string(path_ref).map_err(|e| {
            SchemaError::new(format!("无法读取模式文件 {}: {}", path_ref.display(), e))
        })?;

        let content_types: HashMap<String, Vec<FieldDescriptor>> =
            serde_json::from_str(&content).map_err(|e| {
                SchemaError::new(format!(
                    "无法解析JSON模式文件 {}: {}",
                    path_ref.display(),
                    e
                ))
            })?;

        Ok(SchemaConfig { content_types })
    }

    pub fn fields_for(&self, uid: &str) -> Option<&[FieldDescriptor]> {
        self.content_types.get(uid).map(Vec::as_slice)
    }
}

/// 时钟注入点, 让缓存的过期判定可测试
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// 按内容类型标识缓存字段描述符的TTL缓存
///
/// 显式对象, 由调用方持有, 不是全局状态; 过期判定走注入的时钟。
pub struct SchemaCache<C: Clock = SystemClock> {
    ttl: Duration,
    clock: C,
    entries: HashMap<String, (Instant, Vec<FieldDescriptor>)>,
}

impl SchemaCache<SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<C: Clock> SchemaCache<C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            ttl,
            clock,
            entries: HashMap::new(),
        }
    }

    /// 命中且未过期才返回; 过期条目等同缺失
    pub fn get(&self, uid: &str) -> Option<&[FieldDescriptor]> {
        let (stored_at, fields) = self.entries.get(uid)?;
        if self.clock.now().duration_since(*stored_at) >= self.ttl {
            return None;
        }
        Some(fields.as_slice())
    }

    pub fn insert(&mut self, uid: impl Into<String>, fields: Vec<FieldDescriptor>) {
        let now = self.clock.now();
        self.entries.insert(uid.into(), (now, fields));
    }

    pub fn invalidate(&mut self, uid: &str) {
        self.entries.remove(uid);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
