//! 条件树与查询字符串的双向翻译器
//!
//! 编辑器里的 AND/OR 条件树 ⇄ 列表视图 API 消费的括号编码查询串:
//! [`generator`] 负责序列化 (含 populate 自动推导与平铺的 sort 参数),
//! [`parser`] 负责逆向还原, [`lexer`] 提供括号键的切分与运算符边界
//! 识别, [`schema`] 提供上层需要的字段/关联描述符与TTL缓存。

pub mod generator;
pub mod lexer;
pub mod operator;
pub mod parser;
pub mod schema;
pub mod structure;
