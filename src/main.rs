use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use query_translator::generator::{generate_from_rows, generate_query_string};
use query_translator::operator::{Logic, Operator, SortOrder};
use query_translator::parser::{parse_populate, parse_query_string, parse_sort, parse_to_rows};
use query_translator::schema::SchemaConfig;
use query_translator::structure::{Condition, ConditionGroup, GroupItem, PopulateField};

fn main() -> Result<()> {
    println!("--- Query Translator: 条件树 ⇄ 查询字符串 ---");

    // 可选的模式文件, 上层编辑器用来判断合法的字段路径
    println!("\n[模式信息]:");
    match SchemaConfig::from_json_file("schema.json") {
        Ok(config) => {
            println!("✅ 使用JSON模式文件: schema.json");
            for (uid, fields) in &config.content_types {
                let relations = fields.iter().filter(|f| f.is_relation).count();
                println!("  {} ({} 个字段, {} 个关联)", uid, fields.len(), relations);
            }
        }
        Err(e) => {
            println!("⚠️ 无法加载模式文件 ({}), 跳过字段校验", e);
        }
    }

    // 1. 示例条件树: title 包含 "plan" 且 (状态为 open 或 pending)
    let inner = ConditionGroup::with_items(
        "group_1",
        Logic::Or,
        vec![
            GroupItem::Condition(Condition::new("c2", &["status"], Operator::Eq, "open")),
            GroupItem::Condition(Condition::new("c3", &["status"], Operator::Eq, "pending")),
        ],
    );
    let tree = ConditionGroup::with_items(
        "root",
        Logic::And,
        vec![
            GroupItem::Condition(Condition::new("c1", &["title"], Operator::Contains, "plan")),
            GroupItem::Condition(Condition::new(
                "c4",
                &["author", "email"],
                Operator::Contains,
                "@example.com",
            )),
            GroupItem::Group(inner),
        ],
    );
    println!("\n[输入条件树]:\n{:#?}", tree);

    // 2. 生成查询字符串 (populate 由关联路径自动推导, sort 平铺追加)
    println!("\n[步骤 1]: 生成查询字符串...");
    let populate = vec![PopulateField {
        name: "tags".to_string(),
        enabled: true,
        deep: true,
    }];
    let query = generate_query_string(&tree, Some(("createdAt", SortOrder::Desc)), &populate);
    println!("✓ {}", query);

    // 3. 解析回条件树, 闭合往返
    println!("\n[步骤 2]: 把查询字符串解析回条件树...");
    let parsed = parse_query_string(&query);
    println!("✓ 还原出 {} 个顶层节点", parsed.items.len());
    if let Some((field, order)) = parse_sort(&query) {
        println!("✓ sort: {}:{}", field, order.as_str());
    }
    let populate_fields = parse_populate(&query);
    println!("✓ populate: {} 项", populate_fields.len());

    // 4. 平铺行形态演示 (简化编辑器用)
    println!("\n[步骤 3]: 平铺为行 + 连接符...");
    let (rows, connectors) = parse_to_rows(&query);
    for (index, row) in rows.iter().enumerate() {
        if index > 0 {
            println!("  {}", connectors[index - 1].label());
        }
        println!("  {} {} {}", row.path().join("."), row.operator.key(), row.value);
    }
    let regenerated = generate_from_rows(&rows, &connectors, None, &[]);
    println!("行形态重新生成: {}", regenerated);

    // 5. 交互模式: 输入查询字符串, 打印还原出的条件树
    println!("\n--- 交互模式 (输入查询字符串, exit 退出) ---");
    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline(">> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                    break;
                }
                editor.add_history_entry(line)?;
                let tree = parse_query_string(line);
                println!("{:#?}", tree);
                println!("重新生成: {}", generate_query_string(&tree, None, &[]));
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
