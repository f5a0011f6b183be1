//! 括号键的词法分析器
//!
//! 把 `filters[$and][0][user][email][$contains]` 这样的原始键切分并分类为
//! 段序列, 运算符边界的识别 (从尾部扫描 `$` 段) 作为独立步骤暴露,
//! 供语法分析器做形状判定。

use crate::operator::{Logic, Operator};

/// 单个括号段的分类结果
#[derive(Debug, Clone, PartialEq)]
pub enum KeySegment<'a> {
    /// 普通字段名段
    Name(&'a str),
    /// 逻辑连接词段 ($and / $or)
    Logic(Logic),
    /// 数字下标段
    Index(usize),
    /// 其他以 $ 开头的段, 保存去掉 $ 的内容
    OpKey(&'a str),
}

/// 按字节位置扫描原始键的词法分析器
pub struct KeyLexer<'a> {
    input: &'a str,
    /// 输入字符串中的当前位置（字节索引）
    position: usize,
    started: bool,
}

impl<'a> KeyLexer<'a> {
    pub fn new(input: &'a str) -> Self {
        KeyLexer {
            input,
            position: 0,
            started: false,
        }
    }

    /// 返回当前位置的字符，不推进位置
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// 推进位置一个字符并返回该字符
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    /// 读取第一个 '[' 之前的裸段
    fn read_root(&mut self) -> &'a str {
        let start = self.position;
        while let Some(c) = self.peek() {
            if c == '[' {
                break;
            }
            self.bump();
        }
        &self.input[start..self.position]
    }

    /// 读取一个 `[...]` 段; 调用时当前字符必须是 '['
    /// 未闭合的括号视为畸形键, 返回 None 终止整个序列
    fn read_bracketed(&mut self) -> Option<&'a str> {
        self.bump(); // 消费 '['
        let start = self.position;
        loop {
            match self.peek() {
                Some(']') => break,
                Some(_) => {
                    self.bump();
                }
                None => return None,
            }
        }
        let content = &self.input[start..self.position];
        self.bump(); // 消费 ']'
        Some(content)
    }
}

/// 段内容的分类: $and/$or 为连接词, 其他 $ 段为运算符键,
/// 纯数字为下标, 其余是字段名
fn classify(raw: &str) -> KeySegment<'_> {
    if let Some(rest) = raw.strip_prefix('$') {
        return match Logic::from_key(raw) {
            Some(logic) => KeySegment::Logic(logic),
            None => KeySegment::OpKey(rest),
        };
    }
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(index) = raw.parse::<usize>() {
            return KeySegment::Index(index);
        }
    }
    KeySegment::Name(raw)
}

impl<'a> Iterator for KeyLexer<'a> {
    type Item = KeySegment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            if self.peek() != Some('[') {
                let root = self.read_root();
                if !root.is_empty() {
                    return Some(classify(root));
                }
            }
        }
        match self.peek()? {
            '[' => self.read_bracketed().map(classify),
            // 括号序列之后的其他字符: 停止
            _ => None,
        }
    }
}

/// 把原始键完整切分为段序列
pub fn lex_key(key: &str) -> Vec<KeySegment<'_>> {
    KeyLexer::new(key).collect()
}

/// 从段序列中提取字段路径和运算符
///
/// 从尾部向前扫描最后一个 `$` 段作为运算符; 紧邻其前的 `$not` 段
/// 还原为取反标记。路径里混入下标或连接词、缺失运算符、空路径都
/// 视为畸形键, 返回 None 由调用方跳过。
pub fn split_path_and_operator(
    segments: &[KeySegment<'_>],
) -> Option<(Vec<String>, Operator, bool)> {
    let operator_index = segments
        .iter()
        .rposition(|segment| matches!(segment, KeySegment::OpKey(_) | KeySegment::Logic(_)))?;
    let operator = match &segments[operator_index] {
        KeySegment::OpKey(raw) => Operator::from_key(raw)?,
        _ => return None,
    };

    let mut path_end = operator_index;
    let mut negate = false;
    if path_end > 0 && matches!(segments[path_end - 1], KeySegment::OpKey("not")) {
        negate = true;
        path_end -= 1;
    }

    let mut path = Vec::with_capacity(path_end);
    for segment in &segments[..path_end] {
        match segment {
            KeySegment::Name(name) if !name.is_empty() => path.push((*name).to_string()),
            _ => return None,
        }
    }
    if path.is_empty() {
        return None;
    }
    Some((path, operator, negate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_simple_key() {
        let segments = lex_key("filters[title][$contains]");
        assert_eq!(
            segments,
            vec![
                KeySegment::Name("filters"),
                KeySegment::Name("title"),
                KeySegment::OpKey("contains"),
            ]
        );
    }

    #[test]
    fn test_lex_group_key() {
        let segments = lex_key("filters[$and][0][user][email][$eq]");
        assert_eq!(
            segments,
            vec![
                KeySegment::Name("filters"),
                KeySegment::Logic(Logic::And),
                KeySegment::Index(0),
                KeySegment::Name("user"),
                KeySegment::Name("email"),
                KeySegment::OpKey("eq"),
            ]
        );
    }

    #[test]
    fn test_lex_non_numeric_index_stays_a_name() {
        let segments = lex_key("filters[$and][abc][x][$eq]");
        assert_eq!(segments[1], KeySegment::Logic(Logic::And));
        assert_eq!(segments[2], KeySegment::Name("abc"));
    }

    #[test]
    fn test_lex_unterminated_bracket_stops() {
        let segments = lex_key("filters[$and][0][title");
        assert_eq!(
            segments,
            vec![
                KeySegment::Name("filters"),
                KeySegment::Logic(Logic::And),
                KeySegment::Index(0),
            ]
        );
    }

    #[test]
    fn test_lex_key_without_root() {
        let segments = lex_key("[a][b]");
        assert_eq!(segments, vec![KeySegment::Name("a"), KeySegment::Name("b")]);
    }

    #[test]
    fn test_split_simple_path() {
        let segments = vec![KeySegment::Name("title"), KeySegment::OpKey("contains")];
        let (path, operator, negate) = split_path_and_operator(&segments).unwrap();
        assert_eq!(path, vec!["title"]);
        assert_eq!(operator, Operator::Contains);
        assert!(!negate);
    }

    #[test]
    fn test_split_deep_path() {
        let segments = lex_key("[user][role][name][$eq]");
        let (path, operator, _) = split_path_and_operator(&segments).unwrap();
        assert_eq!(path, vec!["user", "role", "name"]);
        assert_eq!(operator, Operator::Eq);
    }

    #[test]
    fn test_split_recovers_negate() {
        let segments = lex_key("[status][$not][$eq]");
        let (path, operator, negate) = split_path_and_operator(&segments).unwrap();
        assert_eq!(path, vec!["status"]);
        assert_eq!(operator, Operator::Eq);
        assert!(negate);
    }

    #[test]
    fn test_split_ignores_trailing_index() {
        // in/between 这类运算符会在运算符段之后再带数组下标
        let segments = lex_key("[status][$in][0]");
        let (path, operator, _) = split_path_and_operator(&segments).unwrap();
        assert_eq!(path, vec!["status"]);
        assert_eq!(operator, Operator::In);
    }

    #[test]
    fn test_split_rejects_missing_operator() {
        let segments = vec![KeySegment::Name("title")];
        assert_eq!(split_path_and_operator(&segments), None);
    }

    #[test]
    fn test_split_rejects_unknown_operator() {
        let segments = lex_key("[title][$bogus]");
        assert_eq!(split_path_and_operator(&segments), None);
    }

    #[test]
    fn test_split_rejects_empty_path() {
        let segments = lex_key("[$eq]");
        assert_eq!(split_path_and_operator(&segments), None);
    }

    #[test]
    fn test_split_rejects_index_in_path() {
        let segments = vec![
            KeySegment::Index(0),
            KeySegment::Name("title"),
            KeySegment::OpKey("eq"),
        ];
        assert_eq!(split_path_and_operator(&segments), None);
    }
}
