//! The operator and connector vocabulary of the filter wire format.

use serde::{Deserialize, Serialize};

/// A filter operator. The set is closed: it is exactly the vocabulary the
/// list-view API understands, so unknown keys are rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Eq,
    Ne,
    Eqi,
    Nei,
    Lt,
    Lte,
    Gt,
    Gte,
    Contains,
    NotContains,
    Containsi,
    NotContainsi,
    StartsWith,
    StartsWithi,
    EndsWith,
    EndsWithi,
    Null,
    NotNull,
    In,
    NotIn,
    Between,
}

impl Operator {
    /// The `$`-prefixed key used in query-string brackets.
    pub fn key(&self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Eqi => "$eqi",
            Operator::Nei => "$nei",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Contains => "$contains",
            Operator::NotContains => "$notContains",
            Operator::Containsi => "$containsi",
            Operator::NotContainsi => "$notContainsi",
            Operator::StartsWith => "$startsWith",
            Operator::StartsWithi => "$startsWithi",
            Operator::EndsWith => "$endsWith",
            Operator::EndsWithi => "$endsWithi",
            Operator::Null => "$null",
            Operator::NotNull => "$notNull",
            Operator::In => "$in",
            Operator::NotIn => "$notIn",
            Operator::Between => "$between",
        }
    }

    /// Parses an operator key, with or without the leading `$`.
    /// Keys are case-sensitive, matching the wire format.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.strip_prefix('$').unwrap_or(key);
        let op = match key {
            "eq" => Operator::Eq,
            "ne" => Operator::Ne,
            "eqi" => Operator::Eqi,
            "nei" => Operator::Nei,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "contains" => Operator::Contains,
            "notContains" => Operator::NotContains,
            "containsi" => Operator::Containsi,
            "notContainsi" => Operator::NotContainsi,
            "startsWith" => Operator::StartsWith,
            "startsWithi" => Operator::StartsWithi,
            "endsWith" => Operator::EndsWith,
            "endsWithi" => Operator::EndsWithi,
            "null" => Operator::Null,
            "notNull" => Operator::NotNull,
            "in" => Operator::In,
            "notIn" => Operator::NotIn,
            "between" => Operator::Between,
            _ => return None,
        };
        Some(op)
    }

    /// Null checks carry no operand; everything else needs a value.
    pub fn needs_value(&self) -> bool {
        !matches!(self, Operator::Null | Operator::NotNull)
    }

    /// List operators take a comma-joined value that is split on the wire.
    pub fn is_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

/// The logic connector applied between all direct children of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    And,
    Or,
}

impl Logic {
    /// The lowercase `$`-prefixed wire key.
    pub fn key(&self) -> &'static str {
        match self {
            Logic::And => "$and",
            Logic::Or => "$or",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.strip_prefix('$').unwrap_or(key) {
            "and" => Some(Logic::And),
            "or" => Some(Logic::Or),
            _ => None,
        }
    }

    /// The label shown between rows in the editor.
    pub fn label(&self) -> &'static str {
        match self {
            Logic::And => "AND",
            Logic::Or => "OR",
        }
    }
}

/// Sort direction for the flat `sort=field:ORDER` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// Lenient parse for round-tripping URLs; anything that is not
    /// `DESC` falls back to ascending.
    pub fn from_param(param: &str) -> Self {
        if param.eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_OPERATORS: &[Operator] = &[
        Operator::Eq,
        Operator::Ne,
        Operator::Eqi,
        Operator::Nei,
        Operator::Lt,
        Operator::Lte,
        Operator::Gt,
        Operator::Gte,
        Operator::Contains,
        Operator::NotContains,
        Operator::Containsi,
        Operator::NotContainsi,
        Operator::StartsWith,
        Operator::StartsWithi,
        Operator::EndsWith,
        Operator::EndsWithi,
        Operator::Null,
        Operator::NotNull,
        Operator::In,
        Operator::NotIn,
        Operator::Between,
    ];

    #[test]
    fn test_operator_key_round_trip() {
        for op in ALL_OPERATORS {
            assert_eq!(Operator::from_key(op.key()), Some(*op));
            // The bare form (operator extraction strips the `$`) must work too
            assert_eq!(Operator::from_key(&op.key()[1..]), Some(*op));
        }
    }

    #[test]
    fn test_unknown_operator_key() {
        assert_eq!(Operator::from_key("$bogus"), None);
        assert_eq!(Operator::from_key(""), None);
        // Keys are case-sensitive
        assert_eq!(Operator::from_key("$EQ"), None);
        assert_eq!(Operator::from_key("$notcontains"), None);
    }

    #[test]
    fn test_needs_value() {
        assert!(!Operator::Null.needs_value());
        assert!(!Operator::NotNull.needs_value());
        assert!(Operator::Eq.needs_value());
        assert!(Operator::Between.needs_value());
    }

    #[test]
    fn test_logic_keys() {
        assert_eq!(Logic::And.key(), "$and");
        assert_eq!(Logic::Or.key(), "$or");
        assert_eq!(Logic::from_key("$or"), Some(Logic::Or));
        assert_eq!(Logic::from_key("and"), Some(Logic::And));
        assert_eq!(Logic::from_key("$AND"), None);
    }

    #[test]
    fn test_sort_order_param() {
        assert_eq!(SortOrder::from_param("DESC"), SortOrder::Desc);
        assert_eq!(SortOrder::from_param("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::from_param("ASC"), SortOrder::Asc);
        assert_eq!(SortOrder::from_param("whatever"), SortOrder::Asc);
    }
}
