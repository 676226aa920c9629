//! Filter token grammar.
//!
//! A raw `filter.<column>` value has the shape
//! `[$and|$or:][$not:][$operator:]value`, for example `$gte:3`,
//! `$or:$not:$in:1,2,3` or `$not:$null`.

use serde::{Deserialize, Serialize};

const SEPARATOR: char = ':';
/// comparator, suffix and operator
const MAX_PREFIX_TOKENS: usize = 3;
const NULL_TOKEN: &str = "$null";

/// How a filter combines with the filters before it on the same column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterComparator {
    #[default]
    #[serde(rename = "$and")]
    And,
    #[serde(rename = "$or")]
    Or,
}

impl FilterComparator {
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "$and" => Some(Self::And),
            "$or" => Some(Self::Or),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_token(self) -> &'static str {
        match self {
            Self::And => "$and",
            Self::Or => "$or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterSuffix {
    #[serde(rename = "$not")]
    Not,
}

impl FilterSuffix {
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "$not" => Some(Self::Not),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_token(self) -> &'static str {
        match self {
            Self::Not => "$not",
        }
    }
}

/// Comparison operators for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterOperator {
    /// Equality (=)
    #[default]
    #[serde(rename = "$eq")]
    Eq,
    /// Greater than (>)
    #[serde(rename = "$gt")]
    Gt,
    /// Greater than or equal (>=)
    #[serde(rename = "$gte")]
    Gte,
    /// Less than (<)
    #[serde(rename = "$lt")]
    Lt,
    /// Less than or equal (<=)
    #[serde(rename = "$lte")]
    Lte,
    /// IN (comma separated values)
    #[serde(rename = "$in")]
    In,
    /// IS NULL
    #[serde(rename = "$null")]
    Null,
    /// BETWEEN (two comma separated bounds)
    #[serde(rename = "$btw")]
    Btw,
    /// Case-insensitive contains
    #[serde(rename = "$ilike")]
    ILike,
    /// Starts with
    #[serde(rename = "$sw")]
    Sw,
}

impl FilterOperator {
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "$eq" => Some(Self::Eq),
            "$gt" => Some(Self::Gt),
            "$gte" => Some(Self::Gte),
            "$lt" => Some(Self::Lt),
            "$lte" => Some(Self::Lte),
            "$in" => Some(Self::In),
            "$null" => Some(Self::Null),
            "$btw" => Some(Self::Btw),
            "$ilike" => Some(Self::ILike),
            "$sw" => Some(Self::Sw),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_token(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::In => "$in",
            Self::Null => "$null",
            Self::Btw => "$btw",
            Self::ILike => "$ilike",
            Self::Sw => "$sw",
        }
    }

    /// Whether the value is a comma separated list.
    #[must_use]
    pub const fn takes_list(self) -> bool {
        matches!(self, Self::In | Self::Btw)
    }
}

/// A parsed filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterToken {
    pub comparator: FilterComparator,
    pub suffix: Option<FilterSuffix>,
    pub operator: FilterOperator,
    /// Always `None` for [`FilterOperator::Null`]
    pub value: Option<String>,
}

impl FilterToken {
    /// The value split on commas for list operators, or as a single item.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match &self.value {
            None => Vec::new(),
            Some(value) if self.operator.takes_list() => value.split(',').collect(),
            Some(value) => vec![value.as_str()],
        }
    }

    #[must_use]
    pub fn is_negated(&self) -> bool {
        self.suffix == Some(FilterSuffix::Not)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Comparator,
    Suffix,
    Operator,
    Done,
}

/// Parse one raw filter value.
///
/// Never fails: input without a recognisable prefix becomes an `$eq` filter on
/// the whole raw string.
#[must_use]
pub fn parse_filter_token(raw: Option<&str>) -> Option<FilterToken> {
    let raw = raw?;
    let mut token = FilterToken {
        comparator: FilterComparator::default(),
        suffix: None,
        operator: FilterOperator::default(),
        value: Some(raw.to_owned()),
    };

    let mut stage = Stage::Comparator;
    let mut consumed = 0;
    for segment in raw.split(SEPARATOR).take(MAX_PREFIX_TOKENS) {
        stage = if stage <= Stage::Comparator
            && let Some(comparator) = FilterComparator::from_token(segment)
        {
            token.comparator = comparator;
            Stage::Suffix
        } else if stage <= Stage::Suffix
            && let Some(suffix) = FilterSuffix::from_token(segment)
        {
            token.suffix = Some(suffix);
            Stage::Operator
        } else if stage <= Stage::Operator
            && let Some(operator) = FilterOperator::from_token(segment)
        {
            token.operator = operator;
            Stage::Done
        } else {
            break;
        };
        consumed += segment.len() + SEPARATOR.len_utf8();
    }

    if consumed > 0 {
        token.value = Some(raw.get(consumed..).unwrap_or_default().to_owned());
    }

    if token.operator == FilterOperator::Null || token.value.as_deref() == Some(NULL_TOKEN) {
        token.operator = FilterOperator::Null;
        token.value = None;
    }

    Some(token)
}
