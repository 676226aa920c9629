use super::columns::{ColumnResolver, ResolvedColumn};
use sea_orm::{
    Condition, DatabaseBackend,
    sea_query::{Alias, Expr, Func, LikeExpr, SimpleExpr},
};

const LIKE_ESCAPE: char = '\\';

/// Escape LIKE wildcards so user input only ever matches literally.
/// Escapes: % (match any) and _ (match single char)
fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Where a LIKE pattern anchors its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeMatch {
    Contains,
    StartsWith,
}

impl LikeMatch {
    fn pattern(self, value: &str) -> String {
        let escaped = escape_like_wildcards(value).to_uppercase();
        match self {
            Self::Contains => format!("%{escaped}%"),
            Self::StartsWith => format!("{escaped}%"),
        }
    }
}

/// Case-insensitive `UPPER(column) LIKE '%VALUE%' ESCAPE '\'`.
///
/// Postgres has no implicit text conversion for `UPPER`, so non-text columns
/// are cast first.
#[must_use]
pub fn build_like_condition(
    column: &ResolvedColumn,
    value: &str,
    matching: LikeMatch,
    backend: DatabaseBackend,
) -> SimpleExpr {
    let target = if backend == DatabaseBackend::Postgres && !column.kind.is_text() {
        Expr::expr(column.to_expr()).cast_as(Alias::new("TEXT"))
    } else {
        column.to_expr()
    };

    Expr::expr(Func::upper(target))
        .like(LikeExpr::new(matching.pattern(value)).escape(LIKE_ESCAPE))
}

/// Search `term` across `columns`.
///
/// Without `multi_word` the whole term must be contained in at least one
/// column. With it, every whitespace separated word must be contained in at
/// least one column. Returns `None` when there is nothing to search.
pub fn build_search_condition(
    term: &str,
    columns: &[String],
    multi_word: bool,
    resolver: &mut ColumnResolver<'_>,
    backend: DatabaseBackend,
) -> Option<Condition> {
    if columns.is_empty() || term.trim().is_empty() {
        return None;
    }

    let resolved: Vec<ResolvedColumn> = columns.iter().map(|column| resolver.resolve(column)).collect();
    let any_column = |word: &str| {
        resolved.iter().fold(Condition::any(), |condition, column| {
            condition.add(build_like_condition(column, word, LikeMatch::Contains, backend))
        })
    };

    if multi_word {
        Some(
            term.split_whitespace()
                .fold(Condition::all(), |condition, word| condition.add(any_column(word))),
        )
    } else {
        Some(any_column(term))
    }
}
