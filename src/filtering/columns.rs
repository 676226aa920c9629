//! Column path resolution.
//!
//! Turns a dotted column path from the query string into a SQL expression:
//!
//! | path              | meaning                          | expression                  |
//! |-------------------|----------------------------------|-----------------------------|
//! | `name`            | root column                      | `cat.name`                  |
//! | `toys.name`       | relation column                  | `cat_toys.name` (joined)    |
//! | `toys.shop.city`  | nested relation column           | `cat_toys_shop.city`        |
//! | `size.height`     | embedded property                | `cat.size_height`           |
//! | `toy_count`       | virtual column with a generator  | `(SELECT ... cat.id)`       |
//! | `toys.rank`       | virtual relation column, no SQL  | `cat_toys_rank`             |
//!
//! Unknown paths are not rejected here; they become literal column references
//! and any error comes from the database.

use crate::schema::{ColumnGenerator, ColumnKind, Schema};
use sea_orm::sea_query::{Alias, Expr, JoinType, SelectStatement, SimpleExpr};
use std::collections::BTreeSet;
use std::fmt;

const PATH_SEPARATOR: char = '.';
const ALIAS_SEPARATOR: &str = "_";

/// How a column path maps onto the schema.
#[derive(Clone)]
pub struct ColumnProperties {
    /// Relation or embedded prefix of the path, dotted
    pub property_path: Option<String>,
    pub property_name: String,
    pub is_relation: bool,
    pub is_embedded: bool,
    pub is_virtual: bool,
    pub generator: Option<ColumnGenerator>,
    relation_segments: Vec<String>,
    embedded_segment: Option<String>,
    kind: ColumnKind,
}

impl fmt::Debug for ColumnProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnProperties")
            .field("property_path", &self.property_path)
            .field("property_name", &self.property_name)
            .field("is_relation", &self.is_relation)
            .field("is_embedded", &self.is_embedded)
            .field("is_virtual", &self.is_virtual)
            .field("has_generator", &self.generator.is_some())
            .finish_non_exhaustive()
    }
}

/// A SQL reference to a resolved column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnExpr {
    /// `table_alias.column`
    Column { table: String, column: String },
    /// Unqualified select alias
    Alias(String),
    /// Generated SQL, rendered in parentheses
    Generated(String),
}

impl ColumnExpr {
    #[must_use]
    pub fn to_expr(&self) -> SimpleExpr {
        match self {
            Self::Column { table, column } => {
                Expr::col((Alias::new(table.as_str()), Alias::new(column.as_str()))).into()
            }
            Self::Alias(alias) => Expr::col(Alias::new(alias.as_str())).into(),
            Self::Generated(sql) => Expr::cust(format!("({sql})")),
        }
    }
}

impl fmt::Display for ColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column { table, column } => write!(f, "{table}.{column}"),
            Self::Alias(alias) => write!(f, "{alias}"),
            Self::Generated(sql) => write!(f, "({sql})"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    pub expr: ColumnExpr,
    pub kind: ColumnKind,
}

impl ResolvedColumn {
    #[must_use]
    pub fn to_expr(&self) -> SimpleExpr {
        self.expr.to_expr()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Join {
    table: String,
    alias: String,
    parent_alias: String,
    from_column: String,
    to_column: String,
}

/// Resolves column paths against a schema and records the joins they need.
///
/// One resolver lives for one query; each relation path is joined at most once.
#[derive(Debug, Clone)]
pub struct ColumnResolver<'a> {
    schema: &'a Schema,
    joined: BTreeSet<String>,
    joins: Vec<Join>,
}

impl<'a> ColumnResolver<'a> {
    #[must_use]
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            joined: BTreeSet::new(),
            joins: Vec::new(),
        }
    }

    #[must_use]
    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    #[must_use]
    pub fn root_alias(&self) -> &'a str {
        self.schema.alias()
    }

    /// Alias of a joined relation: `<root>_<segment>_<segment>`.
    #[must_use]
    pub fn relation_alias<S: AsRef<str>>(&self, segments: &[S]) -> String {
        let mut alias = self.root_alias().to_owned();
        for segment in segments {
            alias.push_str(ALIAS_SEPARATOR);
            alias.push_str(segment.as_ref());
        }
        alias
    }

    /// Schema at the end of a dotted relation path.
    #[must_use]
    pub fn relation_schema(&self, relation_path: &str) -> Option<&'a Schema> {
        let mut schema = self.schema;
        for segment in relation_path.split(PATH_SEPARATOR) {
            schema = &schema.relation(segment)?.target;
        }
        Some(schema)
    }

    /// Classify a column path without side effects.
    #[must_use]
    pub fn properties(&self, path: &str) -> ColumnProperties {
        let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
        let (leaf, prefix) = segments
            .split_last()
            .map_or((path, &[][..]), |(leaf, prefix)| (*leaf, prefix));

        let mut schema = self.schema;
        let mut relation_segments = Vec::new();
        let mut embedded_segment = None;
        let mut known = true;
        for segment in prefix {
            if embedded_segment.is_none()
                && let Some(relation) = schema.relation(segment)
            {
                relation_segments.push((*segment).to_owned());
                schema = &relation.target;
            } else if embedded_segment.is_none() && schema.is_embedded(segment) {
                embedded_segment = Some((*segment).to_owned());
            } else {
                known = false;
                break;
            }
        }

        let virtual_column = if known && embedded_segment.is_none() {
            schema.virtual_column(leaf)
        } else {
            None
        };
        let stored_name = embedded_segment
            .as_ref()
            .map_or_else(|| leaf.to_owned(), |embedded| stored_embedded_name(embedded, leaf));

        ColumnProperties {
            property_path: (!prefix.is_empty()).then(|| prefix.join(".")),
            property_name: leaf.to_owned(),
            is_relation: known && !relation_segments.is_empty(),
            is_embedded: known
                && embedded_segment
                    .as_deref()
                    .is_some_and(|embedded| schema.has_embedded_property(embedded, leaf)),
            is_virtual: virtual_column.is_some(),
            generator: virtual_column.and_then(|column| column.generator().cloned()),
            kind: if known { schema.column_kind(&stored_name) } else { ColumnKind::Other },
            relation_segments: if known { relation_segments } else { Vec::new() },
            embedded_segment,
        }
    }

    /// Build the SQL reference for already classified properties.
    #[must_use]
    pub fn column_alias(&self, properties: &ColumnProperties) -> ColumnExpr {
        let owner = if properties.is_relation {
            self.relation_alias(&properties.relation_segments)
        } else {
            self.root_alias().to_owned()
        };

        if properties.is_virtual {
            return match &properties.generator {
                Some(generator) => ColumnExpr::Generated(generator(&owner)),
                None => ColumnExpr::Alias(format!(
                    "{owner}{ALIAS_SEPARATOR}{}",
                    properties.property_name
                )),
            };
        }

        if properties.is_embedded
            && let Some(embedded) = &properties.embedded_segment
        {
            return ColumnExpr::Column {
                table: owner,
                column: stored_embedded_name(embedded, &properties.property_name),
            };
        }

        if !properties.is_relation
            && let Some(prefix) = &properties.property_path
        {
            // unknown prefix: keep the relation shape and let the database complain
            let segments: Vec<&str> = prefix.split(PATH_SEPARATOR).collect();
            return ColumnExpr::Column {
                table: self.relation_alias(&segments),
                column: properties.property_name.clone(),
            };
        }

        ColumnExpr::Column {
            table: owner,
            column: properties.property_name.clone(),
        }
    }

    /// Resolve a column path, joining any relations it crosses.
    pub fn resolve(&mut self, path: &str) -> ResolvedColumn {
        let properties = self.properties(path);
        if properties.is_relation {
            self.join_segments(&properties.relation_segments);
        }
        ResolvedColumn {
            expr: self.column_alias(&properties),
            kind: properties.kind,
        }
    }

    /// Join a dotted relation path. Returns `false` when a segment is not a
    /// declared relation; nothing is joined in that case.
    pub fn join(&mut self, relation_path: &str) -> bool {
        if self.relation_schema(relation_path).is_none() {
            tracing::debug!(relation = relation_path, "Ignoring unknown relation");
            return false;
        }
        let segments: Vec<String> = relation_path
            .split(PATH_SEPARATOR)
            .map(str::to_owned)
            .collect();
        self.join_segments(&segments);
        true
    }

    fn join_segments(&mut self, segments: &[String]) {
        let mut schema = self.schema;
        for depth in 1..=segments.len() {
            let Some(relation) = schema.relation(&segments[depth - 1]) else {
                return;
            };
            let path = segments[..depth].join(".");
            if self.joined.insert(path) {
                self.joins.push(Join {
                    table: relation.target.table().to_owned(),
                    alias: self.relation_alias(&segments[..depth]),
                    parent_alias: self.relation_alias(&segments[..depth - 1]),
                    from_column: relation.from_column.clone(),
                    to_column: relation.to_column.clone(),
                });
            }
            schema = &relation.target;
        }
    }

    /// Aliases of the relations joined so far, in join order.
    pub fn joined_paths(&self) -> impl Iterator<Item = &str> {
        self.joins.iter().map(|join| join.alias.as_str())
    }

    #[must_use]
    pub fn has_joins(&self) -> bool {
        !self.joins.is_empty()
    }

    /// Add the recorded LEFT JOINs to a statement.
    pub fn apply_joins(&self, statement: &mut SelectStatement) {
        for join in &self.joins {
            statement.join_as(
                JoinType::LeftJoin,
                Alias::new(join.table.as_str()),
                Alias::new(join.alias.as_str()),
                Expr::col((
                    Alias::new(join.parent_alias.as_str()),
                    Alias::new(join.from_column.as_str()),
                ))
                .equals((Alias::new(join.alias.as_str()), Alias::new(join.to_column.as_str()))),
            );
        }
    }
}

fn stored_embedded_name(embedded: &str, property: &str) -> String {
    format!("{embedded}{ALIAS_SEPARATOR}{property}")
}
