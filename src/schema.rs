//! Runtime schema metadata.
//!
//! Sea-ORM entities are statically typed, but pagination requests name columns
//! with strings such as `toys.name` or `size.height`. A [`Schema`] captures just
//! enough of an entity (and the entities reachable through its relations) to
//! turn those strings into qualified SQL expressions.
//!
//! ```rust,ignore
//! let schema = Schema::of::<cat::Entity>()
//!     .with_alias("cat")
//!     .with_embedded("size", ["height", "width"])
//!     .with_relation("toys", RelationSchema::new(Schema::of::<toy::Entity>(), "id", "cat_id"))
//!     .with_virtual_column("toy_count", |alias| {
//!         format!("SELECT COUNT(*) FROM toys WHERE toys.cat_id = {alias}.id")
//!     });
//! ```

use sea_orm::{
    ColumnTrait, EntityTrait, IdenStatic, Identity, Iterable, PrimaryKeyToColumn,
    RelationDef, Value,
    sea_query::ColumnType,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Builds the SQL of a virtual column from the alias of the table that owns it.
pub type ColumnGenerator = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Coarse value type of a column, used to bind filter values with the right type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
    Boolean,
    Uuid,
    #[default]
    Other,
}

impl ColumnKind {
    #[must_use]
    pub fn from_column_type(column_type: &ColumnType) -> Self {
        match column_type {
            ColumnType::Char(_) | ColumnType::String(_) | ColumnType::Text => Self::Text,
            ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned => Self::Integer,
            ColumnType::Float | ColumnType::Double | ColumnType::Decimal(_) => Self::Float,
            ColumnType::Boolean => Self::Boolean,
            ColumnType::Uuid => Self::Uuid,
            _ => Self::Other,
        }
    }

    /// Convert a raw query-string value into a bound value for this kind.
    ///
    /// Values that do not parse as the column's kind are bound as text so the
    /// database gets the final say.
    #[must_use]
    pub fn coerce(self, raw: &str) -> Value {
        let trimmed = raw.trim();
        match self {
            Self::Integer => {
                if let Ok(int_value) = trimmed.parse::<i64>() {
                    return Value::from(int_value);
                }
                if let Ok(float_value) = trimmed.parse::<f64>() {
                    return Value::from(float_value);
                }
            }
            Self::Float => {
                if let Ok(float_value) = trimmed.parse::<f64>() {
                    return Value::from(float_value);
                }
            }
            Self::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" => return Value::from(true),
                "false" | "0" => return Value::from(false),
                _ => {}
            },
            Self::Uuid => {
                if let Ok(uuid_value) = Uuid::parse_str(trimmed) {
                    return Value::from(uuid_value);
                }
            }
            Self::Text | Self::Other => {}
        }
        Value::from(raw.to_owned())
    }

    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Text)
    }
}

/// A computed column. With a generator the column is an inline SQL expression,
/// without one it refers to an alias the caller selects themselves.
#[derive(Clone, Default)]
pub struct VirtualColumn {
    generator: Option<ColumnGenerator>,
}

impl VirtualColumn {
    #[must_use]
    pub fn generator(&self) -> Option<&ColumnGenerator> {
        self.generator.as_ref()
    }
}

impl fmt::Debug for VirtualColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualColumn")
            .field("generator", &self.generator.is_some())
            .finish()
    }
}

/// A relation from one schema to another, joined on a single column pair.
#[derive(Debug, Clone)]
pub struct RelationSchema {
    pub target: Schema,
    /// Column on the owning table
    pub from_column: String,
    /// Column on the target table
    pub to_column: String,
}

impl RelationSchema {
    pub fn new(target: Schema, from_column: impl Into<String>, to_column: impl Into<String>) -> Self {
        Self {
            target,
            from_column: from_column.into(),
            to_column: to_column.into(),
        }
    }

    /// Build from a Sea-ORM relation definition, e.g. `Relation::Toys.def()`.
    ///
    /// Returns `None` for composite-key relations.
    #[must_use]
    pub fn from_def(def: &RelationDef, target: Schema) -> Option<Self> {
        Some(Self::new(
            target,
            single_column(&def.from_col)?,
            single_column(&def.to_col)?,
        ))
    }
}

fn single_column(identity: &Identity) -> Option<String> {
    match identity {
        Identity::Unary(iden) => Some(iden.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    table: String,
    alias: String,
    primary_key: Vec<String>,
    columns: BTreeMap<String, ColumnKind>,
    column_order: Vec<String>,
    embedded: BTreeMap<String, Vec<String>>,
    relations: BTreeMap<String, RelationSchema>,
    virtual_columns: BTreeMap<String, VirtualColumn>,
    deleted_at: Option<String>,
}

impl Schema {
    /// Empty schema for a table; the alias defaults to the table name.
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            alias: table.clone(),
            table,
            ..Default::default()
        }
    }

    /// Read table name, columns and primary key from a Sea-ORM entity.
    #[must_use]
    pub fn of<E: EntityTrait>() -> Self {
        let mut schema = Self::new(E::default().table_name());
        for column in E::Column::iter() {
            let kind = ColumnKind::from_column_type(column.def().get_column_type());
            schema = schema.with_column(column.as_str(), kind);
        }
        schema.primary_key = E::PrimaryKey::iter()
            .map(|key| key.into_column().as_str().to_owned())
            .collect();
        schema
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, kind: ColumnKind) -> Self {
        let name = name.into();
        if self.columns.insert(name.clone(), kind).is_none() {
            self.column_order.push(name);
        }
        self
    }

    #[must_use]
    pub fn with_primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Declare an embedded object whose properties are stored as
    /// `<name>_<property>` columns on this table.
    #[must_use]
    pub fn with_embedded<I, S>(mut self, name: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.embedded
            .insert(name.into(), properties.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_relation(mut self, name: impl Into<String>, relation: RelationSchema) -> Self {
        self.relations.insert(name.into(), relation);
        self
    }

    /// Declare a virtual column computed by `generator` from the owning alias.
    #[must_use]
    pub fn with_virtual_column<F>(mut self, name: impl Into<String>, generator: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.virtual_columns.insert(
            name.into(),
            VirtualColumn {
                generator: Some(Arc::new(generator)),
            },
        );
        self
    }

    /// Declare a virtual column without a generator. It is referenced through
    /// a flattened select alias.
    #[must_use]
    pub fn with_virtual_alias(mut self, name: impl Into<String>) -> Self {
        self.virtual_columns.insert(name.into(), VirtualColumn::default());
        self
    }

    /// Soft-delete marker column; rows where it is not null are hidden unless
    /// the config asks for deleted rows.
    #[must_use]
    pub fn with_deleted_at(mut self, column: impl Into<String>) -> Self {
        self.deleted_at = Some(column.into());
        self
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    #[must_use]
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Stored column names in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.column_order.iter().map(String::as_str)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    #[must_use]
    pub fn column_kind(&self, name: &str) -> ColumnKind {
        self.columns.get(name).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&RelationSchema> {
        self.relations.get(name)
    }

    #[must_use]
    pub fn is_embedded(&self, name: &str) -> bool {
        self.embedded.contains_key(name)
    }

    /// Whether `property` was declared for the embedded object `name`.
    #[must_use]
    pub fn has_embedded_property(&self, name: &str, property: &str) -> bool {
        self.embedded
            .get(name)
            .is_some_and(|properties| properties.iter().any(|declared| declared == property))
    }

    #[must_use]
    pub fn virtual_column(&self, name: &str) -> Option<&VirtualColumn> {
        self.virtual_columns.get(name)
    }

    pub fn virtual_columns(&self) -> impl Iterator<Item = (&str, &VirtualColumn)> {
        self.virtual_columns.iter().map(|(name, column)| (name.as_str(), column))
    }

    #[must_use]
    pub fn deleted_at_column(&self) -> Option<&str> {
        self.deleted_at.as_deref()
    }
}
