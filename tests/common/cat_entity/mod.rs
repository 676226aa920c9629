use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_paginate::{
    FilterKeyword, FilterOperator, FilterRule, FilterSuffix, PaginateConfig, PaginatedResource,
    RelationSchema, Schema,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "cats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
    pub color: String,
    pub age: Option<i32>,
    pub size_height: f64,
    pub size_width: f64,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::toy_entity::Entity")]
    Toys,
}

impl Related<super::toy_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Toys.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn keywords<const N: usize>(keywords: [FilterKeyword; N]) -> FilterRule {
    FilterRule::only(keywords)
}

#[async_trait]
impl PaginatedResource for Model {
    type EntityType = Entity;

    fn schema() -> Schema {
        let toys = RelationSchema::from_def(&Relation::Toys.def(), super::toy_entity::schema())
            .expect("toys relation joins on a single column");

        Schema::of::<Entity>()
            .with_alias("cat")
            .with_embedded("size", ["height", "width"])
            .with_relation("toys", toys)
            .with_virtual_column("toy_count", |alias| {
                format!("SELECT COUNT(*) FROM toys WHERE toys.cat_id = {alias}.id")
            })
            .with_deleted_at("deleted_at")
    }

    fn paginate_config() -> PaginateConfig {
        PaginateConfig::new(Self::schema())
            .with_sortable_columns([
                "id",
                "name",
                "color",
                "age",
                "created_at",
                "size.height",
                "toy_count",
            ])
            .with_searchable_columns(["name", "color"])
            .with_filterable_column("id", FilterRule::Any)
            .with_filterable_column("color", FilterRule::Any)
            .with_filterable_column(
                "name",
                keywords([
                    FilterOperator::Eq.into(),
                    FilterOperator::Sw.into(),
                    FilterOperator::ILike.into(),
                    FilterSuffix::Not.into(),
                ]),
            )
            .with_filterable_column(
                "age",
                keywords([
                    FilterOperator::Gte.into(),
                    FilterOperator::Lte.into(),
                    FilterOperator::Null.into(),
                    FilterOperator::Btw.into(),
                    FilterOperator::In.into(),
                    FilterSuffix::Not.into(),
                ]),
            )
            .with_filterable_column("size.height", FilterRule::Any)
            .with_filterable_column("toy_count", FilterRule::only([FilterOperator::Gte]))
            .with_filterable_column("toys.name", FilterRule::Any)
            .with_filterable_column("toys.shop.city", FilterRule::Any)
    }
}
