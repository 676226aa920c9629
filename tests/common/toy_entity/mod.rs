use sea_orm::entity::prelude::*;
use sea_paginate::{RelationSchema, Schema};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "toys")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
    pub cat_id: i32,
    pub shop_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cat_entity::Entity",
        from = "Column::CatId",
        to = "super::cat_entity::Column::Id"
    )]
    Cat,
    #[sea_orm(
        belongs_to = "super::shop_entity::Entity",
        from = "Column::ShopId",
        to = "super::shop_entity::Column::Id"
    )]
    Shop,
}

impl Related<super::cat_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cat.def()
    }
}

impl Related<super::shop_entity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shop.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn schema() -> Schema {
    let shop = RelationSchema::from_def(&Relation::Shop.def(), Schema::of::<super::shop_entity::Entity>())
        .expect("shop relation joins on a single column");
    Schema::of::<Entity>().with_relation("shop", shop)
}
