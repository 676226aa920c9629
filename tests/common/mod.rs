#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    routing::get,
};
use chrono::{TimeZone, Utc};
use sea_orm::{ActiveValue::Set, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait};
use sea_orm_migration::prelude::*;
use sea_paginate::{PaginateConfig, PaginateError, PaginateQuery, Paginated, PaginatedResource, paginate};
use serde_json::Value;
use tower::ServiceExt;

pub mod cat_entity;
pub mod shop_entity;
pub mod toy_entity;

/// Route library logs to the test harness; `RUST_LOG=sea_paginate=debug` shows the SQL.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_test_writer()
        .compact()
        .try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    init_tracing();
    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Five cats, listed newest first:
///
/// | id | name     | color  | age  | height | toys          |
/// |----|----------|--------|------|--------|---------------|
/// | 4  | George   | white  | 3    | 25     | Ball          |
/// | 5  | Leche    | white  | null | 20     |               |
/// | 2  | Garfield | ginger | 5    | 35     | Feather       |
/// | 1  | Milo     | brown  | 6    | 40     | Mouse, Ball   |
/// | 3  | Shadow   | black  | 4    | 30     |               |
pub async fn setup_seeded_db() -> Result<DatabaseConnection, DbErr> {
    let db = setup_test_db().await?;
    seed(&db).await?;
    Ok(db)
}

pub fn cat(id: i32, name: &str, color: &str, age: Option<i32>, height: f64, day: u32) -> cat_entity::ActiveModel {
    cat_entity::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        color: Set(color.to_string()),
        age: Set(age),
        size_height: Set(height),
        size_width: Set(height / 2.0),
        created_at: Set(Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()),
        deleted_at: Set(None),
    }
}

async fn seed<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    shop_entity::Entity::insert_many([
        shop_entity::ActiveModel { id: Set(1), city: Set("Oslo".to_string()) },
        shop_entity::ActiveModel { id: Set(2), city: Set("Bergen".to_string()) },
    ])
    .exec(db)
    .await?;

    cat_entity::Entity::insert_many([
        cat(4, "George", "white", Some(3), 25.0, 5),
        cat(5, "Leche", "white", None, 20.0, 4),
        cat(2, "Garfield", "ginger", Some(5), 35.0, 3),
        cat(1, "Milo", "brown", Some(6), 40.0, 2),
        cat(3, "Shadow", "black", Some(4), 30.0, 1),
    ])
    .exec(db)
    .await?;

    let toy = |id: i32, name: &str, cat_id: i32, shop_id: i32| toy_entity::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        cat_id: Set(cat_id),
        shop_id: Set(shop_id),
    };
    toy_entity::Entity::insert_many([
        toy(1, "Mouse", 1, 1),
        toy(2, "Ball", 1, 2),
        toy(3, "Feather", 2, 1),
        toy(4, "Ball", 4, 2),
    ])
    .exec(db)
    .await?;

    Ok(())
}

pub fn ids(page: &Paginated<cat_entity::Model>) -> Vec<i32> {
    page.data.iter().map(|cat| cat.id).collect()
}

async fn list_cats(
    State(db): State<DatabaseConnection>,
    query: PaginateQuery,
) -> Result<Json<Paginated<cat_entity::Model>>, PaginateError> {
    Ok(Json(cat_entity::Model::paginate(&db, &query).await?))
}

async fn list_misconfigured(
    State(db): State<DatabaseConnection>,
    query: PaginateQuery,
) -> Result<Json<Paginated<cat_entity::Model>>, PaginateError> {
    let config = PaginateConfig::new(cat_entity::Model::schema());
    Ok(Json(paginate(&query, &db, &config).await?))
}

pub fn setup_test_app(db: DatabaseConnection) -> Router {
    Router::new()
        .route("/cats", get(list_cats))
        .route("/broken", get(list_misconfigured))
        .with_state(db)
}

/// GET `uri` and decode the JSON body.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .header("host", "localhost")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateTables)]
    }
}

pub struct CreateTables;

#[async_trait::async_trait]
impl MigrationName for CreateTables {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_cat_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = sea_orm::Schema::new(manager.get_database_backend());
        manager
            .create_table(schema.create_table_from_entity(shop_entity::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(cat_entity::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(toy_entity::Entity))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(toy_entity::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(cat_entity::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(shop_entity::Entity).to_owned())
            .await?;
        Ok(())
    }
}
