use crate::config::PaginateConfig;
use crate::errors::PaginateError;
use crate::models::{PaginateQuery, Paginated};
use crate::schema::Schema;
use async_trait::async_trait;
use sea_orm::{ConnectionTrait, EntityTrait, FromQueryResult};

/// A row type with a fixed pagination config.
///
/// ```rust,ignore
/// impl PaginatedResource for cat::Model {
///     type EntityType = cat::Entity;
///
///     fn paginate_config() -> PaginateConfig {
///         PaginateConfig::new(Self::schema().with_alias("cat"))
///             .with_sortable_columns(["id", "name"])
///     }
/// }
///
/// async fn list_cats(
///     State(db): State<DatabaseConnection>,
///     query: PaginateQuery,
/// ) -> Result<Json<Paginated<cat::Model>>, PaginateError> {
///     Ok(Json(cat::Model::paginate(&db, &query).await?))
/// }
/// ```
#[async_trait]
pub trait PaginatedResource: FromQueryResult + Sized + Send + Sync {
    type EntityType: EntityTrait;

    fn paginate_config() -> PaginateConfig;

    /// Schema read from the entity; override to add relations, embedded
    /// columns or virtual columns.
    #[must_use]
    fn schema() -> Schema {
        Schema::of::<Self::EntityType>()
    }

    async fn paginate<C>(db: &C, query: &PaginateQuery) -> Result<Paginated<Self>, PaginateError>
    where
        C: ConnectionTrait,
    {
        let config = Self::paginate_config();
        crate::paginate::paginate(query, db, &config).await
    }
}
