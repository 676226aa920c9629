// Row types bound to a pagination config

pub mod traits;

pub use traits::PaginatedResource;
