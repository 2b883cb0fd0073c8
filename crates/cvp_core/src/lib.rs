pub mod models;
pub mod error;
pub mod storage;
pub mod types;

pub use error::Error;
pub use models::EmbeddingModel;
pub use storage::ArticleStorage;
pub use types::Article;

pub type Result<T> = std::result::Result<T, Error>;
