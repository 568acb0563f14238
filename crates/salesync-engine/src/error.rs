use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Db(#[from] salesync_db::DbError),

    #[error(transparent)]
    Catalog(#[from] salesync_catalog::CatalogError),

    #[error("variant {variant_id} carries an unparseable price: {value:?}")]
    InvalidPrice { variant_id: String, value: String },
}
