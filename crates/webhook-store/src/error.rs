use thiserror::Error;

/// Errors surfaced by the subscription store and delivery logger.
///
/// These always propagate to the caller — unlike `webhook-cache`'s errors,
/// a store error is a real failure of the primary data store and is mapped
/// to a 5xx by `webhook-http`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying MongoDB driver returned an error.
    #[error("document store error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    /// A Rust value failed to encode into a BSON document.
    #[error("failed to encode document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),
    /// A stored BSON document failed to decode into its Rust type.
    #[error("failed to decode stored document: {0}")]
    Decode(#[from] mongodb::bson::de::Error),
}
