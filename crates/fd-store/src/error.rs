use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Flow {id} was modified concurrently")]
    Conflict { id: String },
    #[error("Store fault: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
