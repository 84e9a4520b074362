pub mod audience;
pub mod envelope;
pub mod executor;
pub mod lro;
pub mod pagination;
pub mod transport;
