pub mod export;
pub mod sources;
