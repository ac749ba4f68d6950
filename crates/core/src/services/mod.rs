pub mod catalog_service;
pub mod import_service;
pub mod mutation_service;
pub mod query_service;
pub mod record_store;
