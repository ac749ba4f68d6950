pub mod credential;
pub mod traits;

// Sheet client implementations
pub mod google;
pub mod memory;
