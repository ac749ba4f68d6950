pub mod comparison;
pub mod filter;
pub mod layout;
pub mod record;
pub mod settings;
