pub mod codec;
pub mod config;
pub mod copywriter;
pub mod leads;
pub mod store;
pub mod terminal;
pub mod vault;
