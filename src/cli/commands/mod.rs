//! CLI command implementations.

mod ask;
mod config;
mod dataset;
mod ingest;
mod list;
mod search;
mod serve;
mod train;

pub use ask::run_ask;
pub use config::run_config;
pub use dataset::run_dataset;
pub use ingest::run_ingest;
pub use list::run_list;
pub use search::run_search;
pub use serve::run_serve;
pub use train::run_train;
