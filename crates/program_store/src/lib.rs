mod error;
mod paths;
mod schema;
mod store;

pub use error::ProgramStoreError;
pub use paths::{programs_file, PROGRAMS_FILE_NAME};
pub use schema::{current_epoch_ms, Program};
pub use store::ProgramStore;
