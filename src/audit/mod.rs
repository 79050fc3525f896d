pub mod history;

pub use history::{CommandHistory, HISTORY_FILE_NAME};
