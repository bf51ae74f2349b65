pub mod dispatcher;
pub mod error;
pub mod page;
pub mod selection;

pub use dispatcher::{
    DispatchConfig, DispatchOutcome, DispatchState, Dispatcher, DEFAULT_SERVER_URL,
    INVALID_SUBMISSION_ALERT, REQUEST_FAILURE_ALERT,
};
pub use error::DispatchError;
pub use page::{Page, TerminalPage};
pub use selection::{FileListing, FileSelection, SelectedFile};
