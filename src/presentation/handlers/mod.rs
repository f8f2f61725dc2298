mod run;
mod status;
mod transcribe;

pub use run::{RunRequest, RunResponse, run_handler};
pub use status::{API_VERSION, StatusResponse, status_handler};
pub use transcribe::{TranscribeRequest, TranscribeResponse, transcribe_handler};
