pub mod reader;
pub mod types;

pub use reader::read_transcript;
pub use types::{Transcript, UploadKind};
