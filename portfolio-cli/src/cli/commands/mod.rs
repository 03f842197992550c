pub mod import;
pub mod preview;
