// Library interface for vibecheck modules
// This allows tests and the server binary to import modules

pub mod error;
pub mod llm;
pub mod news;
pub mod pipeline;
pub mod server;
pub mod storage;
