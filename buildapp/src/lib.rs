pub(crate) mod docker;
pub(crate) mod process;
pub(crate) mod temp_path;
pub(crate) mod time_ext;
pub(crate) mod version;

pub mod cli;
pub mod component;
pub mod engine;
pub mod log_sink;
pub mod orchestrator;

pub(crate) type Result<T, E = Box<dyn std::error::Error + Send + Sync + 'static>> =
    std::result::Result<T, E>;
