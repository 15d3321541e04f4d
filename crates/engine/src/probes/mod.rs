//! The individual doctor steps. Each one returns a value and reports
//! progress to the sink; none of them propagate errors.

pub mod environment;
pub mod files;
pub mod manifest;
pub mod ports;
pub mod trial;

pub use environment::inspect_environment;
pub use files::check_files;
pub use manifest::check_manifest;
pub use ports::scan_ports;
pub use trial::run_server_trial;
