//! Simulated VM provisioning: validate operator requests, record the
//! accepted machines in a JSON store, and run an install script per machine.
//!
//! Data flows one way: [`validate`] checks raw answers, [`machine`] builds
//! the canonical record, [`store`] appends it, and [`runner`] later shells
//! out once per stored record. [`settings::Settings`] carries every path
//! explicitly; there is no global state.
pub mod cli;
pub mod init;
pub mod logging;
pub mod machine;
pub mod provision;
pub mod runner;
pub mod settings;
pub mod store;
pub mod templates;
pub mod validate;
