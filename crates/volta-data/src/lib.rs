//! Configuration file loading for Volta.
//!
//! A config file is named `<base>.ron`, `<base>.toml` or `<base>.json`; the
//! extension picks the parser. Every [`VoltaConfig`](volta_core::config::VoltaConfig)
//! field has a default, so a file only lists what it changes.

pub mod loader;

pub use loader::{
    DataLoadError, Format, deserialize_file, detect_format, find_config_file, load_config,
    load_config_or_default, require_config_file,
};
