pub mod toml_loader;

pub use toml_loader::{load_test_definition, parse_test_definition};
