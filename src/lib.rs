pub mod clients;

mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod outcome;
pub mod overlay;

pub use app::App;
pub use app::validate_inputs;
pub use commands::propagate;
pub use config::Config;

// Disable colors for all tests to get clean output
#[cfg(test)]
#[ctor::ctor]
fn init_tests() {
    colored::control::set_override(false);
}
