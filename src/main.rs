//! Checkers Engine - Text Protocol Binary
//!
//! Reads protocol commands from stdin and writes responses to stdout.
//! Logging goes to stderr; set RUST_LOG (default `warn`) to see more.
//!
//! Usage:
//!     checkers_engine

use checkers_engine::console::Console;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut console = Console::new();
    console.run();
}
