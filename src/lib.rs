// Library surface for headless/integration tests and reuse.
// The binary only adds argument parsing and the terminal loop.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod export;
pub mod extractor;
pub mod logging;
pub mod picker;
pub mod render;
pub mod runtime;
pub mod session;
pub mod transform;
pub mod ui;

pub use extractor::extract_sessions;
pub use render::render_map;
pub use session::SessionRecord;
