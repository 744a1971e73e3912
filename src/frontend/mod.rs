pub mod console;
pub mod render;

pub use console::Console;
pub use render::CardRenderer;
