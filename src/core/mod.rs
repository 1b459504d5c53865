pub mod binds;
pub mod editor;
pub mod frame;
pub mod highlight;
pub mod history;
pub mod input;
pub mod prompt;
pub mod text;

pub use binds::Command;
pub use editor::Editor;
pub use frame::Frame;
pub use text::{TextBuffer, TextUnit};
