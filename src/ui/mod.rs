pub mod picker;

pub use picker::{CommandPicker, Picker, PromptKind, Selection};
