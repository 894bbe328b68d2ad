pub mod debounce;
pub mod keybindings;
pub mod lightbox;
pub mod presenter;
pub mod selection;

pub use debounce::Debouncer;
pub use keybindings::{command_for, InputEvent, Key, LightboxControl, NavCommand};
pub use lightbox::Lightbox;
pub use presenter::{HeadlessSurface, ListenerId, ListenerKind, Presenter};
pub use selection::{CheckChange, ModifierSource, Selection};
