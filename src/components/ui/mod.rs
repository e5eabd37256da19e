pub mod button;
pub mod card;
pub mod input;
pub mod spinner;
pub mod toaster;

// Re-export component symbols so callers can `use crate::components::ui::Button` etc.
pub use button::*;
pub use card::*;
pub use input::*;
pub use spinner::*;
pub use toaster::*;
