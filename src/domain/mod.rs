pub mod grid;
pub mod services;
pub mod stack;
pub mod surface;
pub mod swipe;
