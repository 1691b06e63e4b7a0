pub mod generation;
pub mod job;
pub mod ui_state;
