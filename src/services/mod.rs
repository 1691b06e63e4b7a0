pub mod orchestrator;
pub mod provider;
pub mod session_store;
pub mod state_accessor;
