pub mod classifier;
pub mod context;
pub mod debounce;
pub mod detection;
pub mod focus_state;
pub mod visibility;
