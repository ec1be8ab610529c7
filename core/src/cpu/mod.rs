// Re-export state types
pub mod state;
pub use state::Lr35902State;

// Sharp LR35902 (SM83) CPU
pub mod lr35902;
pub use lr35902::Lr35902;
