//! Bridge module - JS ↔ Rust communication
//!
//! All #[wasm_bindgen] session entry points live here.
//! Re-exports only in mod.rs, logic in submodules.

mod clock;
mod session;

pub use clock::PerformanceClock;
pub use session::WorkoutSession;
