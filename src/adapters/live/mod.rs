//! Live adapters backed by the system clock and real directories.

pub mod clock;
pub mod pass_through;

pub use clock::LiveClock;
pub use pass_through::PassThroughFileManager;
