//! Simulated collaborators: a host compiler stand-in and a pinned clock.

pub mod clock;
pub mod compiler;

pub use clock::FixedClock;
pub use compiler::SimulatedCompiler;
