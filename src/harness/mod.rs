//! Round driving: the wrapper the compiler sees, the environment driven code
//! sees, and the orchestrator that ties a run together.

pub mod environment;
pub mod orchestrator;
pub mod outcome;
pub mod task;
pub mod wrapper;

pub use environment::TestEnvironment;
pub use orchestrator::{ProcessingOrchestrator, RunReport};
pub use outcome::WrapperState;
pub use task::{Reentrancy, Task, TaskResult};
pub use wrapper::{RoundAborted, RoundDrivingWrapper};
