pub mod interactive;
pub mod resources;

/// The job can be submitted, or the resources were found.
pub const EXIT_SUCCESS: i32 = 0;
/// The check failed or the job must not be submitted.
pub const EXIT_FAILURE: i32 = 1;
/// The job would wait in the queue.
pub const EXIT_WILL_QUEUE: i32 = 2;
