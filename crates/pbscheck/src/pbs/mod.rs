pub mod client;
pub mod discovery;
pub mod jobs;
pub mod memory;
pub mod nodeinfo;
pub mod queue;
