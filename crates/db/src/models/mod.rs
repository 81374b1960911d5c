pub mod status;
pub mod task;
