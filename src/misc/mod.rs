mod hashmap;
pub mod job_queue;
pub mod record_stream;

pub use hashmap::*;
