pub mod job_loader;

pub use job_loader::{load_publish_job, PublishJob};
