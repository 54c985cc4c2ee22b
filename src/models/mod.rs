pub mod loaders;
pub mod payload;
pub mod status;

pub use loaders::{load_publish_job, PublishJob};
pub use payload::{MaterializedFile, PublishBundle, PublishPayload};
pub use status::{Progress, Severity, StatusEvent};
