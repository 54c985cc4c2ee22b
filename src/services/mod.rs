pub mod bundle_builder;
pub mod injector;
pub mod locator;
pub mod materializer;
pub mod reporter;

pub use bundle_builder::build_bundle;
pub use injector::{deliver_files, fill_text, sanitize_description, Delivery};
pub use locator::{HeuristicLocators, LocatorResult, Locators};
pub use materializer::{into_payload, materialize};
pub use reporter::{
    FanoutReporter, LatestStatus, OverlayReporter, RecordingReporter, StatusSink,
    TracingReporter,
};
