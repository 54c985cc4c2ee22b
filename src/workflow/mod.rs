pub mod publish_flow;
pub mod state;

pub use publish_flow::{PublishFlow, RunOutcome};
pub use state::{AutomationState, Phase};
