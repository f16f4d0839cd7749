//! Tier de disco -> región. Todo lo que el build crea vive en esa región.

use hc_core::{Step, StepAction};

use super::finish;
use crate::error::BuildError;
use crate::state::BuildState;

pub struct StepResolveRegion;

impl StepResolveRegion {
    fn execute(&self, state: &mut BuildState) -> Result<(), BuildError> {
        let tier_id = state.config.disk_performance_tier_id.clone();
        let tier = state.client
                        .disk_tier_find(&tier_id)?
                        .ok_or_else(|| BuildError::precondition(format!("disk performance tier {tier_id} not found")))?;
        state.ui.say(&format!("Disk performance tier found, in region {}", tier.region));
        state.region = Some(tier.region);
        Ok(())
    }
}

impl Step<BuildState> for StepResolveRegion {
    fn id(&self) -> &str {
        "resolve_region"
    }

    fn run(&mut self, state: &mut BuildState) -> StepAction {
        let result = self.execute(state);
        finish(state, result)
    }
}
