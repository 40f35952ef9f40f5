/// Stages of one pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Fetching,
    Publishing,
    Finalizing,
    Done,
}

/// Inputs for the only conditional transition: a run fetches exactly when
/// the staging directory starts empty and a source URL is configured.
/// Leftovers from a crashed run are treated as already fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageContext {
    pub staging_empty: bool,
    pub source_configured: bool,
}

impl RunStage {
    pub fn advance(self, ctx: &StageContext) -> RunStage {
        match self {
            RunStage::Idle => {
                if ctx.staging_empty && ctx.source_configured {
                    RunStage::Fetching
                } else {
                    RunStage::Publishing
                }
            }
            RunStage::Fetching => RunStage::Publishing,
            RunStage::Publishing => RunStage::Finalizing,
            RunStage::Finalizing => RunStage::Done,
            RunStage::Done => RunStage::Done,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStage::Done)
    }
}
