use tracing::{debug, warn};

use crate::model::PushFrame;
use crate::store::StateStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshPlan {
    pub status: bool,
    pub tasks: bool,
}

impl RefreshPlan {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn snapshot() -> Self {
        Self {
            status: true,
            tasks: true,
        }
    }

}

// Log frames append directly (the low-latency path). Task lifecycle frames
// never touch task state themselves: the payload is not trusted to carry
// full task fidelity, so they only ask for an authoritative re-fetch.
pub fn dispatch_frame(frame: PushFrame, store: &mut StateStore) -> RefreshPlan {
    match frame {
        PushFrame::Log(entry) => {
            store.append_log(entry);
            RefreshPlan::none()
        }
        PushFrame::TaskStarted | PushFrame::TaskCompleted => RefreshPlan::snapshot(),
        PushFrame::Connected => {
            debug!(event = "push_welcome");
            RefreshPlan::none()
        }
        PushFrame::Unknown => {
            warn!(event = "push_frame_unknown_tag");
            RefreshPlan::none()
        }
    }
}
