use crate::core::error::FlowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

// `Exited` is always the last event of a run.
#[derive(Debug)]
pub enum RunnerEvent {
    Spawned { pid: u32 },
    SpawnFailed(FlowError),
    Output { stream: StreamKind, text: String },
    Exited { exit_code: Option<i32> },
}

impl RunnerEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunnerEvent::SpawnFailed(_) | RunnerEvent::Exited { .. })
    }
}
