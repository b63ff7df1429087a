use log::trace;

use crate::core::error::FlowError;
use crate::core::job::{JobPhase, ProcessOutcome};
use crate::core::progress::{parse_progress_line, ProgressLine, ProgressState, StatusText};

const FILE_DONE_MARKER: &str = "100%";

/// Owns the job phase and the progress state derived from translator output.
///
/// Chunks are parsed independently. A progress line split across two chunks
/// is missed; the next whole line or the `100%` marker catches up.
#[derive(Debug, Default)]
pub struct JobTracker {
    phase: JobPhase,
    progress: ProgressState,
    // Set once a file completes so the next file may start below 100.
    file_boundary: bool,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn can_start(&self) -> bool {
        !self.phase.is_active()
    }

    pub fn begin(&mut self, total_files: usize) -> Result<(), FlowError> {
        if self.phase.is_active() {
            return Err(FlowError::JobActive);
        }
        self.phase = JobPhase::Starting;
        self.file_boundary = false;
        self.progress = ProgressState {
            total_files,
            status: StatusText::Parsing,
            visible: true,
            ..ProgressState::default()
        };
        Ok(())
    }

    pub fn on_spawned(&mut self) {
        if self.phase == JobPhase::Starting {
            self.phase = JobPhase::Running;
        }
    }

    pub fn on_spawn_failed(&mut self) -> ProcessOutcome {
        self.finish(ProcessOutcome::Failure(None))
    }

    pub fn on_output(&mut self, chunk: &str) -> bool {
        if self.phase != JobPhase::Running {
            return false;
        }

        let before = self.progress.clone();

        for segment in chunk.split(['\r', '\n']) {
            match parse_progress_line(segment) {
                Some(line) => self.apply_line(line),
                None => {
                    if !segment.trim().is_empty() {
                        trace!("non-progress output: {}", segment.trim());
                    }
                }
            }
        }

        if chunk.contains(FILE_DONE_MARKER) {
            self.progress.file_percent = 100;
            self.progress.file_index = (self.progress.file_index + 1).min(self.progress.total_files);
            self.file_boundary = true;
        }

        self.progress != before
    }

    pub fn on_exit(&mut self, exit_code: Option<i32>) -> ProcessOutcome {
        let outcome = ProcessOutcome::from_exit_code(exit_code);
        if outcome.is_success() {
            self.progress.file_percent = 100;
            self.progress.file_index = self.progress.total_files;
            self.progress.status = StatusText::Complete;
        }
        self.finish(outcome)
    }

    fn apply_line(&mut self, line: ProgressLine) {
        let percent = line.percent as u8;
        if self.file_boundary && percent < 100 {
            self.progress.file_percent = percent;
            self.file_boundary = false;
        } else {
            self.progress.file_percent = self.progress.file_percent.max(percent);
        }

        if self.progress.status == StatusText::Parsing {
            self.progress.status = StatusText::Translating;
        }

        if line.elapsed.is_some() {
            self.progress.elapsed = line.elapsed;
            self.progress.remaining = line.remaining;
        }
        if line.speed.is_some() {
            self.progress.speed = line.speed;
        }
    }

    pub fn dismiss(&mut self) {
        if matches!(self.phase, JobPhase::Finished(_)) {
            self.progress.visible = false;
            self.progress.status = StatusText::Hidden;
        }
    }

    fn finish(&mut self, outcome: ProcessOutcome) -> ProcessOutcome {
        self.phase = JobPhase::Finished(outcome);
        outcome
    }
}
