use std::path::PathBuf;

use crate::core::error::FlowError;
use crate::core::pages::parse_page_range;
use crate::core::service::Service;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationJob {
    pub files: Vec<PathBuf>,
    pub save_path: PathBuf,
    pub service: Service,
    pub model: Option<String>,
    pub thread: Option<u32>,
    pub pages: Option<String>,
    pub lang_in: Option<String>,
    pub lang_out: Option<String>,
}

impl TranslationJob {
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.files.is_empty() {
            return Err(FlowError::invalid("select at least one PDF file"));
        }
        if self.save_path.as_os_str().is_empty() {
            return Err(FlowError::invalid("choose a save location"));
        }
        if self.thread == Some(0) {
            return Err(FlowError::invalid("thread count must be a positive integer"));
        }
        if let Some(pages) = &self.pages {
            parse_page_range(pages)?;
        }
        Ok(())
    }

    pub fn total_files(&self) -> usize {
        self.files.len()
    }
}

pub fn parse_thread_count(value: &str) -> Result<u32, FlowError> {
    match value.trim().parse::<u32>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(FlowError::invalid(format!(
            "thread count must be a positive integer, got '{}'",
            value.trim()
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Success,
    /// `None` when the process never started or was killed by a signal.
    Failure(Option<i32>),
}

impl ProcessOutcome {
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => ProcessOutcome::Success,
            other => ProcessOutcome::Failure(other),
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ProcessOutcome::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    Starting,
    Running,
    Finished(ProcessOutcome),
}

impl JobPhase {
    pub fn is_active(self) -> bool {
        matches!(self, JobPhase::Starting | JobPhase::Running)
    }
}
