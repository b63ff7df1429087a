use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};

use encoding_rs::Encoding;
use log::{debug, info, warn};

use crate::core::command::TranslatorCommand;
use crate::core::config::{ConfigStore, Preferences};
use crate::core::error::FlowError;
use crate::core::event::{RunnerEvent, StreamKind};
use crate::core::formatter::{
    failure_notification, success_notification, FAILURE_TITLE, SUCCESS_TITLE,
};
use crate::core::job::{JobPhase, ProcessOutcome, TranslationJob};
use crate::core::notify::{notify_best_effort, Notifier};
use crate::core::progress::ProgressState;
use crate::core::runner::run_with_events;
use crate::core::tracker::JobTracker;

#[derive(Debug)]
pub enum Notice {
    Output { stream: StreamKind, text: String },
    ProgressChanged,
    Completed { total_files: usize, save_path: PathBuf },
    Failed { exit_code: Option<i32> },
    SpawnFailed(FlowError),
}

#[derive(Debug, Clone)]
struct ActiveJob {
    total_files: usize,
    save_path: PathBuf,
}

pub struct JobController {
    tool: String,
    encoding: &'static Encoding,
    store: ConfigStore,
    notifier: Box<dyn Notifier>,
    tracker: JobTracker,
    events: Option<Receiver<RunnerEvent>>,
    active: Option<ActiveJob>,
}

impl JobController {
    pub fn new(
        tool: impl Into<String>,
        encoding: &'static Encoding,
        store: ConfigStore,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            tool: tool.into(),
            encoding,
            store,
            notifier,
            tracker: JobTracker::new(),
            events: None,
            active: None,
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn phase(&self) -> JobPhase {
        self.tracker.phase()
    }

    pub fn progress(&self) -> &ProgressState {
        self.tracker.progress()
    }

    pub fn can_start(&self) -> bool {
        self.tracker.can_start()
    }

    pub fn is_active(&self) -> bool {
        self.tracker.phase().is_active()
    }

    pub fn dismiss(&mut self) {
        self.tracker.dismiss();
    }

    pub fn start(&mut self, job: &TranslationJob) -> Result<String, FlowError> {
        if !self.tracker.can_start() {
            return Err(FlowError::JobActive);
        }
        job.validate()?;

        self.store.save(&preferences_for(job));
        self.tracker.begin(job.total_files())?;

        let command = TranslatorCommand::build(&self.tool, job);
        let display = command.display();
        info!("starting translation of {} file(s)", job.total_files());
        debug!("command: {display}");

        self.events = Some(run_with_events(
            command,
            job.save_path.clone(),
            self.encoding,
        ));
        self.active = Some(ActiveJob {
            total_files: job.total_files(),
            save_path: job.save_path.clone(),
        });

        Ok(display)
    }

    pub fn pump(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        loop {
            let Some(rx) = &self.events else {
                break;
            };
            match rx.try_recv() {
                Ok(event) => self.apply(event, &mut notices),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.runner_vanished(&mut notices);
                    break;
                }
            }
        }
        notices
    }

    pub fn next_blocking(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        if let Some(rx) = &self.events {
            match rx.recv() {
                Ok(event) => self.apply(event, &mut notices),
                Err(_) => self.runner_vanished(&mut notices),
            }
        }
        notices.extend(self.pump());
        notices
    }

    fn apply(&mut self, event: RunnerEvent, notices: &mut Vec<Notice>) {
        let terminal = event.is_terminal();
        match event {
            RunnerEvent::Spawned { pid } => {
                debug!("translator running as pid {pid}");
                self.tracker.on_spawned();
            }
            RunnerEvent::Output { stream, text } => {
                if self.tracker.on_output(&text) {
                    notices.push(Notice::ProgressChanged);
                }
                notices.push(Notice::Output { stream, text });
            }
            RunnerEvent::SpawnFailed(err) => {
                self.tracker.on_spawn_failed();
                notices.push(Notice::SpawnFailed(err));
            }
            RunnerEvent::Exited { exit_code } => {
                let outcome = self.tracker.on_exit(exit_code);
                notices.push(self.report(outcome));
            }
        }

        if terminal {
            self.events = None;
            self.active = None;
        }
    }

    fn report(&self, outcome: ProcessOutcome) -> Notice {
        let (total_files, save_path) = self
            .active
            .as_ref()
            .map(|job| (job.total_files, job.save_path.clone()))
            .unwrap_or_default();

        match outcome {
            ProcessOutcome::Success => {
                info!("translation complete");
                notify_best_effort(
                    self.notifier.as_ref(),
                    SUCCESS_TITLE,
                    &success_notification(total_files, &save_path),
                );
                Notice::Completed {
                    total_files,
                    save_path,
                }
            }
            ProcessOutcome::Failure(exit_code) => {
                warn!("translation failed (exit_code={exit_code:?})");
                notify_best_effort(self.notifier.as_ref(), FAILURE_TITLE, failure_notification());
                Notice::Failed { exit_code }
            }
        }
    }

    // The runner thread always sends a terminal event; reaching this means it
    // panicked.
    fn runner_vanished(&mut self, notices: &mut Vec<Notice>) {
        warn!("translator runner stopped without reporting an exit status");
        self.apply(RunnerEvent::Exited { exit_code: None }, notices);
    }
}

pub fn preferences_for(job: &TranslationJob) -> Preferences {
    Preferences {
        service: job.service.name().to_string(),
        model: job.model.clone().unwrap_or_default(),
        thread: job.thread.map(|t| t.to_string()).unwrap_or_default(),
        src_lang: job.lang_in.clone().unwrap_or_default(),
        tgt_lang: job.lang_out.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CONFIG_FILENAME;
    use crate::core::notify::testing::RecordingNotifier;
    use crate::core::progress::StatusText;
    use crate::core::service::Service;

    fn controller(tool: &str, dir: &std::path::Path) -> (JobController, RecordingNotifier) {
        let notifier = RecordingNotifier::default();
        let controller = JobController::new(
            tool,
            encoding_rs::UTF_8,
            ConfigStore::new(dir.join(CONFIG_FILENAME)),
            Box::new(notifier.clone()),
        );
        (controller, notifier)
    }

    #[test]
    fn validation_error_never_starts_or_saves() {
        let dir = tempfile::tempdir().unwrap();
        let (mut controller, _) = controller("pdf2zh", dir.path());
        let job = TranslationJob {
            save_path: dir.path().to_path_buf(),
            ..TranslationJob::default()
        };

        assert!(matches!(
            controller.start(&job),
            Err(FlowError::InvalidJob { .. })
        ));
        assert_eq!(controller.phase(), JobPhase::Idle);
        assert!(!dir.path().join(CONFIG_FILENAME).exists());
    }

    #[test]
    fn spawn_failure_returns_to_ready() {
        let dir = tempfile::tempdir().unwrap();
        let (mut controller, _) = controller("pdfflow-no-such-translator", dir.path());
        let job = TranslationJob {
            files: vec![PathBuf::from("a.pdf")],
            save_path: dir.path().join("out"),
            service: Service::DeepL,
            ..TranslationJob::default()
        };

        controller.start(&job).unwrap();
        assert!(!controller.can_start());

        let notices = controller.next_blocking();
        assert!(matches!(
            notices.as_slice(),
            [Notice::SpawnFailed(FlowError::BinaryNotFound { .. })]
        ));
        assert!(controller.can_start());
        assert_eq!(
            controller.phase(),
            JobPhase::Finished(ProcessOutcome::Failure(None))
        );
        controller.dismiss();
        assert!(!controller.progress().visible);

        let saved = controller.store().load();
        assert_eq!(saved.service, "DeepL");
    }

    #[test]
    fn preferences_mirror_job_options() {
        let job = TranslationJob {
            service: Service::OpenAI,
            model: Some("gpt-4o-mini".to_string()),
            thread: Some(2),
            lang_in: Some("en".to_string()),
            lang_out: Some("zh".to_string()),
            ..TranslationJob::default()
        };
        let prefs = preferences_for(&job);
        assert_eq!(prefs.service, "OpenAI");
        assert_eq!(prefs.model, "gpt-4o-mini");
        assert_eq!(prefs.thread, "2");
        assert_eq!(prefs.src_lang, "en");
        assert_eq!(prefs.tgt_lang, "zh");
    }

    #[cfg(unix)]
    fn script_job(dir: &std::path::Path, files: usize, script: &str) -> TranslationJob {
        // `sh -c <script> <file>... --service google`: the trailing arguments
        // become positional parameters the script ignores.
        let mut paths = vec![PathBuf::from("-c"), PathBuf::from(script)];
        paths.extend((2..files).map(|i| PathBuf::from(format!("extra{i}.pdf"))));
        TranslationJob {
            files: paths,
            save_path: dir.to_path_buf(),
            ..TranslationJob::default()
        }
    }

    #[cfg(unix)]
    fn run_to_end(controller: &mut JobController) -> Vec<Notice> {
        let mut notices = Vec::new();
        while controller.is_active() {
            notices.extend(controller.next_blocking());
        }
        notices
    }

    #[cfg(unix)]
    #[test]
    fn success_fills_progress_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let (mut controller, notifier) = controller("sh", dir.path());
        let job = script_job(
            dir.path(),
            2,
            "printf '45%%|[00:10<00:12, 3.2it/s]\\n'; sleep 0.1; exit 0",
        );

        controller.start(&job).unwrap();
        let notices = run_to_end(&mut controller);

        assert!(notices.iter().any(|n| matches!(n, Notice::ProgressChanged)));
        assert!(matches!(
            notices.last(),
            Some(Notice::Completed { total_files: 2, .. })
        ));
        let progress = controller.progress();
        assert_eq!(progress.overall(), 2);
        assert_eq!(progress.file_percent, 100);
        assert_eq!(progress.status, StatusText::Complete);
        assert!(progress.visible);
        assert_eq!(controller.phase(), JobPhase::Finished(ProcessOutcome::Success));

        controller.dismiss();
        assert!(!controller.progress().visible);

        let sent = notifier.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, SUCCESS_TITLE);
    }

    #[cfg(unix)]
    #[test]
    fn failure_after_first_file_keeps_index_and_code() {
        let dir = tempfile::tempdir().unwrap();
        let (mut controller, notifier) = controller("sh", dir.path());
        let job = script_job(
            dir.path(),
            2,
            "printf '100%%|##########| 3/3 [00:03<00:00, 1it/s]\\n'; sleep 0.1; \
             printf '35%%|###       | 1/3 [00:01<00:02, 1it/s]\\n'; exit 1",
        );

        controller.start(&job).unwrap();
        let notices = run_to_end(&mut controller);

        assert!(matches!(
            notices.last(),
            Some(Notice::Failed { exit_code: Some(1) })
        ));
        assert_eq!(controller.progress().file_index, 1);
        assert!(controller.can_start());
        controller.dismiss();
        assert!(!controller.progress().visible);
        assert_eq!(
            controller.phase(),
            JobPhase::Finished(ProcessOutcome::Failure(Some(1)))
        );
        assert_eq!(notifier.sent.borrow()[0].0, FAILURE_TITLE);
    }

    #[cfg(unix)]
    #[test]
    fn output_notices_keep_their_stream() {
        let dir = tempfile::tempdir().unwrap();
        let (mut controller, _) = controller("sh", dir.path());
        let job = script_job(dir.path(), 2, "echo saved; echo 'font missing' >&2");

        controller.start(&job).unwrap();
        let notices = run_to_end(&mut controller);

        assert!(notices.iter().any(|n| matches!(
            n,
            Notice::Output { stream: StreamKind::Stdout, text } if text.contains("saved")
        )));
        assert!(notices.iter().any(|n| matches!(
            n,
            Notice::Output { stream: StreamKind::Stderr, text } if text.contains("font missing")
        )));
    }

    #[cfg(unix)]
    #[test]
    fn second_start_while_running_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let (mut controller, _) = controller("sh", dir.path());
        let job = script_job(dir.path(), 2, "sleep 0.2");

        controller.start(&job).unwrap();
        assert!(matches!(controller.start(&job), Err(FlowError::JobActive)));
        run_to_end(&mut controller);
        assert!(controller.can_start());
    }
}
