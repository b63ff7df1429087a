use crate::cli::RunArgs;
use crate::core::controller::{JobController, Notice};
use crate::core::error::FlowError;
use crate::core::event::StreamKind;
use crate::core::formatter::{failure_message, format_progress_line, log_lines};
use crate::form::JobForm;

/// Runs one job to completion. Progress goes to stderr; translator output is
/// echoed on the stream it was written to.
pub fn run(mut controller: JobController, mut form: JobForm, args: RunArgs) -> Result<i32, FlowError> {
    form.apply_run_args(args)?;
    let job = form.to_job()?;

    let command = controller.start(&job)?;
    eprintln!(">> {command}");

    let mut last_line = String::new();
    while controller.is_active() {
        for notice in controller.next_blocking() {
            match notice {
                Notice::ProgressChanged => {
                    let line = format_progress_line(controller.progress());
                    if line != last_line {
                        eprintln!("{line}");
                        last_line = line;
                    }
                }
                Notice::Output { stream, text } => {
                    for line in log_lines(&text) {
                        match stream {
                            StreamKind::Stdout => println!("{line}"),
                            StreamKind::Stderr => eprintln!("{line}"),
                        }
                    }
                }
                Notice::Completed {
                    total_files,
                    save_path,
                } => {
                    eprintln!(
                        "Translation complete: {total_files} file(s) saved to {}",
                        save_path.display()
                    );
                    return Ok(0);
                }
                Notice::Failed { exit_code } => {
                    eprintln!("{}", failure_message(exit_code));
                    return Err(FlowError::ProcessFailed { exit_code });
                }
                Notice::SpawnFailed(err) => return Err(err),
            }
        }
    }

    Ok(0)
}
