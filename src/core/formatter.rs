use std::path::Path;

use crate::core::progress::{parse_progress_line, ProgressState, StatusText};
use crate::core::service::SERVICES;

pub const SUCCESS_TITLE: &str = "PDF translation complete";
pub const FAILURE_TITLE: &str = "PDF translation failed";

pub fn format_progress_detail(state: &ProgressState) -> String {
    let mut detail = state.status.label().to_string();
    if state.status != StatusText::Translating {
        return detail;
    }

    let elapsed = state.elapsed.as_deref().unwrap_or("--:--");
    let remaining = state.remaining.as_deref().unwrap_or("--:--");
    let speed = state.speed.as_deref().unwrap_or("-");
    if state.elapsed.is_some() || state.speed.is_some() {
        detail.push_str(&format!(
            "  elapsed: {elapsed}, remaining: {remaining}, speed: {speed}"
        ));
    }
    detail
}

pub fn format_progress_line(state: &ProgressState) -> String {
    let current = (state.file_index + 1).min(state.total_files.max(1));
    format!(
        "progress: file {current}/{} overall={}/{} current={}% | {}",
        state.total_files,
        state.overall(),
        state.total_files,
        state.file_percent,
        format_progress_detail(state)
    )
}

// Translator output minus blank lines and progress-bar redraws.
pub fn log_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty() && parse_progress_line(line).is_none())
}

pub fn success_notification(total_files: usize, save_path: &Path) -> String {
    format!(
        "Translated {total_files} file(s)\nSaved to: {}",
        save_path.display()
    )
}

pub fn failure_notification() -> &'static str {
    "Check environment variables, network connection and file access permissions"
}

pub fn failure_message(exit_code: Option<i32>) -> String {
    let code = exit_code
        .map(|code| code.to_string())
        .unwrap_or_else(|| "none".to_string());
    format!(
        "Translation failed, exit code: {code}\n\
         Please check:\n\
         1. The environment variables are set correctly\n\
         2. The network connection is working\n\
         3. The PDF files are accessible"
    )
}

pub fn info_text() -> String {
    let mut lines = vec![
        "Steps:".to_string(),
        "1. Select the PDF files to translate (open / add)".to_string(),
        "2. Choose where translated files are saved (save)".to_string(),
        "3. Choose a translation service (service, model for OpenAI/Ollama)".to_string(),
        "4. Make sure the service's environment variables are set:".to_string(),
    ];
    for service in SERVICES {
        let vars = service.env_vars();
        if !vars.is_empty() {
            lines.push(format!("   - {service}: {}", vars.join(", ")));
        }
    }
    lines.push("5. Run start".to_string());
    lines.push("6. Watch the progress bars".to_string());
    lines.push(String::new());
    lines.push(
        "Note: API keys must be present in the environment and the network must be reachable."
            .to_string(),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_shows_times_only_while_translating() {
        let mut state = ProgressState {
            total_files: 1,
            status: StatusText::Parsing,
            elapsed: Some("00:10".to_string()),
            ..ProgressState::default()
        };
        assert_eq!(format_progress_detail(&state), "Parsing PDF files...");

        state.status = StatusText::Translating;
        state.remaining = Some("00:12".to_string());
        state.speed = Some("3.2it/s".to_string());
        assert_eq!(
            format_progress_detail(&state),
            "Translating PDF files...  elapsed: 00:10, remaining: 00:12, speed: 3.2it/s"
        );
    }

    #[test]
    fn log_lines_skip_progress_redraws() {
        let text = "loading model\r\n 45%|####  | 9/20 [00:10<00:12, 3.2it/s]\r\n\nsaved out.pdf\n";
        assert_eq!(log_lines(text).collect::<Vec<_>>(), ["loading model", "saved out.pdf"]);
    }

    #[test]
    fn failure_message_names_exit_code_and_checklist() {
        let message = failure_message(Some(2));
        assert!(message.contains("exit code: 2"));
        assert!(message.contains("environment variables"));
        assert!(message.contains("network"));
        assert!(message.contains("accessible"));
    }

    #[test]
    fn info_lists_credential_variables() {
        let text = info_text();
        assert!(text.contains("OPENAI_API_KEY"));
        assert!(text.contains("DEEPL_AUTH_KEY"));
        assert!(text.contains("AZURE_REGION"));
    }
}
