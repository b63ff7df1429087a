use crate::core::job::TranslationJob;

pub const DEFAULT_TOOL: &str = "pdf2zh";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl TranslatorCommand {
    pub fn build(program: &str, job: &TranslationJob) -> Self {
        Self {
            program: program.to_string(),
            args: to_args(job),
        }
    }

    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    pub fn display(&self) -> String {
        self.argv().join(" ")
    }
}

pub fn to_args(job: &TranslationJob) -> Vec<String> {
    let mut args = Vec::new();

    for file in &job.files {
        args.push(file.to_string_lossy().into_owned());
    }

    args.push("--service".to_string());
    let model = job.model.as_deref().filter(|model| !model.is_empty());
    match model {
        Some(model) if job.service.requires_model() => {
            args.push(format!("{}:{}", job.service.arg_value(), model));
        }
        _ => args.push(job.service.arg_value()),
    }

    if let Some(thread) = job.thread {
        args.push("--thread".to_string());
        args.push(thread.to_string());
    }

    if let Some(pages) = non_empty(&job.pages) {
        args.push("--pages".to_string());
        args.push(pages.to_string());
    }

    if let Some(lang) = non_empty(&job.lang_in) {
        args.push("--lang-in".to_string());
        args.push(lang.to_string());
    }

    if let Some(lang) = non_empty(&job.lang_out) {
        args.push("--lang-out".to_string());
        args.push(lang.to_string());
    }

    args
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::core::service::{Service, SERVICES};

    fn job(files: &[&str], service: Service) -> TranslationJob {
        TranslationJob {
            files: files.iter().map(PathBuf::from).collect(),
            save_path: PathBuf::from("/tmp/out"),
            service,
            ..TranslationJob::default()
        }
    }

    #[test]
    fn two_files_with_google() {
        let cmd = TranslatorCommand::build("pdf2zh", &job(&["a.pdf", "b.pdf"], Service::Google));
        assert_eq!(
            cmd.argv(),
            vec!["pdf2zh", "a.pdf", "b.pdf", "--service", "google"]
        );
    }

    #[test]
    fn openai_model_suffix() {
        let mut job = job(&["paper.pdf"], Service::OpenAI);
        job.model = Some("gpt-4o-mini".to_string());
        let args = to_args(&job);
        assert_eq!(args, vec!["paper.pdf", "--service", "openai:gpt-4o-mini"]);
    }

    #[test]
    fn model_ignored_for_services_without_models() {
        for service in SERVICES {
            let mut job = job(&["x.pdf"], service);
            job.model = Some("m1".to_string());
            let args = to_args(&job);
            let expected = if service.requires_model() {
                format!("{}:m1", service.name().to_lowercase())
            } else {
                service.name().to_lowercase()
            };
            assert_eq!(args[2], expected, "service {service}");
        }
    }

    #[test]
    fn empty_model_falls_back_to_bare_service() {
        let mut job = job(&["x.pdf"], Service::Ollama);
        job.model = Some(String::new());
        assert_eq!(to_args(&job), vec!["x.pdf", "--service", "ollama"]);
    }

    #[test]
    fn paths_stay_discrete_arguments_in_order() {
        let files = ["/data/my papers/one.pdf", "two.pdf", "C:\\dir with space\\three.pdf"];
        let args = to_args(&job(&files, Service::DeepL));
        let service_at = args.iter().position(|a| a == "--service").unwrap();
        assert_eq!(&args[..service_at], &files);
    }

    #[test]
    fn advanced_options_in_fixed_order() {
        let mut job = job(&["a.pdf"], Service::Azure);
        job.thread = Some(4);
        job.pages = Some("1-3,5".to_string());
        job.lang_in = Some("en".to_string());
        job.lang_out = Some("zh".to_string());
        assert_eq!(
            to_args(&job),
            vec![
                "a.pdf", "--service", "azure", "--thread", "4", "--pages", "1-3,5", "--lang-in",
                "en", "--lang-out", "zh"
            ]
        );
    }
}
