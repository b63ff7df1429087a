use std::path::{Path, PathBuf};

use log::warn;

use crate::cli::RunArgs;
use crate::core::config::Preferences;
use crate::core::error::FlowError;
use crate::core::job::{parse_thread_count, TranslationJob};
use crate::core::service::Service;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobForm {
    pub files: Vec<PathBuf>,
    pub save_path: Option<PathBuf>,
    pub service: Service,
    pub model: String,
    pub thread: String,
    pub pages: String,
    pub lang_in: String,
    pub lang_out: String,
}

impl JobForm {
    pub fn from_preferences(prefs: &Preferences) -> Self {
        let service = if prefs.service.is_empty() {
            Service::default()
        } else {
            prefs.service.parse().unwrap_or_else(|err| {
                warn!("ignoring stored service: {err}");
                Service::default()
            })
        };

        Self {
            service,
            model: prefs.model.clone(),
            thread: prefs.thread.clone(),
            lang_in: prefs.src_lang.clone(),
            lang_out: prefs.tgt_lang.clone(),
            ..Self::default()
        }
    }

    pub fn open_files(&mut self, files: Vec<PathBuf>) {
        self.save_path = files.first().map(|file| parent_dir(file));
        self.files = files;
    }

    pub fn add_files(&mut self, files: Vec<PathBuf>) {
        if self.save_path.is_none() {
            self.save_path = files.first().map(|file| parent_dir(file));
        }
        self.files.extend(files);
    }

    pub fn apply_run_args(&mut self, args: RunArgs) -> Result<(), FlowError> {
        self.open_files(args.files);
        if let Some(save_path) = args.save_path {
            self.save_path = Some(save_path);
        }
        if let Some(service) = args.service {
            self.service = service.parse()?;
        }
        if let Some(model) = args.model {
            self.model = model;
        }
        if let Some(thread) = args.thread {
            self.thread = thread;
        }
        if let Some(pages) = args.pages {
            self.pages = pages;
        }
        if let Some(lang) = args.lang_in {
            self.lang_in = lang;
        }
        if let Some(lang) = args.lang_out {
            self.lang_out = lang;
        }
        Ok(())
    }

    pub fn to_job(&self) -> Result<TranslationJob, FlowError> {
        let thread = match self.thread.trim() {
            "" => None,
            value => Some(parse_thread_count(value)?),
        };

        Ok(TranslationJob {
            files: self.files.clone(),
            save_path: self.save_path.clone().unwrap_or_default(),
            service: self.service,
            model: optional(&self.model),
            thread,
            pages: optional(&self.pages),
            lang_in: optional(&self.lang_in),
            lang_out: optional(&self.lang_out),
        })
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let files = if self.files.is_empty() {
            "(none)".to_string()
        } else {
            self.files
                .iter()
                .map(|file| file.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let save = self
            .save_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "(none)".to_string());

        let mut lines = vec![
            format!("PDF files : {files}"),
            format!("Save to   : {save}"),
            format!("Service   : {}", self.service),
        ];
        if self.service.requires_model() {
            let hint = self.service.model_hint().unwrap_or("");
            lines.push(format!("Model     : {}", or_placeholder(&self.model, hint)));
        }
        lines.push(format!("Threads   : {}", or_placeholder(&self.thread, "1")));
        lines.push(format!("Pages     : {}", or_placeholder(&self.pages, "all")));
        lines.push(format!("Lang in   : {}", or_placeholder(&self.lang_in, "en")));
        lines.push(format!("Lang out  : {}", or_placeholder(&self.lang_out, "zh")));
        lines
    }
}

fn parent_dir(file: &Path) -> PathBuf {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.trim().is_empty() {
        format!("(default, e.g. {placeholder})")
    } else {
        value.trim().to_string()
    }
}
