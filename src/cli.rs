use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::command::DEFAULT_TOOL;

#[derive(Debug, Parser)]
#[command(name = "pdfflow", version, about = "Terminal front-end for the pdf2zh PDF translator")]
pub struct SystemCli {
    /// Translator executable to launch
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_TOOL)]
    pub tool: String,
    /// Preferences file (defaults to pdfflow_config.json beside the executable)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Encoding of the translator's output, e.g. utf-8 or gbk
    #[arg(long, value_name = "LABEL", default_value = "utf-8")]
    pub encoding: String,
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<SystemCommand>,
}

#[derive(Debug, Subcommand)]
pub enum SystemCommand {
    /// Translate without the terminal UI
    Run(RunArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct RunArgs {
    #[arg(value_name = "PDF", required = true)]
    pub files: Vec<PathBuf>,
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub save_path: Option<PathBuf>,
    #[arg(long)]
    pub service: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub thread: Option<String>,
    #[arg(long)]
    pub pages: Option<String>,
    #[arg(long = "lang-in")]
    pub lang_in: Option<String>,
    #[arg(long = "lang-out")]
    pub lang_out: Option<String>,
}

#[derive(Debug, Parser)]
#[command(name = "pdfflow", disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Commands {
    /// Replace the selected PDF files
    Open {
        #[arg(value_name = "PDF", required = true)]
        files: Vec<PathBuf>,
    },
    /// Add PDF files to the selection
    Add {
        #[arg(value_name = "PDF", required = true)]
        files: Vec<PathBuf>,
    },
    Save {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
    Service {
        name: String,
    },
    Model {
        name: Option<String>,
    },
    Thread {
        count: Option<String>,
    },
    Pages {
        range: Option<String>,
    },
    #[command(name = "lang-in")]
    LangIn {
        code: Option<String>,
    },
    #[command(name = "lang-out")]
    LangOut {
        code: Option<String>,
    },
    Show,
    Services,
    Info,
    Start,
}

pub fn parse_line(line: &str) -> Result<Commands, String> {
    let mut argv = Vec::new();
    argv.push("pdfflow".to_string());

    let tokens = shell_words::split(line).map_err(|err| err.to_string())?;
    argv.extend(tokens);

    let parsed = Cli::try_parse_from(argv).map_err(|err| err.to_string())?;
    Ok(parsed.command)
}

pub const HELP_LINES: [&str; 14] = [
    "Commands:",
    "  open <pdf>...        select PDF files (save location defaults to their folder)",
    "  add <pdf>...         add PDF files to the selection",
    "  save <dir>           choose where translated files are written",
    "  service <name>       Google, DeepL, Ollama, OpenAI or Azure",
    "  model [name]         model for OpenAI / Ollama",
    "  thread [n]           worker threads (default 1)",
    "  pages [range]        page range, e.g. 1-3,5",
    "  lang-in / lang-out [code]",
    "  show / services      current selections / available services",
    "  info                 setup tips and required environment variables",
    "  start                run the translation",
    "  clear / exit",
    "  PageUp/PageDown/Up/Down/Home/End scroll the session",
];
