use std::fmt;
use std::str::FromStr;

use crate::core::error::FlowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Service {
    #[default]
    Google,
    DeepL,
    Ollama,
    OpenAI,
    Azure,
}

pub const SERVICES: [Service; 5] = [
    Service::Google,
    Service::DeepL,
    Service::Ollama,
    Service::OpenAI,
    Service::Azure,
];

impl Service {
    pub fn name(self) -> &'static str {
        match self {
            Service::Google => "Google",
            Service::DeepL => "DeepL",
            Service::Ollama => "Ollama",
            Service::OpenAI => "OpenAI",
            Service::Azure => "Azure",
        }
    }

    /// Only the LLM backends take a `:<model>` suffix on `--service`.
    pub fn requires_model(self) -> bool {
        matches!(self, Service::OpenAI | Service::Ollama)
    }

    pub fn model_hint(self) -> Option<&'static str> {
        match self {
            Service::OpenAI => Some("gpt-4o-mini"),
            Service::Ollama => Some("gemma2"),
            _ => None,
        }
    }

    pub fn env_vars(self) -> &'static [&'static str] {
        match self {
            Service::Google | Service::Ollama => &[],
            Service::DeepL => &["DEEPL_AUTH_KEY"],
            Service::OpenAI => &["OPENAI_API_KEY", "OPENAI_BASE_URL"],
            Service::Azure => &["AZURE_APIKEY", "AZURE_ENDPOINT", "AZURE_REGION"],
        }
    }

    pub fn arg_value(self) -> String {
        self.name().to_lowercase()
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Service {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        SERVICES
            .iter()
            .copied()
            .find(|service| service.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                FlowError::invalid(format!(
                    "unknown service '{trimmed}' (expected one of: {})",
                    SERVICES
                        .iter()
                        .map(|service| service.name())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}
