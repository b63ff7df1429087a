#[derive(Debug, Clone, PartialEq)]
pub struct ProgressLine {
    pub percent: f64,
    pub elapsed: Option<String>,
    pub remaining: Option<String>,
    pub speed: Option<String>,
}

/// Parses a tqdm-style line such as `45%|####  | 9/20 [00:10<00:12, 3.2it/s]`.
pub fn parse_progress_line(line: &str) -> Option<ProgressLine> {
    if !(line.contains('|') && line.contains('[') && line.contains(']')) {
        return None;
    }

    let (head, _) = line.split_once('|')?;
    let percent = head.trim().replace('%', "").trim().parse::<f64>().ok()?;
    if !percent.is_finite() {
        return None;
    }

    let (elapsed, remaining) = match bracket_segment(line) {
        Some(segment) => {
            let times = segment.split(',').next().unwrap_or(segment);
            match times.split_once('<') {
                Some((elapsed, remaining)) => (
                    Some(elapsed.trim().to_string()),
                    Some(remaining.trim().to_string()),
                ),
                None => (None, None),
            }
        }
        None => (None, None),
    };

    let speed = line
        .rsplit_once(',')
        .map(|(_, tail)| tail.trim().trim_end_matches(']').trim().to_string())
        .filter(|speed| !speed.is_empty());

    Some(ProgressLine {
        percent: percent.clamp(0.0, 100.0),
        elapsed,
        remaining,
        speed,
    })
}

fn bracket_segment(line: &str) -> Option<&str> {
    let open = line.find('[')?;
    let rest = &line[open + 1..];
    let close = rest.find(']')?;
    Some(&rest[..close])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusText {
    #[default]
    Hidden,
    Parsing,
    Translating,
    Complete,
}

impl StatusText {
    pub fn label(self) -> &'static str {
        match self {
            StatusText::Hidden => "",
            StatusText::Parsing => "Parsing PDF files...",
            StatusText::Translating => "Translating PDF files...",
            StatusText::Complete => "Translation complete!",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressState {
    pub total_files: usize,
    pub file_index: usize,
    pub file_percent: u8,
    pub elapsed: Option<String>,
    pub remaining: Option<String>,
    pub speed: Option<String>,
    pub status: StatusText,
    pub visible: bool,
}

impl ProgressState {
    pub fn overall(&self) -> usize {
        self.file_index.min(self.total_files)
    }

    pub fn overall_ratio(&self) -> f64 {
        if self.total_files == 0 {
            return 0.0;
        }
        self.overall() as f64 / self.total_files as f64
    }
}
