use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};
use std::fmt::Display;
use std::io::IsTerminal;
use std::time::{Duration, Instant};

use super::ThemeArg;

pub struct Ui {
    palette: Palette,
    paint: bool,
    quiet: bool,
    spinner_style: ProgressStyle,
}

impl Ui {
    pub fn new(theme: ThemeArg, quiet: bool) -> Self {
        let paint = theme != ThemeArg::Plain && std::io::stdout().is_terminal() && !quiet;

        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }

        let palette = Palette::for_theme(theme);

        let spinner_style = ProgressStyle::with_template("{prefix} {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

        Self {
            palette,
            paint,
            quiet,
            spinner_style,
        }
    }

    /// Prints aligned `key: value` rows under a heading.
    pub fn section<'a, I, V>(&self, title: &str, rows: I)
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Display,
    {
        let rows: Vec<(&str, String)> = rows
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        if rows.is_empty() {
            return;
        }

        self.heading(title);
        let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in rows {
            if self.paint {
                println!(
                    "  {} {}",
                    self.palette.label.paint(format!("{key:>width$}:")),
                    self.palette.value.paint(value)
                );
            } else {
                println!("  {key:>width$}: {value}");
            }
        }
    }

    pub fn list<I>(&self, title: &str, entries: I)
    where
        I: IntoIterator<Item = String>,
    {
        let entries: Vec<String> = entries.into_iter().collect();
        if entries.is_empty() {
            return;
        }
        self.heading(title);
        for entry in entries {
            if self.paint {
                println!("  {} {entry}", self.palette.accent.paint("•"));
            } else {
                println!("  - {entry}");
            }
        }
    }

    pub fn success(&self, message: &str) {
        self.line(SUCCESS_ICON, self.palette.infected, message);
    }

    pub fn failure(&self, message: &str) {
        self.line(FAILURE_ICON, self.palette.infeasible, message);
    }

    pub fn warn(&self, message: &str) {
        if self.quiet {
            eprintln!("{message}");
            return;
        }
        let prefix = self.icon(WARNING_ICON, self.palette.warn);
        eprintln!("{prefix} {message}");
    }

    /// Starts a spinner on stderr that stops when the guard finishes or drops.
    pub fn task(&self, label: impl Into<String>) -> TaskGuard<'_> {
        let label = label.into();
        let pb = (!self.quiet).then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(self.spinner_style.clone());
            pb.set_prefix(self.icon(PROGRESS_ICON, self.palette.progress));
            pb.set_message(label.clone());
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });
        TaskGuard {
            ui: self,
            label,
            start: Instant::now(),
            finished: false,
            pb,
        }
    }

    fn line(&self, icon: &str, style: Style, message: &str) {
        if self.quiet {
            println!("{message}");
        } else {
            println!("{} {message}", self.icon(icon, style));
        }
    }

    fn icon(&self, icon: &str, style: Style) -> String {
        if self.paint {
            style.paint(icon).to_string()
        } else {
            icon.to_string()
        }
    }

    fn heading(&self, title: &str) {
        if self.quiet {
            println!("{title}");
            return;
        }
        let formatted = format!("{HEADING_ICON} {title}");
        if self.paint {
            println!("{}", self.palette.accent.paint(formatted));
        } else {
            println!("{formatted}");
        }
    }
}

pub struct TaskGuard<'a> {
    ui: &'a Ui,
    label: String,
    start: Instant,
    finished: bool,
    pb: Option<ProgressBar>,
}

impl TaskGuard<'_> {
    pub fn finish(mut self) -> Duration {
        self.finished = true;
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
        self.start.elapsed()
    }
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let message = format!(
            "{} interrupted after {}",
            self.label,
            format_duration(self.start.elapsed())
        );
        match self.pb.take() {
            Some(pb) => pb.abandon_with_message(message),
            None => self.ui.warn(&message),
        }
    }
}

pub fn format_duration(duration: Duration) -> String {
    if duration.as_secs_f64() >= 1.0 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{:.0}ms", duration.as_secs_f64() * 1_000.0)
    }
}

// Styles per output role. Plain output uses the default style everywhere.
#[derive(Clone, Copy)]
struct Palette {
    accent: Style,
    label: Style,
    value: Style,
    progress: Style,
    infected: Style,
    infeasible: Style,
    warn: Style,
}

impl Palette {
    fn for_theme(theme: ThemeArg) -> Self {
        let colors = match theme {
            ThemeArg::Plain => {
                let style = Style::new();
                return Self {
                    accent: style,
                    label: style,
                    value: style,
                    progress: style,
                    infected: style,
                    infeasible: style,
                    warn: style,
                };
            }
            ThemeArg::Light => [
                Color::Blue,
                Color::Black,
                Color::Black,
                Color::Purple,
                Color::Green,
                Color::Red,
                Color::Fixed(130),
            ],
            ThemeArg::Dark | ThemeArg::Auto => [
                Color::Cyan,
                Color::LightBlue,
                Color::White,
                Color::LightCyan,
                Color::LightGreen,
                Color::LightRed,
                Color::Yellow,
            ],
        };
        let [accent, label, value, progress, infected, infeasible, warn] = colors;
        Self {
            accent: accent.bold(),
            label: label.bold(),
            value: value.normal(),
            progress: progress.normal(),
            infected: infected.bold(),
            infeasible: infeasible.bold(),
            warn: warn.bold(),
        }
    }
}

const HEADING_ICON: &str = "▸";
const SUCCESS_ICON: &str = "✔";
const FAILURE_ICON: &str = "✘";
const WARNING_ICON: &str = "⚠";
const PROGRESS_ICON: &str = "▶";
