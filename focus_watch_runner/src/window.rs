// THEORY:
// Native window control is delegated to `xdotool` (and `wmctrl` for the
// always-on-top hint). Each call is a short-lived child process, which is
// acceptable because the backend is only used on focus transitions, never per
// frame.
//
// `xdotool search --name` treats its argument as a regular expression matched
// anywhere in the title, so the title is escaped and anchored before the
// search. Otherwise any window whose name merely contains the dashboard title
// would be hidden in its place.

use focus_watch::{WindowBackend, WindowError, WindowHandle};
use std::process::Command;
use tracing::debug;

pub struct XdotoolBackend {
    xdotool: String,
    wmctrl: String,
}

impl Default for XdotoolBackend {
    fn default() -> Self {
        Self {
            xdotool: "xdotool".to_string(),
            wmctrl: "wmctrl".to_string(),
        }
    }
}

impl XdotoolBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<std::process::Output, WindowError> {
        debug!(program, ?args, "window backend call");
        Command::new(program)
            .args(args)
            .output()
            .map_err(|e| WindowError::Backend(format!("{program}: {e}")))
    }

    fn run_ok(&self, program: &str, args: &[&str]) -> Result<(), WindowError> {
        let output = self.run(program, args)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(WindowError::Backend(format!(
                "{program} {} exited with {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

/// Pattern matching exactly `title` and nothing else.
fn search_pattern(title: &str) -> String {
    format!("^{}$", regex::escape(title))
}

/// Parses the first window id from `xdotool search` output.
fn parse_search_output(stdout: &str) -> Option<WindowHandle> {
    stdout
        .lines()
        .find_map(|line| line.trim().parse::<u64>().ok())
        .map(WindowHandle)
}

impl WindowBackend for XdotoolBackend {
    fn find(&self, title: &str) -> Result<WindowHandle, WindowError> {
        let pattern = search_pattern(title);
        let output = self.run(&self.xdotool, &["search", "--name", &pattern])?;
        // xdotool exits with 1 and prints nothing when no window matches.
        parse_search_output(&String::from_utf8_lossy(&output.stdout))
            .ok_or_else(|| WindowError::NotFound(title.to_string()))
    }

    fn show(&self, handle: WindowHandle) -> Result<(), WindowError> {
        self.run_ok(&self.xdotool, &["windowmap", &handle.0.to_string()])
    }

    fn hide(&self, handle: WindowHandle) -> Result<(), WindowError> {
        self.run_ok(&self.xdotool, &["windowunmap", &handle.0.to_string()])
    }

    fn raise_and_focus(&self, handle: WindowHandle) -> Result<(), WindowError> {
        let id = handle.0.to_string();
        self.run_ok(&self.xdotool, &["windowraise", &id])?;
        self.run_ok(&self.xdotool, &["windowactivate", &id])?;
        self.run_ok(&self.wmctrl, &["-i", "-r", &id, "-b", "add,above"])
    }
}
