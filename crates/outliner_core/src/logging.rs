//! Log sink and invariant-violation reporting for the outliner core.
//!
//! # Responsibility
//! - Start one rolling file log per process for hosts that want one.
//! - Tag the running session edit so a broken tree or graph invariant is
//!   logged with the action that tripped it.
//!
//! # Invariants
//! - The first successful `init_logging` wins; a later call must ask for the
//!   same level and directory or it is rejected.
//! - Starting the log never panics.
//! - Violation lines are single `key=value` lines with a capped message.
//!
//! # See also
//! - `service::session` for the actions that are tagged.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};

const LOG_BASENAME: &str = "outliner";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEPT_LOG_FILES: usize = 5;
const MAX_MESSAGE_CHARS: usize = 160;

static ACTIVE: OnceCell<ActiveLog> = OnceCell::new();
static VIOLATION_HOOK: OnceCell<()> = OnceCell::new();

thread_local! {
    static CURRENT_ACTION: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Verbosity accepted by `init_logging`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parses a level name, case-insensitively. `warning` means `warn`.
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown log level `{other}`; expected trace|debug|info|warn|error"
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct ActiveLog {
    level: LogLevel,
    dir: PathBuf,
    _handle: LoggerHandle,
}

impl ActiveLog {
    fn check_same(&self, level: LogLevel, dir: &Path) -> Result<(), String> {
        if self.dir != dir {
            return Err(format!(
                "outliner log already writes to `{}`; refusing to switch to `{}`",
                self.dir.display(),
                dir.display()
            ));
        }
        if self.level != level {
            return Err(format!(
                "outliner log already runs at `{}`; refusing to switch to `{level}`",
                self.level
            ));
        }
        Ok(())
    }
}

/// Starts the rolling file log under `log_dir`.
///
/// # Errors
/// - `level` is not a known level name.
/// - `log_dir` is blank, relative, or cannot be created.
/// - The log was already started with another level or directory.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    let level = LogLevel::parse(level)?;
    let dir = absolute_dir(log_dir)?;
    ACTIVE
        .get_or_try_init(|| start(level, &dir))?
        .check_same(level, &dir)
}

/// Level and directory of the running log, if one was started.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE
        .get()
        .map(|active| (active.level.as_str(), active.dir.clone()))
}

/// `debug` in debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        LogLevel::Debug.as_str()
    } else {
        LogLevel::Info.as_str()
    }
}

fn start(level: LogLevel, dir: &Path) -> Result<ActiveLog, String> {
    std::fs::create_dir_all(dir)
        .map_err(|err| format!("cannot create log directory `{}`: {err}", dir.display()))?;

    let handle = Logger::try_with_str(level.as_str())
        .map_err(|err| format!("cannot use log level `{level}`: {err}"))?
        .log_to_file(FileSpec::default().directory(dir).basename(LOG_BASENAME))
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEPT_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("cannot start outliner log: {err}"))?;

    report_violations_once();
    info!(
        "event=log_start module=outliner status=ok level={level} version={} log_dir={}",
        env!("CARGO_PKG_VERSION"),
        dir.display()
    );

    Ok(ActiveLog {
        level,
        dir: dir.to_path_buf(),
        _handle: handle,
    })
}

fn absolute_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("log directory cannot be blank".to_string());
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(format!("log directory must be absolute, got `{trimmed}`"));
    }
    Ok(path.to_path_buf())
}

/// Runs `work` with `action` recorded as the current session action.
///
/// The previous action is restored afterwards, also when `work` panics.
pub(crate) fn with_action<T>(action: &str, work: impl FnOnce() -> T) -> T {
    let previous = CURRENT_ACTION.with(|current| current.replace(Some(action.to_string())));
    let _restore = RestoreAction(previous);
    work()
}

/// Action of the innermost `with_action` on this thread.
pub(crate) fn current_action() -> Option<String> {
    CURRENT_ACTION.with(|current| current.borrow().clone())
}

struct RestoreAction(Option<String>);

impl Drop for RestoreAction {
    fn drop(&mut self) {
        let previous = self.0.take();
        CURRENT_ACTION.with(|current| *current.borrow_mut() = previous);
    }
}

// Tree and graph invariants panic; the hook puts those panics in the log
// next to the edit that caused them, then defers to the previous hook.
fn report_violations_once() {
    if VIOLATION_HOOK.set(()).is_err() {
        return;
    }
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        let message = info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic".to_string());
        error!(
            "event=invariant_violation module=outliner status=panic action={} location={location} message={}",
            current_action().as_deref().unwrap_or("none"),
            one_line(&message, MAX_MESSAGE_CHARS)
        );
        previous(info);
    }));
}

fn one_line(value: &str, max_chars: usize) -> String {
    let flat = value.replace(['\n', '\r'], " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::{
        absolute_dir, current_action, init_logging, logging_status, one_line, with_action,
        LogLevel,
    };
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "outliner-logging-{label}-{}-{nanos}",
            std::process::id()
        ))
    }

    #[test]
    fn level_names_parse_case_insensitively() {
        assert_eq!(LogLevel::parse(" TRACE ").expect("trace"), LogLevel::Trace);
        assert_eq!(LogLevel::parse("warning").expect("warning"), LogLevel::Warn);
        assert_eq!(LogLevel::Error.to_string(), "error");
    }

    #[test]
    fn unknown_level_is_rejected() {
        let error = LogLevel::parse("chatty").expect_err("chatty is not a level");
        assert!(error.contains("unknown log level"));
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        assert!(absolute_dir("   ").is_err());
        let error = absolute_dir("logs/outliner").expect_err("relative dir");
        assert!(error.contains("absolute"));
    }

    #[test]
    fn violation_messages_are_flattened_and_capped() {
        assert_eq!(one_line("node n4 has no parent", 64), "node n4 has no parent");
        let flat = one_line("missing child\nat index 3\r", 10);
        assert!(!flat.contains(['\n', '\r']));
        assert_eq!(flat, "missing ch...");
    }

    #[test]
    fn actions_nest_and_are_restored() {
        assert_eq!(current_action(), None);
        let seen = with_action("indent", || {
            let inner = with_action("move_node", current_action);
            (current_action(), inner)
        });
        assert_eq!(
            seen,
            (Some("indent".to_string()), Some("move_node".to_string()))
        );
        assert_eq!(current_action(), None);
    }

    #[test]
    fn action_is_cleared_after_a_violation() {
        let outcome = std::panic::catch_unwind(|| {
            with_action("remove", || panic!("node n9 is not in the tree"))
        });
        assert!(outcome.is_err());
        assert_eq!(current_action(), None);
    }

    #[test]
    fn second_start_must_match_the_first() {
        let dir = scratch_dir("same");
        let dir_str = dir.to_str().expect("utf-8 temp dir").to_string();
        let other = scratch_dir("other");
        let other_str = other.to_str().expect("utf-8 temp dir").to_string();

        init_logging("info", &dir_str).expect("first start");
        init_logging("INFO", &dir_str).expect("same settings are accepted");

        let level_error = init_logging("trace", &dir_str).expect_err("level change");
        assert!(level_error.contains("refusing to switch"));
        let dir_error = init_logging("info", &other_str).expect_err("directory change");
        assert!(dir_error.contains("refusing to switch"));

        let (level, active_dir) = logging_status().expect("log is running");
        assert_eq!(level, "info");
        assert_eq!(active_dir, dir);
    }
}
