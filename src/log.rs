//! Ambient logging/diagnostics stack.
//!
//! Two pieces, adapted from this lineage's own logging module:
//!
//! - [`LogScope`] / [`scope`]: a thread-local, `Drop`-restored stack of
//!   textual context, so the importer can prefix every log line emitted
//!   while processing a submodule/branch pair without threading a context
//!   parameter through every function.
//! - [`init`]: wires the `log` facade to a `tracing-subscriber` registry, so
//!   `log::info!`/`log::warn!` calls and `tracing` spans (used to
//!   instrument subprocess invocations, see [`crate::vcs`]) end up on the
//!   same stream.
//!
//! Log tee-ing to a file is out of scope: there is no
//! chrome-trace or dump-to-disk writer here, only the scope/span plumbing
//! itself.

use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    static CURRENT_LOG_SCOPE: RefCell<Option<Rc<LogScopeContext>>> = const { RefCell::new(None) };
}

struct LogScopeContext {
    text: String,
    parent: Option<Rc<LogScopeContext>>,
}

impl LogScopeContext {
    fn full_context(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}: {}", parent.full_context(), self.text),
            None => self.text.clone(),
        }
    }
}

/// A scoped log-context guard. While alive, [`current_scope_prefix`] (and
/// therefore every log line formatted through it) includes `text`, nested
/// under whatever scope was active when it was created. Restores the
/// previous scope on drop, regardless of the exit path (early return, `?`,
/// panic-unwind).
pub struct LogScope {
    previous: Option<Rc<LogScopeContext>>,
}

impl Drop for LogScope {
    fn drop(&mut self) {
        CURRENT_LOG_SCOPE.with(|cell| {
            *cell.borrow_mut() = self.previous.take();
        });
    }
}

/// Enters a new log scope nested under whatever scope is currently active.
///
/// ```
/// # use git_monomerge::log::{scope, current_scope_prefix};
/// assert_eq!(current_scope_prefix(), None);
/// {
///     let _outer = scope("libA");
///     assert_eq!(current_scope_prefix().as_deref(), Some("libA"));
///     {
///         let _inner = scope("main");
///         assert_eq!(current_scope_prefix().as_deref(), Some("libA: main"));
///     }
///     assert_eq!(current_scope_prefix().as_deref(), Some("libA"));
/// }
/// assert_eq!(current_scope_prefix(), None);
/// ```
pub fn scope(text: impl Into<String>) -> LogScope {
    let parent = CURRENT_LOG_SCOPE.with(|cell| cell.borrow().clone());
    let context = Rc::new(LogScopeContext {
        text: text.into(),
        parent: parent.clone(),
    });
    CURRENT_LOG_SCOPE.with(|cell| {
        *cell.borrow_mut() = Some(context);
    });
    LogScope { previous: parent }
}

/// The currently active scope's full dotted-colon context, if any.
pub fn current_scope_prefix() -> Option<String> {
    CURRENT_LOG_SCOPE.with(|cell| cell.borrow().as_ref().map(|ctx| ctx.full_context()))
}

/// Initializes the `log` facade and the `tracing` subscriber registry for
/// the given filter level. Call once from `main`.
pub fn init(level: log::LevelFilter) {
    let tracing_level = match level {
        log::LevelFilter::Off => tracing::level_filters::LevelFilter::OFF,
        log::LevelFilter::Error => tracing::level_filters::LevelFilter::ERROR,
        log::LevelFilter::Warn => tracing::level_filters::LevelFilter::WARN,
        log::LevelFilter::Info => tracing::level_filters::LevelFilter::INFO,
        log::LevelFilter::Debug => tracing::level_filters::LevelFilter::DEBUG,
        log::LevelFilter::Trace => tracing::level_filters::LevelFilter::TRACE,
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        // Route `log` macros through the same subscriber so engine code that
        // predates tracing instrumentation (and third-party crates using
        // `log`) still shows up on the same stream.
        let _ = tracing_log::LogTracer::init();
    }
    log::set_max_level(level);
}

/// Formats a log line with the active scope prefix, for use by code that
/// wants scope-aware output without going through `log::Record` formatting
/// (e.g. the progress bar in [`crate::workspace`]).
pub fn scoped_message(message: impl std::fmt::Display) -> String {
    match current_scope_prefix() {
        Some(prefix) => format!("{prefix}: {message}"),
        None => message.to_string(),
    }
}
