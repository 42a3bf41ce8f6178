//! Structured argv building for traced invocations.

use std::ffi::OsString;
use std::path::Path;

/// A tracer prefix: program, its own arguments, and the flag naming its log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracerPrefix {
    pub argv: Vec<String>,
    pub output_flag: String,
}

/// Build the argv for one invocation.
///
/// Without a tracer the command runs as-is. With one, the tracer's argv and
/// `<output_flag> <log_path>` are prepended to the untouched command tokens;
/// no token is ever joined or re-split.
pub fn invocation_argv(
    command: &[String],
    tracer: Option<(&TracerPrefix, &Path)>,
) -> Vec<OsString> {
    let mut argv = Vec::new();
    if let Some((prefix, log_path)) = tracer {
        argv.extend(prefix.argv.iter().map(OsString::from));
        argv.push(OsString::from(&prefix.output_flag));
        argv.push(log_path.as_os_str().to_owned());
    }
    argv.extend(command.iter().map(OsString::from));
    argv
}
