use std::process::ExitCode;

/// Process exit status.
///
/// - `Success` (0): the command did its work
/// - `Failure` (1): the command ran but something needs attention (a file
///   could not be written, conflicts block generation, config exists)
/// - `Error` (2): the command could not run (unreadable ledger, bad flags)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
    Error,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Failure => ExitCode::from(1),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}
