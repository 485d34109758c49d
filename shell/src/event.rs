use crate::open_request::{OpenFileEvent, OpenUrlEvent};

#[derive(Debug)]
pub enum ShellEvent {
    /// A deep link reached the URL channel consumer.
    OpenUrl(OpenUrlEvent),
    /// A document reached the file channel consumer.
    OpenFile(OpenFileEvent),
    /// Ctrl+C received; the shell should publish its final state and exit.
    Shutdown,
}
