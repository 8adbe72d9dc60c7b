//! Progress events emitted by the install pipeline.
//!
//! The pipeline never touches a widget. Every log line and progress value is handed to a
//! [`ProgressSink`], which the presentation layer implements.

use std::sync::mpsc::Sender;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressEvent {
    pub message: Option<String>,
    /// Fraction in `0.0..=1.0`.
    pub progress: Option<f64>,
    pub done: bool,
}

impl ProgressEvent {
    pub fn log<S: Into<String>>(message: S) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn progress(fraction: f64) -> Self {
        Self {
            progress: Some(fraction.clamp(0.0, 1.0)),
            ..Self::default()
        }
    }

    pub fn done<S: Into<String>>(message: S) -> Self {
        Self {
            message: Some(message.into()),
            progress: None,
            done: true,
        }
    }
}

pub trait ProgressSink {
    fn emit(&mut self, event: ProgressEvent);

    fn log(&mut self, message: &str) {
        self.emit(ProgressEvent::log(message));
    }

    fn progress(&mut self, fraction: f64) {
        self.emit(ProgressEvent::progress(fraction));
    }
}

impl<F> ProgressSink for F
where
    F: FnMut(ProgressEvent),
{
    fn emit(&mut self, event: ProgressEvent) {
        self(event)
    }
}

/// Records every event, mostly useful in tests.
impl ProgressSink for Vec<ProgressEvent> {
    fn emit(&mut self, event: ProgressEvent) {
        self.push(event);
    }
}

/// A closed receiver is not an error: the pipeline keeps running without a listener.
impl ProgressSink for Sender<ProgressEvent> {
    fn emit(&mut self, event: ProgressEvent) {
        let _ = self.send(event);
    }
}

/// Progress values carried by the recorded events, in order.
pub fn progress_values(events: &[ProgressEvent]) -> Vec<f64> {
    events.iter().filter_map(|e| e.progress).collect()
}
