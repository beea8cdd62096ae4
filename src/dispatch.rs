//! Event dispatcher: maps named UI events onto pipeline actions so the
//! compositing core stays decoupled from any particular UI toolkit. Every
//! event resolves to a status string for the shell; failures are local and
//! never poison the session.

use crate::export::{self, ExportOutput, RenderTarget};
use crate::segmentation::{DetectOptions, SegmentationProvider};
use crate::session::Session;
use crate::typeface::Typeface;

#[derive(Debug)]
pub enum UiEvent {
    LoadImage { bytes: Vec<u8> },
    SetText { text: String },
    SetDimness { value: f32 },
    RequestDetect { options: DetectOptions },
    ResetMask,
    RequestExport { target: RenderTarget },
}

pub struct EventOutcome {
    pub status: String,
    /// Present only for a successful `RequestExport`.
    pub export: Option<ExportOutput>,
}

impl EventOutcome {
    fn status(msg: impl Into<String>) -> Self {
        Self {
            status: msg.into(),
            export: None,
        }
    }
}

pub struct Dispatcher<'a> {
    provider: &'a mut dyn SegmentationProvider,
    face: &'a dyn Typeface,
}

impl<'a> Dispatcher<'a> {
    pub fn new(provider: &'a mut dyn SegmentationProvider, face: &'a dyn Typeface) -> Self {
        Self { provider, face }
    }

    pub fn dispatch(&mut self, session: &mut Session, event: UiEvent) -> EventOutcome {
        match event {
            UiEvent::LoadImage { bytes } => match session.load_image(bytes) {
                Ok(()) => EventOutcome::status("image loaded"),
                Err(e) => EventOutcome::status(format!("image load failed: {e}")),
            },
            UiEvent::SetText { text } => {
                session.set_text(text);
                EventOutcome::status("text updated")
            }
            UiEvent::SetDimness { value } => match session.set_dimness(value) {
                Ok(()) => EventOutcome::status("dimness updated"),
                Err(e) => EventOutcome::status(format!("dimness rejected: {e}")),
            },
            UiEvent::RequestDetect { options } => {
                match session.detect(self.provider, &options) {
                    Ok(()) => EventOutcome::status("person mask ready"),
                    Err(e) => EventOutcome::status(format!("detection failed: {e}")),
                }
            }
            UiEvent::ResetMask => match session.reset_mask() {
                Ok(()) => EventOutcome::status("mask cleared"),
                Err(e) => EventOutcome::status(format!("reset rejected: {e}")),
            },
            UiEvent::RequestExport { target } => {
                let report = export::export(session, self.face, &target);
                EventOutcome {
                    status: report.status,
                    export: report.output,
                }
            }
        }
    }
}
