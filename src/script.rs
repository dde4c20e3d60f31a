//! Scripted UI events.
//!
//! A script is a JSON array of steps, each one UI event a shell would send
//! to the session:
//!
//! ```json
//! [
//!   { "op": "begin_box", "x": 10, "y": 10 },
//!   { "op": "update_box", "x": 40, "y": 40 },
//!   { "op": "end_gesture" },
//!   { "op": "label", "text": "cat" },
//!   { "op": "rotate" }
//! ]
//! ```
//!
//! Pointer coordinates are in view space, like real pointer events; the
//! `draw_*` steps take image-space coordinates.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{AnnotationId, Color, Point};
use crate::session::Session;

/// One scripted UI event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    BeginBox { x: f32, y: f32 },
    UpdateBox { x: f32, y: f32 },
    BeginStroke { x: f32, y: f32 },
    ExtendStroke { x: f32, y: f32 },
    EndGesture,
    DrawBox { x1: f32, y1: f32, x2: f32, y2: f32 },
    DrawStroke { points: Vec<[f32; 2]> },
    /// Label `target`, or the most recent annotation when absent
    Label {
        text: String,
        #[serde(default)]
        target: Option<u64>,
    },
    Remove { id: u64 },
    Zoom { factor: f32 },
    ZoomIn,
    ZoomOut,
    Rotate,
    Undo,
    Redo,
    /// Outline color for boxes drawn from now on, as `#rrggbb`
    BoxColor { color: String },
    /// Color for strokes drawn from now on, as `#rrggbb`
    StrokeColor { color: String },
    /// Text color for burned-in labels, as `#rrggbb`
    LabelColor { color: String },
}

impl ScriptStep {
    fn name(&self) -> &'static str {
        match self {
            ScriptStep::BeginBox { .. } => "begin_box",
            ScriptStep::UpdateBox { .. } => "update_box",
            ScriptStep::BeginStroke { .. } => "begin_stroke",
            ScriptStep::ExtendStroke { .. } => "extend_stroke",
            ScriptStep::EndGesture => "end_gesture",
            ScriptStep::DrawBox { .. } => "draw_box",
            ScriptStep::DrawStroke { .. } => "draw_stroke",
            ScriptStep::Label { .. } => "label",
            ScriptStep::Remove { .. } => "remove",
            ScriptStep::Zoom { .. } => "zoom",
            ScriptStep::ZoomIn => "zoom_in",
            ScriptStep::ZoomOut => "zoom_out",
            ScriptStep::Rotate => "rotate",
            ScriptStep::Undo => "undo",
            ScriptStep::Redo => "redo",
            ScriptStep::BoxColor { .. } => "box_color",
            ScriptStep::StrokeColor { .. } => "stroke_color",
            ScriptStep::LabelColor { .. } => "label_color",
        }
    }

    /// Send this event to `session`.
    pub fn apply(&self, session: &mut Session) -> Result<(), Error> {
        match self {
            ScriptStep::BeginBox { x, y } => session.begin_box(Point::new(*x, *y)).map(|_| ()),
            ScriptStep::UpdateBox { x, y } => session.update_box(Point::new(*x, *y)),
            ScriptStep::BeginStroke { x, y } => {
                session.begin_stroke(Point::new(*x, *y)).map(|_| ())
            }
            ScriptStep::ExtendStroke { x, y } => session.extend_stroke(Point::new(*x, *y)),
            ScriptStep::EndGesture => {
                session.end_gesture();
                Ok(())
            }
            ScriptStep::DrawBox { x1, y1, x2, y2 } => session
                .draw_box(Point::new(*x1, *y1), Point::new(*x2, *y2))
                .map(|_| ()),
            ScriptStep::DrawStroke { points } => session
                .draw_stroke(points.iter().map(|[x, y]| Point::new(*x, *y)).collect())
                .map(|_| ()),
            ScriptStep::Label { text, target } => session
                .attach_label(target.map(AnnotationId::from), text)
                .map(|_| ()),
            ScriptStep::Remove { id } => session.remove(AnnotationId::from(*id)),
            ScriptStep::Zoom { factor } => session.zoom(*factor),
            ScriptStep::ZoomIn => session.zoom_in(),
            ScriptStep::ZoomOut => session.zoom_out(),
            ScriptStep::Rotate => session.rotate(),
            ScriptStep::Undo => session.undo().map(|_| ()),
            ScriptStep::Redo => session.redo().map(|_| ()),
            ScriptStep::BoxColor { color } => {
                session.style_mut().box_color = parse_color(color)?;
                Ok(())
            }
            ScriptStep::StrokeColor { color } => {
                session.style_mut().stroke_color = parse_color(color)?;
                Ok(())
            }
            ScriptStep::LabelColor { color } => {
                session.style_mut().label_color = parse_color(color)?;
                Ok(())
            }
        }
    }
}

fn parse_color(hex: &str) -> Result<Color, Error> {
    Color::from_hex(hex).ok_or_else(|| Error::invalid_argument(format!("bad color '{}'", hex)))
}

/// Errors from parsing or replaying a script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Failed to parse script: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Step {step} ({op}) failed: {source}")]
    Step {
        /// Zero-based index of the failing step
        step: usize,
        op: &'static str,
        #[source]
        source: Error,
    },
}

/// Parse a script from its JSON text.
pub fn parse(json: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    Ok(serde_json::from_str(json)?)
}

/// Replay `steps` in order, stopping at the first failing step.
///
/// Steps before the failure stay applied; each of them is undoable.
pub fn run(session: &mut Session, steps: &[ScriptStep]) -> Result<(), ScriptError> {
    for (step, event) in steps.iter().enumerate() {
        log::debug!("Script step {}: {:?}", step, event);
        event.apply(session).map_err(|source| ScriptError::Step {
            step,
            op: event.name(),
            source,
        })?;
    }
    log::info!("Replayed {} script steps", steps.len());
    Ok(())
}
