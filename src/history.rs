//! Undo/redo history for annotation and view operations.
//!
//! Every mutation of the annotation store or the view transform is described
//! by a [`Command`] holding the minimal before/after delta, and is applied
//! through [`History::record`]. The log is linear: recording while the cursor
//! is behind the tail drops the redo suffix.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::model::{
    Annotation, AnnotationId, AnnotationStore, BoxAnnotation, Point, StrokeAnnotation,
    ViewTransform,
};

/// The state commands operate on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub store: AnnotationStore,
    pub transform: ViewTransform,
}

impl Document {
    pub fn new(transform: ViewTransform) -> Self {
        Self {
            store: AnnotationStore::new(),
            transform,
        }
    }
}

// ============================================================================
// Command Types
// ============================================================================

/// Kind of a recorded state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    CreateBox,
    ResizeBox,
    CreateStroke,
    AppendStrokePoint,
    AttachLabel,
    RemoveAnnotation,
    SetTransform,
    LoadImage,
    Batch,
}

/// A reversible state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A box was created; before: absent, after: `annotation`
    CreateBox { annotation: BoxAnnotation },
    /// The second corner of a box moved
    ResizeBox {
        id: AnnotationId,
        old_corner: Point,
        new_corner: Point,
    },
    /// A stroke was created; before: absent, after: `annotation`
    CreateStroke { annotation: StrokeAnnotation },
    /// Points were appended to a stroke that had `previous_len` points
    AppendStrokePoint {
        id: AnnotationId,
        previous_len: usize,
        points: Vec<Point>,
    },
    /// A label was attached, replacing `old_label`
    AttachLabel {
        id: AnnotationId,
        old_label: Option<String>,
        new_label: String,
    },
    /// An annotation was removed (stored for undo)
    RemoveAnnotation { annotation: Annotation },
    /// The view transform changed
    SetTransform {
        old: ViewTransform,
        new: ViewTransform,
    },
    /// A new image replaced everything; never kept in the log
    LoadImage { transform: ViewTransform },
    /// Several commands undone and redone as one step
    Batch {
        description: String,
        commands: Vec<Command>,
    },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::CreateBox { .. } => CommandKind::CreateBox,
            Command::ResizeBox { .. } => CommandKind::ResizeBox,
            Command::CreateStroke { .. } => CommandKind::CreateStroke,
            Command::AppendStrokePoint { .. } => CommandKind::AppendStrokePoint,
            Command::AttachLabel { .. } => CommandKind::AttachLabel,
            Command::RemoveAnnotation { .. } => CommandKind::RemoveAnnotation,
            Command::SetTransform { .. } => CommandKind::SetTransform,
            Command::LoadImage { .. } => CommandKind::LoadImage,
            Command::Batch { .. } => CommandKind::Batch,
        }
    }

    /// The annotation this command targets, if any.
    pub fn target_id(&self) -> Option<AnnotationId> {
        match self {
            Command::CreateBox { annotation } => Some(annotation.id),
            Command::CreateStroke { annotation } => Some(annotation.id),
            Command::ResizeBox { id, .. }
            | Command::AppendStrokePoint { id, .. }
            | Command::AttachLabel { id, .. } => Some(*id),
            Command::RemoveAnnotation { annotation } => Some(annotation.id()),
            Command::SetTransform { .. } | Command::LoadImage { .. } | Command::Batch { .. } => {
                None
            }
        }
    }

    /// Get a human-readable description of this command
    pub fn description(&self) -> String {
        match self {
            Command::CreateBox { .. } => "Draw box".to_string(),
            Command::ResizeBox { .. } => "Resize box".to_string(),
            Command::CreateStroke { .. } => "Draw stroke".to_string(),
            Command::AppendStrokePoint { points, .. } => {
                format!("Extend stroke by {} points", points.len())
            }
            Command::AttachLabel { new_label, .. } => format!("Label '{}'", new_label),
            Command::RemoveAnnotation { annotation } => {
                format!("Delete {}", annotation.kind_name())
            }
            Command::SetTransform { old, new } => {
                if old.rotation != new.rotation {
                    "Rotate view".to_string()
                } else {
                    "Zoom view".to_string()
                }
            }
            Command::LoadImage { .. } => "Load image".to_string(),
            Command::Batch { description, .. } => description.clone(),
        }
    }

    /// Move the document to this command's after-state.
    ///
    /// Fails without touching the document when the command does not fit the
    /// current state.
    pub fn apply(&self, doc: &mut Document) -> Result<()> {
        match self {
            Command::CreateBox { annotation } => {
                doc.store.restore(Annotation::Box(annotation.clone()))
            }
            Command::ResizeBox { id, new_corner, .. } => {
                doc.store.resize_box(*id, *new_corner).map(|_| ())
            }
            Command::CreateStroke { annotation } => {
                if annotation.points.is_empty() {
                    return Err(Error::invalid_argument("a stroke needs at least one point"));
                }
                doc.store.restore(Annotation::Stroke(annotation.clone()))
            }
            Command::AppendStrokePoint {
                id,
                previous_len,
                points,
            } => {
                let current = doc.store.stroke_mut(*id)?.points.len();
                if current != *previous_len {
                    return Err(Error::invalid_argument(format!(
                        "stroke {} has {} points, expected {}",
                        id, current, previous_len
                    )));
                }
                doc.store.append_stroke_points(*id, points)
            }
            Command::AttachLabel { id, new_label, .. } => {
                doc.store.attach_label(*id, new_label).map(|_| ())
            }
            Command::RemoveAnnotation { annotation } => {
                doc.store.remove(annotation.id()).map(|_| ())
            }
            Command::SetTransform { new, .. } => {
                doc.transform = *new;
                Ok(())
            }
            Command::LoadImage { transform } => {
                doc.store.clear();
                doc.transform = *transform;
                Ok(())
            }
            Command::Batch { commands, .. } => {
                for (applied, cmd) in commands.iter().enumerate() {
                    if let Err(e) = cmd.apply(doc) {
                        // Roll back what already went through so the batch is atomic.
                        for done in commands[..applied].iter().rev() {
                            if let Err(rollback) = done.revert(doc) {
                                log::error!("Batch rollback failed: {}", rollback);
                            }
                        }
                        return Err(e);
                    }
                }
                Ok(())
            }
        }
    }

    /// Move the document back to this command's before-state.
    pub fn revert(&self, doc: &mut Document) -> Result<()> {
        match self {
            Command::CreateBox { annotation } => doc.store.remove(annotation.id).map(|_| ()),
            Command::ResizeBox { id, old_corner, .. } => {
                doc.store.resize_box(*id, *old_corner).map(|_| ())
            }
            Command::CreateStroke { annotation } => doc.store.remove(annotation.id).map(|_| ()),
            Command::AppendStrokePoint {
                id, previous_len, ..
            } => doc.store.truncate_stroke(*id, *previous_len),
            Command::AttachLabel { id, old_label, .. } => {
                doc.store.set_label(*id, old_label.clone()).map(|_| ())
            }
            Command::RemoveAnnotation { annotation } => doc.store.restore(annotation.clone()),
            Command::SetTransform { old, .. } => {
                doc.transform = *old;
                Ok(())
            }
            Command::LoadImage { .. } => {
                log::warn!("Image loads cannot be reverted");
                Ok(())
            }
            Command::Batch { commands, .. } => {
                for cmd in commands.iter().rev() {
                    cmd.revert(doc)?;
                }
                Ok(())
            }
        }
    }

    /// Fold `next` into this command so both become a single undo step.
    ///
    /// Only called after `next` has been applied on top of this command's
    /// after-state, so the folded command's after-state equals the document.
    fn absorb(&mut self, next: &Command, policy: &MergePolicy) -> bool {
        let in_gesture = |id: AnnotationId| policy.gesture == Some(id);
        match (self, next) {
            (
                Command::CreateBox { annotation },
                Command::ResizeBox { id, new_corner, .. },
            ) if annotation.id == *id && in_gesture(*id) => {
                annotation.corner2 = *new_corner;
                true
            }
            (
                Command::ResizeBox { id, new_corner, .. },
                Command::ResizeBox {
                    id: next_id,
                    new_corner: next_corner,
                    ..
                },
            ) if id == next_id && in_gesture(*id) => {
                *new_corner = *next_corner;
                true
            }
            (
                Command::CreateStroke { annotation },
                Command::AppendStrokePoint { id, points, .. },
            ) if annotation.id == *id && in_gesture(*id) => {
                annotation.points.extend_from_slice(points);
                true
            }
            (
                Command::AppendStrokePoint { id, points, .. },
                Command::AppendStrokePoint {
                    id: next_id,
                    points: next_points,
                    ..
                },
            ) if id == next_id && in_gesture(*id) => {
                points.extend_from_slice(next_points);
                true
            }
            (
                Command::CreateBox { annotation },
                Command::AttachLabel {
                    id,
                    old_label: None,
                    new_label,
                },
            ) if policy.fold_labels && annotation.id == *id && annotation.label.is_none() => {
                annotation.label = Some(new_label.clone());
                true
            }
            (
                Command::CreateStroke { annotation },
                Command::AttachLabel {
                    id,
                    old_label: None,
                    new_label,
                },
            ) if policy.fold_labels && annotation.id == *id && annotation.label.is_none() => {
                annotation.label = Some(new_label.clone());
                true
            }
            _ => false,
        }
    }
}

/// When [`History::record_merged`] may fold a command into the tail entry.
#[derive(Debug, Clone, Default)]
pub struct MergePolicy {
    /// Annotation whose press-drag-release gesture is still open.
    pub gesture: Option<AnnotationId>,
    /// Fold a first label into the command that created the annotation.
    pub fold_labels: bool,
}

// ============================================================================
// History log
// ============================================================================

/// Configuration for the history log
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Maximum number of commands to keep (0 keeps everything)
    pub max_history: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_history: 100 }
    }
}

/// Linear command log with a cursor.
///
/// `cursor` counts the applied entries: entries before it can be undone,
/// entries from it onward can be redone.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<Command>,
    cursor: usize,
    config: HistoryConfig,
}

impl History {
    /// Create a new empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Apply `command` and append it, dropping any redo suffix.
    ///
    /// A `LoadImage` command resets the document and clears the log instead.
    pub fn record(&mut self, command: Command, doc: &mut Document) -> Result<()> {
        command.apply(doc)?;
        self.push_applied(command);
        Ok(())
    }

    /// Like [`History::record`], but fold the command into the tail entry
    /// when `policy` allows it.
    pub fn record_merged(
        &mut self,
        command: Command,
        doc: &mut Document,
        policy: &MergePolicy,
    ) -> Result<()> {
        command.apply(doc)?;
        let at_tail = self.cursor == self.entries.len();
        if at_tail {
            if let Some(tail) = self.entries.back_mut() {
                if tail.absorb(&command, policy) {
                    log::trace!("History: folded '{}' into '{}'", command.description(), tail.description());
                    return Ok(());
                }
            }
        }
        self.push_applied(command);
        Ok(())
    }

    fn push_applied(&mut self, command: Command) {
        if command.kind() == CommandKind::LoadImage {
            self.clear();
            return;
        }

        log::debug!("History: recorded '{}'", command.description());
        self.entries.truncate(self.cursor);
        self.entries.push_back(command);
        self.cursor += 1;

        if self.config.max_history > 0 {
            while self.entries.len() > self.config.max_history {
                self.entries.pop_front();
                self.cursor -= 1;
            }
        }
    }

    /// Revert the entry before the cursor. Returns false at the start of the log.
    pub fn undo(&mut self, doc: &mut Document) -> Result<bool> {
        let Some(index) = self.cursor.checked_sub(1) else {
            return Ok(false);
        };
        let cmd = &self.entries[index];
        cmd.revert(doc)?;
        log::debug!("History: undid '{}'", cmd.description());
        self.cursor = index;
        Ok(true)
    }

    /// Re-apply the entry at the cursor. Returns false at the tail of the log.
    pub fn redo(&mut self, doc: &mut Document) -> Result<bool> {
        let Some(cmd) = self.entries.get(self.cursor) else {
            return Ok(false);
        };
        cmd.apply(doc)?;
        log::debug!("History: redid '{}'", cmd.description());
        self.cursor += 1;
        Ok(true)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Get the description of the command that would be undone
    pub fn undo_description(&self) -> Option<String> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .map(|c| c.description())
    }

    /// Get the description of the command that would be redone
    pub fn redo_description(&self) -> Option<String> {
        self.entries.get(self.cursor).map(|c| c.description())
    }

    /// Recorded entries, oldest first
    pub fn entries(&self) -> &VecDeque<Command> {
        &self.entries
    }

    /// Number of applied entries
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
        log::debug!("History cleared");
    }
}

// ============================================================================
// Tests
// ============================================================================
