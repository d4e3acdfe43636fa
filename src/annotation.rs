//! Rectangle-and-comment annotation of the original sheet image.
//!
//! Pointer handling is a two-state machine (`Idle`, `Dragging`) driven by
//! [`DragState::on_event`]. It emits [`CanvasCommand`]s instead of drawing, and
//! asks for comments through the [`CommentPrompt`] capability, so it runs the
//! same with a real window or in tests.
//!
//! Two quirks of the legacy overlay are kept on purpose:
//! - while dragging, the rectangle's first corner is always the press point;
//! - a saved [`Annotation`] records the press point twice.

use crate::config::CanvasSizing;
use crate::error::{Result as SheetErrorResult, SheetError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Canvas coordinate in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Identifier of a rectangle on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RectId(pub u32);

/// Mouse input relevant to annotation (left button only)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Press(Point),
    Motion(Point),
    Release(Point),
}

/// Drawing operations for whatever renders the canvas
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasCommand {
    CreateRect { id: RectId, from: Point, to: Point },
    MoveRect { id: RectId, from: Point, to: Point },
    DeleteRect(RectId),
}

/// A saved rectangle with its comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub start: Point,
    /// Same value as `start`
    pub anchor: Point,
    pub end: Point,
    pub comment: String,
}

/// Blocking request for a comment; `None` means the dialog was cancelled
pub trait CommentPrompt {
    fn ask_comment(&mut self) -> Option<String>;
}

impl<F> CommentPrompt for F
where
    F: FnMut() -> Option<String>,
{
    fn ask_comment(&mut self) -> Option<String> {
        self()
    }
}

/// Hands out increasing rectangle ids
#[derive(Debug, Default)]
pub struct RectIds {
    next: u32,
}

impl RectIds {
    pub fn next_id(&mut self) -> RectId {
        let id = RectId(self.next);
        self.next += 1;
        id
    }
}

/// Pointer gesture state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging { start: Point, rect: RectId },
}

/// Result of feeding one event to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: DragState,
    pub commands: Vec<CanvasCommand>,
    pub saved: Option<Annotation>,
}

impl Transition {
    fn stay(state: DragState) -> Self {
        Self {
            next: state,
            commands: Vec::new(),
            saved: None,
        }
    }
}

impl DragState {
    /// Advance the gesture by one pointer event.
    ///
    /// A press always starts a new rectangle, even mid-drag; the previous
    /// rectangle is left on the canvas. Motion and release while idle do
    /// nothing.
    pub fn on_event(
        self,
        event: PointerEvent,
        prompt: &mut dyn CommentPrompt,
        ids: &mut RectIds,
    ) -> Transition {
        match (self, event) {
            (_, PointerEvent::Press(at)) => {
                let rect = ids.next_id();
                Transition {
                    next: DragState::Dragging { start: at, rect },
                    commands: vec![CanvasCommand::CreateRect {
                        id: rect,
                        from: at,
                        to: at,
                    }],
                    saved: None,
                }
            }
            (DragState::Dragging { start, rect }, PointerEvent::Motion(at)) => Transition {
                next: self,
                commands: vec![CanvasCommand::MoveRect {
                    id: rect,
                    from: start,
                    to: at,
                }],
                saved: None,
            },
            (DragState::Dragging { start, rect }, PointerEvent::Release(at)) => {
                match prompt.ask_comment().filter(|c| !c.is_empty()) {
                    Some(comment) => Transition {
                        next: DragState::Idle,
                        commands: Vec::new(),
                        saved: Some(Annotation {
                            start,
                            anchor: start,
                            end: at,
                            comment,
                        }),
                    },
                    None => Transition {
                        next: DragState::Idle,
                        commands: vec![CanvasCommand::DeleteRect(rect)],
                        saved: None,
                    },
                }
            }
            (DragState::Idle, _) => Transition::stay(self),
        }
    }
}

/// Annotations collected during one overlay session
#[derive(Debug)]
pub struct AnnotationSession {
    state: DragState,
    ids: RectIds,
    annotations: Vec<Annotation>,
}

impl Default for AnnotationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationSession {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
            ids: RectIds::default(),
            annotations: Vec::new(),
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn into_annotations(self) -> Vec<Annotation> {
        self.annotations
    }

    /// Feed one pointer event and return the canvas commands to apply
    pub fn handle(
        &mut self,
        event: PointerEvent,
        prompt: &mut dyn CommentPrompt,
    ) -> Vec<CanvasCommand> {
        let transition = self.state.on_event(event, prompt, &mut self.ids);
        debug!(?event, from = ?self.state, to = ?transition.next, "Pointer event");
        self.state = transition.next;

        if let Some(annotation) = transition.saved {
            println!("Annotation saved: {}", annotation.comment);
            self.annotations.push(annotation);
        }

        transition.commands
    }
}

/// Canvas size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

/// Size the canvas from an image shape descriptor `[rows, cols, ...]`
pub fn canvas_size(shape: &[usize], sizing: CanvasSizing) -> SheetErrorResult<CanvasSize> {
    if shape.len() < 2 {
        return Err(SheetError::CanvasSizingError(format!(
            "shape {:?} has no column dimension",
            shape
        )));
    }
    match sizing {
        CanvasSizing::ImageDimensions => Ok(CanvasSize {
            width: shape[1] as u32,
            height: shape[0] as u32,
        }),
        CanvasSizing::ShapeDescriptor => Err(SheetError::CanvasSizingError(format!(
            "height given the whole shape descriptor {:?}, which is not a single length",
            shape
        ))),
    }
}

/// Rectangle spanned by two corners, normalized to (x, y, width, height)
pub fn rect_bounds(from: Point, to: Point) -> (i32, i32, i32, i32) {
    let x = from.x.min(to.x);
    let y = from.y.min(to.y);
    (x, y, (from.x - to.x).abs(), (from.y - to.y).abs())
}
