//! Validation tests for the annotation state machine and canvas sizing

use sheet2midi::annotation::{
    canvas_size, AnnotationSession, CanvasCommand, CanvasSize, DragState, Point, PointerEvent,
    RectId, RectIds,
};
use sheet2midi::config::CanvasSizing;
use sheet2midi::SheetError;
use std::cell::Cell;

fn p(x: i32, y: i32) -> Point {
    Point::new(x, y)
}

/// Prompt that hands out canned answers and counts how often it was asked
fn scripted_prompt<'a>(
    answers: &'a mut Vec<Option<String>>,
    asked: &'a Cell<usize>,
) -> impl FnMut() -> Option<String> + 'a {
    move || {
        asked.set(asked.get() + 1);
        if answers.is_empty() {
            None
        } else {
            answers.remove(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_creates_moves_and_saves() {
        let mut answers = vec![Some("forte here".to_string())];
        let asked = Cell::new(0);
        let mut prompt = scripted_prompt(&mut answers, &asked);
        let mut session = AnnotationSession::new();

        let commands = session.handle(PointerEvent::Press(p(10, 20)), &mut prompt);
        assert_eq!(
            commands,
            vec![CanvasCommand::CreateRect {
                id: RectId(0),
                from: p(10, 20),
                to: p(10, 20),
            }]
        );
        assert_eq!(
            session.state(),
            DragState::Dragging {
                start: p(10, 20),
                rect: RectId(0)
            }
        );

        let commands = session.handle(PointerEvent::Motion(p(40, 60)), &mut prompt);
        assert_eq!(
            commands,
            vec![CanvasCommand::MoveRect {
                id: RectId(0),
                from: p(10, 20),
                to: p(40, 60),
            }]
        );

        let commands = session.handle(PointerEvent::Release(p(45, 65)), &mut prompt);
        assert!(commands.is_empty());
        assert_eq!(session.state(), DragState::Idle);
        assert_eq!(asked.get(), 1);

        let annotations = session.into_annotations();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].start, p(10, 20));
        assert_eq!(annotations[0].anchor, p(10, 20));
        assert_eq!(annotations[0].end, p(45, 65));
        assert_eq!(annotations[0].comment, "forte here");
    }

    #[test]
    fn test_dragging_left_keeps_press_point_as_first_corner() {
        let mut prompt = || -> Option<String> { None };
        let mut session = AnnotationSession::new();
        session.handle(PointerEvent::Press(p(100, 100)), &mut prompt);
        let commands = session.handle(PointerEvent::Motion(p(20, 30)), &mut prompt);
        assert_eq!(
            commands,
            vec![CanvasCommand::MoveRect {
                id: RectId(0),
                from: p(100, 100),
                to: p(20, 30),
            }]
        );
    }

    #[test]
    fn test_cancelled_or_empty_comment_deletes_rectangle() {
        let mut answers = vec![None, Some(String::new())];
        let asked = Cell::new(0);
        let mut prompt = scripted_prompt(&mut answers, &asked);
        let mut session = AnnotationSession::new();

        session.handle(PointerEvent::Press(p(1, 1)), &mut prompt);
        let commands = session.handle(PointerEvent::Release(p(5, 5)), &mut prompt);
        assert_eq!(commands, vec![CanvasCommand::DeleteRect(RectId(0))]);

        session.handle(PointerEvent::Press(p(2, 2)), &mut prompt);
        let commands = session.handle(PointerEvent::Release(p(6, 6)), &mut prompt);
        assert_eq!(commands, vec![CanvasCommand::DeleteRect(RectId(1))]);

        assert_eq!(asked.get(), 2);
        assert!(session.annotations().is_empty());
        assert_eq!(session.state(), DragState::Idle);
    }

    #[test]
    fn test_whitespace_comment_is_kept() {
        let mut prompt = || Some("  ".to_string());
        let mut session = AnnotationSession::new();
        session.handle(PointerEvent::Press(p(0, 0)), &mut prompt);
        session.handle(PointerEvent::Release(p(3, 3)), &mut prompt);
        assert_eq!(session.annotations().len(), 1);
        assert_eq!(session.annotations()[0].comment, "  ");
    }

    #[test]
    fn test_idle_motion_and_release_do_nothing() {
        let mut answers = vec![Some("never asked".to_string())];
        let asked = Cell::new(0);
        let mut prompt = scripted_prompt(&mut answers, &asked);
        let mut session = AnnotationSession::new();

        assert!(session
            .handle(PointerEvent::Motion(p(3, 4)), &mut prompt)
            .is_empty());
        assert!(session
            .handle(PointerEvent::Release(p(3, 4)), &mut prompt)
            .is_empty());

        assert_eq!(asked.get(), 0);
        assert_eq!(session.state(), DragState::Idle);
        assert!(session.annotations().is_empty());
    }

    #[test]
    fn test_press_while_dragging_starts_new_rectangle() {
        let mut prompt = || Some("second".to_string());
        let mut session = AnnotationSession::new();

        session.handle(PointerEvent::Press(p(0, 0)), &mut prompt);
        let commands = session.handle(PointerEvent::Press(p(50, 50)), &mut prompt);
        assert_eq!(
            commands,
            vec![CanvasCommand::CreateRect {
                id: RectId(1),
                from: p(50, 50),
                to: p(50, 50),
            }]
        );

        session.handle(PointerEvent::Release(p(60, 70)), &mut prompt);
        let annotations = session.annotations();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].start, p(50, 50));
    }

    #[test]
    fn test_annotations_kept_in_completion_order() {
        let mut answers = vec![
            Some("first".to_string()),
            None,
            Some("third".to_string()),
        ];
        let asked = Cell::new(0);
        let mut prompt = scripted_prompt(&mut answers, &asked);
        let mut session = AnnotationSession::new();

        for i in 0..3 {
            session.handle(PointerEvent::Press(p(i * 10, 0)), &mut prompt);
            session.handle(PointerEvent::Release(p(i * 10 + 5, 5)), &mut prompt);
        }

        let comments: Vec<&str> = session
            .annotations()
            .iter()
            .map(|a| a.comment.as_str())
            .collect();
        assert_eq!(comments, vec!["first", "third"]);
    }

    #[test]
    fn test_on_event_is_pure_over_state() {
        let mut ids = RectIds::default();
        let mut prompt = || Some("x".to_string());
        let dragging = DragState::Dragging {
            start: p(1, 2),
            rect: RectId(9),
        };

        let transition = dragging.on_event(PointerEvent::Release(p(3, 4)), &mut prompt, &mut ids);
        assert_eq!(transition.next, DragState::Idle);
        let saved = transition.saved.unwrap();
        assert_eq!((saved.start, saved.end), (p(1, 2), p(3, 4)));
        // release never consumes an id
        assert_eq!(ids.next_id(), RectId(0));
    }

    #[test]
    fn test_canvas_size_from_image_dimensions() {
        let size = canvas_size(&[1000, 800, 3], CanvasSizing::ImageDimensions).unwrap();
        assert_eq!(
            size,
            CanvasSize {
                width: 800,
                height: 1000
            }
        );
        let size = canvas_size(&[20, 30], CanvasSizing::ImageDimensions).unwrap();
        assert_eq!((size.width, size.height), (30, 20));
    }

    #[test]
    fn test_shape_descriptor_sizing_always_fails() {
        let err = canvas_size(&[1000, 800, 3], CanvasSizing::ShapeDescriptor).unwrap_err();
        assert!(matches!(err, SheetError::CanvasSizingError(_)));
    }

    #[test]
    fn test_short_shape_is_rejected() {
        let err = canvas_size(&[1000], CanvasSizing::ImageDimensions).unwrap_err();
        assert!(matches!(err, SheetError::CanvasSizingError(_)));
    }
}
