//! Undo, redo and clear for the canvas

use tracing::debug;

use super::Canvas;

impl Canvas {
    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.document.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.document.can_redo()
    }

    /// Undo the last element or clear.
    ///
    /// A stroke in progress is closed by the document and undone with it.
    pub fn undo(&mut self) -> bool {
        self.drop_stroke_state();
        let undone = self.document.undo();
        debug!("Canvas::undo: {}", undone);
        undone
    }

    /// Redo the last undone element or clear
    pub fn redo(&mut self) -> bool {
        self.drop_stroke_state();
        self.document.finish_current_element();
        let redone = self.document.redo();
        debug!("Canvas::redo: {}", redone);
        redone
    }

    /// Clear the canvas, keeping the content for undo
    pub fn clear(&mut self) -> bool {
        self.drop_stroke_state();
        self.document.append_clear_action()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use crate::canvas::Canvas;
    use crate::document::ElementKind;
    use crate::types::{InputPhase, InputSample};

    fn stroke(canvas: &mut Canvas, y: f32) {
        for (x, phase) in [
            (0.0, InputPhase::Begin),
            (10.0, InputPhase::Move),
            (20.0, InputPhase::Move),
            (30.0, InputPhase::End),
        ] {
            canvas.handle_input(InputSample::new(Vec2::new(x, y), 1.0, phase));
        }
    }

    #[test]
    fn test_undo_redo_strokes() {
        let mut canvas = Canvas::default();
        stroke(&mut canvas, 0.0);
        stroke(&mut canvas, 10.0);
        assert_eq!(canvas.document().elements().len(), 2);

        assert!(canvas.undo());
        assert_eq!(canvas.document().elements().len(), 1);
        assert!(canvas.can_redo());
        assert!(canvas.redo());
        assert_eq!(canvas.document().elements().len(), 2);
    }

    #[test]
    fn test_clear_and_undo_clear() {
        let mut canvas = Canvas::default();
        stroke(&mut canvas, 0.0);
        assert!(canvas.clear());
        assert!(canvas.document().elements().is_empty());

        assert!(canvas.undo());
        assert_eq!(canvas.document().elements().len(), 1);
        assert_eq!(canvas.document().elements()[0].kind(), ElementKind::Strip);
    }

    #[test]
    fn test_undo_mid_stroke_drops_stroke() {
        let mut canvas = Canvas::default();
        stroke(&mut canvas, 0.0);
        canvas.handle_input(InputSample::new(Vec2::ZERO, 1.0, InputPhase::Begin));
        canvas.handle_input(InputSample::new(Vec2::new(10.0, 5.0), 1.0, InputPhase::Move));
        canvas.handle_input(InputSample::new(Vec2::new(20.0, 5.0), 1.0, InputPhase::Move));

        assert!(canvas.undo());
        assert!(!canvas.is_stroking());
        assert_eq!(canvas.document().elements().len(), 1);

        // later moves belong to no stroke
        let stamps =
            canvas.handle_input(InputSample::new(Vec2::new(30.0, 5.0), 1.0, InputPhase::Move));
        assert!(stamps.is_empty());
    }

    #[test]
    fn test_clear_empty_canvas() {
        let mut canvas = Canvas::default();
        assert!(!canvas.clear());
        assert!(!canvas.can_undo());
    }
}
