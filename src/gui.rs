//! FLTK front end: image chooser, comment dialog and the annotation window

use crate::annotation::{
    canvas_size, rect_bounds, Annotation, AnnotationSession, CanvasCommand, CommentPrompt, Point,
    PointerEvent, RectId,
};
use crate::config::AnnotationConfig;
use crate::error::{Result as SheetErrorResult, SheetError};
use crate::sheet::{load_color, shape_of};
use crate::ImagePicker;
use fltk::{
    app, dialog, draw,
    enums::{Color, ColorDepth, Event},
    frame::Frame,
    image::RgbImage as FltkRgbImage,
    prelude::*,
    window::Window,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::info;

/// Native "open file" dialog
#[derive(Debug, Clone)]
pub struct FltkImagePicker {
    pub title: String,
}

impl Default for FltkImagePicker {
    fn default() -> Self {
        Self {
            title: "Select Sheet Music Image".to_string(),
        }
    }
}

impl ImagePicker for FltkImagePicker {
    fn pick_image(&mut self) -> Option<PathBuf> {
        let _app = app::App::default();
        let mut chooser = dialog::NativeFileChooser::new(dialog::NativeFileChooserType::BrowseFile);
        chooser.set_title(&self.title);
        chooser.show();
        let path = chooser.filename();
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }
}

/// Modal text input used for annotation comments
#[derive(Debug, Clone)]
pub struct FltkCommentPrompt {
    pub title: String,
    pub message: String,
}

impl CommentPrompt for FltkCommentPrompt {
    fn ask_comment(&mut self) -> Option<String> {
        dialog::message_title(&self.title);
        dialog::input_default(&self.message, "")
    }
}

type Shapes = BTreeMap<RectId, (Point, Point)>;

fn apply_commands(shapes: &mut Shapes, commands: Vec<CanvasCommand>) {
    for command in commands {
        match command {
            CanvasCommand::CreateRect { id, from, to } | CanvasCommand::MoveRect { id, from, to } => {
                shapes.insert(id, (from, to));
            }
            CanvasCommand::DeleteRect(id) => {
                shapes.remove(&id);
            }
        }
    }
}

/// Show the original image and collect annotations until the window closes
pub fn run_overlay(image_path: &Path, config: &AnnotationConfig) -> SheetErrorResult<Vec<Annotation>> {
    let rgb = load_color(image_path)?;
    let size = canvas_size(&shape_of(&rgb), config.canvas_sizing)?;
    let (w, h) = (size.width as i32, size.height as i32);

    let app = app::App::default();
    let mut picture = FltkRgbImage::new(
        rgb.as_raw(),
        rgb.width() as i32,
        rgb.height() as i32,
        ColorDepth::Rgb8,
    )
    .map_err(|e| SheetError::GuiError(format!("cannot convert image: {:?}", e)))?;

    let mut wind = Window::default().with_size(w, h).with_label(&config.window_title);
    let mut frame = Frame::new(0, 0, w, h, None);

    let shapes: Rc<RefCell<Shapes>> = Rc::new(RefCell::new(BTreeMap::new()));
    let session = Rc::new(RefCell::new(AnnotationSession::new()));
    let [r, g, b] = config.outline_color;

    frame.draw({
        let shapes = shapes.clone();
        move |f| {
            let (pw, ph) = (picture.w(), picture.h());
            picture.draw(f.x(), f.y(), pw, ph);
            draw::set_draw_color(Color::from_rgb(r, g, b));
            for (from, to) in shapes.borrow().values() {
                let (x, y, rw, rh) = rect_bounds(*from, *to);
                draw::draw_rect(f.x() + x, f.y() + y, rw.max(1), rh.max(1));
            }
        }
    });

    frame.handle({
        let shapes = shapes.clone();
        let session = session.clone();
        let mut prompt = FltkCommentPrompt {
            title: config.prompt_title.clone(),
            message: config.prompt_message.clone(),
        };
        move |f, ev| {
            if app::event_button() != 1 {
                return false;
            }
            let (ex, ey) = app::event_coords();
            let at = Point::new(ex - f.x(), ey - f.y());
            let event = match ev {
                Event::Push => PointerEvent::Press(at),
                Event::Drag => PointerEvent::Motion(at),
                Event::Released => PointerEvent::Release(at),
                _ => return false,
            };

            let Ok(mut session) = session.try_borrow_mut() else {
                return false;
            };
            let commands = session.handle(event, &mut prompt);
            drop(session);

            apply_commands(&mut shapes.borrow_mut(), commands);
            f.redraw();
            true
        }
    });

    wind.end();
    wind.show();
    app.run()
        .map_err(|e| SheetError::GuiError(format!("event loop failed: {:?}", e)))?;

    let annotations = session.borrow().annotations().to_vec();
    info!(count = annotations.len(), "Annotation window closed");
    Ok(annotations)
}
