use anyhow::Context;
use macroquad::prelude::*;
use macroquad_tileset_editor::{
    draw_tileset_view, load_tileset_from_file, GridGeometry, InteractionController,
    KeyCode as EditorKey, ModelEvent, Modifiers, PointerButton, TilesetDocument, TilesetModel,
    TilesetTextures, ViewOptions,
};
use std::path::Path;

fn window_conf() -> Conf {
    Conf {
        window_title: "Tileset View".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

const ZOOM_STEP: f32 = 1.25;

struct App {
    doc: TilesetDocument,
    model: TilesetModel,
    controller: InteractionController,
    options: ViewOptions,
    textures: TilesetTextures,
    scroll: Vec2,
}

impl App {
    /// Feeds document changes to the model and drains its events. The whole
    /// view is redrawn every frame, so events are only logged.
    fn sync(&mut self) {
        let changes = self.doc.take_changes();
        self.model.document_changed(self.doc.tileset(), &changes);
        for event in self.model.take_events() {
            match event {
                ModelEvent::Reset => log::debug!("View reset"),
                ModelEvent::RegionChanged { top_left, bottom_right } => {
                    log::debug!("Repaint {:?}..={:?}", top_left, bottom_right)
                }
            }
        }
    }

    fn handle_keys(&mut self) {
        let modifiers = Modifiers {
            shift: is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift),
            ctrl: is_key_down(KeyCode::LeftControl) || is_key_down(KeyCode::RightControl),
        };

        if modifiers.ctrl && is_key_pressed(KeyCode::Z) {
            self.doc.undo();
            return;
        }
        if modifiers.ctrl && is_key_pressed(KeyCode::Y) {
            self.doc.redo();
            return;
        }
        if is_key_pressed(KeyCode::R) {
            let enabled = !self.controller.is_relocating();
            self.controller.set_relocating(&mut self.model, enabled);
        }
        if is_key_pressed(KeyCode::W) {
            let enabled = !self.controller.is_editing_wang_set();
            self.controller.set_edit_wang_set(enabled);
            if self.controller.wang_set().is_none() && !self.doc.tileset().wang_sets.is_empty() {
                self.controller.set_wang_set(Some(0));
            }
        }
        if is_key_pressed(KeyCode::G) {
            self.options.draw_grid = !self.options.draw_grid;
        }
        for (key, editor_key) in [
            (KeyCode::Z, EditorKey::Z),
            (KeyCode::X, EditorKey::X),
            (KeyCode::Y, EditorKey::Y),
            (KeyCode::Space, EditorKey::Space),
        ] {
            if is_key_pressed(key) {
                self.controller.key_pressed(editor_key, modifiers);
            }
        }
    }

    fn handle_wheel(&mut self) {
        let (_, wheel_y) = mouse_wheel();
        if wheel_y == 0.0 {
            return;
        }
        let ctrl = is_key_down(KeyCode::LeftControl) || is_key_down(KeyCode::RightControl);
        if self.options.wheel_zooms(self.doc.tileset().kind, ctrl) {
            let factor = if wheel_y > 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
            self.options.set_scale(self.options.scale * factor);
        } else {
            self.scroll.y = (self.scroll.y + wheel_y.signum() * 32.0).min(0.0);
        }
    }

    fn handle_pointer(&mut self, geometry: &GridGeometry) -> anyhow::Result<()> {
        let point = Vec2::from(mouse_position());
        let buttons = [
            (MouseButton::Left, PointerButton::Left),
            (MouseButton::Right, PointerButton::Right),
            (MouseButton::Middle, PointerButton::Middle),
        ];

        for (mouse, button) in buttons {
            if is_mouse_button_pressed(mouse) {
                let event = geometry.pointer_event(point, Some(button));
                self.controller.pointer_pressed(&self.model, event, &mut self.doc)?;
            }
        }

        let held = is_mouse_button_down(MouseButton::Left).then_some(PointerButton::Left);
        let event = geometry.pointer_event(point, held);
        if event.cell.is_some() {
            self.controller.pointer_moved(&self.model, event, &mut self.doc)?;
        } else {
            self.controller.pointer_left();
        }

        for (mouse, button) in buttons {
            if is_mouse_button_released(mouse) {
                let event = geometry.pointer_event(point, Some(button));
                self.controller.pointer_released(&self.model, event, &mut self.doc)?;
            }
        }
        Ok(())
    }
}

async fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let tileset_path = args.get(1).map(String::as_str).unwrap_or("assets/tileset.json");
    let options = match args.get(2) {
        Some(path) => ViewOptions::load_from_file(path).with_context(|| format!("Loading view options {}", path))?,
        None => ViewOptions::default(),
    };

    let tileset = load_tileset_from_file(tileset_path)
        .with_context(|| format!("Loading tileset {}", tileset_path))?;
    let base_dir = Path::new(tileset_path)
        .parent()
        .unwrap_or_else(|| Path::new("./"));
    let textures = TilesetTextures::load(&tileset, base_dir).await?;

    let model = TilesetModel::new(&tileset);
    let mut app = App {
        doc: TilesetDocument::new(tileset),
        model,
        controller: InteractionController::new(),
        options,
        textures,
        scroll: Vec2::ZERO,
    };

    loop {
        clear_background(DARKGRAY);

        app.options.refresh_column_count(&mut app.model, screen_width());
        let geometry = GridGeometry::new(app.scroll, &app.options, &app.model);

        app.handle_keys();
        app.handle_wheel();
        if let Err(err) = app.handle_pointer(&geometry) {
            log::warn!("Edit rejected: {}", err);
        }
        app.sync();

        let geometry = GridGeometry::new(app.scroll, &app.options, &app.model);
        draw_tileset_view(
            &app.model,
            &geometry,
            &app.options,
            &app.textures,
            &app.controller,
            Vec2::ZERO,
            vec2(screen_width(), screen_height()),
        );

        let status = format!(
            "relocate [R]: {}  wang [W]: {}  undo: {}",
            app.controller.is_relocating(),
            app.controller.is_editing_wang_set(),
            app.doc.undo_text().unwrap_or("-"),
        );
        draw_text(&status, 10.0, screen_height() - 12.0, 22.0, WHITE);

        next_frame().await;
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("tileset_view: {:#}", err);
        std::process::exit(1);
    }
}
