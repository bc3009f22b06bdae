use std::collections::HashSet;

use glam::Vec2;

use crate::camera::{Camera, CameraMovement};
use crate::config::CameraConfig;

/// Identifier for a physical keyboard key the demo reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Escape,
    Left,
    Right,
    Up,
    Down,
}

const MOVEMENT_KEYS: [(char, CameraMovement); 4] = [
    ('W', CameraMovement::Forward),
    ('S', CameraMovement::Backward),
    ('A', CameraMovement::Left),
    ('D', CameraMovement::Right),
];

/// Input gathered between frames and drained into the camera at frame start.
#[derive(Debug, Default)]
pub struct InputState {
    keys: HashSet<KeyCode>,
    last_cursor: Option<Vec2>,
    mouse_delta: Vec2,
    scroll: f32,
    close_requested: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&mut self, key: KeyCode) {
        if key == KeyCode::Named(NamedKey::Escape) {
            self.close_requested = true;
        }
        self.keys.insert(key);
    }

    pub fn set_key_up(&mut self, key: KeyCode) {
        self.keys.remove(&key);
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    /// Records an absolute cursor position. The first sample only seeds the
    /// reference point so the camera does not jump when the cursor enters.
    pub fn set_mouse_position(&mut self, position: Vec2) {
        if let Some(last) = self.last_cursor {
            // Screen y grows downward; looking up is a positive offset.
            self.mouse_delta += Vec2::new(position.x - last.x, last.y - position.y);
        }
        self.last_cursor = Some(position);
    }

    /// Relative motion from a captured cursor, already in look-offset orientation.
    pub fn add_mouse_motion(&mut self, delta: Vec2) {
        self.mouse_delta += delta;
    }

    pub fn add_scroll(&mut self, y_offset: f32) {
        self.scroll += y_offset;
    }

    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// Forgets held keys and the cursor anchor, e.g. after the window loses focus.
    pub fn reset(&mut self) {
        self.keys.clear();
        self.last_cursor = None;
    }

    /// Applies held keys and queued mouse/scroll input to `camera`.
    pub fn apply_to_camera(&mut self, camera: &mut Camera, elapsed: f32, settings: &CameraConfig) {
        let step = elapsed * settings.keyboard_time_scale;
        for (key, movement) in MOVEMENT_KEYS {
            if self.is_key_down(KeyCode::Character(key)) {
                camera.process_keyboard(movement, step);
            }
        }

        let look = settings.arrow_look_step;
        let arrows = [
            (NamedKey::Up, Vec2::new(0.0, look)),
            (NamedKey::Down, Vec2::new(0.0, -look)),
            (NamedKey::Right, Vec2::new(look, 0.0)),
            (NamedKey::Left, Vec2::new(-look, 0.0)),
        ];
        for (key, offset) in arrows {
            if self.is_key_down(KeyCode::Named(key)) {
                camera.process_mouse_movement(offset.x, offset.y);
            }
        }

        let delta = std::mem::take(&mut self.mouse_delta);
        if delta != Vec2::ZERO {
            camera.process_mouse_movement(delta.x, delta.y);
        }

        let scroll = std::mem::take(&mut self.scroll);
        if scroll != 0.0 {
            camera.process_mouse_scroll(scroll);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use glam::Vec3;

    fn settings() -> CameraConfig {
        AppConfig::default().camera
    }

    #[test]
    fn input_state_tracks_keys() {
        let mut state = InputState::new();
        state.set_key_down(KeyCode::Character('W'));
        assert!(state.is_key_down(KeyCode::Character('W')));
        state.set_key_up(KeyCode::Character('W'));
        assert!(!state.is_key_down(KeyCode::Character('W')));
    }

    #[test]
    fn escape_requests_close() {
        let mut state = InputState::new();
        assert!(!state.close_requested());
        state.set_key_down(KeyCode::Named(NamedKey::Escape));
        assert!(state.close_requested());
    }

    #[test]
    fn first_cursor_sample_does_not_move_camera() {
        let mut state = InputState::new();
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 3.0));
        let before = camera.view_matrix();
        state.set_mouse_position(Vec2::new(400.0, 300.0));
        state.apply_to_camera(&mut camera, 0.016, &settings());
        assert_eq!(camera.view_matrix(), before);
    }

    #[test]
    fn cursor_up_pitches_camera_up() {
        let mut state = InputState::new();
        let mut camera = Camera::default();
        state.set_mouse_position(Vec2::new(400.0, 300.0));
        state.set_mouse_position(Vec2::new(410.0, 250.0));
        state.apply_to_camera(&mut camera, 0.016, &settings());
        assert!((camera.pitch() - 5.0).abs() < 1e-4);
        assert!((camera.yaw() - (-89.0)).abs() < 1e-4);
    }

    #[test]
    fn queued_input_is_drained_once() {
        let mut state = InputState::new();
        let mut camera = Camera::default();
        state.add_scroll(3.0);
        state.apply_to_camera(&mut camera, 0.016, &settings());
        assert_eq!(camera.zoom(), 42.0);
        state.apply_to_camera(&mut camera, 0.016, &settings());
        assert_eq!(camera.zoom(), 42.0);
    }

    #[test]
    fn held_w_moves_at_scaled_speed() {
        let mut state = InputState::new();
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 3.0));
        state.set_key_down(KeyCode::Character('W'));
        state.apply_to_camera(&mut camera, 1.0, &settings());
        // speed 2.5 scaled by the 0.5 keyboard time scale
        assert!(camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, 1.75), 1e-5));
    }

    #[test]
    fn arrow_keys_turn_every_frame_they_are_held() {
        let mut state = InputState::new();
        let mut camera = Camera::default();
        state.set_key_down(KeyCode::Named(NamedKey::Right));
        state.apply_to_camera(&mut camera, 0.016, &settings());
        state.apply_to_camera(&mut camera, 0.016, &settings());
        assert!((camera.yaw() - (-84.0)).abs() < 1e-4);
    }
}
