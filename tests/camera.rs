use approx::assert_relative_eq;
use glam::{Mat4, Vec3};

use pet_sims::camera::{MAX_ZOOM, MIN_ZOOM, PITCH_LIMIT};
use pet_sims::{Camera, CameraMovement};

#[test]
fn pitch_stays_bounded_for_any_mouse_sequence() {
    let mut camera = Camera::default();
    let offsets = [500.0, 2000.0, -10.0, -4000.0, 3.5, 9999.0, -0.25, -1200.0];
    for (i, y) in offsets.into_iter().enumerate() {
        camera.process_mouse_movement(i as f32 * 13.0, y);
        assert!(camera.pitch() <= PITCH_LIMIT && camera.pitch() >= -PITCH_LIMIT);
        assert_relative_eq!(camera.front().length(), 1.0, epsilon = 1e-5);
    }
}

#[test]
fn zoom_stays_bounded_for_any_scroll_sequence() {
    let mut camera = Camera::default();
    for y in [10.0, 50.0, -3.0, -100.0, 0.5, 44.0, -44.0, 7.0] {
        camera.process_mouse_scroll(y);
        assert!((MIN_ZOOM..=MAX_ZOOM).contains(&camera.zoom()));
    }
    camera.process_mouse_scroll(1000.0);
    assert_eq!(camera.zoom(), MIN_ZOOM);
}

#[test]
fn zero_mouse_offset_keeps_the_view() {
    let mut camera = Camera::new(Vec3::new(1.0, 2.0, 3.0));
    camera.process_mouse_movement(25.0, -10.0);
    let before = camera.view_matrix();
    camera.process_mouse_movement(0.0, 0.0);
    assert_eq!(camera.view_matrix(), before);
}

#[test]
fn forward_then_backward_returns_to_start() {
    let start = Vec3::new(0.3, -1.0, 3.0);
    let mut camera = Camera::new(start);
    camera.process_mouse_movement(120.0, 45.0);
    camera.process_keyboard(CameraMovement::Forward, 0.7);
    camera.process_keyboard(CameraMovement::Backward, 0.7);
    assert!(camera.position.abs_diff_eq(start, 1e-5));
}

#[test]
fn strafing_left_then_right_returns_to_start() {
    let start = Vec3::new(0.0, 0.0, 3.0);
    let mut camera = Camera::new(start);
    camera.process_keyboard(CameraMovement::Left, 0.4);
    assert!(camera.position.x < 0.0);
    camera.process_keyboard(CameraMovement::Right, 0.4);
    assert!(camera.position.abs_diff_eq(start, 1e-5));
}

#[test]
fn origin_camera_looking_down_negative_z_is_identity() {
    let camera = Camera::new(Vec3::ZERO);
    assert!(camera.view_matrix().abs_diff_eq(Mat4::IDENTITY, 1e-6));
}

#[test]
fn one_second_forward_moves_by_speed() {
    let mut camera = Camera::new(Vec3::new(0.0, 0.0, 3.0));
    let speed = camera.movement_speed;
    camera.process_keyboard(CameraMovement::Forward, 1.0);
    assert_relative_eq!(camera.position.x, 0.0, epsilon = 1e-5);
    assert_relative_eq!(camera.position.y, 0.0, epsilon = 1e-5);
    assert_relative_eq!(camera.position.z, 3.0 - speed, epsilon = 1e-5);
}

#[test]
fn skybox_view_ignores_camera_position() {
    let mut near = Camera::new(Vec3::ZERO);
    let mut far = Camera::new(Vec3::new(40.0, -7.0, 12.0));
    near.process_mouse_movement(80.0, 30.0);
    far.process_mouse_movement(80.0, 30.0);
    let sky = far.skybox_view_matrix();
    assert_eq!(sky.w_axis, glam::Vec4::W);
    assert!(sky.abs_diff_eq(near.skybox_view_matrix(), 1e-6));
}

#[test]
fn projection_uses_zoom_as_vertical_fov() {
    let mut camera = Camera::default();
    let wide = camera.projection_matrix(4.0 / 3.0, 1.1, 100.0);
    camera.process_mouse_scroll(20.0);
    let narrow = camera.projection_matrix(4.0 / 3.0, 1.1, 100.0);
    // y scale is cot(fov / 2)
    assert_relative_eq!(wide.y_axis.y, 1.0 / 22.5f32.to_radians().tan(), epsilon = 1e-5);
    assert!(narrow.y_axis.y > wide.y_axis.y);
}
