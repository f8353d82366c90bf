//! Orbit camera, perspective projection and the camera uniform.
//!
//! The camera circles a target point. Dragging with the left mouse button
//! orbits, the wheel zooms. Rotation is damped: each frame applies a fraction
//! of the remaining velocity, so the view keeps gliding after the mouse is
//! released until the velocity decays.

use std::f32::consts::{FRAC_PI_2, PI};

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0001;
const MIN_DISTANCE: f32 = 0.01;
const REST_THRESHOLD: f32 = 1e-4;

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Point3<f32>,
    pub distance: f32,
    /// Angle around the up axis, zero looking down -z from +z.
    pub yaw: Rad<f32>,
    /// Elevation above the target's horizontal plane.
    pub pitch: Rad<f32>,
}

impl OrbitCamera {
    /// A camera at `position` looking at `target`.
    pub fn from_position(position: Point3<f32>, target: Point3<f32>) -> Self {
        let offset = position - target;
        let distance = offset.magnitude().max(MIN_DISTANCE);
        Self {
            target,
            distance,
            yaw: Rad(offset.x.atan2(offset.z)),
            pitch: Rad((offset.y / distance).clamp(-1.0, 1.0).asin()),
        }
    }

    pub fn eye(&self) -> Point3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        self.target
            + Vector3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.distance
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye(), self.target, Vector3::unit_y())
    }
}

#[derive(Debug, Clone)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Turns pointer input into damped orbit motion.
#[derive(Debug)]
pub struct OrbitController {
    rotate_speed: f32,
    zoom_speed: f32,
    damping: f32,
    viewport_height: f32,
    yaw_delta: f32,
    pitch_delta: f32,
    zoom_scale: f32,
    dragging: bool,
    cursor: Option<PhysicalPosition<f64>>,
}

impl OrbitController {
    pub fn new(rotate_speed: f32, zoom_speed: f32, damping: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            damping: damping.clamp(0.0, 1.0),
            viewport_height: 1.0,
            yaw_delta: 0.0,
            pitch_delta: 0.0,
            zoom_scale: 1.0,
            dragging: false,
            cursor: None,
        }
    }

    pub fn resize(&mut self, height: u32) {
        self.viewport_height = height.max(1) as f32;
    }

    /// Orbit by a pointer movement in pixels. A drag across the full
    /// viewport height turns the camera once around.
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        let per_pixel = 2.0 * PI / self.viewport_height * self.rotate_speed;
        self.yaw_delta -= dx as f32 * per_pixel;
        self.pitch_delta += dy as f32 * per_pixel;
    }

    /// Zoom by wheel ticks, positive values move closer.
    pub fn handle_scroll(&mut self, ticks: f32) {
        self.zoom_scale *= 0.95_f32.powf(ticks * self.zoom_speed);
    }

    /// Returns true if the event was consumed by the controller.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed;
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some(last)) = (self.dragging, self.cursor) {
                    self.handle_mouse(position.x - last.x, position.y - last.y);
                }
                self.cursor = Some(*position);
                self.dragging
            }
            WindowEvent::CursorLeft { .. } => {
                self.dragging = false;
                self.cursor = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let ticks = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                self.handle_scroll(ticks);
                true
            }
            _ => false,
        }
    }

    /// Advance the camera by one frame. Returns true while it is still moving.
    pub fn update(&mut self, camera: &mut OrbitCamera) -> bool {
        camera.yaw += Rad(self.yaw_delta * self.damping);
        camera.pitch += Rad(self.pitch_delta * self.damping);
        camera.pitch = Rad(camera.pitch.0.clamp(-SAFE_FRAC_PI_2, SAFE_FRAC_PI_2));
        camera.distance = (camera.distance * self.zoom_scale).max(MIN_DISTANCE);
        self.zoom_scale = 1.0;

        self.yaw_delta *= 1.0 - self.damping;
        self.pitch_delta *= 1.0 - self.damping;
        let moving = self.yaw_delta.abs() > REST_THRESHOLD || self.pitch_delta.abs() > REST_THRESHOLD;
        if !moving {
            self.yaw_delta = 0.0;
            self.pitch_delta = 0.0;
        }
        moving
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &OrbitCamera, projection: &Projection) {
        self.view_position = camera.eye().to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub camera: OrbitCamera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn eye_matches_starting_position() {
        let camera = OrbitCamera::from_position(Point3::new(2.0, 1.0, 0.0), Point3::new(0.0, 0.0, 0.0));
        let eye = camera.eye();
        assert!(close(eye.x, 2.0) && close(eye.y, 1.0) && close(eye.z, 0.0));
        assert!(close(camera.distance, 5.0_f32.sqrt()));
    }

    #[test]
    fn damping_applies_a_fraction_and_decays() {
        let mut camera = OrbitCamera::from_position(Point3::new(0.0, 0.0, 2.0), Point3::new(0.0, 0.0, 0.0));
        let mut controller = OrbitController::new(1.0, 1.0, 0.25);
        controller.resize(100);
        // a quarter of the viewport height to the left
        controller.handle_mouse(-25.0, 0.0);
        let total = PI / 2.0;

        assert!(controller.update(&mut camera));
        assert!(close(camera.yaw.0, total * 0.25));
        assert!(controller.update(&mut camera));
        assert!(close(camera.yaw.0, total * 0.25 + total * 0.75 * 0.25));

        let mut frames = 2;
        while controller.update(&mut camera) {
            frames += 1;
            assert!(frames < 100, "damping never settles");
        }
        assert!((camera.yaw.0 - total).abs() < 1e-3);
    }

    #[test]
    fn pitch_is_clamped_and_zoom_scales_distance() {
        let mut camera = OrbitCamera::from_position(Point3::new(0.0, 0.0, 2.0), Point3::new(0.0, 0.0, 0.0));
        let mut controller = OrbitController::new(1.0, 1.0, 1.0);
        controller.resize(10);
        controller.handle_mouse(0.0, 100.0);
        controller.handle_scroll(1.0);
        controller.update(&mut camera);
        assert!(camera.pitch.0 <= SAFE_FRAC_PI_2);
        assert!(close(camera.distance, 2.0 * 0.95));
    }
}
