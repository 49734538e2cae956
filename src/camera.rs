//! Perspective camera and first-person controls.
//!
//! The camera is described by a position and yaw/pitch angles. Looking is
//! driven by the pointer's offset from the viewport centre: the further the
//! pointer sits from the centre, the faster the view turns. Movement follows
//! the camera's local axes and is scaled by the frame time, so behaviour is
//! independent of the frame rate.

use std::time::Duration;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use winit::{event::MouseButton, keyboard::KeyCode};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const MAX_PITCH: Rad<f32> = Rad(85.0 * std::f32::consts::PI / 180.0);

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    /// Unit view direction. Yaw -90° with zero pitch looks down -Z.
    pub fn forward(&self) -> Vector3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.forward().cross(Vector3::unit_y()).normalize()
    }

    pub fn up(&self) -> Vector3<f32> {
        self.right().cross(self.forward()).normalize()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), Vector3::unit_y())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Pointer-look, keyboard-and-mouse-move controls.
///
/// Keys: W/Up forward, S/Down back, A/Left and D/Right strafe, R up, F down.
/// Holding the left mouse button moves forward, the right one moves back.
#[derive(Debug, Clone)]
pub struct FirstPersonControls {
    /// Degrees per second per pixel of pointer offset.
    pub look_speed: f32,
    /// World units per second.
    pub movement_speed: f32,
    pub look_vertical: bool,
    half_width: f32,
    half_height: f32,
    /// Pointer offset from the viewport centre, in pixels. Zero until the
    /// pointer first moves.
    pointer: [f32; 2],
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
    mouse_forward: bool,
    mouse_backward: bool,
}

impl FirstPersonControls {
    pub fn new(look_speed: f32, movement_speed: f32, look_vertical: bool, width: u32, height: u32) -> Self {
        Self {
            look_speed,
            movement_speed,
            look_vertical,
            half_width: width as f32 / 2.0,
            half_height: height as f32 / 2.0,
            pointer: [0.0, 0.0],
            forward: false,
            backward: false,
            left: false,
            right: false,
            up: false,
            down: false,
            mouse_forward: false,
            mouse_backward: false,
        }
    }

    /// Returns `true` if the key is one the controls react to.
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) -> bool {
        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => self.forward = pressed,
            KeyCode::KeyS | KeyCode::ArrowDown => self.backward = pressed,
            KeyCode::KeyA | KeyCode::ArrowLeft => self.left = pressed,
            KeyCode::KeyD | KeyCode::ArrowRight => self.right = pressed,
            KeyCode::KeyR => self.up = pressed,
            KeyCode::KeyF => self.down = pressed,
            _ => return false,
        }
        true
    }

    pub fn handle_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        match button {
            MouseButton::Left => self.mouse_forward = pressed,
            MouseButton::Right => self.mouse_backward = pressed,
            _ => {}
        }
    }

    /// Records the pointer position in viewport pixels.
    pub fn handle_pointer(&mut self, x: f32, y: f32) {
        self.pointer = [x - self.half_width, y - self.half_height];
    }

    pub fn handle_resize(&mut self, width: u32, height: u32) {
        self.half_width = width as f32 / 2.0;
        self.half_height = height as f32 / 2.0;
    }

    pub fn is_moving(&self) -> bool {
        self.forward
            || self.backward
            || self.left
            || self.right
            || self.up
            || self.down
            || self.mouse_forward
            || self.mouse_backward
    }

    pub fn update(&self, camera: &mut Camera, dt: Duration) {
        let dt = dt.as_secs_f32();

        let distance = self.movement_speed * dt;
        let axis = |positive: bool, negative: bool| (positive as i8 - negative as i8) as f32;
        let forward = axis(self.forward || self.mouse_forward, self.backward || self.mouse_backward);
        let sideways = axis(self.right, self.left);
        let vertical = axis(self.up, self.down);
        if forward != 0.0 || sideways != 0.0 || vertical != 0.0 {
            camera.position += camera.forward() * forward * distance
                + camera.right() * sideways * distance
                + camera.up() * vertical * distance;
        }

        let look = self.look_speed * dt;
        camera.yaw += Rad::from(cgmath::Deg(self.pointer[0] * look));
        if self.look_vertical {
            camera.pitch -= Rad::from(cgmath::Deg(self.pointer[1] * look));
            if camera.pitch < -MAX_PITCH {
                camera.pitch = -MAX_PITCH;
            } else if camera.pitch > MAX_PITCH {
                camera.pitch = MAX_PITCH;
            }
        }
    }
}
