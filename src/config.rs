//! Scene configuration.
//!
//! Every constant the office scene is tuned with lives in [`OfficeConfig`]. The
//! defaults reproduce the hand-authored scene; callers that want a different
//! start position or colours adjust the fields before handing the config to
//! [`crate::flow::run`].

use crate::data_structures::material::Rgb;

#[derive(Clone, Debug)]
pub struct OfficeConfig {
    /// Vertical field of view in degrees.
    pub fovy_deg: f32,
    pub znear: f32,
    pub zfar: f32,
    pub camera_position: [f32; 3],
    /// Horizontal orientation in degrees; -90 looks down the negative Z axis.
    pub camera_yaw_deg: f32,
    pub camera_pitch_deg: f32,
    /// Degrees per second per pixel of pointer offset from the viewport centre.
    pub look_speed: f32,
    /// World units per second.
    pub movement_speed: f32,
    pub look_vertical: bool,
    pub clear_colour: Rgb,
    pub ambient_colour: Rgb,
    pub highlight_colour: Rgb,
    /// Length of the X/Y/Z axes helper, `None` disables it.
    pub axes_length: Option<f32>,
    /// Directory (native) or URL path segment (web) the assets are served from.
    pub asset_root: String,
}

impl Default for OfficeConfig {
    fn default() -> Self {
        Self {
            fovy_deg: 60.0,
            znear: 0.1,
            zfar: 1500.0,
            camera_position: [10.0, 70.0, 10.0],
            camera_yaw_deg: -90.0,
            camera_pitch_deg: 0.0,
            look_speed: 0.14,
            movement_speed: 140.0,
            look_vertical: false,
            clear_colour: Rgb::from_hex(0xcce0ff),
            ambient_colour: Rgb::from_hex(0xcccccc),
            highlight_colour: Rgb::from_hex(0xff0000),
            axes_length: Some(1000.0),
            asset_root: "assets".to_string(),
        }
    }
}
