//! The office scene context.
//!
//! [`Office`] owns everything the scene consists of on the CPU side: the scene
//! graph, camera, controls, interaction handler and the loader. It knows
//! nothing about windows or GPUs, so the whole lifecycle (setup, async loads
//! completing, frames, clicks, resizes) can be driven headless.
//!
//! Loads are started by [`Office::setup`], which returns their futures. Whoever
//! drives the office (the event loop, or a test) polls them and feeds each
//! [`LoadOutcome`] back through [`Office::on_loaded`].

use std::{collections::HashMap, sync::Arc, time::Duration};

use cgmath::Deg;
use winit::{event::MouseButton, keyboard::KeyCode};

use crate::{
    assets::{REGISTRY, RoomTextures},
    camera::{Camera, FirstPersonControls, Projection},
    config::OfficeConfig,
    data_structures::{
        material::TextureImage,
        scene_graph::{NodeId, Scene, SceneObject},
    },
    loader::{LoadOutcome, ModelLoader, PendingLoad},
    pick::InteractionHandler,
    resources::AssetSource,
    room::build_room,
};

/// Name of the group the walls and ceiling are parented to.
pub const ENCLOSURE_GROUP: &str = "room";

pub struct Office {
    scene: Scene,
    camera: Camera,
    projection: Projection,
    controls: FirstPersonControls,
    interaction: InteractionHandler,
    loader: ModelLoader,
    viewport: [u32; 2],
    setup_done: bool,
    disposed: bool,
}

impl Office {
    pub fn new(config: OfficeConfig, source: Arc<dyn AssetSource>, width: u32, height: u32) -> Self {
        let camera = Camera::new(
            config.camera_position,
            Deg(config.camera_yaw_deg),
            Deg(config.camera_pitch_deg),
        );
        let projection = Projection::new(width, height, Deg(config.fovy_deg), config.znear, config.zfar);
        let controls = FirstPersonControls::new(
            config.look_speed,
            config.movement_speed,
            config.look_vertical,
            width,
            height,
        );
        let interaction = InteractionHandler::new(config.highlight_colour);
        Self {
            scene: Scene::new(),
            camera,
            projection,
            controls,
            interaction,
            loader: ModelLoader::new(source),
            viewport: [width, height],
            setup_done: false,
            disposed: false,
        }
    }

    /// Builds the room and starts every load: one per room surface texture
    /// and one per registered model. Only the first call does anything.
    pub fn setup(&mut self) -> Vec<PendingLoad> {
        if self.setup_done {
            log::warn!("office setup called twice, ignoring");
            return Vec::new();
        }
        self.setup_done = true;

        let room = build_room(&RoomTextures::default());
        log::info!("building office room with {} surfaces", room.surface_count());
        let mut surfaces = HashMap::with_capacity(room.surface_count());
        surfaces.insert(room.floor.name.clone(), self.scene.add(room.floor, None));
        let enclosure = self.scene.add(SceneObject::group(ENCLOSURE_GROUP), None);
        for surface in room.enclosure {
            let name = surface.name.clone();
            surfaces.insert(name, self.scene.add(surface, Some(enclosure)));
        }

        let mut pending = Vec::with_capacity(room.textures.len() + REGISTRY.len());
        for request in room.textures {
            match surfaces.get(&request.surface) {
                Some(&target) => pending.push(self.loader.load_texture(target, request)),
                None => log::warn!("no room surface named {} for {}", request.surface, request.image),
            }
        }
        for entry in REGISTRY {
            pending.push(self.loader.load(entry));
        }
        pending
    }

    /// Applies a finished load. Failed loads are logged and leave the scene
    /// untouched. Returns the root of an inserted model.
    pub fn on_loaded(&mut self, outcome: LoadOutcome) -> Option<NodeId> {
        if self.disposed {
            return None;
        }
        match outcome {
            LoadOutcome::Model { entry, result } => match result {
                Ok(object) => {
                    let id = self.scene.add(object, None);
                    log::info!("model {} added to the scene", entry.name);
                    Some(id)
                }
                Err(e) => {
                    log::warn!("failed to load model {} ({}): {:#}", entry.name, entry.model, e);
                    None
                }
            },
            LoadOutcome::Texture {
                target,
                request,
                result,
            } => {
                match result {
                    Ok(image) => {
                        if !self.scene.set_texture(target, TextureImage::Decoded(image)) {
                            log::warn!("{} has no mesh for {}", request.surface, request.image);
                        }
                    }
                    Err(e) => log::warn!("failed to load texture {}: {:#}", request.image, e),
                }
                None
            }
        }
    }

    /// Advances the controls by `dt`.
    pub fn frame(&mut self, dt: Duration) {
        if self.disposed {
            return;
        }
        self.controls.update(&mut self.camera, dt);
    }

    pub fn on_pointer_moved(&mut self, x: f32, y: f32) {
        let [width, height] = self.viewport;
        self.controls.handle_pointer(x, y);
        self.interaction.pointer_moved(x, y, width as f32, height as f32);
    }

    pub fn on_key(&mut self, key: KeyCode, pressed: bool) -> bool {
        self.controls.handle_key(key, pressed)
    }

    /// Feeds a mouse button to the controls. Releasing the left button counts
    /// as a click; the highlighted node is returned.
    pub fn on_mouse_button(&mut self, button: MouseButton, pressed: bool) -> Option<NodeId> {
        self.controls.handle_mouse_button(button, pressed);
        if button == MouseButton::Left && !pressed {
            self.click()
        } else {
            None
        }
    }

    pub fn click(&mut self) -> Option<NodeId> {
        self.interaction
            .click(&mut self.scene, &self.camera, &self.projection)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = [width, height];
        self.projection.resize(width, height);
        self.controls.handle_resize(width, height);
    }

    /// Detaches input handling. Loads that complete afterwards are dropped.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.interaction.detach();
        log::info!("office disposed");
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn interaction(&self) -> &InteractionHandler {
        &self.interaction
    }

    pub fn viewport(&self) -> [u32; 2] {
        self.viewport
    }
}
