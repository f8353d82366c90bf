//! The configurator state: what is selected and which model it applies to.
//!
//! The UI never touches the model directly. Every user action goes through a
//! [`Configurator`] method, which updates the [`Selection`], runs the matching
//! mutator pass and marks the scene dirty so the host rebuilds its GPU state
//! on the next frame.

use crate::{
    config::Config,
    data_structures::{color::Color, material::Tiling, scene_graph::SceneNode},
    mutator::{self, Selection},
    resources::export::export_glb,
    upload::{Upload, UploadError, decode_upload},
};

/// An exported model, ready to be written to disk or downloaded.
#[derive(Clone, Debug)]
pub struct SavedDesign {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct Configurator {
    selection: Selection,
    tiling: Tiling,
    export_file_name: String,
    model: Option<Box<dyn SceneNode>>,
    dirty: bool,
}

impl Configurator {
    pub fn new(config: &Config) -> Self {
        Self {
            selection: Selection::new(config.default_color),
            tiling: config.tiling,
            export_file_name: config.export_file_name.clone(),
            model: None,
            dirty: true,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Take ownership of a loaded model and apply the current selection to it.
    ///
    /// Returns the model that was attached before, if any.
    pub fn attach_model(&mut self, mut root: Box<dyn SceneNode>) -> Option<Box<dyn SceneNode>> {
        mutator::apply_selection(Some(&mut root), &self.selection, &self.tiling);
        self.dirty = true;
        self.model.replace(root)
    }

    pub fn detach_model(&mut self) -> Option<Box<dyn SceneNode>> {
        self.dirty = true;
        self.model.take()
    }

    pub fn model_root(&self) -> Option<&dyn SceneNode> {
        self.model.as_deref()
    }

    /// Select a flat colour. Any selected texture is dropped.
    pub fn pick_color(&mut self, color: Color) {
        self.selection.color = color;
        self.selection.texture = None;
        mutator::apply_color(self.model.as_mut(), color);
        self.dirty = true;
    }

    /// Validate and decode `upload`, then map it onto the model.
    ///
    /// A rejected upload leaves the selection and the model untouched.
    pub fn upload_image(&mut self, upload: &Upload) -> Result<(), UploadError> {
        let texture = decode_upload(upload)?;
        mutator::apply_texture(
            self.model.as_mut(),
            &texture,
            self.selection.color,
            &self.tiling,
        );
        self.selection.texture = Some(texture);
        self.dirty = true;
        Ok(())
    }

    /// Export the current model as GLB. Without a model there is nothing to save.
    pub fn save_design(&self) -> anyhow::Result<Option<SavedDesign>> {
        let Some(root) = self.model_root() else {
            log::info!("No model loaded, nothing to save");
            return Ok(None);
        };
        let bytes = export_glb(root)?;
        Ok(Some(SavedDesign {
            file_name: self.export_file_name.clone(),
            bytes,
        }))
    }

    /// Whether anything visible changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
