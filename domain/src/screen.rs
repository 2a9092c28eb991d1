//! Presentation model for the single planet screen.
//!
//! `PlanetScreen` owns the store, the image picker and the creation form and
//! turns recoverable failures into user-facing [`Notice`]s. A rendering layer
//! only needs to draw `planets()`, `form()` and whatever `take_notices()`
//! returns.

use tracing::{debug, info, warn};

use crate::form::CreationForm;
use crate::store::{LoadOutcome, PlanetListStore};
use crate::{
    CoreError, IdGenerator, ImagePicker, ImageRef, KeyValueStore, Permission, PickOutcome,
    PlanetId, PlanetRecord,
};

/// Advisory shown to the user, e.g. as an alert dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub heading: String,
    pub body: String,
}

impl Notice {
    fn new(heading: &str, body: &str) -> Self {
        Self {
            heading: heading.to_string(),
            body: body.to_string(),
        }
    }

    pub fn permission_needed() -> Self {
        Self::new(
            "Permission needed",
            "Please allow access to photos to add planet images.",
        )
    }

    pub fn enter_title() -> Self {
        Self::new("Enter a title", "Please enter a title for the planet.")
    }
}

pub struct PlanetScreen<S: KeyValueStore, G: IdGenerator, P: ImagePicker> {
    store: PlanetListStore<S, G>,
    picker: P,
    form: CreationForm,
    notices: Vec<Notice>,
    started: bool,
}

impl<S: KeyValueStore, G: IdGenerator, P: ImagePicker> PlanetScreen<S, G, P> {
    pub fn new(store: PlanetListStore<S, G>, picker: P) -> Self {
        Self {
            store,
            picker,
            form: CreationForm::new(),
            notices: Vec::new(),
            started: false,
        }
    }

    /// Ask for media access once, then load the saved planets.
    ///
    /// Subsequent calls are no-ops and return `None`.
    pub fn start(&mut self) -> Option<LoadOutcome> {
        if self.started {
            return None;
        }
        self.started = true;
        match self.picker.request_permission() {
            Ok(Permission::Granted) => {}
            Ok(Permission::Denied) => {
                info!("media library permission denied");
                self.notices.push(Notice::permission_needed());
            }
            Err(e) => warn!(error = %e, "media permission request failed"),
        }
        Some(self.store.initialize())
    }

    pub fn planets(&self) -> &[PlanetRecord] {
        self.store.planets()
    }

    pub fn form(&self) -> &CreationForm {
        &self.form
    }

    /// Drain pending notices in the order they were raised.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn open_form(&mut self) {
        self.form.open();
    }

    pub fn set_title<T: Into<String>>(&mut self, title: T) {
        self.form.set_title(title);
    }

    /// Present the picker and stage the first selected image.
    ///
    /// Cancellation, an empty selection and picker errors all leave the
    /// currently staged image in place. Returns the newly staged image.
    pub fn request_image_selection(&mut self) -> Option<ImageRef> {
        match self.picker.pick_image() {
            Ok(PickOutcome::Selected(assets)) => {
                let first = assets.into_iter().next()?;
                self.form.stage_image(first.clone());
                Some(first)
            }
            Ok(PickOutcome::Cancelled) => None,
            Err(e) => {
                warn!(error = %e, "image picker error");
                None
            }
        }
    }

    /// Commit the form as a new planet.
    ///
    /// Does nothing unless the form is open. A blank title raises the
    /// "Enter a title" notice and leaves the form untouched. On success the
    /// form is cleared and closed.
    pub fn save(&mut self) -> Result<Option<PlanetRecord>, CoreError> {
        if !self.form.is_open() {
            debug!("save without an open form ignored");
            return Ok(None);
        }
        let image = self.form.staged_image().cloned();
        match self.store.add_planet(self.form.title(), image) {
            Ok(record) => {
                self.form.clear();
                Ok(Some(record))
            }
            Err(CoreError::EmptyTitle) => {
                self.notices.push(Notice::enter_title());
                Ok(None)
            }
            Err(e @ CoreError::StorageWrite(_)) => {
                // Strict persistence: the planet is already in the list.
                self.form.clear();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Discard the pending title and image and close the form.
    pub fn cancel(&mut self) {
        self.form.clear();
    }

    pub fn delete(&mut self, id: &PlanetId) -> Result<bool, CoreError> {
        self.store.delete_planet(id)
    }

    /// Rewrite the list if an earlier write was lost.
    pub fn flush(&mut self) -> Result<(), CoreError> {
        if !self.store.has_unsaved_changes() {
            return Ok(());
        }
        self.store.flush()
    }
}
