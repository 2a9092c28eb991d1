//! Pending-creation form state: the title being typed and the staged image.

use crate::ImageRef;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreationForm {
    open: bool,
    title: String,
    staged_image: Option<ImageRef>,
}

impl CreationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Raw input; trimming happens when the planet is saved.
    pub fn set_title<S: Into<String>>(&mut self, title: S) {
        self.title = title.into();
    }

    pub fn staged_image(&self) -> Option<&ImageRef> {
        self.staged_image.as_ref()
    }

    pub fn stage_image(&mut self, image: ImageRef) {
        self.staged_image = Some(image);
    }

    /// Reset both fields and close the form.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
