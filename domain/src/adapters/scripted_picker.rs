use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::{CoreError, ImagePicker, Permission, PickOutcome};

/// Image picker that replays queued answers. Once the queue is empty every
/// pick is reported as cancelled.
#[derive(Clone)]
pub struct ScriptedPicker {
    permission: Arc<Mutex<Result<Permission, String>>>,
    picks: Arc<Mutex<VecDeque<Result<PickOutcome, String>>>>,
    permission_requests: Arc<Mutex<u32>>,
}

impl ScriptedPicker {
    pub fn new(permission: Permission) -> Self {
        Self {
            permission: Arc::new(Mutex::new(Ok(permission))),
            picks: Arc::new(Mutex::new(VecDeque::new())),
            permission_requests: Arc::new(Mutex::new(0)),
        }
    }

    /// A picker whose permission request itself fails.
    pub fn broken_permission(message: &str) -> Self {
        let picker = Self::new(Permission::Denied);
        if let Ok(mut p) = picker.permission.lock() {
            *p = Err(message.to_string());
        }
        picker
    }

    pub fn push_pick(&self, outcome: PickOutcome) {
        if let Ok(mut q) = self.picks.lock() {
            q.push_back(Ok(outcome));
        }
    }

    pub fn push_error(&self, message: &str) {
        if let Ok(mut q) = self.picks.lock() {
            q.push_back(Err(message.to_string()));
        }
    }

    pub fn permission_requests(&self) -> u32 {
        self.permission_requests.lock().map(|n| *n).unwrap_or(0)
    }
}

impl ImagePicker for ScriptedPicker {
    fn request_permission(&self) -> Result<Permission, CoreError> {
        let mut n = self
            .permission_requests
            .lock()
            .map_err(|_| CoreError::ImagePicker("mutex poisoned".into()))?;
        *n += 1;
        let answer = self
            .permission
            .lock()
            .map_err(|_| CoreError::ImagePicker("mutex poisoned".into()))?;
        answer.clone().map_err(CoreError::ImagePicker)
    }

    fn pick_image(&self) -> Result<PickOutcome, CoreError> {
        let mut q = self
            .picks
            .lock()
            .map_err(|_| CoreError::ImagePicker("mutex poisoned".into()))?;
        match q.pop_front() {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(msg)) => Err(CoreError::ImagePicker(msg)),
            None => Ok(PickOutcome::Cancelled),
        }
    }
}
