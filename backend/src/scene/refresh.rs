//! Scoped viewport-refresh suspension
//!
//! Every build phase runs with viewport refresh suspended. [`RefreshGuard`]
//! suspends on creation and restores the previous state when dropped, so the
//! state is restored on early returns and `?` propagation alike. Guards nest:
//! an inner guard restores "suspended" and leaves the outer one in charge.

use super::SceneBackend;
use std::ops::{Deref, DerefMut};

/// RAII guard that keeps refresh suspended while alive
///
/// Derefs to the wrapped backend so phase code works through the guard.
///
/// # Example
/// ```rust
/// use rig_framework_core_rs::scene::{MemoryScene, RefreshGuard, SceneBackend};
///
/// let mut scene = MemoryScene::new();
/// {
///     let guard = RefreshGuard::new(&mut scene);
///     assert!(guard.is_refresh_suspended());
/// }
/// assert!(!scene.is_refresh_suspended());
/// ```
pub struct RefreshGuard<'a> {
    scene: &'a mut dyn SceneBackend,
    previous: bool,
}

impl<'a> RefreshGuard<'a> {
    pub fn new(scene: &'a mut dyn SceneBackend) -> Self {
        let previous = scene.is_refresh_suspended();
        scene.suspend_refresh(true);
        Self { scene, previous }
    }
}

impl<'a> Deref for RefreshGuard<'a> {
    type Target = dyn SceneBackend + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.scene
    }
}

impl<'a> DerefMut for RefreshGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.scene
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.scene.suspend_refresh(self.previous);
    }
}
