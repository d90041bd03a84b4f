use forkstar_bus::Observable;

/// Session-wide UI flags shared by navigation and pointer widgets.
///
/// Cloning shares the underlying stores; hand a clone to every consumer
/// instead of reaching for a global.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Set by navigation-initiating actions, read by the loading indicator.
    pub loading: Observable<bool>,
    /// Set while the pointer is over an interactive element.
    pub hovered: Observable<bool>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_loading(&self, value: bool) {
        self.loading.set(value);
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn set_hovered(&self, value: bool) {
        self.hovered.set(value);
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered.get()
    }
}
