//! Render surface collaborator
//!
//! Decoding and drawing documents happens outside this crate. A render
//! surface receives a reference, a starting page and three callback slots,
//! decodes asynchronously, and reports back through the slots.

/// Called once the document is decoded, with its page count
pub type LoadCallback = Box<dyn FnMut(u32) + Send>;

/// Called on every page turn with `(page, page_count)`
pub type PageChangeCallback = Box<dyn FnMut(u32, u32) + Send>;

/// Called when decoding or rendering fails
pub type ErrorCallback = Box<dyn FnMut(String) + Send>;

/// The three callback slots a surface reports through
pub struct RenderCallbacks {
    pub on_load: LoadCallback,
    pub on_page_change: PageChangeCallback,
    pub on_error: ErrorCallback,
}

impl RenderCallbacks {
    /// Callbacks that ignore every event
    pub fn noop() -> Self {
        Self {
            on_load: Box::new(|_| {}),
            on_page_change: Box::new(|_, _| {}),
            on_error: Box::new(|_| {}),
        }
    }
}

impl std::fmt::Debug for RenderCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderCallbacks").finish_non_exhaustive()
    }
}

/// Something that can decode and display a document
pub trait RenderSurface {
    /// Start decoding `reference`, opening at `start_page`
    ///
    /// Replaces whatever was loaded before. Events for the new document are
    /// reported through `callbacks`.
    fn load(&mut self, reference: &str, start_page: u32, callbacks: RenderCallbacks);

    /// Show a specific zero-based page
    fn jump_to(&mut self, page: u32);

    /// Release the loaded document
    fn recycle(&mut self);
}

/// Events a render surface reports, as seen by the session controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    Loaded { page_count: u32 },
    PageChanged { page: u32, page_count: u32 },
    Failed { message: String },
}
