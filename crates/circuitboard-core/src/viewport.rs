//! Viewport module for pan/zoom transforms.

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum allowed zoom level.
pub const ZOOM_MIN: f64 = 0.5;
/// Maximum allowed zoom level.
pub const ZOOM_MAX: f64 = 2.0;
/// Increment used by the discrete zoom buttons.
pub const ZOOM_STEP: f64 = 0.1;

/// Viewport manages the view transform for the canvas.
///
/// It converts between screen (pointer) coordinates and scene coordinates:
/// `scene = screen / zoom - pan`, `screen = (scene + pan) * zoom`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    /// Current zoom level, clamped to `[ZOOM_MIN, ZOOM_MAX]`.
    pub zoom: f64,
    /// Current pan offset, in scene units.
    pub pan: Vec2,
    /// Measured viewport size in screen units, if known.
    ///
    /// `None` until the host has measured its surface; anchored zoom falls
    /// back to a plain zoom change in that case.
    #[serde(skip)]
    pub viewport_size: Option<Size>,
    /// Optional constraint rectangle for the pan offset.
    #[serde(skip)]
    pub pan_bounds: Option<Rect>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            viewport_size: None,
            pan_bounds: None,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a screen point to scene coordinates.
    pub fn to_scene(&self, screen: Point) -> Point {
        Point::new(
            screen.x / self.zoom - self.pan.x,
            screen.y / self.zoom - self.pan.y,
        )
    }

    /// Convert a scene point to screen coordinates.
    pub fn to_screen(&self, scene: Point) -> Point {
        Point::new(
            (scene.x + self.pan.x) * self.zoom,
            (scene.y + self.pan.y) * self.zoom,
        )
    }

    /// Record the measured viewport size.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_size = Some(Size::new(width, height));
    }

    /// Screen-space center of the viewport, if measured.
    pub fn screen_center(&self) -> Option<Point> {
        self.viewport_size
            .map(|size| Point::new(size.width / 2.0, size.height / 2.0))
    }

    /// Scene point currently under the viewport center, if measured.
    pub fn center_scene_point(&self) -> Option<Point> {
        self.screen_center().map(|c| self.to_scene(c))
    }

    /// Set the pan offset, clamped into `pan_bounds` when configured.
    pub fn set_pan(&mut self, pan: Vec2) {
        self.pan = match self.pan_bounds {
            Some(bounds) => Vec2::new(
                pan.x.clamp(bounds.x0, bounds.x1),
                pan.y.clamp(bounds.y0, bounds.y1),
            ),
            None => pan,
        };
    }

    /// Set the zoom level, keeping the scene point under the viewport center
    /// fixed. Values outside the zoom domain are clamped, never wrapped.
    ///
    /// Without a measured viewport size the zoom is applied without
    /// repositioning.
    pub fn set_zoom_anchored(&mut self, zoom: f64) {
        let zoom = zoom.clamp(ZOOM_MIN, ZOOM_MAX);
        let Some(center) = self.screen_center() else {
            self.zoom = zoom;
            return;
        };
        // Scene point under the center before the change
        let anchor = self.to_scene(center);
        self.zoom = zoom;
        // Solve for the pan that maps the anchor back to the same center
        self.set_pan(Vec2::new(
            center.x / zoom - anchor.x,
            center.y / zoom - anchor.y,
        ));
    }

    /// Zoom in one step, anchored on the viewport center.
    pub fn zoom_in(&mut self) {
        self.set_zoom_anchored(self.zoom + ZOOM_STEP);
    }

    /// Zoom out one step, anchored on the viewport center.
    pub fn zoom_out(&mut self) {
        self.set_zoom_anchored(self.zoom - ZOOM_STEP);
    }

    /// Frame a scene rectangle in the viewport with the given padding,
    /// zooming out as needed (never past the zoom domain).
    ///
    /// No-op without a measured viewport size or with a degenerate rect.
    pub fn frame_bounds(&mut self, bounds: Rect, padding: f64) {
        let Some(size) = self.viewport_size else {
            return;
        };
        if bounds.width() <= 0.0 && bounds.height() <= 0.0 {
            return;
        }

        let available = Size::new(
            (size.width - padding * 2.0).max(1.0),
            (size.height - padding * 2.0).max(1.0),
        );
        let scale_x = if bounds.width() > 0.0 {
            available.width / bounds.width()
        } else {
            ZOOM_MAX
        };
        let scale_y = if bounds.height() > 0.0 {
            available.height / bounds.height()
        } else {
            ZOOM_MAX
        };
        self.zoom = scale_x.min(scale_y).clamp(ZOOM_MIN, ZOOM_MAX);

        let center = bounds.center();
        self.set_pan(Vec2::new(
            size.width / 2.0 / self.zoom - center.x,
            size.height / 2.0 / self.zoom - center.y,
        ));
    }
}

/// RAII guard that restores the viewport's zoom and pan when dropped.
///
/// Collaborators that temporarily repurpose the viewport (image export
/// auto-framing) hold one of these across the transient state; the prior
/// values come back unconditionally, including on early return and panic.
#[derive(Debug)]
pub struct ViewportGuard<'a> {
    viewport: &'a mut Viewport,
    saved_zoom: f64,
    saved_pan: Vec2,
}

impl<'a> ViewportGuard<'a> {
    pub fn new(viewport: &'a mut Viewport) -> Self {
        let saved_zoom = viewport.zoom;
        let saved_pan = viewport.pan;
        Self {
            viewport,
            saved_zoom,
            saved_pan,
        }
    }
}

impl std::ops::Deref for ViewportGuard<'_> {
    type Target = Viewport;

    fn deref(&self) -> &Viewport {
        self.viewport
    }
}

impl std::ops::DerefMut for ViewportGuard<'_> {
    fn deref_mut(&mut self) -> &mut Viewport {
        self.viewport
    }
}

impl Drop for ViewportGuard<'_> {
    fn drop(&mut self) {
        self.viewport.zoom = self.saved_zoom;
        self.viewport.pan = self.saved_pan;
    }
}
