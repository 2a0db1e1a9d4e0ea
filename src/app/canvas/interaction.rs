use eframe::egui::{self, Pos2, Rect, Ui, Vec2};

use super::super::render_utils::{screen_to_world, world_to_chart};
use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn handle_chart_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !self.settings.enable_zoom || !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        self.zoom_about(rect, pointer, scroll);
    }

    /// Scales the view so the chart point under `pointer` stays put.
    fn zoom_about(&mut self, rect: Rect, pointer: Pos2, scroll: f32) {
        if !self.settings.enable_zoom || scroll.abs() <= f32::EPSILON {
            return;
        }

        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.1, 10.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    pub(in crate::app) fn handle_chart_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan_by(response.drag_delta());
        }
    }

    fn pan_by(&mut self, delta: Vec2) {
        if self.settings.enable_zoom {
            self.pan += delta;
        }
    }

    pub(in crate::app) fn reset_view(&mut self) {
        self.pan = Vec2::ZERO;
        self.zoom = 1.0;
    }

    /// Leaf under `pointer`, in frame circle indices.
    pub(in crate::app) fn hovered_leaf(&self, rect: Rect, pointer: Option<Pos2>) -> Option<usize> {
        let pointer = pointer.filter(|pointer| rect.contains(*pointer))?;
        let frame = self.frame.as_ref()?;
        let world = screen_to_world(rect, self.pan, self.zoom, pointer);
        frame.hit_test(world_to_chart(rect, world))
    }

    pub(in crate::app) fn apply_chart_click(&mut self, index: usize) {
        let Some(frame) = self.frame.as_ref() else {
            return;
        };
        if self.chart.click(frame, index, &mut self.engine) {
            self.dirty = true;
        }
    }
}
