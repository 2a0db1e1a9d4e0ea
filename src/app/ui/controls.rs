use std::ops::RangeInclusive;

use eframe::egui::{self, Ui};

use bubblepack::chart::palette::Palette;
use bubblepack::chart::settings::{ColorMode, LegendPosition, parse_string_map};

use super::super::ViewModel;

fn slider(
    ui: &mut Ui,
    value: &mut f32,
    range: RangeInclusive<f32>,
    text: &str,
    hover: &str,
) -> bool {
    ui.add(
        egui::Slider::new(value, range)
            .text(text)
            .clamping(egui::SliderClamping::Always),
    )
    .on_hover_text(hover)
    .changed()
}

fn color_field(ui: &mut Ui, value: &mut String, text: &str) -> bool {
    ui.horizontal(|ui| {
        ui.label(text);
        ui.add(egui::TextEdit::singleline(value).desired_width(90.0))
            .on_hover_text("Hex (#rrggbb) or rgba() color.")
            .changed()
    })
    .inner
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Chart Settings");
        ui.separator();
        ui.add_space(4.0);

        let mut changed = false;
        let settings = &mut self.settings;

        ui.collapsing("Bubble sizes", |ui| {
            changed |= ui
                .add(egui::Slider::new(&mut settings.max_bubbles, 1..=500).text("Max bubbles"))
                .on_hover_text("Rows past this count are left out, in input order.")
                .changed();
            changed |= slider(
                ui,
                &mut settings.packing_density,
                0.0..=20.0,
                "Padding",
                "Gap between packed circles.",
            );
            changed |= slider(
                ui,
                &mut settings.min_bubble_size,
                1.0..=200.0,
                "Min radius",
                "Radius given to the smallest value.",
            );
            changed |= slider(
                ui,
                &mut settings.max_bubble_size,
                1.0..=300.0,
                "Max radius",
                "Radius given to the largest value.",
            );
        });

        ui.collapsing("Bubble style", |ui| {
            changed |= slider(
                ui,
                &mut settings.bubble_opacity,
                0.0..=1.0,
                "Opacity",
                "Fill opacity of item bubbles.",
            );
            changed |= slider(
                ui,
                &mut settings.stroke_width,
                0.0..=10.0,
                "Border width",
                "Item bubble border width.",
            );
            changed |= color_field(ui, &mut settings.border_color, "Border color");
            changed |= slider(
                ui,
                &mut settings.border_opacity,
                0.0..=1.0,
                "Border opacity",
                "Item bubble border opacity.",
            );
            changed |= color_field(ui, &mut settings.background_color, "Background");
            changed |= ui
                .checkbox(&mut settings.enable_hover_effect, "Hover effect")
                .on_hover_text("Grow and outline the bubble under the pointer.")
                .changed();
            ui.add_enabled_ui(settings.enable_hover_effect, |ui| {
                changed |= slider(
                    ui,
                    &mut settings.hover_opacity,
                    0.0..=1.0,
                    "Hover opacity",
                    "Fill opacity while hovered.",
                );
            });
            changed |= ui.checkbox(&mut settings.enable_shadow, "Drop shadow").changed();
            ui.add_enabled_ui(settings.enable_shadow, |ui| {
                changed |= slider(
                    ui,
                    &mut settings.shadow_blur,
                    0.0..=30.0,
                    "Blur",
                    "Shadow softness.",
                );
                changed |= slider(
                    ui,
                    &mut settings.shadow_offset_x,
                    -20.0..=20.0,
                    "Offset X",
                    "Horizontal shadow offset.",
                );
                changed |= slider(
                    ui,
                    &mut settings.shadow_offset_y,
                    -20.0..=20.0,
                    "Offset Y",
                    "Vertical shadow offset.",
                );
            });
        });

        ui.collapsing("Colors", |ui| {
            ui.horizontal_wrapped(|ui| {
                for mode in ColorMode::ALL {
                    changed |= ui
                        .selectable_value(&mut settings.color_mode, mode, mode.name())
                        .changed();
                }
            });

            match settings.color_mode {
                ColorMode::Auto => {
                    egui::ComboBox::from_label("Palette")
                        .selected_text(settings.color_palette.name())
                        .show_ui(ui, |ui| {
                            for palette in Palette::ALL {
                                changed |= ui
                                    .selectable_value(
                                        &mut settings.color_palette,
                                        palette,
                                        palette.name(),
                                    )
                                    .changed();
                            }
                        });
                }
                ColorMode::Single => {
                    changed |= color_field(ui, &mut settings.single_color, "Color");
                }
                ColorMode::Custom => {
                    ui.label("Group colors (JSON object)")
                        .on_hover_text("Groups missing from the mapping are drawn grey.");
                    if ui
                        .add(egui::TextEdit::multiline(&mut self.custom_colors_raw).code_editor())
                        .changed()
                    {
                        settings.custom_colors = parse_string_map(&self.custom_colors_raw);
                        changed = true;
                    }
                }
                ColorMode::Master => {
                    ui.label("Colors come from the grouping dimension's master item.");
                }
            }
        });

        ui.collapsing("Labels", |ui| {
            changed |= ui.checkbox(&mut settings.show_labels, "Show labels").changed();
            ui.add_enabled_ui(settings.show_labels, |ui| {
                changed |= color_field(ui, &mut settings.label_color, "Label color");
                changed |= slider(
                    ui,
                    &mut settings.label_size,
                    6.0..=40.0,
                    "Label size",
                    "Largest label font size.",
                );
                changed |= slider(
                    ui,
                    &mut settings.min_size_for_label,
                    0.0..=100.0,
                    "Min radius",
                    "Smaller bubbles get no label.",
                );
                changed |= ui.checkbox(&mut settings.show_values, "Show values").changed();
                ui.add_enabled_ui(settings.show_values, |ui| {
                    changed |= color_field(ui, &mut settings.value_color, "Value color");
                    changed |= slider(
                        ui,
                        &mut settings.min_size_for_value,
                        0.0..=100.0,
                        "Min value radius",
                        "Smaller bubbles get no value line.",
                    );
                });
            });
        });

        ui.collapsing("Groups", |ui| {
            changed |= ui
                .checkbox(&mut settings.show_group_bubbles, "Group bubbles")
                .changed();
            ui.add_enabled_ui(settings.show_group_bubbles, |ui| {
                changed |= slider(
                    ui,
                    &mut settings.group_bubble_opacity,
                    0.0..=1.0,
                    "Fill opacity",
                    "Group circle fill opacity.",
                );
                changed |= slider(
                    ui,
                    &mut settings.group_border_opacity,
                    0.0..=1.0,
                    "Border opacity",
                    "Group circle border opacity.",
                );
                changed |= ui.checkbox(&mut settings.show_group_labels, "Group labels").changed();
                changed |= slider(
                    ui,
                    &mut settings.group_label_size,
                    6.0..=40.0,
                    "Label size",
                    "Largest group label font size.",
                );
                changed |= slider(
                    ui,
                    &mut settings.group_label_opacity,
                    0.0..=1.0,
                    "Label opacity",
                    "Group label opacity.",
                );
                changed |= ui
                    .checkbox(&mut settings.group_label_outline, "Label outline")
                    .changed();
                changed |= slider(
                    ui,
                    &mut settings.min_group_size_for_label,
                    0.0..=200.0,
                    "Min radius",
                    "Smaller groups get no label.",
                );
                changed |= ui.checkbox(&mut settings.show_group_images, "Group images").changed();
                ui.add_enabled_ui(settings.show_group_images, |ui| {
                    changed |= slider(
                        ui,
                        &mut settings.group_image_size,
                        8.0..=64.0,
                        "Image size",
                        "Badge size above the group label.",
                    );
                    ui.label("Group images (JSON object)");
                    if ui
                        .add(egui::TextEdit::multiline(&mut self.image_mapping_raw).code_editor())
                        .changed()
                    {
                        settings.group_image_mapping = parse_string_map(&self.image_mapping_raw);
                        changed = true;
                    }
                });
            });
        });

        ui.collapsing("Legend", |ui| {
            changed |= ui.checkbox(&mut settings.show_legend, "Show legend").changed();
            ui.add_enabled_ui(settings.show_legend, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for position in LegendPosition::ALL {
                        changed |= ui
                            .selectable_value(
                                &mut settings.legend_position,
                                position,
                                position.name(),
                            )
                            .changed();
                    }
                });
                changed |= color_field(ui, &mut settings.legend_text_color, "Text color");
            });
        });

        ui.collapsing("Interaction", |ui| {
            changed |= ui.checkbox(&mut settings.show_tooltip, "Tooltips").changed();
            changed |= ui
                .checkbox(&mut settings.enable_zoom, "Zoom and pan")
                .on_hover_text("Scroll to zoom, right or middle drag to pan.")
                .changed();
            changed |= ui
                .checkbox(&mut settings.enable_debug, "Debug logging")
                .on_hover_text("Log chart diagnostics through tracing.")
                .changed();
        });

        if changed {
            self.dirty = true;
        }
    }
}
