use egui::Context as EguiContext;
use stagecraft_driver::Stage;
use stagecraft_render_wgpu::GpuContext;
use stagecraft_tools::SceneInspector;
use winit::event::WindowEvent;
use winit::window::Window;

/// egui overlay drawn on top of the scene.
pub struct Hud {
    ctx: EguiContext,
    winit: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

impl Hud {
    pub fn new(window: &Window, gpu: &GpuContext) -> Self {
        let ctx = EguiContext::default();
        let winit = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(&gpu.device, gpu.format(), None, 1, false);
        Self {
            ctx,
            winit,
            renderer,
            visible: true,
        }
    }

    /// Returns true when egui consumed the event.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.winit.on_window_event(window, event);
        self.visible && response.consumed
    }

    pub fn draw(
        &mut self,
        window: &Window,
        gpu: &GpuContext,
        target: &wgpu::TextureView,
        stage: &Stage,
    ) {
        let raw_input = self.winit.take_egui_input(window);
        let visible = self.visible;
        let full_output = self.ctx.run(raw_input, |ctx| {
            if visible {
                inspector_panel(ctx, stage);
            }
        });
        self.winit
            .handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let (width, height) = gpu.size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        let callbacks = self.renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue
            .submit(callbacks.into_iter().chain(std::iter::once(encoder.finish())));
        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

fn inspector_panel(ctx: &EguiContext, stage: &Stage) {
    let scene = stage.scene();
    let summary = SceneInspector::summary(scene, stage.camera());
    egui::SidePanel::left("inspector")
        .default_width(300.0)
        .show(ctx, |ui| {
            ui.heading("Stagecraft");
            ui.separator();
            ui.label(format!("Frame: {}  Rig: {}", summary.frame, stage.rig().name()));
            ui.label(format!(
                "Nodes: {} (meshes {}, lights {}, helpers {})",
                summary.node_count, summary.meshes, summary.lights, summary.helpers
            ));
            ui.label(format!(
                "Assets: {} geometries, {} materials, {} textures",
                summary.geometries, summary.materials, summary.textures
            ));
            let [x, y, z] = summary.camera_position;
            ui.label(format!("Camera: ({x:.2}, {y:.2}, {z:.2})"));
            let [rx, ry, rz] = summary.camera_rotation;
            ui.label(format!("Rotation: ({rx:.3}, {ry:.3}, {rz:.3})"));

            ui.separator();
            ui.heading("Nodes");
            egui::ScrollArea::vertical().show(ui, |ui| {
                for id in SceneInspector::list_nodes(scene) {
                    if let Some(info) = SceneInspector::inspect_node(scene, id) {
                        ui.monospace(info.to_string());
                    }
                }
            });

            ui.separator();
            ui.small("F1: Toggle HUD | LMB: Orbit | RMB: Pan | Wheel: Zoom/Scroll | Esc: Quit");
        });
}
