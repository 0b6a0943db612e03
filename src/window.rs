use std::num::NonZeroU32;
use std::time::Instant;

use anyhow::anyhow;
use glutin::surface::GlSurface;
use imgui_glow_renderer::glow::{self, HasContext};
use winit::application::ApplicationHandler;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::WindowId;

use crate::app::{App, MainLoop};

impl<Loop: MainLoop> ApplicationHandler for App<Loop> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.setup(event_loop) {
            log::error!("{e:#}");
            event_loop.exit();
        }
    }

    fn new_events(&mut self, _event_loop: &ActiveEventLoop, _cause: winit::event::StartCause) {
        let now = Instant::now();
        self.imgui.io_mut().update_delta_time(now - self.last_frame);
        self.last_frame = now;
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if let Err(e) = self.platform.prepare_frame(self.imgui.io_mut(), window) {
            log::warn!("could not prepare frame: {e}");
        }
        window.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::RedrawRequested => {
                if !self.redraw() {
                    event_loop.exit();
                }
                return;
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
                return;
            }
            WindowEvent::Resized(size) => {
                if let (Some((surface, context)), Some(w), Some(h)) = (
                    self.surface.as_ref(),
                    NonZeroU32::new(size.width),
                    NonZeroU32::new(size.height),
                ) {
                    surface.resize(context, w, h);
                }
            }
            _ => {}
        }

        if let Some(window) = self.window.as_ref() {
            self.platform.handle_event(
                self.imgui.io_mut(),
                window,
                &Event::<()>::WindowEvent { window_id, event },
            );
        }
    }
}

impl<Loop: MainLoop> App<Loop> {
    fn redraw(&mut self) -> bool {
        let (Some(window), Some(renderer), Some((surface, context))) = (
            self.window.as_ref(),
            self.renderer.as_mut(),
            self.surface.as_ref(),
        ) else {
            return true;
        };

        let ui = self.imgui.new_frame();
        let keep_running = (self.main_loop)(ui, renderer);
        self.platform.prepare_render(ui, window);

        unsafe {
            renderer.gl_context().clear(glow::COLOR_BUFFER_BIT);
        }

        let draw_data = self.imgui.render();
        if draw_data.draw_lists_count() != 0 {
            if let Err(e) = renderer.render(draw_data) {
                log::warn!("render failed: {e}");
            }
        }

        if let Err(e) = surface.swap_buffers(context) {
            log::warn!("swap failed: {e}");
        }
        keep_running
    }
}

pub fn create(main_loop: impl MainLoop) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().map_err(|e| anyhow!("{e}"))?;
    let mut app = App::new(main_loop);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow!("event loop failed: {e}"))
}
