use std::time::Instant;

use anyhow::{anyhow, Context as _};
use glutin::config::{Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext};
use glutin::display::GetGlDisplay;
use glutin::prelude::{GlDisplay, NotCurrentGlContext};
use glutin::surface::{Surface, WindowSurface};
use glutin_winit::GlWindow;

use imgui::{Context, Ui};
use imgui_glow_renderer::glow::{self, HasContext};
use imgui_glow_renderer::AutoRenderer;
use imgui_winit_support::{HiDpiMode, WinitPlatform};

use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::raw_window_handle::HasWindowHandle;
use winit::window::{Window, WindowAttributes};

/// Called once per UI frame. Returning `false` closes the application.
pub trait MainLoop: FnMut(&mut Ui, &mut AutoRenderer) -> bool {}
impl<T: FnMut(&mut Ui, &mut AutoRenderer) -> bool> MainLoop for T {}

pub struct App<Loop: MainLoop> {
    pub imgui: Context,
    pub platform: WinitPlatform,
    pub main_loop: Loop,
    pub last_frame: Instant,

    pub window: Option<Window>,
    pub renderer: Option<AutoRenderer>,
    pub surface: Option<(Surface<WindowSurface>, PossiblyCurrentContext)>,
}

impl<Loop: MainLoop> App<Loop> {
    pub fn new(main_loop: Loop) -> Self {
        let mut imgui = Context::create();
        imgui.set_ini_filename(None);
        let platform = WinitPlatform::new(&mut imgui);

        Self {
            imgui,
            platform,
            main_loop,
            last_frame: Instant::now(),

            window: None,
            renderer: None,
            surface: None,
        }
    }

    pub fn setup(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let size = PhysicalSize::new(1920 * 3 / 4, 1080 * 3 / 4);
        let wind_attr = WindowAttributes::default()
            .with_title("regioncount")
            .with_inner_size(size);
        let template = ConfigTemplateBuilder::new();
        let compare_conf = |a: &Config, b: &Config| a.num_samples().cmp(&b.num_samples());

        let (window, config) = glutin_winit::DisplayBuilder::new()
            .with_window_attributes(Some(wind_attr))
            .build(event_loop, template, |configs| {
                configs
                    .max_by(compare_conf)
                    .expect("display offered no GL configs")
            })
            .map_err(|e| anyhow!("could not create window: {e}"))?;
        let window = window.context("no window was created")?;
        let display = config.display();

        let surf_attr = window.build_surface_attributes(Default::default())?;
        let surface = unsafe { display.create_window_surface(&config, &surf_attr)? };

        let gl_version = glutin::context::Version { major: 4, minor: 1 };
        let ctx_api = ContextApi::OpenGl(Some(gl_version));
        let ctx_attr = ContextAttributesBuilder::new()
            .with_context_api(ctx_api)
            .build(Some(window.window_handle()?.into()));
        let context = unsafe { display.create_context(&config, &ctx_attr)? };
        let context = context.make_current(&surface)?;

        self.platform
            .attach_window(self.imgui.io_mut(), &window, HiDpiMode::Default);

        let gl = unsafe {
            let gl = glow::Context::from_loader_function_cstr(|s| display.get_proc_address(s));
            gl.clear_color(0.3, 0.3, 0.3, 1.);
            gl
        };
        self.renderer = Some(AutoRenderer::new(gl, &mut self.imgui)?);
        self.window = Some(window);
        self.surface = Some((surface, context));
        Ok(())
    }
}
