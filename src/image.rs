use igr::glow::HasContext;
use igr::{glow, TextureMap};
use imgui_glow_renderer as igr;

use crate::*;

/// GL texture mirroring the most recent frame of a stream.
#[derive(Default, Debug)]
pub struct Image {
    rgb: cv::Mat,
    texture: Option<glow::Texture>,
    texture_id: Option<imgui::TextureId>,
}

impl Image {
    /// Uploads a BGR frame and returns the texture id with the frame size.
    pub fn upload(
        &mut self,
        frame: &cv::Mat,
        renderer: &mut igr::AutoRenderer,
    ) -> Result<(imgui::TextureId, [f32; 2])> {
        imgproc::cvt_color_def(frame, &mut self.rgb, imgproc::COLOR_BGR2RGB)?;
        let (texture, texture_id) = self.init(renderer)?;
        let size = self.rgb.size()?;
        let data = self.rgb.data_bytes()?;

        let gl = renderer.gl_context();
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as _,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as _,
            );
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGB as _,
                size.width,
                size.height,
                0,
                glow::RGB,
                glow::UNSIGNED_BYTE,
                Some(data),
            );
        };
        Ok((texture_id, [size.width as _, size.height as _]))
    }

    fn init(
        &mut self,
        renderer: &mut igr::AutoRenderer,
    ) -> Result<(glow::Texture, imgui::TextureId)> {
        if let (Some(texture), Some(id)) = (self.texture, self.texture_id) {
            return Ok((texture, id));
        }
        let texture = unsafe { renderer.gl_context().create_texture() }.map_err(Error::Upstream)?;
        let id = renderer
            .texture_map_mut()
            .register(texture)
            .ok_or_else(|| Error::Upstream("could not register texture".into()))?;
        self.texture = Some(texture);
        self.texture_id = Some(id);
        Ok((texture, id))
    }

    /// Frees the GL texture. Call before dropping while the context is alive.
    pub fn release(&mut self, renderer: &mut igr::AutoRenderer) {
        if let Some(texture) = self.texture.take() {
            unsafe { renderer.gl_context().delete_texture(texture) };
        }
        self.texture_id = None;
    }
}
