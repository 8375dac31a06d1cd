use super::math::{Color, Rect, Vec2};
use anyhow::{anyhow, Result};
use glow::HasContext;

/// Segments used to approximate circles.
const CIRCLE_STEPS: usize = 64;

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub color: [f32; 4],
}

/// Immediate-mode triangle batcher. Everything pushed between `begin` and
/// `flush` goes out in a single draw call.
pub struct DrawContext {
    gl: glow::Context,
    program: glow::Program,
    vbo: glow::Buffer,
    vertices: Vec<Vertex>,

    u_viewport: Option<glow::UniformLocation>,
    a_pos: Option<u32>,
    a_color: Option<u32>,
}

impl DrawContext {
    pub fn new(gl: glow::Context, program: glow::Program) -> Result<Self> {
        let vbo = unsafe {
            gl.create_buffer()
                .map_err(|e| anyhow!("Failed to create buffer: {}", e))?
        };

        let u_viewport = unsafe { gl.get_uniform_location(program, "uViewport") };
        let a_pos = unsafe { gl.get_attrib_location(program, "aPos") };
        let a_color = unsafe { gl.get_attrib_location(program, "aColor") };

        Ok(Self {
            gl,
            program,
            vbo,
            vertices: Vec::with_capacity(4096),
            u_viewport,
            a_pos,
            a_color,
        })
    }

    pub fn begin(&mut self, viewport_px: [f32; 2], clear: Color) {
        self.vertices.clear();

        unsafe {
            self.gl.viewport(0, 0, viewport_px[0] as i32, viewport_px[1] as i32);
            self.gl.clear_color(clear.r, clear.g, clear.b, clear.a);
            self.gl.clear(glow::COLOR_BUFFER_BIT);

            self.gl.enable(glow::BLEND);
            self.gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);

            self.gl.use_program(Some(self.program));
            if let Some(loc) = &self.u_viewport {
                self.gl.uniform_2_f32(Some(loc), viewport_px[0], viewport_px[1]);
            }
        }
    }

    pub fn triangle(&mut self, a: Vec2, b: Vec2, c: Vec2, color: Color) {
        let color = [color.r, color.g, color.b, color.a];
        for p in [a, b, c] {
            self.vertices.push(Vertex { pos: [p.x, p.y], color });
        }
    }

    pub fn quad(&mut self, corners: [Vec2; 4], color: Color) {
        let [a, b, c, d] = corners;
        self.triangle(a, b, c, color);
        self.triangle(a, c, d, color);
    }

    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.quad(
            [
                Vec2::new(x, y),
                Vec2::new(x + w, y),
                Vec2::new(x + w, y + h),
                Vec2::new(x, y + h),
            ],
            color,
        );
    }

    pub fn fill_rect(&mut self, r: Rect, color: Color) {
        self.rect(r.x, r.y, r.width, r.height, color);
    }

    /// Thick segment from `from` to `to`.
    pub fn line(&mut self, from: Vec2, to: Vec2, thickness: f32, color: Color) {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len <= f32::EPSILON {
            return;
        }
        let nx = -dy / len * thickness / 2.0;
        let ny = dx / len * thickness / 2.0;
        self.quad(
            [
                Vec2::new(from.x + nx, from.y + ny),
                Vec2::new(to.x + nx, to.y + ny),
                Vec2::new(to.x - nx, to.y - ny),
                Vec2::new(from.x - nx, from.y - ny),
            ],
            color,
        );
    }

    pub fn disc(&mut self, center: Vec2, radius: f32, color: Color) {
        let step = 360.0 / CIRCLE_STEPS as f32;
        for i in 0..CIRCLE_STEPS {
            let a = center.polar_cw(radius, i as f32 * step);
            let b = center.polar_cw(radius, (i + 1) as f32 * step);
            self.triangle(center, a, b, color);
        }
    }

    pub fn ring(&mut self, center: Vec2, radius: f32, thickness: f32, color: Color) {
        let outer = radius + thickness / 2.0;
        let inner = (radius - thickness / 2.0).max(0.0);
        let step = 360.0 / CIRCLE_STEPS as f32;
        for i in 0..CIRCLE_STEPS {
            let a0 = i as f32 * step;
            let a1 = (i + 1) as f32 * step;
            self.quad(
                [
                    center.polar_cw(outer, a0),
                    center.polar_cw(outer, a1),
                    center.polar_cw(inner, a1),
                    center.polar_cw(inner, a0),
                ],
                color,
            );
        }
    }

    pub fn flush(&mut self) {
        if self.vertices.is_empty() {
            return;
        }

        let stride = std::mem::size_of::<Vertex>() as i32;

        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&self.vertices),
                glow::DYNAMIC_DRAW,
            );

            if let Some(a_pos) = self.a_pos {
                self.gl.enable_vertex_attrib_array(a_pos);
                self.gl.vertex_attrib_pointer_f32(a_pos, 2, glow::FLOAT, false, stride, 0);
            }
            if let Some(a_color) = self.a_color {
                self.gl.enable_vertex_attrib_array(a_color);
                self.gl.vertex_attrib_pointer_f32(a_color, 4, glow::FLOAT, false, stride, 8);
            }

            self.gl.draw_arrays(glow::TRIANGLES, 0, self.vertices.len() as i32);
        }

        self.vertices.clear();
    }
}

impl Drop for DrawContext {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_buffer(self.vbo);
            self.gl.delete_program(self.program);
        }
    }
}
