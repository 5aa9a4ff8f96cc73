//! CanvasRenderingContext2d backend

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::Surface;
use super::shapes::DrawCmd;

/// Canvas element plus its 2D context
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        log::info!("Canvas2D surface: {}x{}", canvas.width(), canvas.height());
        Ok(Self { canvas, ctx })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Resize the backing store
    pub fn resize(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn try_draw(&self, cmd: &DrawCmd) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        match cmd {
            DrawCmd::FillRect { pos, size, color } => {
                ctx.set_fill_style_str(&color.css());
                ctx.fill_rect(pos.x as f64, pos.y as f64, size.x as f64, size.y as f64);
            }
            DrawCmd::Line {
                from,
                to,
                color,
                width,
            } => {
                ctx.save();
                ctx.set_stroke_style_str(&color.css());
                ctx.set_line_width(*width as f64);
                ctx.set_line_cap("round");
                ctx.begin_path();
                ctx.move_to(from.x as f64, from.y as f64);
                ctx.line_to(to.x as f64, to.y as f64);
                ctx.stroke();
                ctx.restore();
            }
            DrawCmd::Polyline {
                points,
                color,
                width,
                glow,
            } => {
                let Some((first, rest)) = points.split_first() else {
                    return Ok(());
                };
                ctx.save();
                ctx.set_stroke_style_str(&color.css());
                ctx.set_line_width(*width as f64);
                ctx.set_line_cap("round");
                ctx.set_line_join("round");
                ctx.set_shadow_color(&color.css());
                ctx.set_shadow_blur(*glow as f64);
                ctx.begin_path();
                ctx.move_to(first.x as f64, first.y as f64);
                for p in rest {
                    ctx.line_to(p.x as f64, p.y as f64);
                }
                ctx.stroke();
                ctx.restore();
            }
            DrawCmd::Circle {
                center,
                radius,
                fill,
                stroke,
            } => {
                ctx.begin_path();
                ctx.arc(center.x as f64, center.y as f64, *radius as f64, 0.0, TAU)?;
                if let Some(fill) = fill {
                    ctx.set_fill_style_str(&fill.css());
                    ctx.fill();
                }
                if let Some((color, width)) = stroke {
                    ctx.set_stroke_style_str(&color.css());
                    ctx.set_line_width(*width as f64);
                    ctx.stroke();
                }
            }
            DrawCmd::Text {
                pos,
                text,
                size,
                bold,
                color,
            } => {
                let weight = if *bold { "bold " } else { "" };
                ctx.set_font(&format!("{weight}{size}px Arial"));
                ctx.set_text_align("center");
                ctx.set_text_baseline("middle");
                ctx.set_fill_style_str(&color.css());
                ctx.fill_text(text, pos.x as f64, pos.y as f64)?;
            }
            DrawCmd::PushTransform { translate, rotate } => {
                ctx.save();
                ctx.translate(translate.x as f64, translate.y as f64)?;
                ctx.rotate(*rotate as f64)?;
            }
            DrawCmd::PopTransform => ctx.restore(),
        }
        Ok(())
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> Option<(f32, f32)> {
        if !self.canvas.is_connected() {
            return None;
        }
        Some((self.canvas.width() as f32, self.canvas.height() as f32))
    }

    fn draw(&mut self, cmd: &DrawCmd) {
        if let Err(e) = self.try_draw(cmd) {
            log::warn!("Draw failed: {:?}", e);
        }
    }
}
