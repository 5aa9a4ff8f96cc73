//! Transient presentation effects layered over the canvas
//!
//! Slice halves, explosions, the bomb flash and point popups are short
//! lived DOM elements. Every element is tracked with its expiry time and
//! removed by the frame loop, so ending a session can drop all of them
//! at once instead of waiting on timers.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec2;

pub const SLICE_MS: f64 = 800.0;
pub const EXPLOSION_MS: f64 = 600.0;
pub const FLASH_MS: f64 = 300.0;
pub const POPUP_MS: f64 = 1000.0;

/// How far each slice half travels
const SLICE_TRAVEL: f32 = 100.0;
/// Upward kick added to both halves
const SLICE_LIFT: f32 = 50.0;

/// End state of one slice half relative to where it started
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfMotion {
    pub offset: Vec2,
    pub rotation: f32,
}

/// The two halves fly apart perpendicular to the slash, one each way
pub fn slice_halves(angle: f32) -> [HalfMotion; 2] {
    let perp = angle + FRAC_PI_2;
    [1.0f32, -1.0].map(|dir| HalfMotion {
        offset: Vec2::new(
            perp.cos() * dir * SLICE_TRAVEL,
            perp.sin() * dir * SLICE_TRAVEL - SLICE_LIFT,
        ),
        rotation: angle + dir * PI,
    })
}

/// Popup label: `+N` for points, `-N` for lost lives
pub fn popup_label(value: i32, lost_life: bool) -> String {
    if lost_life {
        format!("-{}", value.abs())
    } else {
        format!("+{value}")
    }
}

/// Live effects keyed by expiry time
#[derive(Debug)]
pub struct EffectQueue<H> {
    live: Vec<(f64, H)>,
}

impl<H> Default for EffectQueue<H> {
    fn default() -> Self {
        Self { live: Vec::new() }
    }
}

impl<H> EffectQueue<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, now_ms: f64, lifetime_ms: f64, handle: H) {
        self.live.push((now_ms + lifetime_ms, handle));
    }

    /// Take every handle whose lifetime is over
    pub fn expire(&mut self, now_ms: f64) -> Vec<H> {
        let (done, keep): (Vec<_>, Vec<_>) = self.live.drain(..).partition(|(at, _)| *at <= now_ms);
        self.live = keep;
        done.into_iter().map(|(_, h)| h).collect()
    }

    /// Take every handle regardless of expiry
    pub fn drain_all(&mut self) -> Vec<H> {
        self.live.drain(..).map(|(_, h)| h).collect()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[cfg(target_arch = "wasm32")]
pub use dom::DomEffects;

#[cfg(target_arch = "wasm32")]
mod dom {
    use wasm_bindgen::{JsCast, JsValue};
    use web_sys::{Document, Element, HtmlElement};

    use super::*;
    use crate::platform::input::ClientRect;
    use crate::settings::Settings;
    use crate::sim::events::SimEvent;
    use crate::sim::state::EntityKind;

    /// DOM-backed effects, positioned over the canvas
    pub struct DomEffects {
        document: Document,
        queue: EffectQueue<Element>,
        /// Explosions are skipped with reduced motion
        pub reduced_motion: bool,
        pub screen_flash: bool,
    }

    impl DomEffects {
        pub fn new(document: Document) -> Self {
            Self {
                document,
                queue: EffectQueue::new(),
                reduced_motion: false,
                screen_flash: true,
            }
        }

        pub fn apply_settings(&mut self, settings: &Settings) {
            self.reduced_motion = settings.reduced_motion;
            self.screen_flash = settings.effective_screen_flash();
        }

        fn div(&self, class: &str) -> Result<HtmlElement, JsValue> {
            let el = self.document.create_element("div")?.dyn_into::<HtmlElement>()?;
            el.set_class_name(class);
            let style = el.style();
            style.set_property("position", "fixed")?;
            style.set_property("pointer-events", "none")?;
            style.set_property("z-index", "999")?;
            Ok(el)
        }

        fn attach(&mut self, el: HtmlElement, now_ms: f64, lifetime_ms: f64) -> Result<(), JsValue> {
            let body = self
                .document
                .body()
                .ok_or_else(|| JsValue::from_str("no body"))?;
            body.append_child(&el)?;
            self.queue.push(now_ms, lifetime_ms, el.into());
            Ok(())
        }

        fn slice(&mut self, rect: ClientRect, pos: Vec2, color: u32, angle: f32, now_ms: f64) -> Result<(), JsValue> {
            for half in slice_halves(angle) {
                let el = self.div("slice-half")?;
                let style = el.style();
                style.set_property("left", &format!("{}px", rect.left + pos.x - 20.0))?;
                style.set_property("top", &format!("{}px", rect.top + pos.y - 20.0))?;
                style.set_property("width", "40px")?;
                style.set_property("height", "40px")?;
                style.set_property("border-radius", "50%")?;
                style.set_property("background", &format!("#{color:06x}"))?;
                style.set_property(
                    "transition",
                    "transform 0.8s cubic-bezier(0.25, 0.46, 0.45, 0.94), opacity 0.8s ease-out",
                )?;
                style.set_property("transform", &format!("rotate({angle}rad)"))?;
                self.attach(el.clone(), now_ms, SLICE_MS)?;
                // Reading layout commits the start transform before the end one
                let _ = el.offset_width();
                style.set_property(
                    "transform",
                    &format!(
                        "translate({}px, {}px) rotate({}rad) scale(0.3)",
                        half.offset.x, half.offset.y, half.rotation
                    ),
                )?;
                style.set_property("opacity", "0")?;
            }
            Ok(())
        }

        fn explosion(&mut self, rect: ClientRect, pos: Vec2, now_ms: f64) -> Result<(), JsValue> {
            let el = self.div("bomb-explosion")?;
            let style = el.style();
            style.set_property("left", &format!("{}px", rect.left + pos.x - 50.0))?;
            style.set_property("top", &format!("{}px", rect.top + pos.y - 50.0))?;
            style.set_property("width", "100px")?;
            style.set_property("height", "100px")?;
            style.set_property("border-radius", "50%")?;
            style.set_property("background", "radial-gradient(circle, #ff4444, #ff8888, transparent)")?;
            style.set_property("animation", "explode 0.6s ease-out forwards")?;
            self.attach(el, now_ms, EXPLOSION_MS)
        }

        fn flash(&mut self, now_ms: f64) -> Result<(), JsValue> {
            let el = self.div("screen-flash")?;
            let style = el.style();
            style.set_property("inset", "0")?;
            style.set_property("background", "rgba(255, 68, 68, 0.3)")?;
            self.attach(el, now_ms, FLASH_MS)
        }

        fn popup(&mut self, rect: ClientRect, pos: Vec2, label: &str, class: &str, now_ms: f64) -> Result<(), JsValue> {
            let el = self.div(class)?;
            el.set_text_content(Some(label));
            let style = el.style();
            style.set_property("left", &format!("{}px", rect.left + pos.x))?;
            style.set_property("top", &format!("{}px", rect.top + pos.y))?;
            style.set_property("font", "bold 24px Arial")?;
            style.set_property("transform", "translate(-50%, -50%)")?;
            self.attach(el, now_ms, POPUP_MS)
        }

        /// Present one simulation event. `rect` is the canvas client rect.
        pub fn present(&mut self, event: &SimEvent, rect: ClientRect, now_ms: f64) {
            let result = match event {
                SimEvent::SliceEffect { pos, color, angle, .. } => self.slice(rect, *pos, *color, *angle, now_ms),
                SimEvent::Explosion { pos, .. } if !self.reduced_motion => self.explosion(rect, *pos, now_ms),
                SimEvent::ScreenFlash if self.screen_flash => self.flash(now_ms),
                SimEvent::Popup { pos, value, kind } => {
                    let bomb = *kind == EntityKind::Bomb;
                    let class = if bomb { "point-popup bomb" } else { "point-popup token" };
                    self.popup(rect, *pos, &popup_label(*value, bomb), class, now_ms)
                }
                _ => Ok(()),
            };
            if let Err(e) = result {
                log::warn!("Effect failed: {:?}", e);
            }
        }

        /// Remove expired elements
        pub fn update(&mut self, now_ms: f64) {
            for el in self.queue.expire(now_ms) {
                el.remove();
            }
        }

        /// Remove every tracked element immediately
        pub fn clear(&mut self) {
            let count = self.queue.len();
            for el in self.queue.drain_all() {
                el.remove();
            }
            if count > 0 {
                log::debug!("Cleared {} effects", count);
            }
        }
    }
}
