use console_error_panic_hook::set_once;
use gloo_net::http::Request;
use std::cell::RefCell;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use formats::{AssetBundle, AssetManifest, MANIFEST_FILE_NAME, parse_config};
use gpu::InstanceBuffers;
use scene::{
    FrameDriver, Ndc, OrbitRig, PointerKind, SceneConfig, SceneState, TooltipAction,
};
mod renderer;
use renderer::{
    WgpuContext, init_wgpu_from_canvas_id, install_scene, release_scene, render_scene, resize_wgpu,
    upload,
};

const CANVAS_ID: &str = "dotmap-canvas";
const TOOLTIP_ID: &str = "tooltip";

pub struct ViewerState {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub config: SceneConfig,
    pub driver: FrameDriver,
    pub rig: OrbitRig,
    pub scene: Option<SceneState>,
    pub buffers: InstanceBuffers,
    /// `None` until the pointer first enters the canvas.
    pub cursor: Option<Ndc>,
    pub content_hash: Option<String>,
    pub wgpu: Option<WgpuContext>,
}

impl ViewerState {
    fn new(config: SceneConfig, canvas_width: f64, canvas_height: f64) -> Result<Self, JsValue> {
        let driver = FrameDriver::new(config.clone()).map_err(to_js)?;
        let aspect = canvas_width / canvas_height.max(1.0);
        let rig = OrbitRig::new(config.camera.clone(), config.controls.clone(), aspect);
        Ok(Self {
            canvas_width,
            canvas_height,
            config,
            driver,
            rig,
            scene: None,
            buffers: InstanceBuffers::new(),
            cursor: None,
            content_hash: None,
            wgpu: None,
        })
    }

    fn viewport(&self) -> (f64, f64) {
        (self.canvas_width, self.canvas_height)
    }

    fn ndc(&self, x_px: f64, y_px: f64) -> Ndc {
        Ndc::from_pixels(x_px, y_px, self.canvas_width, self.canvas_height)
    }

    fn render(&self) {
        if let Some(ctx) = &self.wgpu {
            if let Err(err) = render_scene(ctx, self.rig.camera.view_projection()) {
                log(&format!("render error: {err:?}"));
            }
        }
    }
}

thread_local! {
    static STATE: RefCell<Option<ViewerState>> = const { RefCell::new(None) };
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

fn with_state<R>(f: impl FnOnce(&mut ViewerState) -> R) -> Result<R, JsValue> {
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        let s = s
            .as_mut()
            .ok_or_else(|| JsValue::from_str("viewer not started"))?;
        Ok(f(s))
    })
}

/// Escapes text for interpolation into tooltip markup.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn tooltip_html(label: &str, message: &str) -> String {
    format!(
        "<strong>{}</strong><br>{}",
        escape_html(label),
        escape_html(message)
    )
}

fn tooltip_element() -> Option<web_sys::HtmlElement> {
    web_sys::window()?
        .document()?
        .get_element_by_id(TOOLTIP_ID)?
        .dyn_into::<web_sys::HtmlElement>()
        .ok()
}

fn place_tooltip(x_px: f64, y_px: f64) {
    if let Some(el) = tooltip_element() {
        let style = el.style();
        let _ = style.set_property("left", &format!("{x_px}px"));
        let _ = style.set_property("top", &format!("{y_px}px"));
    }
}

fn apply_tooltip(scene: Option<&SceneState>, action: TooltipAction) {
    let Some(el) = tooltip_element() else {
        return;
    };
    match action {
        TooltipAction::Show { hotspot, .. } => {
            if let Some(h) = scene.and_then(|s| s.hotspot(hotspot)) {
                el.set_inner_html(&tooltip_html(&h.label, &h.message));
                let _ = el.class_list().add_1("visible");
            }
        }
        TooltipAction::Hide => {
            let _ = el.class_list().remove_1("visible");
        }
        TooltipAction::Unchanged => {}
    }
}

fn pointer(kind: PointerKind, x_px: f64, y_px: f64) -> Result<(), JsValue> {
    place_tooltip(x_px, y_px);
    with_state(|s| {
        let ndc = s.ndc(x_px, y_px);
        s.cursor = Some(ndc);
        if let Some(scene) = &s.scene {
            let action = s.driver.pointer(scene, &s.rig, kind, ndc, x_px, y_px);
            apply_tooltip(Some(scene), action);
        }
    })
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    let state = ViewerState::new(SceneConfig::default(), 1280.0, 720.0)?;
    STATE.with(|s| *s.borrow_mut() = Some(state));
    Ok(())
}

#[wasm_bindgen]
pub fn init_wgpu() {
    spawn_local(async move {
        if let Err(err) = init_wgpu_inner().await {
            log(&format!("wgpu init error: {err:?}"));
        }
    });
}

#[wasm_bindgen]
pub fn set_canvas_sizes(width: f64, height: f64) -> Result<(), JsValue> {
    with_state(|s| {
        s.canvas_width = width;
        s.canvas_height = height;
        s.rig.camera.set_viewport(width, height);
        if let Some(ctx) = &mut s.wgpu {
            resize_wgpu(ctx, width as u32, height as u32);
        }
        s.render();
    })
}

#[wasm_bindgen]
pub fn pointer_move(x_px: f64, y_px: f64) -> Result<(), JsValue> {
    pointer(PointerKind::Move, x_px, y_px)
}

#[wasm_bindgen]
pub fn pointer_down(x_px: f64, y_px: f64) -> Result<(), JsValue> {
    pointer(PointerKind::Down, x_px, y_px)
}

/// The pointer left the canvas: stop hovering and hide the tooltip.
#[wasm_bindgen]
pub fn pointer_leave() -> Result<(), JsValue> {
    with_state(|s| {
        s.cursor = None;
        let action = s.driver.pointer_left();
        apply_tooltip(s.scene.as_ref(), action);
    })
}

/// Orbit around the target. Call with pointer delta in pixels.
#[wasm_bindgen]
pub fn camera_orbit(delta_x_px: f64, delta_y_px: f64) -> Result<(), JsValue> {
    with_state(|s| {
        let height = s.canvas_height;
        s.rig.controls.rotate(delta_x_px, delta_y_px, height);
    })
}

/// Pan the target. Call with pointer delta in pixels.
#[wasm_bindgen]
pub fn camera_pan(delta_x_px: f64, delta_y_px: f64) -> Result<(), JsValue> {
    with_state(|s| {
        let viewport = s.viewport();
        s.rig
            .controls
            .pan(&s.rig.camera, delta_x_px, delta_y_px, viewport);
    })
}

/// Zoom in/out. Call with wheel deltaY.
#[wasm_bindgen]
pub fn camera_zoom(wheel_delta_y: f64) -> Result<(), JsValue> {
    with_state(|s| {
        s.rig.controls.zoom(&mut s.rig.camera, wheel_delta_y);
    })
}

#[wasm_bindgen]
pub fn camera_reset() -> Result<(), JsValue> {
    with_state(|s| {
        let aspect = s.canvas_width / s.canvas_height.max(1.0);
        s.rig = OrbitRig::new(s.config.camera.clone(), s.config.controls.clone(), aspect);
        s.render();
    })
}

/// Fetches the manifest under `base_url` and everything it lists, then
/// installs the scene. Without a manifest the conventional layout is used.
#[wasm_bindgen]
pub fn load_assets(base_url: String) {
    spawn_local(async move {
        if let Err(err) = load_assets_inner(&base_url).await {
            log(&format!("failed to load assets from {base_url}: {err:?}"));
        }
    });
}

/// Runs one frame. Returns `true` if the canvas was redrawn.
#[wasm_bindgen]
pub fn advance_frame() -> Result<bool, JsValue> {
    with_state(|s| {
        let report = s
            .driver
            .step(s.scene.as_mut(), &mut s.rig, s.cursor, &mut s.buffers);
        if let Some(ctx) = &mut s.wgpu {
            upload(ctx, &mut s.buffers, s.driver.connectors());
        }
        let redraw = s.buffers.take_redraw() || report.redraw;
        if redraw {
            s.render();
        }
        redraw
    })
}

/// JSON summary of the loaded scene and the frame loop.
#[wasm_bindgen]
pub fn scene_summary() -> Result<String, JsValue> {
    with_state(|s| {
        serde_json::json!({
            "phase": s.driver.phase().as_str(),
            "dots": s.scene.as_ref().map_or(0, |sc| sc.dots().len()),
            "hotspots": s.scene.as_ref().map_or(0, |sc| sc.hotspots().len()),
            "skipped": s.scene.as_ref().map(|sc| sc.skipped_hotspots().to_vec()),
            "connectors": s.driver.connectors().len(),
            "hovered": s.driver.hovered().map(|d| d.index()),
            "content_hash": s.content_hash,
        })
        .to_string()
    })
}

async fn init_wgpu_inner() -> Result<(), JsValue> {
    let mut ctx = init_wgpu_from_canvas_id(CANVAS_ID).await?;

    with_state(move |s| {
        if let Some(scene) = &s.scene {
            install_scene(&mut ctx, &s.config, scene);
            upload(&mut ctx, &mut s.buffers, s.driver.connectors());
        }
        s.wgpu = Some(ctx);
        s.render();
    })
}

fn asset_url(base_url: &str, rel: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), rel)
}

/// `Ok(None)` on 404.
async fn fetch_text(url: &str) -> Result<Option<String>, JsValue> {
    let resp = Request::get(url).send().await.map_err(to_js)?;
    if resp.status() == 404 {
        return Ok(None);
    }
    if !resp.ok() {
        return Err(JsValue::from_str(&format!(
            "{url}: HTTP {}",
            resp.status()
        )));
    }
    resp.text().await.map(Some).map_err(to_js)
}

async fn fetch_required(url: &str) -> Result<String, JsValue> {
    fetch_text(url)
        .await?
        .ok_or_else(|| JsValue::from_str(&format!("{url}: not found")))
}

async fn load_assets_inner(base_url: &str) -> Result<(), JsValue> {
    let manifest = match fetch_text(&asset_url(base_url, MANIFEST_FILE_NAME)).await? {
        Some(payload) => AssetManifest::from_json(MANIFEST_FILE_NAME, &payload).map_err(to_js)?,
        None => AssetManifest::default(),
    };

    let config = match &manifest.config {
        Some(rel) => {
            let payload = fetch_required(&asset_url(base_url, rel)).await?;
            parse_config(rel, &payload).map_err(to_js)?
        }
        None => SceneConfig::default(),
    };

    let mut bundle = AssetBundle::new();
    let dots = fetch_required(&asset_url(base_url, &manifest.dots)).await?;
    bundle.add_dots(&manifest.dots, &dots).map_err(to_js)?;
    for source in &manifest.hotspots {
        let payload = fetch_required(&asset_url(base_url, &source.path)).await?;
        bundle.add_hotspots(source, &payload).map_err(to_js)?;
    }

    STATE.with(|state| -> Result<(), JsValue> {
        let mut slot = state.borrow_mut();
        let (width, height, wgpu) = match slot.take() {
            Some(old) => (old.canvas_width, old.canvas_height, old.wgpu),
            None => (1280.0, 720.0, None),
        };

        let mut next = ViewerState::new(config, width, height)?;
        let scene = bundle.build_scene(&next.config);
        for id in scene.skipped_hotspots() {
            log(&format!("hotspot {id} skipped: no free dot"));
        }
        next.buffers = InstanceBuffers::with_counts(scene.dots().len(), scene.instance_counts());
        next.driver.install(&scene, &mut next.buffers);
        next.content_hash = Some(bundle.content_hash());
        next.wgpu = wgpu;
        if let Some(ctx) = &mut next.wgpu {
            install_scene(ctx, &next.config, &scene);
            upload(ctx, &mut next.buffers, next.driver.connectors());
        }
        next.scene = Some(scene);
        next.render();
        *slot = Some(next);
        Ok(())
    })?;

    log(&format!(
        "loaded {} ({} dots, {} hotspots)",
        manifest.name.as_deref().unwrap_or("unnamed map"),
        bundle.dots().len(),
        bundle.hotspots().len()
    ));
    Ok(())
}

/// Drops the scene and its GPU buffers; the camera keeps running.
#[wasm_bindgen]
pub fn unload_scene() -> Result<(), JsValue> {
    with_state(|s| {
        s.driver.unload();
        s.scene = None;
        s.buffers = InstanceBuffers::new();
        apply_tooltip(None, TooltipAction::Hide);
        if let Some(ctx) = &mut s.wgpu {
            release_scene(ctx);
        }
        s.render();
    })
}

#[cfg(test)]
mod tests {
    use super::{asset_url, escape_html, tooltip_html};

    #[test]
    fn tooltip_text_is_escaped() {
        assert_eq!(
            tooltip_html("<b>Miami</b>", "A & B"),
            "<strong>&lt;b&gt;Miami&lt;/b&gt;</strong><br>A &amp; B"
        );
        assert_eq!(escape_html("it's \"ok\""), "it&#39;s &quot;ok&quot;");
    }

    #[test]
    fn asset_urls_join_with_one_slash() {
        assert_eq!(asset_url("/assets/", "dots.json"), "/assets/dots.json");
        assert_eq!(asset_url("/assets", "dots.json"), "/assets/dots.json");
    }
}
