mod app;
mod config;
mod features;
mod gfx;
mod ticker;
mod wayland;

use anyhow::{anyhow, Result};
use app::App;
use calloop::EventLoop;
use config::{Anchor, Config};
use gfx::{draw::DrawContext, gl::load_ui_program};
use log::{debug, info, warn};
use std::time::Instant;
use ticker::{TickQueue, Ticker};
use wayland::egl::EglContext;
use wayland::WaylandState;
use wayland_client::{Connection, Proxy};
use wayland_protocols_wlr::layer_shell::v1::client::{zwlr_layer_shell_v1, zwlr_layer_surface_v1};

fn layer_anchor(anchor: Anchor) -> zwlr_layer_surface_v1::Anchor {
    use zwlr_layer_surface_v1::Anchor as Edge;
    match anchor {
        Anchor::TopLeft => Edge::Top | Edge::Left,
        Anchor::TopRight => Edge::Top | Edge::Right,
        Anchor::BottomLeft => Edge::Bottom | Edge::Left,
        Anchor::BottomRight => Edge::Bottom | Edge::Right,
    }
}

fn main() -> Result<()> {
    env_logger::init();
    info!("Starting tocks");

    let config = Config::load().unwrap_or_else(|e| {
        warn!("Falling back to default config: {:#}", e);
        Config::default()
    });

    let conn = Connection::connect_to_env()?;
    let display = conn.display();
    let mut event_queue = conn.new_event_queue();
    let qh = event_queue.handle();
    let _registry = display.get_registry(&qh, ());

    let mut state = WaylandState::new();
    event_queue.roundtrip(&mut state)?;

    let compositor = state
        .compositor
        .clone()
        .ok_or_else(|| anyhow!("Compositor does not advertise wl_compositor"))?;
    let layer_shell = state
        .layer_shell
        .clone()
        .ok_or_else(|| anyhow!("Compositor does not support wlr-layer-shell"))?;
    if let Some(size) = state.output_size {
        debug!("Output mode {}x{}", size[0], size[1]);
    }

    let surface = compositor.create_surface(&qh, ());
    let layer_surface = layer_shell.get_layer_surface(
        &surface,
        state.output.as_ref(),
        zwlr_layer_shell_v1::Layer::Overlay,
        "tocks".to_string(),
        &qh,
        (),
    );

    let [width, height] = [config.size.width, config.size.height];
    let m = &config.margins;
    layer_surface.set_anchor(layer_anchor(config.anchor));
    layer_surface.set_exclusive_zone(0);
    layer_surface.set_margin(m.top, m.right, m.bottom, m.left);
    layer_surface.set_size(width, height);
    if layer_shell.version() >= 4 {
        layer_surface
            .set_keyboard_interactivity(zwlr_layer_surface_v1::KeyboardInteractivity::OnDemand);
    } else {
        warn!("layer-shell v{} has no on-demand keyboard focus; keys disabled", layer_shell.version());
    }
    surface.commit();
    state.surface = Some(surface.clone());
    state.layer_surface = Some(layer_surface);

    while !state.configured {
        event_queue.blocking_dispatch(&mut state)?;
    }
    info!("Layer surface ready at {}x{}", width, height);

    let egl = EglContext::new(display.id().as_ptr() as *mut _, &surface, width as i32, height as i32)?;
    let gl = unsafe { glow::Context::from_loader_function(|s| egl.get_proc_address(s)) };
    let program = load_ui_program(&gl)?;
    let mut draw = DrawContext::new(gl, program)?;

    let mut event_loop: EventLoop<'static, TickQueue> = EventLoop::try_new()?;
    let mut ticks = TickQueue::default();
    let frame_budget = config.frame_budget();

    let mut app = App::new(config, Ticker::new(event_loop.handle()))?;
    app.mount()?;

    let mut last_frame = Instant::now();
    while state.running {
        event_queue.dispatch_pending(&mut state)?;
        for ev in state.pending_events.drain(..) {
            app.handle_event(ev)?;
        }

        event_loop.dispatch(Some(frame_budget), &mut ticks)?;

        let now = Instant::now();
        app.update(now.duration_since(last_frame));
        last_frame = now;

        for kind in ticks.drain() {
            app.on_tick(kind);
        }

        egl.make_current()?;
        let size = app.logical_size.map(|x| x as f32);
        draw.begin(size, app.palette.background);
        app.render(&mut draw);
        draw.flush();
        egl.swap_buffers()?;

        surface.commit();
        event_queue.flush()?;
    }

    app.unmount();
    info!("Shutting down");
    Ok(())
}
