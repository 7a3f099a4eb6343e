use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;
use log::{error, info, warn};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
	CanvasRenderingContext2d, Event, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent,
	PointerEvent, WheelEvent,
};

use super::config::ConstellationConfig;
use super::host::{CursorAffordance, HostSurface, ListenerKind, Navigator, PointerInput};
use super::loader::fetch_projects;
use super::render;
use super::state::ConstellationState;

pub const DEFAULT_DATA_URL: &str = "/projects.json";

type CanvasState = ConstellationState<CanvasHost, DeferredNavigator>;
type SharedState = Rc<RefCell<Option<CanvasState>>>;

fn window_size() -> (f64, f64) {
	web_sys::window()
		.and_then(|window| {
			Some((
				window.inner_width().ok()?.as_f64()?,
				window.inner_height().ok()?.as_f64()?,
			))
		})
		.unwrap_or((800.0, 600.0))
}

/// Records the route asked for during an event; the listener performs the
/// navigation once the state is no longer borrowed.
struct DeferredNavigator {
	pending: Rc<RefCell<Option<String>>>,
}

impl Navigator for DeferredNavigator {
	fn navigate(&mut self, route: &str) {
		*self.pending.borrow_mut() = Some(route.to_owned());
	}
}

/// What a DOM listener needs to reach the engine.
#[derive(Clone)]
struct ListenerContext {
	state: Weak<RefCell<Option<CanvasState>>>,
	canvas: HtmlCanvasElement,
	pending_route: Rc<RefCell<Option<String>>>,
	navigate: Rc<dyn Fn(&str)>,
}

impl ListenerContext {
	fn pointer(&self, event: &Event) -> PointerInput {
		let rect = self.canvas.get_bounding_client_rect();
		let (x, y) = event
			.dyn_ref::<MouseEvent>()
			.map(|ev| (ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
			.unwrap_or_default();
		PointerInput {
			x: x as f32,
			y: y as f32,
			timestamp: event.time_stamp(),
		}
	}

	fn dispatch(&self, kind: ListenerKind, event: Event) {
		// Extra fingers or pens never start a second gesture.
		if event
			.dyn_ref::<PointerEvent>()
			.is_some_and(|pointer| !pointer.is_primary())
		{
			return;
		}
		let Some(cell) = self.state.upgrade() else {
			return;
		};
		{
			let Ok(mut slot) = cell.try_borrow_mut() else {
				warn!("{} arrived while the canvas was busy", kind.event_name());
				return;
			};
			let Some(state) = slot.as_mut() else {
				return;
			};
			match kind {
				ListenerKind::PointerDown => state.pointer_down(self.pointer(&event)),
				ListenerKind::PointerMove => {
					state.pointer_move(self.pointer(&event));
				}
				ListenerKind::PointerUp => state.pointer_up(),
				ListenerKind::PointerLeave => {
					state.pointer_leave();
				}
				ListenerKind::Resize => {
					let (width, height) = window_size();
					self.canvas.set_width(width as u32);
					self.canvas.set_height(height as u32);
					state.resize();
				}
			}
		}

		let route = self.pending_route.borrow_mut().take();
		if let Some(route) = route {
			let navigate = self.navigate.clone();
			// Leaving the page tears this listener down; let it return first.
			spawn_local(async move { navigate(&route) });
		}
	}
}

/// The browser side of the engine: a canvas element plus `window`.
struct CanvasHost {
	context: ListenerContext,
	handlers: HashMap<ListenerKind, Closure<dyn FnMut(Event)>>,
}

impl CanvasHost {
	fn target(&self, kind: ListenerKind) -> Option<EventTarget> {
		if kind.targets_window() {
			web_sys::window().map(Into::into)
		} else {
			Some(self.context.canvas.clone().into())
		}
	}
}

impl HostSurface for CanvasHost {
	fn add_listener(&mut self, kind: ListenerKind) {
		if self.handlers.contains_key(&kind) {
			return;
		}
		let Some(target) = self.target(kind) else {
			return;
		};
		let context = self.context.clone();
		let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
			context.dispatch(kind, event);
		});
		if let Err(err) =
			target.add_event_listener_with_callback(kind.event_name(), closure.as_ref().unchecked_ref())
		{
			error!("could not listen for {}: {err:?}", kind.event_name());
			return;
		}
		self.handlers.insert(kind, closure);
	}

	fn remove_listener(&mut self, kind: ListenerKind) {
		let Some(closure) = self.handlers.remove(&kind) else {
			return;
		};
		if let Some(target) = self.target(kind) {
			let _ = target.remove_event_listener_with_callback(
				kind.event_name(),
				closure.as_ref().unchecked_ref(),
			);
		}
	}

	fn set_cursor(&mut self, cursor: CursorAffordance) {
		// `ElementExt::style` from the leptos prelude shadows the DOM getter.
		let _ = HtmlElement::style(&self.context.canvas).set_property("cursor", cursor.as_css());
	}

	fn viewport_size(&self) -> (f32, f32) {
		(
			self.context.canvas.width() as f32,
			self.context.canvas.height() as f32,
		)
	}
}

#[component]
pub fn ConstellationCanvas(
	#[prop(into, default = DEFAULT_DATA_URL.to_string())] data_url: String,
	#[prop(optional)] config: Option<ConstellationConfig>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let navigate = use_navigate();
	let navigate: Rc<dyn Fn(&str)> =
		Rc::new(move |route: &str| navigate(route, NavigateOptions::default()));

	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let frame_id: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
	let running = Rc::new(Cell::new(true));
	let (state_init, animate_init, frame_id_init, running_init) =
		(state.clone(), animate.clone(), frame_id.clone(), running.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (width, height) = window_size();
		canvas.set_width(width as u32);
		canvas.set_height(height as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("canvas 2d context unavailable");
			return;
		};

		let pending_route = Rc::new(RefCell::new(None));
		let host = CanvasHost {
			context: ListenerContext {
				state: Rc::downgrade(&state_init),
				canvas,
				pending_route: pending_route.clone(),
				navigate: navigate.clone(),
			},
			handlers: HashMap::new(),
		};
		let seed = (js_sys::Math::random() * 2f64.powi(53)) as u64;
		let mut world = ConstellationState::new(
			host,
			DeferredNavigator {
				pending: pending_route,
			},
			config.clone().unwrap_or_default(),
			seed,
		);
		world.attach();
		*state_init.borrow_mut() = Some(world);
		info!("constellation canvas mounted at {width}x{height}");

		let state_load = Rc::downgrade(&state_init);
		let url = data_url.clone();
		spawn_local(async move {
			let document = match fetch_projects(&url).await {
				Ok(document) => Some(document),
				Err(err) => {
					error!("could not load {url}: {err}");
					None
				}
			};
			let Some(cell) = state_load.upgrade() else {
				return;
			};
			let mut slot = cell.borrow_mut();
			let Some(state) = slot.as_mut() else {
				return;
			};
			match document {
				Some(document) => state.load(Some(&document.projects), document.settings),
				None => state.load(None, None),
			}
		});

		let start = js_sys::Date::now();
		let (state_anim, animate_inner, frame_id_inner, running_inner) = (
			state_init.clone(),
			animate_init.clone(),
			frame_id_init.clone(),
			running_init.clone(),
		);
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !running_inner.get() {
				return;
			}
			if let Ok(mut slot) = state_anim.try_borrow_mut() {
				if let Some(state) = slot.as_mut() {
					state.frame(((js_sys::Date::now() - start) / 1000.0) as f32);
					render::render(state, &ctx);
				}
			}
			if let (Some(cb), Some(window)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				frame_id_inner.set(
					window
						.request_animation_frame(cb.as_ref().unchecked_ref())
						.ok(),
				);
			}
		}));
		if let Some(cb) = animate_init.borrow().as_ref() {
			frame_id_init.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	});

	let cleanup = SendWrapper::new((state.clone(), animate, frame_id, running));
	on_cleanup(move || {
		let (state, animate, frame_id, running) = cleanup.take();
		running.set(false);
		if let (Some(id), Some(window)) = (frame_id.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
		animate.borrow_mut().take();
		if let Some(mut world) = state.borrow_mut().take() {
			world.teardown();
		}
	});

	let state_wh = state;
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Ok(mut slot) = state_wh.try_borrow_mut() {
			if let Some(state) = slot.as_mut() {
				state.zoom(ev.delta_y());
			}
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="constellation-canvas"
			on:wheel=on_wheel
			style="display: block; touch-action: none;"
		/>
	}
}
