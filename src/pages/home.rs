use leptos::prelude::*;

use crate::components::constellation::ConstellationCanvas;

/// Landing page: the project constellation fills the viewport.
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-constellation">
				<ConstellationCanvas />
				<div class="constellation-overlay">
					<h1>"A Universe of Work"</h1>
					<p class="subtitle">
						"Drag planets to pull them around. Scroll to zoom. Drag empty space to pan. Click the portal to learn more."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
