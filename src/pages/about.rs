use leptos::prelude::*;
use leptos_router::components::A;

/// Destination of the portal.
#[component]
pub fn About() -> impl IntoView {
	view! {
		<main class="about">
			<h1>"About"</h1>
			<p>"Design, development and video editing, one orbit at a time."</p>
			<A href="/">"Back to the universe"</A>
		</main>
	}
}
