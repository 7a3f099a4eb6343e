use leptos::prelude::*;
use leptos_router::components::A;

/// 404 Not Found Page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<h1>"Lost in space"</h1>
		<p>"Nothing orbits here."</p>
		<A href="/">"Return home"</A>
	}
}
