mod app;
mod chrome;
mod editor;
mod gateway;
mod history;
mod markdown;
mod session;
mod timer;

use app::App;

fn main() {
    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(App);
}
