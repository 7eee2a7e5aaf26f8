//! The presentation shell: window chrome, sidebar, editor/preview split,
//! and the async drivers that connect user intents to the session model.
//!
//! Every driver that awaits host I/O re-resolves session entries by id
//! before mutating; completions may land out of issue order.

use leptos::logging;
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::prelude::*;
use web_sys::MouseEvent;

use crate::chrome::{self, EdgeRegion};
use crate::editor::{EmptyState, Preview, Writer};
use crate::gateway::{self, GatewayError, NoteEntry};
use crate::history;
use crate::session::{FileId, Session};
use crate::timer::DelayedTask;

const NOTICE_DISMISS_MS: i32 = 4000;

fn fire(op: impl std::future::Future<Output = Result<(), GatewayError>> + 'static) {
    spawn_local(async move {
        if let Err(err) = op.await {
            logging::warn!("window control failed: {err}");
        }
    });
}

#[component]
pub fn App() -> impl IntoView {
    let session = RwSignal::new(Session::new());
    let notes = RwSignal::new(Vec::<NoteEntry>::new());
    let dark = RwSignal::new(false);
    let notice = RwSignal::new(None::<String>);

    let notice_timer = StoredValue::new_local(DelayedTask::new());
    let persist_timer = StoredValue::new_local(DelayedTask::new());

    let title_bar = EdgeRegion::new(chrome::HIDE_DELAY_MS);
    let sidebar = EdgeRegion::new(chrome::HIDE_DELAY_MS);
    chrome::watch_edges(title_bar, sidebar);

    let notify = move |message: String| {
        logging::error!("{message}");
        notice.set(Some(message));
        notice_timer.with_value(|timer| {
            timer.schedule(NOTICE_DISMISS_MS, move || notice.set(None));
        });
    };

    let refresh_notes = move || {
        spawn_local(async move {
            match gateway::list_notes().await {
                Ok(entries) => notes.set(entries),
                Err(err) => logging::warn!("listing notes failed: {err}"),
            }
        });
    };

    let do_new = move || {
        session.update(|s| {
            s.create_new_file();
        });
    };

    let do_open = move || {
        spawn_local(async move {
            match gateway::pick_and_open().await {
                Ok(Some(info)) => session.update(|s| {
                    s.adopt(info);
                }),
                Ok(None) => {}
                Err(err) => notify(format!("Could not open file: {err}")),
            }
        });
    };

    let do_save = move || {
        let Some(current) = session.with_untracked(|s| s.current_file().cloned()) else {
            return;
        };
        spawn_local(async move {
            let existing = (!current.path.is_empty()).then_some(current.path.as_str());
            match gateway::pick_and_save(&current.content, existing).await {
                Ok(Some(path)) => {
                    session.update(|s| {
                        s.apply_save(current.id, path);
                    });
                    refresh_notes();
                }
                Ok(None) => {}
                Err(err) => notify(format!("Could not save file: {err}")),
            }
        });
    };

    let do_load_path = move |path: String| {
        spawn_local(async move {
            let key = gateway::normalize_path_key(&path);
            let already_open = session
                .try_update(|s| s.select_existing_path(&key))
                .unwrap_or(false);
            if already_open {
                return;
            }
            match gateway::read_by_path(&path).await {
                Ok(Some(info)) => session.update(|s| {
                    s.adopt(info);
                }),
                Ok(None) => logging::warn!("file vanished before it could be opened: {path}"),
                Err(err) => notify(format!("Could not load {path}: {err}")),
            }
        });
    };

    let do_select = move |id: FileId| {
        session.update(|s| s.select_file(id));
    };

    let do_close = move |id: FileId| {
        let closed = session
            .try_update(|s| s.close_file(id, false))
            .unwrap_or(true);
        if closed {
            return;
        }
        let confirmed = window()
            .confirm_with_message("This file has unsaved changes. Close it anyway?")
            .unwrap_or(false);
        if confirmed {
            session.update(|s| {
                s.close_file(id, true);
            });
        }
    };

    // Restore the previous session first, then load the notes listing and
    // any file path the process was launched with.
    spawn_local(async move {
        if let Some(snapshot) = history::load() {
            let mut entries = Vec::new();
            for old_id in &snapshot.file_order {
                let Some(record) = snapshot.files.get(old_id) else {
                    continue;
                };
                if history::is_discardable(record) {
                    continue;
                }
                if record.path.is_empty() {
                    entries.push(history::restore_untitled(old_id, record));
                    continue;
                }
                match gateway::read_by_path(&record.path).await {
                    Ok(Some(on_disk)) => {
                        entries.push(history::reconcile(old_id, record, on_disk));
                    }
                    Ok(None) => {
                        logging::log!("restored file is gone from disk: {}", record.path);
                    }
                    Err(err) => {
                        logging::warn!("skipping restored file {}: {err}", record.path);
                    }
                }
            }
            if !entries.is_empty() {
                session.update(|s| s.restore(entries, snapshot.current_file_id.as_deref()));
            }
        }

        refresh_notes();

        match gateway::launch_file().await {
            Ok(Some(path)) => do_load_path(path),
            Ok(None) => {}
            Err(err) => logging::warn!("launch argument unavailable: {err}"),
        }
    });

    // Host-initiated "open this file" requests.
    let on_open_event = Closure::<dyn FnMut(JsValue)>::new(move |ev: JsValue| {
        if let Ok(payload) = js_sys::Reflect::get(&ev, &JsValue::from_str("payload")) {
            if let Some(path) = payload.as_string() {
                do_load_path(path);
            }
        }
    });
    spawn_local(async move {
        gateway::listen("open-file", on_open_event.as_ref().unchecked_ref()).await;
        on_open_event.forget();
    });

    // Theme tracking via the webview's color scheme.
    if let Ok(Some(query)) = window().match_media("(prefers-color-scheme: dark)") {
        dark.set(query.matches());
        let tracked = query.clone();
        let on_scheme_change =
            Closure::<dyn FnMut(web_sys::Event)>::new(move |_| dark.set(tracked.matches()));
        if query
            .add_event_listener_with_callback("change", on_scheme_change.as_ref().unchecked_ref())
            .is_ok()
        {
            on_scheme_change.forget();
        }
    }

    // Debounced snapshot after every settled change while files are open.
    Effect::new(move |_| {
        let json = session.with(|s| (!s.is_empty()).then(|| history::encode_session(s)));
        let Some(json) = json else {
            return;
        };
        persist_timer.with_value(|timer| {
            timer.schedule(history::SAVE_DEBOUNCE_MS, move || history::write_raw(&json));
        });
    });

    // Best-effort flush on teardown; localStorage writes are synchronous.
    let flush = Closure::<dyn FnMut()>::new(move || {
        persist_timer.with_value(|timer| timer.cancel());
        session.with_untracked(|s| {
            if s.is_empty() {
                history::clear();
            } else {
                history::save_now(s);
            }
        });
    });
    if window()
        .add_event_listener_with_callback("beforeunload", flush.as_ref().unchecked_ref())
        .is_err()
    {
        logging::warn!("beforeunload flush not installed");
    }
    flush.forget();

    let current_id = Memo::new(move |_| session.with(|s| s.current_file_id()));
    let content = Signal::derive(move || {
        session.with(|s| {
            s.current_file()
                .map(|file| file.content.clone())
                .unwrap_or_default()
        })
    });
    let current_label = Memo::new(move |_| {
        session.with(|s| {
            s.current_file().map(|file| {
                if file.has_unsaved_changes {
                    format!("{} •", file.name)
                } else {
                    file.name.clone()
                }
            })
        })
    });

    view! {
        <main class="app" class:dark=move || dark.get()>
            <header
                class="title-bar"
                class:visible=move || title_bar.is_visible()
                data-tauri-drag-region=""
                on:mouseenter=move |_| title_bar.show()
                on:mouseleave=move |_| title_bar.schedule_hide()
            >
                <div class="title-bar-left" data-tauri-drag-region="">
                    <span class="app-name">"plume"</span>
                    <span class="current-file">
                        {move || current_label.get().unwrap_or_default()}
                    </span>
                </div>
                <div class="window-controls">
                    <button title="Minimize" on:click=move |_| fire(gateway::minimize_window())>
                        "—"
                    </button>
                    <button
                        title="Maximize"
                        on:click=move |_| fire(gateway::toggle_maximize_window())
                    >
                        "▢"
                    </button>
                    <button
                        class="close"
                        title="Close"
                        on:click=move |_| fire(gateway::close_window())
                    >
                        "✕"
                    </button>
                </div>
            </header>

            <aside
                class="sidebar"
                class:visible=move || sidebar.is_visible()
                on:mouseenter=move |_| sidebar.show()
                on:mouseleave=move |_| sidebar.schedule_hide()
            >
                <div class="sidebar-panel">
                    <div class="sidebar-head">
                        <span>"Open files"</span>
                        <div class="sidebar-actions">
                            <button title="New file" on:click=move |_| do_new()>"+"</button>
                            <button title="Open file" on:click=move |_| do_open()>
                                "Open…"
                            </button>
                        </div>
                    </div>
                    <div class="file-list">
                        {move || {
                            session
                                .with(|s| {
                                    let current = s.current_file_id();
                                    s.files()
                                        .iter()
                                        .map(|file| {
                                            let id = file.id;
                                            let name = file.name.clone();
                                            let dirty = file.has_unsaved_changes;
                                            view! {
                                                <div
                                                    class="file-item"
                                                    class:active=current == Some(id)
                                                    on:click=move |_| do_select(id)
                                                >
                                                    <span class="file-name">{name}</span>
                                                    {dirty
                                                        .then(|| {
                                                            view! { <span class="dirty-dot">"●"</span> }
                                                        })}
                                                    <button
                                                        class="file-close"
                                                        title="Close"
                                                        on:click=move |ev: MouseEvent| {
                                                            ev.stop_propagation();
                                                            do_close(id);
                                                        }
                                                    >
                                                        "×"
                                                    </button>
                                                </div>
                                            }
                                        })
                                        .collect::<Vec<_>>()
                                })
                        }}
                    </div>
                    <div class="sidebar-head notes-head">
                        <span>"Notes"</span>
                    </div>
                    <div class="note-list">
                        {move || {
                            notes
                                .get()
                                .into_iter()
                                .map(|entry: NoteEntry| {
                                    let path = entry.path;
                                    view! {
                                        <div
                                            class="note-item"
                                            on:click=move |_| do_load_path(path.clone())
                                        >
                                            {entry.name}
                                        </div>
                                    }
                                })
                                .collect::<Vec<_>>()
                        }}
                    </div>
                </div>
            </aside>

            <section class="workspace">
                {move || {
                    if current_id.get().is_some() {
                        view! {
                            <div class="split">
                                <Writer
                                    content=content
                                    on_change=Callback::new(move |text: String| {
                                        session.update(|s| s.update_content(text))
                                    })
                                    on_save=move || do_save()
                                />
                                <Preview content=content dark=dark />
                            </div>
                        }
                            .into_any()
                    } else {
                        view! {
                            <EmptyState
                                on_new=move || do_new()
                                on_open=move || do_open()
                            />
                        }
                            .into_any()
                    }
                }}
            </section>

            {move || notice.get().map(|message| view! { <div class="notice">{message}</div> })}
        </main>
    }
}
