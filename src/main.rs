//! SmartMark: a minimal personal bookmark manager with real-time sync.
//!
//! Console demo: two sessions for the same user (think two browser tabs)
//! share one in-memory store and stay in sync through the change feed.

use std::sync::Arc;
use std::time::Duration;

use smartmark::managers::sync_session::SyncSession;
use smartmark::services::formatting::{display_host, relative_time};
use smartmark::services::sqlite_store::SqliteBookmarkStore;
use smartmark::types::session::SessionUser;

type DemoResult = Result<(), Box<dyn std::error::Error>>;

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn print_list(label: &str, session: &SyncSession) {
    let now = chrono::Utc::now().timestamp_millis();
    println!("  [{}] {} bookmark(s)", label, session.len());
    for b in session.snapshot() {
        println!(
            "    • {} ({}, {})",
            b.title,
            display_host(&b.url),
            relative_time(b.created_at, now)
        );
    }
}

/// Lets the change-feed tasks deliver pending events.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::main]
async fn main() -> DemoResult {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    println!();
    println!("  SmartMark v{} Demo Mode", env!("CARGO_PKG_VERSION"));
    println!();

    let store = Arc::new(SqliteBookmarkStore::open_in_memory()?);
    let user = SessionUser::new("demo-user", Some("ada@example.com".to_string()));

    section("Session start");
    let tab_a = SyncSession::new(user.clone(), store.clone());
    let tab_b = SyncSession::new(user.clone(), store.clone());
    tab_a.subscribe_to_changes(|event| println!("    ⇠ tab A saw {} {}", event.kind(), event.id()));
    tab_b.subscribe_to_changes(|event| println!("    ⇠ tab B saw {} {}", event.kind(), event.id()));
    tab_a.initialize().await?;
    tab_b.initialize().await?;
    println!("  Signed in as {} [{}]", user.display_name(), user.initial());

    section("Optimistic create + reconciliation");
    tab_a.add_bookmark("The Rust Book", "https://doc.rust-lang.org/book/").await?;
    let docs = tab_a.add_bookmark("Docs.rs", "https://www.docs.rs").await?;
    settle().await;
    print_list("A", &tab_a);
    print_list("B", &tab_b);

    section("Validation");
    for (title, url) in [("", "https://example.com"), ("FTP", "ftp://example.com")] {
        if let Err(e) = tab_a.add_bookmark(title, url).await {
            println!("  Rejected ({:?}, {:?}): {}", title, url, e);
        }
    }

    section("Edit from another device");
    store.rename(&docs.id, "Docs.rs crate docs")?;
    settle().await;
    print_list("B", &tab_b);

    section("Delete");
    tab_b.delete_bookmark(&docs.id).await?;
    settle().await;
    print_list("A", &tab_a);

    section("Teardown");
    tab_a.teardown();
    tab_a.teardown();
    tab_b.teardown();
    println!(
        "  Subscriptions closed (A: {}, B: {})",
        !tab_a.is_subscribed(),
        !tab_b.is_subscribed()
    );
    println!();
    Ok(())
}
