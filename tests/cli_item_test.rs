//! Integration tests for item commands via CLI.
//!
//! These tests verify that item commands work correctly through the CLI:
//! - `wp item add/show/update/remove` all work
//! - `wp item reorder/move/transfer` keep the documented ordering rules
//! - Not-found references fail, not-found targets are reported as no-ops

mod common;

use common::{TestEnv, stdout_json};
use predicates::prelude::*;

#[test]
fn test_item_add_appends() {
    let env = TestEnv::seeded();

    env.wp()
        .args(["item", "add", "Work", "Wiki", "https://wiki.example", "--icon", "img/wiki.png"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"outcome\":\"applied\""));

    assert_eq!(env.titles("Work"), vec!["Docs", "Mail", "Chat", "Wiki"]);
    let doc = env.document_json();
    assert_eq!(doc["categories"][0]["items"][3]["icon"], "img/wiki.png");
}

#[test]
fn test_item_add_to_missing_category_fails() {
    let env = TestEnv::seeded();
    let before = env.read_document();

    env.wp()
        .args(["item", "add", "Nowhere", "X", "https://x.example"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
    assert_eq!(env.read_document(), before);
}

#[test]
fn test_item_add_duplicate_title_fails() {
    let env = TestEnv::seeded();

    env.wp()
        .args(["item", "add", "Work", "Mail", "https://other.example"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Already exists"));
    assert_eq!(env.titles("Work"), vec!["Docs", "Mail", "Chat"]);
}

#[test]
fn test_item_show() {
    let env = TestEnv::seeded();
    env.wp()
        .args(["item", "add", "Home", "Photos", "https://photos.example", "-i", "img/photos.png"])
        .assert()
        .success();

    let output = env.wp().args(["item", "show", "Home", "Photos"]).output().unwrap();
    assert!(output.status.success());
    let item = stdout_json(&output);
    assert_eq!(item["category"], "Home");
    assert_eq!(item["url"], "https://photos.example");
    let image = env.data_path().join("img").join("photos.png");
    assert_eq!(item["image_path"], image.display().to_string());

    env.wp()
        .args(["item", "show", "Home", "Photos", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Home / Photos"))
        .stdout(predicate::str::contains("URL:  https://photos.example"));
}

#[test]
fn test_item_show_missing() {
    let env = TestEnv::seeded();

    env.wp()
        .args(["item", "show", "Work", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found: item 'Nope' in category 'Work'"));
}

#[test]
fn test_item_update_keeps_position() {
    let env = TestEnv::seeded();

    env.wp()
        .args(["item", "update", "Work", "Mail", "--title", "Email", "--url", "https://email.example"])
        .assert()
        .success();

    assert_eq!(env.titles("Work"), vec!["Docs", "Email", "Chat"]);
    let doc = env.document_json();
    assert_eq!(doc["categories"][0]["items"][1]["url"], "https://email.example");
}

#[test]
fn test_item_update_preserves_unknown_keys() {
    let env = TestEnv::new();
    env.write_document(
        r#"{"categories": [{"name": "Work", "items": [{"title": "Mail", "url": "https://mail.example", "icon": "", "color": "red"}]}]}"#,
    );

    env.wp()
        .args(["item", "update", "Work", "Mail", "--icon", "fas fa-envelope"])
        .assert()
        .success();

    let doc = env.document_json();
    let item = &doc["categories"][0]["items"][0];
    assert_eq!(item["icon"], "fas fa-envelope");
    assert_eq!(item["color"], "red");
}

#[test]
fn test_item_remove() {
    let env = TestEnv::seeded();

    env.wp()
        .args(["item", "remove", "Work", "Mail", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed Mail from Work"));
    assert_eq!(env.titles("Work"), vec!["Docs", "Chat"]);
}

#[test]
fn test_item_remove_nonexistent_is_byte_identical() {
    let env = TestEnv::seeded();
    let before = env.read_document();

    env.wp()
        .args(["item", "remove", "Work", "nonexistent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"outcome\":\"unchanged\""));
    assert_eq!(env.read_document(), before);
}

#[test]
fn test_item_reorder() {
    let env = TestEnv::new();
    env.wp().args(["category", "add", "Work"]).assert().success();
    for title in ["A", "B", "C", "D"] {
        env.wp()
            .args(["item", "add", "Work", title, "https://x.example"])
            .assert()
            .success();
    }

    env.wp()
        .args(["item", "reorder", "Work", "C", "A", "Unknown"])
        .assert()
        .success();
    assert_eq!(env.titles("Work"), vec!["C", "A", "B", "D"]);
}

#[test]
fn test_item_move_up_and_down() {
    let env = TestEnv::seeded();

    env.wp().args(["item", "move", "Work", "Chat", "up"]).assert().success();
    assert_eq!(env.titles("Work"), vec!["Docs", "Chat", "Mail"]);

    env.wp().args(["item", "move", "Work", "Docs", "DOWN"]).assert().success();
    assert_eq!(env.titles("Work"), vec!["Chat", "Docs", "Mail"]);
}

#[test]
fn test_item_move_at_boundary_is_noop() {
    let env = TestEnv::seeded();
    let before = env.read_document();

    env.wp()
        .args(["item", "move", "Work", "Docs", "up", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("No change"));
    env.wp().args(["item", "move", "Work", "Chat", "down"]).assert().success();
    assert_eq!(env.read_document(), before);
}

#[test]
fn test_item_move_bad_direction() {
    let env = TestEnv::seeded();

    env.wp()
        .args(["item", "move", "Work", "Docs", "left"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn test_item_transfer() {
    let env = TestEnv::seeded();
    env.wp()
        .args(["item", "add", "Home", "News", "https://news.example"])
        .assert()
        .success();

    env.wp()
        .args(["item", "transfer", "Work", "Home", "Mail"])
        .assert()
        .success();
    assert_eq!(env.titles("Work"), vec!["Docs", "Chat"]);
    assert_eq!(env.titles("Home"), vec!["News", "Mail"]);
}

#[test]
fn test_item_transfer_to_missing_category_keeps_item() {
    let env = TestEnv::seeded();
    let before = env.read_document();

    env.wp()
        .args(["item", "transfer", "Work", "Nowhere", "Mail"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found: category 'Nowhere'"));
    assert_eq!(env.read_document(), before);
}
