use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn new_viewer_receives_sorted_snapshot() {
    let app = TestApp::spawn().await;
    for year in [2010, 1990, 2000] {
        app.create_timeline(year, 1.0, 1.0).await;
    }

    let mut viewer = app.connect_viewer().await;
    let event = viewer.wait_for("timelineUpdate").await;

    let years: Vec<i64> = event["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["year"].as_i64().unwrap())
        .collect();
    assert_eq!(years, vec![1990, 2000, 2010]);

    let programs = viewer.wait_for("programUpdate").await;
    assert_eq!(programs["data"], json!([]));
}

#[tokio::test]
async fn mutations_are_pushed_to_connected_viewers() {
    let app = TestApp::spawn().await;
    let mut viewer = app.connect_viewer().await;
    viewer.wait_for("programUpdate").await;

    app.create_program("Launch", 5.0, 5.0).await;
    let event = viewer.wait_for("programUpdate").await;
    assert_eq!(event["data"][0]["title"], "Launch");
}

#[tokio::test]
async fn deleted_collection_disappears_from_next_snapshot() {
    let app = TestApp::spawn().await;
    let id = app.create_timeline(1990, 1.0, 1.0).await;
    let mut viewer = app.connect_viewer().await;
    viewer.wait_for("programUpdate").await;

    app.delete(&routes::timeline(&id)).await;
    let event = viewer.wait_for("timelineUpdate").await;
    assert_eq!(event["data"], json!([]));
}

#[tokio::test]
async fn selection_is_relayed_to_every_viewer() {
    let app = TestApp::spawn().await;
    app.create_timeline(1990, 10.0, 20.0).await;

    let mut sender = app.connect_viewer().await;
    let mut other = app.connect_viewer().await;
    sender.wait_for("programUpdate").await;
    other.wait_for("programUpdate").await;

    sender
        .send(json!({ "event": "selectYear", "data": 1990 }))
        .await;
    let event = other.wait_for("animateYear").await;
    assert_eq!(event["data"]["year"], 1990);
    assert_eq!(event["data"]["xPosition"], 10.0);

    sender
        .send(json!({ "event": "selectYear", "data": null }))
        .await;
    let event = other.wait_for("animateYear").await;
    assert_eq!(event["data"], json!(null));
}

#[tokio::test]
async fn unknown_selection_emits_nothing() {
    let app = TestApp::spawn().await;
    let mut viewer = app.connect_viewer().await;
    viewer.wait_for("programUpdate").await;

    viewer
        .send(json!({ "event": "register", "data": "display" }))
        .await;
    viewer
        .send(json!({ "event": "selectProgram", "data": "Nowhere" }))
        .await;
    viewer.expect_silence().await;
}
