use reqwest::multipart::Form;
use serde_json::json;

use crate::common::{TestApp, file_part, routes};

#[tokio::test]
async fn description_is_trimmed_and_blank_lines_dropped() {
    let app = TestApp::spawn().await;
    let id = app.create_program("Launch", 5.0, 5.0).await;

    let form = Form::new()
        .text("title", "Kickoff")
        .text("description", r#"["line one","  ","line two"]"#)
        .text("xPosition", "1")
        .text("yPosition", "1");
    let res = app.post_multipart(&routes::program_entries(&id), form).await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["message"], "Entry added successfully.");
    let entry = &res.body["data"]["entries"][0];
    assert_eq!(entry["title"], "Kickoff");
    assert_eq!(entry["description"], json!(["line one", "line two"]));
    assert!(app.blobs.uploads().is_empty());
}

#[tokio::test]
async fn json_entry_bodies_are_accepted() {
    let app = TestApp::spawn().await;
    let id = app.create_timeline(1990, 5.0, 5.0).await;

    let body = json!({
        "title": "Founding",
        "description": ["first", ""],
        "xPosition": 12,
        "yPosition": 34
    });
    let res = app
        .post_json(&routes::timeline_entries(&id), &body, Some(&app.token))
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    let entry = &res.body["data"]["entries"][0];
    assert_eq!(entry["description"], json!(["first"]));
    assert_eq!(entry["xPosition"], 12.0);
}

#[tokio::test]
async fn media_without_matching_positions_uploads_nothing() {
    let app = TestApp::spawn().await;
    let id = app.create_program("Launch", 5.0, 5.0).await;

    let form = Form::new()
        .text("title", "Kickoff")
        .part("media", file_part("a.png", "image/png"))
        .part("media", file_part("b.png", "image/png"))
        .text("mediaXPositions[]", "10")
        .text("mediaYPositions[]", "10")
        .text("mediaYPositions[]", "20");
    let res = app.post_multipart(&routes::program_entries(&id), form).await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["error"]["code"], "VALIDATION_ERROR");
    assert!(app.blobs.uploads().is_empty());

    let program = app.get(&routes::program(&id)).await;
    assert_eq!(program.body["data"]["entries"], json!([]));
}

#[tokio::test]
async fn uploads_are_positioned_and_kind_is_detected() {
    let app = TestApp::spawn().await;
    let id = app.create_program("Launch", 5.0, 5.0).await;

    // The declared type is wrong on purpose; the file name wins.
    let form = Form::new()
        .part("media", file_part("clip.mp4", "image/png"))
        .part("media", file_part("still.jpg", "application/octet-stream"))
        .text("mediaXPositions", "10")
        .text("mediaXPositions", "20")
        .text("mediaYPositions", "30")
        .text("mediaYPositions", "40")
        .part("infographic", file_part("chart.png", "image/png"))
        .text("infographicXPositions", "5")
        .text("infographicYPositions", "6");
    let res = app.post_multipart(&routes::program_entries(&id), form).await;

    assert_eq!(res.status, 201, "{}", res.text);
    let entry = &res.body["data"]["entries"][0];
    assert_eq!(entry["media"][0]["mediaType"], "video");
    assert_eq!(entry["media"][1]["mediaType"], "image");
    assert_eq!(entry["media"][1]["xPosition"], 20.0);
    assert_eq!(entry["media"][1]["yPosition"], 40.0);
    assert_eq!(entry["infographics"][0]["xPosition"], 5.0);

    let mimes: Vec<String> = app.blobs.uploads().into_iter().map(|(_, m)| m).collect();
    assert_eq!(mimes, vec!["video/mp4", "image/jpeg", "image/png"]);
}

#[tokio::test]
async fn non_image_media_is_rejected_before_upload() {
    let app = TestApp::spawn().await;
    let id = app.create_program("Launch", 5.0, 5.0).await;

    let form = Form::new()
        .text("title", "Kickoff")
        .part("media", file_part("notes.txt", "text/plain"))
        .text("mediaXPositions", "10")
        .text("mediaYPositions", "10");
    let res = app.post_multipart(&routes::program_entries(&id), form).await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(res.body["message"], "Unsupported media file type: text/plain.");
    assert!(app.blobs.uploads().is_empty());

    let program = app.get(&routes::program(&id)).await;
    assert_eq!(program.body["data"]["entries"], json!([]));
}

#[tokio::test]
async fn video_infographic_is_rejected_before_upload() {
    let app = TestApp::spawn().await;
    let id = app.create_program("Launch", 5.0, 5.0).await;

    let form = Form::new()
        .part("media", file_part("still.png", "image/png"))
        .text("mediaXPositions", "1")
        .text("mediaYPositions", "1")
        .part("infographic", file_part("clip.mp4", "video/mp4"))
        .text("infographicXPositions", "2")
        .text("infographicYPositions", "2");
    let res = app.post_multipart(&routes::program_entries(&id), form).await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["message"], "Unsupported infographic file type: video/mp4.");
    assert!(app.blobs.uploads().is_empty());
}

async fn entry_with_two_media(app: &TestApp) -> (String, String, Vec<String>) {
    let id = app.create_program("Launch", 5.0, 5.0).await;
    let form = Form::new()
        .text("title", "Kickoff")
        .part("media", file_part("a.png", "image/png"))
        .part("media", file_part("b.png", "image/png"))
        .text("mediaXPositions", "10")
        .text("mediaXPositions", "20")
        .text("mediaYPositions", "30")
        .text("mediaYPositions", "40");
    let res = app.post_multipart(&routes::program_entries(&id), form).await;
    assert_eq!(res.status, 201, "{}", res.text);

    let entry = &res.body["data"]["entries"][0];
    let entry_id = entry["id"].as_str().unwrap().to_string();
    let urls = entry["media"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["url"].as_str().unwrap().to_string())
        .collect();
    (id, entry_id, urls)
}

#[tokio::test]
async fn position_count_mismatch_leaves_entry_unchanged() {
    let app = TestApp::spawn().await;
    let (id, entry_id, _) = entry_with_two_media(&app).await;

    let form = Form::new()
        .text("title", "Renamed")
        .text("mediaXPositions", "99")
        .text("mediaYPositions", "99");
    let res = app
        .put_multipart(&routes::program_entry(&id, &entry_id), form)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["message"], "Invalid media positions provided.");

    let program = app.get(&routes::program(&id)).await;
    let entry = &program.body["data"]["entries"][0];
    assert_eq!(entry["title"], "Kickoff");
    assert_eq!(entry["media"][0]["xPosition"], 10.0);
    assert_eq!(entry["media"][1]["yPosition"], 40.0);
}

#[tokio::test]
async fn malformed_description_leaves_entry_unchanged() {
    let app = TestApp::spawn().await;
    let (id, entry_id, _) = entry_with_two_media(&app).await;

    let form = Form::new().text("description", "[not json");
    let res = app
        .put_multipart(&routes::program_entry(&id, &entry_id), form)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["message"], "Invalid description format.");

    let program = app.get(&routes::program(&id)).await;
    assert_eq!(program.body["data"]["entries"][0]["description"], json!([]));
}

#[tokio::test]
async fn replacing_media_deletes_the_old_blobs() {
    let app = TestApp::spawn().await;
    let (id, entry_id, old_urls) = entry_with_two_media(&app).await;
    app.blobs.fail_delete_of(&old_urls[1]);

    let form = Form::new()
        .part("media", file_part("c.png", "image/png"))
        .text("mediaXPositions", "50")
        .text("mediaYPositions", "50");
    let res = app
        .put_multipart(&routes::program_entry(&id, &entry_id), form)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    let media = res.body["data"]["entries"][0]["media"].as_array().unwrap().clone();
    assert_eq!(media.len(), 1);
    assert_eq!(app.blobs.deletes(), old_urls);
}

#[tokio::test]
async fn entry_not_found_is_distinct_from_collection_not_found() {
    let app = TestApp::spawn().await;
    let (id, entry_id, _) = entry_with_two_media(&app).await;

    let res = app
        .delete(&routes::program_entry(
            "00000000-0000-4000-8000-000000000000",
            &entry_id,
        ))
        .await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["message"], "Program not found.");

    let res = app.delete(&routes::program_entry(&id, "nope")).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["message"], "Entry not found.");
}

#[tokio::test]
async fn deleting_an_entry_deletes_its_blobs() {
    let app = TestApp::spawn().await;
    let (id, entry_id, urls) = entry_with_two_media(&app).await;

    let res = app.delete(&routes::program_entry(&id, &entry_id)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["data"]["entries"], json!([]));
    assert_eq!(app.blobs.deletes(), urls);
}

#[tokio::test]
async fn deleting_a_collection_attempts_every_blob() {
    let app = TestApp::spawn().await;
    let (id, _, urls) = entry_with_two_media(&app).await;
    app.blobs.fail_delete_of(&urls[0]);

    let res = app.delete(&routes::program(&id)).await;
    assert_eq!(res.status, 200);
    assert_eq!(app.blobs.deletes(), urls);

    let list = app.get(routes::PROGRAMS).await;
    assert_eq!(list.body["data"], json!([]));
}
