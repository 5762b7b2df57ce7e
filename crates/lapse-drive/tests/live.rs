//! Live Drive integration tests.
//!
//! These run against real credentials and are ignored by default.

use lapse_drive::{DriveClient, FolderId};

fn root_folder() -> FolderId {
    FolderId::new(
        std::env::var("DRIVE_ROOT_FOLDER_ID").expect("DRIVE_ROOT_FOLDER_ID must be set"),
    )
}

/// Test Drive connection and root folder access.
#[tokio::test]
#[ignore = "requires Drive credentials"]
async fn test_drive_connection() {
    dotenvy::dotenv().ok();

    let client = DriveClient::from_env().expect("Failed to create Drive client");

    let name = client
        .verify_folder(&root_folder())
        .await
        .expect("Failed to verify root folder");
    println!("Root folder verified: {}", name);
}

/// Test folder find-or-create idempotence.
#[tokio::test]
#[ignore = "requires Drive credentials"]
async fn test_find_or_create_is_idempotent() {
    dotenvy::dotenv().ok();

    let client = DriveClient::from_env().expect("Failed to create Drive client");
    let root = root_folder();

    let first = client
        .find_or_create_folder(&root, "lapse_integration_test")
        .await
        .expect("Failed to create folder");
    let second = client
        .find_or_create_folder(&root, "lapse_integration_test")
        .await
        .expect("Failed to find folder");

    assert_eq!(first, second);
}
