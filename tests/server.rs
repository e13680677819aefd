//! HTTP API tests against a server bound to a free local port.

use docupilot::config::Config;
use docupilot::server::run_server;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SITE_CONFIG: &str = r#"export default {
  plugins: [],
  themeConfig: {
    navbar: {
      items: [{type: 'dropdown', label: 'Projects', items: []}],
    },
  },
};
"#;

const OK_SCRIPT: &str = r#"#!/bin/bash
set -e
slug=$(echo "$1" | tr '[:upper:]' '[:lower:]' | sed -e 's/[^a-z0-9]/-/g' -e 's/--*/-/g' -e 's/^-//' -e 's/-$//')
mkdir -p "$REPOS/$slug"
mkdir -p "$SITE/$slug"
echo "digest" > "$SITE/$slug/digest.txt"
echo "ok"
"#;

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("server on port {} did not become ready", port);
}

fn test_config(root: &Path, port: u16) -> Config {
    let content = format!(
        r#"[db]
path = "{root}/data/docupilot.sqlite"

[site]
root = "{root}/site"

[workspace]
repositories = "{root}/repositories"
backups = "{root}/backups"
init_script = "{root}/scripts/initialize-project.sh"

[server]
bind = "127.0.0.1:{port}"
"#,
        root = root.display(),
        port = port
    );
    toml::from_str(&content).unwrap()
}

async fn start_server() -> (TempDir, String) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("site")).unwrap();
    fs::write(root.join("site").join("docusaurus.config.js"), SITE_CONFIG).unwrap();
    fs::create_dir_all(root.join("scripts")).unwrap();
    let script = OK_SCRIPT
        .replace("$REPOS", &root.join("repositories").display().to_string())
        .replace("$SITE", &root.join("site").display().to_string());
    fs::write(root.join("scripts").join("initialize-project.sh"), script).unwrap();

    let port = find_free_port();
    let cfg = test_config(root, port);
    tokio::spawn(async move {
        let _ = run_server(&cfg).await;
    });
    wait_for_server(port).await;

    (tmp, format!("http://127.0.0.1:{}", port))
}

#[tokio::test]
async fn test_health() {
    let (_tmp, base) = start_server().await;
    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "docupilot");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_project_crud_over_http() {
    let (tmp, base) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/project/create-project", base))
        .json(&json!({
            "projectTitle": "Tesla RHBme",
            "repositoryUrl": "git@github.com:acme/tesla.git",
            "branchName": "main"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["slug"], "tesla-rhbme");
    assert_eq!(body["data"]["branchName"], "main");
    assert_eq!(body["warnings"], json!([]));

    let config = fs::read_to_string(tmp.path().join("site/docusaurus.config.js")).unwrap();
    assert!(config.contains("docsPluginId: 'tesla-rhbme'"));

    let body: Value = client
        .get(format!("{}/api/project/projects", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["projects"].as_array().unwrap().len(), 1);
    assert_eq!(body["projects"][0]["hasRepository"], true);
    assert_eq!(body["projects"][0]["hasDocumentation"], true);

    let body: Value = client
        .get(format!("{}/api/project/search?q=RHB", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["projects"][0]["slug"], "tesla-rhbme");

    let resp = client
        .get(format!("{}/api/project/search?q=", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let resp = client
        .post(format!("{}/api/project/create-project", base))
        .json(&json!({
            "projectTitle": "tesla rhbme",
            "repositoryUrl": "https://github.com/acme/tesla.git"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "conflict");

    let body: Value = client
        .get(format!("{}/api/project/stats", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["stats"]["totalProjects"], 1);
    assert_eq!(body["stats"]["activeProjects"], 1);

    let resp = client
        .delete(format!("{}/api/project/projects/tesla-rhbme", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body["backup"]
        .as_str()
        .unwrap()
        .contains("tesla-rhbme_deleted_"));

    let resp = client
        .delete(format!("{}/api/project/projects/tesla-rhbme", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_create_rejects_bad_input() {
    let (_tmp, base) = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/project/create-project", base))
        .json(&json!({ "projectTitle": "Alpha" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let resp = client
        .post(format!("{}/api/project/create-project", base))
        .json(&json!({ "projectTitle": "Alpha", "repositoryUrl": "not a url" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{}/api/project/create-project", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (_tmp, base) = start_server().await;
    let resp = reqwest::get(format!("{}/api/nope", base)).await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");
}
