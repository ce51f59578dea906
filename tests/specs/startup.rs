// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup specs against the real `tallyd` binary: missing connection
//! settings must fail fast, before anything touches the network.

use assert_cmd::Command;

fn tallyd() -> Command {
    let mut cmd = Command::cargo_bin("tallyd").unwrap();
    cmd.env_clear();
    cmd
}

#[test]
fn missing_jenkins_url_is_fatal() {
    let assert = tallyd().assert().failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("JENKINS_URL"), "stderr was: {stderr}");
}

#[test]
fn missing_api_token_is_fatal() {
    let assert = tallyd()
        .env("JENKINS_URL", "https://jenkins.example.com")
        .env("JENKINS_USER", "ci")
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("JENKINS_API_TOKEN"), "stderr was: {stderr}");
}

#[test]
fn invalid_job_filter_is_fatal() {
    let assert = tallyd()
        .env("JENKINS_URL", "https://jenkins.example.com")
        .env("JENKINS_USER", "ci")
        .env("JENKINS_API_TOKEN", "token")
        .env("JENKINS_JOB_FILTER_REGEX", "(unclosed")
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("JENKINS_JOB_FILTER_REGEX"), "stderr was: {stderr}");
}
