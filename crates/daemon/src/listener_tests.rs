// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::test_fixtures::{fixture, Fixture};
use super::handle_request;
use crate::protocol::{Request, RpcRequest};

async fn call(f: &Fixture, method: &str, params: serde_json::Value) -> Result<serde_json::Value, mh_core::DomainError> {
    let request = Request::parse(RpcRequest {
        id: Some(1),
        method: method.to_string(),
        params,
    })
    .map_err(|e| mh_core::DomainError::invalid_param(e.to_string()))?;
    handle_request(request, &f.ctx, CancellationToken::new()).await
}

#[tokio::test]
async fn runtime_list_includes_local() {
    let f = fixture();
    let value = call(&f, "runtime.list", json!({})).await.unwrap();
    let ids: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["local"]);
}

#[tokio::test]
async fn runtime_test_connection_classifies_failures() {
    let f = fixture();
    let ok = call(&f, "runtime.testConnection", json!({})).await.unwrap();
    assert_eq!(ok["ok"], true);

    f.mux.fail_all(mh_adapters::mux::MuxError::ConnectionRefused("nope".into()));
    let down = call(&f, "runtime.testConnection", json!({})).await.unwrap();
    assert_eq!(down["ok"], false);
    assert_eq!(down["reason"], "connection refused");
}

#[tokio::test]
async fn unknown_runtime_is_not_found() {
    let f = fixture();
    let err = call(&f, "runtime.testConnection", json!({"runtime": "r9"})).await.unwrap_err();
    assert_eq!(err.kind, mh_core::ErrorKind::NotFound);
}

#[tokio::test]
async fn session_create_conflicts_on_duplicate() {
    let f = fixture();
    call(&f, "session.create", json!({"name": "work"})).await.unwrap();
    let err = call(&f, "session.create", json!({"name": "work"})).await.unwrap_err();
    assert_eq!(err.kind, mh_core::ErrorKind::Conflict);
}

#[tokio::test]
async fn lane_crud_round_trip() {
    let f = fixture();
    let lane = call(
        &f,
        "kanban.createLane",
        json!({"name": "Demo", "workingDir": "/tmp/p", "autoClose": true}),
    )
    .await
    .unwrap();
    let lane_id = lane["id"].as_str().unwrap().to_string();
    assert_eq!(lane["autoClose"], true);
    assert_eq!(lane["sessionActive"], false);

    let lanes = call(&f, "kanban.listLanes", json!({})).await.unwrap();
    assert_eq!(lanes.as_array().unwrap().len(), 1);

    let edited = call(
        &f,
        "kanban.editSwimLane",
        json!({"laneId": lane_id, "name": "Renamed"}),
    )
    .await
    .unwrap();
    assert_eq!(edited["name"], "Renamed");

    call(&f, "kanban.deleteLane", json!({"laneId": lane_id})).await.unwrap();
    let lanes = call(&f, "kanban.listLanes", json!({})).await.unwrap();
    assert!(lanes.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn task_submit_move_and_query() {
    let f = fixture();
    let lane = f.lane("Demo");
    let task = call(
        &f,
        "task.submit",
        json!({"description": "write hello.py", "swimLaneId": lane.id, "priority": 7}),
    )
    .await
    .unwrap();
    let task_id = task["id"].as_str().unwrap().to_string();
    assert_eq!(task["status"], "pending");

    let moved = call(
        &f,
        "kanban.moveTask",
        json!({"taskId": task_id, "column": "done"}),
    )
    .await
    .unwrap();
    assert_eq!(moved["kanbanColumn"], "done");
    assert!(moved["doneAt"].is_u64());

    let queried = call(&f, "kanban.getTask", json!({"taskId": task_id})).await.unwrap();
    assert_eq!(queried["status"], "completed");
}

#[tokio::test]
async fn start_task_binds_and_stop_unbinds() {
    let f = fixture();
    let lane = f.lane("Demo");
    let task = call(
        &f,
        "task.submit",
        json!({"description": "bound work", "swimLaneId": lane.id}),
    )
    .await
    .unwrap();
    let task_id = task["id"].as_str().unwrap().to_string();

    let started = call(&f, "kanban.startTask", json!({"taskId": task_id})).await.unwrap();
    assert_eq!(started["status"], "in_progress");
    assert!(started["binding"]["sessionName"].as_str().unwrap().contains("lane-demo"));

    let attach = call(&f, "kanban.attachTask", json!({"taskId": task_id})).await.unwrap();
    assert_eq!(attach["sessionName"], started["binding"]["sessionName"]);

    let stopped = call(&f, "kanban.stopTask", json!({"taskId": task_id})).await.unwrap();
    assert_eq!(stopped["status"], "pending");
    assert!(stopped["binding"].is_null());
}

#[tokio::test]
async fn task_cancel_is_terminal_and_conflicts_thereafter() {
    let f = fixture();
    let lane = f.lane("Demo");
    let task = call(
        &f,
        "task.submit",
        json!({"description": "cancel me", "swimLaneId": lane.id}),
    )
    .await
    .unwrap();
    let task_id = task["id"].as_str().unwrap().to_string();

    let cancelled = call(&f, "task.cancel", json!({"taskId": task_id})).await.unwrap();
    assert_eq!(cancelled["status"], "cancelled");
    let err = call(&f, "task.cancel", json!({"taskId": task_id})).await.unwrap_err();
    assert_eq!(err.kind, mh_core::ErrorKind::Conflict);
}

#[tokio::test]
async fn subtask_merge_and_split_box() {
    let f = fixture();
    let lane = f.lane("Demo");
    let a = call(&f, "task.submit", json!({"description": "a", "swimLaneId": lane.id}))
        .await
        .unwrap();
    let b = call(&f, "task.submit", json!({"description": "b", "swimLaneId": lane.id}))
        .await
        .unwrap();

    let parent = call(
        &f,
        "kanban.mergeTasks",
        json!({"taskIds": [a["id"], b["id"]], "description": "the box"}),
    )
    .await
    .unwrap();
    assert_eq!(parent["subtaskIds"].as_array().unwrap().len(), 2);

    let child = call(
        &f,
        "kanban.addSubtask",
        json!({"parentTaskId": parent["id"], "description": "c"}),
    )
    .await
    .unwrap();
    assert_eq!(child["parentTaskId"], parent["id"]);

    let children = call(&f, "kanban.splitTaskBox", json!({"taskId": parent["id"]}))
        .await
        .unwrap();
    assert_eq!(children.as_array().unwrap().len(), 3);
    let err = call(&f, "kanban.getTask", json!({"taskId": parent["id"]})).await.unwrap_err();
    assert_eq!(err.kind, mh_core::ErrorKind::NotFound, "the box itself is deleted");
}

#[tokio::test]
async fn team_family_round_trip() {
    let f = fixture();
    let team = call(&f, "team.create", json!({"name": "alpha"})).await.unwrap();
    let team_id = team["id"].as_str().unwrap().to_string();

    let updated = call(
        &f,
        "team.addAgent",
        json!({"teamId": team_id, "agentId": "agt-x"}),
    )
    .await
    .unwrap();
    assert_eq!(updated["agentIds"].as_array().unwrap().len(), 1);

    let found = call(&f, "team.findByAgent", json!({"agentId": "agt-x"})).await.unwrap();
    assert_eq!(found["id"].as_str().unwrap(), team_id);

    call(&f, "team.removeAgent", json!({"teamId": team_id, "agentId": "agt-x"}))
        .await
        .unwrap();
    call(&f, "team.delete", json!({"teamId": team_id})).await.unwrap();
    let err = call(&f, "team.query", json!({"teamId": team_id})).await.unwrap_err();
    assert_eq!(err.kind, mh_core::ErrorKind::NotFound);
}

#[tokio::test]
async fn pipeline_family_and_fan_out_results() {
    let f = fixture();
    let pipeline = call(
        &f,
        "pipeline.create",
        json!({
            "name": "p",
            "stages": [{
                "id": "stg-one",
                "name": "fan",
                "type": "fan_out",
                "agentRole": "coder",
                "taskDescription": "do part",
                "fanOutCount": 2
            }]
        }),
    )
    .await
    .unwrap();
    let run = call(
        &f,
        "pipeline.startRun",
        json!({"pipelineId": pipeline["id"]}),
    )
    .await
    .unwrap();
    assert_eq!(run["status"], "running");

    let results = call(&f, "task.getFanOutResults", json!({"stageId": "stg-one"}))
        .await
        .unwrap();
    assert_eq!(results["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn health_reports_runtimes_and_database() {
    let f = fixture();
    let health = call(&f, "health.get", json!({})).await.unwrap();
    assert_eq!(health["ok"], true);
    assert_eq!(health["runtimes"][0]["id"], "local");
    assert_eq!(health["database"]["ok"], true);
    assert!(health["uptimeMs"].is_u64());
}

#[tokio::test]
async fn dashboard_state_aggregates() {
    let f = fixture();
    f.lane("Demo");
    let state = call(&f, "dashboard.getState", json!({})).await.unwrap();
    assert_eq!(state["lanes"].as_array().unwrap().len(), 1);
    assert!(state["tasks"].as_array().unwrap().is_empty());
    assert!(state["runtimes"].as_array().unwrap().len() == 1);
}

#[tokio::test]
async fn favorites_round_trip() {
    let f = fixture();
    let favorite = call(
        &f,
        "favorite.add",
        json!({"kind": "lane", "refId": "swl-x", "label": "Main"}),
    )
    .await
    .unwrap();
    let listed = call(&f, "favorite.list", json!({})).await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    call(&f, "favorite.remove", json!({"favoriteId": favorite["id"]})).await.unwrap();
    let listed = call(&f, "favorite.list", json!({})).await.unwrap();
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn template_built_ins_are_seeded_on_demand() {
    let f = fixture();
    let built_in = call(&f, "template.getBuiltIn", json!({})).await.unwrap();
    assert!(!built_in.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn pane_capture_reads_scripted_output() {
    let f = fixture();
    f.mux.add_session("work", "main");
    f.mux.set_output("work", 0, 0, "hello from pane");
    let value = call(
        &f,
        "pane.capture",
        json!({"session": "work", "window": 0}),
    )
    .await
    .unwrap();
    assert_eq!(value["content"], "hello from pane");
}
