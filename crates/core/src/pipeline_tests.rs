// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{
    ready_stages, Pipeline, PipelineRun, RunStatus, Stage, StageResult, StageStatus, StageType,
};
use crate::agent::AgentRole;

fn stage(name: &str) -> Stage {
    Stage::new(name, StageType::Sequential, AgentRole::Coder)
}

fn completed() -> StageResult {
    StageResult {
        status: StageStatus::Completed,
        agent_id: None,
        output: Some("x".into()),
        started_at: Some(1),
        completed_at: Some(2),
        error_message: None,
    }
}

#[test]
fn empty_pipeline_has_no_cycle() {
    let p = Pipeline::new("p", 1);
    assert!(!p.has_cycle());
}

#[test]
fn linear_chain_has_no_cycle() {
    let mut p = Pipeline::new("p", 1);
    let a = stage("a");
    let mut b = stage("b");
    b.depends_on.push(a.id.clone());
    let mut c = stage("c");
    c.depends_on.push(b.id.clone());
    p.stages = vec![a, b, c];
    assert!(!p.has_cycle());
}

#[test]
fn two_stage_cycle_is_detected() {
    let mut p = Pipeline::new("p", 1);
    let mut a = stage("a");
    let mut b = stage("b");
    b.depends_on.push(a.id.clone());
    a.depends_on.push(b.id.clone());
    p.stages = vec![a, b];
    assert!(p.has_cycle());
}

#[test]
fn self_loop_is_detected() {
    let mut p = Pipeline::new("p", 1);
    let mut a = stage("a");
    a.depends_on.push(a.id.clone());
    p.stages = vec![a];
    assert!(p.has_cycle());
}

#[test]
fn dangling_dependency_is_not_a_cycle() {
    let mut p = Pipeline::new("p", 1);
    let mut a = stage("a");
    a.depends_on.push(super::StageId::new());
    p.stages = vec![a];
    assert!(!p.has_cycle());
}

#[test]
fn ready_set_starts_with_roots() {
    let mut p = Pipeline::new("p", 1);
    let a = stage("a");
    let mut b = stage("b");
    b.depends_on.push(a.id.clone());
    let a_id = a.id.clone();
    p.stages = vec![a, b];

    let run = PipelineRun::new(p.id.clone(), 1);
    let ready = ready_stages(&p, &run);
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].id, a_id);
}

#[test]
fn ready_set_advances_when_deps_complete() {
    let mut p = Pipeline::new("p", 1);
    let a = stage("a");
    let mut b = stage("b");
    b.depends_on.push(a.id.clone());
    let (a_id, b_id) = (a.id.clone(), b.id.clone());
    p.stages = vec![a, b];

    let mut run = PipelineRun::new(p.id.clone(), 1);
    run.stage_results.insert(a_id, completed());
    let ready = ready_stages(&p, &run);
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].id, b_id);
}

#[test]
fn recorded_stages_are_not_ready_again() {
    let mut p = Pipeline::new("p", 1);
    let a = stage("a");
    let a_id = a.id.clone();
    p.stages = vec![a];

    let mut run = PipelineRun::new(p.id.clone(), 1);
    run.stage_results.insert(
        a_id,
        StageResult {
            status: StageStatus::Running,
            agent_id: None,
            output: None,
            started_at: Some(1),
            completed_at: None,
            error_message: None,
        },
    );
    assert!(ready_stages(&p, &run).is_empty());
}

#[test]
fn fan_out_task_count() {
    let mut s = Stage::new("f", StageType::FanOut, AgentRole::Coder);
    s.fan_out_count = Some(3);
    assert_eq!(s.task_count(), 3);
    assert_eq!(stage("x").task_count(), 1);
}

#[test]
fn settled_run_requires_all_terminal() {
    let mut p = Pipeline::new("p", 1);
    let a = stage("a");
    let b = stage("b");
    let (a_id, b_id) = (a.id.clone(), b.id.clone());
    p.stages = vec![a, b];

    let mut run = PipelineRun::new(p.id.clone(), 1);
    assert_eq!(run.status, RunStatus::Running);
    run.stage_results.insert(a_id, completed());
    assert!(!run.is_settled(&p));
    run.stage_results.insert(b_id, completed());
    assert!(run.is_settled(&p));
    assert!(!run.any_failed());
}
