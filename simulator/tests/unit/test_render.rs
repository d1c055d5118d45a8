//! Console renderer tests

use deploysim::app::render::{format_entry, format_progress, ConsoleRenderer};
use deploysim::deploy::session::{DeploymentSession, SessionOptions};

use crate::support::{session, session_with, three_step_seed};

fn text(buffer: Vec<u8>) -> String {
    String::from_utf8(buffer).unwrap()
}

#[test]
fn test_header_lists_steps() {
    colored::control::set_override(false);
    let session = session(three_step_seed());
    let mut renderer = ConsoleRenderer::new(Vec::new());

    renderer.header(&session.snapshot()).unwrap();
    let out = text(renderer.into_inner());

    assert!(out.contains("Deployment #1042"));
    assert!(out.contains("a1b2c3d • sam"));
    assert!(out.contains("Add caching layer"));
    assert!(out.contains("⟳ Step 0"));
    assert!(out.contains("○ Step 2"));
}

#[test]
fn test_render_prints_only_new_lines() {
    colored::control::set_override(false);
    let mut session = session(three_step_seed());
    let mut renderer = ConsoleRenderer::new(Vec::new());

    renderer.render(&session.snapshot()).unwrap();
    session.on_advance_tick();
    renderer.render(&session.snapshot()).unwrap();
    renderer.render(&session.snapshot()).unwrap();
    let out = text(renderer.into_inner());

    assert_eq!(out.matches("step-1: Starting Step 1...").count(), 1);
    assert!(out.contains("Progress: 1 of 3 steps completed (33%)"));
    assert!(out.contains("[DEPLOYING]"));
}

#[test]
fn test_render_holds_lines_while_paused() {
    colored::control::set_override(false);
    let mut session = session(three_step_seed());
    session.on_advance_tick();
    session.toggle_live_tail();
    let mut renderer = ConsoleRenderer::new(Vec::new());

    renderer.render(&session.snapshot()).unwrap();
    renderer.live_tail(false).unwrap();
    let out = text(renderer.into_inner());

    assert!(!out.contains("Starting Step 1"));
    assert!(out.contains("○ Paused"));
}

fn without_auto_scroll() -> DeploymentSession {
    let options = SessionOptions {
        auto_scroll: false,
        ..Default::default()
    };
    session_with(three_step_seed(), options)
}

#[test]
fn test_render_without_auto_scroll_prints_at_step_changes() {
    colored::control::set_override(false);
    let mut session = without_auto_scroll();
    let mut renderer = ConsoleRenderer::new(Vec::new());

    renderer.render(&session.snapshot()).unwrap();
    for _ in 0..2 {
        session.on_advance_tick();
        renderer.render(&session.snapshot()).unwrap();
        session.on_emit_tick();
        renderer.render(&session.snapshot()).unwrap();
    }
    let last = session.logs().last().unwrap().clone();
    let out = text(renderer.into_inner());

    assert!(out.contains("step-1: Starting Step 1..."));
    assert!(out.contains("step-2: Starting Step 2..."));
    assert_eq!(out.matches("Progress:").count(), 3);
    // emitted after the final step change, still held
    assert!(!out.contains(&format_entry(&last)));
}

#[test]
fn test_flush_logs_prints_held_lines() {
    colored::control::set_override(false);
    let mut session = without_auto_scroll();
    let mut renderer = ConsoleRenderer::new(Vec::new());

    renderer.render(&session.snapshot()).unwrap();
    session.on_emit_tick();
    let snapshot = session.snapshot();
    renderer.render(&snapshot).unwrap();
    renderer.flush_logs(&snapshot).unwrap();
    renderer.flush_logs(&snapshot).unwrap();
    let out = text(renderer.into_inner());

    let line = format_entry(snapshot.logs.last().unwrap());
    assert_eq!(out.matches(line.as_str()).count(), 1);
}

#[test]
fn test_format_progress() {
    let session = session(three_step_seed());
    assert_eq!(
        format_progress(&session.snapshot().progress),
        "Progress: 0 of 3 steps completed (0%)"
    );
}
