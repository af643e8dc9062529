// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn step(kind: StepKind) -> RecipeStep {
    RecipeStep::new(kind)
}

#[test]
fn empty_recipe_is_invalid() {
    assert!(!validate(&[]));
}

#[test]
fn shell_step_requires_command() {
    assert!(validate(&[RecipeStep::shell("echo hi")]));
    assert!(!validate(&[RecipeStep::shell("")]));
    assert!(!validate(&[RecipeStep::shell("   ")]));
}

#[yare::parameterized(
    download_no_url = { StepKind::Download { url: String::new(), dest_dir: "/tmp".into() } },
    download_no_dest = { StepKind::Download { url: "https://x/y.zip".into(), dest_dir: String::new() } },
    write_no_path = { StepKind::Write { path: String::new(), content: "data".into() } },
    copy_no_src = { StepKind::Copy { src: String::new(), dst: "b".into() } },
    link_no_dst = { StepKind::Link { src: "a".into(), dst: String::new() } },
    remove_no_path = { StepKind::Remove { path: String::new() } },
    mkdir_no_path = { StepKind::Mkdir { path: String::new() } },
    input_no_prompt = { StepKind::Input { prompt: String::new(), default: None, variable_name: "user_input".into() } },
    env_create_no_name = { StepKind::EnvCreate { name: String::new(), kind: None } },
)]
fn missing_required_field_fails(kind: StepKind) {
    assert!(!validate(&[step(kind)]));
}

#[test]
fn mixed_recipe_with_all_fields_passes() {
    let recipe = vec![
        RecipeStep::shell("git clone https://x/y repo"),
        step(StepKind::Download { url: "https://x/y.zip".into(), dest_dir: "/tmp".into() }),
        step(StepKind::Write { path: "cfg.toml".into(), content: "a = 1".into() }),
        step(StepKind::Input {
            prompt: "API key?".into(),
            default: Some("none".into()),
            variable_name: "user_input".into(),
        }),
        step(StepKind::EnvCreate { name: "demo".into(), kind: Some("venv".into()) }),
    ];
    assert!(validate(&recipe));
}

#[test]
fn later_invalid_step_fails_whole_recipe() {
    let recipe = vec![RecipeStep::shell("true"), step(StepKind::Remove { path: String::new() })];
    assert!(!validate(&recipe));
}

#[test]
fn wire_form_uses_step_type_and_params() {
    let s = RecipeStep::shell("echo hi").at_line(3);
    let json = serde_json::to_value(&s).unwrap();
    assert_eq!(json["step_type"], "shell");
    assert_eq!(json["params"]["command"], "echo hi");
    assert_eq!(json["source_line"], 3);
    // Default error handling is omitted from the wire form.
    assert!(json.get("on_error").is_none());
}

#[test]
fn wire_form_round_trips() {
    let original = vec![
        RecipeStep::shell("pip install numpy"),
        step(StepKind::Download { url: "https://x/m.bin".into(), dest_dir: "models".into() }),
    ];
    let json = serde_json::to_string(&original).unwrap();
    let back: Vec<RecipeStep> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, original);
}

#[test]
fn continue_hint_survives_serialization() {
    let mut s = RecipeStep::shell("might-fail");
    s.on_error = ErrorHandling::Continue;
    let json = serde_json::to_value(&s).unwrap();
    assert_eq!(json["on_error"], "continue");
}

#[test]
fn step_names_match_wire_tags() {
    assert_eq!(StepKind::Shell { command: "x".into() }.name(), "shell");
    assert_eq!(
        StepKind::EnvCreate { name: "x".into(), kind: None }.name(),
        "env_create"
    );
}
