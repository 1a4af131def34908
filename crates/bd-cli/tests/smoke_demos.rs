use std::path::PathBuf;
use std::process::Command;

fn demos_root() -> PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("demos")
        .join("trees")
}

fn temp_state(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("bd-cli-smoke-{}-{}.json", name, std::process::id()))
}

fn run_agent(args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_bd-cli");
    Command::new(bin)
        .arg("agent")
        .args(args)
        .output()
        .expect("agent command should run")
}

fn parse_state_out(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("STATE_OUT:").map(|v| v.to_string()))
        .filter(|value| value != "NONE")
}

fn event_of(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("EVENT:").map(|v| v.to_string()))
}

#[test]
fn agent_branch_flow_reaches_end() {
    let demo = demos_root().join("02-branching");
    let state_1 = temp_state("branch-1");
    let state_2 = temp_state("branch-2");
    let state_3 = temp_state("branch-3");

    let start = run_agent(&[
        "start",
        "--trees-dir",
        demo.to_str().expect("path should be utf-8"),
        "--state-out",
        state_1.to_str().expect("path should be utf-8"),
    ]);
    assert!(start.status.success(), "start failed");
    let stdout = String::from_utf8_lossy(&start.stdout);
    assert!(stdout.contains("RESULT:OK"));
    assert!(stdout.contains("EVENT:DIALOGUE"));
    assert!(stdout.contains("SPEAKER_JSON:\"Guard\""));
    assert!(stdout.contains("TEXT_JSON:\"Halt! Who goes there?\""));
    assert!(parse_state_out(&stdout).is_some());

    let next = run_agent(&[
        "next",
        "--state-in",
        state_1.to_str().expect("path should be utf-8"),
        "--state-out",
        state_2.to_str().expect("path should be utf-8"),
    ]);
    assert!(next.status.success(), "next failed");
    let stdout = String::from_utf8_lossy(&next.stdout);
    assert!(stdout.contains("EVENT:BRANCH"));
    assert!(stdout.contains("TEXT_JSON:\"State your business.\""));
    assert!(stdout.contains("CHOICE:0|\"A humble traveller.\""));
    assert!(stdout.contains("CHOICE:1|\"None of yours.\""));

    let choose = run_agent(&[
        "choose",
        "--state-in",
        state_2.to_str().expect("path should be utf-8"),
        "--choice",
        "0",
        "--state-out",
        state_3.to_str().expect("path should be utf-8"),
    ]);
    assert!(choose.status.success(), "choose failed");
    let stdout = String::from_utf8_lossy(&choose.stdout);
    assert!(stdout.contains("TEXT_JSON:\"Welcome, traveller. Pass.\""));

    let end = run_agent(&[
        "next",
        "--state-in",
        state_3.to_str().expect("path should be utf-8"),
        "--state-out",
        state_1.to_str().expect("path should be utf-8"),
    ]);
    let stdout = String::from_utf8_lossy(&end.stdout);
    assert!(stdout.contains("EVENT:END"));
    assert!(stdout.contains("STATE_OUT:NONE"));
}

#[test]
fn every_demo_reaches_end_with_first_choices() {
    let mut demos: Vec<PathBuf> = std::fs::read_dir(demos_root())
        .expect("demos should exist")
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    demos.sort();
    assert!(!demos.is_empty());

    for demo in demos {
        let name = demo
            .file_name()
            .and_then(|name| name.to_str())
            .expect("demo name")
            .to_string();
        let mut state = temp_state(&format!("{}-0", name));
        let output = run_agent(&[
            "start",
            "--trees-dir",
            demo.to_str().expect("path should be utf-8"),
            "--state-out",
            state.to_str().expect("path should be utf-8"),
        ]);
        assert!(output.status.success(), "{} start failed", name);
        let mut stdout = String::from_utf8_lossy(&output.stdout).to_string();

        for step in 1..100 {
            let event = event_of(&stdout).expect("event line");
            if event == "END" {
                break;
            }
            let next_state = temp_state(&format!("{}-{}", name, step));
            let mut args = vec![
                if event == "BRANCH" { "choose" } else { "next" },
                "--state-in",
                state.to_str().expect("path should be utf-8"),
                "--state-out",
                next_state.to_str().expect("path should be utf-8"),
            ];
            if event == "BRANCH" {
                args.extend(["--choice", "0"]);
            }
            let output = run_agent(&args);
            assert!(output.status.success(), "{} step {} failed", name, step);
            stdout = String::from_utf8_lossy(&output.stdout).to_string();
            state = next_state;
        }
        assert_eq!(event_of(&stdout).as_deref(), Some("END"), "{} never ended", name);
    }
}

#[test]
fn agent_reports_errors_on_stdout() {
    let missing = temp_state("missing-state");
    let output = run_agent(&[
        "next",
        "--state-in",
        missing.to_str().expect("path should be utf-8"),
        "--state-out",
        temp_state("unused").to_str().expect("path should be utf-8"),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RESULT:ERROR"));
    assert!(stdout.contains("ERROR_CODE:CLI_STATE_NOT_FOUND"));
    assert!(stdout.contains("ERROR_MSG_JSON:"));
}
