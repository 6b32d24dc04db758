//! Level goal checks, the run driver and the headless CLI

use std::cell::RefCell;
use std::process::Command;
use std::rc::Rc;

use drive_sim::levels::{
    autopilot, by_name, ActorHandle, DidiGoesHome, GoalState, HelloDidi, Level, PlanarPose, Run,
    RunStatus, Script, Slalom, TickInput, LEVEL_NAMES,
};
use drive_sim::simulation::{
    Controls, DiffDriveSafetyController, Message, SafetyOptions, Topics, Twist,
};

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_drive_sim"))
        .args(args)
        .env("RUST_LOG", "warn,drive_sim=info")
        .output()
        .expect("Failed to execute drive_sim")
}

/// Test that a level runs to completion in headless mode
#[test]
fn test_headless_level_runs() {
    let output = run_cli(&["--level", "hello-topics", "--summary-every", "50"]);
    assert!(
        output.status.success(),
        "Level failed to run headless. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("RUN COMPLETE"), "stderr: {}", stderr);
    assert!(stderr.contains("Result: passed"), "stderr: {}", stderr);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--- After tick 50"), "stdout: {}", stdout);
}

/// Test that every level name is accepted with a bounded tick count
#[test]
fn test_headless_every_level() {
    for name in LEVEL_NAMES {
        let output = run_cli(&["--level", name, "--ticks", "10", "--seed", "5"]);
        assert!(
            output.status.success(),
            "{} failed. stderr: {}",
            name,
            String::from_utf8_lossy(&output.stderr)
        );
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Ticks: 10"), "{}: {}", name, stderr);
    }
}

#[test]
fn test_headless_rejects_unknown_level() {
    let output = run_cli(&["--level", "moon-landing"]);
    assert!(!output.status.success());
}

#[test]
fn test_headless_scenario_file() {
    let dir = std::env::temp_dir().join(format!("drive_sim_scenario_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("bump.json");
    std::fs::write(
        &path,
        r#"{
            "dt": 0.05,
            "ticks": 40,
            "actors": [
                {
                    "name": "didi",
                    "physics": { "name": "differentialDrive", "trackWidth": 0.235 },
                    "asset": { "circles": [{ "center": { "x": 0, "y": 0 }, "radius": 0.17 }] },
                    "primaryCollider": true
                },
                {
                    "name": "wall",
                    "physics": { "name": "static" },
                    "state": { "pose": { "position": { "x": 0.5 } } },
                    "asset": { "collisionPolysM": [[
                        { "x": -0.05, "y": -1 }, { "x": 0.05, "y": -1 },
                        { "x": 0.05, "y": 1 }, { "x": -0.05, "y": 1 }
                    ]] }
                }
            ],
            "commands": [{
                "tick": 0,
                "actor": "didi",
                "controls": { "wheelSpeeds": { "left": 0.5, "right": 0.5 } }
            }]
        }"#,
    )
    .unwrap();

    let output = run_cli(&["--scenario", path.to_str().unwrap(), "--summary-every", "10"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SCENARIO COMPLETE"), "stderr: {}", stderr);
    assert!(!stderr.contains("Collisions: 0"), "stderr: {}", stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("didi:"), "stdout: {}", stdout);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_headless_missing_scenario_fails() {
    let output = run_cli(&["--scenario", "/nonexistent/drive_sim.json"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read scenario"), "stderr: {}", stderr);
}

/// Drives Didi with twist commands through the safety controller
struct SafeTwist {
    twist: Twist,
}

impl Script for SafeTwist {
    fn on_init(&mut self, topics: &Topics) {
        // the controller lives as long as its subscriptions on this bus
        let _ = DiffDriveSafetyController::attach(SafetyOptions::for_actor("didi", 0.235), topics);
    }

    fn tick(&mut self, ego: &mut ActorHandle<'_>, _input: &TickInput<'_>) {
        ego.publish("/didi/cmd_vel", &Message::Twist(self.twist));
    }
}

#[test]
fn test_safety_controller_backs_didi_off_the_wall() {
    let level = DidiGoesHome::default();
    let script = SafeTwist {
        twist: Twist {
            linear: 0.5,
            angular: 0.0,
        },
    };
    let mut run = Run::new(Box::new(level), Box::new(script)).unwrap();

    let mut max_y = f64::MIN;
    let mut backed_up = false;
    for _ in 0..200 {
        run.tick(0.05);
        let y = run.pose().y;
        if y < max_y - 0.05 {
            backed_up = true;
        }
        max_y = max_y.max(y);
    }
    // top wall inner face is at 3.925
    assert!(max_y + 0.17 <= 3.925 + 1e-9, "max_y = {}", max_y);
    assert!(backed_up, "Didi never reversed after hitting the wall");
    assert_eq!(run.status(), &RunStatus::Running);
}

#[test]
fn test_didi_goes_home_pass_message() {
    let mut level = DidiGoesHome::default();
    let status = level.check_goal(&GoalState {
        pose: PlanarPose {
            x: 0.0,
            y: 0.05,
            yaw: 1.5 * std::f64::consts::PI,
        },
        t_prev: 3.0,
        poses: &[],
    });
    assert_eq!(status.pass.as_deref(), Some("you did it!"));
}

#[test]
fn test_level_timeouts() {
    assert_eq!(by_name("hello-topics", 0).unwrap().timeout(), 15.0);
    assert_eq!(by_name("slalom", 0).unwrap().timeout(), 45.0);
    assert_eq!(by_name("didi-goes-home", 0).unwrap().timeout(), 30.0);
    assert_eq!(HelloDidi::default().timeout(), 300.0);
}

#[test]
fn test_run_times_out_with_ran_out_of_time_message() {
    let mut run = Run::new(by_name("didi-goes-home", 0).unwrap(), autopilot("unknown")).unwrap();
    let status = run.run_until_done(1.0, 100).clone();
    assert_eq!(status, RunStatus::Failed("didi ran out of time! Try again!".to_string()));
    assert_eq!(run.step_count(), 30);
}

/// Records what the script sees each tick
struct Recorder {
    colors: Rc<RefCell<Vec<String>>>,
    timestamps: Rc<RefCell<Vec<f64>>>,
}

impl Script for Recorder {
    fn tick(&mut self, ego: &mut ActorHandle<'_>, input: &TickInput<'_>) {
        let color = input.sensors["color"].as_str().unwrap_or_default().to_string();
        self.colors.borrow_mut().push(color);
        self.timestamps.borrow_mut().push(input.timestamp);
        ego.set_controls(Controls::steer(0.0, 1.0));
    }
}

#[test]
fn test_script_receives_sensors_and_timestamps() {
    let colors = Rc::new(RefCell::new(Vec::new()));
    let timestamps = Rc::new(RefCell::new(Vec::new()));
    let script = Recorder {
        colors: Rc::clone(&colors),
        timestamps: Rc::clone(&timestamps),
    };
    let mut run = Run::new(Box::new(Slalom::new_with_seed(9)), Box::new(script)).unwrap();
    for _ in 0..4 {
        run.tick(0.25);
    }
    assert_eq!(*colors.borrow(), vec!["black"; 4]);
    assert_eq!(*timestamps.borrow(), vec![0.25, 0.5, 0.75, 1.0]);
    assert!(run.pose().y > 0.0);
}

#[test]
fn test_reset_restores_initial_state() {
    let mut run = Run::new(by_name("hello-didi", 0).unwrap(), autopilot("hello-didi")).unwrap();
    for _ in 0..10 {
        run.tick(0.05);
    }
    assert_eq!(run.poses().len(), 10);
    run.reset().unwrap();
    assert_eq!(run.step_count(), 0);
    assert!(run.poses().is_empty());
    assert_eq!(run.pose(), PlanarPose { x: 0.0, y: 0.0, yaw: std::f64::consts::FRAC_PI_2 });
}
