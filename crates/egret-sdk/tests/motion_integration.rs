//! 运动栈端到端：goto / 在途接管 / 录制 → 平滑 → 落盘 → 回放

use egret_sdk::prelude::*;
use std::time::Duration;

fn sim_joint(name: &str) -> (Arc<SimMotor>, Arc<dyn Actuator>) {
    let sim = SimMotor::new();
    let joint: Arc<dyn Actuator> = Arc::new(JointActuator::new(
        name,
        sim.clone(),
        JointConfig::default(),
    ));
    (sim, joint)
}

fn max_step(samples: &[f64]) -> f64 {
    samples
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .fold(0.0, f64::max)
}

#[test]
fn test_retarget_keeps_goal_stream_continuous() {
    let (_sim, joint) = sim_joint("arm.elbow_pitch");

    // 旁路录制目标寄存器，验证接管混合后没有位置跳变
    let recorder = TrajectoryRecorder::new(
        vec![joint.clone()],
        RecorderOptions {
            frequency: 200.0,
            source: egret_sdk::motion::RecordSource::GoalPosition,
            ..RecorderOptions::default()
        },
    );

    recorder.start();
    let follower = goto(&joint, 80.0, 2.0, GotoOptions::minimum_jerk()).unwrap();
    std::thread::sleep(Duration::from_millis(400));

    follower
        .retarget(10.0, 1.0, InterpolationMode::MinimumJerk, 0.3)
        .unwrap();
    follower.wait();
    let recording = recorder.stop();

    assert!((joint.goal_position().unwrap() - 10.0).abs() < 1e-9);

    // 200Hz 录制对 100Hz 跟随：单个录制步长 ≤ 两个跟随步长。
    // 0→80 的最小加加速度轮廓峰值速度 1.875·80/2 = 75°/s，
    // 即 100Hz 下单步 0.75°；留出混合余量断言 2°。
    let positions: Vec<f64> = recording.samples["arm.elbow_pitch"]
        .iter()
        .map(|s| s.position)
        .collect();
    assert!(positions.len() > 100);
    assert!(max_step(&positions) < 2.0, "max step: {}", max_step(&positions));
}

#[test]
fn test_record_smooth_save_load_replay() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taught-wave.egr");

    // === 录制：两关节同时运动 ===
    let (_s1, j1) = sim_joint("arm.shoulder_pitch");
    let (_s2, j2) = sim_joint("arm.elbow_pitch");

    let recorder = TrajectoryRecorder::new(
        vec![j1.clone(), j2.clone()],
        RecorderOptions {
            frequency: 100.0,
            ..RecorderOptions::default()
        },
    );

    recorder.start();
    let moves = vec![(j1.clone(), 30.0), (j2.clone(), -40.0)];
    let options = GotoOptions {
        wait: true,
        ..GotoOptions::minimum_jerk()
    };
    goto_many(&moves, 0.4, options).unwrap();
    let recording = recorder.stop();
    assert!(!recording.is_empty());

    // === 平滑 + 落盘 ===
    let mut smoothed_recording = recording.clone();
    let smoothed = cubic_smooth(&recording.to_trajectory(), 10, None).unwrap();
    for (name, samples) in smoothed_recording.samples.iter_mut() {
        for (sample, position) in samples.iter_mut().zip(&smoothed.streams[name]) {
            sample.position = *position;
        }
    }
    smoothed_recording.save(&path).unwrap();

    // === 读回并回放 ===
    let loaded = Recording::load(&path).unwrap();
    assert_eq!(loaded, smoothed_recording);

    let player = TrajectoryPlayer::new(
        vec![j1.clone(), j2.clone()],
        &loaded.to_trajectory(),
    )
    .unwrap();
    player.play(PlayerOptions {
        fade_in_duration: 0.1,
    });
    assert!(player.is_playing());
    player.wait_for_end();

    // 回放终点 = 录制终点（平滑保端点）
    let last1 = loaded.samples["arm.shoulder_pitch"].last().unwrap().position;
    let last2 = loaded.samples["arm.elbow_pitch"].last().unwrap().position;
    assert!((j1.goal_position().unwrap() - last1).abs() < 1e-9);
    assert!((j2.goal_position().unwrap() - last2).abs() < 1e-9);
}

#[test]
fn test_follower_state_machine_round_trip() {
    let (_sim, joint) = sim_joint("arm.wrist_pitch");

    let follower = goto(&joint, 20.0, 0.3, GotoOptions::minimum_jerk()).unwrap();
    assert!(follower.is_playing());

    follower.wait();
    assert!(!follower.is_playing());

    // 播完后的接管被拒绝，调用方应另起 goto
    assert!(matches!(
        follower.retarget(5.0, 0.2, InterpolationMode::Linear, 0.1),
        Err(MotionError::FollowerIdle)
    ));

    let second = goto(&joint, 5.0, 0.1, GotoOptions::default()).unwrap();
    second.wait();
    assert!((joint.goal_position().unwrap() - 5.0).abs() < 1e-9);
}
