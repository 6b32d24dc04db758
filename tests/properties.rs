//! Property tests for the geometry, physics and collision invariants

use drive_sim::simulation::{
    check_collision, Controls, DifferentialDriveModel, PhysicsModel, Pid, Pose, Rotator, Shape,
    StaticModel, StepContext, Transform, Vector, Velocity,
};
use proptest::prelude::*;

const TWO_PI: f64 = std::f64::consts::PI * 2.0;

fn coord() -> impl Strategy<Value = f64> {
    -1000.0..1000.0f64
}

fn angle() -> impl Strategy<Value = f64> {
    -10.0..10.0f64
}

fn planar_pose() -> impl Strategy<Value = Pose> {
    (coord(), coord(), angle()).prop_map(|(x, y, yaw)| Pose::planar(x, y, yaw))
}

/// Compare headings modulo a full turn
fn same_heading(a: f64, b: f64) -> bool {
    (a.sin() - b.sin()).abs() < 1e-9 && (a.cos() - b.cos()).abs() < 1e-9
}

proptest! {
    #[test]
    fn vector_minus_self_is_zero(x in coord(), y in coord(), z in coord()) {
        let v = Vector::new(x, y, z);
        prop_assert_eq!(v.plus(&v.negative()), Vector::ZERO);
        prop_assert_eq!(v.minus(&v), Vector::ZERO);
    }

    #[test]
    fn rotator_stays_within_a_turn(
        roll in -100.0..100.0f64,
        pitch in -100.0..100.0f64,
        yaw in -100.0..100.0f64,
    ) {
        let r = Rotator::new(roll, pitch, yaw);
        for a in [r.roll(), r.pitch(), r.yaw()] {
            prop_assert!(a > -TWO_PI && a < TWO_PI);
        }
        prop_assert!(same_heading(r.yaw(), yaw));
    }

    #[test]
    fn pose_is_origin_of_its_own_frame(pose in planar_pose()) {
        let local = Transform::new(&pose).transform(&pose);
        prop_assert!(local.position.x.abs() < 1e-9);
        prop_assert!(local.position.y.abs() < 1e-9);
        prop_assert!(local.yaw().abs() < 1e-12);
    }

    #[test]
    fn inverse_undoes_transform(frame in planar_pose(), pose in planar_pose()) {
        let tf = Transform::new(&frame);
        let back = tf.inverse_transform(&tf.transform(&pose));
        prop_assert!((back.position.x - pose.position.x).abs() < 1e-6);
        prop_assert!((back.position.y - pose.position.y).abs() < 1e-6);
        prop_assert!(same_heading(back.yaw(), pose.yaw()));
    }

    #[test]
    fn static_model_never_moves(
        pose in planar_pose(),
        dt in 0.0..10.0f64,
        theta in -1.0..1.0f64,
        a in -5.0..5.0f64,
    ) {
        let velocity = Velocity::zero();
        let ctx = StepContext { dt, pose: &pose, velocity: &velocity };
        prop_assert!(StaticModel.step(&ctx, &Controls::steer(theta, a)).is_none());
    }

    #[test]
    fn diff_drive_straight_advances_along_heading(
        pose in planar_pose(),
        v in -3.0..3.0f64,
        dt in 0.0..1.0f64,
    ) {
        let model = DifferentialDriveModel::new(0.235);
        let velocity = Velocity::zero();
        let ctx = StepContext { dt, pose: &pose, velocity: &velocity };
        let next = model.step(&ctx, &Controls::wheels(v, v)).unwrap().pose;
        let yaw = pose.yaw();
        prop_assert!((next.position.x - (pose.position.x + v * dt * yaw.cos())).abs() < 1e-9);
        prop_assert!((next.position.y - (pose.position.y + v * dt * yaw.sin())).abs() < 1e-9);
        prop_assert!(same_heading(next.yaw(), yaw));
    }

    #[test]
    fn diff_drive_spins_in_place(
        pose in planar_pose(),
        v in 0.01..3.0f64,
        dt in 0.0..0.5f64,
        w in 0.1..1.0f64,
    ) {
        let model = DifferentialDriveModel::new(w);
        let velocity = Velocity::zero();
        let ctx = StepContext { dt, pose: &pose, velocity: &velocity };

        let ccw = model.step(&ctx, &Controls::wheels(-v, v)).unwrap().pose;
        prop_assert!((ccw.position.x - pose.position.x).abs() < 1e-9);
        prop_assert!((ccw.position.y - pose.position.y).abs() < 1e-9);
        prop_assert!(same_heading(ccw.yaw(), pose.yaw() + 2.0 * v * dt / w));

        let cw = model.step(&ctx, &Controls::wheels(v, -v)).unwrap().pose;
        prop_assert!(same_heading(cw.yaw(), pose.yaw() - 2.0 * v * dt / w));
    }

    #[test]
    fn pid_first_value_is_zero(
        err in -1e6..1e6f64,
        p in -10.0..10.0f64,
        i in -10.0..10.0f64,
        d in -10.0..10.0f64,
    ) {
        let mut pid = Pid::new(p, i, d);
        prop_assert_eq!(pid.value(err, 1.0), 0.0);
        prop_assert_eq!(pid.integral(), err);
    }

    #[test]
    fn far_apart_rectangles_never_collide(
        a in planar_pose(),
        yaw_b in angle(),
        bearing in angle(),
        length in 0.1..5.0f64,
        width in 0.1..5.0f64,
    ) {
        // farther apart than the rectangle's diagonal
        let gap = length.hypot(width) + 0.01;
        let b = Pose::planar(
            a.position.x + gap * bearing.cos(),
            a.position.y + gap * bearing.sin(),
            yaw_b,
        );
        let rect = Shape::rectangle(length, width);
        prop_assert!(!check_collision(&[rect.to_world(&a)], &[rect.to_world(&b)]));
    }

    #[test]
    fn coincident_rectangles_collide(
        pose in planar_pose(),
        length in 0.1..5.0f64,
        width in 0.1..5.0f64,
    ) {
        let rect = Shape::rectangle(length, width).to_world(&pose);
        prop_assert!(check_collision(&[rect.clone()], &[rect]));
    }
}
