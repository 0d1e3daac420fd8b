use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::time::Duration;
use vector_core::animation::{
    AnimatedValue, AnimatorDescription, Keyframe, PropertyValues, TargetAnimation,
    ValueAnimatorDescription, ValueType,
};
use vector_core::{AnimationPlayer, GroupElement, GroupTransform, Shape};

fn bench_player_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("AnimationPlayer::on_frame");

    let mut shape = Shape::default();
    let spinner = shape.insert_group(GroupElement::new(
        Some("spinner".into()),
        GroupTransform::default(),
    ));
    shape.attach_group(spinner, None);

    // 10,000 evenly spaced rotation keyframes over ten seconds
    let count = 10_000;
    let keyframes = (0..count)
        .map(|i| Keyframe::new(i as f32 / (count - 1) as f32, Some(AnimatedValue::Float(i as f32))))
        .collect();
    let animation = AnimatorDescription::Value(ValueAnimatorDescription {
        property_values: vec![PropertyValues::of_keyframes(
            "rotation",
            ValueType::Float,
            keyframes,
        )],
        duration: 10_000,
        ..Default::default()
    });
    let targets = vec![TargetAnimation {
        target_name: "spinner".into(),
        animation: Arc::new(animation),
    }];

    for &ms in &[100u64, 5_000, 9_990] {
        group.bench_with_input(BenchmarkId::new("frame_at_ms", ms), &ms, |b, &ms| {
            let mut player = AnimationPlayer::new();
            if player.prepare(&targets, &shape).is_err() {
                return;
            }
            let mut shape = shape.clone();
            let _ = player.start(Duration::ZERO, &mut shape);
            b.iter(|| player.on_frame(Duration::from_millis(ms), &mut shape))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_player_frame);
criterion_main!(benches);
