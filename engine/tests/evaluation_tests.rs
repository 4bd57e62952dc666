use engine::job::TextureJob;
use engine::model::{
    AudioParams, Connection, Graph, InputRef, Keyframe, Node, ValueData, ValueKind, VideoParams,
};
use engine::nodes::{self, NodeKind};
use engine::time::{Rational, TimeRange};
use engine::{CancelAtom, EngineError, NodeTraverser};

use uuid::Uuid;

fn at(t: i64) -> TimeRange {
    TimeRange::at(Rational::from_int(t))
}

fn traverser(graph: &Graph) -> NodeTraverser<'_> {
    NodeTraverser::new(graph, VideoParams::default(), AudioParams::default())
}

/// A Value node keyframed 0.0 at t=0 and 1.0 at t=10.
fn keyframed_value(graph: &mut Graph) -> Uuid {
    let id = graph.add_node(Node::new(NodeKind::Value));
    let input = InputRef::new(id, nodes::generator::VALUE_INPUT);
    graph
        .insert_keyframe(&input, 0, Keyframe::new(Rational::from_int(0), ValueData::float(0.0)))
        .expect("insert keyframe");
    graph
        .insert_keyframe(&input, 0, Keyframe::new(Rational::from_int(10), ValueData::float(1.0)))
        .expect("insert keyframe");
    id
}

#[test]
fn test_keyframed_value_interpolates_linearly() {
    let mut graph = Graph::new();
    let value = keyframed_value(&mut graph);

    let mut t = traverser(&graph);
    let table = t.generate_table(value, &at(5)).expect("evaluate");
    assert_eq!(table.get(ValueKind::Float).unwrap().as_float(-1.0), 0.5);

    // Clamped outside the keyframed span.
    let table = t.generate_table(value, &at(-3)).expect("evaluate");
    assert_eq!(table.get(ValueKind::Float).unwrap().as_float(-1.0), 0.0);
    let table = t.generate_table(value, &at(20)).expect("evaluate");
    assert_eq!(table.get(ValueKind::Float).unwrap().as_float(-1.0), 1.0);
}

#[test]
fn test_solid_flip_noop_is_exact_passthrough() {
    let mut graph = Graph::new();
    let solid = graph.add_node(Node::new(NodeKind::Solid));
    let flip = graph.add_node(Node::new(NodeKind::Flip));
    graph
        .connect(solid, InputRef::new(flip, nodes::distort::TEXTURE_INPUT))
        .expect("connect");

    let mut t = traverser(&graph);
    let solid_value = t
        .generate_value(solid, &at(0), ValueKind::Texture)
        .expect("evaluate")
        .expect("solid pushes a texture");
    let flip_value = t
        .generate_value(flip, &at(0), ValueKind::Texture)
        .expect("evaluate")
        .expect("flip passes the texture through");

    // Both flags off: the exact same value, still sourced to the solid.
    assert_eq!(flip_value, solid_value);
    assert_eq!(flip_value.source(), Some(solid));
}

#[test]
fn test_flip_without_texture_pushes_nothing() {
    let mut graph = Graph::new();
    let flip = graph.add_node(Node::new(NodeKind::Flip));

    let mut t = traverser(&graph);
    let table = t.generate_table(flip, &at(0)).expect("evaluate");
    assert!(table.is_empty());
}

#[test]
fn test_flip_builds_shader_job_when_enabled() {
    let mut graph = Graph::new();
    let solid = graph.add_node(Node::new(NodeKind::Solid));
    let flip = graph.add_node(Node::new(NodeKind::Flip));
    graph
        .connect(solid, InputRef::new(flip, nodes::distort::TEXTURE_INPUT))
        .expect("connect");
    graph
        .set_standard_value(
            &InputRef::new(flip, nodes::distort::HORIZONTAL_INPUT),
            ValueData::Boolean(true),
        )
        .expect("set value");

    let mut t = traverser(&graph);
    let value = t
        .generate_value(flip, &at(0), ValueKind::Texture)
        .expect("evaluate")
        .expect("texture");
    let texture = value.as_texture().unwrap();
    match &texture.job {
        TextureJob::Shader(job) => {
            assert_eq!(job.shader_id(), "flip");
            assert!(job.get(nodes::distort::TEXTURE_INPUT).is_some());
            assert!(nodes::shader_code(job.shader_id()).is_some());
        }
        other => panic!("expected shader job, got {other:?}"),
    }
    assert_eq!(value.source(), Some(flip));
}

#[test]
fn test_box_blur_zero_radius_skips_job() {
    let mut graph = Graph::new();
    let solid = graph.add_node(Node::new(NodeKind::Solid));
    let blur = graph.add_node(Node::new(NodeKind::BoxBlur));
    graph
        .connect(solid, InputRef::new(blur, nodes::filter::TEXTURE_INPUT))
        .expect("connect");
    graph
        .set_standard_value(
            &InputRef::new(blur, nodes::filter::RADIUS_INPUT),
            ValueData::float(0.0),
        )
        .expect("set value");

    let mut t = traverser(&graph);
    let blurred = t
        .generate_value(blur, &at(0), ValueKind::Texture)
        .expect("evaluate")
        .expect("texture");
    assert_eq!(blurred.source(), Some(solid));
}

#[test]
fn test_box_blur_requests_iterations() {
    let mut graph = Graph::new();
    let solid = graph.add_node(Node::new(NodeKind::Solid));
    let blur = graph.add_node(Node::new(NodeKind::BoxBlur));
    graph
        .connect(solid, InputRef::new(blur, nodes::filter::TEXTURE_INPUT))
        .expect("connect");

    let mut t = traverser(&graph);
    let value = t
        .generate_value(blur, &at(0), ValueKind::Texture)
        .expect("evaluate")
        .expect("texture");
    match &value.as_texture().unwrap().job {
        TextureJob::Shader(job) => {
            assert_eq!(job.shader_id(), "box_blur");
            assert_eq!(job.iterations(), 3);
            assert_eq!(job.iterative_input(), Some(nodes::filter::TEXTURE_INPUT));
        }
        other => panic!("expected shader job, got {other:?}"),
    }
}

#[test]
fn test_drop_shadow_nests_blurred_copy() {
    let mut graph = Graph::new();
    let solid = graph.add_node(Node::new(NodeKind::Solid));
    let shadow = graph.add_node(Node::new(NodeKind::DropShadow));
    graph
        .connect(solid, InputRef::new(shadow, nodes::filter::TEXTURE_INPUT))
        .expect("connect");

    let mut t = traverser(&graph);
    let value = t
        .generate_value(shadow, &at(0), ValueKind::Texture)
        .expect("evaluate")
        .expect("texture");

    let TextureJob::Shader(job) = &value.as_texture().unwrap().job else {
        panic!("expected shader job");
    };
    assert_eq!(job.shader_id(), "drop_shadow");

    // The shadow parameter is itself a deferred blur of the input.
    let nested = job
        .get(nodes::filter::SHADOW_INPUT)
        .and_then(|v| v.as_texture())
        .expect("nested texture value");
    match &nested.job {
        TextureJob::Shader(inner) => assert_eq!(inner.shader_id(), "box_blur"),
        other => panic!("expected nested blur, got {other:?}"),
    }
}

#[test]
fn test_time_offset_shifts_sampling() {
    let mut graph = Graph::new();
    let value = keyframed_value(&mut graph);
    let offset = graph.add_node(Node::new(NodeKind::TimeOffset));
    graph
        .connect(value, InputRef::new(offset, nodes::time::INPUT_INPUT))
        .expect("connect");
    graph
        .set_standard_value(
            &InputRef::new(offset, nodes::time::TIME_INPUT),
            ValueData::Rational(Rational::from_int(5)),
        )
        .expect("set value");

    let mut t = traverser(&graph);
    let table = t.generate_table(offset, &at(0)).expect("evaluate");
    // Output time 0 samples the input at t=5.
    assert_eq!(table.get(ValueKind::Float).unwrap().as_float(-1.0), 0.5);
}

#[test]
fn test_opposite_time_offsets_compose_to_identity() {
    let mut graph = Graph::new();
    let value = keyframed_value(&mut graph);
    let forward = graph.add_node(Node::new(NodeKind::TimeOffset));
    let backward = graph.add_node(Node::new(NodeKind::TimeOffset));
    graph
        .connect(value, InputRef::new(forward, nodes::time::INPUT_INPUT))
        .expect("connect");
    graph
        .connect(forward, InputRef::new(backward, nodes::time::INPUT_INPUT))
        .expect("connect");
    graph
        .set_standard_value(
            &InputRef::new(forward, nodes::time::TIME_INPUT),
            ValueData::Rational(Rational::from_int(5)),
        )
        .expect("set value");
    graph
        .set_standard_value(
            &InputRef::new(backward, nodes::time::TIME_INPUT),
            ValueData::Rational(Rational::from_int(-5)),
        )
        .expect("set value");

    let mut t = traverser(&graph);
    let direct = t.generate_table(value, &at(3)).expect("evaluate");
    let chained = t.generate_table(backward, &at(3)).expect("evaluate");
    assert_eq!(
        chained.get(ValueKind::Float).unwrap().as_float(-1.0),
        direct.get(ValueKind::Float).unwrap().as_float(-2.0),
    );
}

#[test]
fn test_diamond_fan_in_memoizes_upstream() {
    let mut graph = Graph::new();
    let value = graph.add_node(Node::new(NodeKind::Value));
    graph
        .set_standard_value(
            &InputRef::new(value, nodes::generator::VALUE_INPUT),
            ValueData::float(2.0),
        )
        .expect("set value");

    let a = graph.add_node(Node::new(NodeKind::MathAdd));
    let b = graph.add_node(Node::new(NodeKind::MathAdd));
    let out = graph.add_node(Node::new(NodeKind::MathAdd));
    graph
        .set_standard_value(&InputRef::new(a, nodes::math::RHS_INPUT), ValueData::float(1.0))
        .expect("set value");
    graph
        .set_standard_value(&InputRef::new(b, nodes::math::RHS_INPUT), ValueData::float(10.0))
        .expect("set value");
    graph
        .connect(value, InputRef::new(a, nodes::math::LHS_INPUT))
        .expect("connect");
    graph
        .connect(value, InputRef::new(b, nodes::math::LHS_INPUT))
        .expect("connect");
    graph
        .connect(a, InputRef::new(out, nodes::math::LHS_INPUT))
        .expect("connect");
    graph
        .connect(b, InputRef::new(out, nodes::math::RHS_INPUT))
        .expect("connect");

    let mut t = traverser(&graph);
    let table = t.generate_table(out, &at(0)).expect("evaluate");
    assert_eq!(table.get(ValueKind::Float).unwrap().as_float(0.0), 15.0);
    // One memo entry per node; the shared upstream was evaluated once.
    assert_eq!(t.cached_tables(), 4);
}

#[test]
fn test_evaluation_is_deterministic() {
    let mut graph = Graph::new();
    let solid = graph.add_node(Node::new(NodeKind::Solid));
    let shadow = graph.add_node(Node::new(NodeKind::DropShadow));
    graph
        .connect(solid, InputRef::new(shadow, nodes::filter::TEXTURE_INPUT))
        .expect("connect");

    let first = traverser(&graph)
        .generate_table(shadow, &at(2))
        .expect("evaluate");
    let second = traverser(&graph)
        .generate_table(shadow, &at(2))
        .expect("evaluate");
    assert_eq!(first, second);
}

#[test]
fn test_traversal_detects_cycles() {
    let mut graph = Graph::new();
    let a = graph.add_node(Node::new(NodeKind::MathAdd));
    let b = graph.add_node(Node::new(NodeKind::MathAdd));
    // Bypass validation to build a malformed document.
    graph.add_connection(Connection::new(a, InputRef::new(b, nodes::math::LHS_INPUT)));
    graph.add_connection(Connection::new(b, InputRef::new(a, nodes::math::LHS_INPUT)));

    let mut t = traverser(&graph);
    let err = t.generate_table(a, &at(0)).unwrap_err();
    assert!(matches!(err, EngineError::CycleDetected { .. }));
}

#[test]
fn test_missing_upstream_is_fatal() {
    let mut graph = Graph::new();
    let add = graph.add_node(Node::new(NodeKind::MathAdd));
    graph.add_connection(Connection::new(
        Uuid::new_v4(),
        InputRef::new(add, nodes::math::LHS_INPUT),
    ));

    let mut t = traverser(&graph);
    let err = t.generate_table(add, &at(0)).unwrap_err();
    assert!(matches!(err, EngineError::MissingUpstream { .. }));
}

#[test]
fn test_cancelled_traversal_returns_empty_table() {
    let mut graph = Graph::new();
    let solid = graph.add_node(Node::new(NodeKind::Solid));

    let cancel = CancelAtom::new();
    cancel.cancel();
    let mut t = traverser(&graph).with_cancel(&cancel);
    let table = t.generate_table(solid, &at(0)).expect("evaluate");
    assert!(table.is_empty());
    assert_eq!(t.cached_tables(), 0);
    assert!(cancel.heard());
}

#[test]
fn test_sum_resolves_array_elements_independently() {
    let mut graph = Graph::new();
    let sum = graph.add_node(Node::new(NodeKind::Sum));
    graph
        .resize_array(sum, nodes::math::VALUES_INPUT, 3)
        .expect("resize");
    graph
        .set_standard_value(
            &InputRef::element(sum, nodes::math::VALUES_INPUT, 0),
            ValueData::float(1.0),
        )
        .expect("set value");
    graph
        .set_standard_value(
            &InputRef::element(sum, nodes::math::VALUES_INPUT, 1),
            ValueData::float(2.0),
        )
        .expect("set value");

    let value = graph.add_node(Node::new(NodeKind::Value));
    graph
        .set_standard_value(
            &InputRef::new(value, nodes::generator::VALUE_INPUT),
            ValueData::float(3.0),
        )
        .expect("set value");
    graph
        .connect(value, InputRef::element(sum, nodes::math::VALUES_INPUT, 2))
        .expect("connect");

    let mut t = traverser(&graph);
    let table = t.generate_table(sum, &at(0)).expect("evaluate");
    assert_eq!(table.get(ValueKind::Float).unwrap().as_float(0.0), 6.0);
}

#[test]
fn test_array_elements_sample_at_requested_time() {
    let mut graph = Graph::new();
    let sum = graph.add_node(Node::new(NodeKind::Sum));
    graph
        .resize_array(sum, nodes::math::VALUES_INPUT, 2)
        .expect("resize");
    graph
        .set_standard_value(
            &InputRef::element(sum, nodes::math::VALUES_INPUT, 1),
            ValueData::float(2.0),
        )
        .expect("set value");

    let value = keyframed_value(&mut graph);
    graph
        .connect(value, InputRef::element(sum, nodes::math::VALUES_INPUT, 0))
        .expect("connect");

    // Each element resolves over its own adjusted range; at t=5 the
    // keyframed branch contributes its interpolated 0.5.
    let mut t = traverser(&graph);
    let table = t.generate_table(sum, &at(5)).expect("evaluate");
    assert_eq!(table.get(ValueKind::Float).unwrap().as_float(0.0), 2.5);
}

#[test]
fn test_no_results_after_cancellation() {
    let mut graph = Graph::new();
    let value = graph.add_node(Node::new(NodeKind::Value));
    let add = graph.add_node(Node::new(NodeKind::MathAdd));
    graph
        .set_standard_value(
            &InputRef::new(value, nodes::generator::VALUE_INPUT),
            ValueData::float(2.0),
        )
        .expect("set value");
    graph
        .connect(value, InputRef::new(add, nodes::math::LHS_INPUT))
        .expect("connect");

    let cancel = CancelAtom::new();
    let mut t = traverser(&graph).with_cancel(&cancel);
    let table = t.generate_table(value, &at(0)).expect("evaluate");
    assert!(!table.is_empty());
    let cached_before = t.cached_tables();

    // Once the flag is up, even a node whose upstream is already memoized
    // yields an empty table and nothing new is cached.
    cancel.cancel();
    let table = t.generate_table(add, &at(0)).expect("evaluate");
    assert!(table.is_empty());
    assert_eq!(t.cached_tables(), cached_before);
}

#[test]
fn test_volume_at_unity_gain_passes_through() {
    let mut graph = Graph::new();
    let tone = graph.add_node(Node::new(NodeKind::Tone));
    let volume = graph.add_node(Node::new(NodeKind::Volume));
    graph
        .connect(tone, InputRef::new(volume, nodes::audio::SAMPLES_INPUT))
        .expect("connect");

    let mut t = traverser(&graph);
    let passthrough = t
        .generate_value(volume, &at(0), ValueKind::Samples)
        .expect("evaluate")
        .expect("samples");
    assert_eq!(passthrough.source(), Some(tone));

    // A non-unity gain wraps the stream in a processing job.
    graph
        .set_standard_value(
            &InputRef::new(volume, nodes::audio::GAIN_INPUT),
            ValueData::float(0.5),
        )
        .expect("set value");
    let mut t = traverser(&graph);
    let processed = t
        .generate_value(volume, &at(0), ValueKind::Samples)
        .expect("evaluate")
        .expect("samples");
    assert_eq!(processed.source(), Some(volume));
    assert_eq!(processed.as_samples().unwrap().job.processor_id(), "volume");
}

#[test]
fn test_serde_roundtrip_preserves_evaluation() {
    let mut graph = Graph::new();
    let value = keyframed_value(&mut graph);
    let offset = graph.add_node(Node::new(NodeKind::TimeOffset));
    graph
        .connect(value, InputRef::new(offset, nodes::time::INPUT_INPUT))
        .expect("connect");
    graph
        .set_standard_value(
            &InputRef::new(offset, nodes::time::TIME_INPUT),
            ValueData::Rational(Rational::from_int(2)),
        )
        .expect("set value");

    let loaded = Graph::load(&graph.save().expect("save")).expect("load");
    let before = traverser(&graph)
        .generate_table(offset, &at(4))
        .expect("evaluate");
    let after = traverser(&loaded)
        .generate_table(offset, &at(4))
        .expect("evaluate");
    assert_eq!(before, after);
}
