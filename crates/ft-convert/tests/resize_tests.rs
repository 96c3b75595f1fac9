use ft_backend::{Dims, LayerKind, PluginRegistry, ResizeMode, ResizeOutput};
use ft_convert::{convert_graph, ErrorKind};
use ft_core::TensorData;
use pretty_assertions::assert_eq;
use std::collections::HashMap;

mod support;

use support::assertions::{
    char_field, constant_values, int_field, layer_types, output_dims, plugin, resize,
};
use support::graphs::{boolean, double, double_list, int_list, none, unary_graph};

#[test]
fn static_size_becomes_literal_shape() {
    let (graph, _) = unary_graph(
        &[1, 3, 8, 8],
        "aten::upsample_nearest2d",
        None,
        vec![int_list(&[16, 16]), none(), none()],
    );
    let network = support::convert(&graph, support::settings("8.0")).unwrap();

    assert_eq!(layer_types(&network), vec!["Resize"]);
    let layer = resize(&network);
    assert_eq!(layer.mode, ResizeMode::Nearest);
    assert_eq!(layer.output, ResizeOutput::Shape(Dims::new([1, 3, 16, 16])));
    assert_eq!(output_dims(&network), Dims::new([1, 3, 16, 16]));
    assert!(network.layers()[0]
        .name()
        .starts_with("%1 = aten::upsample_nearest2d(%0, [16, 16]"));
}

#[test]
fn keep_markers_resolve_to_input_extents() {
    let (graph, _) = unary_graph(
        &[1, 3, 8, 8],
        "aten::upsample_nearest2d",
        Some("vec"),
        vec![int_list(&[-1, 24]), none(), none()],
    );
    let network = support::convert(&graph, support::settings("8.0")).unwrap();
    assert_eq!(
        resize(&network).output,
        ResizeOutput::Shape(Dims::new([1, 3, 8, 24]))
    );
}

#[test]
fn scale_factors_are_padded_to_input_rank() {
    let (graph, _) = unary_graph(
        &[2, 3, 4, 8],
        "aten::upsample_nearest1d",
        None,
        vec![int_list(&[]), double(2.0)],
    );
    let network = support::convert(&graph, support::settings("8.0")).unwrap();

    assert_eq!(
        resize(&network).output,
        ResizeOutput::Scales(vec![1.0, 1.0, 1.0, 2.0])
    );
    assert_eq!(output_dims(&network), Dims::new([2, 3, 4, 16]));
}

#[test]
fn vec_overload_reads_scale_factor_list() {
    let (graph, _) = unary_graph(
        &[1, 3, 8],
        "aten::upsample_linear1d",
        Some("vec"),
        vec![none(), boolean(false), double_list(&[2.0])],
    );
    let network = support::convert(&graph, support::settings("8.0")).unwrap();

    let layer = resize(&network);
    assert_eq!(layer.mode, ResizeMode::Linear);
    assert!(!layer.align_corners);
    assert_eq!(layer.output, ResizeOutput::Scales(vec![1.0, 1.0, 2.0]));
}

#[test]
fn both_size_and_scales_is_ambiguous() {
    let (graph, _) = unary_graph(
        &[1, 3, 8, 8],
        "aten::upsample_nearest2d",
        None,
        vec![int_list(&[16, 16]), double(2.0), double(2.0)],
    );
    let err = support::convert(&graph, support::settings("8.0")).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::AmbiguousResizeSpec { found: "both" }
    ));
}

#[test]
fn neither_size_nor_complete_scales_is_ambiguous() {
    let (graph, _) = unary_graph(
        &[1, 3, 8, 8],
        "aten::upsample_nearest2d",
        None,
        vec![int_list(&[]), double(2.0), none()],
    );
    let err = support::convert(&graph, support::settings("8.0")).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::AmbiguousResizeSpec { found: "neither" }
    ));
}

#[test]
fn size_length_must_match_spatial_rank() {
    let (graph, _) = unary_graph(
        &[1, 3, 8, 8],
        "aten::upsample_bilinear2d",
        Some("vec"),
        vec![int_list(&[16]), boolean(true), none()],
    );
    let err = support::convert(&graph, support::settings("8.0")).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::RankMismatch {
            what: "output size",
            expected: 2,
            found: 1
        }
    ));
}

#[test]
fn scale_count_must_match_spatial_rank() {
    let (graph, _) = unary_graph(
        &[1, 3, 8, 8],
        "aten::upsample_bilinear2d",
        Some("vec"),
        vec![none(), boolean(true), double_list(&[2.0, 2.0, 2.0])],
    );
    let err = support::convert(&graph, support::settings("8.0")).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::RankMismatch {
            what: "scale factors",
            ..
        }
    ));
}

#[test]
fn input_rank_below_spatial_rank_is_rejected() {
    let (graph, _) = unary_graph(
        &[8],
        "aten::upsample_nearest2d",
        None,
        vec![int_list(&[16, 16]), none(), none()],
    );
    let err = support::convert(&graph, support::settings("8.0")).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::RankMismatch { what: "input", .. }
    ));
}

#[test]
fn dynamic_input_builds_shape_mask() {
    let (graph, _) = unary_graph(
        &[-1, 3, -1, -1],
        "aten::upsample_nearest2d",
        None,
        vec![int_list(&[32, 32]), none(), none()],
    );
    let network = support::convert(&graph, support::dynamic_settings("8.0")).unwrap();

    assert_eq!(
        layer_types(&network),
        vec!["Constant", "Constant", "Shape", "ElementWise", "ElementWise", "Resize"]
    );
    let layer = &network.layers()[5];
    assert_eq!(resize(&network).output, ResizeOutput::ShapeTensor);

    let shape = layer.inputs()[1];
    let sum = network.producer(shape).unwrap();
    let prod = network.producer(sum.inputs()[0]).unwrap();
    assert!(matches!(sum.kind(), LayerKind::ElementWise(_)));
    assert_eq!(
        constant_values(&network, sum.inputs()[1]),
        TensorData::Int(vec![0, 0, 32, 32])
    );
    assert_eq!(
        constant_values(&network, prod.inputs()[1]),
        TensorData::Int(vec![1, 1, 0, 0])
    );

    // unknown extents stay unknown until bound
    assert_eq!(output_dims(&network), Dims::new([-1, 3, 32, 32]));
}

#[test]
fn computed_shape_matches_runtime_extents() {
    let (graph, _) = unary_graph(
        &[-1, 3, -1],
        "aten::upsample_nearest1d",
        None,
        vec![int_list(&[40]), none()],
    );
    let network = support::convert(&graph, support::dynamic_settings("8.0")).unwrap();
    let input = network.inputs()[0];
    let shape = network.layers().last().unwrap().inputs()[1];

    for runtime in [[2, 3, 10], [7, 3, 99]] {
        let bindings = HashMap::from([(input, runtime.to_vec())]);
        let values = network.shape_values(shape, &bindings).unwrap();
        assert_eq!(values, vec![Some(runtime[0]), Some(3), Some(40)]);
    }
}

#[test]
fn keep_marker_reads_runtime_extent() {
    let (graph, _) = unary_graph(
        &[-1, 3, -1, -1],
        "aten::upsample_nearest2d",
        None,
        vec![int_list(&[-1, 32]), none(), none()],
    );
    let network = support::convert(&graph, support::dynamic_settings("8.0")).unwrap();
    let input = network.inputs()[0];
    let shape = network.layers().last().unwrap().inputs()[1];
    let sum = network.producer(shape).unwrap();
    let prod = network.producer(sum.inputs()[0]).unwrap();
    assert_eq!(
        constant_values(&network, prod.inputs()[1]),
        TensorData::Int(vec![1, 1, 1, 0])
    );
    assert_eq!(
        constant_values(&network, sum.inputs()[1]),
        TensorData::Int(vec![0, 0, 0, 32])
    );

    let bindings = HashMap::from([(input, vec![2, 3, 5, 9])]);
    assert_eq!(
        network.shape_values(shape, &bindings).unwrap(),
        vec![Some(2), Some(3), Some(5), Some(32)]
    );
}

#[test]
fn unknown_extents_use_mask_even_in_static_mode() {
    let (graph, _) = unary_graph(
        &[1, 3, -1, -1],
        "aten::upsample_nearest2d",
        None,
        vec![int_list(&[16, 16]), none(), none()],
    );
    let network = support::convert(&graph, support::settings("8.0")).unwrap();
    assert_eq!(resize(&network).output, ResizeOutput::ShapeTensor);
}

#[test]
fn nearest_ignores_alignment_capability() {
    let (graph, _) = unary_graph(
        &[1, 3, 8, 8],
        "aten::upsample_nearest2d",
        None,
        vec![int_list(&[16, 16]), none(), none()],
    );
    let network = support::convert(&graph, support::settings("7.0")).unwrap();
    assert!(!resize(&network).align_corners);
}

fn bilinear(align_corners: bool) -> ft_core::Graph {
    unary_graph(
        &[1, 3, 8, 8],
        "aten::upsample_bilinear2d",
        None,
        vec![int_list(&[16, 16]), boolean(align_corners), none(), none()],
    )
    .0
}

#[test]
fn configurable_backend_keeps_requested_alignment() {
    let network = support::convert(&bilinear(false), support::settings("7.1")).unwrap();
    assert_eq!(layer_types(&network), vec!["Resize"]);
    assert!(!resize(&network).align_corners);
}

#[test]
fn old_backend_with_aligned_corners_stays_native() {
    let network = support::convert(&bilinear(true), support::settings("7.0")).unwrap();
    assert_eq!(layer_types(&network), vec!["Resize"]);
    assert!(resize(&network).align_corners);
}

#[test]
fn old_backend_without_aligned_corners_uses_plugin() {
    let network = support::convert(&bilinear(false), support::settings("7.0")).unwrap();

    assert_eq!(layer_types(&network), vec!["PluginV2"]);
    let layer = plugin(&network);
    assert_eq!(layer.plugin_type, "Interpolate");
    assert_eq!(layer.instance_name, "bilinear2d");
    assert_eq!(int_field(layer, "in_shape"), vec![1, 3, 8, 8]);
    assert_eq!(int_field(layer, "out_shape"), vec![1, 3, 16, 16]);
    assert_eq!(int_field(layer, "out_size"), vec![16, 16]);
    assert_eq!(char_field(layer, "mode"), "bilinear");
    assert_eq!(int_field(layer, "align_corners"), vec![0]);
    assert_eq!(output_dims(&network), Dims::new([1, 3, 16, 16]));
}

#[test]
fn plugin_fallback_needs_explicit_size() {
    let (graph, _) = unary_graph(
        &[1, 3, 8, 8],
        "aten::upsample_bilinear2d",
        Some("vec"),
        vec![none(), boolean(false), double_list(&[2.0, 2.0])],
    );
    let err = support::convert(&graph, support::settings("7.0")).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::UnsupportedCapabilityCombination(_)
    ));
}

#[test]
fn plugin_fallback_needs_static_shapes() {
    let err = support::convert(&bilinear(false), support::dynamic_settings("7.0")).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::UnsupportedCapabilityCombination(_)
    ));
}

#[test]
fn missing_plugin_creator_fails_conversion() {
    support::init_tracing();
    let plugins = PluginRegistry::new();
    let err = convert_graph(
        &bilinear(false),
        &support::registry(),
        &plugins,
        support::settings("7.0"),
    )
    .unwrap_err();
    match err.kind() {
        ErrorKind::PluginCreationFailure(source) => {
            assert_eq!(source.to_string(), "no plugin creator registered under `Interpolate`");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn trilinear_plugin_uses_rank_specific_names() {
    let (graph, _) = unary_graph(
        &[1, 2, 4, 4, 4],
        "aten::upsample_trilinear3d",
        None,
        vec![int_list(&[8, 8, 8]), boolean(false), none(), none(), none()],
    );
    let network = support::convert(&graph, support::settings("7.0")).unwrap();
    let layer = plugin(&network);
    assert_eq!(layer.instance_name, "trilinear3d");
    assert_eq!(char_field(layer, "mode"), "trilinear");
    assert_eq!(int_field(layer, "out_size"), vec![8, 8, 8]);
}

#[test]
fn converting_twice_yields_identical_layers() {
    let graph = bilinear(true);
    let first = support::convert(&graph, support::settings("8.0")).unwrap();
    let second = support::convert(&graph, support::settings("8.0")).unwrap();

    assert_eq!(first.layers().len(), second.layers().len());
    for (a, b) in first.layers().iter().zip(second.layers()) {
        assert!(a.structurally_eq(b));
    }
}

#[test]
fn non_positive_sizes_are_rejected() {
    for size in [[-5, 16], [0, 16]] {
        let (graph, _) = unary_graph(
            &[1, 3, 8, 8],
            "aten::upsample_nearest2d",
            None,
            vec![int_list(&size), none(), none()],
        );
        let err = support::convert(&graph, support::settings("8.0")).unwrap_err();
        match err.kind() {
            ErrorKind::InvalidResizeSpec { what, value } => {
                assert_eq!(*what, "output size");
                assert_eq!(value, &size[0].to_string());
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}

#[test]
fn non_positive_or_non_finite_scales_are_rejected() {
    for scale in [-2.0, 0.0, f64::NAN, f64::INFINITY] {
        let (graph, _) = unary_graph(
            &[1, 3, 8],
            "aten::upsample_nearest1d",
            None,
            vec![int_list(&[]), double(scale)],
        );
        let err = support::convert(&graph, support::settings("8.0")).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidResizeSpec { what: "scale factors", .. }
        ));
    }
}
