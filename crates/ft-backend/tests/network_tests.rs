use ft_backend::{
    DataType, Dims, ElementWiseOperation, Network, NetworkError, PluginError, PluginField,
    PluginFieldCollection, PluginRegistry, ResizeLayer, ResizeMode, ResizeOutput, ShuffleLayer,
    TensorId, Weights, INTERPOLATE_PLUGIN,
};
use ft_core::TensorData;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;

fn int_constant(network: &mut Network, values: &[i64]) -> TensorId {
    network
        .add_constant(Weights {
            dtype: DataType::Int32,
            dims: Dims::new([values.len() as i64]),
            values: TensorData::Int(values.to_vec()),
        })
        .unwrap()
        .output
}

#[test]
fn layers_reject_unknown_tensors() {
    let mut network = Network::new();
    let err = network.add_shape(TensorId(3)).unwrap_err();
    assert!(matches!(err, NetworkError::UnknownTensor(TensorId(3))));
    assert!(network.layers().is_empty());
}

#[test]
fn outputs_are_marked_once() {
    let mut network = Network::new();
    let input = network.add_input("x", DataType::Float, Dims::new([1, 2]));
    network.mark_output(input).unwrap();
    assert!(matches!(
        network.mark_output(input),
        Err(NetworkError::DuplicateOutput(_))
    ));
}

#[test]
fn constant_weights_must_fill_dims() {
    let mut network = Network::new();
    let err = network
        .add_constant(Weights {
            dtype: DataType::Float,
            dims: Dims::new([2, 2]),
            values: TensorData::Float(vec![1.0; 3]),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        NetworkError::Weights {
            expected: 4,
            found: 3,
            ..
        }
    ));
}

#[test]
fn overflowing_constant_dims_are_rejected() {
    let mut network = Network::new();
    let err = network
        .add_constant(Weights {
            dtype: DataType::Float,
            dims: Dims::new([1 << 20; 4]),
            values: TensorData::Float(vec![]),
        })
        .unwrap_err();
    assert!(matches!(err, NetworkError::Weights { expected: -1, found: 0, .. }));
    assert!(network.layers().is_empty());
}

#[test]
fn elementwise_broadcasts_unit_extents() {
    let mut network = Network::new();
    let lhs = network.add_input("a", DataType::Float, Dims::new([4, 1, 3]));
    let rhs = network.add_input("b", DataType::Float, Dims::new([4, 5, 1]));
    let out = network
        .add_elementwise(lhs, rhs, ElementWiseOperation::Sum)
        .unwrap();
    assert_eq!(network.tensor(out.output).unwrap().dims, Dims::new([4, 5, 3]));

    let bad = network.add_input("c", DataType::Float, Dims::new([4, 2, 3]));
    assert!(matches!(
        network.add_elementwise(out.output, bad, ElementWiseOperation::Prod),
        Err(NetworkError::Broadcast { .. })
    ));
}

#[test]
fn shuffle_preserves_volume() {
    let mut network = Network::new();
    let input = network.add_input("x", DataType::Float, Dims::new([2, 3]));
    let ok = network
        .add_shuffle(input, ShuffleLayer { reshape_dims: Dims::new([1, 1, 2, 3]) })
        .unwrap();
    assert_eq!(network.tensor(ok.output).unwrap().dims.rank(), 4);
    assert!(matches!(
        network.add_shuffle(input, ShuffleLayer { reshape_dims: Dims::new([5]) }),
        Err(NetworkError::Reshape { .. })
    ));
}

#[test]
fn resize_checks_output_rank() {
    let mut network = Network::new();
    let input = network.add_input("x", DataType::Float, Dims::new([1, 3, 8, 8]));
    let resize = ResizeLayer {
        mode: ResizeMode::Nearest,
        align_corners: false,
        output: ResizeOutput::Scales(vec![2.0, 2.0]),
    };
    assert!(matches!(
        network.add_resize(input, resize, None),
        Err(NetworkError::ResizeRank { rank: 4, found: 2 })
    ));

    let missing_shape = ResizeLayer {
        mode: ResizeMode::Linear,
        align_corners: true,
        output: ResizeOutput::ShapeTensor,
    };
    assert!(matches!(
        network.add_resize(input, missing_shape, None),
        Err(NetworkError::ShapeInput(_))
    ));
}

#[test]
fn shape_tensor_resize_folds_known_extents() {
    let mut network = Network::new();
    let input = network.add_input("x", DataType::Float, Dims::new([-1, 3, 8]));
    let keep = int_constant(&mut network, &[1, 1, 0]);
    let fixed = int_constant(&mut network, &[0, 0, 20]);
    let shape = network.add_shape(input).unwrap().output;
    let kept = network
        .add_elementwise(shape, keep, ElementWiseOperation::Prod)
        .unwrap()
        .output;
    let target = network
        .add_elementwise(kept, fixed, ElementWiseOperation::Sum)
        .unwrap()
        .output;
    let resize = network
        .add_resize(
            input,
            ResizeLayer {
                mode: ResizeMode::Nearest,
                align_corners: false,
                output: ResizeOutput::ShapeTensor,
            },
            Some(target),
        )
        .unwrap();

    assert_eq!(network.tensor(resize.output).unwrap().dims, Dims::new([-1, 3, 20]));
    let bindings = HashMap::from([(input, vec![6, 3, 8])]);
    assert_eq!(
        network.shape_values(target, &bindings),
        Some(vec![Some(6), Some(3), Some(20)])
    );
}

#[test]
fn plugin_registry_reports_missing_and_duplicate_creators() {
    let mut registry = PluginRegistry::new();
    assert_eq!(
        registry
            .create_plugin(INTERPOLATE_PLUGIN, "bilinear2d", &PluginFieldCollection::new())
            .unwrap_err(),
        PluginError::CreatorNotFound("Interpolate".to_string())
    );

    registry
        .register(Arc::new(ft_backend::plugin::GroupNormPluginCreator))
        .unwrap();
    assert_eq!(
        registry.register(Arc::new(ft_backend::plugin::GroupNormPluginCreator)),
        Err(PluginError::DuplicateCreator(
            "GroupNormalizationPlugin".to_string()
        ))
    );
}

#[test]
fn interpolate_plugin_validates_fields() {
    let registry = PluginRegistry::with_builtin_creators();
    let fields = PluginFieldCollection::new()
        .with(PluginField::int32s("in_shape", vec![1, 3, 8, 8]))
        .with(PluginField::int32s("out_shape", vec![1, 3, 16, 16]))
        .with(PluginField::int32s("out_size", vec![16, 16]))
        .with(PluginField::chars("mode", "bicubic"));
    assert!(matches!(
        registry.create_plugin(INTERPOLATE_PLUGIN, "bicubic2d", &fields),
        Err(PluginError::InvalidField { .. })
    ));

    let fields = PluginFieldCollection::new()
        .with(PluginField::int32s("in_shape", vec![1, 3, 8, 8]))
        .with(PluginField::int32s("out_shape", vec![1, 3, 16, 16]))
        .with(PluginField::chars("mode", "bilinear"));
    assert_eq!(
        registry
            .create_plugin(INTERPOLATE_PLUGIN, "bilinear2d", &fields)
            .unwrap_err(),
        PluginError::MissingField {
            plugin: "Interpolate".to_string(),
            field: "out_size".to_string(),
        }
    );
}

#[test]
fn plugin_layers_record_fields_and_output_dims() {
    let registry = PluginRegistry::with_builtin_creators();
    let fields = PluginFieldCollection::new()
        .with(PluginField::float32("eps", 1e-5))
        .with(PluginField::int32("num_groups", 2));
    let plugin = registry
        .create_plugin("GroupNormalizationPlugin", "gnorm", &fields)
        .unwrap();

    let mut network = Network::new();
    let input = network.add_input("x", DataType::Float, Dims::new([1, 4, 2, 2]));
    let scale = network.add_input("scale", DataType::Float, Dims::new([4]));
    let shift = network.add_input("shift", DataType::Float, Dims::new([4]));
    let layer = network
        .add_plugin(&[input, scale, shift], plugin.as_ref())
        .unwrap();

    let recorded = network.layer(layer.layer).unwrap().as_plugin().unwrap();
    assert_eq!(recorded.instance_name, "gnorm");
    assert_eq!(recorded.fields, fields);
    assert_eq!(network.tensor(layer.output).unwrap().dims, Dims::new([1, 4, 2, 2]));

    let rendered = network.to_string();
    assert!(rendered.contains("PluginV2(%t0, %t1, %t2)"));
    assert!(rendered.contains("GroupNormalizationPlugin v1 \"gnorm\""));
    assert!(network.to_json().unwrap().contains("\"num_groups\""));
}

#[test]
fn plugin_rejects_inputs_below_rank_four() {
    let registry = PluginRegistry::with_builtin_creators();
    let fields = PluginFieldCollection::new()
        .with(PluginField::float32("eps", 1e-5))
        .with(PluginField::int32("num_groups", 2));
    let plugin = registry
        .create_plugin("GroupNormalizationPlugin", "gnorm", &fields)
        .unwrap();
    let mut network = Network::new();
    let input = network.add_input("x", DataType::Float, Dims::new([4, 2, 2]));
    assert!(matches!(
        network.add_plugin(&[input, input, input], plugin.as_ref()),
        Err(NetworkError::Plugin(PluginError::InvalidInputs { .. }))
    ));
}

#[test]
fn group_norm_plugin_requires_divisible_channels() {
    let registry = PluginRegistry::with_builtin_creators();
    let fields = PluginFieldCollection::new()
        .with(PluginField::float32("eps", 1e-5))
        .with(PluginField::int32("num_groups", 3));
    let plugin = registry
        .create_plugin("GroupNormalizationPlugin", "gnorm", &fields)
        .unwrap();
    let mut network = Network::new();
    let input = network.add_input("x", DataType::Float, Dims::new([1, 4, 2, 2]));
    assert!(matches!(
        network.add_plugin(&[input, input, input], plugin.as_ref()),
        Err(NetworkError::Plugin(PluginError::InvalidInputs { .. }))
    ));

    let dynamic = network.add_input("y", DataType::Float, Dims::new([1, -1, 2, 2]));
    assert!(network.add_plugin(&[dynamic, dynamic, dynamic], plugin.as_ref()).is_ok());
}

#[test]
fn integer_constants_must_fit_their_type() {
    let mut network = Network::new();
    let err = network
        .add_constant(Weights {
            dtype: DataType::Int32,
            dims: Dims::new([2]),
            values: TensorData::Int(vec![1, i64::from(i32::MAX) + 1]),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        NetworkError::OutOfRange {
            dtype: DataType::Int32,
            value: 2147483648,
        }
    ));
}
