use super::{invalid, Plugin, PluginCreator, PluginError, PluginFieldCollection};
use crate::dims::Dims;

pub const PLUGIN_NAME: &str = "Interpolate";

const MODES: &[&str] = &["nearest", "linear", "bilinear", "trilinear"];

/// Creates interpolation plugins used when the native resize layer cannot
/// honour the requested corner alignment.
///
/// Fields: `in_shape`, `out_shape`, `out_size` (int32 lists), `mode`
/// (one of `nearest`, `linear`, `bilinear`, `trilinear`) and an optional
/// `align_corners` int32 flag.
#[derive(Debug, Default)]
pub struct InterpolatePluginCreator;

impl PluginCreator for InterpolatePluginCreator {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn create_plugin(
        &self,
        instance_name: &str,
        fields: &PluginFieldCollection,
    ) -> Result<Box<dyn Plugin>, PluginError> {
        let in_shape = fields.i32_list(PLUGIN_NAME, "in_shape")?;
        let out_shape = fields.i32_list(PLUGIN_NAME, "out_shape")?;
        let out_size = fields.i32_list(PLUGIN_NAME, "out_size")?;
        let mode = fields.chars(PLUGIN_NAME, "mode")?;
        if fields.get("align_corners").is_some() {
            fields.single_i32(PLUGIN_NAME, "align_corners")?;
        }

        if !MODES.contains(&mode) {
            return Err(invalid(
                PLUGIN_NAME,
                "mode",
                "one of nearest, linear, bilinear, trilinear",
            ));
        }
        if out_shape.len() != in_shape.len() {
            return Err(invalid(PLUGIN_NAME, "out_shape", "the same rank as in_shape"));
        }
        if out_size.is_empty() || out_size.len() > 3 || out_size.len() > out_shape.len() {
            return Err(invalid(PLUGIN_NAME, "out_size", "one to three spatial extents"));
        }
        if !out_shape.ends_with(out_size) {
            return Err(invalid(
                PLUGIN_NAME,
                "out_size",
                "the trailing extents of out_shape",
            ));
        }
        if in_shape.iter().chain(out_shape).any(|dim| *dim < 0) {
            return Err(invalid(PLUGIN_NAME, "in_shape", "fully known extents"));
        }

        Ok(Box::new(InterpolatePlugin {
            instance_name: instance_name.to_string(),
            in_shape: in_shape.iter().map(|d| *d as i64).collect(),
            out_shape: out_shape.iter().map(|d| *d as i64).collect(),
            fields: fields.clone(),
        }))
    }
}

#[derive(Debug)]
pub struct InterpolatePlugin {
    instance_name: String,
    in_shape: Dims,
    out_shape: Dims,
    fields: PluginFieldCollection,
}

impl Plugin for InterpolatePlugin {
    fn plugin_type(&self) -> &str {
        PLUGIN_NAME
    }

    fn instance_name(&self) -> &str {
        &self.instance_name
    }

    fn fields(&self) -> &PluginFieldCollection {
        &self.fields
    }

    fn output_dims(&self, inputs: &[Dims]) -> Result<Dims, PluginError> {
        match inputs {
            [input] if input.rank() == self.in_shape.rank() => Ok(self.out_shape.clone()),
            _ => Err(PluginError::InvalidInputs {
                plugin: PLUGIN_NAME.to_string(),
                inputs: inputs.to_vec(),
                reason: format!("expected one tensor of rank {}", self.in_shape.rank()),
            }),
        }
    }
}
