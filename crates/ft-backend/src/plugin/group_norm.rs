use super::{invalid, Plugin, PluginCreator, PluginError, PluginFieldCollection};
use crate::dims::Dims;

pub const PLUGIN_NAME: &str = "GroupNormalizationPlugin";

/// Group normalization for backends without a fused primitive. Takes the
/// input, scale and shift tensors; the input must be at least rank 4.
#[derive(Debug, Default)]
pub struct GroupNormPluginCreator;

impl PluginCreator for GroupNormPluginCreator {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn create_plugin(
        &self,
        instance_name: &str,
        fields: &PluginFieldCollection,
    ) -> Result<Box<dyn Plugin>, PluginError> {
        let eps = fields.single_f32(PLUGIN_NAME, "eps")?;
        let num_groups = fields.single_i32(PLUGIN_NAME, "num_groups")?;
        if !(eps > 0.0) {
            return Err(invalid(PLUGIN_NAME, "eps", "a positive float32"));
        }
        if num_groups <= 0 {
            return Err(invalid(PLUGIN_NAME, "num_groups", "a positive int32"));
        }
        Ok(Box::new(GroupNormPlugin {
            instance_name: instance_name.to_string(),
            num_groups: num_groups as i64,
            fields: fields.clone(),
        }))
    }
}

#[derive(Debug)]
pub struct GroupNormPlugin {
    instance_name: String,
    num_groups: i64,
    fields: PluginFieldCollection,
}

impl Plugin for GroupNormPlugin {
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
        let reject = |reason: String| PluginError::InvalidInputs {
            plugin: PLUGIN_NAME.to_string(),
            inputs: inputs.to_vec(),
            reason,
        };
        let [input, _scale, _shift] = inputs else {
            return Err(reject("expected input, scale and shift".to_string()));
        };
        if input.rank() < 4 {
            return Err(reject(format!("input rank {} is below 4", input.rank())));
        }
        let channels = input.as_slice()[1];
        if channels >= 0 && channels % self.num_groups != 0 {
            return Err(reject(format!(
                "{} channels do not split into {} groups",
                channels, self.num_groups
            )));
        }
        Ok(input.clone())
    }
}
