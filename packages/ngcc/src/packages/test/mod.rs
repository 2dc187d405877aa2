mod configuration_spec;
mod entry_point_manifest_spec;
