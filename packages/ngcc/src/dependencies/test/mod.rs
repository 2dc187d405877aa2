mod dependency_host_spec;
mod module_resolver_spec;
