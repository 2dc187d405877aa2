
use crate::dependencies::DepGraph;
use crate::execution::{Task, TaskQueue};
use crate::ngtsc::file_system::AbsoluteFsPath;
use crate::packages::{EntryPoint, EntryPointJsonProperty, PackageJson};
use serde_json::json;

/// An Angular entry-point under `/node_modules/<name>` with the given package.json.
pub(super) fn entry_point(name: &str, package_json: serde_json::Value) -> EntryPoint {
    let package_json: PackageJson = match package_json {
        serde_json::Value::Object(map) => map,
        _ => PackageJson::new(),
    };
    EntryPoint {
        name: name.to_string(),
        path: AbsoluteFsPath::new(format!("/node_modules/{}", name)),
        package_name: name.to_string(),
        package_version: Some("1.0.0".to_string()),
        package_path: AbsoluteFsPath::new(format!("/node_modules/{}", name)),
        package_json,
        typings: AbsoluteFsPath::new(format!("/node_modules/{}/index.d.ts", name)),
        compiled_by_angular: true,
        ignore_missing_dependencies: false,
        generate_deep_reexports: false,
    }
}

pub(super) fn simple_entry_point(name: &str) -> EntryPoint {
    entry_point(
        name,
        json!({"name": name, "typings": "./index.d.ts", "fesm2015": "./index.js"}),
    )
}

pub(super) fn task(entry_point: &EntryPoint, property: EntryPointJsonProperty) -> Task {
    Task {
        entry_point: entry_point.clone(),
        format_property: property,
        format_properties_to_mark_as_processed: vec![property],
        process_dts: false,
    }
}

/// `a -> {b, c}`, `b -> c`, and an unrelated `d`, sorted as `[c, b, a, d]`.
pub(super) fn diamond() -> (Vec<EntryPoint>, DepGraph<EntryPoint>) {
    let entry_points: Vec<EntryPoint> = ["c", "b", "a", "d"]
        .iter()
        .map(|name| simple_entry_point(name))
        .collect();
    let mut graph = DepGraph::new();
    for e in &entry_points {
        graph.add_node(e.path.clone(), e.clone());
    }
    let path = |name: &str| AbsoluteFsPath::new(format!("/node_modules/{}", name));
    graph.add_dependency(&path("a"), &path("b"));
    graph.add_dependency(&path("a"), &path("c"));
    graph.add_dependency(&path("b"), &path("c"));
    (entry_points, graph)
}

/// One `fesm2015` task per entry-point of `diamond()`.
pub(super) fn diamond_queue() -> TaskQueue {
    let (entry_points, graph) = diamond();
    let tasks = entry_points
        .iter()
        .map(|e| task(e, EntryPointJsonProperty::Fesm2015))
        .collect();
    TaskQueue::new(tasks, &graph)
}
