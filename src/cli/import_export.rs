use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GraphError, Result};
use crate::features::FeatureSet;
use crate::graph::{CoachingGraph, GraphOptions};

/// Serialized form of a coaching graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Every user id, in insertion order.
    pub users: Vec<String>,
    /// Coach id to the ids of the students they coach.
    pub coaches: BTreeMap<String, Vec<String>>,
    /// Feature tokens per user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<BTreeMap<String, Vec<String>>>,
}

/// Summary of a document import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Distinct users created.
    pub users: usize,
    /// Distinct coaching edges created.
    pub edges: usize,
    /// Duplicate user ids that were collapsed.
    pub duplicate_users: usize,
}

/// Reads and validates a graph document from `path`.
pub fn load_graph(path: impl AsRef<Path>) -> Result<CoachingGraph> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let doc: GraphDocument = serde_json::from_reader(reader)?;
    let (graph, summary) = graph_from_document(&doc)?;
    debug!(
        path = %path.display(),
        users = summary.users,
        edges = summary.edges,
        "import.graph.loaded"
    );
    Ok(graph)
}

/// Writes `graph` to `path` as pretty-printed JSON.
pub fn save_graph(graph: &CoachingGraph, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &document_from_graph(graph))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    debug!(path = %path.display(), users = graph.len(), "export.graph.saved");
    Ok(())
}

/// Checks that every id referenced by `doc` is declared in `users`.
pub fn validate_document(doc: &GraphDocument) -> Result<()> {
    let declared: FxHashSet<&str> = doc.users.iter().map(String::as_str).collect();
    for (coach, students) in &doc.coaches {
        if !declared.contains(coach.as_str()) {
            return Err(GraphError::MalformedInput(format!(
                "coach '{coach}' is not declared in users"
            )));
        }
        if let Some(student) = students.iter().find(|s| !declared.contains(s.as_str())) {
            return Err(GraphError::MalformedInput(format!(
                "student '{student}' of coach '{coach}' is not declared in users"
            )));
        }
    }
    if let Some(features) = &doc.features {
        if let Some(user) = features.keys().find(|u| !declared.contains(u.as_str())) {
            return Err(GraphError::MalformedInput(format!(
                "features given for undeclared user '{user}'"
            )));
        }
    }
    Ok(())
}

/// Builds a directed graph from a document.
///
/// The document is validated in full before any user is created.
pub fn graph_from_document(doc: &GraphDocument) -> Result<(CoachingGraph, ImportSummary)> {
    validate_document(doc)?;

    let mut graph = CoachingGraph::new(GraphOptions::new().capacity(doc.users.len()));
    let mut summary = ImportSummary::default();
    for user in &doc.users {
        if graph.contains(user) {
            warn!(user = %user, "import.duplicate_user");
            summary.duplicate_users += 1;
            continue;
        }
        graph.add_node(user.as_str());
    }
    for (coach, students) in &doc.coaches {
        for student in students {
            graph.add_edge(coach, student);
        }
    }
    if let Some(features) = &doc.features {
        for (user, tokens) in features {
            let idx = graph.index_of(user)?;
            graph.set_features(idx, tokens.iter().map(String::as_str).collect::<FeatureSet>());
        }
    }
    summary.users = graph.len();
    summary.edges = graph.edge_count();
    Ok((graph, summary))
}

/// Converts a graph back into its document form.
///
/// Every user gets a `features` entry, empty or not. Only users with students
/// appear under `coaches`.
pub fn document_from_graph(graph: &CoachingGraph) -> GraphDocument {
    let mut doc = GraphDocument {
        users: Vec::with_capacity(graph.len()),
        coaches: BTreeMap::new(),
        features: Some(BTreeMap::new()),
    };
    let features = doc.features.get_or_insert_with(BTreeMap::new);
    for node in graph.nodes() {
        doc.users.push(node.id().to_string());
        if node.is_parent() {
            let students = graph
                .ids(node.outgoing())
                .into_iter()
                .map(str::to_string)
                .collect();
            doc.coaches.insert(node.id().to_string(), students);
        }
        features.insert(
            node.id().to_string(),
            node.features().iter().map(str::to_string).collect(),
        );
    }
    doc
}
