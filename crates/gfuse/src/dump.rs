//! Textual dump of check failures, in the contextual (modeling) style.

use std::collections::HashSet;
use std::fmt::Write;

use gfuse_check::Analyzer;
use gfuse_primitives::Brep;
use gfuse_topo::IndexMap;

/// Render the analyzer's findings as a human-readable fault list.
///
/// One numbered line per faulty sub-shape with its status codes, followed
/// by a summary line with the total count of incriminated shapes (context
/// parents included, each counted once).
pub fn contextual_dump(analyzer: &Analyzer, brep: &Brep) -> String {
    let index = IndexMap::new(&brep.topology, brep.root);
    let mut out = String::new();
    let mut counted = HashSet::new();
    let mut line = 0usize;
    for (_, shape) in index.iter() {
        let Some(result) = analyzer.result(shape) else {
            continue;
        };
        if result.is_clean() {
            continue;
        }
        counted.insert(shape);
        for (parent, statuses) in &result.contextual {
            if !statuses.is_empty() {
                counted.insert(*parent);
            }
        }
        let mut statuses = Vec::new();
        for status in result.all_statuses() {
            if !statuses.contains(&status) {
                statuses.push(status);
            }
        }
        let rendered: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
        line += 1;
        let _ = writeln!(out, "Shape fault #{}: {}", line, rendered.join(" "));
    }
    out.push('\n');
    if !counted.is_empty() {
        let _ = writeln!(out, "=> {} faulty shapes!", counted.len());
    }
    out
}
