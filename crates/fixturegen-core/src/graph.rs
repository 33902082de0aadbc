use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::schema::{FieldType, ModelGraph};

/// Summary of the model reference graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Report for model dependency ordering.
///
/// `topo_order` lists referenced models before the models that use
/// them; `cycle` names the models involved in recursive references
/// (including self-references), which the generation engine bounds
/// through its cycle guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelGraphReport {
    pub summary: ModelGraphSummary,
    pub topo_order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Build a deterministic model dependency report for a graph.
pub fn build_model_graph_report(graph: &ModelGraph) -> ModelGraphReport {
    let adjacency = build_adjacency(graph);
    let nodes = adjacency.len();
    let edges = adjacency.values().map(|targets| targets.len()).sum();
    let summary = ModelGraphSummary { nodes, edges };

    match toposort(&adjacency) {
        Ok(order) => ModelGraphReport {
            summary,
            topo_order: Some(order),
            cycle: None,
        },
        Err(cycle) => ModelGraphReport {
            summary,
            topo_order: None,
            cycle: Some(cycle),
        },
    }
}

fn build_adjacency(graph: &ModelGraph) -> BTreeMap<String, BTreeSet<String>> {
    let mut adjacency: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for model in &graph.models {
        adjacency.entry(model.id.clone()).or_default();
        for field in &model.fields {
            for referenced in collect_model_refs(&field.ty) {
                adjacency.entry(referenced.clone()).or_default();
                adjacency
                    .entry(referenced)
                    .or_default()
                    .insert(model.id.clone());
            }
        }
    }

    adjacency
}

fn collect_model_refs(ty: &FieldType) -> Vec<String> {
    match ty {
        FieldType::Model { id } => vec![id.clone()],
        FieldType::List { item } => collect_model_refs(item),
        FieldType::Map { key, value } => {
            let mut refs = collect_model_refs(key);
            refs.extend(collect_model_refs(value));
            refs
        }
        FieldType::Union { members } => members.iter().flat_map(collect_model_refs).collect(),
        _ => Vec::new(),
    }
}

fn toposort(graph: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<String>, Vec<String>> {
    let mut indegree: BTreeMap<String, usize> = BTreeMap::new();

    for node in graph.keys() {
        indegree.entry(node.clone()).or_insert(0);
    }

    for targets in graph.values() {
        for target in targets {
            let entry = indegree.entry(target.clone()).or_insert(0);
            *entry += 1;
        }
    }

    let mut ready: BTreeSet<String> = indegree
        .iter()
        .filter_map(|(node, count)| {
            if *count == 0 {
                Some(node.clone())
            } else {
                None
            }
        })
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    let mut indegree = indegree;

    while let Some(node) = ready.iter().next().cloned() {
        ready.remove(&node);
        order.push(node.clone());

        if let Some(targets) = graph.get(&node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target.clone());
                    }
                }
            }
        }
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        let cycle_nodes: Vec<String> = indegree
            .into_iter()
            .filter_map(|(node, count)| if count > 0 { Some(node) } else { None })
            .collect();
        Err(cycle_nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDecl, ModelDecl};

    #[test]
    fn self_referential_model_reports_cycle() {
        let graph = ModelGraph::new(vec![ModelDecl {
            id: "tree.Node".to_string(),
            fields: vec![
                FieldDecl::new("value", FieldType::Int),
                FieldDecl::new(
                    "child",
                    FieldType::Model {
                        id: "tree.Node".to_string(),
                    },
                )
                .nullable(),
            ],
        }]);

        let report = build_model_graph_report(&graph);
        assert!(report.topo_order.is_none());
        assert!(
            report
                .cycle
                .as_ref()
                .expect("cycle expected")
                .contains(&"tree.Node".to_string())
        );
    }

    #[test]
    fn acyclic_references_order_dependencies_first() {
        let graph = ModelGraph::new(vec![
            ModelDecl {
                id: "shop.Order".to_string(),
                fields: vec![FieldDecl::new(
                    "customer",
                    FieldType::Model {
                        id: "shop.Customer".to_string(),
                    },
                )],
            },
            ModelDecl {
                id: "shop.Customer".to_string(),
                fields: vec![FieldDecl::new("name", FieldType::String)],
            },
        ]);

        let report = build_model_graph_report(&graph);
        let order = report.topo_order.expect("expected toposort");
        let customer = order.iter().position(|id| id == "shop.Customer").unwrap();
        let order_idx = order.iter().position(|id| id == "shop.Order").unwrap();
        assert!(customer < order_idx);
    }

    #[test]
    fn union_and_list_references_count_as_edges() {
        let graph = ModelGraph::new(vec![
            ModelDecl {
                id: "a.Left".to_string(),
                fields: Vec::new(),
            },
            ModelDecl {
                id: "a.Holder".to_string(),
                fields: vec![FieldDecl::new(
                    "items",
                    FieldType::List {
                        item: Box::new(FieldType::Union {
                            members: vec![
                                FieldType::Model {
                                    id: "a.Left".to_string(),
                                },
                                FieldType::Int,
                            ],
                        }),
                    },
                )],
            },
        ]);

        let report = build_model_graph_report(&graph);
        assert_eq!(report.summary.edges, 1);
    }
}
