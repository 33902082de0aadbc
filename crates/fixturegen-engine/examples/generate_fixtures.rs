use std::env;

use tracing_subscriber::EnvFilter;

use fixturegen_core::{FieldConstraints, FieldDecl, FieldType, ModelDecl, ModelGraph};
use fixturegen_engine::{GenerationConfig, InstanceGenerator};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let seed: u64 = args.next().map(|raw| raw.parse()).transpose()?.unwrap_or(42);
    let count: u64 = args.next().map(|raw| raw.parse()).transpose()?.unwrap_or(3);

    let graph = ModelGraph::new(vec![ModelDecl {
        id: "app.User".to_string(),
        fields: vec![
            FieldDecl::new("id", FieldType::Uuid),
            FieldDecl::new("email", FieldType::Email),
            FieldDecl::new("age", FieldType::Int).with_constraints(FieldConstraints {
                ge: Some(18.0),
                le: Some(99.0),
                ..FieldConstraints::default()
            }),
            FieldDecl::new(
                "plan",
                FieldType::Enum {
                    members: vec!["free".to_string(), "pro".to_string()],
                },
            ),
            FieldDecl::new("note", FieldType::String).nullable(),
        ],
    }]);

    let engine = InstanceGenerator::new(graph, GenerationConfig::with_seed(seed))?;
    for result in engine.generate_many("app.User", count) {
        let instance = result?;
        println!("{}", serde_json::to_string(&instance.value.to_json())?);
    }
    Ok(())
}
