use anyhow::Result;
use clap::Subcommand;
use storyflow_core::{Config, NewPromptTemplate, Pillar};
use storyflow_service::PromptService;

use super::{open_storage, print_json};

#[derive(Subcommand)]
pub(crate) enum PromptCommand {
    /// Add a template; the (pillar, category, topic) key must be unique
    Create {
        #[arg(short, long)]
        category: String,
        /// Template text, may reference {pitch}, {keywords}, {topic} and {category}
        #[arg(short, long)]
        prompt: String,
        #[arg(long)]
        pillar: Option<Pillar>,
        #[arg(long)]
        topic: Option<String>,
    },
    List,
    Delete { id: i64 },
}

pub(crate) async fn run(command: PromptCommand, config: &Config) -> Result<()> {
    let storage = open_storage(config).await?;
    let prompts = PromptService::new(storage, config.pipeline.default_prompt.clone());

    match command {
        PromptCommand::Create { category, prompt, pillar, topic } => {
            let template = NewPromptTemplate { pillar, category, topic, prompt };
            print_json(&prompts.create_template(template).await?)
        },
        PromptCommand::List => print_json(&prompts.list_templates().await?),
        PromptCommand::Delete { id } => {
            prompts.delete_template(id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        },
    }
}
