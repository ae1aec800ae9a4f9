use anyhow::Result;
use clap::{Args, Subcommand};
use storyflow_core::{Config, Pillar, PitchAction, PitchContent, PitchEdit, PitchOrigin, PitchStatus};
use storyflow_service::{PitchService, PromptService};
use storyflow_storage::traits::ContentStore;

use super::{open_storage, print_json};

#[derive(Subcommand)]
pub(crate) enum PitchCommand {
    /// Create a pending pitch
    Create {
        #[arg(short, long)]
        category: String,
        /// Pitch text
        #[arg(short, long)]
        text: String,
        #[arg(long)]
        pillar: Option<Pillar>,
        #[arg(long)]
        topic: Option<String>,
        #[arg(short, long)]
        keyword: Option<String>,
        #[arg(long, default_value = "manual")]
        origin: PitchOrigin,
    },
    /// Edit the content of a pending pitch
    Edit {
        id: i64,
        #[command(flatten)]
        fields: EditFields,
    },
    List {
        #[arg(short, long)]
        status: Option<PitchStatus>,
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },
    /// Show a pitch with its generated drafts
    Show { id: i64 },
    /// Apply an operator action (approve, refuse, reopen, force-generate, retry, publish)
    Transition { id: i64, action: PitchAction },
    /// Request a status by name; it must map to an operator action
    Status { id: i64, status: String },
    /// Render the prompt that generation would use for a pitch
    Preview { id: i64 },
}

#[derive(Args)]
pub(crate) struct EditFields {
    #[arg(long)]
    pillar: Option<Pillar>,
    #[arg(short, long)]
    category: Option<String>,
    /// Empty string clears the topic
    #[arg(long)]
    topic: Option<String>,
    /// Empty string clears the keyword
    #[arg(short, long)]
    keyword: Option<String>,
    #[arg(short, long)]
    text: Option<String>,
}

impl From<EditFields> for PitchEdit {
    fn from(fields: EditFields) -> Self {
        Self {
            pillar: fields.pillar,
            category: fields.category,
            topic: fields.topic,
            main_seo_keyword: fields.keyword,
            suggested_pitch: fields.text,
        }
    }
}

pub(crate) async fn run(command: PitchCommand, config: &Config) -> Result<()> {
    let storage = open_storage(config).await?;
    let pitches = PitchService::new(storage.clone());

    match command {
        PitchCommand::Create { category, text, pillar, topic, keyword, origin } => {
            let mut content = PitchContent::new(category, text);
            content.pillar = pillar;
            content.topic = topic;
            content.main_seo_keyword = keyword;
            print_json(&pitches.create_pitch(content, origin).await?)
        },
        PitchCommand::Edit { id, fields } => {
            print_json(&pitches.edit_pitch(id, &PitchEdit::from(fields)).await?)
        },
        PitchCommand::List { status, limit } => {
            print_json(&pitches.list_pitches(status, limit).await?)
        },
        PitchCommand::Show { id } => {
            let pitch = pitches.get_pitch(id).await?;
            let drafts = storage.content_for_pitch(id).await?;
            print_json(&serde_json::json!({ "pitch": pitch, "drafts": drafts }))
        },
        PitchCommand::Transition { id, action } => {
            print_json(&pitches.apply_action(id, action).await?)
        },
        PitchCommand::Status { id, status } => {
            print_json(&pitches.request_status(id, &status).await?)
        },
        PitchCommand::Preview { id } => {
            let prompts = PromptService::new(storage, config.pipeline.default_prompt.clone());
            match prompts.preview(id).await? {
                Some(resolved) => print_json(&resolved),
                None => anyhow::bail!("no prompt template matches pitch {id} and no default prompt is set"),
            }
        },
    }
}
