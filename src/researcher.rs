use crate::error::PipelineError;
use crate::inference::{Inference, Message};
use crate::parse::{self, MediaSuggestion};
use crate::pipeline::StageAgent;
use crate::progress;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const AGENT_NAME: &str = "Research Agent";

/// Coarse knob for the research stage: selects the prompt's breadth
/// instruction and the generation budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    Quick,
    #[default]
    Comprehensive,
    Deep,
}

impl Depth {
    fn instruction(self) -> &'static str {
        match self {
            Depth::Quick => {
                "Provide a concise overview focusing on the most important 3-5 key points."
            }
            Depth::Comprehensive => {
                "Provide detailed, thorough research covering all major aspects."
            }
            Depth::Deep => {
                "Provide exhaustive, in-depth research with extensive details, examples, and analysis."
            }
        }
    }

    pub fn max_tokens(self) -> u32 {
        match self {
            Depth::Deep => 3000,
            _ => 2048,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Depth::Quick => "quick",
            Depth::Comprehensive => "comprehensive",
            Depth::Deep => "deep",
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ResearchRequest {
    pub topic: String,
    pub depth: Depth,
}

#[derive(Debug, Clone)]
pub struct ResearchRecord {
    pub agent: String,
    pub topic: String,
    pub research: String,
    pub depth: Depth,
}

pub struct ResearchAgent<C> {
    client: Arc<C>,
}

impl<C: Inference> ResearchAgent<C> {
    pub fn new(client: Arc<C>) -> Self {
        ResearchAgent { client }
    }

    /// Suggests up to `count` follow-up topics, one per line. Returns fewer
    /// when generation yields fewer qualifying lines.
    pub async fn find_related_topics(
        &self,
        topic: &str,
        count: usize,
    ) -> Result<Vec<String>, PipelineError> {
        let prompt = format!(
            "Given the topic: \"{topic}\"\n\n\
             List {count} closely related topics or subtopics that would be valuable to research further.\n\
             Provide only the topic names, one per line, without numbering or explanations."
        );

        let messages = vec![
            Message::system("You are an expert at identifying related research topics."),
            Message::user(prompt),
        ];

        let response = self.client.generate(messages, 0.5, 2048, false).await?;
        Ok(parse::related_topics(&response, count))
    }

    /// Requests four image/video suggestions for the topic. Depends only on
    /// the topic, never on pipeline state; malformed suggestion blocks are
    /// dropped, not raised.
    pub async fn generate_media_suggestions(
        &self,
        topic: &str,
    ) -> Result<Vec<MediaSuggestion>, PipelineError> {
        let prompt = format!(
            "For the topic \"{topic}\", suggest 4 relevant visual content pieces that would enhance understanding:\n\n\
             Provide 2 image suggestions and 2 video suggestions.\n\n\
             Format each as:\n\
             TYPE: image or video\n\
             TITLE: Short descriptive title\n\
             DESCRIPTION: What this visual shows (one sentence)\n\
             SEARCH_QUERY: Exact search term to find this content\n\n\
             Example:\n\
             TYPE: image\n\
             TITLE: Quantum Computer Chip\n\
             DESCRIPTION: Close-up of a quantum computing processor showing qubits\n\
             SEARCH_QUERY: quantum computer chip close up\n\n\
             Provide 4 suggestions now:"
        );

        let messages = vec![
            Message::system(
                "You are an expert at identifying relevant visual content for educational topics.",
            ),
            Message::user(prompt),
        ];

        let response = self.client.generate(messages, 0.6, 2048, false).await?;
        let parsed = parse::media_suggestions(&response);

        if parsed.dropped > 0 {
            progress::log_with(
                progress::Kind::Media,
                format!("dropped {} malformed media suggestion(s)", parsed.dropped),
            );
        }

        Ok(parsed.items)
    }
}

impl<C: Inference> StageAgent for ResearchAgent<C> {
    type Input = ResearchRequest;
    type Output = ResearchRecord;

    async fn run(&self, input: ResearchRequest) -> Result<ResearchRecord, PipelineError> {
        let instruction = input.depth.instruction();
        let prompt = format!(
            "You are an expert research agent. {instruction}\n\n\
             Topic: {topic}\n\n\
             Provide:\n\
             1. **Overview and Definition**: Clear explanation of what this is\n\
             2. **Key Concepts and Principles**: Core ideas and fundamentals\n\
             3. **Current State and Recent Developments**: Latest trends and updates\n\
             4. **Important Facts and Statistics**: Data-driven insights\n\
             5. **Main Challenges and Opportunities**: What's difficult and what's possible\n\
             6. **Future Trends and Predictions**: Where this is heading\n\n\
             Be thorough, accurate, and insightful. Use concrete examples where applicable.",
            topic = input.topic,
        );

        let messages = vec![
            Message::system(
                "You are an expert research agent specializing in comprehensive topic analysis with up-to-date knowledge.",
            ),
            Message::user(prompt),
        ];

        let research = self
            .client
            .generate(messages, 0.3, input.depth.max_tokens(), false)
            .await?;

        Ok(ResearchRecord {
            agent: AGENT_NAME.to_string(),
            topic: input.topic,
            research,
            depth: input.depth,
        })
    }
}
